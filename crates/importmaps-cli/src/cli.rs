//! Command-line interface definition.
//!
//! - `importmaps build` - bundle the project and publish the import map
//! - `importmaps dev` - serve the project with a dev-mode import map
//! - `importmaps print` - resolve once in dev mode and print the map

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use importmaps::StrategyKind;

/// Share dependencies between independently built bundles through a browser import map
#[derive(Parser, Debug)]
#[command(name = "importmaps", version)]
pub struct Cli {
    /// Increase logging (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Bundle the project, emitting every shared dependency as its own chunk
    Build(BuildArgs),

    /// Serve the project with an import map pointing at dev-server URLs
    Dev(DevArgs),

    /// Print the development import map as JSON
    Print(PrintArgs),
}

/// Options every command reads its configuration from.
#[derive(Args, Debug, Default, Clone)]
pub struct ConfigArgs {
    /// Config file (default: importmaps.toml, importmaps.json or package.json)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Project root
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Shared dependency, repeatable; replaces the configured list
    #[arg(short, long = "shared", value_name = "NAME")]
    pub shared: Vec<String>,

    /// Output subdirectory for shared chunks
    #[arg(long, value_name = "DIR")]
    pub shared_out_dir: Option<String>,

    /// How shared dependencies enter the bundle
    #[arg(long, value_enum)]
    pub strategy: Option<Strategy>,

    /// Fail when a dependency's default export cannot be determined
    #[arg(long)]
    pub strict_exports: bool,
}

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Application entry modules; replace the configured entries
    #[arg(value_name = "ENTRY")]
    pub entries: Vec<String>,

    #[command(flatten)]
    pub config: ConfigArgs,

    /// Output directory
    #[arg(short = 'd', long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// HTML page that receives the import map
    #[arg(long, value_name = "FILE")]
    pub html: Option<PathBuf>,

    /// Also write the import map as a JSON file (optionally named)
    #[arg(long, value_name = "NAME", num_args = 0..=1, default_missing_value = "")]
    pub json: Option<String>,
}

#[derive(Args, Debug)]
pub struct DevArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    #[arg(short, long)]
    pub port: Option<u16>,

    #[arg(long)]
    pub host: Option<String>,
}

#[derive(Args, Debug)]
pub struct PrintArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    EntryAsInput,
    VirtualModules,
}

impl From<Strategy> for StrategyKind {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::EntryAsInput => StrategyKind::EntryAsInput,
            Strategy::VirtualModules => StrategyKind::VirtualModules,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_build_with_overrides() {
        let cli = Cli::try_parse_from([
            "importmaps",
            "-v",
            "build",
            "src/main.js",
            "--shared",
            "react",
            "-s",
            "react-dom",
            "--strategy",
            "virtual-modules",
            "--json",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 1);
        let Command::Build(args) = cli.command else {
            panic!("expected build");
        };
        assert_eq!(args.entries, ["src/main.js"]);
        assert_eq!(args.config.shared, ["react", "react-dom"]);
        assert_eq!(args.config.strategy, Some(Strategy::VirtualModules));
        assert_eq!(args.json.as_deref(), Some(""));
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["importmaps", "-q", "-v", "print"]).is_err());
    }

    #[test]
    fn dev_port() {
        let cli = Cli::try_parse_from(["importmaps", "dev", "--port", "3000"]).unwrap();
        let Command::Dev(args) = cli.command else {
            panic!("expected dev");
        };
        assert_eq!(args.port, Some(3000));
        assert!(args.host.is_none());
    }
}
