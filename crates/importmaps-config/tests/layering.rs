use std::path::PathBuf;

use figment::Jail;
use importmaps::{OutputAsFile, StrategyKind};
use importmaps_config::{ConfigError, ConfigLoader, ImportMapsConfig};

fn load(jail: &Jail) -> ImportMapsConfig {
    ConfigLoader::new(jail.directory()).load().expect("config")
}

#[test]
fn defaults_without_any_file() {
    Jail::expect_with(|jail| {
        let config = load(jail);
        assert_eq!(config, ImportMapsConfig::default());
        Ok(())
    });
}

#[test]
fn file_values_override_defaults() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "importmaps.toml",
            r#"
shared = ["react", { name = "ui", entry = "./src/ui.js" }]
sharedOutDir = "shared"
entries = ["src/main.js"]

[buildOptions]
strategy = "virtual-modules"

[dev]
port = 3000
"#,
        )?;

        let config = load(jail);
        assert_eq!(config.options.shared.len(), 2);
        assert_eq!(config.options.shared_out_dir, "shared");
        assert_eq!(config.options.build_options.strategy, StrategyKind::VirtualModules);
        assert_eq!(config.entries, ["src/main.js"]);
        assert_eq!(config.dev.port, 3000);
        assert_eq!(config.dev.host, "127.0.0.1");
        assert_eq!(config.out_dir, PathBuf::from("dist"));
        Ok(())
    });
}

#[test]
fn environment_overrides_file() {
    Jail::expect_with(|jail| {
        jail.create_file("importmaps.json", r#"{ "shared": ["react"], "sharedOutDir": "vendor" }"#)?;
        jail.set_env("IMPORTMAPS_SHARED_OUT_DIR", "shared");
        jail.set_env("IMPORTMAPS_DEV__PORT", "4000");
        jail.set_env("IMPORTMAPS_OUTPUT_AS_FILE", "deps");

        let config = load(jail);
        assert_eq!(config.options.shared_out_dir, "shared");
        assert_eq!(config.dev.port, 4000);
        assert_eq!(config.options.output_as_file, OutputAsFile::Named("deps".into()));
        assert_eq!(config.options.shared[0].name(), "react");
        Ok(())
    });
}

#[test]
fn overrides_beat_environment() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "package.json",
            r#"{ "name": "host", "importmaps": { "shared": ["react"], "outDir": "build" } }"#,
        )?;
        jail.set_env("IMPORTMAPS_OUT_DIR", "env-dist");

        let config = ConfigLoader::new(jail.directory())
            .set("outDir", "cli-dist")
            .set_opt("shared_out_dir", Some("shared"))
            .set_opt::<String>("html", None)
            .load()
            .expect("config");

        assert_eq!(config.out_dir, PathBuf::from("cli-dist"));
        assert_eq!(config.options.shared_out_dir, "shared");
        assert_eq!(config.html, Some(PathBuf::from("index.html")));
        Ok(())
    });
}

#[test]
fn explicit_file_replaces_discovery() {
    Jail::expect_with(|jail| {
        jail.create_file("importmaps.toml", "shared = [\"react\"]\n")?;
        jail.create_file("other.toml", "shared = [\"vue\"]\n")?;

        let config = ConfigLoader::new(jail.directory())
            .file(Some(PathBuf::from("other.toml")))
            .load()
            .expect("config");
        assert_eq!(config.options.shared[0].name(), "vue");

        let missing = ConfigLoader::new(jail.directory())
            .file(Some(PathBuf::from("missing.toml")))
            .load();
        assert!(matches!(missing, Err(ConfigError::FileNotFound(_))));
        Ok(())
    });
}

#[test]
fn invalid_values_are_reported() {
    Jail::expect_with(|jail| {
        jail.create_file("importmaps.toml", "[dev]\nport = \"soon\"\n")?;
        let err = ConfigLoader::new(jail.directory()).load().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }), "{err}");
        assert!(err.to_string().contains("soon"), "{err}");
        Ok(())
    });
}
