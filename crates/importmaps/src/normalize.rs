//! Chunk-name normalization and local-file detection.

use std::path::Path;

/// Turn a package specifier into a name that is safe as a file stem and URL segment.
///
/// ```
/// use importmaps::normalize_dependency_name;
///
/// assert_eq!(normalize_dependency_name("@scope/pkg"), "@scope_pkg");
/// assert_eq!(normalize_dependency_name("pkg/sub"), "pkg_sub");
/// assert_eq!(normalize_dependency_name("pkg"), "pkg");
/// ```
pub fn normalize_dependency_name(name: &str) -> String {
    name.replace(['/', '\\'], "_")
}

/// Whether an entry refers to a local file instead of a package.
///
/// Only explicit paths count: package subpaths such as `lodash/debounce.js`
/// and dotted package names such as `chart.js` stay package specifiers.
pub fn is_local_file_entry(entry: &str) -> bool {
    entry.starts_with("./")
        || entry.starts_with("../")
        || entry.starts_with('/')
        || Path::new(entry).is_absolute()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_every_separator() {
        assert_eq!(normalize_dependency_name("@scope/pkg/deep"), "@scope_pkg_deep");
        assert_eq!(normalize_dependency_name("win\\style"), "win_style");
        assert_eq!(normalize_dependency_name(""), "");
    }

    #[test]
    fn detects_local_entries() {
        assert!(is_local_file_entry("./src/react-shim.js"));
        assert!(is_local_file_entry("../shared/index.ts"));
        assert!(is_local_file_entry("/abs/entry.mjs"));
    }

    #[test]
    fn packages_are_not_local() {
        assert!(!is_local_file_entry("react"));
        assert!(!is_local_file_entry("@scope/pkg"));
        assert!(!is_local_file_entry("lodash.debounce"));
        assert!(!is_local_file_entry("react-dom/client"));
        assert!(!is_local_file_entry("chart.js"));
        assert!(!is_local_file_entry("lodash/debounce.js"));
    }
}
