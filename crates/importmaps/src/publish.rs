use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Browser import map document: `{"imports": {...}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportMap {
    imports: IndexMap<String, String>,
}

impl ImportMap {
    pub fn new() -> Self {
        Self {
            imports: IndexMap::new(),
        }
    }

    pub fn from_imports(imports: IndexMap<String, String>) -> Self {
        Self { imports }
    }

    pub fn insert(&mut self, specifier: impl Into<String>, url: impl Into<String>) {
        self.imports.insert(specifier.into(), url.into());
    }

    pub fn get(&self, specifier: &str) -> Option<&str> {
        self.imports.get(specifier).map(String::as_str)
    }

    pub fn as_map(&self) -> &IndexMap<String, String> {
        &self.imports
    }

    pub fn len(&self) -> usize {
        self.imports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.imports.is_empty()
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"imports":{}}"#.to_string())
    }

    /// Two-space indented JSON for the standalone resource.
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| r#"{"imports":{}}"#.to_string())
    }

    /// The inline `<script type="importmap">` element.
    pub fn script_tag(&self) -> String {
        format!(
            r#"<script type="importmap">{}</script>"#,
            self.to_json().replace("</", "<\\/")
        )
    }

    /// Inject the import map as the first element of `<head>`.
    ///
    /// Documents without `<head>` get one after `<html>`; documents without
    /// either get the tag prepended.
    pub fn inject_html(&self, html: &str) -> String {
        let tag = self.script_tag();

        if let Some(at) = find_open_tag_end(html, "head") {
            return splice(html, at, &tag);
        }
        if let Some(at) = find_open_tag_end(html, "html") {
            return splice(html, at, &format!("<head>{tag}</head>"));
        }
        format!("{tag}\n{html}")
    }
}

fn splice(html: &str, at: usize, insert: &str) -> String {
    let mut out = String::with_capacity(html.len() + insert.len());
    out.push_str(&html[..at]);
    out.push_str(insert);
    out.push_str(&html[at..]);
    out
}

/// Byte offset just past the `>` of the first `<tag ...>` (case-insensitive).
fn find_open_tag_end(html: &str, tag: &str) -> Option<usize> {
    let lower = html.to_ascii_lowercase();
    let needle = format!("<{tag}");
    let mut from = 0;

    while let Some(found) = lower[from..].find(&needle) {
        let start = from + found;
        let after = start + needle.len();
        match lower.as_bytes().get(after) {
            Some(b'>') => return Some(after + 1),
            Some(c) if c.is_ascii_whitespace() => {
                return lower[after..].find('>').map(|close| after + close + 1);
            }
            _ => from = after,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map() -> ImportMap {
        let mut map = ImportMap::new();
        map.insert("shared-lib", "./assets/shared/shared-lib-abc.js");
        map
    }

    #[test]
    fn serializes_imports_object() {
        assert_eq!(
            map().to_json(),
            r#"{"imports":{"shared-lib":"./assets/shared/shared-lib-abc.js"}}"#
        );
        assert_eq!(ImportMap::new().to_json(), r#"{"imports":{}}"#);
    }

    #[test]
    fn pretty_json_uses_two_spaces() {
        assert_eq!(
            map().to_pretty_json(),
            "{\n  \"imports\": {\n    \"shared-lib\": \"./assets/shared/shared-lib-abc.js\"\n  }\n}"
        );
    }

    #[test]
    fn injects_after_head_with_attributes() {
        let html = r#"<!doctype html><html><HEAD lang="en"><title>x</title></HEAD><body><header></header></body></html>"#;
        let out = map().inject_html(html);
        assert!(out.contains(&format!(r#"<HEAD lang="en">{}<title>"#, map().script_tag())));
    }

    #[test]
    fn skips_header_elements() {
        let out = map().inject_html("<html><header></header><head></head></html>");
        assert!(out.contains(&format!("<head>{}</head>", map().script_tag())));
        assert!(out.starts_with("<html><header></header>"));
    }

    #[test]
    fn creates_head_or_prepends() {
        let out = map().inject_html("<html><body></body></html>");
        assert!(out.starts_with(&format!("<html><head>{}</head><body>", map().script_tag())));

        let out = map().inject_html("<p>fragment</p>");
        assert!(out.starts_with(&map().script_tag()));
    }

    #[test]
    fn escapes_closing_sequences() {
        let mut map = ImportMap::new();
        map.insert("x", "./</script>.js");
        assert!(map.script_tag().contains(r#""./<\/script>.js""#));
    }
}
