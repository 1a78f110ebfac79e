//! Development server.
//!
//! Serves the project root as static files and injects the dev import map
//! into every HTML response. Modules are served as they are on disk; shared
//! dependencies resolved outside the root are served under `/@fs/`.

use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    middleware::map_response_with_state,
    response::{IntoResponse, Response},
    routing::get,
};
use importmaps::DevResolver;
use importmaps_config::DevConfig;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::error::{CliError, Result};

/// Largest HTML document the injection middleware will buffer.
const MAX_HTML_BYTES: usize = 16 * 1024 * 1024;

const FS_PREFIX: &str = "/@fs/";

/// State shared by the dev server's handlers.
#[derive(Clone)]
pub struct DevState {
    resolver: Arc<DevResolver>,
    /// Directories outside the root that `/@fs/` may read from.
    fs_allow: Arc<Vec<PathBuf>>,
}

impl DevState {
    pub fn new(root: &FsPath, resolver: Arc<DevResolver>) -> Self {
        Self {
            resolver,
            fs_allow: Arc::new(fs_allow_list(root)),
        }
    }
}

/// The root plus every `node_modules` directory above it, where hoisted
/// packages of a monorepo live.
fn fs_allow_list(root: &FsPath) -> Vec<PathBuf> {
    let mut allow = vec![root.to_path_buf()];
    allow.extend(
        root.ancestors()
            .skip(1)
            .map(|dir| dir.join("node_modules"))
            .filter(|dir| dir.is_dir()),
    );
    allow
}

pub struct DevServer {
    root: PathBuf,
    config: DevConfig,
    resolver: Arc<DevResolver>,
    json_file: Option<String>,
}

impl DevServer {
    pub fn new(root: PathBuf, config: DevConfig, resolver: Arc<DevResolver>) -> Self {
        Self {
            root,
            config,
            resolver,
            json_file: None,
        }
    }

    /// Also serve the import map as JSON under `/<file_name>`.
    pub fn with_json_file(mut self, file_name: Option<String>) -> Self {
        self.json_file = file_name;
        self
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.config.host, self.config.port)
    }

    /// Bind and serve until Ctrl-C.
    pub async fn start(self) -> Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let server_url = self.server_url();
        let app = self.router();

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| CliError::Server(format!("Failed to bind to {}: {}", addr, e)))?;

        crate::ui::success(&format!("Development server running at {}", server_url));

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| CliError::Server(format!("Server error: {}", e)))?;

        crate::ui::info("Server stopped");
        Ok(())
    }

    pub fn router(self) -> Router {
        let state = DevState::new(&self.root, self.resolver);

        let mut router = Router::new().route("/@fs/{*path}", get(handle_fs));
        if let Some(file_name) = &self.json_file {
            router = router.route(&format!("/{}", file_name), get(import_map_json));
        }

        router
            .fallback_service(ServeDir::new(&self.root))
            .layer(map_response_with_state(state.clone(), inject_import_map))
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
            .with_state(state)
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(%err, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

async fn import_map_json(State(state): State<DevState>) -> Response {
    let map = state.resolver.import_map().await;
    (
        [
            (header::CONTENT_TYPE, "application/importmap+json"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        map.to_pretty_json(),
    )
        .into_response()
}

/// Serve a file outside the root by absolute path.
///
/// Only files below an allowed directory, or next to a file the import map
/// points at through `/@fs/`, are served.
pub async fn handle_fs(
    State(state): State<DevState>,
    Path(path): Path<String>,
) -> std::result::Result<Response, Response> {
    let requested = fs_url_path(&path);
    let file = tokio::fs::canonicalize(&requested)
        .await
        .map_err(|_| not_found(&requested))?;

    if !is_allowed(&state, &file).await {
        tracing::warn!(path = %file.display(), "refusing /@fs/ request outside allowed directories");
        return Err(forbidden(&requested));
    }

    let content = tokio::fs::read(&file).await.map_err(|e| {
        tracing::error!("Error reading {}: {}", file.display(), e);
        not_found(&requested)
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type(&file)),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        content,
    )
        .into_response())
}

async fn is_allowed(state: &DevState, file: &FsPath) -> bool {
    if state.fs_allow.iter().any(|dir| file.starts_with(dir)) {
        return true;
    }

    let map = state.resolver.import_map().await;
    map.as_map()
        .values()
        .filter_map(|url| url.strip_prefix(FS_PREFIX))
        .map(|path| fs_url_path(importmaps::shape::strip_query(path)))
        .filter_map(|path| path.parent().map(FsPath::to_path_buf))
        .any(|dir| file.starts_with(dir))
}

/// Absolute path from the part of a `/@fs/` URL after the prefix.
fn fs_url_path(path: &str) -> PathBuf {
    let path = path.trim_start_matches('/');
    if cfg!(windows) {
        PathBuf::from(path)
    } else {
        PathBuf::from(format!("/{path}"))
    }
}

fn content_type(file: &FsPath) -> &'static str {
    match file.extension().and_then(|ext| ext.to_str()) {
        Some("js" | "mjs" | "cjs") => "text/javascript",
        Some("json") => "application/json",
        Some("css") => "text/css",
        Some("wasm") => "application/wasm",
        Some("map") => "application/json",
        _ => "application/octet-stream",
    }
}

fn not_found(path: &FsPath) -> Response {
    (StatusCode::NOT_FOUND, format!("File not found: {}", path.display())).into_response()
}

fn forbidden(path: &FsPath) -> Response {
    (StatusCode::FORBIDDEN, format!("Access denied: {}", path.display())).into_response()
}

fn is_html(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("text/html"))
}

/// Rewrite successful HTML responses to carry the import map.
pub async fn inject_import_map(State(state): State<DevState>, response: Response) -> Response {
    if response.status() != StatusCode::OK || !is_html(&response) {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, MAX_HTML_BYTES).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(%err, "could not buffer html response");
            return (StatusCode::INTERNAL_SERVER_ERROR, "failed to read html").into_response();
        }
    };

    let html = String::from_utf8_lossy(&bytes);
    let transformed = state.resolver.transform_index_html(&html).await;

    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    Response::from_parts(parts, Body::from(transformed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use importmaps::{ImportMaps, ImportMapsOptions};
    use importmaps_rolldown::FsModuleHost;
    use std::fs;
    use tempfile::TempDir;

    fn write_package(node_modules: &FsPath, name: &str) {
        let dir = node_modules.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("package.json"),
            format!(r#"{{ "name": "{name}", "type": "module", "main": "index.js" }}"#),
        )
        .unwrap();
        fs::write(dir.join("index.js"), "export default 1;\n").unwrap();
    }

    fn state_for(root: &FsPath, shared: &[&str]) -> DevState {
        let maps = ImportMaps::new(ImportMapsOptions::new(shared.iter().copied())).unwrap();
        let host = Arc::new(FsModuleHost::new(root));
        let resolver = Arc::new(maps.dev_resolver(root, host.clone(), host));
        DevState::new(root, resolver)
    }

    fn project() -> (TempDir, DevState) {
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        write_package(&root.join("node_modules"), "shared-lib");
        let state = state_for(&root, &["shared-lib"]);
        (dir, state)
    }

    /// A monorepo whose package hoists `shared-lib` to the workspace root.
    #[cfg(unix)]
    fn hoisted() -> (TempDir, PathBuf, DevState) {
        let dir = TempDir::new().unwrap();
        let workspace = dir.path().canonicalize().unwrap();
        write_package(&workspace.join("node_modules"), "shared-lib");
        let root = workspace.join("packages/app");
        fs::create_dir_all(&root).unwrap();
        let state = state_for(&root, &["shared-lib"]);
        (dir, workspace, state)
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn html_gets_import_map() {
        let (_dir, state) = project();
        let response = Response::builder()
            .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
            .header(header::CONTENT_LENGTH, "44")
            .body(Body::from("<html><head></head><body></body></html>"))
            .unwrap();

        let response = inject_import_map(State(state), response).await;
        assert!(response.headers().get(header::CONTENT_LENGTH).is_none());

        let html = body_text(response).await;
        assert!(
            html.contains(r#""shared-lib":"/node_modules/shared-lib/index.js""#),
            "{html}"
        );
    }

    #[tokio::test]
    async fn other_responses_pass_through() {
        let (_dir, state) = project();
        let response = Response::builder()
            .header(header::CONTENT_TYPE, "text/javascript")
            .body(Body::from("export {}"))
            .unwrap();

        let response = inject_import_map(State(state), response).await;
        assert_eq!(body_text(response).await, "export {}");
    }

    #[tokio::test]
    async fn json_route_serves_map() {
        let (_dir, state) = project();
        let response = import_map_json(State(state)).await;
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/importmap+json"
        );
        let json = body_text(response).await;
        assert!(json.contains("\"imports\""), "{json}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn hoisted_dependencies_are_served_from_fs() {
        let (_dir, workspace, state) = hoisted();
        let map = state.resolver.import_map().await;
        let url = map.get("shared-lib").unwrap().to_string();
        let expected = workspace.join("node_modules/shared-lib/index.js");
        assert_eq!(url, format!("/@fs/{}", expected.to_string_lossy().trim_start_matches('/')));

        let path = url.strip_prefix(FS_PREFIX).unwrap().to_string();
        let response = handle_fs(State(state), Path(path)).await.unwrap();
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/javascript"
        );
        assert_eq!(body_text(response).await, "export default 1;\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn fs_route_refuses_unrelated_files() {
        let (_dir, _workspace, state) = hoisted();
        let elsewhere = TempDir::new().unwrap();
        let secret = elsewhere.path().canonicalize().unwrap().join("secret.txt");
        fs::write(&secret, "nope").unwrap();

        let path = secret.to_string_lossy().trim_start_matches('/').to_string();
        let response = handle_fs(State(state.clone()), Path(path)).await.unwrap_err();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = handle_fs(State(state), Path("does/not/exist.js".into()))
            .await
            .unwrap_err();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
