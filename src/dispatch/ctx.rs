use http::Method;

use super::pattern::Params;

/// Strips the query string and a single trailing slash; consecutive slashes
/// are left alone so segment counts stay meaningful.
pub fn normalize(path: &str) -> String {
    let path = path.split_once('?').map_or(path, |(path, _)| path);
    let path = match path.strip_suffix('/') {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => path,
    };
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// `/` and single-segment paths are main requests.
pub fn is_main_request(path: &str) -> bool {
    path == "/" || !path.trim_start_matches('/').contains('/')
}

/// Per-request resolution state, owned by the task serving the request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub path: String,
    pub method: Method,
    pub params: Params,
    pub handled: bool,
    pub is_main_request: bool,
    pub owner: Option<String>,
}

impl RequestContext {
    pub fn new(method: Method, path: &str) -> Self {
        let path = normalize(path);
        Self {
            is_main_request: is_main_request(&path),
            path,
            method,
            params: Params::new(),
            handled: false,
            owner: None,
        }
    }

    /// First path segment, used to pick the owning controller by alias.
    pub fn first_segment(&self) -> &str {
        let path = self.path.trim_start_matches('/');
        path.split_once('/').map_or(path, |(first, _)| first)
    }
}
