use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use http::{header, StatusCode};
use tokio::{fs, io};
use tracing::debug;

use crate::{
    dispatch::Result,
    http::{HeaderMapExt, Request, Response},
};

/// Last-resort file server. Always produces a response, including its own 404.
#[async_trait]
pub trait StaticFiles {
    async fn serve(&self, full_path: &str, request: &Request) -> Result<Response>;
}

/// Serves files below a root directory.
#[derive(Debug, Clone)]
pub struct DirectoryFiles {
    root: PathBuf,
}

impl DirectoryFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn locate(&self, full_path: &str) -> Option<PathBuf> {
        let relative = Path::new(full_path.trim_start_matches('/'));
        if relative
            .components()
            .any(|component| !matches!(component, Component::Normal(_)))
        {
            return None;
        }
        Some(self.root.join(relative))
    }
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("json") => "application/json",
        Some("txt") => "text/plain; charset=utf-8",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

#[async_trait]
impl StaticFiles for DirectoryFiles {
    async fn serve(&self, full_path: &str, _request: &Request) -> Result<Response> {
        let Some(path) = self.locate(full_path) else {
            debug!(path = full_path, "Rejected static file path");
            return Ok(Response::not_found());
        };
        match fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => {}
            Ok(_) => return Ok(Response::not_found()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Response::not_found()),
            Err(error) => return Err(error.into()),
        }
        let contents = fs::read(&path).await?;
        let mut response = Response::new(StatusCode::OK);
        response.insert_header(header::CONTENT_TYPE, content_type(&path));
        response.set_body(contents);
        Ok(response)
    }
}
