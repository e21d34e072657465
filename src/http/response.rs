use async_trait::async_trait;
use http::{header, HeaderMap, HeaderValue, StatusCode};
use tokio::io::{self, AsyncWrite, AsyncWriteExt};

use super::{headers::HeaderMapExt, WriteHeaders};
use crate::dispatch::{method::allow_header, Verb};

#[derive(Debug, Clone)]
pub struct Response {
    pub version: String,
    pub status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Response {
    pub fn new(status: StatusCode) -> Self {
        Self {
            version: "HTTP/1.1".to_string(),
            status,
            headers: vec![(header::CONTENT_LENGTH, HeaderValue::from_static("0"))]
                .into_iter()
                .collect(),
            body: Vec::new(),
        }
    }

    pub fn ok() -> Self {
        Self::new(StatusCode::OK)
    }

    pub fn error() -> Self {
        Self::text(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
    }

    pub fn not_found() -> Self {
        Self::text(StatusCode::NOT_FOUND, "Not Found")
    }

    pub fn method_not_allowed(allowed: &[Verb]) -> Self {
        let mut response = Self::text(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
        response.insert_header(header::ALLOW, allow_header(allowed));
        response
    }

    pub fn redirect(location: &str) -> Self {
        let mut response = Self::new(StatusCode::FOUND);
        response.insert_header(header::LOCATION, location);
        response
    }

    pub fn text(status: StatusCode, body: impl Into<String>) -> Self {
        Self::new(status).with_body("text/plain; charset=utf-8", body.into().into_bytes())
    }

    pub fn html(status: StatusCode, body: impl Into<String>) -> Self {
        Self::new(status).with_body("text/html; charset=utf-8", body.into().into_bytes())
    }

    pub fn with_body(mut self, content_type: &str, body: Vec<u8>) -> Self {
        self.insert_header(header::CONTENT_TYPE, content_type);
        self.set_body(body);
        self
    }

    /// Replaces the body and keeps `Content-Length` in sync.
    pub fn set_body(&mut self, body: Vec<u8>) {
        self.insert_header(header::CONTENT_LENGTH, body.len());
        self.body = body;
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

impl HeaderMapExt for Response {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }
}

#[async_trait]
pub trait WriteResponse {
    async fn write_response(&mut self, response: &Response) -> io::Result<()>;
}

#[async_trait]
impl<R> WriteResponse for R
where
    R: AsyncWrite + ?Sized + Unpin + Send,
{
    async fn write_response(&mut self, response: &Response) -> io::Result<()> {
        self.write_all(response.version.as_bytes()).await?;
        self.write_all(b" ").await?;
        self.write_all(response.status.as_str().as_bytes()).await?;
        self.write_all(b" ").await?;
        if let Some(reason) = response.status.canonical_reason() {
            self.write_all(reason.as_bytes()).await?;
        }
        self.write_all(b"\r\n").await?;
        self.write_headers(&response.headers).await?;
        self.write_all(b"\r\n").await?;
        self.write_all(&response.body).await?;
        self.flush().await?;
        Ok(())
    }
}
