use std::collections::HashMap;

use async_trait::async_trait;
use http::{HeaderMap, Method};
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt};

use super::{headers::HeaderMapExt, ReadHeaders};
use crate::io::error::{error, RequestStatusLine};

#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    /// Path without the query string.
    pub path: String,
    pub query: HashMap<String, String>,
    pub version: String,
    headers: HeaderMap,
    pub body: Vec<u8>,
    /// Path parameters captured by the matched route.
    pub params: HashMap<String, String>,
    /// Form fields filled by the body parser.
    pub fields: HashMap<String, String>,
}

impl Request {
    pub fn new(method: Method, uri: &str) -> Self {
        let (path, query) = match uri.split_once('?') {
            Some((path, query)) => (path, parse_query(query)),
            None => (uri, HashMap::new()),
        };
        Self {
            method,
            path: path.to_string(),
            query,
            version: "HTTP/1.1".to_string(),
            headers: HeaderMap::new(),
            body: Vec::new(),
            params: HashMap::new(),
            fields: HashMap::new(),
        }
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }
}

fn parse_query(query: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect()
}

impl HeaderMapExt for Request {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }
}

/// Reads the request line and headers. The body is left in the reader.
#[async_trait]
pub trait ReadRequest {
    async fn read_request(&mut self) -> io::Result<Request>;
}

#[async_trait]
impl<R> ReadRequest for R
where
    R: AsyncBufRead + ?Sized + Unpin + Send,
{
    async fn read_request(&mut self) -> io::Result<Request> {
        let mut status_line = String::new();
        if self.read_line(&mut status_line).await? == 0 {
            return Err(error(RequestStatusLine::MissingStatusLine));
        }
        let (method, uri, version) = {
            let mut parts = status_line.split_whitespace();
            (
                parts
                    .next()
                    .ok_or(error(RequestStatusLine::MissingMethod))?
                    .parse::<Method>()
                    .map_err(|_| error(RequestStatusLine::InvalidMethod))?,
                parts
                    .next()
                    .ok_or(error(RequestStatusLine::MissingPath))?
                    .to_string(),
                parts
                    .next()
                    .ok_or(error(RequestStatusLine::MissingVersion))?
                    .to_string(),
            )
        };
        let mut request = Request::new(method, &uri);
        request.version = version;
        request.headers = self.read_headers().await?;
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use http::header;
    use pretty_assertions::assert_eq;
    use tokio::io::BufReader;

    use super::*;

    #[test]
    fn query_is_split_from_path() {
        let request = Request::new(Method::GET, "/search?q=rust+lang&page=2");
        assert_eq!(request.path, "/search");
        assert_eq!(request.query_param("q"), Some("rust lang"));
        assert_eq!(request.query_param("page"), Some("2"));
        assert_eq!(request.query_param("missing"), None);
    }

    #[tokio::test]
    async fn parses_request_head() {
        let raw = b"POST /users/7?x=1 HTTP/1.1\r\nHost: localhost\r\nContent-Length: 3\r\n\r\nabc";
        let mut reader = BufReader::new(&raw[..]);
        let request = reader.read_request().await.unwrap();
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.path, "/users/7");
        assert_eq!(request.query_param("x"), Some("1"));
        assert_eq!(request.version, "HTTP/1.1");
        assert_eq!(request.header(header::HOST).unwrap(), "localhost");
        assert_eq!(request.get_content_length(), Some(3));
        assert_eq!(reader.buffer(), b"abc");
    }

    #[tokio::test]
    async fn rejects_incomplete_status_line() {
        let mut reader = BufReader::new(&b"GET\r\n\r\n"[..]);
        assert!(reader.read_request().await.is_err());
        let mut reader = BufReader::new(&b""[..]);
        assert!(reader.read_request().await.is_err());
    }
}
