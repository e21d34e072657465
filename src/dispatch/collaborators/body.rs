use async_trait::async_trait;
use http::{header, StatusCode};

use crate::{
    dispatch::{Error, Result},
    http::{HeaderMapExt, Request},
};

/// Fills `Request::fields` from the request body. Only called for POST and PUT.
#[async_trait]
pub trait BodyParser {
    async fn parse(&self, request: &mut Request) -> Result<()>;
}

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Parses `application/x-www-form-urlencoded` bodies; other content types
/// are left untouched.
#[derive(Debug, Clone)]
pub struct FormParser {
    limit: usize,
}

impl FormParser {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }
}

impl Default for FormParser {
    fn default() -> Self {
        Self::new(1024 * 1024)
    }
}

#[async_trait]
impl BodyParser for FormParser {
    async fn parse(&self, request: &mut Request) -> Result<()> {
        if request.body.len() > self.limit {
            return Err(Error::status(StatusCode::PAYLOAD_TOO_LARGE));
        }
        let is_form = request
            .header(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with(FORM_CONTENT_TYPE));
        if !is_form {
            return Ok(());
        }
        let fields = url::form_urlencoded::parse(&request.body)
            .into_owned()
            .collect::<Vec<_>>();
        request.fields.extend(fields);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use http::Method;
    use pretty_assertions::assert_eq;

    use super::*;

    fn form(body: &str) -> Request {
        let mut request = Request::new(Method::POST, "/submit");
        request.insert_header(header::CONTENT_TYPE, FORM_CONTENT_TYPE);
        request.body = body.as_bytes().to_vec();
        request
    }

    #[tokio::test]
    async fn parses_urlencoded_fields() {
        let mut request = form("name=Ada+Lovelace&lang=en%2Dgb");
        FormParser::default().parse(&mut request).await.unwrap();
        assert_eq!(request.field("name"), Some("Ada Lovelace"));
        assert_eq!(request.field("lang"), Some("en-gb"));
    }

    #[tokio::test]
    async fn ignores_other_content_types() {
        let mut request = Request::new(Method::POST, "/submit");
        request.insert_header(header::CONTENT_TYPE, "application/json");
        request.body = br#"{"name":"Ada"}"#.to_vec();
        FormParser::default().parse(&mut request).await.unwrap();
        assert!(request.fields.is_empty());
    }

    #[tokio::test]
    async fn rejects_oversized_body() {
        let mut request = form("name=Ada");
        let error = FormParser::new(4).parse(&mut request).await.unwrap_err();
        assert_eq!(error.get_status_code(), Some(&StatusCode::PAYLOAD_TOO_LARGE));
    }
}
