use std::collections::HashMap;

use async_trait::async_trait;
use http::StatusCode;

use crate::{
    dispatch::Result,
    http::{Request, Response},
};

pub type TemplateId = String;

/// Exact URL to template association, consulted for unmatched GET requests.
#[async_trait]
pub trait StaticViews {
    fn resolve(&self, path: &str) -> Option<TemplateId>;

    async fn render(&self, template: &TemplateId, request: &Request) -> Result<Response>;
}

/// Static views held in memory as `path -> (template, html)`.
#[derive(Debug, Clone, Default)]
pub struct StaticViewMap {
    paths: HashMap<String, TemplateId>,
    templates: HashMap<TemplateId, String>,
}

impl StaticViewMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(
        mut self,
        path: impl Into<String>,
        template: impl Into<TemplateId>,
        html: impl Into<String>,
    ) -> Self {
        let template = template.into();
        self.paths.insert(path.into(), template.clone());
        self.templates.insert(template, html.into());
        self
    }
}

#[async_trait]
impl StaticViews for StaticViewMap {
    fn resolve(&self, path: &str) -> Option<TemplateId> {
        self.paths.get(path).cloned()
    }

    async fn render(&self, template: &TemplateId, _request: &Request) -> Result<Response> {
        let html = self
            .templates
            .get(template)
            .ok_or(StatusCode::NOT_FOUND)?;
        Ok(Response::html(StatusCode::OK, html.as_str()))
    }
}
