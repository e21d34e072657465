use std::{collections::HashMap, fmt::Display, str::FromStr, sync::Arc};

use http::Method;

use super::{
    alias::AliasTable,
    chain::{Handler, HandlerItem},
    method::{negotiate, Negotiation},
    pattern::{Params, PathPattern, Rule},
    BuildError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
    Options,
    Trace,
}

impl Verb {
    pub const ALL: [Verb; 6] = [
        Verb::Get,
        Verb::Post,
        Verb::Put,
        Verb::Delete,
        Verb::Options,
        Verb::Trace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Delete => "DELETE",
            Verb::Options => "OPTIONS",
            Verb::Trace => "TRACE",
        }
    }

    pub fn is(&self, method: &Method) -> bool {
        self.as_str().eq_ignore_ascii_case(method.as_str())
    }
}

impl Display for Verb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.as_str().fmt(f)
    }
}

impl FromStr for Verb {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Verb::ALL
            .into_iter()
            .find(|verb| verb.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| value.to_string())
    }
}

/// Whether a route needs an authenticated session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Auth {
    Public,
    Private,
    /// Use the owning controller's default.
    #[default]
    Inherit,
}

impl Auth {
    pub fn resolve(self, controller_default: bool) -> bool {
        match self {
            Auth::Public => false,
            Auth::Private => true,
            Auth::Inherit => controller_default,
        }
    }
}

/// Builds the canonical form of a declared path.
///
/// Literal underscores become dashes and `prefix` (the owner's alias) is
/// prepended, except for the root path which always stays `/`.
pub fn canonicalize(raw: &str, prefix: Option<&str>) -> String {
    let path = raw
        .trim_matches('/')
        .split('/')
        .map(|part| {
            if part.starts_with(':') {
                part.to_string()
            } else {
                part.replace('_', "-")
            }
        })
        .collect::<Vec<_>>()
        .join("/");
    match (path.is_empty(), prefix) {
        (true, _) => "/".to_string(),
        (false, Some(alias)) => format!("/{alias}/{path}"),
        (false, None) => format!("/{path}"),
    }
}

/// Route declaration, compiled into a [Route] when the registry is built.
pub struct RouteDecl {
    path: String,
    methods: Vec<String>,
    rules: HashMap<String, Rule>,
    auth: Auth,
    handlers: Vec<HandlerItem>,
}

impl RouteDecl {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            methods: Vec::new(),
            rules: HashMap::new(),
            auth: Auth::Inherit,
            handlers: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(path).method(Verb::Get)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(path).method(Verb::Post)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(path).method(Verb::Put)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(path).method(Verb::Delete)
    }

    pub fn options(path: impl Into<String>) -> Self {
        Self::new(path).method(Verb::Options)
    }

    pub fn trace(path: impl Into<String>) -> Self {
        Self::new(path).method(Verb::Trace)
    }

    pub fn method(mut self, verb: Verb) -> Self {
        self.methods.push(verb.as_str().to_string());
        self
    }

    /// Adds methods from a list such as `"GET, POST"`; names are checked on build.
    pub fn methods(mut self, list: &str) -> Self {
        self.methods.extend(
            list.split(|c: char| c == ',' || c.is_whitespace())
                .filter(|verb| !verb.is_empty())
                .map(str::to_string),
        );
        self
    }

    pub fn rule(mut self, name: impl Into<String>, rule: Rule) -> Self {
        self.rules.insert(name.into(), rule);
        self
    }

    pub fn public(mut self) -> Self {
        self.auth = Auth::Public;
        self
    }

    pub fn private(mut self) -> Self {
        self.auth = Auth::Private;
        self
    }

    pub fn handler<H: Handler + Send + Sync + 'static>(mut self, handler: H) -> Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn compile(
        self,
        owner: &str,
        prefix: Option<&str>,
        aliases: &AliasTable,
    ) -> Result<Route, BuildError> {
        let canonical_path = canonicalize(&self.path, prefix);
        let mut methods = Vec::with_capacity(self.methods.len());
        for name in &self.methods {
            let verb = name.parse::<Verb>().map_err(|verb| BuildError::UnknownVerb {
                route: canonical_path.clone(),
                verb,
            })?;
            if !methods.contains(&verb) {
                methods.push(verb);
            }
        }
        if methods.is_empty() {
            return Err(BuildError::NoMethods(canonical_path));
        }
        if self.handlers.is_empty() {
            return Err(BuildError::NoHandlers(canonical_path));
        }
        let pattern = PathPattern::compile(&canonical_path, &self.rules, aliases)?;
        Ok(Route {
            raw_path: self.path,
            canonical_path,
            methods: methods.into_boxed_slice(),
            pattern,
            auth: self.auth,
            handlers: self.handlers.into_boxed_slice(),
            owner: owner.to_string(),
        })
    }
}

pub struct Route {
    raw_path: String,
    canonical_path: String,
    methods: Box<[Verb]>,
    pattern: PathPattern,
    auth: Auth,
    handlers: Box<[HandlerItem]>,
    owner: String,
}

impl Route {
    pub fn raw_path(&self) -> &str {
        &self.raw_path
    }

    pub fn canonical_path(&self) -> &str {
        &self.canonical_path
    }

    pub fn methods(&self) -> &[Verb] {
        &self.methods
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn auth(&self) -> Auth {
        self.auth
    }

    pub fn handlers(&self) -> &[HandlerItem] {
        &self.handlers
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Routes without captures are matched by plain string comparison.
    pub fn is_exact(&self) -> bool {
        !self.pattern.has_captures()
    }

    pub fn matches(&self, path: &str) -> Option<Params> {
        if self.is_exact() {
            (self.canonical_path == path).then(Params::new)
        } else {
            self.pattern.matches(path)
        }
    }

    pub fn negotiate(&self, method: &Method) -> Negotiation {
        negotiate(&self.methods, method)
    }

    pub(crate) fn overlaps(&self, other: &Route) -> bool {
        self.canonical_path == other.canonical_path
            && self.methods.iter().any(|verb| other.methods.contains(verb))
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("owner", &self.owner)
            .field("path", &self.canonical_path)
            .field("methods", &self.methods)
            .field("auth", &self.auth)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{dispatch::handler_fn, http::Response};

    fn ok() -> impl Handler + Send + Sync + 'static {
        handler_fn(|_| async { Ok(Response::ok()) })
    }

    #[test]
    fn canonical_path_is_normalized() {
        assert_eq!(canonicalize("about", None), "/about");
        assert_eq!(canonicalize("/about/", None), "/about");
        assert_eq!(canonicalize("blog_post", Some("blog")), "/blog/blog-post");
        assert_eq!(canonicalize("/:user_id", Some("users")), "/users/:user_id");
    }

    #[test]
    fn root_is_never_prefixed() {
        assert_eq!(canonicalize("/", Some("blog")), "/");
        assert_eq!(canonicalize("", Some("blog")), "/");
        assert_eq!(canonicalize("/", None), "/");
    }

    #[test]
    fn verbs_parse_case_insensitively() {
        assert_eq!("get".parse::<Verb>(), Ok(Verb::Get));
        assert_eq!("Delete".parse::<Verb>(), Ok(Verb::Delete));
        assert_eq!("PATCH".parse::<Verb>(), Err("PATCH".to_string()));
    }

    #[test]
    fn auth_resolves_against_controller_default() {
        assert_eq!(Auth::Public.resolve(true), false);
        assert_eq!(Auth::Private.resolve(false), true);
        assert_eq!(Auth::Inherit.resolve(true), true);
        assert_eq!(Auth::Inherit.resolve(false), false);
    }

    #[test]
    fn method_list_is_parsed_on_compile() {
        let route = RouteDecl::new("/items")
            .methods("get, POST put")
            .method(Verb::Get)
            .handler(ok())
            .compile("MainController", None, &AliasTable::builtin().unwrap())
            .unwrap();
        assert_eq!(route.methods(), &[Verb::Get, Verb::Post, Verb::Put]);
    }

    #[test]
    fn malformed_method_list_is_rejected() {
        let error = RouteDecl::new("/items")
            .methods("GET, FETCH")
            .handler(ok())
            .compile("MainController", None, &AliasTable::builtin().unwrap());
        assert!(matches!(error, Err(BuildError::UnknownVerb { verb, .. }) if verb == "FETCH"));

        let error = RouteDecl::new("/items")
            .handler(ok())
            .compile("MainController", None, &AliasTable::builtin().unwrap());
        assert!(matches!(error, Err(BuildError::NoMethods(_))));
    }

    #[test]
    fn handler_chain_must_not_be_empty() {
        let error = RouteDecl::get("/items").compile("MainController", None, &AliasTable::builtin().unwrap());
        assert!(matches!(error, Err(BuildError::NoHandlers(path)) if path == "/items"));
    }

    #[test]
    fn exact_route_matches_by_equality() {
        let route = RouteDecl::get("/about")
            .handler(ok())
            .compile("MainController", None, &AliasTable::builtin().unwrap())
            .unwrap();
        assert_eq!(route.is_exact(), true);
        assert_eq!(route.matches("/about"), Some(Params::new()));
        assert_eq!(route.matches("/About"), None);
    }
}
