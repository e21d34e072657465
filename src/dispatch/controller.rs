use std::sync::Arc;

use http::Method;
use tracing::trace;

use super::{
    alias::AliasTable,
    filter::{Guard, GuardItem},
    method::Negotiation,
    pattern::Params,
    registry::alias_for,
    route::{Route, RouteDecl},
    BuildError,
};

/// Outcome of scanning one controller's routes.
#[derive(Debug)]
pub enum RouteMatch<'a> {
    Matched { route: &'a Route, params: Params },
    WrongMethod { route: &'a Route },
    NoMatch,
}

/// A named group of routes sharing an alias, an auth default and a filter chain.
pub struct Controller {
    name: String,
    alias: String,
    auth_required: bool,
    filters: Box<[GuardItem]>,
    routes: Box<[Route]>,
}

impl Controller {
    pub fn builder(name: impl Into<String>) -> ControllerBuilder {
        ControllerBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn auth_required(&self) -> bool {
        self.auth_required
    }

    pub fn filters(&self) -> &[GuardItem] {
        &self.filters
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Finds the route answering `path`.
    ///
    /// Capture-free routes are compared first, then pattern routes in
    /// registration order. A path match always ends the scan, whether or not
    /// the method is accepted.
    pub fn process_route(&self, method: &Method, path: &str) -> RouteMatch<'_> {
        let exact = self
            .routes
            .iter()
            .filter(|route| route.is_exact())
            .find(|route| route.canonical_path() == path)
            .map(|route| {
                trace!(controller = self.name.as_str(), route = route.canonical_path(), "EXACT_MATCH");
                (route, Params::new())
            });
        let found = exact.or_else(|| {
            self.routes
                .iter()
                .filter(|route| !route.is_exact())
                .find_map(|route| route.pattern().matches(path).map(|params| (route, params)))
                .map(|(route, params)| {
                    trace!(controller = self.name.as_str(), route = route.canonical_path(), "PATTERN_MATCH");
                    (route, params)
                })
        });
        match found {
            Some((route, params)) => match route.negotiate(method) {
                Negotiation::Match => RouteMatch::Matched { route, params },
                Negotiation::WrongMethod => RouteMatch::WrongMethod { route },
            },
            None => RouteMatch::NoMatch,
        }
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("name", &self.name)
            .field("alias", &self.alias)
            .field("auth_required", &self.auth_required)
            .field("filters", &self.filters.iter().map(|g| g.name()).collect::<Vec<_>>())
            .field("routes", &self.routes)
            .finish()
    }
}

pub struct ControllerBuilder {
    name: String,
    alias: Option<String>,
    auth_required: bool,
    filters: Vec<GuardItem>,
    routes: Vec<RouteDecl>,
}

impl ControllerBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            auth_required: false,
            filters: Vec::new(),
            routes: Vec::new(),
        }
    }

    /// Overrides the alias derived from the controller name.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn auth_required(mut self, required: bool) -> Self {
        self.auth_required = required;
        self
    }

    pub fn filter<G: Guard + Send + Sync + 'static>(mut self, guard: G) -> Self {
        self.filters.push(Arc::new(guard));
        self
    }

    pub fn route(mut self, route: RouteDecl) -> Self {
        self.routes.push(route);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn resolved_alias(&self) -> String {
        self.alias
            .clone()
            .unwrap_or_else(|| alias_for(&self.name))
    }

    /// Compiles the declared routes. Routes of the main controller are not
    /// prefixed with its alias.
    pub(crate) fn build(self, is_main: bool, aliases: &AliasTable) -> Result<Controller, BuildError> {
        let alias = self.resolved_alias();
        let prefix = (!is_main).then_some(alias.as_str());
        let routes = self
            .routes
            .into_iter()
            .map(|route| route.compile(&self.name, prefix, aliases))
            .collect::<Result<Box<[_]>, _>>()?;
        Ok(Controller {
            name: self.name,
            alias,
            auth_required: self.auth_required,
            filters: self.filters.into_boxed_slice(),
            routes,
        })
    }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        dispatch::{handler_fn, Handler, Rule},
        http::Response,
    };

    fn reply(body: &'static str) -> impl Handler + Send + Sync + 'static {
        handler_fn(move |_| async move { Ok(Response::text(StatusCode::OK, body)) })
    }

    fn users() -> Controller {
        Controller::builder("UsersController")
            .route(RouteDecl::get("/:id").rule("id", Rule::alias("integer")).handler(reply("by-id")))
            .route(RouteDecl::get("/:name").rule("name", Rule::alias("alpha")).handler(reply("by-name")))
            .route(RouteDecl::post("/new").handler(reply("create")))
            .route(RouteDecl::get("/:any").rule("any", Rule::pattern(".+")).handler(reply("any")))
            .build(false, &AliasTable::builtin().unwrap())
            .unwrap()
    }

    #[test]
    fn routes_are_prefixed_with_alias() {
        let controller = users();
        assert_eq!(controller.alias(), "users");
        let paths = controller
            .routes()
            .iter()
            .map(Route::canonical_path)
            .collect::<Vec<_>>();
        assert_eq!(paths, vec!["/users/:id", "/users/:name", "/users/new", "/users/:any"]);
    }

    #[test]
    fn first_registered_pattern_wins() {
        let controller = users();
        match controller.process_route(&Method::GET, "/users/7") {
            RouteMatch::Matched { route, params } => {
                assert_eq!(route.raw_path(), "/:id");
                assert_eq!(params["id"], "7");
            }
            other => panic!("unexpected {other:?}"),
        }
        match controller.process_route(&Method::GET, "/users/bob") {
            RouteMatch::Matched { route, .. } => assert_eq!(route.raw_path(), "/:name"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn exact_tier_is_checked_before_patterns() {
        let controller = users();
        match controller.process_route(&Method::GET, "/users/new") {
            RouteMatch::WrongMethod { route } => assert_eq!(route.canonical_path(), "/users/new"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            controller.process_route(&Method::POST, "/users/new"),
            RouteMatch::Matched { .. }
        ));
    }

    #[test]
    fn wrong_method_ends_scan() {
        let controller = Controller::builder("MainController")
            .route(RouteDecl::get("/items/:id").rule("id", Rule::alias("integer")).handler(reply("get")))
            .route(RouteDecl::delete("/items/:id").rule("id", Rule::alias("integer")).handler(reply("delete")))
            .build(true, &AliasTable::builtin().unwrap())
            .unwrap();
        assert!(matches!(
            controller.process_route(&Method::DELETE, "/items/3"),
            RouteMatch::WrongMethod { .. }
        ));
    }

    #[test]
    fn unmatched_path_is_no_match() {
        assert!(matches!(
            users().process_route(&Method::GET, "/users/1/2"),
            RouteMatch::NoMatch
        ));
    }

    #[test]
    fn explicit_alias_overrides_derived_one() {
        let controller = Controller::builder("UserProfileController")
            .alias("me")
            .route(RouteDecl::get("settings").handler(reply("settings")))
            .build(false, &AliasTable::builtin().unwrap())
            .unwrap();
        assert_eq!(controller.alias(), "me");
        assert_eq!(controller.routes()[0].canonical_path(), "/me/settings");
    }
}
