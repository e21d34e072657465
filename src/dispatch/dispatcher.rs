use std::{panic::AssertUnwindSafe, sync::Arc};

use arc_swap::ArcSwap;
use async_trait::async_trait;
use futures::FutureExt;
use http::{Method, StatusCode};
use tracing::{debug, error, info, trace};

use super::{
    chain::HandlerChain,
    collaborators::{
        BodyParser, BodyParserService, FormParser, Login, LoginService, SessionLoader,
        SessionLoaderService, StaticFiles, StaticFilesService, StaticViews, StaticViewsService,
        TemplateId,
    },
    controller::{Controller, RouteMatch},
    ctx::RequestContext,
    filter::{FilterChain, Terminal},
    method::Negotiation,
    registry::RouteRegistry,
    route::Route,
    Error, Result,
};
use crate::http::{Request, Response};

/// Where a request ends up, computed without running any guard or handler.
#[derive(Debug)]
pub enum Resolution<'r> {
    Matched {
        controller: &'r Controller,
        route: &'r Route,
    },
    MethodNotAllowed {
        controller: &'r Controller,
        route: &'r Route,
    },
    StaticView(TemplateId),
    StaticFile,
    NotFound,
}

/// Resolves requests against the route registry and runs the matched route.
pub struct Dispatcher {
    registry: ArcSwap<RouteRegistry>,
    body_parser: Option<BodyParserService>,
    sessions: Option<SessionLoaderService>,
    login: Option<LoginService>,
    views: Option<StaticViewsService>,
    files: Option<StaticFilesService>,
}

impl Dispatcher {
    pub fn new(registry: RouteRegistry) -> Self {
        Self::builder(registry).build()
    }

    pub fn builder(registry: RouteRegistry) -> DispatcherBuilder {
        DispatcherBuilder::new(registry)
    }

    pub fn registry(&self) -> Arc<RouteRegistry> {
        self.registry.load_full()
    }

    /// Replaces the whole route table. Requests already in flight finish on
    /// the table they started with.
    pub fn reload(&self, registry: RouteRegistry) {
        self.registry.store(Arc::new(registry));
        info!("Route registry reloaded");
    }

    /// Walks the resolution tiers for `ctx`: owner table, main table, static
    /// view, static files. Fills `ctx.params` and `ctx.owner` on the way.
    pub fn resolve<'r>(&self, registry: &'r RouteRegistry, ctx: &mut RequestContext) -> Resolution<'r> {
        let owner = Self::owner(registry, ctx);
        ctx.owner = Some(owner.name().to_string());
        trace!(
            path = ctx.path.as_str(),
            owner = owner.name(),
            "{}",
            if ctx.is_main_request {
                "ROOT_OR_SINGLE_SEGMENT"
            } else {
                "MULTI_SEGMENT"
            }
        );
        if let Some(resolution) = Self::scan(owner, ctx) {
            return resolution;
        }
        if registry.is_main(owner) {
            if ctx.path == "/" {
                // Root routes of other controllers are never prefixed.
                let found = registry
                    .controllers()
                    .iter()
                    .filter(|controller| !registry.is_main(controller))
                    .find_map(|controller| Self::root_route(controller, &ctx.method));
                if let Some(resolution) = found {
                    return resolution;
                }
            }
        } else {
            trace!(path = ctx.path.as_str(), owner = owner.name(), "FALLBACK_OWNER_MAIN");
            if let Some(resolution) = Self::scan(registry.main(), ctx) {
                return resolution;
            }
        }
        if ctx.method != Method::GET {
            trace!(path = ctx.path.as_str(), method = %ctx.method, "NOT_FOUND");
            return Resolution::NotFound;
        }
        trace!(path = ctx.path.as_str(), "FALLBACK_STATIC");
        if let Some(template) = self.views.as_ref().and_then(|views| views.resolve(&ctx.path)) {
            return Resolution::StaticView(template);
        }
        if self.files.is_some() {
            return Resolution::StaticFile;
        }
        trace!(path = ctx.path.as_str(), "NOT_FOUND");
        Resolution::NotFound
    }

    /// Produces exactly one response for `request`. Errors and panics raised
    /// while serving it are turned into error responses here.
    pub async fn dispatch(&self, request: Request) -> Response {
        let method = request.method.clone();
        let path = request.path.clone();
        match AssertUnwindSafe(self.execute(request)).catch_unwind().await {
            Ok(Ok(response)) => response,
            Ok(Err(Error::HttpStatus(status))) => {
                debug!(%method, path = path.as_str(), %status, "Request failed with status");
                match status {
                    StatusCode::NOT_FOUND => Response::not_found(),
                    status => Response::new(status),
                }
            }
            Ok(Err(error)) => {
                error!(%method, path = path.as_str(), %error, "Request failed");
                Response::error()
            }
            Err(_) => {
                error!(%method, path = path.as_str(), "Handler panicked");
                Response::error()
            }
        }
    }

    async fn execute(&self, mut request: Request) -> Result<Response> {
        let registry = self.registry();
        let mut ctx = RequestContext::new(request.method.clone(), &request.path);
        match self.resolve(&registry, &mut ctx) {
            Resolution::Matched { controller, route } => {
                request.params = std::mem::take(&mut ctx.params);
                if matches!(request.method, Method::POST | Method::PUT) {
                    if let Some(parser) = &self.body_parser {
                        parser.parse(&mut request).await?;
                    }
                }
                let terminal = RouteTerminal {
                    route,
                    auth_required: route.auth().resolve(controller.auth_required()),
                    sessions: self.sessions.as_ref(),
                    login: self.login.as_ref(),
                };
                let response = FilterChain::run(controller.filters(), request, &terminal).await?;
                ctx.handled = true;
                debug!(
                    controller = controller.name(),
                    route = route.canonical_path(),
                    status = %response.status,
                    "HANDLED"
                );
                Ok(response)
            }
            Resolution::MethodNotAllowed { route, .. } => {
                debug!(
                    method = %ctx.method,
                    route = route.canonical_path(),
                    "METHOD_MISMATCH"
                );
                Ok(Response::method_not_allowed(route.methods()))
            }
            Resolution::StaticView(template) => match &self.views {
                Some(views) => views.render(&template, &request).await,
                None => Ok(Response::not_found()),
            },
            Resolution::StaticFile => match &self.files {
                Some(files) => files.serve(&ctx.path, &request).await,
                None => Ok(Response::not_found()),
            },
            Resolution::NotFound => Ok(Response::not_found()),
        }
    }

    fn owner<'r>(registry: &'r RouteRegistry, ctx: &RequestContext) -> &'r Controller {
        registry
            .by_alias(ctx.first_segment())
            .unwrap_or_else(|| registry.main())
    }

    fn root_route<'r>(controller: &'r Controller, method: &Method) -> Option<Resolution<'r>> {
        let route = controller
            .routes()
            .iter()
            .find(|route| route.canonical_path() == "/")?;
        trace!(controller = controller.name(), "ROOT_ROUTE");
        Some(match route.negotiate(method) {
            Negotiation::Match => Resolution::Matched { controller, route },
            Negotiation::WrongMethod => Resolution::MethodNotAllowed { controller, route },
        })
    }

    fn scan<'r>(controller: &'r Controller, ctx: &mut RequestContext) -> Option<Resolution<'r>> {
        match controller.process_route(&ctx.method, &ctx.path) {
            RouteMatch::Matched { route, params } => {
                ctx.params = params;
                Some(Resolution::Matched { controller, route })
            }
            RouteMatch::WrongMethod { route } => Some(Resolution::MethodNotAllowed { controller, route }),
            RouteMatch::NoMatch => None,
        }
    }
}

/// Session gate followed by the route's handler chain.
struct RouteTerminal<'a> {
    route: &'a Route,
    auth_required: bool,
    sessions: Option<&'a SessionLoaderService>,
    login: Option<&'a LoginService>,
}

#[async_trait]
impl Terminal for RouteTerminal<'_> {
    async fn run(&self, mut request: Request) -> Result<Response> {
        if self.auth_required {
            let authenticated = match self.sessions {
                Some(sessions) => sessions.load(&mut request).await?,
                None => false,
            };
            if !authenticated {
                debug!(route = self.route.canonical_path(), "No session, handing over to login");
                return Ok(match self.login {
                    Some(login) => login.login(&request),
                    None => Response::text(StatusCode::UNAUTHORIZED, "Unauthorized"),
                });
            }
        }
        HandlerChain::invoke(self.route.handlers(), request).await
    }
}

pub struct DispatcherBuilder {
    registry: RouteRegistry,
    body_parser: Option<BodyParserService>,
    sessions: Option<SessionLoaderService>,
    login: Option<LoginService>,
    views: Option<StaticViewsService>,
    files: Option<StaticFilesService>,
}

impl DispatcherBuilder {
    pub fn new(registry: RouteRegistry) -> Self {
        Self {
            registry,
            body_parser: Some(Box::new(FormParser::default())),
            sessions: None,
            login: None,
            views: None,
            files: None,
        }
    }

    pub fn body_parser<P: BodyParser + Send + Sync + 'static>(mut self, parser: P) -> Self {
        self.body_parser = Some(Box::new(parser));
        self
    }

    pub fn without_body_parser(mut self) -> Self {
        self.body_parser = None;
        self
    }

    pub fn sessions<S: SessionLoader + Send + Sync + 'static>(mut self, sessions: S) -> Self {
        self.sessions = Some(Box::new(sessions));
        self
    }

    pub fn login<L: Login + Send + Sync + 'static>(mut self, login: L) -> Self {
        self.login = Some(Box::new(login));
        self
    }

    pub fn views<V: StaticViews + Send + Sync + 'static>(mut self, views: V) -> Self {
        self.views = Some(Box::new(views));
        self
    }

    /// Enables the static file tier.
    pub fn files<F: StaticFiles + Send + Sync + 'static>(mut self, files: F) -> Self {
        self.files = Some(Box::new(files));
        self
    }

    pub fn build(self) -> Dispatcher {
        Dispatcher {
            registry: ArcSwap::from_pointee(self.registry),
            body_parser: self.body_parser,
            sessions: self.sessions,
            login: self.login,
            views: self.views,
            files: self.files,
        }
    }
}
