pub mod alias;
pub mod chain;
pub mod collaborators;
pub mod controller;
pub mod ctx;
pub mod dispatcher;
pub mod filter;
pub mod method;
pub mod pattern;
pub mod registry;
pub mod route;

use std::fmt::Display;

use http::StatusCode;
use tokio::io;

pub use chain::{handler_fn, Handler, HandlerChain, HandlerItem, Next};
pub use controller::{Controller, ControllerBuilder, RouteMatch};
pub use ctx::RequestContext;
pub use dispatcher::{Dispatcher, DispatcherBuilder, Resolution};
pub use filter::{FilterChain, Guard, GuardItem, Pass, Terminal};
pub use pattern::{Params, PathPattern, Rule};
pub use registry::{alias_for, RegistryBuilder, RouteRegistry};
pub use route::{Auth, Route, RouteDecl, Verb};

pub type Result<T> = std::result::Result<T, Error>;

/// Runtime failure raised by guards, handlers or collaborators.
///
/// `HttpStatus` is turned into a bare response with that status at the
/// dispatch boundary, anything else becomes a 500.
#[derive(Debug)]
pub enum Error {
    Message(String),
    HttpStatus(StatusCode),
}

impl Error {
    pub fn new<S: AsRef<str>>(message: S) -> Self {
        Self::Message(message.as_ref().to_string())
    }

    pub fn io(error: io::Error) -> Self {
        Self::Message(format!("Io({error})"))
    }

    pub fn status(status: StatusCode) -> Self {
        Self::HttpStatus(status)
    }

    pub fn get_status_code(&self) -> Option<&StatusCode> {
        match self {
            Self::HttpStatus(status) => Some(status),
            _ => None,
        }
    }
}

impl From<StatusCode> for Error {
    fn from(value: StatusCode) -> Self {
        Self::status(value)
    }
}

impl From<io::Error> for Error {
    fn from(value: io::Error) -> Self {
        Self::io(value)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Message(message) => message.fmt(f),
            Self::HttpStatus(status) => {
                "Dispatch returned status code ".fmt(f)?;
                status.fmt(f)?;
                Ok(())
            }
        }
    }
}

impl std::error::Error for Error {}

/// Route declaration problem detected while building the registry.
///
/// These never happen at request time; startup should abort on them.
#[derive(Debug)]
pub enum BuildError {
    UnknownAlias { route: String, alias: String },
    InvalidPattern { route: String, param: String, source: regex::Error },
    InvalidAlias { alias: String, source: regex::Error },
    UnknownVerb { route: String, verb: String },
    NoMethods(String),
    NoHandlers(String),
    DuplicateController(String),
    DuplicateAlias(String),
    MissingMainController,
}

impl Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownAlias { route, alias } => {
                write!(f, "route {route} references unregistered alias '{alias}'")
            }
            Self::InvalidPattern {
                route,
                param,
                source,
            } => write!(f, "route {route} has an invalid pattern for :{param}: {source}"),
            Self::InvalidAlias { alias, source } => {
                write!(f, "alias '{alias}' is not a valid pattern: {source}")
            }
            Self::UnknownVerb { route, verb } => {
                write!(f, "route {route} declares unknown method '{verb}'")
            }
            Self::NoMethods(route) => write!(f, "route {route} declares no methods"),
            Self::NoHandlers(route) => write!(f, "route {route} declares no handlers"),
            Self::DuplicateController(name) => write!(f, "controller {name} registered twice"),
            Self::DuplicateAlias(alias) => {
                write!(f, "alias '{alias}' is used by more than one controller")
            }
            Self::MissingMainController => "no main controller registered".fmt(f),
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidPattern { source, .. } | Self::InvalidAlias { source, .. } => Some(source),
            _ => None,
        }
    }
}
