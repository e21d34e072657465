//! Controller-based request dispatch over a small HTTP/1.1 server.
//!
//! Routes are declared per controller. A non-main controller's routes are
//! prefixed with its alias, derived from the controller name. Requests are
//! resolved against the owning controller, then the main controller, then
//! static views and static files, and finally answered with 404.
//!
//! # Example usage
//!
//! ```no_run
//! use dispatcher::{
//!     dispatch::{handler_fn, Controller, RouteDecl, RouteRegistry, Rule},
//!     http::Response,
//! };
//! use http::StatusCode;
//!
//! # async fn run() -> anyhow::Result<()> {
//! dispatcher::telemetry::install();
//! let registry = RouteRegistry::builder()
//!     .main(Controller::builder("MainController").route(
//!         RouteDecl::get("/").handler(handler_fn(|_| async { Ok(Response::text(StatusCode::OK, "home")) })),
//!     ))
//!     .controller(Controller::builder("UsersController").route(
//!         RouteDecl::get("/:id")
//!             .rule("id", Rule::alias("integer"))
//!             .handler(handler_fn(|request| async move {
//!                 let id = request.param("id").unwrap_or_default().to_string();
//!                 Ok(Response::text(StatusCode::OK, id))
//!             })),
//!     ))
//!     .build()?;
//! dispatcher::builder(registry)
//!     .with_app_port(8080)
//!     .build()?
//!     .run()
//!     .await;
//! # Ok(())
//! # }
//! ```
pub mod dispatch;
pub mod http;
pub(crate) mod io;
pub mod server;
pub mod telemetry;
pub(crate) mod utils;

pub use server::app::{builder, Server, ServerBuilder};
