use std::{net::IpAddr, path::PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use dispatcher::{
    dispatch::{
        collaborators::{DirectoryFiles, MemorySessions, RedirectLogin, StaticViewMap, SESSION_USER_HEADER},
        handler_fn, Controller, Guard, Handler, Next, Pass, RouteDecl, RouteRegistry, Rule,
    },
    http::{HeaderMapExt, Request, Response},
};
use http::StatusCode;
use structopt::StructOpt;
use tracing::info;

#[derive(Debug, StructOpt)]
#[structopt(name = "dispatcher", about = "Demo application for the controller dispatcher")]
struct Options {
    #[structopt(long, env = "HOST", default_value = "127.0.0.1")]
    host: IpAddr,

    #[structopt(long, env = "PORT", default_value = "7878")]
    port: u16,

    #[structopt(long, env = "HEALTHCHECK_PORT", default_value = "9000")]
    health_check_port: u16,

    /// Directory served for GET requests no route or static view answers.
    #[structopt(long, env = "STATIC_DIR", parse(from_os_str))]
    static_dir: Option<PathBuf>,

    #[structopt(long, env = "LOGIN_URL", default_value = "/login")]
    login_url: String,
}

/// Adds `X-Server` to every response of the controller it guards.
struct Branding;

#[async_trait]
impl Guard for Branding {
    async fn run(&self, request: Request, pass: Pass<'_>) -> dispatcher::dispatch::Result<Response> {
        let mut response = pass.run(request).await?;
        response.insert_header("X-Server", "dispatcher");
        Ok(response)
    }
}

/// Rejects user ids above the demo range before the page handler runs.
struct KnownUser;

#[async_trait]
impl Handler for KnownUser {
    async fn call(&self, request: Request, next: Next<'_>) -> dispatcher::dispatch::Result<Response> {
        match request.param("id").and_then(|id| id.parse::<u32>().ok()) {
            Some(id) if id <= 1000 => next.run(request).await,
            _ => Ok(Response::not_found()),
        }
    }
}

fn registry() -> Result<RouteRegistry> {
    let registry = RouteRegistry::builder()
        .main(
            Controller::builder("MainController")
                .filter(Branding)
                .route(RouteDecl::get("/").handler(handler_fn(|_| async {
                    Ok(Response::html(StatusCode::OK, "<h1>Home</h1>"))
                })))
                .route(RouteDecl::new("/login").methods("GET, POST").public().handler(handler_fn(
                    |request| async move {
                        let user = request.field("user").unwrap_or("guest").to_string();
                        Ok(Response::text(StatusCode::OK, format!("login form for {user}")))
                    },
                ))),
        )
        .controller(
            Controller::builder("UsersController").route(
                RouteDecl::get("/:id")
                    .rule("id", Rule::alias("integer"))
                    .handler(KnownUser)
                    .handler(handler_fn(|request| async move {
                        let id = request.param("id").unwrap_or_default().to_string();
                        Ok(Response::text(StatusCode::OK, format!("user {id}")))
                    })),
            ),
        )
        .controller(
            Controller::builder("BlogController")
                .auth_required(true)
                .route(RouteDecl::get("blog_post").handler(handler_fn(|request| async move {
                    let user = request
                        .header(SESSION_USER_HEADER)
                        .and_then(|value| value.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    Ok(Response::text(StatusCode::OK, format!("post for {user}")))
                })))
                .route(RouteDecl::get("/:year/:slug")
                    .rule("year", Rule::pattern(r"\d{4}"))
                    .rule("slug", Rule::alias("word"))
                    .public()
                    .handler(handler_fn(|request| async move {
                        let body = format!(
                            "{} from {}",
                            request.param("slug").unwrap_or_default(),
                            request.param("year").unwrap_or_default()
                        );
                        Ok(Response::text(StatusCode::OK, body))
                    }))),
        )
        .build()
        .context("Invalid route declarations")?;
    Ok(registry)
}

#[tokio::main]
async fn main() -> Result<()> {
    dispatcher::telemetry::install();
    let options = Options::from_args();
    info!(?options, "Starting dispatcher demo");
    let sessions = MemorySessions::default();
    sessions
        .insert("demo", "demo-user")
        .context("Failed to seed demo session")?;
    let mut builder = dispatcher::builder(registry()?)
        .with_host(options.host)
        .with_app_port(options.port)
        .with_health_check_port(options.health_check_port)
        .with_sessions(sessions)
        .with_login(RedirectLogin::new(options.login_url))
        .with_static_views(StaticViewMap::new().view("/about", "about", "<h1>About</h1>"));
    if let Some(dir) = options.static_dir {
        builder = builder.with_static_files(DirectoryFiles::new(dir));
    }
    builder.build()?.run().await;
    Ok(())
}
