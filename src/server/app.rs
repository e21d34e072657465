use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use anyhow::Result;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error};

use super::{entrypoint::EntryPoint, health_check::HealthCheck};
use crate::{
    dispatch::{
        collaborators::{BodyParser, Login, SessionLoader, StaticFiles, StaticViews},
        Dispatcher, DispatcherBuilder, RouteRegistry,
    },
    http::server::Server as HttpServer,
};

/// A builder for a server.
pub struct ServerBuilder {
    dispatcher: DispatcherBuilder,
    host: IpAddr,
    app_port: u16,
    health_check_port: u16,
    body_limit: usize,
}

impl ServerBuilder {
    fn new(registry: RouteRegistry) -> Self {
        Self {
            dispatcher: Dispatcher::builder(registry),
            host: IpAddr::from([127, 0, 0, 1]), // Default host (localhost)
            app_port: 80,
            health_check_port: 9000,
            body_limit: 1024 * 1024,
        }
    }

    /// Set the host for the application service.
    /// The default host is 127.0.0.1
    pub fn with_host(mut self, host: IpAddr) -> Self {
        self.host = host;
        self
    }

    /// Set the port for the application service.
    /// The default port is 80
    pub fn with_app_port(mut self, port: u16) -> Self {
        self.app_port = port;
        self
    }

    /// Set the port for the health check service.
    /// The default port is 9000
    pub fn with_health_check_port(mut self, port: u16) -> Self {
        self.health_check_port = port;
        self
    }

    /// Largest request body accepted before the connection is answered with 400.
    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    pub fn with_body_parser<P: BodyParser + Send + Sync + 'static>(mut self, parser: P) -> Self {
        self.dispatcher = self.dispatcher.body_parser(parser);
        self
    }

    pub fn with_sessions<S: SessionLoader + Send + Sync + 'static>(mut self, sessions: S) -> Self {
        self.dispatcher = self.dispatcher.sessions(sessions);
        self
    }

    pub fn with_login<L: Login + Send + Sync + 'static>(mut self, login: L) -> Self {
        self.dispatcher = self.dispatcher.login(login);
        self
    }

    pub fn with_static_views<V: StaticViews + Send + Sync + 'static>(mut self, views: V) -> Self {
        self.dispatcher = self.dispatcher.views(views);
        self
    }

    pub fn with_static_files<F: StaticFiles + Send + Sync + 'static>(mut self, files: F) -> Self {
        self.dispatcher = self.dispatcher.files(files);
        self
    }

    /// Build the server with the given configuration.
    pub fn build(self) -> Result<Server> {
        let dispatcher = Arc::new(self.dispatcher.build());
        let server = Server {
            dispatcher: dispatcher.clone(),
            app: HttpServer::new(
                SocketAddr::new(self.host, self.app_port),
                EntryPoint::new(dispatcher, self.body_limit),
            ),
            health_check: HttpServer::new(
                SocketAddr::new(self.host, self.health_check_port),
                HealthCheck,
            ),
        };
        Ok(server)
    }
}

pub struct Server {
    dispatcher: Arc<Dispatcher>,
    pub app: HttpServer<EntryPoint>,
    pub health_check: HttpServer<HealthCheck>,
}

impl Server {
    /// Handle for inspecting or reloading routes while the server runs.
    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        self.dispatcher.clone()
    }

    /// Start the server. Returns once either listener stops.
    pub async fn run(self) {
        debug!("Starting server");
        let (tx_app, rx_app) = oneshot::channel::<()>();
        let (tx_health, rx_health) = oneshot::channel::<()>();
        let (tx, mut rx) = mpsc::channel(2);
        let tx_2 = tx.clone();
        let app = self.app;
        let health_check = self.health_check;
        tokio::spawn(async move {
            tokio::select! {
                result = app.run() => {
                    debug!("App stopped");
                    let _ = tx_health.send(());
                    if let Err(err) = result {
                        error!("App error: {:?}", err);
                    }
                }
                _ = rx_app => {}
            }
            let _ = tx.send(()).await;
        });
        tokio::spawn(async move {
            tokio::select! {
                result = health_check.run() => {
                    debug!("health_check stopped");
                    let _ = tx_app.send(());
                    if let Err(err) = result {
                        error!("health_check error: {:?}", err);
                    }
                }
                _ = rx_health => {}
            }
            let _ = tx_2.send(()).await;
        });
        rx.recv().await;
        debug!("Server stopped");
    }
}

/// Create a new server builder serving `registry`.
pub fn builder(registry: RouteRegistry) -> ServerBuilder {
    ServerBuilder::new(registry)
}
