use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info};

/// Serves one accepted connection.
#[async_trait]
pub trait StreamHandler {
    async fn handle(&self, stream: TcpStream, peer: SocketAddr);
}

pub struct Server<H: StreamHandler + Send + Sync + 'static> {
    addr: SocketAddr,
    handler: Arc<H>,
}

impl<H: StreamHandler + Send + Sync + 'static> Server<H> {
    pub fn new(addr: SocketAddr, handler: H) -> Self {
        Self {
            addr,
            handler: Arc::new(handler),
        }
    }

    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind(self.addr)
            .await
            .with_context(|| format!("Failed to bind to address: {}", self.addr))?;
        info!(addr = %self.addr, "Listening");
        loop {
            let (stream, peer) = listener.accept().await?;
            debug!(peer = %peer, "Accepted connection");
            let handler = self.handler.clone();
            tokio::spawn(async move {
                handler.handle(stream, peer).await;
            });
        }
    }
}
