use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::{
    io::{AsyncWriteExt, BufReader},
    net::TcpStream,
};
use tracing::error;

use crate::http::{server::StreamHandler, ReadRequest};

pub struct HealthCheck;

#[async_trait]
impl StreamHandler for HealthCheck {
    async fn handle(&self, mut stream: TcpStream, peer: SocketAddr) {
        // Drain the request head so closing the socket does not reset it.
        let _ = BufReader::new(&mut stream).read_request().await;
        if let Err(e) = stream
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
            .await
        {
            error!(peer = %peer, "Failed to write to stream: {:?}", e);
        }
        let _ = stream.shutdown().await;
    }
}
