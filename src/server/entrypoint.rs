use std::{net::SocketAddr, sync::Arc};

use async_trait::async_trait;
use http::{header, StatusCode};
use tokio::{
    io::{self, AsyncReadExt, AsyncWriteExt, BufReader},
    net::TcpStream,
};
use tracing::{debug, info, warn};

use crate::{
    dispatch::Dispatcher,
    http::{server::StreamHandler, HeaderMapExt, ReadRequest, Request, Response, WriteResponse},
    io::error::{error, Body},
    utils::Also,
};

/// Reads one request per connection, dispatches it and closes the connection.
pub struct EntryPoint {
    dispatcher: Arc<Dispatcher>,
    body_limit: usize,
}

impl EntryPoint {
    pub fn new(dispatcher: Arc<Dispatcher>, body_limit: usize) -> Self {
        Self {
            dispatcher,
            body_limit,
        }
    }

    async fn read(&self, stream: &mut TcpStream) -> io::Result<Request> {
        debug!(target: "entrypoint", stage = "request", "0 - init");
        let mut reader = BufReader::new(stream);
        let mut request = reader.read_request().await?;
        debug!(target: "entrypoint", stage = "request", data = ?request, "1 - parsed request header");
        let length = match request.header(header::CONTENT_LENGTH) {
            None => 0,
            Some(_) => request
                .get_content_length()
                .ok_or_else(|| error(Body::InvalidContentLength))?,
        };
        if length > self.body_limit {
            return Err(error(Body::TooLarge {
                length,
                limit: self.body_limit,
            }));
        }
        let mut body = vec![0; length];
        reader.read_exact(&mut body).await?;
        request.body = body;
        debug!(target: "entrypoint", stage = "request", length, "2 - read request body");
        Ok(request)
    }

    async fn handle_stream(&self, stream: &mut TcpStream) -> io::Result<()> {
        let mut response = match self.read(stream).await {
            Ok(request) => self.dispatcher.dispatch(request).await,
            Err(error) => {
                warn!("Malformed request: {}", error);
                Response::text(StatusCode::BAD_REQUEST, "Bad Request")
            }
        };
        response.insert_header(header::CONNECTION, "close");
        stream
            .write_response(&response)
            .await
            .also(|_| debug!(target: "entrypoint", stage = "response", data = ?response, "3 - wrote response"))?;
        stream.shutdown().await
    }
}

#[async_trait]
impl StreamHandler for EntryPoint {
    async fn handle(&self, mut stream: TcpStream, peer: SocketAddr) {
        match self.handle_stream(&mut stream).await {
            Ok(_) => info!(ip = %peer, "Connection closed"),
            Err(error) => warn!(ip = %peer, "Failed to write response: {}", error),
        }
    }
}
