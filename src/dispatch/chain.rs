use std::{future::Future, slice::Iter, sync::Arc};

use async_trait::async_trait;
use tracing::debug;

use super::Result;
use crate::{
    http::{Request, Response},
    utils::Also,
};

/// One step of a route's handler chain.
///
/// A handler either answers the request itself or hands it to the rest of the
/// chain through [Next::run]. Not calling `next` ends the chain.
#[async_trait]
pub trait Handler {
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    async fn call(&self, request: Request, next: Next<'_>) -> Result<Response>;
}

pub type HandlerItem = Arc<dyn Handler + Send + Sync + 'static>;

/// Continuation handed to every handler of a chain.
pub struct Next<'a> {
    handlers: Iter<'a, HandlerItem>,
}

impl<'a> Next<'a> {
    /// Runs the following handler. Past the end of the chain this answers 404.
    pub async fn run(self, request: Request) -> Result<Response> {
        HandlerChain::advance(self.handlers, request).await
    }
}

pub struct HandlerChain;

impl HandlerChain {
    pub async fn invoke(handlers: &[HandlerItem], request: Request) -> Result<Response> {
        Self::advance(handlers.iter(), request).await
    }

    async fn advance(mut handlers: Iter<'_, HandlerItem>, request: Request) -> Result<Response> {
        match handlers.next() {
            Some(handler) => {
                debug!(handler = handler.name(), path = request.path.as_str(), "-->");
                handler
                    .call(request, Next { handlers })
                    .await
                    .also(|r| debug!(handler = handler.name(), response = ?r, "<--"))
            }
            None => Ok(Response::not_found()),
        }
    }
}

/// Terminal handler built from an async closure; it never calls `next`.
pub struct HandlerFn<F>(F);

pub fn handler_fn<F, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response>> + Send + 'static,
{
    HandlerFn(f)
}

#[async_trait]
impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response>> + Send + 'static,
{
    async fn call(&self, request: Request, _next: Next<'_>) -> Result<Response> {
        (self.0)(request).await
    }
}
