use std::{slice::Iter, sync::Arc};

use async_trait::async_trait;
use tracing::debug;

use super::Result;
use crate::{
    http::{Request, Response},
    utils::Also,
};

/// Controller-scoped gate run before a matched route's handlers.
///
/// A guard lets the request through by calling [Pass::run]. A guard that
/// rejects the request returns its own response (a redirect, a 403, ...)
/// without calling `pass`, and nothing after it runs.
#[async_trait]
pub trait Guard {
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    async fn run(&self, request: Request, pass: Pass<'_>) -> Result<Response>;
}

pub type GuardItem = Arc<dyn Guard + Send + Sync + 'static>;

/// Invoked once every guard has passed.
#[async_trait]
pub trait Terminal {
    async fn run(&self, request: Request) -> Result<Response>;
}

pub struct Pass<'a> {
    guards: Iter<'a, GuardItem>,
    terminal: &'a (dyn Terminal + Send + Sync),
}

impl<'a> Pass<'a> {
    pub async fn run(self, request: Request) -> Result<Response> {
        FilterChain::advance(self.guards, self.terminal, request).await
    }
}

pub struct FilterChain;

impl FilterChain {
    /// Runs `guards` in order, then `terminal`. With no guards the terminal
    /// runs right away.
    pub async fn run(
        guards: &[GuardItem],
        request: Request,
        terminal: &(dyn Terminal + Send + Sync),
    ) -> Result<Response> {
        Self::advance(guards.iter(), terminal, request).await
    }

    async fn advance(
        mut guards: Iter<'_, GuardItem>,
        terminal: &(dyn Terminal + Send + Sync),
        request: Request,
    ) -> Result<Response> {
        match guards.next() {
            Some(guard) => {
                debug!(guard = guard.name(), path = request.path.as_str(), "-->");
                guard
                    .run(request, Pass { guards, terminal })
                    .await
                    .also(|r| debug!(guard = guard.name(), response = ?r, "<--"))
            }
            None => terminal.run(request).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use http::{Method, StatusCode};
    use pretty_assertions::assert_eq;

    use super::*;

    type Trace = Arc<Mutex<Vec<String>>>;

    struct Gate {
        id: &'static str,
        pass: bool,
        trace: Trace,
    }

    #[async_trait]
    impl Guard for Gate {
        async fn run(&self, request: Request, pass: Pass<'_>) -> Result<Response> {
            self.trace.lock().unwrap().push(self.id.to_string());
            if self.pass {
                pass.run(request).await
            } else {
                Ok(Response::redirect("/login"))
            }
        }
    }

    struct Done(Trace);

    #[async_trait]
    impl Terminal for Done {
        async fn run(&self, _request: Request) -> Result<Response> {
            self.0.lock().unwrap().push("terminal".to_string());
            Ok(Response::ok())
        }
    }

    fn gates(steps: &[(&'static str, bool)], trace: &Trace) -> Vec<GuardItem> {
        steps.iter()
            .map(|&(id, pass)| {
                Arc::new(Gate {
                    id,
                    pass,
                    trace: trace.clone(),
                }) as GuardItem
            })
            .collect()
    }

    #[tokio::test]
    async fn empty_chain_runs_terminal_immediately() {
        let trace = Trace::default();
        let response = FilterChain::run(&[], Request::new(Method::GET, "/"), &Done(trace.clone()))
            .await
            .unwrap();
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(*trace.lock().unwrap(), vec!["terminal"]);
    }

    #[tokio::test]
    async fn guards_run_in_order_before_terminal() {
        let trace = Trace::default();
        let guards = gates(&[("g1", true), ("g2", true)], &trace);
        FilterChain::run(&guards, Request::new(Method::GET, "/"), &Done(trace.clone()))
            .await
            .unwrap();
        assert_eq!(*trace.lock().unwrap(), vec!["g1", "g2", "terminal"]);
    }

    #[tokio::test]
    async fn guard_not_passing_stops_the_chain() {
        let trace = Trace::default();
        let guards = gates(&[("g1", false), ("g2", true)], &trace);
        let response = FilterChain::run(&guards, Request::new(Method::GET, "/"), &Done(trace.clone()))
            .await
            .unwrap();
        assert_eq!(response.status, StatusCode::FOUND);
        assert_eq!(*trace.lock().unwrap(), vec!["g1"]);
    }

    #[tokio::test]
    async fn guard_error_propagates() {
        struct Failing;

        #[async_trait]
        impl Guard for Failing {
            async fn run(&self, _request: Request, _pass: Pass<'_>) -> Result<Response> {
                Err(StatusCode::FORBIDDEN.into())
            }
        }

        let trace = Trace::default();
        let guards = vec![Arc::new(Failing) as GuardItem];
        let error = FilterChain::run(&guards, Request::new(Method::GET, "/"), &Done(trace.clone()))
            .await
            .unwrap_err();
        assert_eq!(error.get_status_code(), Some(&StatusCode::FORBIDDEN));
        assert!(trace.lock().unwrap().is_empty());
    }
}
