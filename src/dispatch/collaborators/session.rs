use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use http::header;
use tracing::debug;

use crate::{
    dispatch::{Error, Result},
    http::{HeaderMapExt, Request, Response},
};

/// Header set on the request once a session has been loaded.
pub const SESSION_USER_HEADER: &str = "X-Session-User";

/// Loads the session for a request and reports whether it is authenticated.
#[async_trait]
pub trait SessionLoader {
    async fn load(&self, request: &mut Request) -> Result<bool>;
}

/// Answers a request that needed a session but has none.
pub trait Login {
    fn login(&self, request: &Request) -> Response;
}

/// Cookie-keyed in-memory session store.
#[derive(Debug, Clone)]
pub struct MemorySessions {
    cookie: String,
    sessions: Arc<Mutex<HashMap<String, String>>>,
}

impl MemorySessions {
    pub fn new(cookie: impl Into<String>) -> Self {
        Self {
            cookie: cookie.into(),
            sessions: Arc::default(),
        }
    }

    pub fn insert(&self, token: impl Into<String>, user: impl Into<String>) -> Result<()> {
        self.sessions
            .lock()
            .map_err(|_| Error::new("Session store mutex poisoned"))?
            .insert(token.into(), user.into());
        Ok(())
    }

    pub fn remove(&self, token: &str) -> Result<Option<String>> {
        Ok(self
            .sessions
            .lock()
            .map_err(|_| Error::new("Session store mutex poisoned"))?
            .remove(token))
    }

    fn token<'r>(&self, request: &'r Request) -> Option<&'r str> {
        request
            .headers()
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.cookie)
            .map(|(_, value)| value)
    }
}

impl Default for MemorySessions {
    fn default() -> Self {
        Self::new("sid")
    }
}

#[async_trait]
impl SessionLoader for MemorySessions {
    async fn load(&self, request: &mut Request) -> Result<bool> {
        let user = match self.token(request) {
            Some(token) => self
                .sessions
                .lock()
                .map_err(|_| Error::new("Session store mutex poisoned"))?
                .get(token)
                .cloned(),
            None => None,
        };
        match user {
            Some(user) => {
                debug!(user = user.as_str(), "Session loaded");
                request.insert_header(SESSION_USER_HEADER, user);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Redirects unauthenticated requests to a login page.
#[derive(Debug, Clone)]
pub struct RedirectLogin {
    url: String,
}

impl RedirectLogin {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Login for RedirectLogin {
    fn login(&self, _request: &Request) -> Response {
        Response::redirect(&self.url)
    }
}
