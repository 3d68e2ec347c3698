//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::domain::ports::{FixtureLoginService, LoginService};
use crate::inbound::http::dispatch::DEFAULT_BODY_LIMIT;
use crate::inbound::http::session_config::SessionSettings;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) sessions: SessionSettings,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) login_service: Arc<dyn LoginService>,
    pub(crate) body_limit: usize,
}

impl ServerConfig {
    /// Construct a server configuration from validated session settings.
    ///
    /// Sign-in uses the fixture account until a real identity store is
    /// attached with [`ServerConfig::with_login_service`].
    #[must_use]
    pub fn new(sessions: SessionSettings, bind_addr: SocketAddr) -> Self {
        Self {
            sessions,
            bind_addr,
            login_service: Arc::new(FixtureLoginService),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Attach the credential checker used by the login route.
    #[must_use]
    pub fn with_login_service(mut self, service: Arc<dyn LoginService>) -> Self {
        self.login_service = service;
        self
    }

    /// Override the request body limit in bytes.
    #[must_use]
    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
