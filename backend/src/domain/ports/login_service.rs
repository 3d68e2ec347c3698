//! Driving port for credential checks.
//!
//! Inbound handlers call this port to turn credentials into a user id without
//! knowing which identity store backs it.

use async_trait::async_trait;

use crate::domain::{DomainError, LoginCredentials, UserId};

/// Credential verification use-case.
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Validate credentials and return the authenticated user id.
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<UserId, DomainError>;
}

/// In-memory authenticator for local runs and tests.
///
/// Accepts `admin` / `password` and yields a fixed user id.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureLoginService;

impl FixtureLoginService {
    /// User id issued for the fixture account.
    pub const USER_ID: &'static str = "123e4567-e89b-12d3-a456-426614174000";
}

#[async_trait]
impl LoginService for FixtureLoginService {
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<UserId, DomainError> {
        if credentials.username() == "admin" && credentials.password() == "password" {
            UserId::new(Self::USER_ID)
                .map_err(|err| DomainError::internal(format!("invalid fixture user id: {err}")))
        } else {
            Err(DomainError::unauthenticated("Invalid credentials"))
        }
    }
}
