//! Session API handlers.
//!
//! ```text
//! POST /api/session/login {"username":"admin","password":"password"}
//! POST /api/session/logout
//! GET /api/profile
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use super::dispatch::{
    HandlerRequest, HandlerResult, Reply, Route, RouteTable, RouteTableError, handler_fn,
};
use super::error::ErrorBody;
use super::gate::RequireUser;
use crate::domain::ports::LoginService;
use crate::domain::{DomainError, LoginCredentials, LoginValidationError, UserId};

/// Sign-in path.
pub const LOGIN_PATH: &str = "/api/session/login";
/// Sign-out path.
pub const LOGOUT_PATH: &str = "/api/session/logout";
/// Signed-in user path.
pub const PROFILE_PATH: &str = "/api/profile";

/// Login request body for `POST /api/session/login`.
///
/// Example JSON:
/// `{"username":"admin","password":"password"}`
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Account name.
    pub username: String,
    /// Account password.
    pub password: String,
}

impl TryFrom<LoginRequest> for LoginCredentials {
    type Error = LoginValidationError;

    fn try_from(value: LoginRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.username, &value.password)
    }
}

/// Identifier of the signed-in user.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct SessionUserResponse {
    /// User id.
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub id: String,
}

impl From<&UserId> for SessionUserResponse {
    fn from(value: &UserId) -> Self {
        Self {
            id: value.to_string(),
        }
    }
}

/// Authenticate a user and establish a session.
#[utoipa::path(
    post,
    path = "/api/session/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = SessionUserResponse,
            headers(("Set-Cookie" = String, description = "Sealed session cookie"))),
        (status = 400, description = "Invalid request", body = ErrorBody),
        (status = 401, description = "Invalid credentials", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    tags = ["session"],
    operation_id = "login",
    security([])
)]
pub async fn login(service: &dyn LoginService, req: HandlerRequest) -> HandlerResult {
    let payload: LoginRequest = req.json()?;
    let credentials = LoginCredentials::try_from(payload).map_err(map_login_validation_error)?;
    let user_id = service.authenticate(&credentials).await?;
    info!(user_id = %user_id, "user signed in");

    let mut session = req.session().clone();
    session.set_user(user_id.clone());
    Ok(Reply::json(&SessionUserResponse::from(&user_id))?.commit(session))
}

fn map_login_validation_error(err: LoginValidationError) -> DomainError {
    DomainError::invalid_input(err.to_string())
        .with_details(json!({ "field": err.field(), "code": err.code() }))
}

/// End the current session. Succeeds with or without a session cookie.
#[utoipa::path(
    post,
    path = "/api/session/logout",
    responses(
        (status = 200, description = "Session cleared",
            headers(("Set-Cookie" = String, description = "Expired session cookie"))),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    tags = ["session"],
    operation_id = "logout",
    security([])
)]
pub async fn logout(req: HandlerRequest) -> HandlerResult {
    if let Some(user_id) = req.session().user_id() {
        info!(user_id = %user_id, "user signed out");
    }
    Ok(Reply::empty().destroy_session())
}

/// Return the signed-in user.
#[utoipa::path(
    get,
    path = "/api/profile",
    responses(
        (status = 200, description = "Signed-in user", body = SessionUserResponse),
        (status = 401, description = "Not signed in", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    tags = ["session"],
    operation_id = "profile"
)]
pub async fn profile(req: HandlerRequest) -> HandlerResult {
    let principal = req.require_principal()?;
    Reply::json(&SessionUserResponse::from(principal.user_id()))
}

/// Routes served by this module.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use session_gate::domain::ports::FixtureLoginService;
/// use session_gate::inbound::http::session_routes::routes;
///
/// let table = routes(Arc::new(FixtureLoginService)).expect("valid routes");
/// assert!(table.resolve("/api/session/login").is_some());
/// ```
pub fn routes(login_service: Arc<dyn LoginService>) -> Result<RouteTable, RouteTableError> {
    let login_route = Route::new(LOGIN_PATH)?.post(handler_fn(move |req| {
        let service = Arc::clone(&login_service);
        async move { login(service.as_ref(), req).await }
    }))?;
    let logout_route = Route::new(LOGOUT_PATH)?.post(handler_fn(logout))?;
    let profile_route = Route::new(PROFILE_PATH)?
        .with_gate(RequireUser)
        .get(handler_fn(profile))?;

    RouteTable::builder()
        .route(login_route)
        .route(logout_route)
        .route(profile_route)
        .build()
}

#[cfg(test)]
mod tests;
