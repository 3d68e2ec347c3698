//! Handler contract: read-only request in, explicit reply out.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use actix_web::http::{Method, StatusCode};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::domain::{DomainError, Principal, Session, TraceId};
use crate::inbound::http::gate::LOGIN_REQUIRED_MESSAGE;

/// What a handler returns.
pub type HandlerResult = Result<Reply, DomainError>;

/// Route handler.
///
/// Handlers see the decoded session but cannot mutate it in place; session
/// changes are requested through [`Reply`].
#[async_trait]
pub trait Handler: Send + Sync {
    /// Serve one request.
    async fn call(&self, req: HandlerRequest) -> HandlerResult;
}

/// [`Handler`] over an async function or closure. Built by [`handler_fn`].
#[derive(Clone)]
pub struct FnHandler<F> {
    f: F,
}

/// Adapt an async function into a [`Handler`].
///
/// # Examples
/// ```
/// use session_gate::inbound::http::dispatch::{HandlerRequest, Reply, handler_fn};
///
/// let ping = handler_fn(|_req: HandlerRequest| async { Ok(Reply::text("pong")) });
/// # let _ = ping;
/// ```
pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(HandlerRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    FnHandler { f }
}

#[async_trait]
impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(HandlerRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    async fn call(&self, req: HandlerRequest) -> HandlerResult {
        (self.f)(req).await
    }
}

/// Decoded request as seen by a handler.
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    pub(super) method: Method,
    pub(super) path: String,
    pub(super) params: HashMap<String, String>,
    pub(super) query: HashMap<String, String>,
    pub(super) body: Option<Value>,
    pub(super) session: Arc<Session>,
    pub(super) principal: Option<Principal>,
    pub(super) trace_id: Option<TraceId>,
}

impl HandlerRequest {
    /// Request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Captured path parameter.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// All captured path parameters.
    #[must_use]
    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// Decoded query string.
    #[must_use]
    pub fn query(&self) -> &HashMap<String, String> {
        &self.query
    }

    /// Parsed JSON body, if any.
    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Deserialize the body into `T`.
    ///
    /// A missing or mismatched body is an `Invalid input` error.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, DomainError> {
        let body = self
            .body
            .clone()
            .ok_or_else(|| DomainError::invalid_input("Request body is required"))?;
        serde_json::from_value(body)
            .map_err(|err| DomainError::invalid_input(format!("Invalid request body: {err}")))
    }

    /// Decoded session; empty when the request carried none.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Acting user, if signed in.
    #[must_use]
    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    /// Acting user, or an `Authentication required` error.
    pub fn require_principal(&self) -> Result<&Principal, DomainError> {
        self.principal
            .as_ref()
            .ok_or_else(|| DomainError::unauthenticated(LOGIN_REQUIRED_MESSAGE))
    }

    /// Trace identifier of the request, when tracing is active.
    #[must_use]
    pub fn trace_id(&self) -> Option<TraceId> {
        self.trace_id
    }
}

/// Response body produced by a handler.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyBody {
    /// No body.
    Empty,
    /// `application/json` body.
    Json(Value),
    /// `text/plain` body.
    Text(String),
}

/// Session effect of a successful handler.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionChange {
    /// Leave the client's cookie alone.
    #[default]
    Unchanged,
    /// Seal and send this session.
    Commit(Session),
    /// Expire the client's session cookie.
    Destroy,
}

/// Successful handler outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub(super) status: StatusCode,
    pub(super) body: ReplyBody,
    pub(super) session: SessionChange,
}

impl Reply {
    fn with_body(body: ReplyBody) -> Self {
        Self {
            status: StatusCode::OK,
            body,
            session: SessionChange::Unchanged,
        }
    }

    /// 200 with no body.
    #[must_use]
    pub fn empty() -> Self {
        Self::with_body(ReplyBody::Empty)
    }

    /// 200 with a JSON body.
    pub fn json<T: Serialize>(body: &T) -> Result<Self, DomainError> {
        serde_json::to_value(body)
            .map(|value| Self::with_body(ReplyBody::Json(value)))
            .map_err(|err| DomainError::internal(format!("failed to encode reply: {err}")))
    }

    /// 200 with a plain-text body.
    #[must_use]
    pub fn text(body: impl Into<String>) -> Self {
        Self::with_body(ReplyBody::Text(body.into()))
    }

    /// Override the status code.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Persist `session` once the reply is sent.
    #[must_use]
    pub fn commit(mut self, session: Session) -> Self {
        self.session = SessionChange::Commit(session);
        self
    }

    /// End the client's session once the reply is sent.
    #[must_use]
    pub fn destroy_session(mut self) -> Self {
        self.session = SessionChange::Destroy;
        self
    }

    /// Status code to send.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Body to send.
    #[must_use]
    pub fn body(&self) -> &ReplyBody {
        &self.body
    }

    /// Requested session effect.
    #[must_use]
    pub fn session_change(&self) -> &SessionChange {
        &self.session
    }
}
