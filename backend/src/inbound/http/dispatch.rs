//! Request dispatch through the route table.
//!
//! Every request takes the same path: resolve the route, check the method,
//! unseal the session, run the gates, reject malformed input, run the
//! handler, then apply the reply's session change. Session changes are applied only
//! when the handler succeeds; a failing handler never touches the client's
//! cookie.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use actix_web::http::header::{self, ContentType};
use actix_web::http::{Method, StatusCode};
use actix_web::web::{self, Bytes};
use actix_web::{HttpRequest, HttpResponse};
use futures_util::FutureExt;
use serde_json::Value;
use tracing::{debug, error};

use super::error::error_response;
use super::gate::{Decision, Denial, GateContext};
use super::session_store::SessionStore;
use crate::domain::{DomainError, ErrorType, Principal, Session, TraceId};

mod handler;
mod route;

pub use handler::{
    FnHandler, Handler, HandlerRequest, HandlerResult, Reply, ReplyBody, SessionChange,
    handler_fn,
};
pub use route::{Route, RouteTable, RouteTableBuilder, RouteTableError};

/// Body of the 405 response.
pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "Method not allowed";
/// Largest request body accepted by [`pipeline_service`], in bytes.
pub const DEFAULT_BODY_LIMIT: usize = 256 * 1024;

/// Transport-neutral request accepted by [`Pipeline::dispatch`].
///
/// # Examples
/// ```
/// use actix_web::http::Method;
/// use session_gate::inbound::http::dispatch::InboundRequest;
/// use serde_json::json;
///
/// let req = InboundRequest::new(Method::POST, "/api/session/login")
///     .with_json(&json!({ "username": "admin", "password": "password" }));
/// assert_eq!(req.path(), "/api/session/login");
/// ```
#[derive(Debug, Clone)]
pub struct InboundRequest {
    method: Method,
    path: String,
    query: String,
    body: Bytes,
    cookie_header: Option<String>,
}

impl InboundRequest {
    /// Request with no query, body, or cookies.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: String::new(),
            body: Bytes::new(),
            cookie_header: None,
        }
    }

    /// Capture the parts of an Actix request the pipeline needs.
    #[must_use]
    pub fn from_http(req: &HttpRequest, body: Bytes) -> Self {
        let cookie_header = req
            .headers()
            .get_all(header::COOKIE)
            .filter_map(|value| value.to_str().ok())
            .collect::<Vec<_>>()
            .join("; ");
        Self {
            method: req.method().clone(),
            path: req.path().to_owned(),
            query: req.query_string().to_owned(),
            body,
            cookie_header: (!cookie_header.is_empty()).then_some(cookie_header),
        }
    }

    /// Set the raw query string (without `?`).
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    /// Set the raw body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Set a JSON body.
    #[must_use]
    pub fn with_json(self, body: &Value) -> Self {
        self.with_body(body.to_string())
    }

    /// Set the raw `Cookie` header.
    #[must_use]
    pub fn with_cookie_header(mut self, header: impl Into<String>) -> Self {
        self.cookie_header = Some(header.into());
        self
    }

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
}

/// Route table plus session store: everything needed to serve a request.
#[derive(Debug)]
pub struct Pipeline {
    routes: RouteTable,
    sessions: SessionStore,
    body_limit: usize,
}

impl Pipeline {
    /// Assemble a pipeline.
    #[must_use]
    pub fn new(routes: RouteTable, sessions: SessionStore) -> Self {
        Self {
            routes,
            sessions,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Override the request body limit.
    #[must_use]
    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    /// Session store used to unseal and seal cookies.
    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Route table being served.
    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Serve one request.
    pub async fn dispatch(&self, req: InboundRequest) -> HttpResponse {
        let Some((route, params)) = self.routes.resolve(&req.path) else {
            debug!(path = %req.path, "no route matched");
            return error_response(&DomainError::not_found("Route not found"));
        };
        let Some(binding) = route.binding(&req.method) else {
            debug!(route = route.pattern(), method = %req.method, "method not registered");
            return method_not_allowed(route);
        };

        let query = parse_query(&req.query);
        let body = parse_body(&req.body);

        let session = Arc::new(
            self.sessions
                .read_from_cookie_header(req.cookie_header.as_deref())
                .unwrap_or_default(),
        );
        let principal = Principal::from_session(&session);

        // Gates see malformed input as absent; it is rejected once they allow.
        let no_query = HashMap::new();
        let ctx = GateContext {
            session: &session,
            principal: principal.as_ref(),
            params: &params,
            query: query.as_ref().unwrap_or(&no_query),
            body: body.as_ref().ok().and_then(Option::as_ref),
        };
        let input_error = query.as_ref().err().or_else(|| body.as_ref().err());
        for gate in route.gates.iter().chain(&binding.gates) {
            if let Decision::Deny(denial) = gate.evaluate(&ctx) {
                debug!(route = route.pattern(), gate = gate.name(), ?denial, "gate denied request");
                let err = match (denial, input_error) {
                    (Denial::MissingKeys(_), Some(err)) => err.clone(),
                    (denial, _) => denial.into_error(),
                };
                return error_response(&err);
            }
        }
        let (query, body) = match (query, body) {
            (Ok(query), Ok(body)) => (query, body),
            (Err(err), _) | (_, Err(err)) => return error_response(&err),
        };

        let handler_req = HandlerRequest {
            method: req.method,
            path: req.path,
            params,
            query,
            body,
            session: Arc::clone(&session),
            principal,
            trace_id: TraceId::current(),
        };
        let outcome = AssertUnwindSafe(binding.handler.call(handler_req))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| {
                error!(route = route.pattern(), "handler panicked");
                Err(DomainError::internal("handler panicked"))
            });

        match outcome {
            Ok(reply) => self.render(reply, session),
            Err(err) => error_response(&err),
        }
    }

    fn render(&self, reply: Reply, session: Arc<Session>) -> HttpResponse {
        let mut builder = HttpResponse::build(reply.status);
        match reply.session {
            SessionChange::Unchanged => {}
            SessionChange::Commit(next) => match self.sessions.session_cookie(&next) {
                Ok(cookie) => {
                    builder.cookie(cookie);
                }
                Err(err) => return error_response(&err),
            },
            SessionChange::Destroy => {
                let mut ended = Arc::unwrap_or_clone(session);
                builder.cookie(self.sessions.destroy_session(&mut ended));
            }
        }
        match reply.body {
            ReplyBody::Empty => builder.finish(),
            ReplyBody::Json(value) => builder.json(value),
            ReplyBody::Text(text) => builder.content_type(ContentType::plaintext()).body(text),
        }
    }
}

fn method_not_allowed(route: &Route) -> HttpResponse {
    let allow = route
        .methods()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    HttpResponse::build(StatusCode::METHOD_NOT_ALLOWED)
        .insert_header((header::ALLOW, allow))
        .content_type(ContentType::plaintext())
        .body(METHOD_NOT_ALLOWED_MESSAGE)
}

fn parse_query(raw: &str) -> Result<HashMap<String, String>, DomainError> {
    web::Query::<HashMap<String, String>>::from_query(raw)
        .map(web::Query::into_inner)
        .map_err(|err| {
            DomainError::invalid_input("Malformed query string")
                .with_details(serde_json::json!({ "reason": err.to_string() }))
        })
}

fn parse_body(raw: &Bytes) -> Result<Option<Value>, DomainError> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(raw).map(Some).map_err(|err| {
        DomainError::invalid_input("Malformed JSON body")
            .with_details(serde_json::json!({ "reason": err.to_string() }))
    })
}

/// Reading the body failed mid-stream: an aborted upload or broken chunked
/// encoding. Both are client faults.
fn payload_error(err: &actix_web::Error) -> DomainError {
    debug!(error = %err, "request body could not be read");
    DomainError::invalid_input("Malformed request body")
        .with_details(serde_json::json!({ "reason": err.to_string() }))
}

/// Actix entry point: mount as the application's default service.
///
/// # Examples
/// ```no_run
/// use actix_web::{App, web};
/// use session_gate::inbound::http::dispatch::{Pipeline, pipeline_service};
///
/// fn mount(pipeline: web::Data<Pipeline>) {
///     let _app = App::new()
///         .app_data(pipeline)
///         .default_service(web::to(pipeline_service));
/// }
/// ```
pub async fn pipeline_service(
    req: HttpRequest,
    payload: web::Payload,
    pipeline: web::Data<Pipeline>,
) -> HttpResponse {
    let body = match payload.to_bytes_limited(pipeline.body_limit).await {
        Ok(Ok(bytes)) => bytes,
        Ok(Err(err)) => return error_response(&payload_error(&err)),
        Err(_) => {
            return error_response(&DomainError::new(
                ErrorType::MaximumSizeExceeded,
                "Request body too large",
            ));
        }
    };
    pipeline.dispatch(InboundRequest::from_http(&req, body)).await
}
