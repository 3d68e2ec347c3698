//! Authorization gates evaluated before a handler runs.
//!
//! A gate is a pure decision over the decoded request: it sees the session,
//! the derived principal, path parameters, the query map, and the parsed body,
//! and answers [`Decision::Allow`] or [`Decision::Deny`]. Gates never perform
//! I/O and never mutate the session.

use std::collections::HashMap;
use std::fmt;

use serde_json::{Value, json};

use crate::domain::{DomainError, Principal, Session};

/// Message returned when a gated route is hit without a signed-in user.
pub const LOGIN_REQUIRED_MESSAGE: &str = "Please log in";

/// Everything a gate may look at.
#[derive(Debug, Clone, Copy)]
pub struct GateContext<'a> {
    /// Decoded session; empty when the request carried none.
    pub session: &'a Session,
    /// Acting user derived from the session.
    pub principal: Option<&'a Principal>,
    /// Captured path parameters.
    pub params: &'a HashMap<String, String>,
    /// Decoded query string.
    pub query: &'a HashMap<String, String>,
    /// Parsed JSON body, if one was sent.
    pub body: Option<&'a Value>,
}

/// Outcome of a gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Let the request continue.
    Allow,
    /// Stop the request with the given reason.
    Deny(Denial),
}

impl Decision {
    /// Whether the request may proceed.
    #[must_use]
    pub fn is_allow(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Why a gate refused a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    /// No signed-in user.
    Unauthenticated,
    /// Signed in but not permitted.
    Forbidden(String),
    /// Required request keys were absent.
    MissingKeys(Vec<String>),
}

impl Denial {
    /// Convert the denial into the error the client sees.
    #[must_use]
    pub fn into_error(self) -> DomainError {
        match self {
            Self::Unauthenticated => DomainError::unauthenticated(LOGIN_REQUIRED_MESSAGE),
            Self::Forbidden(message) => DomainError::access_denied(non_blank(
                message,
                "You are not allowed to perform this action",
            )),
            Self::MissingKeys(keys) => DomainError::invalid_input(format!(
                "Missing required keys: {}",
                keys.join(", ")
            ))
            .with_details(json!({ "missingKeys": keys })),
        }
    }
}

impl From<Denial> for DomainError {
    fn from(value: Denial) -> Self {
        value.into_error()
    }
}

fn non_blank(message: String, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_owned()
    } else {
        message
    }
}

/// A request admission check.
pub trait Gate: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Decide whether the request may reach its handler.
    fn evaluate(&self, ctx: &GateContext<'_>) -> Decision;
}

impl fmt::Debug for dyn Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Gate").field(&self.name()).finish()
    }
}

/// Allow only when the session carries a signed-in user.
///
/// # Examples
/// ```
/// use session_gate::domain::{Session, UserId};
/// use session_gate::inbound::http::gate::{Decision, Denial, authorize};
///
/// assert_eq!(authorize(&Session::default()), Decision::Deny(Denial::Unauthenticated));
/// assert_eq!(authorize(&Session::for_user(UserId::random())), Decision::Allow);
/// ```
#[must_use]
pub fn authorize(session: &Session) -> Decision {
    if session.user_id().is_some() {
        Decision::Allow
    } else {
        Decision::Deny(Denial::Unauthenticated)
    }
}

/// Gate form of [`authorize`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RequireUser;

impl Gate for RequireUser {
    fn name(&self) -> &str {
        "require_user"
    }

    fn evaluate(&self, ctx: &GateContext<'_>) -> Decision {
        authorize(ctx.session)
    }
}

/// Where [`RequireKeys`] looks for its keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyLocation {
    /// Top-level members of the JSON body.
    Body,
    /// Query string parameters.
    Query,
}

/// Require the listed keys to be present.
///
/// Body keys must be present and non-null; query keys must be present and
/// non-empty.
#[derive(Debug, Clone)]
pub struct RequireKeys {
    keys: Vec<String>,
    location: KeyLocation,
}

impl RequireKeys {
    /// Gate over `keys` in the given location.
    pub fn new<I, S>(keys: I, location: KeyLocation) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            location,
        }
    }

    fn is_present(&self, ctx: &GateContext<'_>, key: &str) -> bool {
        match self.location {
            KeyLocation::Body => ctx
                .body
                .and_then(|body| body.get(key))
                .is_some_and(|value| !value.is_null()),
            KeyLocation::Query => ctx.query.get(key).is_some_and(|value| !value.is_empty()),
        }
    }
}

impl Gate for RequireKeys {
    fn name(&self) -> &str {
        "require_keys"
    }

    fn evaluate(&self, ctx: &GateContext<'_>) -> Decision {
        let missing: Vec<String> = self
            .keys
            .iter()
            .filter(|key| !self.is_present(ctx, key))
            .cloned()
            .collect();
        if missing.is_empty() {
            Decision::Allow
        } else {
            Decision::Deny(Denial::MissingKeys(missing))
        }
    }
}

type Predicate = dyn Fn(&GateContext<'_>) -> Decision + Send + Sync;

/// Gate backed by a caller-supplied pure function.
///
/// Use it for rules such as "the principal administers space X", where the
/// facts needed are already in the request.
pub struct PredicateGate {
    name: String,
    predicate: Box<Predicate>,
}

impl PredicateGate {
    /// Wrap `predicate` under `name`.
    pub fn new<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&GateContext<'_>) -> Decision + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            predicate: Box::new(predicate),
        }
    }
}

impl fmt::Debug for PredicateGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateGate")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Gate for PredicateGate {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, ctx: &GateContext<'_>) -> Decision {
        (self.predicate)(ctx)
    }
}
