//! Domain primitives for the authorization pipeline.
//!
//! Purpose: define transport-agnostic types used by the HTTP adapter. Keep
//! types small and document invariants and serialisation contracts (serde)
//! on each type.
//!
//! Public surface:
//! - `DomainError`, `ErrorType`, `Severity`: structured failures with a
//!   closed category set.
//! - `Session`, `Principal`: decoded session content and the acting user.
//! - `UserId`, `LoginCredentials`: identity primitives.
//! - `TraceId`: request correlation identifier.

pub mod auth;
pub mod error;
pub mod ports;
pub mod session;
pub mod trace_id;
pub mod user;

pub use self::auth::{LoginCredentials, LoginValidationError};
pub use self::error::{DomainError, DomainErrorValidationError, ErrorType, Severity};
pub use self::session::{Principal, Session, SessionUser};
pub use self::trace_id::TraceId;
pub use self::user::{UserId, UserValidationError};

/// Header carrying the request trace identifier.
pub const TRACE_ID_HEADER: &str = "trace-id";
