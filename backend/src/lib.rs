//! Session-backed request authorization for Actix Web services.
//!
//! Requests flow through an explicit route table: the sealed session cookie
//! is decoded, authorization gates run, the handler returns a reply with an
//! explicit session change, and failures are normalised into one JSON error
//! shape with a status chosen from a closed set of error categories.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod server;

/// Public OpenAPI surface used by tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
