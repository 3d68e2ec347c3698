//! Domain ports for collaborators that live outside the pipeline.
//!
//! The pipeline itself performs no I/O. Anything that would touch a database
//! or remote service is reached through a trait here so handlers can be
//! exercised with deterministic doubles.

mod login_service;

pub use login_service::{FixtureLoginService, LoginService};
