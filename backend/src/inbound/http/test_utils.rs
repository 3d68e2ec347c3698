//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::cookie::Key;
use actix_web::{App, web};

use super::dispatch::{Pipeline, pipeline_service};
use super::session_config::SessionSettings;
use super::session_routes::routes;
use super::session_store::SessionStore;
use crate::domain::ports::FixtureLoginService;
use crate::middleware::Trace;

/// Session store with a fresh key, the `session` cookie name, and the
/// `Secure` flag off for local HTTP tests.
pub fn test_session_store() -> SessionStore {
    SessionStore::new(&SessionSettings::with_key(Key::generate(), "session"))
}

/// Pipeline serving the session routes against the fixture login service.
pub fn test_pipeline(sessions: SessionStore) -> Pipeline {
    let table = routes(Arc::new(FixtureLoginService)).expect("session routes are valid");
    Pipeline::new(table, sessions)
}

/// Application wired the way the server wires it.
pub fn test_app(
    sessions: SessionStore,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(test_pipeline(sessions)))
        .wrap(Trace)
        .default_service(web::to(pipeline_service))
}
