//! Server construction and middleware wiring.

mod config;

pub use config::ServerConfig;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use tracing::info;

use crate::Trace;
use crate::inbound::http::dispatch::{Pipeline, pipeline_service};
use crate::inbound::http::session_config::fingerprint::key_fingerprint;
use crate::inbound::http::session_routes;
use crate::inbound::http::session_store::SessionStore;

/// Build the pipeline described by `config`.
///
/// # Errors
/// Returns [`std::io::Error`] when the route table fails validation.
pub fn build_pipeline(config: &ServerConfig) -> std::io::Result<Pipeline> {
    let routes = session_routes::routes(config.login_service.clone())
        .map_err(|err| std::io::Error::other(format!("invalid route table: {err}")))?;
    let sessions = SessionStore::new(&config.sessions);
    Ok(Pipeline::new(routes, sessions).with_body_limit(config.body_limit))
}

/// Wire an application around a shared pipeline.
pub fn build_app(
    pipeline: web::Data<Pipeline>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(pipeline)
        .wrap(Trace)
        .default_service(web::to(pipeline_service))
}

/// Construct an Actix HTTP server from the provided configuration.
///
/// # Returns
/// A spawned [`Server`] that must be awaited to drive the listener.
///
/// # Errors
/// Propagates [`std::io::Error`] when the route table is invalid or binding
/// the socket fails.
pub fn create_server(config: ServerConfig) -> std::io::Result<Server> {
    let pipeline = web::Data::new(build_pipeline(&config)?);
    info!(
        bind_addr = %config.bind_addr,
        cookie_name = pipeline.sessions().cookie_name(),
        cookie_secure = config.sessions.cookie_secure,
        runtime = ?config.sessions.runtime,
        key_fingerprint = %key_fingerprint(&config.sessions.key),
        "session pipeline configured"
    );

    let server = HttpServer::new(move || build_app(pipeline.clone()))
        .bind(config.bind_addr)?
        .run();
    Ok(server)
}
