//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers the session routes, their request and response
//! schemas, the shared [`ErrorBody`] payload, and the session cookie security
//! scheme. The document is exported via `cargo run --bin openapi-dump` for
//! external tooling.

use crate::inbound::http::error::ErrorBody;
use crate::inbound::http::session_routes::{LoginRequest, SessionUserResponse};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Sealed session cookie issued by POST /api/session/login.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Session gate API",
        description = "Session-authenticated request pipeline."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::session_routes::login,
        crate::inbound::http::session_routes::logout,
        crate::inbound::http::session_routes::profile,
    ),
    components(schemas(ErrorBody, LoginRequest, SessionUserResponse)),
    tags(
        (name = "session", description = "Sign-in, sign-out, and the signed-in user")
    )
)]
pub struct ApiDoc;
