//! Tests for HTTP error mapping.

use super::*;
use actix_web::ResponseError;
use actix_web::body::to_bytes;
use actix_web::http::StatusCode;
use rstest::{fixture, rstest};
use serde_json::json;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn expected_trace_id() -> String {
    TRACE_ID.to_owned()
}

#[fixture]
fn internal_error_case(expected_trace_id: String) -> DomainError {
    DomainError::internal("db pool exhausted at 10.0.0.3")
        .with_trace_id(expected_trace_id)
        .with_details(json!({"secret": "x"}))
}

#[fixture]
fn invalid_input_case(expected_trace_id: String) -> DomainError {
    DomainError::invalid_input("bad")
        .with_trace_id(expected_trace_id)
        .with_details(json!({"field": "name"}))
}

#[rstest]
#[case(ErrorType::InvalidInput, StatusCode::BAD_REQUEST)]
#[case(ErrorType::UndesirableOperation, StatusCode::BAD_REQUEST)]
#[case(ErrorType::InvalidState, StatusCode::CONFLICT)]
#[case(ErrorType::MaximumSizeExceeded, StatusCode::PAYLOAD_TOO_LARGE)]
#[case(ErrorType::AuthenticationRequired, StatusCode::UNAUTHORIZED)]
#[case(ErrorType::AccessDenied, StatusCode::FORBIDDEN)]
#[case(ErrorType::DataNotFound, StatusCode::NOT_FOUND)]
#[case(ErrorType::ExternalService, StatusCode::BAD_GATEWAY)]
#[case(ErrorType::Unknown, StatusCode::INTERNAL_SERVER_ERROR)]
fn every_error_type_has_one_status(#[case] error_type: ErrorType, #[case] status: StatusCode) {
    assert_eq!(status_for(error_type), status);
    assert_eq!(status_for_label(error_type.label()), status);
    assert_eq!(
        ResponseError::status_code(&DomainError::new(error_type, "msg")),
        status
    );
}

#[rstest]
fn mapping_covers_every_declared_type() {
    for error_type in ErrorType::ALL {
        let status = status_for(error_type);
        assert!(status.is_client_error() || status.is_server_error());
    }
}

#[rstest]
#[case("")]
#[case("Rate limited")]
#[case("access denied")]
fn unmapped_labels_map_to_500(#[case] label: &str) {
    assert_eq!(status_for_label(label), StatusCode::INTERNAL_SERVER_ERROR);
}

#[rstest]
#[case(Severity::Warning)]
#[case(Severity::Error)]
#[case(Severity::Fatal)]
fn severity_never_changes_the_status(#[case] severity: Severity) {
    let err = DomainError::not_found("Page not found").with_severity(severity);
    let (status, body) = normalize(&err);
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body.severity, severity);
}

async fn assert_error_response(
    error: DomainError,
    expected_status: StatusCode,
    expected_trace_id: Option<&str>,
) -> ErrorBody {
    let response = ResponseError::error_response(&error);
    assert_eq!(response.status(), expected_status);

    let header = response.headers().get(TRACE_ID_HEADER);
    match expected_trace_id {
        Some(expected) => {
            let trace_id = header
                .expect("trace-id header is set by error_response")
                .to_str()
                .expect("trace-id not valid UTF-8");
            assert_eq!(trace_id, expected);
        }
        None => assert!(header.is_none(), "trace-id header should not be present"),
    }

    let bytes = to_bytes(response.into_body())
        .await
        .expect("reading response body succeeds");

    serde_json::from_slice(&bytes).expect("error JSON deserialisation succeeds")
}

#[rstest]
#[actix_web::test]
async fn error_responses_include_trace_id_and_payloads(
    #[from(internal_error_case)] internal_error: DomainError,
    #[from(invalid_input_case)] invalid_input: DomainError,
    expected_trace_id: String,
) {
    let redacted = assert_error_response(
        internal_error,
        StatusCode::INTERNAL_SERVER_ERROR,
        Some(expected_trace_id.as_str()),
    )
    .await;
    assert_eq!(redacted.error_type, ErrorType::Unknown);
    assert_eq!(redacted.error, REDACTED_MESSAGE);
    assert!(redacted.details.is_none());

    let payload = assert_error_response(
        invalid_input,
        StatusCode::BAD_REQUEST,
        Some(expected_trace_id.as_str()),
    )
    .await;
    assert_eq!(payload.error_type, ErrorType::InvalidInput);
    assert_eq!(payload.error, "bad");
    assert_eq!(payload.severity, Severity::Warning);
    assert_eq!(payload.details, Some(json!({"field": "name"})));
}

#[rstest]
#[actix_web::test]
async fn error_without_trace_id_omits_trace_header() {
    let error = DomainError::invalid_input("bad").with_details(json!({"field": "name"}));

    let payload = assert_error_response(error, StatusCode::BAD_REQUEST, None).await;
    assert_eq!(payload.error, "bad");
    assert_eq!(payload.trace_id, None);
}

#[rstest]
fn error_body_uses_camel_case_wire_names() {
    let err = DomainError::unauthenticated("Please log in").with_trace_id(TRACE_ID);
    let (_, body) = normalize(&err);
    let value = serde_json::to_value(body).expect("serialise error body");
    assert_eq!(
        value,
        json!({
            "error": "Please log in",
            "errorType": "Authentication required",
            "severity": "warning",
            "traceId": TRACE_ID,
        })
    );
}

#[rstest]
fn access_denied_normalises_to_forbidden() {
    let (status, body) = normalize(&DomainError::access_denied("Not a space admin"));
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body.error, "Not a space admin");
    assert_eq!(body.error_type, ErrorType::AccessDenied);
}

#[test]
fn from_actix_error_is_redacted_internal_error() {
    use actix_web::error;

    let actix_err = error::ErrorBadRequest("boom");
    let err: DomainError = actix_err.into();

    assert_eq!(err.error_type(), ErrorType::Unknown);
    assert_eq!(err.message(), "Internal server error");
    assert_eq!(err.trace_id(), None);
    assert_eq!(err.details(), None);
}
