//! Tests for session API handlers.

use super::*;
use crate::domain::ports::FixtureLoginService;
use crate::inbound::http::session_store::SessionStore;
use crate::inbound::http::test_utils::{test_app, test_session_store};
use actix_web::cookie::Cookie;
use actix_web::http::StatusCode;
use actix_web::test as actix_test;
use rstest::{fixture, rstest};
use serde_json::Value;

#[derive(Debug)]
struct ValidationExpectation<'a> {
    message: &'a str,
    field: &'a str,
    code: &'a str,
}

#[fixture]
fn sessions() -> SessionStore {
    test_session_store()
}

fn login_request(username: &str, password: &str) -> actix_test::TestRequest {
    actix_test::TestRequest::post()
        .uri(LOGIN_PATH)
        .set_json(&LoginRequest {
            username: username.into(),
            password: password.into(),
        })
}

fn session_cookie(res: &actix_web::dev::ServiceResponse) -> Option<Cookie<'static>> {
    res.response()
        .cookies()
        .find(|c| c.name() == "session")
        .map(Cookie::into_owned)
}

#[rstest]
#[case(
    "   ",
    "password",
    ValidationExpectation {
        message: "username must not be empty",
        field: "username",
        code: "empty_username",
    }
)]
#[case(
    "admin",
    "",
    ValidationExpectation {
        message: "password must not be empty",
        field: "password",
        code: "empty_password",
    }
)]
#[actix_web::test]
async fn login_rejects_invalid_credentials(
    sessions: SessionStore,
    #[case] username: &str,
    #[case] password: &str,
    #[case] expected: ValidationExpectation<'_>,
) {
    let app = actix_test::init_service(test_app(sessions)).await;
    let response =
        actix_test::call_service(&app, login_request(username, password).to_request()).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(session_cookie(&response).is_none());
    let body = actix_test::read_body(response).await;
    let value: Value = serde_json::from_slice(&body).expect("error payload");
    assert_eq!(
        value.get("error").and_then(Value::as_str),
        Some(expected.message)
    );
    assert_eq!(
        value.get("errorType").and_then(Value::as_str),
        Some("Invalid input")
    );
    let details = value
        .get("details")
        .and_then(Value::as_object)
        .expect("details present");
    assert_eq!(
        details.get("field").and_then(Value::as_str),
        Some(expected.field)
    );
    assert_eq!(
        details.get("code").and_then(Value::as_str),
        Some(expected.code)
    );
}

#[rstest]
#[actix_web::test]
async fn login_rejects_wrong_credentials_with_unauthorised_status(sessions: SessionStore) {
    let app = actix_test::init_service(test_app(sessions)).await;
    let response =
        actix_test::call_service(&app, login_request("admin", "wrong-password").to_request()).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(session_cookie(&response).is_none());
    let body = actix_test::read_body(response).await;
    let value: Value = serde_json::from_slice(&body).expect("error payload");
    assert_eq!(
        value.get("error").and_then(Value::as_str),
        Some("Invalid credentials")
    );
    assert!(value.get("traceId").and_then(Value::as_str).is_some());
}

#[rstest]
#[actix_web::test]
async fn login_then_profile_round_trips_the_session(sessions: SessionStore) {
    let app = actix_test::init_service(test_app(sessions.clone())).await;

    let login_res =
        actix_test::call_service(&app, login_request("admin", "password").to_request()).await;
    assert_eq!(login_res.status(), StatusCode::OK);
    let cookie = session_cookie(&login_res).expect("session cookie");
    assert_eq!(cookie.http_only(), Some(true));
    let stored = sessions.read_session(cookie.value()).expect("sealed session");
    assert_eq!(
        stored.user_id().map(ToString::to_string).as_deref(),
        Some(FixtureLoginService::USER_ID)
    );

    let profile_res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri(PROFILE_PATH)
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(profile_res.status(), StatusCode::OK);
    assert!(session_cookie(&profile_res).is_none(), "reads do not reissue");
    let body: SessionUserResponse = actix_test::read_body_json(profile_res).await;
    assert_eq!(body.id, FixtureLoginService::USER_ID);
}

#[rstest]
#[actix_web::test]
async fn profile_requires_a_session(sessions: SessionStore) {
    let app = actix_test::init_service(test_app(sessions)).await;
    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get().uri(PROFILE_PATH).to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: ErrorBody = actix_test::read_body_json(response).await;
    assert_eq!(body.error, "Please log in");
}

#[rstest]
#[case::with_session(true)]
#[case::without_session(false)]
#[actix_web::test]
async fn logout_always_expires_the_cookie(sessions: SessionStore, #[case] signed_in: bool) {
    let app = actix_test::init_service(test_app(sessions)).await;
    let mut request = actix_test::TestRequest::post().uri(LOGOUT_PATH);
    if signed_in {
        let login_res =
            actix_test::call_service(&app, login_request("admin", "password").to_request()).await;
        request = request.cookie(session_cookie(&login_res).expect("session cookie"));
    }

    let response = actix_test::call_service(&app, request.to_request()).await;

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response).expect("removal cookie");
    assert_eq!(cookie.value(), "");
    assert_eq!(
        cookie.max_age(),
        Some(actix_web::cookie::time::Duration::ZERO)
    );
    assert!(actix_test::read_body(response).await.is_empty());
}

#[rstest]
#[actix_web::test]
async fn session_routes_reject_other_methods(sessions: SessionStore) {
    let app = actix_test::init_service(test_app(sessions)).await;
    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::delete().uri(PROFILE_PATH).to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(
        actix_test::read_body(response).await.as_ref(),
        b"Method not allowed"
    );
}
