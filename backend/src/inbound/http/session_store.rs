//! Sealed session cookie codec.
//!
//! Sessions travel as private cookies: the JSON form of a [`Session`] is
//! encrypted with AES-256-GCM under the configured key, with the cookie name
//! bound as associated data so a value sealed for one application cannot be
//! replayed under another application's cookie name. Each seal draws a fresh
//! nonce.
//!
//! Unsealing fails closed. Anything that does not decrypt and parse is treated
//! as "no session"; client-supplied bytes never become an error or a panic.

use std::fmt;

use actix_web::HttpRequest;
use actix_web::cookie::time::Duration;
use actix_web::cookie::{Cookie, CookieJar, Key, SameSite};
use tracing::debug;

use super::session_config::SessionSettings;
use crate::domain::{DomainError, Session};

/// Reads, writes, and destroys sealed sessions. Built once at startup.
#[derive(Clone)]
pub struct SessionStore {
    key: Key,
    cookie_name: String,
    secure: bool,
    same_site: SameSite,
    ttl: Duration,
}

impl SessionStore {
    /// Build the store from validated settings.
    #[must_use]
    pub fn new(settings: &SessionSettings) -> Self {
        Self {
            key: settings.key.clone(),
            cookie_name: settings.cookie_name.clone(),
            secure: settings.cookie_secure,
            same_site: settings.same_site,
            ttl: settings.ttl,
        }
    }

    /// Name of the session cookie.
    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Unseal a raw cookie value.
    ///
    /// Returns `None` for tampered, truncated, foreign-key, or otherwise
    /// malformed values.
    #[must_use]
    pub fn read_session(&self, raw: &str) -> Option<Session> {
        let mut jar = CookieJar::new();
        jar.add_original(Cookie::new(self.cookie_name.clone(), raw.to_owned()));
        let Some(plain) = jar.private(&self.key).get(&self.cookie_name) else {
            debug!(cookie = %self.cookie_name, "session cookie failed verification");
            return None;
        };
        match serde_json::from_str::<Session>(plain.value()) {
            Ok(session) => Some(session),
            Err(error) => {
                debug!(cookie = %self.cookie_name, %error, "sealed session payload is malformed");
                None
            }
        }
    }

    /// Find the session cookie in a raw `Cookie` header and unseal it.
    #[must_use]
    pub fn read_from_cookie_header(&self, header: Option<&str>) -> Option<Session> {
        header?
            .split(';')
            .filter_map(|pair| Cookie::parse(pair.trim().to_owned()).ok())
            .find(|cookie| cookie.name() == self.cookie_name)
            .and_then(|cookie| self.read_session(cookie.value()))
    }

    /// Unseal the session carried by an inbound request, if any.
    #[must_use]
    pub fn read_request(&self, req: &HttpRequest) -> Option<Session> {
        req.cookie(&self.cookie_name)
            .and_then(|cookie| self.read_session(cookie.value()))
    }

    /// Seal a session into an opaque cookie value.
    pub fn write_session(&self, session: &Session) -> Result<String, DomainError> {
        let payload = serde_json::to_string(session)
            .map_err(|error| DomainError::internal(format!("failed to encode session: {error}")))?;
        let mut jar = CookieJar::new();
        jar.private_mut(&self.key)
            .add(Cookie::new(self.cookie_name.clone(), payload));
        jar.get(&self.cookie_name)
            .map(|sealed| sealed.value().to_owned())
            .ok_or_else(|| DomainError::internal("sealed session cookie missing from jar"))
    }

    /// Seal a session into a ready-to-send `Set-Cookie` value.
    pub fn session_cookie(&self, session: &Session) -> Result<Cookie<'static>, DomainError> {
        let sealed = self.write_session(session)?;
        Ok(self.cookie_template(sealed).max_age(self.ttl).finish())
    }

    /// Clear `session` and produce the cookie that tells the client to drop it.
    ///
    /// Calling this on an already empty session yields the same removal
    /// cookie.
    pub fn destroy_session(&self, session: &mut Session) -> Cookie<'static> {
        session.clear();
        self.removal_cookie()
    }

    /// Expired, empty session cookie.
    #[must_use]
    pub fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = self.cookie_template(String::new()).finish();
        cookie.make_removal();
        cookie
    }

    fn cookie_template(&self, value: String) -> actix_web::cookie::CookieBuilder<'static> {
        Cookie::build(self.cookie_name.clone(), value)
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(self.same_site)
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("cookie_name", &self.cookie_name)
            .field("secure", &self.secure)
            .field("same_site", &self.same_site)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserId;
    use actix_web::test::TestRequest;
    use rstest::{fixture, rstest};
    use serde_json::json;

    const FIXTURE_ID: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

    fn store_with(key: Key, name: &str) -> SessionStore {
        SessionStore::new(&SessionSettings::with_key(key, name))
    }

    #[fixture]
    fn store() -> SessionStore {
        store_with(Key::derive_from(&[b'k'; 64]), "session")
    }

    #[fixture]
    fn signed_in() -> Session {
        let mut session = Session::for_user(UserId::new(FIXTURE_ID).expect("fixture id"));
        session
            .insert_field("farcasterUser", json!({ "fid": 3 }))
            .expect("app field");
        session
    }

    #[rstest]
    fn sealed_value_unseals_to_the_same_session(store: SessionStore, signed_in: Session) {
        let sealed = store.write_session(&signed_in).expect("seal");
        assert!(!sealed.contains(FIXTURE_ID), "sealed value must be opaque");
        assert_eq!(store.read_session(&sealed), Some(signed_in));
    }

    #[rstest]
    fn sealing_twice_uses_fresh_nonces(store: SessionStore, signed_in: Session) {
        let first = store.write_session(&signed_in).expect("seal");
        let second = store.write_session(&signed_in).expect("seal");
        assert_ne!(first, second);
        assert_eq!(store.read_session(&first), store.read_session(&second));
    }

    #[rstest]
    #[case("")]
    #[case("not-base64!!")]
    #[case("c2hvcnQ=")]
    #[case("{\"user\":{\"id\":\"3fa85f64-5717-4562-b3fc-2c963f66afa6\"}}")]
    fn malformed_values_read_as_absent(store: SessionStore, #[case] raw: &str) {
        assert_eq!(store.read_session(raw), None);
    }

    #[rstest]
    fn tampered_values_read_as_absent(store: SessionStore, signed_in: Session) {
        let sealed = store.write_session(&signed_in).expect("seal");
        let mut tampered: Vec<char> = sealed.chars().collect();
        if let Some(c) = tampered.iter_mut().rev().nth(1) {
            *c = if *c == 'A' { 'B' } else { 'A' };
        }
        let tampered: String = tampered.into_iter().collect();
        assert_ne!(tampered, sealed);
        assert_eq!(store.read_session(&tampered), None);
    }

    #[rstest]
    fn values_sealed_with_another_key_read_as_absent(store: SessionStore, signed_in: Session) {
        let foreign = store_with(Key::derive_from(&[b'z'; 64]), "session");
        let sealed = foreign.write_session(&signed_in).expect("seal");
        assert_eq!(store.read_session(&sealed), None);
    }

    #[rstest]
    fn values_sealed_for_another_cookie_name_read_as_absent(
        store: SessionStore,
        signed_in: Session,
    ) {
        let other_app = store_with(Key::derive_from(&[b'k'; 64]), "scoutgame-session");
        let sealed = other_app.write_session(&signed_in).expect("seal");
        assert_eq!(store.read_session(&sealed), None);
    }

    #[rstest]
    fn reads_session_from_request_cookie(store: SessionStore, signed_in: Session) {
        let cookie = store.session_cookie(&signed_in).expect("cookie");
        let req = TestRequest::default().cookie(cookie).to_http_request();
        assert_eq!(store.read_request(&req), Some(signed_in));
    }

    #[rstest]
    fn reads_session_from_cookie_header(store: SessionStore, signed_in: Session) {
        let sealed = store.write_session(&signed_in).expect("seal");
        let header = format!("theme=dark; session={sealed}; other=1");
        assert_eq!(store.read_from_cookie_header(Some(&header)), Some(signed_in));
        assert_eq!(store.read_from_cookie_header(Some("theme=dark")), None);
        assert_eq!(store.read_from_cookie_header(None), None);
    }

    #[rstest]
    fn session_cookie_carries_configured_attributes(store: SessionStore, signed_in: Session) {
        let cookie = store.session_cookie(&signed_in).expect("cookie");
        assert_eq!(cookie.name(), "session");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(
            cookie.max_age(),
            Some(Duration::seconds(
                super::super::session_config::DEFAULT_TTL_SECONDS
            ))
        );
    }

    #[rstest]
    fn destroy_is_idempotent(store: SessionStore, signed_in: Session) {
        let mut session = signed_in;
        let first = store.destroy_session(&mut session);
        let after_first = session.clone();
        let second = store.destroy_session(&mut session);

        assert!(session.is_empty());
        assert_eq!(after_first, session);
        for cookie in [&first, &second] {
            assert_eq!(cookie.name(), "session");
            assert_eq!(cookie.value(), "");
            assert_eq!(cookie.path(), Some("/"));
            assert_eq!(cookie.max_age(), Some(Duration::ZERO));
        }
    }
}
