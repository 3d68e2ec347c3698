//! Session configuration parsing and validation.
//!
//! Settings are read once at process start into [`SessionSettings`] and then
//! passed by reference to the session store. Request-handling code never reads
//! the environment.

use actix_web::cookie::time::Duration;
use actix_web::cookie::{Key, SameSite};
use mockable::Env;
use tracing::warn;
use zeroize::Zeroizing;

pub mod fingerprint;

/// Symmetric secret used to seal session cookies.
pub const AUTH_SECRET_ENV: &str = "AUTH_SECRET";
/// Deployment environment; `production` turns on `Secure` cookies.
pub const NODE_ENV: &str = "NODE_ENV";
/// Per-application cookie name so co-hosted apps do not share sessions.
pub const COOKIE_NAME_ENV: &str = "SESSION_COOKIE_NAME";
/// Session cookie lifetime in seconds.
pub const SESSION_TTL_ENV: &str = "SESSION_TTL_SECONDS";

/// Minimum secret length accepted for key derivation.
pub const SECRET_MIN_LEN: usize = 32;
/// Cookie name used when none is configured.
pub const DEFAULT_COOKIE_NAME: &str = "session";
/// Session lifetime used when none is configured (14 days).
pub const DEFAULT_TTL_SECONDS: i64 = 14 * 24 * 60 * 60;

const NODE_ENV_EXPECTED: &str = "production|development|test";
const TTL_EXPECTED: &str = "a positive number of seconds";
const COOKIE_NAME_EXPECTED: &str = "a non-empty cookie token";
const COOKIE_NAME_SEPARATORS: &str = "!#$%&'*+-.^_`|~";

/// Deployment environment derived from `NODE_ENV`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RuntimeEnv {
    /// Served over HTTPS; cookies are marked `Secure`.
    Production,
    /// Local development over plain HTTP.
    Development,
    /// Automated tests; a missing secret is replaced by an ephemeral key.
    Test,
}

impl RuntimeEnv {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" => Some(Self::Production),
            "development" => Some(Self::Development),
            "test" => Some(Self::Test),
            _ => None,
        }
    }

    /// Whether cookies must carry the `Secure` attribute.
    #[must_use]
    pub fn requires_secure_cookies(self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Session settings derived from the environment.
pub struct SessionSettings {
    /// Encryption and signing key for session cookies.
    pub key: Key,
    /// Name of the session cookie.
    pub cookie_name: String,
    /// Whether session cookies are marked `Secure`.
    pub cookie_secure: bool,
    /// `SameSite` policy for session cookies.
    pub same_site: SameSite,
    /// Cookie lifetime.
    pub ttl: Duration,
    /// Environment the settings were built for.
    pub runtime: RuntimeEnv,
}

impl SessionSettings {
    /// Settings with a caller-supplied key, suitable for tests and embedding.
    #[must_use]
    pub fn with_key(key: Key, cookie_name: impl Into<String>) -> Self {
        Self {
            key,
            cookie_name: cookie_name.into(),
            cookie_secure: false,
            same_site: SameSite::Lax,
            ttl: Duration::seconds(DEFAULT_TTL_SECONDS),
            runtime: RuntimeEnv::Test,
        }
    }
}

/// Errors raised while validating session configuration.
#[derive(thiserror::Error, Debug)]
pub enum SessionConfigError {
    /// A required environment variable is missing.
    #[error("missing required environment variable: {name}")]
    MissingEnv {
        /// Variable name.
        name: &'static str,
    },
    /// A variable is present but contains an invalid value.
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidEnv {
        /// Variable name.
        name: &'static str,
        /// Offending value.
        value: String,
        /// Description of accepted values.
        expected: &'static str,
    },
    /// The secret is too short to derive a key from.
    #[error("{AUTH_SECRET_ENV} too short: need >= {min_len} bytes, got {length}")]
    SecretTooShort {
        /// Supplied length in bytes.
        length: usize,
        /// Required minimum.
        min_len: usize,
    },
}

/// Build session settings from environment variables.
///
/// A missing `AUTH_SECRET` is fatal unless `NODE_ENV=test`.
///
/// # Examples
///
/// ```rust
/// use session_gate::inbound::http::session_config::session_settings_from_env;
/// use mockable::MockEnv;
///
/// let mut env = MockEnv::new();
/// env.expect_string().returning(|name| match name {
///     "AUTH_SECRET" => Some("a".repeat(32)),
///     "NODE_ENV" => Some("production".to_owned()),
///     _ => None,
/// });
///
/// let settings = session_settings_from_env(&env).expect("valid settings");
/// assert!(settings.cookie_secure);
/// assert_eq!(settings.cookie_name, "session");
/// ```
pub fn session_settings_from_env<E: Env>(env: &E) -> Result<SessionSettings, SessionConfigError> {
    let runtime = runtime_from_env(env)?;
    let key = key_from_env(env, runtime)?;
    let cookie_name = cookie_name_from_env(env)?;
    let ttl = ttl_from_env(env)?;

    Ok(SessionSettings {
        key,
        cookie_name,
        cookie_secure: runtime.requires_secure_cookies(),
        same_site: SameSite::Lax,
        ttl,
        runtime,
    })
}

fn runtime_from_env<E: Env>(env: &E) -> Result<RuntimeEnv, SessionConfigError> {
    let Some(value) = env.string(NODE_ENV) else {
        warn!("NODE_ENV not set; assuming development");
        return Ok(RuntimeEnv::Development);
    };
    RuntimeEnv::parse(&value).ok_or(SessionConfigError::InvalidEnv {
        name: NODE_ENV,
        value,
        expected: NODE_ENV_EXPECTED,
    })
}

fn key_from_env<E: Env>(env: &E, runtime: RuntimeEnv) -> Result<Key, SessionConfigError> {
    let Some(secret) = env.string(AUTH_SECRET_ENV).map(Zeroizing::new) else {
        if runtime == RuntimeEnv::Test {
            warn!("AUTH_SECRET not set; using an ephemeral session key (test only)");
            return Ok(Key::generate());
        }
        return Err(SessionConfigError::MissingEnv {
            name: AUTH_SECRET_ENV,
        });
    };

    let length = secret.len();
    if length < SECRET_MIN_LEN {
        return Err(SessionConfigError::SecretTooShort {
            length,
            min_len: SECRET_MIN_LEN,
        });
    }
    Ok(Key::derive_from(secret.as_bytes()))
}

fn cookie_name_from_env<E: Env>(env: &E) -> Result<String, SessionConfigError> {
    let Some(value) = env.string(COOKIE_NAME_ENV) else {
        return Ok(DEFAULT_COOKIE_NAME.to_owned());
    };
    if is_cookie_token(&value) {
        Ok(value)
    } else {
        Err(SessionConfigError::InvalidEnv {
            name: COOKIE_NAME_ENV,
            value,
            expected: COOKIE_NAME_EXPECTED,
        })
    }
}

fn ttl_from_env<E: Env>(env: &E) -> Result<Duration, SessionConfigError> {
    let Some(value) = env.string(SESSION_TTL_ENV) else {
        return Ok(Duration::seconds(DEFAULT_TTL_SECONDS));
    };
    match value.trim().parse::<i64>() {
        Ok(seconds) if seconds > 0 => Ok(Duration::seconds(seconds)),
        _ => Err(SessionConfigError::InvalidEnv {
            name: SESSION_TTL_ENV,
            value,
            expected: TTL_EXPECTED,
        }),
    }
}

fn is_cookie_token(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || COOKIE_NAME_SEPARATORS.contains(c))
}
