//! Session record and the principal derived from it.
//!
//! A [`Session`] is the decoded content of the sealed session cookie. It is
//! rebuilt from the request every time and never cached in process memory.
//! Handlers receive it read-only and describe any change through the reply,
//! so the dispatch layer owns sealing and cookie attachment.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{DomainError, UserId};

const USER_KEY: &str = "user";

/// Authenticated user reference stored in the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    /// Identifier of the signed-in user.
    pub id: UserId,
}

/// Client-held session content.
///
/// App-specific fields (for example `farcasterUser`) are stored next to
/// `user` in the JSON form.
///
/// # Examples
/// ```
/// use session_gate::domain::{Session, UserId};
/// use serde_json::json;
///
/// let mut session = Session::default();
/// assert!(session.is_empty());
///
/// session.set_user(UserId::random());
/// session.insert_field("farcasterUser", json!({ "fid": 42 })).expect("app field");
/// assert!(session.user_id().is_some());
/// assert_eq!(session.field("farcasterUser"), Some(&json!({ "fid": 42 })));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<SessionUser>,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl Session {
    /// Session already carrying a signed-in user.
    #[must_use]
    pub fn for_user(id: UserId) -> Self {
        let mut session = Self::default();
        session.set_user(id);
        session
    }

    /// Identifier of the signed-in user, if any.
    #[must_use]
    pub fn user_id(&self) -> Option<&UserId> {
        self.user.as_ref().map(|user| &user.id)
    }

    /// Record the signed-in user.
    pub fn set_user(&mut self, id: UserId) {
        self.user = Some(SessionUser { id });
    }

    /// Forget the signed-in user but keep app fields.
    pub fn clear_user(&mut self) {
        self.user = None;
    }

    /// Read an app-specific field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Store an app-specific field.
    ///
    /// The `user` key is reserved for [`Session::set_user`].
    pub fn insert_field(
        &mut self,
        name: impl Into<String>,
        value: Value,
    ) -> Result<Option<Value>, DomainError> {
        let name = name.into();
        if name == USER_KEY {
            return Err(DomainError::undesirable_operation(
                "The user session field can only be set through sign-in",
            ));
        }
        Ok(self.fields.insert(name, value))
    }

    /// Remove an app-specific field.
    pub fn remove_field(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    /// Drop every stored value.
    pub fn clear(&mut self) {
        self.user = None;
        self.fields.clear();
    }

    /// Whether nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.user.is_none() && self.fields.is_empty()
    }
}

/// Read-only view of the acting user, recomputed per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    user_id: UserId,
}

impl Principal {
    /// Derive the principal from a decoded session.
    #[must_use]
    pub fn from_session(session: &Session) -> Option<Self> {
        session.user_id().map(|id| Self {
            user_id: id.clone(),
        })
    }

    /// Identifier of the acting user.
    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }
}
