//! Session state held by the admin and portal-user token stores.
//!
//! `token` and `user` only ever exist together: both live inside [`Credentials`], and the
//! persisted form is converted back into `Some(Credentials)` only when both are present.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;

/// Authenticated principal as returned by a login endpoint.
///
/// The client does not validate the shape; unknown fields are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    /// Best human-readable label: username, then name, then email, then id.
    #[must_use]
    pub fn display_name(&self) -> String {
        if let Some(name) = &self.username {
            return name.clone();
        }
        for key in ["name", "fullName", "email"] {
            if let Some(Value::String(s)) = self.extra.get(key) {
                return s.clone();
            }
        }
        match &self.id {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => "unknown".to_owned(),
        }
    }

    #[must_use]
    pub fn role(&self) -> Option<&str> {
        self.extra.get("role").and_then(Value::as_str)
    }

    #[must_use]
    pub fn organization_id(&self) -> Option<&Value> {
        self.extra.get("organizationId").filter(|v| !v.is_null())
    }
}

/// Bearer token together with the user it was issued for.
#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    pub token: String,
    pub user: User,
}

impl Credentials {
    #[must_use]
    pub fn new(token: impl Into<String>, user: User) -> Self {
        Self { token: token.into(), user }
    }
}

/// Backend subsystem the admin console currently drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperatingMode {
    #[serde(rename = "AAA")]
    Aaa,
    #[serde(rename = "Mikrotik")]
    Mikrotik,
}

impl OperatingMode {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match *self {
            Self::Aaa => "AAA",
            Self::Mikrotik => "Mikrotik",
        }
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperatingMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aaa" => Ok(Self::Aaa),
            "mikrotik" => Ok(Self::Mikrotik),
            _ => Err(CoreError::InvalidInput(format!("unknown operating mode: {s}"))),
        }
    }
}

/// Advertisement attached to a portal login, shown once on the next dashboard render.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Advertisement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Behaviour shared by the two persisted session shapes.
pub trait SessionState:
    Clone + Default + PartialEq + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Fields set atomically together with the credentials on login.
    type LoginExtra: Send;

    fn credentials(&self) -> Option<&Credentials>;

    /// Replaces credentials and extra fields in one step.
    fn login(&mut self, credentials: Credentials, extra: Self::LoginExtra);

    /// Clears credentials and every derived field.
    fn clear(&mut self);

    /// Mutable access to the user, present only while logged in.
    fn user_mut(&mut self) -> Option<&mut User>;

    fn token(&self) -> Option<&str> {
        self.credentials().map(|c| c.token.as_str()).filter(|t| !t.is_empty())
    }

    fn user(&self) -> Option<&User> {
        self.credentials().map(|c| &c.user)
    }

    fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }
}

/// Admin console session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "AdminRepr", into = "AdminRepr")]
pub struct AdminSession {
    pub credentials: Option<Credentials>,
    pub operating_mode: Option<OperatingMode>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdminRepr {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    user: Option<User>,
    #[serde(default)]
    operating_mode: Option<OperatingMode>,
}

impl From<AdminRepr> for AdminSession {
    fn from(repr: AdminRepr) -> Self {
        match pair(repr.token, repr.user) {
            Some(credentials) => {
                Self { credentials: Some(credentials), operating_mode: repr.operating_mode }
            },
            None => Self::default(),
        }
    }
}

impl From<AdminSession> for AdminRepr {
    fn from(session: AdminSession) -> Self {
        let (token, user) = split(session.credentials);
        Self { token, user, operating_mode: session.operating_mode }
    }
}

impl SessionState for AdminSession {
    type LoginExtra = Option<OperatingMode>;

    fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    fn login(&mut self, credentials: Credentials, extra: Self::LoginExtra) {
        self.credentials = Some(credentials);
        self.operating_mode = extra;
    }

    fn clear(&mut self) {
        self.credentials = None;
        self.operating_mode = None;
    }

    fn user_mut(&mut self) -> Option<&mut User> {
        self.credentials.as_mut().map(|c| &mut c.user)
    }
}

/// Captive-portal end-user session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "PortalRepr", into = "PortalRepr")]
pub struct PortalSession {
    pub credentials: Option<Credentials>,
    pub pending_ad: Option<Advertisement>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PortalRepr {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    user: Option<User>,
    #[serde(default)]
    pending_ad: Option<Advertisement>,
}

impl From<PortalRepr> for PortalSession {
    fn from(repr: PortalRepr) -> Self {
        match pair(repr.token, repr.user) {
            Some(credentials) => Self { credentials: Some(credentials), pending_ad: repr.pending_ad },
            None => Self::default(),
        }
    }
}

impl From<PortalSession> for PortalRepr {
    fn from(session: PortalSession) -> Self {
        let (token, user) = split(session.credentials);
        Self { token, user, pending_ad: session.pending_ad }
    }
}

impl SessionState for PortalSession {
    type LoginExtra = Option<Advertisement>;

    fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    fn login(&mut self, credentials: Credentials, extra: Self::LoginExtra) {
        self.credentials = Some(credentials);
        self.pending_ad = extra;
    }

    fn clear(&mut self) {
        self.credentials = None;
        self.pending_ad = None;
    }

    fn user_mut(&mut self) -> Option<&mut User> {
        self.credentials.as_mut().map(|c| &mut c.user)
    }
}

fn pair(token: Option<String>, user: Option<User>) -> Option<Credentials> {
    match (token, user) {
        (Some(token), Some(user)) if !token.is_empty() => Some(Credentials { token, user }),
        _ => None,
    }
}

fn split(credentials: Option<Credentials>) -> (Option<String>, Option<User>) {
    credentials.map_or((None, None), |c| (Some(c.token), Some(c.user)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn alice() -> User {
        serde_json::from_value(json!({"id": 7, "username": "alice", "role": "admin"})).unwrap()
    }

    #[test]
    fn test_user_keeps_unknown_fields() {
        let user = alice();
        assert_eq!(user.role(), Some("admin"));
        let back = serde_json::to_value(&user).unwrap();
        assert_eq!(back, json!({"id": 7, "username": "alice", "role": "admin"}));
    }

    #[test]
    fn test_display_name_fallbacks() {
        let by_email: User = serde_json::from_value(json!({"email": "a@b.c"})).unwrap();
        assert_eq!(by_email.display_name(), "a@b.c");
        let by_id: User = serde_json::from_value(json!({"id": 12})).unwrap();
        assert_eq!(by_id.display_name(), "12");
    }

    #[test]
    fn test_admin_session_persisted_shape() {
        let mut session = AdminSession::default();
        session.login(Credentials::new("tok", alice()), Some(OperatingMode::Mikrotik));
        let value = serde_json::to_value(&session).unwrap();
        assert_eq!(value["token"], "tok");
        assert_eq!(value["user"]["username"], "alice");
        assert_eq!(value["operatingMode"], "Mikrotik");

        let back: AdminSession = serde_json::from_value(value).unwrap();
        assert_eq!(back, session);
    }

    #[test]
    fn test_token_without_user_hydrates_logged_out() {
        let session: AdminSession =
            serde_json::from_value(json!({"token": "tok", "operatingMode": "AAA"})).unwrap();
        assert!(session.credentials.is_none());
        assert!(session.operating_mode.is_none());
    }

    #[test]
    fn test_user_without_token_hydrates_logged_out() {
        let session: PortalSession =
            serde_json::from_value(json!({"user": {"username": "bob"}})).unwrap();
        assert!(!session.is_authenticated());
        assert!(session.user().is_none());
    }

    #[test]
    fn test_clear_drops_derived_fields() {
        let mut session = PortalSession::default();
        let ad = Advertisement { title: Some("promo".to_owned()), ..Advertisement::default() };
        session.login(Credentials::new("tok", alice()), Some(ad));
        assert!(session.pending_ad.is_some());
        session.clear();
        assert_eq!(session, PortalSession::default());
    }

    #[test]
    fn test_operating_mode_parse() {
        assert_eq!("aaa".parse::<OperatingMode>().unwrap(), OperatingMode::Aaa);
        assert_eq!("MikroTik".parse::<OperatingMode>().unwrap(), OperatingMode::Mikrotik);
        assert!("radius".parse::<OperatingMode>().is_err());
    }
}
