//! Login endpoints and response normalization.

use radmin_core::{Advertisement, OperatingMode, User};
use radmin_storage::{AdminStore, PortalStore};
use reqwest::Method;
use serde_json::{Value, json};

use crate::client::ApiClient;
use crate::error::ClientError;

pub const ADMIN_LOGIN_PATH: &str = "/auth/login";
pub const PORTAL_LOGIN_PATH: &str = "/portal/login";
pub const EXTERNAL_LOGIN_PATH: &str = "/external-auth/login";

/// Normalized successful login.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
    pub operating_mode: Option<OperatingMode>,
    pub advertisement: Option<Advertisement>,
}

impl LoginResponse {
    /// Accepts `{token, user}`, `{data: {token, user}}` and `accessToken` in place of `token`.
    ///
    /// # Errors
    /// Returns `JsonParse` when no token or no user object can be found.
    pub fn from_value(body: Value) -> Result<Self, ClientError> {
        let root = match body.get("data") {
            Some(data) if data.is_object() => data.clone(),
            _ => body,
        };
        let token = ["token", "accessToken", "access_token"]
            .iter()
            .find_map(|k| root.get(*k).and_then(Value::as_str))
            .filter(|t| !t.is_empty())
            .map(str::to_owned)
            .ok_or_else(|| missing("token"))?;
        let user_value = ["user", "admin", "profile"]
            .iter()
            .find_map(|k| root.get(*k).filter(|v| v.is_object()))
            .cloned()
            .ok_or_else(|| missing("user"))?;
        let user: User = serde_json::from_value(user_value)
            .map_err(|source| ClientError::JsonParse { context: "login user".to_owned(), source })?;
        let operating_mode = root
            .get("operatingMode")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok());
        let advertisement = ["ad", "advertisement", "pendingAd"]
            .iter()
            .find_map(|k| root.get(*k).filter(|v| v.is_object()))
            .and_then(|v| serde_json::from_value(v.clone()).ok());
        Ok(Self { token, user, operating_mode, advertisement })
    }
}

fn missing(field: &str) -> ClientError {
    ClientError::JsonParse {
        context: format!("login response: missing {field}"),
        source: serde::de::Error::custom(format!("missing field `{field}`")),
    }
}

impl ApiClient {
    /// Authenticates an administrator and starts the admin session.
    ///
    /// # Errors
    /// Backend rejection is returned unchanged; the store is only touched on success.
    pub async fn admin_login(
        &self,
        store: &AdminStore,
        username: &str,
        password: &str,
    ) -> Result<LoginResponse, ClientError> {
        let body = json!({ "username": username, "password": password });
        let value = self.send_anonymous(Method::POST, ADMIN_LOGIN_PATH, Some(&body)).await?;
        let login = LoginResponse::from_value(value)?;
        store.login(login.token.clone(), login.user.clone(), login.operating_mode);
        Ok(login)
    }

    /// Authenticates a captive-portal user; an attached advertisement becomes `pendingAd`.
    ///
    /// # Errors
    /// Backend rejection (including 401) is returned unchanged.
    pub async fn portal_login(
        &self,
        store: &PortalStore,
        username: &str,
        password: &str,
    ) -> Result<LoginResponse, ClientError> {
        let body = json!({ "username": username, "password": password });
        let value = self.send_anonymous(Method::POST, PORTAL_LOGIN_PATH, Some(&body)).await?;
        let login = LoginResponse::from_value(value)?;
        store.login(login.token.clone(), login.user.clone(), login.advertisement.clone());
        Ok(login)
    }

    /// Exchanges an external identity payload (voucher code, social login) for a portal session.
    ///
    /// # Errors
    /// Backend rejection is returned unchanged.
    pub async fn external_login(
        &self,
        store: &PortalStore,
        payload: &Value,
    ) -> Result<LoginResponse, ClientError> {
        let value = self.send_anonymous(Method::POST, EXTERNAL_LOGIN_PATH, Some(payload)).await?;
        let login = LoginResponse::from_value(value)?;
        store.login(login.token.clone(), login.user.clone(), login.advertisement.clone());
        Ok(login)
    }
}
