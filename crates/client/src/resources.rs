//! Typed CRUD over the resource catalog, plus settings and profile endpoints.

use radmin_core::{ListQuery, OperatingMode, Page, Resource, User};
use radmin_storage::AdminStore;
use reqwest::Method;
use serde_json::{Value, json};

use crate::client::ApiClient;
use crate::error::ClientError;

pub const SETTINGS_PATH: &str = "/settings";
pub const PROFILE_PATH: &str = "/auth/profile";

impl ApiClient {
    /// Fetches one page of `endpoint`.
    ///
    /// # Errors
    /// Transport and status errors from [`ApiClient::send`]; `Envelope` when the body has no
    /// recognizable record array.
    pub async fn list(&self, endpoint: &str, query: &ListQuery) -> Result<Page, ClientError> {
        let body = self.send(Method::GET, endpoint, &query.to_pairs(), None).await?;
        Ok(Page::from_envelope(body, query)?)
    }

    /// # Errors
    /// See [`ApiClient::send`].
    pub async fn get_record(&self, resource: Resource, id: &str) -> Result<Value, ClientError> {
        let body = self.send(Method::GET, &resource.item_path(id), &[], None).await?;
        Ok(unwrap_data(body))
    }

    /// # Errors
    /// See [`ApiClient::send`].
    pub async fn create(&self, resource: Resource, record: &Value) -> Result<Value, ClientError> {
        let body = self.send(Method::POST, resource.endpoint(), &[], Some(record)).await?;
        Ok(unwrap_data(body))
    }

    /// # Errors
    /// See [`ApiClient::send`].
    pub async fn update(
        &self,
        resource: Resource,
        id: &str,
        changes: &Value,
    ) -> Result<Value, ClientError> {
        let body = self.send(Method::PUT, &resource.item_path(id), &[], Some(changes)).await?;
        Ok(unwrap_data(body))
    }

    /// # Errors
    /// See [`ApiClient::send`].
    pub async fn delete(&self, resource: Resource, id: &str) -> Result<(), ClientError> {
        self.send(Method::DELETE, &resource.item_path(id), &[], None).await?;
        Ok(())
    }

    /// # Errors
    /// See [`ApiClient::send`].
    pub async fn settings(&self) -> Result<Value, ClientError> {
        Ok(unwrap_data(self.send(Method::GET, SETTINGS_PATH, &[], None).await?))
    }

    /// Saves the operating mode, then records it in the admin store.
    ///
    /// # Errors
    /// On failure the store keeps its previous mode.
    pub async fn save_operating_mode(
        &self,
        store: &AdminStore,
        mode: OperatingMode,
    ) -> Result<Value, ClientError> {
        let body = json!({ "operatingMode": mode });
        let saved = unwrap_data(self.send(Method::PUT, SETTINGS_PATH, &[], Some(&body)).await?);
        store.set_operating_mode(mode);
        Ok(saved)
    }

    /// Saves profile changes and replaces the stored user without re-authenticating.
    ///
    /// # Errors
    /// `JsonParse` when the response carries no user object.
    pub async fn update_profile(
        &self,
        store: &AdminStore,
        changes: &Value,
    ) -> Result<User, ClientError> {
        let body = unwrap_data(self.send(Method::PUT, PROFILE_PATH, &[], Some(changes)).await?);
        let user_value = body.get("user").cloned().unwrap_or(body);
        let user: User = serde_json::from_value(user_value).map_err(|source| {
            ClientError::JsonParse { context: "profile response".to_owned(), source }
        })?;
        store.set_user(user.clone());
        Ok(user)
    }
}

/// Strips a `{data: ...}` wrapper when present.
fn unwrap_data(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("data") && !map.contains_key("pagination") => {
            map.remove("data").unwrap_or(Value::Null)
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwrap_data() {
        assert_eq!(unwrap_data(json!({"data": {"id": 1}})), json!({"id": 1}));
        assert_eq!(unwrap_data(json!({"id": 1})), json!({"id": 1}));
        assert_eq!(unwrap_data(Value::Null), Value::Null);
    }
}
