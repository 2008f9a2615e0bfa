//! Typed error enum for the client crate.

use radmin_core::CoreError;
use serde_json::Value;
use thiserror::Error;

/// Errors from backend API calls.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No response: connection refused, DNS failure, transport timeout.
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),
    /// Non-success status passed through to the caller.
    #[error("HTTP status {code}: {message}")]
    HttpStatus { code: u16, message: String, body: String },
    #[error("JSON parse error in {context}: {source}")]
    JsonParse {
        context: String,
        #[source]
        source: serde_json::Error,
    },
    /// A 401 ended the admin session; the caller has already been redirected.
    #[error("session expired")]
    SessionExpired,
    #[error("unexpected response: {0}")]
    Envelope(#[from] CoreError),
    #[error("client initialization failed: {0}")]
    ClientInit(String),
}

impl ClientError {
    /// Builds an `HttpStatus` error, preferring the backend's `message` field.
    pub(crate) fn from_status(code: u16, body: String) -> Self {
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| backend_message(&v))
            .unwrap_or_else(|| default_reason(code).to_owned());
        Self::HttpStatus { code, message, body }
    }

    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { code, .. } => Some(*code),
            Self::SessionExpired => Some(401),
            Self::HttpRequest(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Failure without any HTTP response.
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::HttpRequest(e) if e.status().is_none())
    }

    /// User-facing text: the backend's message when there is one.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::HttpStatus { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

fn backend_message(body: &Value) -> Option<String> {
    let candidates = [body.get("message"), body.get("error"), body.pointer("/error/message")];
    candidates.into_iter().flatten().find_map(|v| v.as_str().map(str::to_owned))
}

const fn default_reason(code: u16) -> &'static str {
    match code {
        400 => "Bad request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not found",
        409 => "Conflict",
        422 => "Validation failed",
        500..=599 => "Server error",
        _ => "Request failed",
    }
}
