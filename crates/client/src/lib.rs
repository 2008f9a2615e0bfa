//! HTTP client for the radmin backend.
//!
//! Every request goes through one [`ApiClient`]: it attaches the bearer token and routes
//! each response through the [`AuthInterceptor`], the only code that reacts to a 401.

mod auth;
mod client;
#[cfg(test)]
mod client_tests;
mod error;
mod interceptor;
mod resources;

pub use auth::{ADMIN_LOGIN_PATH, EXTERNAL_LOGIN_PATH, LoginResponse, PORTAL_LOGIN_PATH};
pub use client::{ApiClient, ApiClientBuilder, TokenSource, truncate};
pub use error::ClientError;
pub use interceptor::{AuthInterceptor, Navigator, RecordingNavigator, Sessions};
pub use resources::{PROFILE_PATH, SETTINGS_PATH};
pub use reqwest::Method;
