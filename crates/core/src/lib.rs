//! Core types for radmin
//!
//! Domain types shared by the storage, client, service and CLI crates: session state,
//! list queries and pagination envelopes, the resource catalog and route guards.

pub mod constants;
mod env_config;
mod error;
mod filters;
pub mod guard;
mod pagination;
mod query;
mod resource;
mod session;

pub use constants::*;
pub use env_config::{ClientConfig, env_parse_with_default};
pub use error::{CoreError, Result};
pub use filters::{Filters, SortOrder};
pub use guard::{GuardDecision, GuardVariant, Route};
pub use pagination::{Page, Pagination, clamp_page};
pub use query::ListQuery;
pub use resource::Resource;
pub use session::{
    AdminSession, Advertisement, Credentials, OperatingMode, PortalSession, SessionState, User,
};
