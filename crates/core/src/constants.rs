//! Shared constants for radmin.
//!
//! Defaults here are only fallbacks; `ClientConfig::from_env` can override the tunable ones.

/// Default number of rows requested per page.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Largest page size the client will request.
pub const MAX_PAGE_SIZE: u32 = 500;

/// Quiet period a search term must survive before it is sent upstream.
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 400;

/// Inactivity window before the idle monitor forces a logout (10 minutes).
pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 600_000;

/// Backend base path used when `RADMIN_API_URL` is not set.
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// Storage key of the admin session store.
pub const ADMIN_STORE_KEY: &str = "radmin-admin-session";

/// Storage key of the portal-user session store.
pub const PORTAL_STORE_KEY: &str = "radmin-portal-session";

/// Version written into every persisted session envelope.
pub const SESSION_FORMAT_VERSION: u32 = 1;

/// Query parameter carrying the free-text search term.
pub const SEARCH_PARAM: &str = "search";

/// Query parameter carrying the 1-indexed page number.
pub const PAGE_PARAM: &str = "page";

/// Query parameter carrying the page size.
pub const PAGE_SIZE_PARAM: &str = "pageSize";
