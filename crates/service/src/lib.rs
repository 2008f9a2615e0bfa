//! Front-end engines for radmin
//!
//! The paginated list engine every list view is built on, and the idle-timeout monitor that
//! ends an unattended admin session.

mod idle;
mod paginated_fetch;
mod source;

pub use idle::{ActivitySignal, IdleCallback, IdleMonitor, logout_on_idle};
pub use paginated_fetch::{FetchFailure, FetchOptions, PageView, PaginatedFetch};
pub use source::PageSource;
