//! Forced-logout handling shared by the response pipeline and the idle monitor.

use std::sync::{Arc, Mutex, PoisonError};

use radmin_core::Route;
use radmin_storage::{AdminStore, PortalStore};
use reqwest::StatusCode;

/// Full navigation away from the current view, replacing it in history.
pub trait Navigator: Send + Sync {
    fn hard_redirect(&self, path: &str);
}

/// Remembers every redirect so a caller can react after the fact.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visits: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn visits(&self) -> Vec<String> {
        self.visits.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    #[must_use]
    pub fn last(&self) -> Option<String> {
        self.visits.lock().unwrap_or_else(PoisonError::into_inner).last().cloned()
    }
}

impl Navigator for RecordingNavigator {
    fn hard_redirect(&self, path: &str) {
        self.visits.lock().unwrap_or_else(PoisonError::into_inner).push(path.to_owned());
    }
}

/// The admin and portal-user stores of one client installation.
#[derive(Debug, Clone)]
pub struct Sessions {
    pub admin: Arc<AdminStore>,
    pub portal: Arc<PortalStore>,
}

/// Decides whether a 401 ends the admin session, and performs the logout when it does.
///
/// This is the one place the admin path reaches into the portal-user store: a rejected admin
/// token also clears a portal session held on the same machine.
#[derive(Clone)]
pub struct AuthInterceptor {
    sessions: Sessions,
    navigator: Arc<dyn Navigator>,
}

impl std::fmt::Debug for AuthInterceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthInterceptor").field("sessions", &self.sessions).finish_non_exhaustive()
    }
}

impl AuthInterceptor {
    #[must_use]
    pub fn new(sessions: Sessions, navigator: Arc<dyn Navigator>) -> Self {
        Self { sessions, navigator }
    }

    #[must_use]
    pub const fn sessions(&self) -> &Sessions {
        &self.sessions
    }

    /// Runs on every response. Returns true when the session was ended.
    ///
    /// All three must hold: status 401, the request carried an `Authorization` header, and
    /// the admin store currently holds a token.
    pub fn intercept(&self, status: StatusCode, carried_auth: bool) -> bool {
        if status != StatusCode::UNAUTHORIZED || !carried_auth {
            return false;
        }
        if !self.sessions.admin.is_authenticated() {
            tracing::debug!("401 with no admin session, passing through");
            return false;
        }
        self.force_logout("backend rejected the admin token");
        true
    }

    /// Clears the admin session (and a portal session, if any) and redirects to admin login.
    pub fn force_logout(&self, reason: &str) {
        tracing::warn!(reason, "forcing logout");
        self.sessions.admin.logout();
        if self.sessions.portal.is_authenticated() {
            self.sessions.portal.logout();
        }
        self.navigator.hard_redirect(Route::AdminLogin.to_path());
    }
}
