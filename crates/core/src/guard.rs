//! Route table and navigation guards.
//!
//! Guards are pure functions of `(has_hydrated, token)`. They never touch storage, so the
//! caller decides what "render", "suspend" and "redirect" mean for its own front end.

use std::fmt;

/// Which session a guarded route depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardVariant {
    Admin,
    Portal,
}

impl GuardVariant {
    /// Login route unauthenticated visitors are sent to.
    #[must_use]
    pub const fn login_route(&self) -> Route {
        match *self {
            Self::Admin => Route::AdminLogin,
            Self::Portal => Route::PortalLogin,
        }
    }
}

/// Outcome of evaluating a guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Persisted state not read yet: render neither content nor redirect.
    Suspend,
    /// Render the protected subtree.
    Render,
    /// Navigate to `to`; `replace` means the guarded route is dropped from history.
    Redirect { to: Route, replace: bool },
}

/// Decides what a guarded route shows.
#[must_use]
pub fn evaluate(variant: GuardVariant, has_hydrated: bool, token: Option<&str>) -> GuardDecision {
    if !has_hydrated {
        return GuardDecision::Suspend;
    }
    match token {
        Some(t) if !t.is_empty() => GuardDecision::Render,
        _ => GuardDecision::Redirect { to: variant.login_route(), replace: true },
    }
}

/// Snapshot of one store as seen by the router.
#[derive(Debug, Clone, Copy, Default)]
pub struct GuardInput<'a> {
    pub has_hydrated: bool,
    pub token: Option<&'a str>,
}

/// Resolves any route against both session snapshots; unguarded routes always render.
#[must_use]
pub fn resolve(route: Route, admin: GuardInput<'_>, portal: GuardInput<'_>) -> GuardDecision {
    match route.guard_variant() {
        Some(GuardVariant::Admin) => evaluate(GuardVariant::Admin, admin.has_hydrated, admin.token),
        Some(GuardVariant::Portal) => {
            evaluate(GuardVariant::Portal, portal.has_hydrated, portal.token)
        },
        None => GuardDecision::Render,
    }
}

/// Application routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Route {
    #[default]
    AdminLogin,
    Dashboard,
    Organizations,
    Users,
    Nas,
    RadiusProfiles,
    Packages,
    Vouchers,
    IpBindings,
    Advertisements,
    LogArchives,
    Settings,
    PortalLogin,
    ExternalLogin,
    PortalDashboard,
    NotFound,
}

impl Route {
    #[must_use]
    pub fn from_path(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or(path);
        let path = if path.len() > 1 { path.trim_end_matches('/') } else { path };
        match path {
            "/" | "/login" => Self::AdminLogin,
            "/dashboard" => Self::Dashboard,
            "/organizations" => Self::Organizations,
            "/users" => Self::Users,
            "/nas" => Self::Nas,
            "/profiles" => Self::RadiusProfiles,
            "/packages" => Self::Packages,
            "/vouchers" => Self::Vouchers,
            "/ip-bindings" => Self::IpBindings,
            "/ads" => Self::Advertisements,
            "/logs" => Self::LogArchives,
            "/settings" => Self::Settings,
            "/portal/login" => Self::PortalLogin,
            "/external/login" => Self::ExternalLogin,
            "/portal" | "/portal/dashboard" => Self::PortalDashboard,
            _ => Self::NotFound,
        }
    }

    #[must_use]
    pub const fn to_path(&self) -> &'static str {
        match *self {
            Self::AdminLogin => "/login",
            Self::Dashboard => "/dashboard",
            Self::Organizations => "/organizations",
            Self::Users => "/users",
            Self::Nas => "/nas",
            Self::RadiusProfiles => "/profiles",
            Self::Packages => "/packages",
            Self::Vouchers => "/vouchers",
            Self::IpBindings => "/ip-bindings",
            Self::Advertisements => "/ads",
            Self::LogArchives => "/logs",
            Self::Settings => "/settings",
            Self::PortalLogin => "/portal/login",
            Self::ExternalLogin => "/external/login",
            Self::PortalDashboard => "/portal/dashboard",
            Self::NotFound => "/404",
        }
    }

    /// Session this route is gated on, if any.
    #[must_use]
    pub const fn guard_variant(&self) -> Option<GuardVariant> {
        match *self {
            Self::AdminLogin | Self::PortalLogin | Self::ExternalLogin | Self::NotFound => None,
            Self::PortalDashboard => Some(GuardVariant::Portal),
            _ => Some(GuardVariant::Admin),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suspends_until_hydrated() {
        assert_eq!(evaluate(GuardVariant::Admin, false, None), GuardDecision::Suspend);
        assert_eq!(evaluate(GuardVariant::Admin, false, Some("tok")), GuardDecision::Suspend);
    }

    #[test]
    fn test_redirects_when_hydrated_without_token() {
        assert_eq!(
            evaluate(GuardVariant::Admin, true, None),
            GuardDecision::Redirect { to: Route::AdminLogin, replace: true }
        );
        assert_eq!(
            evaluate(GuardVariant::Portal, true, Some("")),
            GuardDecision::Redirect { to: Route::PortalLogin, replace: true }
        );
    }

    #[test]
    fn test_renders_with_token() {
        assert_eq!(evaluate(GuardVariant::Portal, true, Some("tok")), GuardDecision::Render);
    }

    #[test]
    fn test_resolve_uses_matching_store() {
        let admin = GuardInput { has_hydrated: true, token: Some("admin-token") };
        let portal = GuardInput { has_hydrated: true, token: None };
        assert_eq!(resolve(Route::Vouchers, admin, portal), GuardDecision::Render);
        assert_eq!(
            resolve(Route::PortalDashboard, admin, portal),
            GuardDecision::Redirect { to: Route::PortalLogin, replace: true }
        );
        assert_eq!(resolve(Route::PortalLogin, admin, portal), GuardDecision::Render);
    }

    #[test]
    fn test_path_round_trip() {
        assert_eq!(Route::from_path("/nas/"), Route::Nas);
        assert_eq!(Route::from_path("/users?page=2"), Route::Users);
        assert_eq!(Route::from_path("/"), Route::AdminLogin);
        assert_eq!(Route::from_path("/nope"), Route::NotFound);
        assert_eq!(Route::from_path(Route::Settings.to_path()), Route::Settings);
    }
}
