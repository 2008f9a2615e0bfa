use anyhow::Result;
use radmin_core::{GuardDecision, OperatingMode, Route};
use serde_json::json;

use crate::commands::{App, parse_json, print_json, read_password};

pub(crate) async fn run_login(app: &App, username: &str, password: Option<String>) -> Result<()> {
    let password = read_password(password)?;
    let login = app.check(app.client.admin_login(&app.sessions.admin, username, &password).await)?;
    print_json(&json!({
        "signedIn": login.user.display_name(),
        "operatingMode": login.operating_mode,
    }))
}

pub(crate) async fn run_portal_login(
    app: &App,
    username: &str,
    password: Option<String>,
) -> Result<()> {
    let password = read_password(password)?;
    let client = app.portal_client()?;
    let login = app.check(client.portal_login(&app.sessions.portal, username, &password).await)?;
    print_json(&json!({
        "signedIn": login.user.display_name(),
        "pendingAd": login.advertisement.is_some(),
    }))
}

pub(crate) async fn run_external_login(app: &App, payload: &str) -> Result<()> {
    let payload = parse_json(payload, "payload")?;
    let client = app.portal_client()?;
    let login = app.check(client.external_login(&app.sessions.portal, &payload).await)?;
    print_json(&json!({ "signedIn": login.user.display_name() }))
}

pub(crate) fn run_logout(app: &App, portal: bool) -> Result<()> {
    let cleared =
        if portal { app.sessions.portal.logout() } else { app.sessions.admin.logout() };
    if cleared {
        println!("signed out");
    } else {
        println!("not signed in");
    }
    Ok(())
}

pub(crate) fn run_whoami(app: &App) -> Result<()> {
    let admin = &app.sessions.admin;
    let portal = &app.sessions.portal;
    print_json(&json!({
        "admin": {
            "authenticated": admin.is_authenticated(),
            "user": admin.user(),
            "operatingMode": admin.operating_mode(),
        },
        "portal": {
            "authenticated": portal.is_authenticated(),
            "user": portal.user(),
        },
        "apiUrl": app.config.api_url,
        "stateDir": app.config.state_dir,
    }))
}

pub(crate) fn run_portal_ad(app: &App) -> Result<()> {
    app.guard(Route::PortalDashboard)?;
    match app.sessions.portal.take_pending_ad() {
        Some(ad) => print_json(&ad),
        None => {
            println!("no pending advertisement");
            Ok(())
        },
    }
}

pub(crate) async fn run_mode(app: &App, mode: Option<OperatingMode>) -> Result<()> {
    app.guard(Route::Settings)?;
    let Some(mode) = mode else {
        let settings = app.check(app.client.settings().await)?;
        return print_json(&settings);
    };
    let saved = app.check(app.client.save_operating_mode(&app.sessions.admin, mode).await)?;
    tracing::info!(%mode, "operating mode saved");
    print_json(&saved)
}

pub(crate) async fn run_profile(app: &App, changes: &str) -> Result<()> {
    app.guard(Route::Settings)?;
    let changes = parse_json(changes, "profile changes")?;
    let user = app.check(app.client.update_profile(&app.sessions.admin, &changes).await)?;
    print_json(&user)
}

pub(crate) fn run_route(app: &App, path: &str) -> Result<()> {
    let route = Route::from_path(path);
    let decision = match app.decide(route) {
        GuardDecision::Suspend => json!({ "route": route.to_path(), "decision": "suspend" }),
        GuardDecision::Render => json!({ "route": route.to_path(), "decision": "render" }),
        GuardDecision::Redirect { to, replace } => json!({
            "route": route.to_path(),
            "decision": "redirect",
            "to": to.to_path(),
            "replace": replace,
        }),
    };
    print_json(&decision)
}
