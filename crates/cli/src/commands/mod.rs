pub(crate) mod browse;
pub(crate) mod records;
pub(crate) mod session;

use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::{Result, bail};
use chrono::NaiveDate;
use clap::Args;
use radmin_client::{ApiClient, ClientError, Navigator, RecordingNavigator, Sessions};
use radmin_core::guard::{self, GuardInput};
use radmin_core::{ClientConfig, Filters, GuardDecision, Route, SessionState, SortOrder};
use radmin_storage::{AdminStore, KeyValueStore, PortalStore, StorageBackend};
use serde::Serialize;

/// Everything one invocation needs: config, both stores and the shared admin client.
pub(crate) struct App {
    pub config: ClientConfig,
    pub sessions: Sessions,
    pub navigator: Arc<RecordingNavigator>,
    pub client: ApiClient,
}

impl App {
    pub(crate) fn open() -> Result<Self> {
        let config = ClientConfig::from_env();
        tracing::debug!(api_url = %config.api_url, state_dir = %config.state_dir.display(), "loaded config");

        let backend: Arc<dyn KeyValueStore> = Arc::new(StorageBackend::file(&config.state_dir));
        let sessions = Sessions {
            admin: Arc::new(AdminStore::open_admin(Arc::clone(&backend))),
            portal: Arc::new(PortalStore::open_portal(backend)),
        };
        let navigator = Arc::new(RecordingNavigator::new());
        let nav: Arc<dyn Navigator> = Arc::clone(&navigator) as Arc<dyn Navigator>;
        let client = ApiClient::admin(&config, sessions.clone(), nav)?;
        Ok(Self { config, sessions, navigator, client })
    }

    pub(crate) fn portal_client(&self) -> Result<ApiClient> {
        Ok(ApiClient::portal(&self.config, Arc::clone(&self.sessions.portal))?)
    }

    pub(crate) fn decide(&self, route: Route) -> GuardDecision {
        let admin = self.sessions.admin.snapshot();
        let portal = self.sessions.portal.snapshot();
        guard::resolve(
            route,
            GuardInput { has_hydrated: admin.has_hydrated, token: admin.state.token() },
            GuardInput { has_hydrated: portal.has_hydrated, token: portal.state.token() },
        )
    }

    /// Refuses to continue unless `route` would render for the stored sessions.
    pub(crate) fn guard(&self, route: Route) -> Result<()> {
        match self.decide(route) {
            GuardDecision::Render => Ok(()),
            GuardDecision::Redirect { to, .. } => {
                let login = if to == Route::PortalLogin { "radmin portal-login" } else { "radmin login" };
                bail!("not signed in: {route} redirects to {to}; run `{login}` first")
            },
            GuardDecision::Suspend => bail!("session store not loaded yet"),
        }
    }

    /// Converts a client result, explaining a forced logout.
    pub(crate) fn check<T>(&self, result: Result<T, ClientError>) -> Result<T> {
        match result {
            Ok(value) => Ok(value),
            Err(ClientError::SessionExpired) => {
                let to = self.navigator.last().unwrap_or_else(|| Route::AdminLogin.to_path().to_owned());
                bail!("session expired and was cleared; sign in again at {to}")
            },
            Err(ClientError::HttpStatus { code, message, .. }) => bail!("{code}: {message}"),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug, Args)]
pub(crate) struct PageArgs {
    #[arg(long, default_value_t = 1)]
    pub page: u32,
    /// Defaults to RADMIN_PAGE_SIZE
    #[arg(long)]
    pub page_size: Option<u32>,
    #[arg(short, long)]
    pub search: Option<String>,
}

#[derive(Debug, Default, Args)]
pub(crate) struct FilterArgs {
    /// Organization id
    #[arg(long)]
    pub org: Option<String>,
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long = "type")]
    pub kind: Option<String>,
    /// Start date (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<NaiveDate>,
    /// End date (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<NaiveDate>,
    #[arg(long)]
    pub sort_by: Option<String>,
    #[arg(long, default_value = "asc")]
    pub sort_order: SortOrder,
    /// Additional KEY=VALUE filter, repeatable
    #[arg(short = 'f', long = "filter", value_name = "KEY=VALUE")]
    pub extra: Vec<String>,
}

impl FilterArgs {
    pub(crate) fn to_filters(&self) -> Result<Filters> {
        let mut filters = Filters::new().date_range(self.from, self.to);
        if let Some(org) = &self.org {
            filters = filters.organization_id(org);
        }
        if let Some(status) = &self.status {
            filters = filters.status(status);
        }
        if let Some(kind) = &self.kind {
            filters = filters.kind(kind);
        }
        if let Some(key) = &self.sort_by {
            filters = filters.sort(key, self.sort_order);
        }
        for assignment in &self.extra {
            let (key, value) = Filters::parse_assignment(assignment)?;
            filters.set(key, value);
        }
        Ok(filters)
    }
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn parse_json(input: &str, what: &str) -> Result<serde_json::Value> {
    let value: serde_json::Value = serde_json::from_str(input)
        .map_err(|e| anyhow::anyhow!("{what} is not valid JSON: {e}"))?;
    if !value.is_object() {
        bail!("{what} must be a JSON object");
    }
    Ok(value)
}

/// Uses the flag when given, otherwise reads one line from stdin.
pub(crate) fn read_password(flag: Option<String>) -> Result<String> {
    if let Some(password) = flag {
        return Ok(password);
    }
    eprint!("password: ");
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_owned();
    if password.is_empty() {
        bail!("empty password");
    }
    Ok(password)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_args_build_canonical_filters() {
        let args = FilterArgs {
            org: Some("3".to_owned()),
            kind: Some("hotspot".to_owned()),
            from: NaiveDate::from_ymd_opt(2024, 1, 31),
            sort_by: Some("createdAt".to_owned()),
            sort_order: SortOrder::Desc,
            extra: vec!["nasId=9".to_owned(), "status=".to_owned()],
            ..FilterArgs::default()
        };
        let filters = args.to_filters().unwrap();
        assert_eq!(filters.get("organizationId"), Some("3"));
        assert_eq!(filters.get("type"), Some("hotspot"));
        assert_eq!(filters.get("startDate"), Some("2024-01-31"));
        assert_eq!(filters.get("endDate"), None);
        assert_eq!(filters.get("sortOrder"), Some("desc"));
        assert_eq!(filters.get("nasId"), Some("9"));
        assert_eq!(filters.get("status"), None);
    }

    #[test]
    fn test_parse_json_requires_object() {
        assert!(parse_json("{\"name\": \"lobby\"}", "record").is_ok());
        assert!(parse_json("[1]", "record").is_err());
        assert!(parse_json("{", "record").is_err());
    }
}
