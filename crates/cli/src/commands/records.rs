use anyhow::Result;
use radmin_core::{ListQuery, OperatingMode, Resource};

use crate::commands::{App, FilterArgs, PageArgs, parse_json, print_json};

/// Guards the resource page and warns about MikroTik-only resources in AAA mode.
fn open_resource(app: &App, resource: Resource) -> Result<()> {
    app.guard(resource.route())?;
    if resource.requires_mikrotik() && app.sessions.admin.operating_mode() == Some(OperatingMode::Aaa) {
        tracing::warn!(%resource, "backend is in AAA mode; this resource is only used in Mikrotik mode");
    }
    Ok(())
}

pub(crate) async fn run_list(
    app: &App,
    resource: Resource,
    page: &PageArgs,
    filters: &FilterArgs,
) -> Result<()> {
    open_resource(app, resource)?;
    let query = ListQuery {
        page: page.page.max(1),
        page_size: page.page_size.unwrap_or(app.config.page_size),
        search: None,
        filters: filters.to_filters()?,
    }
    .with_search(page.search.as_deref().unwrap_or_default());
    let page = app.check(app.client.list(resource.endpoint(), &query).await)?;
    print_json(&page)
}

pub(crate) async fn run_get(app: &App, resource: Resource, id: &str) -> Result<()> {
    open_resource(app, resource)?;
    let record = app.check(app.client.get_record(resource, id).await)?;
    print_json(&record)
}

pub(crate) async fn run_create(app: &App, resource: Resource, record: &str) -> Result<()> {
    open_resource(app, resource)?;
    let record = parse_json(record, "record")?;
    let created = app.check(app.client.create(resource, &record).await)?;
    print_json(&created)
}

pub(crate) async fn run_update(app: &App, resource: Resource, id: &str, changes: &str) -> Result<()> {
    open_resource(app, resource)?;
    let changes = parse_json(changes, "changes")?;
    let updated = app.check(app.client.update(resource, id, &changes).await)?;
    print_json(&updated)
}

pub(crate) async fn run_delete(app: &App, resource: Resource, id: &str) -> Result<()> {
    open_resource(app, resource)?;
    app.check(app.client.delete(resource, id).await)?;
    println!("deleted {resource} {id}");
    Ok(())
}
