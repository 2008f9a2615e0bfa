//! Interactive list view driven by line commands on stdin.

use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use radmin_core::{Filters, Resource};
use radmin_service::{
    ActivitySignal, FetchOptions, IdleMonitor, PageSource, PageView, PaginatedFetch, logout_on_idle,
};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::commands::{App, FilterArgs, print_json};

const HELP: &str = "commands: next | prev | page N | size N | search TEXT | filter KEY=VALUE | \
                    unfilter KEY | clear | refresh | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
enum BrowseCommand {
    Next,
    Prev,
    Page(u32),
    Size(u32),
    Search(String),
    Filter(String, String),
    Unfilter(String),
    Clear,
    Refresh,
    Help,
    Quit,
}

impl BrowseCommand {
    /// `Ok(None)` for a blank line.
    fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let number = |what: &str| -> Result<u32> {
            rest.parse().map_err(|_| anyhow!("{what} expects a number, got {rest:?}"))
        };
        let command = match word.to_ascii_lowercase().as_str() {
            "next" | "n" => Self::Next,
            "prev" | "p" => Self::Prev,
            "page" => Self::Page(number("page")?),
            "size" => Self::Size(number("size")?),
            // A bare `search` clears the term.
            "search" | "s" => Self::Search(rest.to_owned()),
            "filter" | "f" => {
                let (key, value) = Filters::parse_assignment(rest)?;
                Self::Filter(key, value)
            },
            "unfilter" => Self::Unfilter(rest.to_owned()),
            "clear" => Self::Clear,
            "refresh" | "r" => Self::Refresh,
            "help" | "?" => Self::Help,
            "quit" | "q" | "exit" => Self::Quit,
            other => bail!("unknown command {other:?}; {HELP}"),
        };
        Ok(Some(command))
    }

    /// Applies the command; `false` when it changed nothing.
    fn apply<S: PageSource + ?Sized + 'static>(&self, fetch: &PaginatedFetch<S>) -> bool {
        match self {
            Self::Next => fetch.handle_page_change(fetch.query().page.saturating_add(1)),
            Self::Prev => fetch.handle_page_change(fetch.query().page.saturating_sub(1)),
            Self::Page(page) => fetch.handle_page_change(*page),
            Self::Size(size) => fetch.handle_items_per_page_change(*size),
            Self::Search(term) => {
                fetch.handle_search_change(term.as_str());
                true
            },
            Self::Filter(key, value) => {
                let mut filters = fetch.query().filters;
                filters.set(key.as_str(), value);
                fetch.set_filters(filters)
            },
            Self::Unfilter(key) => {
                let mut filters = fetch.query().filters;
                filters.remove(key);
                fetch.set_filters(filters)
            },
            Self::Clear => fetch.clear_all(),
            Self::Refresh => {
                fetch.refresh_data();
                true
            },
            Self::Help | Self::Quit => false,
        }
    }
}

fn render(view: &PageView) -> Result<()> {
    print_json(view)?;
    if let Some(failure) = &view.last_error {
        eprintln!("request failed: {}", failure.message);
    }
    let p = &view.pagination;
    eprintln!("page {}/{} ({} items)", p.current_page, p.total_pages, p.total_items);
    Ok(())
}

pub(crate) async fn run_browse(app: &App, resource: Resource, filters: &FilterArgs) -> Result<()> {
    app.guard(resource.route())?;
    let interceptor =
        app.client.interceptor().cloned().context("admin client has no 401 interceptor")?;
    let idle = IdleMonitor::from_config(&app.config, logout_on_idle(interceptor));

    let source: Arc<dyn PageSource> = Arc::new(app.client.clone());
    let options = FetchOptions::from_config(&app.config).with_filters(filters.to_filters()?);
    let fetch = PaginatedFetch::new(source, resource.endpoint(), options);
    let mut session = app.sessions.admin.subscribe();

    fetch.settled().await;
    render(&fetch.view())?;
    eprintln!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                idle.record_activity(ActivitySignal::KeyPress);
                let command = match BrowseCommand::parse(&line) {
                    Ok(Some(command)) => command,
                    Ok(None) => continue,
                    Err(e) => {
                        eprintln!("{e}");
                        continue;
                    },
                };
                match command {
                    BrowseCommand::Quit => break,
                    BrowseCommand::Help => eprintln!("{HELP}"),
                    command => {
                        if command.apply(&fetch) {
                            fetch.settled().await;
                            render(&fetch.view())?;
                        } else {
                            eprintln!("nothing changed");
                        }
                    },
                }
            },
            changed = session.changed() => {
                if changed.is_err() || !app.sessions.admin.is_authenticated() {
                    let to = app.navigator.last().unwrap_or_default();
                    bail!("admin session ended; sign in again at {to}");
                }
            },
        }
    }
    Ok(())
}
