//! Pagination metadata and tolerant parsing of list-endpoint envelopes.
//!
//! Endpoints disagree on naming: some return `{data, pagination: {currentPage, ...}}`, others
//! `{items, meta: {page, total, ...}}` or keep the counters at the top level. Parsing accepts
//! all of these and derives whatever the backend left out from the request that was sent.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{CoreError, Result};
use crate::query::ListQuery;

const RECORD_KEYS: &[&str] = &["data", "items", "records", "rows", "results"];
const META_KEYS: &[&str] = &["pagination", "meta"];
const CURRENT_PAGE_KEYS: &[&str] = &["currentPage", "page", "current_page"];
const TOTAL_PAGES_KEYS: &[&str] = &["totalPages", "pages", "lastPage", "total_pages"];
const TOTAL_ITEMS_KEYS: &[&str] = &["totalItems", "total", "totalCount", "count", "total_items"];
const PER_PAGE_KEYS: &[&str] = &["itemsPerPage", "pageSize", "limit", "perPage", "per_page"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub items_per_page: u32,
}

impl Pagination {
    /// Builds metadata from a total count, deriving `total_pages = ceil(total / per_page)`.
    #[must_use]
    pub fn from_totals(current_page: u32, total_items: u64, items_per_page: u32) -> Self {
        let per_page = u64::from(items_per_page.max(1));
        let pages = total_items.div_ceil(per_page);
        Self {
            current_page,
            total_pages: u32::try_from(pages).unwrap_or(u32::MAX),
            total_items,
            items_per_page,
        }
    }

    /// Whether `page` can be navigated to.
    #[must_use]
    pub const fn contains(&self, page: u32) -> bool {
        page >= 1 && page <= self.total_pages
    }
}

/// `min(page, max(1, total_pages))`, never below 1.
#[must_use]
pub fn clamp_page(page: u32, total_pages: u32) -> u32 {
    page.min(total_pages.max(1)).max(1)
}

/// One page of records plus its metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T = Value> {
    pub records: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self { records: Vec::new(), pagination: Pagination::default() }
    }
}

impl Page<Value> {
    /// Interprets a list response body produced for `requested`.
    pub fn from_envelope(body: Value, requested: &ListQuery) -> Result<Self> {
        match body {
            Value::Array(records) => {
                let total = records.len() as u64;
                let pagination = Pagination {
                    current_page: 1,
                    total_pages: u32::from(total > 0),
                    total_items: total,
                    items_per_page: requested.page_size,
                };
                Ok(Self { records, pagination })
            },
            Value::Object(outer) => {
                if let Some(Value::Object(inner)) = outer.get("data") {
                    if find_records(inner).is_some() {
                        return parse_object(inner, Some(&outer), requested);
                    }
                }
                parse_object(&outer, None, requested)
            },
            other => Err(CoreError::MalformedEnvelope(format!(
                "expected object or array, got {}",
                kind_of(&other)
            ))),
        }
    }
}

fn parse_object(
    obj: &Map<String, Value>,
    parent: Option<&Map<String, Value>>,
    requested: &ListQuery,
) -> Result<Page> {
    let records = find_records(obj)
        .ok_or_else(|| CoreError::MalformedEnvelope("no record array in response".to_owned()))?
        .clone();

    let mut sources: Vec<&Map<String, Value>> = Vec::new();
    for scope in std::iter::once(obj).chain(parent) {
        for key in META_KEYS {
            if let Some(Value::Object(meta)) = scope.get(*key) {
                sources.push(meta);
            }
        }
        sources.push(scope);
    }

    let current_page =
        lookup(&sources, CURRENT_PAGE_KEYS).map_or(requested.page, |n| saturate(n).max(1));
    let items_per_page =
        lookup(&sources, PER_PAGE_KEYS).map_or(requested.page_size, saturate).max(1);
    let total_items = lookup(&sources, TOTAL_ITEMS_KEYS).unwrap_or(records.len() as u64);

    let mut pagination = Pagination::from_totals(current_page, total_items, items_per_page);
    if let Some(pages) = lookup(&sources, TOTAL_PAGES_KEYS) {
        pagination.total_pages = saturate(pages);
    }
    Ok(Page { records, pagination })
}

fn find_records(obj: &Map<String, Value>) -> Option<&Vec<Value>> {
    RECORD_KEYS.iter().find_map(|key| obj.get(*key).and_then(Value::as_array))
}

fn lookup(sources: &[&Map<String, Value>], aliases: &[&str]) -> Option<u64> {
    sources.iter().find_map(|source| aliases.iter().find_map(|alias| as_count(source.get(*alias)?)))
}

fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn saturate(n: u64) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

const fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
