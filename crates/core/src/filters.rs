//! Endpoint-specific list filters with structural equality.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match *self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Asc),
            "desc" | "descending" => Ok(Self::Desc),
            _ => Err(CoreError::InvalidInput(format!("unknown sort order: {s}"))),
        }
    }
}

/// Named filter parameters for one list endpoint.
///
/// Backed by a sorted map, so two filter sets built in different orders compare equal and
/// produce the same [`Filters::canonical_key`]. Blank values are never stored: clearing a
/// filter and never setting it are the same state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filters(BTreeMap<String, String>);

impl Filters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`, or removes it when the value renders blank.
    pub fn set(&mut self, key: impl Into<String>, value: impl fmt::Display) {
        let key = key.into();
        let value = value.to_string();
        if value.trim().is_empty() {
            self.0.remove(&key);
        } else {
            self.0.insert(key, value.trim().to_owned());
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.set(key, value);
        self
    }

    #[must_use]
    pub fn organization_id(self, id: impl fmt::Display) -> Self {
        self.with("organizationId", id)
    }

    #[must_use]
    pub fn status(self, status: impl fmt::Display) -> Self {
        self.with("status", status)
    }

    #[must_use]
    pub fn kind(self, kind: impl fmt::Display) -> Self {
        self.with("type", kind)
    }

    /// Inclusive date range; either bound may be open.
    #[must_use]
    pub fn date_range(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        match start {
            Some(d) => self.set("startDate", d.format("%Y-%m-%d")),
            None => {
                self.remove("startDate");
            },
        }
        match end {
            Some(d) => self.set("endDate", d.format("%Y-%m-%d")),
            None => {
                self.remove("endDate");
            },
        }
        self
    }

    #[must_use]
    pub fn sort(self, key: impl fmt::Display, order: SortOrder) -> Self {
        self.with("sortBy", key).with("sortOrder", order)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Sorted `k=v&k=v` form used to detect changes by value.
    #[must_use]
    pub fn canonical_key(&self) -> String {
        self.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("&")
    }

    /// Parses a `key=value` pair as typed on a command line.
    pub fn parse_assignment(input: &str) -> Result<(String, String), CoreError> {
        let (key, value) = input
            .split_once('=')
            .ok_or_else(|| CoreError::InvalidInput(format!("expected key=value, got {input}")))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(CoreError::InvalidInput(format!("empty filter key in {input}")));
        }
        Ok((key.to_owned(), value.trim().to_owned()))
    }
}

impl<K: Into<String>, V: fmt::Display> FromIterator<(K, V)> for Filters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut filters = Self::new();
        for (k, v) in iter {
            filters.set(k, v);
        }
        filters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_does_not_matter() {
        let a = Filters::new().status("active").organization_id(3);
        let b = Filters::new().organization_id(3).status("active");
        assert_eq!(a, b);
        assert_eq!(a.canonical_key(), "organizationId=3&status=active");
    }

    #[test]
    fn test_blank_value_removes_key() {
        let filters = Filters::new().status("active").status("  ");
        assert!(filters.is_empty());
        assert_eq!(filters, Filters::new());
    }

    #[test]
    fn test_date_range_and_sort() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 5);
        let filters = Filters::new().date_range(start, None).sort("createdAt", SortOrder::Desc);
        assert_eq!(filters.get("startDate"), Some("2024-01-05"));
        assert_eq!(filters.get("endDate"), None);
        assert_eq!(filters.get("sortOrder"), Some("desc"));
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            Filters::parse_assignment("status = blocked").unwrap(),
            ("status".to_owned(), "blocked".to_owned())
        );
        assert!(Filters::parse_assignment("status").is_err());
        assert!(Filters::parse_assignment("=x").is_err());
    }
}
