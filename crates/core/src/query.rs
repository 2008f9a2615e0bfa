use crate::constants::{DEFAULT_PAGE_SIZE, PAGE_PARAM, PAGE_SIZE_PARAM, SEARCH_PARAM};
use crate::filters::Filters;

/// Fully resolved request for one page of a list endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// 1-indexed.
    pub page: u32,
    pub page_size: u32,
    pub search: Option<String>,
    pub filters: Filters,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self { page: 1, page_size: DEFAULT_PAGE_SIZE, search: None, filters: Filters::new() }
    }
}

impl ListQuery {
    /// Sets the search term; blank input clears it.
    #[must_use]
    pub fn with_search(mut self, term: &str) -> Self {
        let term = term.trim();
        self.search = (!term.is_empty()).then(|| term.to_owned());
        self
    }

    /// Query-string pairs in a stable order.
    ///
    /// An empty search term is never sent, so an unsearched list and a list with a cleared
    /// search produce identical requests.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            (PAGE_PARAM.to_owned(), self.page.max(1).to_string()),
            (PAGE_SIZE_PARAM.to_owned(), self.page_size.to_string()),
        ];
        if let Some(term) = self.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            pairs.push((SEARCH_PARAM.to_owned(), term.to_owned()));
        }
        pairs.extend(self.filters.iter().map(|(k, v)| (k.to_owned(), v.to_owned())));
        pairs
    }
}
