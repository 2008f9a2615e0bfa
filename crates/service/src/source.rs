//! Where list pages come from.

use async_trait::async_trait;
use radmin_client::{ApiClient, ClientError};
use radmin_core::{ListQuery, Page};

/// One request for one page of a list endpoint.
///
/// [`ApiClient`] is the production implementation; tests script their own so responses can be
/// delayed and reordered.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, endpoint: &str, query: &ListQuery) -> Result<Page, ClientError>;
}

#[async_trait]
impl PageSource for ApiClient {
    async fn fetch_page(&self, endpoint: &str, query: &ListQuery) -> Result<Page, ClientError> {
        self.list(endpoint, query).await
    }
}
