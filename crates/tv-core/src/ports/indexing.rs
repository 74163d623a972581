use async_trait::async_trait;

use crate::errors::FetchError;
use crate::indexing::IndexingStatus;
use crate::view::CollectionId;

/// Upstream indexing progress endpoint.
#[async_trait]
pub trait IndexingStatusPort: Send + Sync {
    async fn fetch_indexing_status(
        &self,
        collection: &CollectionId,
    ) -> Result<IndexingStatus, FetchError>;
}
