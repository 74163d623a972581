//! `reqwest` adapter for the upstream collection API.
//! 上游集合 API 的 HTTP 适配器。

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, ACCEPT, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use tracing::{debug, error, warn};
use tv_core::ports::{CollectionProviderPort, IndexingStatusPort};
use tv_core::settings::ProviderSettings;
use tv_core::{
    CollectionId, FetchError, IndexingStatus, PagePosition, PageRequest, PagingStyle, RawPage,
};

use super::dto::{IndexingDto, TokensResponseDto};

const API_KEY_HEADER: &str = "x-api-key";

/// Collection provider speaking the JSON collection API:
///
/// - `GET {base}/collections/{chain}/{contract}/tokens`
/// - `GET {base}/collections/{chain}/{contract}/indexing`
///
/// The adapter only classifies failures. Retrying, timeouts and caching
/// belong to the application layer.
pub struct HttpCollectionProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    paging: PagingStyle,
    timeout: Option<Duration>,
}

impl HttpCollectionProvider {
    pub fn new(settings: &ProviderSettings) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("tokenview/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self::with_client(client, settings))
    }

    pub fn with_client(client: Client, settings: &ProviderSettings) -> Self {
        Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone().filter(|k| !k.is_empty()),
            paging: settings.paging,
            timeout: settings.request_timeout(),
        }
    }

    fn collection_url(&self, collection: &CollectionId, leaf: &str) -> String {
        format!(
            "{}/collections/{}/{}/{}",
            self.base_url,
            collection.chain_id(),
            collection.contract_address(),
            leaf
        )
    }

    async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Vec<u8>, FetchError> {
        let mut builder = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .query(query);
        if let Some(key) = &self.api_key {
            builder = builder.header(API_KEY_HEADER, key);
        }

        let response = builder.send().await.map_err(map_transport_error)?;
        let status = response.status();
        if let Some(err) = classify_status(status, response.headers()) {
            if matches!(err, FetchError::Rejected(_)) {
                error!(%status, url, "upstream refused the request; check the API key and collection");
            } else {
                warn!(%status, url, "upstream request failed");
            }
            return Err(err);
        }

        let body = response.bytes().await.map_err(map_transport_error)?;
        debug!(%status, url, bytes = body.len(), "upstream response received");
        Ok(body.to_vec())
    }
}

/// Query string for one tokens request. Empty sort, search and filter
/// values are omitted rather than sent blank.
pub(crate) fn page_query(request: &PageRequest) -> Vec<(&'static str, String)> {
    let mut query = Vec::with_capacity(7);
    match &request.position {
        PagePosition::Page(page) => query.push(("page", page.to_string())),
        PagePosition::Offset(offset) => query.push(("offset", offset.to_string())),
        PagePosition::Cursor(Some(cursor)) => query.push(("cursor", cursor.clone())),
        PagePosition::Cursor(None) => {}
    }
    query.push(("limit", request.page_size.to_string()));

    let view = &request.view;
    if !view.sort_field().is_empty() {
        query.push(("sort_by", view.sort_field().to_string()));
        query.push(("sort_direction", view.sort_direction().as_str().to_string()));
    }
    if !view.search_query().is_empty() {
        query.push(("search", view.search_query().to_string()));
    }
    if view.has_filters() {
        // BTreeMap/BTreeSet serialize deterministically.
        if let Ok(filters) = serde_json::to_string(view.attribute_filters()) {
            query.push(("filters", filters));
        }
    }
    query
}

fn map_transport_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Network(format!("request timed out: {err}"))
    } else if err.is_decode() {
        FetchError::Malformed(err.to_string())
    } else {
        FetchError::Network(err.to_string())
    }
}

fn classify_status(status: StatusCode, headers: &HeaderMap) -> Option<FetchError> {
    if status.is_success() {
        return None;
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Some(FetchError::RateLimited {
            retry_after: parse_retry_after(headers, Utc::now()),
        });
    }
    if status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT {
        return Some(FetchError::Network(format!("upstream returned {status}")));
    }
    if matches!(
        status,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND | StatusCode::GONE
    ) {
        return Some(FetchError::Rejected(format!("upstream returned {status}")));
    }
    Some(FetchError::Malformed(format!("unexpected status {status}")))
}

/// `Retry-After` as delta-seconds or an HTTP date.
fn parse_retry_after(headers: &HeaderMap, now: DateTime<Utc>) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    let at = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
    (at - now).to_std().ok()
}

#[async_trait]
impl CollectionProviderPort for HttpCollectionProvider {
    fn paging_style(&self) -> PagingStyle {
        self.paging
    }

    fn request_timeout(&self) -> Option<Duration> {
        self.timeout
    }

    async fn fetch_page(&self, request: &PageRequest) -> Result<RawPage, FetchError> {
        let collection = request.view.collection();
        let url = self.collection_url(collection, "tokens");
        let body = self.get_json(&url, &page_query(request)).await?;
        let dto: TokensResponseDto = serde_json::from_slice(&body)
            .map_err(|e| FetchError::Malformed(format!("tokens response: {e}")))?;
        Ok(dto.into_raw_page(collection.contract_address(), collection.chain_id()))
    }
}

#[async_trait]
impl IndexingStatusPort for HttpCollectionProvider {
    async fn fetch_indexing_status(
        &self,
        collection: &CollectionId,
    ) -> Result<IndexingStatus, FetchError> {
        let url = self.collection_url(collection, "indexing");
        let body = self.get_json(&url, &[]).await?;
        let dto: IndexingDto = serde_json::from_slice(&body)
            .map_err(|e| FetchError::Malformed(format!("indexing response: {e}")))?;
        Ok(dto.into())
    }
}
