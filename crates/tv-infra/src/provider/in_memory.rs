//! Deterministic provider over a fixed record list.
//! 基于固定记录列表的确定性数据提供者。
//!
//! Backs the demo binary and the loader tests. It honors the same paging,
//! sort, search and filter parameters the HTTP API does, and can be scripted
//! to fail, to answer slowly, or to under-report its total the way an upstream
//! that is still indexing does.

use std::cmp::Ordering;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use tv_core::ports::{CollectionProviderPort, IndexingStatusPort};
use tv_core::{
    Attribute, ChainId, CollectionId, FetchError, IndexingStatus, PagePosition, PageRequest,
    PagingStyle, RawPage, Record, SortDirection, ViewKey,
};

type LatencyFn = Arc<dyn Fn(&PageRequest) -> Duration + Send + Sync>;

/// Failure injected ahead of normal responses.
#[derive(Debug, Clone)]
pub struct ScriptedFailure {
    pub error: FetchError,
    pub times: usize,
}

pub struct InMemoryProvider {
    records: Mutex<Vec<Record>>,
    paging: PagingStyle,
    timeout: Option<Duration>,
    latency: Option<LatencyFn>,
    reported_total: Option<u64>,
    failures: Mutex<VecDeque<FetchError>>,
    targeted: Mutex<Vec<(PagePosition, FetchError)>>,
    indexing: Mutex<VecDeque<IndexingStatus>>,
    requests: Mutex<Vec<PageRequest>>,
    indexing_requests: Mutex<Vec<CollectionId>>,
    calls: AtomicUsize,
    indexing_calls: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl InMemoryProvider {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records: Mutex::new(records),
            paging: PagingStyle::PageNumber,
            timeout: None,
            latency: None,
            reported_total: None,
            failures: Mutex::new(VecDeque::new()),
            targeted: Mutex::new(Vec::new()),
            indexing: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            indexing_requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            indexing_calls: AtomicUsize::new(0),
        }
    }

    /// Synthetic collection of `count` tokens with a few rotating traits.
    pub fn sample(count: usize, chain: impl Into<ChainId>) -> Self {
        Self::new(sample_records(count, chain.into()))
    }

    pub fn with_paging(mut self, paging: PagingStyle) -> Self {
        self.paging = paging;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_latency(self, latency: Duration) -> Self {
        self.with_latency_fn(move |_| latency)
    }

    pub fn with_latency_fn<F>(mut self, latency: F) -> Self
    where
        F: Fn(&PageRequest) -> Duration + Send + Sync + 'static,
    {
        self.latency = Some(Arc::new(latency));
        self
    }

    /// Reports `total` regardless of how many records match.
    pub fn with_reported_total(mut self, total: u64) -> Self {
        self.reported_total = Some(total);
        self
    }

    /// Indexing statuses returned by successive polls; the last one repeats.
    pub fn with_indexing<I>(self, statuses: I) -> Self
    where
        I: IntoIterator<Item = IndexingStatus>,
    {
        *lock(&self.indexing) = statuses.into_iter().collect();
        self
    }

    /// Fails the next `times` page fetches with `error`.
    pub fn fail_next(&self, times: usize, error: FetchError) {
        self.script(ScriptedFailure { error, times });
    }

    /// Fails the next fetch of `position` once, whatever else is in flight.
    pub fn fail_at(&self, position: PagePosition, error: FetchError) {
        lock(&self.targeted).push((position, error));
    }

    pub fn script(&self, failure: ScriptedFailure) {
        let mut failures = lock(&self.failures);
        failures.extend(std::iter::repeat_n(failure.error, failure.times));
    }

    /// Replaces the backing records, e.g. to simulate a collection growing
    /// while it is indexed.
    pub fn set_records(&self, records: Vec<Record>) {
        *lock(&self.records) = records;
    }

    /// Page fetches received, including failed ones.
    pub fn calls(&self) -> usize {
        self.calls.load(AtomicOrdering::SeqCst)
    }

    pub fn indexing_calls(&self) -> usize {
        self.indexing_calls.load(AtomicOrdering::SeqCst)
    }

    pub fn requests(&self) -> Vec<PageRequest> {
        lock(&self.requests).clone()
    }

    /// Collections polled for indexing status, in call order.
    pub fn indexing_requests(&self) -> Vec<CollectionId> {
        lock(&self.indexing_requests).clone()
    }

    fn serve(&self, request: &PageRequest) -> Result<RawPage, FetchError> {
        let matched = matching(&lock(&self.records), &request.view);
        let size = request.page_size.max(1) as usize;
        let start = match &request.position {
            PagePosition::Page(page) => ((*page).max(1) - 1) as usize * size,
            PagePosition::Offset(offset) => usize::try_from(*offset).unwrap_or(usize::MAX),
            PagePosition::Cursor(None) => 0,
            PagePosition::Cursor(Some(token)) => parse_cursor(token)?,
        };

        let start = start.min(matched.len());
        let end = start.saturating_add(size).min(matched.len());
        let next_cursor = match self.paging {
            PagingStyle::Cursor if end < matched.len() => Some(format!("c{end}")),
            _ => None,
        };

        Ok(RawPage {
            total_count: self.reported_total.unwrap_or(matched.len() as u64),
            items: matched[start..end].to_vec(),
            next_cursor,
        })
    }
}

fn parse_cursor(token: &str) -> Result<usize, FetchError> {
    token
        .strip_prefix('c')
        .and_then(|n| n.parse().ok())
        .ok_or_else(|| FetchError::Malformed(format!("unknown cursor {token:?}")))
}

/// Records of `view` in the order the view asks for.
fn matching(records: &[Record], view: &ViewKey) -> Vec<Record> {
    let query = view.search_query().to_lowercase();
    let mut matched: Vec<Record> = records
        .iter()
        .filter(|r| {
            query.is_empty()
                || r.name.to_lowercase().contains(&query)
                || r.token_id.to_lowercase().contains(&query)
        })
        .filter(|r| {
            view.attribute_filters().iter().all(|(trait_type, accepted)| {
                r.attribute(trait_type)
                    .map(|v| accepted.contains(v))
                    .unwrap_or(false)
            })
        })
        .cloned()
        .collect();

    let compare: Option<fn(&Record, &Record) -> Ordering> = match view.sort_field() {
        "token_id" => Some(compare_token_ids),
        "name" => Some(|a, b| a.name.cmp(&b.name)),
        _ => None,
    };
    if let Some(compare) = compare {
        matched.sort_by(compare);
        if view.sort_direction() == SortDirection::Desc {
            matched.reverse();
        }
    }
    matched
}

fn compare_token_ids(a: &Record, b: &Record) -> Ordering {
    match (a.token_id.parse::<u64>(), b.token_id.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.token_id.cmp(&b.token_id),
    }
}

const BACKGROUNDS: [&str; 4] = ["Blue", "Red", "Green", "Gold"];
const EYES: [&str; 3] = ["Laser", "Sleepy", "Wide"];

/// `count` tokens numbered from 1; every fifth one is a dragon.
pub fn sample_records(count: usize, chain: ChainId) -> Vec<Record> {
    (1..=count)
        .map(|n| {
            let kind = if n % 5 == 0 { "Dragon" } else { "Token" };
            Record {
                id: format!("token-{n}"),
                token_id: n.to_string(),
                name: format!("{kind} #{n}"),
                description: None,
                image_url: Some(format!("https://img.example/{n}.png")),
                chain,
                attributes: vec![
                    Attribute::new("Background", BACKGROUNDS[n % BACKGROUNDS.len()]),
                    Attribute::new("Eyes", EYES[n % EYES.len()]),
                ],
                is_placeholder: false,
            }
        })
        .collect()
}

#[async_trait]
impl CollectionProviderPort for InMemoryProvider {
    fn paging_style(&self) -> PagingStyle {
        self.paging
    }

    fn request_timeout(&self) -> Option<Duration> {
        self.timeout
    }

    async fn fetch_page(&self, request: &PageRequest) -> Result<RawPage, FetchError> {
        self.calls.fetch_add(1, AtomicOrdering::SeqCst);
        lock(&self.requests).push(request.clone());

        if let Some(latency) = &self.latency {
            tokio::time::sleep(latency(request)).await;
        }

        let scripted = {
            let mut targeted = lock(&self.targeted);
            match targeted.iter().position(|(p, _)| *p == request.position) {
                Some(index) => Some(targeted.remove(index).1),
                None => lock(&self.failures).pop_front(),
            }
        };
        if let Some(error) = scripted {
            debug!(position = ?request.position, %error, "scripted failure");
            return Err(error);
        }
        self.serve(request)
    }
}

#[async_trait]
impl IndexingStatusPort for InMemoryProvider {
    async fn fetch_indexing_status(
        &self,
        collection: &CollectionId,
    ) -> Result<IndexingStatus, FetchError> {
        self.indexing_calls.fetch_add(1, AtomicOrdering::SeqCst);
        lock(&self.indexing_requests).push(collection.clone());
        let mut statuses = lock(&self.indexing);
        let status = if statuses.len() > 1 {
            statuses.pop_front()
        } else {
            statuses.front().copied()
        };
        Ok(status.unwrap_or_default())
    }
}
