use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::page::PagingStyle;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub provider: ProviderSettings,
    pub loader: LoaderSettings,
    pub retry: RetrySettings,
    pub cache: CacheSettings,
    pub indexing: IndexingSettings,
    pub viewport: ViewportSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub paging: PagingStyle,
    /// Only set for strictly rate-limited providers.
    pub request_timeout_ms: Option<u64>,
}

impl ProviderSettings {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderSettings {
    /// Records per batch; also the number of placeholders shown on a cold load.
    pub batch_size: u32,
    /// Upper bound on batches fetched by one progressive load.
    pub max_batches: u32,
    /// Concurrent batch fetches for page/offset providers. Cursor providers
    /// are always sequential.
    pub max_in_flight: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Floor applied to backoff after an upstream rate-limit response.
    pub rate_limit_min_delay_ms: u64,
    /// 0.0..=1.0
    pub jitter_pct: f64,
}

impl RetrySettings {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    pub fn rate_limit_min_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limit_min_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub ttl_secs: u64,
    pub max_entries: usize,
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexingSettings {
    pub enabled: bool,
    /// Re-poll interval while indexing is incomplete; `0` polls once.
    pub poll_interval_secs: u64,
}

impl IndexingSettings {
    pub fn poll_interval(&self) -> Option<Duration> {
        (self.poll_interval_secs > 0).then(|| Duration::from_secs(self.poll_interval_secs))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportSettings {
    pub column_count: usize,
    pub row_height_estimate: f64,
    pub overscan: usize,
    /// Rows before the end of loaded data at which the next batch is requested.
    pub load_more_margin_rows: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive used when `RUST_LOG` is unset, e.g. `"info"`.
    pub level: Option<String>,
    /// Directory for a log file; stdout only when unset.
    pub log_dir: Option<PathBuf>,
}
