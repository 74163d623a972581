use super::model::*;
use crate::page::PagingStyle;

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            api_key: None,
            paging: PagingStyle::PageNumber,
            request_timeout_ms: None,
        }
    }
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            batch_size: 20,
            max_batches: 50,
            max_in_flight: 1,
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1_000,
            max_delay_ms: 30_000,
            rate_limit_min_delay_ms: 5_000,
            jitter_pct: 0.0,
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: 45,
            max_entries: 64,
        }
    }
}

impl Default for IndexingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_secs: 15,
        }
    }
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            column_count: 4,
            row_height_estimate: 320.0,
            overscan: 3,
            load_more_margin_rows: 3,
        }
    }
}
