//! Progressive loader behavior against the in-memory provider and cache.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::{expected_ids, ms, options, token_ids, view, Harness};
use tokio::time::Instant;
use tv_app::LoadOrigin;
use tv_core::ports::CacheStorePort;
use tv_core::{FetchError, LoadState, PagePosition, PagingStyle};
use tv_infra::InMemoryProvider;

#[tokio::test(start_paused = true)]
async fn fresh_cache_reload_makes_no_provider_calls() {
    let h = Harness::new(InMemoryProvider::sample(45, 1u64).with_latency(ms(50)));
    let mut first = h.loader.load(view(), options(20, 50)).await;
    assert_eq!(first.origin(), LoadOrigin::Started);
    assert_eq!(first.wait().await, LoadState::Loaded);
    assert_eq!(h.provider.calls(), 3);

    let again = h.loader.load(view(), options(20, 50)).await;
    assert_eq!(again.origin(), LoadOrigin::Cache);
    assert_eq!(again.state(), LoadState::Loaded);
    assert_eq!(h.provider.calls(), 3);

    // Past the TTL the entry is a miss again.
    h.clock.advance(Duration::from_secs(46));
    let mut stale = h.loader.load(view(), options(20, 50)).await;
    assert_eq!(stale.origin(), LoadOrigin::Started);
    // Old items stay visible while the refetch runs.
    assert_eq!(h.stats(&view()).await.loaded, 45);
    assert_eq!(stale.wait().await, LoadState::Loaded);
    assert_eq!(h.provider.calls(), 6);
}

#[tokio::test(start_paused = true)]
async fn final_length_is_bounded_by_batch_ceiling_in_provider_order() {
    let h = Harness::new(InMemoryProvider::sample(500, 1u64));
    let mut handle = h.loader.load(view(), options(20, 5)).await;
    assert_eq!(handle.wait().await, LoadState::Loaded);

    let items = h.items(&view()).await;
    assert_eq!(token_ids(&items), expected_ids(1..=100));
    let stats = h.stats(&view()).await;
    assert_eq!(stats.total_count, 500);
    assert!(stats.has_next_page);
    assert_eq!(h.provider.calls(), 5);
}

#[tokio::test(start_paused = true)]
async fn forty_five_items_take_three_pages_and_report_progress() {
    let h = Harness::new(InMemoryProvider::sample(45, 1u64));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let opts = options(20, 50).with_on_progress(move |loaded, total| {
        sink.lock().unwrap().push((loaded, total));
    });

    let mut handle = h.loader.load(view(), opts).await;
    assert_eq!(handle.wait().await, LoadState::Loaded);

    assert_eq!(*seen.lock().unwrap(), vec![(20, 45), (40, 45), (45, 45)]);
    let positions: Vec<_> = h.provider.requests().into_iter().map(|r| r.position).collect();
    assert_eq!(
        positions,
        vec![PagePosition::Page(1), PagePosition::Page(2), PagePosition::Page(3)]
    );
    assert!(!h.stats(&view()).await.has_next_page);
}

#[tokio::test(start_paused = true)]
async fn empty_first_page_is_loaded_with_empty_list() {
    let h = Harness::new(InMemoryProvider::sample(0, 1u64));
    let mut handle = h.loader.load(view(), options(20, 50)).await;
    assert_eq!(handle.wait().await, LoadState::Loaded);

    let stats = h.stats(&view()).await;
    assert_eq!(stats.loaded, 0);
    assert_eq!(stats.placeholders, 0);
    assert!(!stats.has_next_page);
    assert_eq!(h.provider.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn persistent_network_failure_backs_off_then_fails() {
    let h = Harness::new(InMemoryProvider::sample(45, 1u64));
    h.provider
        .fail_next(10, FetchError::Network("connection reset".into()));

    let start = Instant::now();
    let mut handle = h.loader.load(view(), options(20, 50)).await;
    let state = handle.wait().await;

    assert_eq!(
        state,
        LoadState::Failed {
            reason: "network error: connection reset".into(),
            attempts: 3,
        }
    );
    let elapsed = start.elapsed();
    assert!(
        elapsed >= Duration::from_secs(7) && elapsed < Duration::from_millis(7_100),
        "{elapsed:?}"
    );
    assert_eq!(h.provider.calls(), 3);

    // Nothing real landed, so the placeholders stay until a retry.
    let stats = h.stats(&view()).await;
    assert_eq!(stats.loaded, 0);
    assert_eq!(stats.placeholders, 20);
    assert!(!stats.in_flight);
}

#[tokio::test(start_paused = true)]
async fn rate_limit_waits_at_least_the_floor() {
    let h = Harness::new(InMemoryProvider::sample(10, 1u64));
    h.provider
        .fail_next(1, FetchError::RateLimited { retry_after: None });

    let start = Instant::now();
    let mut handle = h.loader.load(view(), options(20, 50)).await;
    assert_eq!(handle.wait().await, LoadState::Loaded);
    assert!(start.elapsed() >= Duration::from_secs(5));
    assert_eq!(h.stats(&view()).await.loaded, 10);
}

#[tokio::test(start_paused = true)]
async fn malformed_page_becomes_empty_page() {
    let h = Harness::new(InMemoryProvider::sample(45, 1u64));
    h.provider
        .fail_next(1, FetchError::Malformed("truncated body".into()));

    let mut handle = h.loader.load(view(), options(20, 50)).await;
    assert_eq!(handle.wait().await, LoadState::Loaded);
    let stats = h.stats(&view()).await;
    assert_eq!(stats.loaded, 0);
    assert!(!stats.complete);
    assert_eq!(h.provider.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn malformed_middle_page_is_skipped_and_not_cached_as_fresh() {
    let h = Harness::new(InMemoryProvider::sample(45, 1u64).with_latency(ms(100)));
    h.provider
        .fail_at(PagePosition::Page(2), FetchError::Malformed("truncated body".into()));

    let mut handle = h.loader.load(view(), options(20, 50)).await;
    assert_eq!(handle.wait().await, LoadState::Loaded);

    let stats = h.stats(&view()).await;
    assert_eq!(stats.total_count, 45);
    assert_eq!(stats.loaded, 25);
    assert!(!stats.has_next_page);
    assert!(!stats.complete);
    let mut ids = expected_ids(1..=20);
    ids.extend(expected_ids(41..=45));
    assert_eq!(token_ids(&h.items(&view()).await), ids);
    assert_eq!(h.provider.calls(), 3);

    // The gap is not served from cache; the next load refetches everything.
    let mut reload = h.loader.load(view(), options(20, 50)).await;
    assert_eq!(reload.origin(), LoadOrigin::Started);
    assert_eq!(reload.wait().await, LoadState::Loaded);
    assert_eq!(token_ids(&h.items(&view()).await), expected_ids(1..=45));
    assert!(h.stats(&view()).await.complete);
    assert_eq!(h.provider.calls(), 6);
}

#[tokio::test(start_paused = true)]
async fn prefetch_skips_a_malformed_batch_and_keeps_the_total() {
    let h = Harness::new(InMemoryProvider::sample(45, 1u64).with_latency(ms(10)));
    h.provider
        .fail_at(PagePosition::Page(2), FetchError::Malformed("truncated body".into()));
    let mut opts = options(20, 50);
    opts.max_in_flight = 3;

    let mut handle = h.loader.load(view(), opts).await;
    assert_eq!(handle.wait().await, LoadState::Loaded);

    let stats = h.stats(&view()).await;
    assert_eq!(stats.total_count, 45);
    assert_eq!(stats.loaded, 25);
    assert!(!stats.complete);
    assert_eq!(h.provider.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn rejected_request_fails_without_retrying() {
    let h = Harness::new(InMemoryProvider::sample(45, 1u64));
    h.provider
        .fail_next(1, FetchError::Rejected("HTTP 401 Unauthorized".into()));

    let start = Instant::now();
    let mut handle = h.loader.load(view(), options(20, 50)).await;
    assert_eq!(
        handle.wait().await,
        LoadState::Failed {
            reason: "request rejected: HTTP 401 Unauthorized".into(),
            attempts: 1,
        }
    );
    assert_eq!(h.provider.calls(), 1);
    assert!(start.elapsed() < ms(100));
}

#[tokio::test(start_paused = true)]
async fn request_timeout_counts_as_network_failure() {
    let h = Harness::new(
        InMemoryProvider::sample(45, 1u64)
            .with_timeout(Duration::from_secs(2))
            .with_latency(Duration::from_secs(5)),
    );
    let mut handle = h.loader.load(view(), options(20, 50)).await;
    match handle.wait().await {
        LoadState::Failed { reason, attempts } => {
            assert_eq!(attempts, 3);
            assert!(reason.contains("timed out"), "{reason}");
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn concurrent_load_joins_in_flight_load() {
    let h = Harness::new(InMemoryProvider::sample(45, 1u64).with_latency(ms(100)));
    let mut first = h.loader.load(view(), options(20, 50)).await;
    let mut second = h.loader.load(view(), options(20, 50)).await;

    assert_eq!(second.origin(), LoadOrigin::Joined);
    assert_eq!(second.generation(), first.generation());
    assert_eq!(first.wait().await, LoadState::Loaded);
    assert_eq!(second.wait().await, LoadState::Loaded);
    assert_eq!(h.provider.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn superseded_generation_never_writes() {
    let h = Harness::new(InMemoryProvider::sample(45, 1u64).with_latency(ms(500)));
    let mut handle = h.loader.load(view(), options(20, 50)).await;

    // Another writer takes the entry over while the first page is in flight.
    tokio::time::sleep(ms(100)).await;
    let newer = h.cache.begin_generation(&view(), 0).await;
    assert!(Some(newer) > handle.generation());

    assert_eq!(handle.wait().await, LoadState::Idle);
    assert!(h.items(&view()).await.is_empty());
    assert_eq!(h.cache.current_generation(&view()).await, Some(newer));
}

#[tokio::test(start_paused = true)]
async fn prefetch_applies_out_of_order_batches_in_order() {
    // Page 3 answers before page 2.
    let provider = InMemoryProvider::sample(45, 1u64).with_latency_fn(|request| {
        match request.position {
            PagePosition::Page(1) => ms(10),
            PagePosition::Page(2) => ms(300),
            _ => ms(100),
        }
    });
    let h = Harness::new(provider);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let mut opts = options(20, 50).with_on_progress(move |loaded, _| {
        sink.lock().unwrap().push(loaded);
    });
    opts.max_in_flight = 3;

    let start = Instant::now();
    let mut handle = h.loader.load(view(), opts).await;
    assert_eq!(handle.wait().await, LoadState::Loaded);

    assert_eq!(token_ids(&h.items(&view()).await), expected_ids(1..=45));
    assert_eq!(*seen.lock().unwrap(), vec![20, 40, 45]);
    assert_eq!(h.provider.calls(), 3);
    // Pages 2 and 3 were in flight together once page 1 advertised the total.
    assert!(start.elapsed() < ms(400), "{:?}", start.elapsed());
}

#[tokio::test(start_paused = true)]
async fn prefetch_stops_issuing_past_the_advertised_total() {
    let h = Harness::new(InMemoryProvider::sample(30, 1u64).with_latency(ms(10)));
    let mut opts = options(10, 50);
    opts.max_in_flight = 2;

    let mut handle = h.loader.load(view(), opts).await;
    assert_eq!(handle.wait().await, LoadState::Loaded);
    assert_eq!(h.stats(&view()).await.loaded, 30);
    assert_eq!(h.provider.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn prefetch_sends_only_the_first_page_until_a_total_is_known() {
    let h = Harness::new(InMemoryProvider::sample(5, 1u64).with_latency(ms(50)));
    // Would fail any speculative page 2 or 3 terminally.
    h.provider
        .fail_at(PagePosition::Page(2), FetchError::Rejected("HTTP 404".into()));
    h.provider
        .fail_at(PagePosition::Page(3), FetchError::Rejected("HTTP 404".into()));
    let mut opts = options(20, 50);
    opts.max_in_flight = 3;

    let mut handle = h.loader.load(view(), opts).await;
    assert_eq!(handle.wait().await, LoadState::Loaded);

    assert_eq!(h.stats(&view()).await.loaded, 5);
    let positions: Vec<_> = h.provider.requests().into_iter().map(|r| r.position).collect();
    assert_eq!(positions, vec![PagePosition::Page(1)]);
}

#[tokio::test(start_paused = true)]
async fn cursor_provider_loads_sequentially() {
    let h = Harness::new(InMemoryProvider::sample(45, 1u64).with_paging(PagingStyle::Cursor));
    let mut opts = options(20, 50);
    opts.max_in_flight = 4;

    let mut handle = h.loader.load(view(), opts).await;
    assert_eq!(handle.wait().await, LoadState::Loaded);

    let positions: Vec<_> = h.provider.requests().into_iter().map(|r| r.position).collect();
    assert_eq!(
        positions,
        vec![
            PagePosition::Cursor(None),
            PagePosition::Cursor(Some("c20".into())),
            PagePosition::Cursor(Some("c40".into())),
        ]
    );
    assert_eq!(token_ids(&h.items(&view()).await), expected_ids(1..=45));
}

#[tokio::test(start_paused = true)]
async fn cancel_stops_the_load_and_returns_to_idle() {
    let h = Harness::new(InMemoryProvider::sample(100, 1u64).with_latency(ms(1_000)));
    let mut handle = h.loader.load(view(), options(20, 50)).await;

    tokio::time::sleep(ms(1_500)).await;
    assert!(h.loader.cancel(&view()).await);
    assert_eq!(handle.wait().await, LoadState::Idle);

    tokio::time::sleep(ms(5_000)).await;
    let stats = h.stats(&view()).await;
    assert_eq!(stats.loaded, 20);
    assert!(!stats.in_flight);
    assert_eq!(h.provider.calls(), 2);
    assert!(!h.loader.cancel(&view()).await);
}

#[tokio::test(start_paused = true)]
async fn load_next_batch_continues_page_at_a_time() {
    let h = Harness::new(InMemoryProvider::sample(45, 1u64));
    let mut handle = h.loader.load(view(), options(20, 1)).await;
    assert_eq!(handle.wait().await, LoadState::Loaded);
    assert_eq!(h.stats(&view()).await.loaded, 20);

    let mut next = h
        .loader
        .load_next_batch(&view(), options(20, 1))
        .await
        .expect("more pages exist");
    assert_eq!(next.origin(), LoadOrigin::Continued);
    assert_eq!(next.wait().await, LoadState::Loaded);
    assert_eq!(h.stats(&view()).await.loaded, 40);

    let mut last = h
        .loader
        .load_next_batch(&view(), options(20, 1))
        .await
        .expect("one page left");
    assert_eq!(last.wait().await, LoadState::Loaded);

    assert_eq!(token_ids(&h.items(&view()).await), expected_ids(1..=45));
    assert!(h.loader.load_next_batch(&view(), options(20, 1)).await.is_none());
}

#[tokio::test(start_paused = true)]
async fn load_next_batch_is_a_noop_while_loading() {
    let h = Harness::new(InMemoryProvider::sample(45, 1u64).with_latency(ms(100)));
    let _handle = h.loader.load(view(), options(20, 50)).await;
    assert!(h.loader.load_next_batch(&view(), options(20, 50)).await.is_none());
}
