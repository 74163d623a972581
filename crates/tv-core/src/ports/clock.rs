/// Wall-clock source for cache freshness. Backoff delays use the async
/// runtime's timer instead, so tests can pause time independently.
pub trait ClockPort: Send + Sync {
    fn now_ms(&self) -> i64;
}
