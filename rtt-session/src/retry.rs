#![forbid(unsafe_code)]

pub mod backoff_policy {
    use std::time::Duration;

    /// Exponential backoff with jitter for subscription restarts.
    /// `attempt` 0 yields roughly `base_ms`; growth is capped at `max_ms`.
    pub fn exponential_with_jitter(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
        let pow = 1u64 << attempt.min(16);
        let raw = base_ms.saturating_mul(pow);
        let capped = raw.min(max_ms).max(1);
        let jitter = fastrand::u64(0..(capped / 2).max(1));
        Duration::from_millis(capped / 2 + jitter)
    }
}
