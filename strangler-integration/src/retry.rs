use rand::Rng;
use std::time::Duration;

/// Exponential backoff with uniform jitter: starting at 1s and capped at
/// 30s, with uniform jitter in `[0, backoff/4)`.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    base: Duration,
    cap: Duration,
    attempt: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(30))
    }
}

impl Backoff {
    pub fn new(base: Duration, cap: Duration) -> Self {
        Self {
            base,
            cap,
            attempt: 0,
        }
    }

    /// Duration to wait before the next attempt, advancing internal state.
    pub fn next_delay(&mut self) -> Duration {
        let exp = self.base.saturating_mul(1 << self.attempt.min(10));
        let bounded = exp.min(self.cap);
        self.attempt += 1;

        let jitter_max = bounded / 4;
        if jitter_max.is_zero() {
            return bounded;
        }
        let jitter_ms = rand::rng().random_range(0..jitter_max.as_millis() as u64);
        bounded + Duration::from_millis(jitter_ms)
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}

/// Retry `operation` up to `max_attempts` times (the first call counts as
/// attempt 1), sleeping with [`Backoff`] between retryable failures.
/// `is_retryable` decides whether a given error warrants another attempt.
pub async fn retry_with_backoff<T, E, F, Fut>(
    max_attempts: u32,
    mut is_retryable: impl FnMut(&E) -> bool,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
{
    let mut backoff = Backoff::default();
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if backoff.attempt() + 1 >= max_attempts || !is_retryable(&err) {
                    return Err(err);
                }
                let delay = backoff.next_delay();
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_caps_at_thirty_seconds() {
        let mut backoff = Backoff::default();
        let mut last = Duration::ZERO;
        for _ in 0..12 {
            last = backoff.next_delay();
        }
        assert!(last <= Duration::from_secs(30) + Duration::from_secs(30) / 4);
    }

    #[test]
    fn backoff_starts_near_one_second() {
        let mut backoff = Backoff::default();
        let first = backoff.next_delay();
        assert!(first >= Duration::from_secs(1));
        assert!(first < Duration::from_millis(1250));
    }
}
