use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{oneshot, Mutex};

/// Priority levels for rate-limited broker calls; entry/exit order placement
/// outranks routine quote polling when the bucket is contended.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub enum Priority {
    High,
    Normal,
    Low,
}

struct Waiter {
    tx: oneshot::Sender<()>,
}

struct Inner {
    capacity: usize,
    tokens: usize,
    interval: Duration,
    last_refill: Instant,
    high: VecDeque<Waiter>,
    normal: VecDeque<Waiter>,
    low: VecDeque<Waiter>,
}

impl Inner {
    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill);
        if elapsed >= self.interval {
            let periods = elapsed.as_millis() / self.interval.as_millis().max(1);
            let add_tokens = (periods as usize + 1) * self.capacity;
            self.last_refill = now;
            self.tokens = usize::min(self.tokens + add_tokens, self.capacity);
        }
        while self.tokens > 0 {
            let Some(waiter) = self
                .high
                .pop_front()
                .or_else(|| self.normal.pop_front())
                .or_else(|| self.low.pop_front())
            else {
                break;
            };
            self.tokens -= 1;
            let _ = waiter.tx.send(());
        }
    }
}

/// Token-bucket rate limiter with priority queues, sized to the sandbox/live
/// request budgets (120 req/min sandbox, 500 req/min live).
///
/// A process-wide singleton: the rate limiter and circuit breaker must be
/// shared across every broker call, so construct one and share it via
/// [`Clone`] (it is a thin handle around an `Arc`).
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Mutex<Inner>>,
}

impl RateLimiter {
    /// `capacity` operations permitted every `interval`.
    pub fn new(capacity: usize, interval: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                capacity,
                tokens: capacity,
                interval,
                last_refill: Instant::now(),
                high: VecDeque::new(),
                normal: VecDeque::new(),
                low: VecDeque::new(),
            })),
        }
    }

    pub fn sandbox() -> Self {
        Self::new(120, Duration::from_secs(60))
    }

    pub fn live() -> Self {
        Self::new(500, Duration::from_secs(60))
    }

    /// Acquire a permit, waiting if the bucket is currently exhausted.
    pub async fn acquire(&self, priority: Priority) {
        loop {
            let rx = {
                let mut inner = self.inner.lock().await;
                inner.refill();
                if inner.tokens > 0 {
                    inner.tokens -= 1;
                    None
                } else {
                    let (tx, rx) = oneshot::channel();
                    match priority {
                        Priority::High => inner.high.push_back(Waiter { tx }),
                        Priority::Normal => inner.normal.push_back(Waiter { tx }),
                        Priority::Low => inner.low.push_back(Waiter { tx }),
                    }
                    Some(rx)
                }
            };
            match rx {
                None => return,
                Some(rx) => {
                    let _ = rx.await;
                    return;
                }
            }
        }
    }
}
