//! RateLimitedSink - minimum interval between accepted updates per colour

use std::collections::HashMap;
use std::time::{Duration, Instant};

use contracts::{Reading, ReadingSink, SinkError, TiltColor};
use tracing::trace;

/// Per-key minimum-interval gate
#[derive(Debug, Clone)]
pub struct RateLimiter {
    min_interval: Duration,
    last_accepted: HashMap<TiltColor, Instant>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_accepted: HashMap::new(),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Time left before `color` may pass again, if still throttled
    pub fn remaining(&self, color: TiltColor, now: Instant) -> Option<Duration> {
        let last = self.last_accepted.get(&color)?;
        let elapsed = now.saturating_duration_since(*last);
        (elapsed < self.min_interval).then(|| self.min_interval - elapsed)
    }

    /// Mark `color` as accepted at `now`
    pub fn accept(&mut self, color: TiltColor, now: Instant) {
        self.last_accepted.insert(color, now);
    }
}

/// Wraps a sink and rejects updates arriving faster than the interval
///
/// Rejections surface as [`SinkError::RateLimited`]. Only successful
/// updates restart the interval.
pub struct RateLimitedSink<S> {
    inner: S,
    limiter: RateLimiter,
}

impl<S: ReadingSink + Send> RateLimitedSink<S> {
    pub fn new(inner: S, min_interval: Duration) -> Self {
        Self {
            inner,
            limiter: RateLimiter::new(min_interval),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: ReadingSink + Send> ReadingSink for RateLimitedSink<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn enabled(&self) -> bool {
        self.inner.enabled()
    }

    async fn start(&mut self) -> Result<Option<String>, SinkError> {
        let status = self.inner.start().await?;
        let limit = format!("(at most one update per {:?} per colour)", self.limiter.min_interval());
        Ok(Some(match status {
            Some(text) => format!("{text} {limit}"),
            None => limit,
        }))
    }

    async fn update(&mut self, reading: &Reading) -> Result<(), SinkError> {
        let now = Instant::now();
        if let Some(retry_after) = self.limiter.remaining(reading.color(), now) {
            trace!(sink = %self.inner.name(), color = %reading.color(), ?retry_after, "throttled");
            return Err(SinkError::rate_limited(self.inner.name(), Some(retry_after)));
        }

        self.inner.update(reading).await?;
        self.limiter.accept(reading.color(), now);
        Ok(())
    }
}
