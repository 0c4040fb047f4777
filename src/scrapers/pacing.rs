use crate::errors::{ScoutError, ScoutResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tracing::debug;

/// Requests-per-minute budget
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateBudget {
    requests_per_minute: f64,
}

impl RateBudget {
    pub fn new(requests_per_minute: f64) -> ScoutResult<Self> {
        if !requests_per_minute.is_finite()
            || requests_per_minute <= 0.0
            || Duration::try_from_secs_f64(60.0 / requests_per_minute).is_err()
        {
            return Err(ScoutError::InvalidRate(requests_per_minute));
        }
        Ok(Self { requests_per_minute })
    }

    pub fn requests_per_minute(&self) -> f64 {
        self.requests_per_minute
    }

    /// 60 / rate seconds
    pub fn base_delay(&self) -> Duration {
        Duration::from_secs_f64(60.0 / self.requests_per_minute)
    }
}

/// Random extra delay bounds, in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Jitter {
    low: f64,
    high: f64,
}

impl Jitter {
    pub const NONE: Jitter = Jitter { low: 0.0, high: 0.0 };
    pub const MODERATE: Jitter = Jitter { low: 1.0, high: 3.0 };
    pub const CAUTIOUS: Jitter = Jitter { low: 3.0, high: 8.0 };
}

/// Paces outgoing requests: base delay from the rate budget plus random jitter
#[derive(Debug)]
pub struct Pacer<R = StdRng> {
    budget: RateBudget,
    jitter: Jitter,
    rng: R,
}

impl Pacer<StdRng> {
    pub fn new(budget: RateBudget, jitter: Jitter) -> Self {
        Self::with_rng(budget, jitter, StdRng::from_entropy())
    }
}

impl<R: Rng> Pacer<R> {
    pub fn with_rng(budget: RateBudget, jitter: Jitter, rng: R) -> Self {
        Self { budget, jitter, rng }
    }

    pub fn set_budget(&mut self, budget: RateBudget) {
        self.budget = budget;
    }

    /// Delay to wait before the next request
    pub fn next_delay(&mut self) -> Duration {
        let extra = if self.jitter.high > self.jitter.low {
            self.rng.gen_range(self.jitter.low..=self.jitter.high)
        } else {
            self.jitter.low
        };
        self.budget.base_delay() + Duration::from_secs_f64(extra)
    }

    /// Sleep for the next delay
    pub async fn pause(&mut self) -> Duration {
        let delay = self.next_delay();
        debug!("Pacing request: sleeping {:.2}s", delay.as_secs_f64());
        tokio::time::sleep(delay).await;
        delay
    }
}
