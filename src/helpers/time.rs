use std::fmt::Debug;
use std::sync::Arc;

use chrono::Utc;
use tokio::time::Instant;

/// Wall-clock source in UNIX seconds, injectable for tests.
pub trait Clock: Send + Sync + Debug {
    fn now_epoch_seconds(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_seconds(&self) -> i64 {
        now_i64()
    }
}

pub fn system_clock() -> Arc<dyn Clock> {
    Arc::new(SystemClock)
}

pub fn now_i64() -> i64 {
    Utc::now().timestamp()
}

pub fn get_instant() -> Instant {
    Instant::now()
}
