use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Reports how much of the current invocation's time budget is left.
pub trait RemainingTime: Send + Sync {
    fn remaining_millis(&self) -> u64;
}

/// A wall-clock deadline.
///
/// Lambda hands every invocation its deadline as milliseconds since the epoch.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: SystemTime,
}

impl Deadline {
    pub fn from_epoch_millis(deadline_ms: u64) -> Self {
        Self {
            at: UNIX_EPOCH + Duration::from_millis(deadline_ms),
        }
    }

    pub fn after(budget: Duration) -> Self {
        Self {
            at: SystemTime::now() + budget,
        }
    }
}

impl RemainingTime for Deadline {
    fn remaining_millis(&self) -> u64 {
        self.at
            .duration_since(SystemTime::now())
            .map(|left| left.as_millis() as u64)
            .unwrap_or(0)
    }
}
