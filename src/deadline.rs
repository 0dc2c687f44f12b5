//! Wall-clock budget shared by every pipeline stage.
//!
//! A [`Deadline`] is established once at run start. Each stage asks for the
//! remaining budget on entry and must fail fast with
//! [`Pdf2MarpError::TimeoutExceeded`] when none is left, rather than
//! silently proceeding. External-tool calls additionally bound their own
//! wall time with the remaining duration (see [`crate::export`]).

use crate::error::Pdf2MarpError;
use std::time::{Duration, Instant};

/// A single wall-clock deadline, cheap to copy into stages.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    budget: Duration,
}

impl Deadline {
    /// Start the clock with a total budget in seconds.
    pub fn new(budget_secs: u64) -> Self {
        Self {
            started: Instant::now(),
            budget: Duration::from_secs(budget_secs),
        }
    }

    /// Total budget in whole seconds, for error reporting.
    pub fn budget_secs(&self) -> u64 {
        self.budget.as_secs()
    }

    /// Remaining budget, or `None` once exhausted.
    pub fn remaining(&self) -> Option<Duration> {
        self.budget.checked_sub(self.started.elapsed()).filter(|d| !d.is_zero())
    }

    /// Gate a stage: returns the remaining budget, or the timeout error
    /// naming the stage that was about to start.
    pub fn check(&self, stage: &str) -> Result<Duration, Pdf2MarpError> {
        self.remaining().ok_or_else(|| Pdf2MarpError::TimeoutExceeded {
            stage: stage.to_string(),
            budget_secs: self.budget_secs(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_deadline_has_budget() {
        let d = Deadline::new(60);
        let left = d.check("extract").expect("budget should remain");
        assert!(left <= Duration::from_secs(60));
        assert!(left > Duration::from_secs(59));
    }

    #[test]
    fn exhausted_deadline_fails_fast_without_work() {
        let d = Deadline::new(0);
        match d.check("summarize") {
            Err(Pdf2MarpError::TimeoutExceeded { stage, budget_secs }) => {
                assert_eq!(stage, "summarize");
                assert_eq!(budget_secs, 0);
            }
            other => panic!("expected TimeoutExceeded, got {other:?}"),
        }
    }

    #[test]
    fn elapsed_deadline_reports_none() {
        let Some(started) = Instant::now().checked_sub(Duration::from_secs(10)) else {
            return; // clock too close to boot to back-date
        };
        let d = Deadline {
            started,
            budget: Duration::from_secs(5),
        };
        assert!(d.remaining().is_none());
        assert!(d.check("export").is_err());
    }
}
