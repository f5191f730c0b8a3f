use std::time::{Duration, Instant};

use crate::error::{ResourceLimit, RuntimeError};

/// Ceiling on the number of evaluation steps a single execution may take.
pub const MAX_OPERATIONS: u64 = 100_000;

/// Wall-clock budget for a single execution.
pub const TIME_BUDGET: Duration = Duration::from_secs(5);

/// How many operations pass between wall-clock checks. Reading the clock on
/// every node would dominate evaluation time for tight loops.
const TIME_CHECK_INTERVAL: u64 = 1024;

/// Cooperative resource guard consulted on every evaluation step.
///
/// The evaluator is a synchronous tree walk that the host cannot preempt, so
/// this counter is the only cancellation mechanism. Built-ins that iterate
/// internally (range materialization, text repetition, numeric iteration)
/// tick the same counter per step so a single call cannot run unbounded
/// between top-level checks.
pub struct ExecutionGuard {
    operations: u64,
    started:    Instant,
}

impl ExecutionGuard {
    /// Creates a guard whose clock starts now.
    #[must_use]
    pub fn new() -> Self {
        Self { operations: 0, started: Instant::now() }
    }

    /// Counts one evaluation step, failing once either ceiling is exceeded.
    ///
    /// # Errors
    /// Returns [`RuntimeError::ResourceExceeded`] with the tripped limit.
    pub fn tick(&mut self, line: usize) -> Result<(), RuntimeError> {
        self.operations += 1;

        if self.operations > MAX_OPERATIONS {
            return Err(RuntimeError::ResourceExceeded { limit: ResourceLimit::Operations, line });
        }
        if self.operations % TIME_CHECK_INTERVAL == 0 && self.started.elapsed() > TIME_BUDGET {
            return Err(RuntimeError::ResourceExceeded { limit: ResourceLimit::Time, line });
        }

        Ok(())
    }
}

impl Default for ExecutionGuard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trips_on_operation_ceiling() {
        let mut guard = ExecutionGuard::new();
        for _ in 0..MAX_OPERATIONS {
            assert!(guard.tick(1).is_ok());
        }
        let err = guard.tick(7).unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::ResourceExceeded { limit: ResourceLimit::Operations, line: 7 }
        ));
    }
}
