//! A game's heartbeat: one repeating task, deployed once, cancelled once.

use crate::{TaskId, TaskScheduler, TickError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Deployed(TaskId),
    Cancelled,
}

/// Single-shot handle on a repeating task.
///
/// ```text
/// Idle ──deploy──→ Deployed ──cancel──→ Cancelled
/// ```
///
/// Any other call is an error: deploying twice, cancelling an idle or
/// already-cancelled heartbeat, or deploying after cancel.
#[derive(Debug, Clone)]
pub struct Heartbeat {
    period: u64,
    phase: Phase,
}

impl Heartbeat {
    /// A heartbeat that will run every `period` server ticks once deployed.
    pub fn new(period: u64) -> Self {
        Self {
            period,
            phase: Phase::Idle,
        }
    }

    /// Schedules the repeating task, first running after `delay` ticks.
    ///
    /// # Errors
    /// - [`TickError::AlreadyDeployed`] if it is running
    /// - [`TickError::Spent`] if it was cancelled before
    /// - [`TickError::ZeroPeriod`] if the period is 0
    pub fn deploy(&mut self, scheduler: &mut TaskScheduler, delay: u64) -> Result<TaskId, TickError> {
        match self.phase {
            Phase::Deployed(_) => Err(TickError::AlreadyDeployed),
            Phase::Cancelled => Err(TickError::Spent),
            Phase::Idle => {
                let id = scheduler.schedule_delayed_repeating(delay, self.period)?;
                self.phase = Phase::Deployed(id);
                Ok(id)
            }
        }
    }

    /// Stops the repeating task.
    ///
    /// # Errors
    /// [`TickError::NotDeployed`] unless the heartbeat is running.
    pub fn cancel(&mut self, scheduler: &mut TaskScheduler) -> Result<(), TickError> {
        let Phase::Deployed(id) = self.phase else {
            return Err(TickError::NotDeployed);
        };
        scheduler.cancel(id)?;
        self.phase = Phase::Cancelled;
        Ok(())
    }

    pub fn is_deployed(&self) -> bool {
        matches!(self.phase, Phase::Deployed(_))
    }

    /// The scheduled task, while deployed.
    pub fn task_id(&self) -> Option<TaskId> {
        match self.phase {
            Phase::Deployed(id) => Some(id),
            _ => None,
        }
    }

    pub fn period(&self) -> u64 {
        self.period
    }
}
