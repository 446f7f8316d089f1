//! The host's repeating-task table.
//!
//! Tasks are plain ids. Whoever schedules a task keeps the mapping from id
//! to the work it stands for (the game registry maps it to a game), so
//! the table itself never holds callbacks and never calls back into the
//! code that is advancing it.

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, trace};

use crate::TickError;

/// Handle to a scheduled repeating task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct RepeatingTask {
    /// Server tick on which the task runs next.
    next_run: u64,
    /// Server ticks between runs (≥ 1).
    period: u64,
}

/// Repeating tasks measured in server ticks.
///
/// Call [`advance`](Self::advance) once per server tick. Tasks come back
/// in id order, so two tasks due on the same tick always run in the order
/// they were scheduled.
#[derive(Debug, Default)]
pub struct TaskScheduler {
    tasks: BTreeMap<TaskId, RepeatingTask>,
    next_id: u64,
    current_tick: u64,
}

impl TaskScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules a task that first runs `delay` ticks from now (at least one)
    /// and then every `period` ticks.
    ///
    /// # Errors
    /// [`TickError::ZeroPeriod`] if `period` is 0.
    pub fn schedule_delayed_repeating(&mut self, delay: u64, period: u64) -> Result<TaskId, TickError> {
        if period == 0 {
            return Err(TickError::ZeroPeriod);
        }
        self.next_id += 1;
        let id = TaskId(self.next_id);
        let next_run = self.current_tick + delay.max(1);
        self.tasks.insert(id, RepeatingTask { next_run, period });
        debug!(%id, delay, period, next_run, "repeating task scheduled");
        Ok(id)
    }

    /// Removes a task so it never runs again.
    ///
    /// # Errors
    /// [`TickError::UnknownTask`] if the task is not scheduled (never was,
    /// or already cancelled).
    pub fn cancel(&mut self, id: TaskId) -> Result<(), TickError> {
        self.tasks
            .remove(&id)
            .map(|_| debug!(%id, "repeating task cancelled"))
            .ok_or(TickError::UnknownTask(id))
    }

    pub fn is_scheduled(&self, id: TaskId) -> bool {
        self.tasks.contains_key(&id)
    }

    /// Moves the table forward one server tick and returns every task due
    /// on it. Each returned task is rescheduled `period` ticks later.
    ///
    /// A task cancelled by work done for an earlier task in the returned
    /// list is still in the list; check [`is_scheduled`](Self::is_scheduled)
    /// before running each one.
    pub fn advance(&mut self) -> Vec<TaskId> {
        self.current_tick += 1;
        let now = self.current_tick;
        let mut due = Vec::new();
        for (id, task) in self.tasks.iter_mut() {
            if task.next_run <= now {
                due.push(*id);
                task.next_run = now + task.period;
            }
        }
        if !due.is_empty() {
            trace!(tick = now, due = due.len(), "tasks due");
        }
        due
    }

    /// Number of server ticks advanced so far.
    pub fn current_tick(&self) -> u64 {
        self.current_tick
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_period_rejected() {
        let mut tasks = TaskScheduler::new();
        assert_eq!(
            tasks.schedule_delayed_repeating(0, 0),
            Err(TickError::ZeroPeriod)
        );
        assert!(tasks.is_empty());
    }

    #[test]
    fn test_zero_delay_runs_on_next_tick() {
        let mut tasks = TaskScheduler::new();
        let id = tasks.schedule_delayed_repeating(0, 5).unwrap();
        assert_eq!(tasks.advance(), vec![id]);
        for _ in 0..4 {
            assert!(tasks.advance().is_empty());
        }
        assert_eq!(tasks.advance(), vec![id]);
    }

    #[test]
    fn test_cancel_unknown_task_fails() {
        let mut tasks = TaskScheduler::new();
        let id = tasks.schedule_delayed_repeating(1, 1).unwrap();
        tasks.cancel(id).unwrap();
        assert_eq!(tasks.cancel(id), Err(TickError::UnknownTask(id)));
        assert!(!tasks.is_scheduled(id));
    }

    #[test]
    fn test_due_tasks_come_back_in_schedule_order() {
        let mut tasks = TaskScheduler::new();
        let a = tasks.schedule_delayed_repeating(2, 2).unwrap();
        let b = tasks.schedule_delayed_repeating(2, 2).unwrap();
        assert!(tasks.advance().is_empty());
        assert_eq!(tasks.advance(), vec![a, b]);
        assert_eq!(tasks.current_tick(), 2);
    }
}
