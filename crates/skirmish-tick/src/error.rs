//! Error types for the timing layer.

use crate::TaskId;

/// Errors from the task table and heartbeats.
///
/// Every variant is a caller bug: the heartbeat is a single-shot resource
/// and the engine is expected to deploy and cancel it exactly once.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TickError {
    /// `deploy` was called on a heartbeat that is already running.
    #[error("heartbeat is already deployed")]
    AlreadyDeployed,

    /// `cancel` was called on a heartbeat that is not running.
    #[error("heartbeat is not deployed")]
    NotDeployed,

    /// `deploy` was called on a heartbeat that has already been cancelled.
    #[error("heartbeat was cancelled and cannot be redeployed")]
    Spent,

    /// The task id does not name a scheduled task.
    #[error("{0} is not scheduled")]
    UnknownTask(TaskId),

    /// Repeating tasks need a period of at least one server tick.
    #[error("repeating task period must be at least one tick")]
    ZeroPeriod,
}

impl TickError {
    /// Returns `true` for errors that signal a bug in the caller rather
    /// than a runtime condition. For the timing layer that is all of them.
    pub fn is_programming_error(&self) -> bool {
        match self {
            Self::AlreadyDeployed
            | Self::NotDeployed
            | Self::Spent
            | Self::UnknownTask(_)
            | Self::ZeroPeriod => true,
        }
    }
}
