//! Timing for Skirmish.
//!
//! Three pieces, from the outside in:
//!
//! 1. [`TickScheduler`]: the fixed-rate server clock (20 Hz by default).
//!    One per engine. Every firing is one *server tick*.
//! 2. [`TaskScheduler`]: the host's repeating-task table, measured in
//!    server ticks. Advancing it once per server tick yields the tasks
//!    that are due.
//! 3. [`Heartbeat`]: a game's single-shot handle on one repeating task.
//!    Deployed once when the game starts, cancelled once when it finishes.
//!
//! # Integration
//!
//! The engine actor owns the clock and the task table:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands */ }
//!         _ = clock.wait_for_tick() => {
//!             for task in tasks.advance() {
//!                 /* run the game owning `task` */
//!             }
//!             clock.record_tick_end();
//!         }
//!     }
//! }
//! ```

mod clock;
mod error;
mod heartbeat;
mod task;

pub use clock::{ClockConfig, ClockTick, TickPolicy, TickScheduler};
pub use error::TickError;
pub use heartbeat::Heartbeat;
pub use task::{TaskId, TaskScheduler};
