//! The server clock: a fixed-rate tick source.
//!
//! Game heartbeats are expressed in server ticks, so this clock is the
//! only place wall-clock time enters the engine. The default rate is
//! 20 Hz, i.e. a heartbeat period of 20 means once per second.

use std::time::{Duration, Instant};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What to do when the clock wakes up late.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TickPolicy {
    /// Forget the missed ticks and schedule the next one from now.
    #[default]
    Skip,
    /// Fire missed ticks back to back, at most `max_catchup` of them.
    CatchUp { max_catchup: u32 },
    /// Keep the original cadence; the late tick simply counts as one tick.
    Drop,
}

/// Configuration for the server clock.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Server ticks per second, 1..=128.
    pub tick_rate_hz: u32,
    pub policy: TickPolicy,
    /// Fraction of the tick budget (0.0–1.0) above which a warning is
    /// logged by [`TickScheduler::record_tick_end`].
    pub budget_warn_threshold: f64,
    /// Random delay (0–max µs) added to the first tick.
    pub initial_jitter_us: u64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 20,
            policy: TickPolicy::default(),
            budget_warn_threshold: 0.80,
            initial_jitter_us: 2_000,
        }
    }
}

impl ClockConfig {
    pub const MAX_TICK_RATE_HZ: u32 = 128;

    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self {
            tick_rate_hz,
            ..Default::default()
        }
    }

    /// Clamps out-of-range values. The server clock always runs, so a
    /// rate of 0 becomes 1.
    pub fn validated(mut self) -> Self {
        let clamped = self.tick_rate_hz.clamp(1, Self::MAX_TICK_RATE_HZ);
        if clamped != self.tick_rate_hz {
            warn!(
                rate = self.tick_rate_hz,
                clamped, "tick_rate_hz out of range, clamping"
            );
            self.tick_rate_hz = clamped;
        }
        self.budget_warn_threshold = self.budget_warn_threshold.clamp(0.0, 1.0);
        self
    }

    /// Duration of one server tick.
    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate_hz.max(1) as f64)
    }
}

// ---------------------------------------------------------------------------
// Tick info
// ---------------------------------------------------------------------------

/// Returned by [`TickScheduler::wait_for_tick`].
#[derive(Debug, Clone)]
pub struct ClockTick {
    /// Server tick number, starting at 1.
    pub tick: u64,
    /// Fixed step, always `1 / tick_rate_hz`.
    pub dt: Duration,
    /// The clock woke up more than 10% of a tick late.
    pub overrun: bool,
    /// Ticks dropped because of the overrun (0 normally).
    pub ticks_skipped: u64,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Fixed-rate server clock.
pub struct TickScheduler {
    config: ClockConfig,
    tick_duration: Duration,
    tick_count: u64,
    next_tick: TokioInstant,
    /// Set by `wait_for_tick`, consumed by `record_tick_end`.
    tick_start: Option<Instant>,
    paused: bool,
    total_overruns: u64,
}

impl TickScheduler {
    pub fn new(config: ClockConfig) -> Self {
        let config = config.validated();
        let tick_duration = config.tick_duration();

        let jitter = if config.initial_jitter_us > 0 {
            Duration::from_micros(rand::rng().random_range(0..config.initial_jitter_us))
        } else {
            Duration::ZERO
        };
        let next_tick = TokioInstant::now() + tick_duration + jitter;

        debug!(
            rate_hz = config.tick_rate_hz,
            tick_ms = tick_duration.as_secs_f64() * 1000.0,
            policy = ?config.policy,
            "server clock created"
        );

        Self {
            config,
            tick_duration,
            tick_count: 0,
            next_tick,
            tick_start: None,
            paused: false,
            total_overruns: 0,
        }
    }

    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self::new(ClockConfig::with_rate(tick_rate_hz))
    }

    /// Waits for the next server tick. Pends forever while paused, which
    /// lets `tokio::select!` keep serving its other branches.
    pub async fn wait_for_tick(&mut self) -> ClockTick {
        if self.paused {
            std::future::pending::<()>().await;
        }

        let next = self.next_tick;
        let dur = self.tick_duration;
        time::sleep_until(next).await;

        let now = TokioInstant::now();
        self.tick_count += 1;
        self.tick_start = Some(Instant::now());

        let late_by = now.saturating_duration_since(next);
        let overrun = late_by > dur / 10;
        let behind = (late_by.as_nanos() / dur.as_nanos()) as u64;
        let mut ticks_skipped = 0;

        self.next_tick = match self.config.policy {
            TickPolicy::Skip => {
                if overrun && behind > 0 {
                    ticks_skipped = behind;
                    warn!(tick = self.tick_count, skipped = behind, "server clock overrun, skipping ahead");
                }
                now + dur
            }
            TickPolicy::CatchUp { max_catchup } => {
                let cap = u64::from(max_catchup);
                if overrun && behind > cap {
                    ticks_skipped = behind - cap;
                    warn!(tick = self.tick_count, behind, cap, "server clock overrun, catch-up capped");
                    now + dur
                } else {
                    next + dur
                }
            }
            TickPolicy::Drop => {
                if overrun {
                    warn!(tick = self.tick_count, late_ms = late_by.as_secs_f64() * 1000.0, "server clock overrun");
                }
                next + dur
            }
        };

        if overrun {
            self.total_overruns += 1;
        }
        trace!(tick = self.tick_count, overrun, "server tick");

        ClockTick {
            tick: self.tick_count,
            dt: dur,
            overrun,
            ticks_skipped,
        }
    }

    /// Marks the end of the work done for the current tick and returns the
    /// fraction of the tick budget it used. `None` if no tick is open.
    pub fn record_tick_end(&mut self) -> Option<f64> {
        let start = self.tick_start.take()?;
        let elapsed = start.elapsed();
        let utilization = elapsed.as_secs_f64() / self.tick_duration.as_secs_f64();
        if utilization >= self.config.budget_warn_threshold {
            warn!(
                tick = self.tick_count,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                utilization_pct = format!("{:.1}", utilization * 100.0),
                "server tick over budget threshold"
            );
        }
        Some(utilization)
    }

    /// Idempotent.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            debug!(tick = self.tick_count, "server clock paused");
        }
    }

    /// Idempotent. The next tick is scheduled one tick from now so the
    /// pause does not produce a burst of catch-up ticks.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            self.next_tick = TokioInstant::now() + self.tick_duration;
            debug!(tick = self.tick_count, "server clock resumed");
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn total_overruns(&self) -> u64 {
        self.total_overruns
    }

    pub fn tick_rate_hz(&self) -> u32 {
        self.config.tick_rate_hz
    }

    pub fn tick_duration(&self) -> Duration {
        self.tick_duration
    }
}
