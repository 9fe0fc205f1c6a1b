use core::time::Duration;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Instant;

const LOG_TARGET: &str = "progress";

/// Stages an analysis run moves through, in order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, strum::Display, strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    Initializing,
    Validating,
    Fetching,
    Filtering,
    RetrievingComments,
    CalculatingMetrics,
    GeneratingOutput,
    Completed,
}

/// Point-in-time view of a run's progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub phase: Phase,

    pub items_done: u64,

    /// Total items in the current phase, when known up front.
    pub items_total: Option<u64>,

    pub message: String,

    /// Time since the tracker was created.
    pub elapsed: Duration,

    /// Non-fatal problems accumulated so far.
    pub warnings: Vec<String>,
}

impl ProgressSnapshot {
    /// Completion percentage of the current phase. Zero when the total is
    /// unknown or zero.
    #[must_use]
    pub fn percent(&self) -> f64 {
        match self.items_total {
            Some(total) if total > 0 => (self.items_done as f64 / total as f64) * 100.0,
            _ => 0.0,
        }
    }

    /// Remaining time estimate extrapolated from throughput so far. `None`
    /// until at least one item is done or when the total is unknown.
    #[must_use]
    pub fn estimated_remaining(&self) -> Option<Duration> {
        let total = self.items_total?;
        if self.items_done == 0 || total <= self.items_done {
            return if total <= self.items_done && self.items_done > 0 {
                Some(Duration::ZERO)
            } else {
                None
            };
        }

        let per_item = self.elapsed.as_secs_f64() / self.items_done as f64;
        Some(Duration::from_secs_f64(per_item * (total - self.items_done) as f64))
    }
}

/// Callback invoked with each progress update.
pub type ProgressListener = Box<dyn Fn(&ProgressSnapshot) + Send + Sync>;

struct ProgressState {
    phase: Phase,
    items_done: u64,
    items_total: Option<u64>,
    message: String,
    warnings: Vec<String>,
}

/// Tracks the current phase and item counts, pushing every change to an
/// optional listener.
///
/// Phases only move forward; an attempt to re-enter an earlier phase is
/// ignored. The tracker is purely an observer and never fails the run.
pub struct ProgressTracker {
    state: Mutex<ProgressState>,
    listener: Option<ProgressListener>,
    started: Instant,
}

impl ProgressTracker {
    #[must_use]
    pub fn new(listener: Option<ProgressListener>) -> Self {
        Self {
            state: Mutex::new(ProgressState {
                phase: Phase::Initializing,
                items_done: 0,
                items_total: None,
                message: String::new(),
                warnings: Vec::new(),
            }),
            listener,
            started: Instant::now(),
        }
    }

    /// Enters a new phase, resetting the item counters. Backward transitions
    /// are ignored.
    pub fn start_phase(&self, phase: Phase, message: impl Into<String>) {
        self.update(|s| {
            if phase < s.phase {
                log::debug!(target: LOG_TARGET, "ignoring backward phase transition {} -> {phase}", s.phase);
                return;
            }

            s.phase = phase;
            s.items_done = 0;
            s.items_total = None;
            s.message = message.into();
        });
    }

    pub fn set_total(&self, total: u64) {
        self.update(|s| s.items_total = Some(total));
    }

    pub fn advance(&self, done: u64) {
        self.update(|s| s.items_done = done);
    }

    pub fn set_message(&self, message: impl Into<String>) {
        self.update(|s| s.message = message.into());
    }

    /// Records a non-fatal problem for later display.
    pub fn warn(&self, warning: impl Into<String>) {
        self.update(|s| s.warnings.push(warning.into()));
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        let guard = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        Self::to_snapshot(&guard, self.started)
    }

    fn to_snapshot(state: &ProgressState, started: Instant) -> ProgressSnapshot {
        ProgressSnapshot {
            phase: state.phase,
            items_done: state.items_done,
            items_total: state.items_total,
            message: state.message.clone(),
            elapsed: started.elapsed(),
            warnings: state.warnings.clone(),
        }
    }

    fn update(&self, f: impl FnOnce(&mut ProgressState)) {
        let snapshot = {
            let mut guard = match self.state.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };

            f(&mut guard);
            Self::to_snapshot(&guard, self.started)
        };

        if let Some(listener) = &self.listener {
            listener(&snapshot);
        }
    }
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("state", &self.snapshot())
            .field("listener", &self.listener.is_some())
            .finish()
    }
}
