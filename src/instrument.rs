/*!
# Activity Instrumentation

Keeps track of how each zone spends its time. Activities nest on a small
stack; time between boundaries is attributed to the innermost open activity.
Instrumentation misuse (overflow, underflow, mismatched finish) disables
tracking with a warning and the simulation continues.
*/

use std::time::{Duration, Instant};

use tracing::{info, warn};

const MAX_DEPTH: usize = 20;

/// Categories of simulation work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    Startup,
    Weights,
    Sums,
    Next,
    Comm,
    GlobalComm,
}

const ACTIVITY_COUNT: usize = 6;

impl Activity {
    fn index(self) -> usize {
        match self {
            Activity::Startup => 0,
            Activity::Weights => 1,
            Activity::Sums => 2,
            Activity::Next => 3,
            Activity::Comm => 4,
            Activity::GlobalComm => 5,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Activity::Startup => "startup",
            Activity::Weights => "compute_weights",
            Activity::Sums => "compute_sums",
            Activity::Next => "find_moves",
            Activity::Comm => "local_comm",
            Activity::GlobalComm => "global_comm",
        }
    }
}

/// Per-zone activity accumulator.
pub struct ActivityLog {
    enabled: bool,
    started: Instant,
    mark: Instant,
    stack: Vec<Activity>,
    accum: [Duration; ACTIVITY_COUNT],
}

impl ActivityLog {
    pub fn new(enabled: bool) -> Self {
        let now = Instant::now();
        ActivityLog {
            enabled,
            started: now,
            mark: now,
            stack: Vec::with_capacity(MAX_DEPTH),
            accum: [Duration::ZERO; ACTIVITY_COUNT],
        }
    }

    /// Opens an activity, charging the elapsed segment to the activity that
    /// was running.
    pub fn start(&mut self, activity: Activity) {
        if !self.enabled {
            return;
        }
        if self.stack.len() >= MAX_DEPTH {
            warn!("runaway instrumentation activity stack; disabling");
            self.enabled = false;
            return;
        }
        let now = Instant::now();
        if let Some(&open) = self.stack.last() {
            self.accum[open.index()] += now - self.mark;
        }
        self.mark = now;
        self.stack.push(activity);
    }

    /// Closes the innermost activity, which must match `activity`.
    pub fn finish(&mut self, activity: Activity) {
        if !self.enabled {
            return;
        }
        let Some(&open) = self.stack.last() else {
            warn!(
                "finishing activity {} with nothing started; disabling",
                activity.name()
            );
            self.enabled = false;
            return;
        };
        if open != activity {
            warn!(
                "started activity {}, but now finishing {}; disabling",
                open.name(),
                activity.name()
            );
            self.enabled = false;
            return;
        }
        let now = Instant::now();
        self.accum[open.index()] += now - self.mark;
        self.mark = now;
        self.stack.pop();
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Logs the per-activity breakdown for this zone.
    pub fn report(&self, zone: usize, local_node_count: usize, local_edge_count: usize) {
        if !self.enabled {
            return;
        }
        let elapsed = self.started.elapsed();
        info!(
            zone,
            nodes = local_node_count,
            edges = local_edge_count,
            "activity breakdown"
        );
        for (idx, accum) in self.accum.iter().enumerate() {
            if accum.is_zero() {
                continue;
            }
            let name = [
                Activity::Startup,
                Activity::Weights,
                Activity::Sums,
                Activity::Next,
                Activity::Comm,
                Activity::GlobalComm,
            ][idx]
                .name();
            let pct = accum.as_secs_f64() / elapsed.as_secs_f64() * 100.0;
            info!(zone, "{:8} ms    {:5.1} %    {}", accum.as_millis(), pct, name);
        }
        info!(zone, "{:8} ms    100.0 %    elapsed", elapsed.as_millis());
    }
}
