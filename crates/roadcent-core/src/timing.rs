//! Wall-clock timing for the pipeline stages (`load`, `build`, `estimate`).
//!
//! Collection is off unless enabled via [`set_timing_enabled`] (the CLI
//! flips it for `--timing` or `ROADCENT_TIMING`). Samples are stored
//! per thread and drained by [`collect_report`].

use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use serde_json::json;

/// Stage timings in the order they were recorded.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TimingReport {
    pub stages: Vec<StageTiming>,
}

/// Duration of one named stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageTiming {
    pub name: String,
    pub elapsed: Duration,
}

thread_local! {
    static SAMPLES: RefCell<Vec<StageTiming>> = const { RefCell::new(Vec::new()) };
}

static TIMING_ENABLED: AtomicBool = AtomicBool::new(false);

/// Returns true when `ROADCENT_TIMING` enables timing collection.
///
/// Supported truthy values: `1`, `true`, `yes`, `on` (case-insensitive).
#[must_use]
pub fn timing_enabled_from_env() -> bool {
    std::env::var("ROADCENT_TIMING")
        .ok()
        .is_some_and(|value| is_truthy(value.as_str()))
}

/// Enable or disable timing collection.
pub fn set_timing_enabled(enabled: bool) {
    TIMING_ENABLED.store(enabled, Ordering::Relaxed);
    if !enabled {
        clear_timings();
    }
}

#[must_use]
pub fn is_timing_enabled() -> bool {
    TIMING_ENABLED.load(Ordering::Relaxed)
}

/// Clears all recorded timings for the current thread.
pub fn clear_timings() {
    SAMPLES.with(|samples| samples.borrow_mut().clear());
}

/// Execute a closure while recording its duration under `name`.
pub fn timed<R>(name: &str, f: impl FnOnce() -> R) -> R {
    if !is_timing_enabled() {
        return f();
    }

    let started = Instant::now();
    let result = f();
    record_stage(name, started.elapsed());
    result
}

/// Drain the current thread's stage timings into a report.
#[must_use]
pub fn collect_report() -> TimingReport {
    let stages = SAMPLES.with(|samples| std::mem::take(&mut *samples.borrow_mut()));
    TimingReport { stages }
}

impl TimingReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Sum of all stage durations.
    #[must_use]
    pub fn total(&self) -> Duration {
        self.stages.iter().map(|s| s.elapsed).sum()
    }

    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let stages = self
            .stages
            .iter()
            .map(|s| json!({ "name": s.name, "elapsed_us": s.elapsed.as_micros() }))
            .collect::<Vec<_>>();

        json!({ "stages": stages, "total_us": self.total().as_micros() })
    }

    /// Render as a simple table for terminal output.
    #[must_use]
    pub fn display_table(&self) -> String {
        if self.stages.is_empty() {
            return "No timing samples recorded.".to_string();
        }

        let mut out = String::new();
        out.push_str("stage                 elapsed\n");
        out.push_str("-----------------------------\n");
        for stage in &self.stages {
            out.push_str(&format!(
                "{:<18} {:>10}\n",
                stage.name,
                format_duration(stage.elapsed)
            ));
        }
        out.push_str(&format!("{:<18} {:>10}\n", "total", format_duration(self.total())));
        out
    }
}

fn record_stage(name: &str, elapsed: Duration) {
    SAMPLES.with(|samples| {
        samples.borrow_mut().push(StageTiming {
            name: name.to_string(),
            elapsed,
        });
    });
}

fn format_duration(duration: Duration) -> String {
    let micros = duration.as_micros();

    if micros >= 1_000_000 {
        let secs = micros / 1_000_000;
        let millis = (micros % 1_000_000) / 1_000;
        format!("{secs}.{millis:03}s")
    } else if micros >= 1_000 {
        let millis = micros / 1_000;
        let rem = micros % 1_000;
        format!("{millis}.{rem:03}ms")
    } else {
        format!("{micros}µs")
    }
}

fn is_truthy(value: &str) -> bool {
    ["1", "true", "yes", "on"]
        .iter()
        .any(|t| value.eq_ignore_ascii_case(t))
}
