use serde::Serialize;
use std::time::Instant;

/// Wall-clock time spent in one grading stage.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTiming {
    pub label: String,
    pub elapsed_ms: f64,
}

/// Per-stage timings of one tracker run.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingBreakdown {
    pub total_ms: f64,
    pub stages: Vec<StageTiming>,
}

#[inline]
fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}

impl TimingBreakdown {
    /// Record the time elapsed since `started` under `label`.
    pub fn record(&mut self, label: impl Into<String>, started: Instant) {
        self.stages.push(StageTiming {
            label: label.into(),
            elapsed_ms: elapsed_ms(started),
        });
    }

    pub fn finish(&mut self, started: Instant) {
        self.total_ms = elapsed_ms(started);
    }
}
