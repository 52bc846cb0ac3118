// src/explore/report.rs — What one iteration produced

use std::time::Duration;

use rhai::Dynamic;

use crate::infra::errors::HotloopError;
use crate::script;

#[derive(Debug)]
pub enum IterationOutcome {
    /// The script ran to the end; its final value.
    Completed(Dynamic),
    /// Reading, compiling or running the script failed.
    Failed(HotloopError),
}

#[derive(Debug)]
pub struct IterationReport {
    pub iteration: u64,
    pub elapsed: Duration,
    pub outcome: IterationOutcome,
}

impl IterationReport {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, IterationOutcome::Completed(_))
    }

    pub fn value(&self) -> Option<&Dynamic> {
        match &self.outcome {
            IterationOutcome::Completed(v) => Some(v),
            IterationOutcome::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&HotloopError> {
        match &self.outcome {
            IterationOutcome::Completed(_) => None,
            IterationOutcome::Failed(e) => Some(e),
        }
    }

    /// One-line status, e.g. `[iter 3] ok in 1.2 ms`.
    pub fn status_line(&self) -> String {
        let status = if self.is_success() { "ok" } else { "FAILED" };
        format!(
            "[iter {}] {} in {}",
            self.iteration,
            status,
            format_elapsed(self.elapsed)
        )
    }

    /// The value or the full diagnostic, as printed.
    pub fn body(&self) -> String {
        match &self.outcome {
            IterationOutcome::Completed(v) => script::describe(v),
            IterationOutcome::Failed(e) => e.to_string(),
        }
    }
}

pub fn format_elapsed(elapsed: Duration) -> String {
    let ms = elapsed.as_secs_f64() * 1000.0;
    if ms >= 1000.0 {
        format!("{:.2} s", ms / 1000.0)
    } else {
        format!("{:.1} ms", ms)
    }
}
