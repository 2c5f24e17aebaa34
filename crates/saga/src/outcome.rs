//! Outcomes of best-effort saga steps.

use common::OrderId;
use serde::Serialize;

use crate::error::GatewayError;

/// Result of one best-effort step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum StepStatus {
    Succeeded,
    Failed(String),
    /// The step did not apply, e.g. no mobile number on file.
    Skipped,
}

/// A best-effort step and how it ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepOutcome {
    pub step: &'static str,
    #[serde(flatten)]
    pub status: StepStatus,
}

impl StepOutcome {
    pub fn succeeded(step: &'static str) -> Self {
        Self {
            step,
            status: StepStatus::Succeeded,
        }
    }

    pub fn failed(step: &'static str, reason: impl Into<String>) -> Self {
        Self {
            step,
            status: StepStatus::Failed(reason.into()),
        }
    }

    pub fn skipped(step: &'static str) -> Self {
        Self {
            step,
            status: StepStatus::Skipped,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, StepStatus::Failed(_))
    }

    fn label(&self) -> &'static str {
        match self.status {
            StepStatus::Succeeded => "succeeded",
            StepStatus::Failed(_) => "failed",
            StepStatus::Skipped => "skipped",
        }
    }
}

/// Best-effort step outcomes of one saga run.
///
/// A failed step never changes the result of the operation; the report only
/// tells the caller which side effects did not happen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SagaReport {
    outcomes: Vec<StepOutcome>,
}

impl SagaReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, outcome: StepOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn outcomes(&self) -> &[StepOutcome] {
        &self.outcomes
    }

    /// Returns the outcomes recorded for `step`.
    pub fn step(&self, step: &str) -> impl Iterator<Item = &StepOutcome> {
        self.outcomes.iter().filter(move |o| o.step == step)
    }

    /// Returns true if `step` ran and every attempt succeeded.
    pub fn succeeded(&self, step: &str) -> bool {
        let mut attempts = self.step(step).peekable();
        attempts.peek().is_some()
            && attempts.all(|o| o.status == StepStatus::Succeeded)
    }

    /// Returns true if any attempt of `step` failed.
    pub fn failed(&self, step: &str) -> bool {
        self.step(step).any(StepOutcome::is_failed)
    }

    /// Returns the failed steps.
    pub fn failures(&self) -> impl Iterator<Item = &StepOutcome> {
        self.outcomes.iter().filter(|o| o.is_failed())
    }

    /// Returns true if no step failed.
    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

impl Extend<StepOutcome> for SagaReport {
    fn extend<I: IntoIterator<Item = StepOutcome>>(&mut self, iter: I) {
        self.outcomes.extend(iter);
    }
}

/// Turns the result of a best-effort call into an outcome, logging failures.
pub(crate) fn settle(
    order_id: OrderId,
    step: &'static str,
    result: Result<(), GatewayError>,
) -> StepOutcome {
    let outcome = match result {
        Ok(()) => StepOutcome::succeeded(step),
        Err(error) => {
            tracing::warn!(%order_id, step, %error, "best-effort step failed");
            StepOutcome::failed(step, error.to_string())
        }
    };
    record(&outcome);
    outcome
}

/// Records an outcome that did not come from a collaborator call.
pub(crate) fn record(outcome: &StepOutcome) {
    metrics::counter!(
        "saga_side_effect_total",
        "step" => outcome.step,
        "outcome" => outcome.label()
    )
    .increment(1);
}
