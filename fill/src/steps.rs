//! Per-attempt step tracking

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::FillError;

/// The fixed steps of a fill attempt, in order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepId {
    Authorize,
    Approve,
    Execute,
    Confirm,
}

impl StepId {
    pub const ALL: [StepId; 4] = [
        StepId::Authorize,
        StepId::Approve,
        StepId::Execute,
        StepId::Confirm,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            StepId::Authorize => "Authorize fill",
            StepId::Approve => "Approve token",
            StepId::Execute => "Execute fill",
            StepId::Confirm => "Confirm settlement",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            StepId::Authorize => "Request a hidden-limit proof from the maker",
            StepId::Approve => "Allow the settlement contract to spend the taker asset",
            StepId::Execute => "Submit the fill with its authorization predicate",
            StepId::Confirm => "Wait for the fill transaction to be confirmed",
        }
    }

    pub(crate) fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StepId::Authorize => "authorize",
            StepId::Approve => "approve",
            StepId::Execute => "execute",
            StepId::Confirm => "confirm",
        };
        f.write_str(name)
    }
}

/// State of a single step
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepState {
    Pending,
    Loading,
    Success,
    Error,
}

/// A step as shown to the taker
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionStep {
    pub id: StepId,
    pub title: String,
    pub description: String,
    pub state: StepState,
    pub transaction_hash: Option<String>,
    /// Unix seconds of the last state change
    pub timestamp: Option<u64>,
    pub error: Option<String>,
}

impl TransactionStep {
    fn new(id: StepId) -> Self {
        Self {
            id,
            title: id.title().to_string(),
            description: id.description().to_string(),
            state: StepState::Pending,
            transaction_hash: None,
            timestamp: None,
            error: None,
        }
    }
}

/// Ordered steps of one attempt, mutated in place
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepTracker {
    steps: Vec<TransactionStep>,
}

impl Default for StepTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl StepTracker {
    pub fn new() -> Self {
        Self {
            steps: StepId::ALL.iter().map(|id| TransactionStep::new(*id)).collect(),
        }
    }

    pub fn steps(&self) -> &[TransactionStep] {
        &self.steps
    }

    pub fn step(&self, id: StepId) -> &TransactionStep {
        &self.steps[id.index()]
    }

    /// First non-success step after the most recent success, or the first
    /// step when nothing has succeeded. `None` once every step succeeded.
    pub fn current_step(&self) -> Option<StepId> {
        let start = self
            .steps
            .iter()
            .rposition(|s| s.state == StepState::Success)
            .map_or(0, |i| i + 1);
        self.steps[start..]
            .iter()
            .find(|s| s.state != StepState::Success)
            .map(|s| s.id)
    }

    pub fn is_complete(&self) -> bool {
        self.steps.iter().all(|s| s.state == StepState::Success)
    }

    /// Step currently in error, if any
    pub fn failed_step(&self) -> Option<StepId> {
        self.steps
            .iter()
            .find(|s| s.state == StepState::Error)
            .map(|s| s.id)
    }

    /// Move `id` to loading; the previous step must have succeeded
    pub fn start(&mut self, id: StepId, now: u64) -> Result<&TransactionStep, FillError> {
        if let Some(prev) = id.index().checked_sub(1) {
            if self.steps[prev].state != StepState::Success {
                return Err(FillError::InvalidState(format!(
                    "{} cannot start before {} succeeds",
                    id, self.steps[prev].id
                )));
            }
        }
        let step = &mut self.steps[id.index()];
        if step.state != StepState::Pending {
            return Err(FillError::InvalidState(format!(
                "{} step is not pending",
                id
            )));
        }
        step.state = StepState::Loading;
        step.error = None;
        step.timestamp = Some(now);
        Ok(step)
    }

    pub fn set_transaction_hash(&mut self, id: StepId, hash: String) -> &TransactionStep {
        let step = &mut self.steps[id.index()];
        step.transaction_hash = Some(hash);
        step
    }

    pub fn succeed(&mut self, id: StepId, now: u64) -> Result<&TransactionStep, FillError> {
        let step = &mut self.steps[id.index()];
        if step.state != StepState::Loading {
            return Err(FillError::InvalidState(format!("{} step is not loading", id)));
        }
        step.state = StepState::Success;
        step.timestamp = Some(now);
        Ok(step)
    }

    pub fn fail(&mut self, id: StepId, message: String, now: u64) -> &TransactionStep {
        let step = &mut self.steps[id.index()];
        step.state = StepState::Error;
        step.error = Some(message);
        step.timestamp = Some(now);
        step
    }

    /// Return a failed step to pending so it can be re-entered
    pub fn reset(&mut self, id: StepId) -> Result<&TransactionStep, FillError> {
        let step = &mut self.steps[id.index()];
        if step.state != StepState::Error {
            return Err(FillError::InvalidState(format!("{} step has not failed", id)));
        }
        step.state = StepState::Pending;
        Ok(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let tracker = StepTracker::new();
        assert_eq!(tracker.steps().len(), 4);
        assert!(tracker.steps().iter().all(|s| s.state == StepState::Pending));
        assert_eq!(tracker.current_step(), Some(StepId::Authorize));
    }

    #[test]
    fn test_error_scenario() {
        // authorize succeeds, approve fails
        let mut tracker = StepTracker::new();
        tracker.start(StepId::Authorize, 1).unwrap();
        tracker.succeed(StepId::Authorize, 2).unwrap();
        tracker.start(StepId::Approve, 3).unwrap();
        tracker.fail(StepId::Approve, "user rejected".into(), 4);

        assert_eq!(tracker.current_step(), Some(StepId::Approve));
        assert_eq!(tracker.failed_step(), Some(StepId::Approve));
        assert_eq!(tracker.step(StepId::Execute).state, StepState::Pending);
        assert_eq!(tracker.step(StepId::Confirm).state, StepState::Pending);
        assert!(tracker.start(StepId::Execute, 5).is_err());
    }

    #[test]
    fn test_cannot_skip_ahead() {
        let mut tracker = StepTracker::new();
        assert!(matches!(
            tracker.start(StepId::Approve, 1),
            Err(FillError::InvalidState(_))
        ));
        assert_eq!(tracker.step(StepId::Approve).state, StepState::Pending);
    }

    #[test]
    fn test_retry_resets_only_failed_step() {
        let mut tracker = StepTracker::new();
        tracker.start(StepId::Authorize, 1).unwrap();
        tracker.fail(StepId::Authorize, "timeout".into(), 2);
        assert!(tracker.reset(StepId::Approve).is_err());

        tracker.reset(StepId::Authorize).unwrap();
        assert_eq!(tracker.current_step(), Some(StepId::Authorize));
        tracker.start(StepId::Authorize, 3).unwrap();
        assert_eq!(tracker.step(StepId::Authorize).error, None);
    }

    #[test]
    fn test_complete() {
        let mut tracker = StepTracker::new();
        for (t, id) in StepId::ALL.into_iter().enumerate() {
            tracker.start(id, t as u64).unwrap();
            tracker.succeed(id, t as u64).unwrap();
        }
        assert!(tracker.is_complete());
        assert_eq!(tracker.current_step(), None);
    }

    #[test]
    fn test_step_serialization() {
        let tracker = StepTracker::new();
        let json = serde_json::to_string(tracker.step(StepId::Execute)).unwrap();
        assert!(json.contains("\"id\":\"execute\""));
        assert!(json.contains("\"state\":\"pending\""));
    }
}
