//! Submission state machine for a booking form instance.

use serde::{Deserialize, Serialize};

/// State of one booking form. A form starts `Idle`, moves to `Submitting`
/// when the pipeline runs, and lands on `Succeeded` or `Failed`. Both
/// terminal states allow another submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitState {
    /// Nothing in flight; the form accepts edits and a submit.
    Idle,
    /// A submission is running; further submits are rejected.
    Submitting,
    /// The last submission completed and the form was reset.
    Succeeded,
    /// The last submission failed; entered values are retained.
    Failed,
}

impl SubmitState {
    /// Valid state transitions.
    pub fn can_transition_to(&self, target: SubmitState) -> bool {
        use SubmitState::*;
        matches!(
            (self, target),
            (Idle, Submitting)
                | (Submitting, Succeeded)
                | (Submitting, Failed)
                | (Succeeded, Submitting)
                | (Failed, Submitting)
        )
    }
}

impl std::fmt::Display for SubmitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Submitting => "submitting",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}
