// state.rs — The changeset review state machine.
//
// The transition table is fixed:
//
//   draft ──submit──▶ pending_review ──approve──▶ approved ──apply──▶ applied
//     │                      │                       │
//     └─discard──▶ rejected   ├─reject──▶ rejected    └─revoke──▶ draft
//                             └─revert──▶ draft
//
// `applied` and `rejected` are terminal. Transitions into `rejected`
// release every file lock held by the changeset's patches.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Review lifecycle state of a changeset.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChangesetState {
    Draft,
    PendingReview,
    Approved,
    Applied,
    Rejected,
}

impl ChangesetState {
    /// Terminal states accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChangesetState::Applied | ChangesetState::Rejected)
    }
}

impl fmt::Display for ChangesetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChangesetState::Draft => "draft",
            ChangesetState::PendingReview => "pending_review",
            ChangesetState::Approved => "approved",
            ChangesetState::Applied => "applied",
            ChangesetState::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

/// An action requested against a changeset.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransitionAction {
    Submit,
    Discard,
    Approve,
    Reject,
    Revert,
    Apply,
    Revoke,
}

impl fmt::Display for TransitionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransitionAction::Submit => "submit",
            TransitionAction::Discard => "discard",
            TransitionAction::Approve => "approve",
            TransitionAction::Reject => "reject",
            TransitionAction::Revert => "revert",
            TransitionAction::Apply => "apply",
            TransitionAction::Revoke => "revoke",
        };
        f.write_str(name)
    }
}

/// The state an action leads to, or `None` when the action is not valid
/// from the given state.
pub fn next_state(from: ChangesetState, action: TransitionAction) -> Option<ChangesetState> {
    use ChangesetState::*;
    use TransitionAction::*;

    match (from, action) {
        (Draft, Submit) => Some(PendingReview),
        (Draft, Discard) => Some(Rejected),
        (PendingReview, Approve) => Some(Approved),
        (PendingReview, Reject) => Some(Rejected),
        (PendingReview, Revert) => Some(Draft),
        (Approved, Apply) => Some(Applied),
        (Approved, Revoke) => Some(Draft),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ChangesetState::*;
    use TransitionAction::*;

    #[test]
    fn happy_path_reaches_applied() {
        let mut state = Draft;
        for action in [Submit, Approve, Apply] {
            state = next_state(state, action).unwrap();
        }
        assert_eq!(state, Applied);
        assert!(state.is_terminal());
    }

    #[test]
    fn terminal_states_accept_nothing() {
        for action in [Submit, Discard, Approve, Reject, Revert, Apply, Revoke] {
            assert!(next_state(Applied, action).is_none());
            assert!(next_state(Rejected, action).is_none());
        }
    }

    #[test]
    fn revert_and_revoke_return_to_draft() {
        assert_eq!(next_state(PendingReview, Revert), Some(Draft));
        assert_eq!(next_state(Approved, Revoke), Some(Draft));
    }

    #[test]
    fn apply_requires_approved() {
        assert!(next_state(Draft, Apply).is_none());
        assert!(next_state(PendingReview, Apply).is_none());
        assert_eq!(next_state(Approved, Apply), Some(Applied));
    }

    #[test]
    fn states_serialize_snake_case() {
        assert_eq!(
            serde_json::to_string(&PendingReview).unwrap(),
            "\"pending_review\""
        );
        assert_eq!(serde_json::to_string(&Reject).unwrap(), "\"reject\"");
    }
}
