//! Approval lifecycle shared by job postings, recruitment drives and campus events.

string_enum! {
    pub enum ApprovalState ("approval status") {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
    }
}

/// Outcome of applying an approval action to a stored state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalTransition {
    /// The state moved; side effects (fanout, audit) must run.
    Changed { from: ApprovalState, to: ApprovalState },
    /// Already in the target state; nothing to do.
    Unchanged,
}

impl ApprovalTransition {
    pub fn changed(&self) -> bool {
        matches!(self, ApprovalTransition::Changed { .. })
    }
}

/// Raised for an approval action that has no edge from the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot {action} a {from} resource")]
pub struct InvalidApproval {
    pub action: &'static str,
    pub from: ApprovalState,
}

impl ApprovalState {
    pub fn is_approved(&self) -> bool {
        matches!(self, ApprovalState::Approved)
    }

    /// Initial state for a newly created resource. Staff creations skip review.
    pub fn initial(auto_approve: bool) -> Self {
        if auto_approve {
            ApprovalState::Approved
        } else {
            ApprovalState::Pending
        }
    }

    /// pending -> approved. Approving twice is a no-op; a rejected resource stays rejected.
    pub fn approve(self) -> Result<ApprovalTransition, InvalidApproval> {
        match self {
            ApprovalState::Pending => Ok(ApprovalTransition::Changed {
                from: self,
                to: ApprovalState::Approved,
            }),
            ApprovalState::Approved => Ok(ApprovalTransition::Unchanged),
            ApprovalState::Rejected => Err(InvalidApproval {
                action: "approve",
                from: self,
            }),
        }
    }

    /// pending | approved -> rejected. Rejecting twice is a no-op.
    pub fn reject(self) -> ApprovalTransition {
        match self {
            ApprovalState::Rejected => ApprovalTransition::Unchanged,
            from => ApprovalTransition::Changed {
                from,
                to: ApprovalState::Rejected,
            },
        }
    }
}

string_enum! {
    /// Operational status of a drive or event, independent of approval.
    pub enum LifecycleStatus ("lifecycle status") {
        Scheduled => "scheduled",
        Ongoing => "ongoing",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

impl LifecycleStatus {
    pub fn is_open(&self) -> bool {
        matches!(self, LifecycleStatus::Scheduled | LifecycleStatus::Ongoing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approve_moves_pending_once() {
        let first = ApprovalState::Pending.approve().unwrap();
        assert_eq!(
            first,
            ApprovalTransition::Changed {
                from: ApprovalState::Pending,
                to: ApprovalState::Approved
            }
        );
        assert_eq!(
            ApprovalState::Approved.approve().unwrap(),
            ApprovalTransition::Unchanged
        );
    }

    #[test]
    fn rejected_cannot_be_approved() {
        let err = ApprovalState::Rejected.approve().unwrap_err();
        assert_eq!(err.from, ApprovalState::Rejected);
        assert_eq!(err.to_string(), "cannot approve a rejected resource");
    }

    #[test]
    fn reject_accepts_pending_and_approved() {
        assert!(ApprovalState::Pending.reject().changed());
        assert!(ApprovalState::Approved.reject().changed());
        assert!(!ApprovalState::Rejected.reject().changed());
    }

    #[test]
    fn staff_creations_start_approved() {
        assert_eq!(ApprovalState::initial(true), ApprovalState::Approved);
        assert_eq!(ApprovalState::initial(false), ApprovalState::Pending);
    }
}
