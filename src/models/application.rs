use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

string_enum! {
    pub enum ApplicationStatus ("application status") {
        Applied => "applied",
        UnderReview => "under_review",
        Shortlisted => "shortlisted",
        InterviewScheduled => "interview_scheduled",
        Rejected => "rejected",
        Offer => "offer",
        Accepted => "accepted",
        Declined => "declined",
    }
}

impl ApplicationStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "Applied",
            ApplicationStatus::UnderReview => "Under Review",
            ApplicationStatus::Shortlisted => "Shortlisted",
            ApplicationStatus::InterviewScheduled => "Interview Scheduled",
            ApplicationStatus::Rejected => "Rejected",
            ApplicationStatus::Offer => "Offer Extended",
            ApplicationStatus::Accepted => "Offer Accepted",
            ApplicationStatus::Declined => "Offer Declined",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::Accepted | ApplicationStatus::Declined | ApplicationStatus::Rejected
        )
    }

    /// Counts toward placement statistics.
    pub fn is_placed(&self) -> bool {
        matches!(self, ApplicationStatus::Offer | ApplicationStatus::Accepted)
    }

    /// Forward edges of the recruitment pipeline. `rejected` is reachable from any
    /// non-terminal state.
    pub fn can_transition_to(&self, next: ApplicationStatus) -> bool {
        use ApplicationStatus::*;
        if self.is_terminal() {
            return false;
        }
        if next == Rejected {
            return true;
        }
        matches!(
            (self, next),
            (Applied, UnderReview)
                | (UnderReview, Shortlisted)
                | (Shortlisted, InterviewScheduled)
                | (InterviewScheduled, Offer)
                | (Offer, Accepted)
                | (Offer, Declined)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Application {
    pub id: Uuid,
    pub student_id: Uuid,
    pub job_id: Uuid,
    pub status: ApplicationStatus,
    pub cover_letter: Option<String>,
    pub interview_date: Option<DateTime<Utc>>,
    pub interview_location: Option<String>,
    pub notes: Option<String>,
    pub applied_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewApplication {
    pub student_id: Uuid,
    pub job_id: Uuid,
    pub cover_letter: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::ApplicationStatus::*;

    #[test]
    fn pipeline_moves_forward_only() {
        assert!(Applied.can_transition_to(UnderReview));
        assert!(UnderReview.can_transition_to(Shortlisted));
        assert!(Shortlisted.can_transition_to(InterviewScheduled));
        assert!(InterviewScheduled.can_transition_to(Offer));
        assert!(Offer.can_transition_to(Accepted));
        assert!(Offer.can_transition_to(Declined));

        assert!(!Shortlisted.can_transition_to(Applied));
        assert!(!Applied.can_transition_to(Offer));
        assert!(!UnderReview.can_transition_to(Accepted));
    }

    #[test]
    fn rejection_is_open_until_terminal() {
        for status in [Applied, UnderReview, Shortlisted, InterviewScheduled, Offer] {
            assert!(status.can_transition_to(Rejected), "{status}");
        }
        for status in [Accepted, Declined, Rejected] {
            assert!(status.is_terminal());
            assert!(!status.can_transition_to(Rejected));
            assert!(!status.can_transition_to(UnderReview));
        }
    }
}
