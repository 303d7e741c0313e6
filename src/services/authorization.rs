//! Role-based access policy.
//!
//! [`authorize`] is a pure function of the actor, the action and a description of the
//! target resource. Callers load whatever the description needs (owner ids, approval
//! state) before asking, and must ask before mutating.

use uuid::Uuid;

use crate::models::{
    approval::ApprovalState,
    user::{Actor, Role},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
    Approve,
    Reject,
    /// Moving an application through the recruitment pipeline.
    ChangeStatus,
    MarkRead,
    Broadcast,
}

/// Ownership and visibility facts of a job posting, drive or event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingScope {
    /// User id of the owning company's account, if the listing belongs to a company.
    pub owner: Option<Uuid>,
    pub approval: ApprovalState,
    /// Always true for drives and events.
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Account { user_id: Uuid },
    StudentProfile { owner: Uuid },
    Company { owner: Uuid },
    JobPosting(ListingScope),
    RecruitmentDrive(ListingScope),
    CampusEvent(ListingScope),
    /// `student` and `recruiter` are user ids: the applicant and the account owning the
    /// job's company.
    Application { student: Uuid, recruiter: Option<Uuid> },
    EventRegistration { student: Uuid },
    Notification { recipient: Uuid },
    Announcement,
}

impl Resource {
    pub fn kind(&self) -> &'static str {
        match self {
            Resource::Account { .. } => "account",
            Resource::StudentProfile { .. } => "student_profile",
            Resource::Company { .. } => "company",
            Resource::JobPosting(_) => "job_posting",
            Resource::RecruitmentDrive(_) => "recruitment_drive",
            Resource::CampusEvent(_) => "campus_event",
            Resource::Application { .. } => "application",
            Resource::EventRegistration { .. } => "event_registration",
            Resource::Notification { .. } => "notification",
            Resource::Announcement => "announcement",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }
}

impl From<bool> for Decision {
    fn from(allowed: bool) -> Self {
        if allowed {
            Decision::Allow
        } else {
            Decision::Deny
        }
    }
}

pub fn authorize(actor: &Actor, action: Action, resource: &Resource) -> Decision {
    if actor.is_superuser {
        return Decision::Allow;
    }
    if !actor.is_approved {
        return unapproved(actor, action, resource).into();
    }
    match actor.role {
        Role::Student => student(actor, action, resource),
        Role::Company => company(actor, action, resource),
        Role::PlacementCoordinator | Role::CollegeManagement => staff(actor, action, resource),
    }
    .into()
}

/// Accounts awaiting approval may only look after themselves.
fn unapproved(actor: &Actor, action: Action, resource: &Resource) -> bool {
    match (action, resource) {
        (Action::Read, Resource::Account { user_id }) => *user_id == actor.id,
        (Action::Read | Action::MarkRead, Resource::Notification { recipient }) => {
            *recipient == actor.id
        }
        (
            Action::Create | Action::Read | Action::Update,
            Resource::StudentProfile { owner },
        ) => actor.role == Role::Student && *owner == actor.id,
        (Action::Create | Action::Read | Action::Update, Resource::Company { owner }) => {
            actor.role == Role::Company && *owner == actor.id
        }
        _ => false,
    }
}

fn common(actor: &Actor, action: Action, resource: &Resource) -> Option<bool> {
    match (action, resource) {
        (Action::Read, Resource::Account { user_id }) if *user_id == actor.id => Some(true),
        (Action::Read | Action::MarkRead, Resource::Notification { recipient }) => {
            Some(*recipient == actor.id)
        }
        _ => None,
    }
}

fn student(actor: &Actor, action: Action, resource: &Resource) -> bool {
    if let Some(allowed) = common(actor, action, resource) {
        return allowed;
    }
    match (action, resource) {
        (
            Action::Create | Action::Read | Action::Update,
            Resource::StudentProfile { owner },
        ) => *owner == actor.id,
        (Action::Read, Resource::Company { .. }) => true,
        (Action::Read, Resource::JobPosting(scope)) => scope.approval.is_approved() && scope.active,
        (Action::Read, Resource::RecruitmentDrive(scope) | Resource::CampusEvent(scope)) => {
            scope.approval.is_approved()
        }
        (Action::Create | Action::Read, Resource::Application { student, .. }) => {
            *student == actor.id
        }
        (Action::Create | Action::Read, Resource::EventRegistration { student }) => {
            *student == actor.id
        }
        _ => false,
    }
}

fn company(actor: &Actor, action: Action, resource: &Resource) -> bool {
    if let Some(allowed) = common(actor, action, resource) {
        return allowed;
    }
    match (action, resource) {
        (Action::Create | Action::Read | Action::Update, Resource::Company { owner }) => {
            *owner == actor.id
        }
        (Action::Read, Resource::StudentProfile { .. }) => true,
        (
            Action::Create | Action::Read | Action::Update | Action::Delete,
            Resource::JobPosting(scope)
            | Resource::RecruitmentDrive(scope)
            | Resource::CampusEvent(scope),
        ) => scope.owner == Some(actor.id),
        (Action::Read | Action::ChangeStatus, Resource::Application { recruiter, .. }) => {
            *recruiter == Some(actor.id)
        }
        _ => false,
    }
}

fn staff(actor: &Actor, action: Action, resource: &Resource) -> bool {
    if let Some(allowed) = common(actor, action, resource) {
        return allowed;
    }
    match (action, resource) {
        (Action::Read, _) => true,
        (
            Action::Create
            | Action::Update
            | Action::Delete
            | Action::Approve
            | Action::Reject,
            Resource::JobPosting(_) | Resource::RecruitmentDrive(_) | Resource::CampusEvent(_),
        ) => true,
        (Action::Approve | Action::Reject, Resource::Account { .. }) => true,
        (Action::ChangeStatus, Resource::Application { .. }) => {
            actor.role == Role::PlacementCoordinator
        }
        (Action::Broadcast, Resource::Announcement) => true,
        _ => false,
    }
}
