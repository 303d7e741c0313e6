//! Workflow engine: the approval and application state machines.
//!
//! Every public operation takes the acting [`Actor`] explicitly, opens one unit of work,
//! asks the authorization policy before touching anything, and commits once. Side
//! effects of a transition (notification fanout, audit entries) are written in the same
//! unit of work as the transition itself, so they persist together or not at all.

use std::sync::Arc;

use uuid::Uuid;

use crate::database::store::{DirectoryStore, DirectoryTx};
use crate::error::{Error, Result};
use crate::models::{
    company::Company,
    student::StudentProfile,
    user::{Actor, Role},
};
use crate::services::authorization::{authorize, Action, Resource};

mod accounts;
mod applications;
mod dashboard;
mod drives;
mod events;
mod jobs;
mod notifications;
mod profiles;

#[cfg(test)]
mod tests;

pub use dashboard::DashboardStats;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineSettings {
    /// Reject application status changes that skip or reverse pipeline stages.
    pub strict_application_transitions: bool,
}

#[derive(Clone)]
pub struct WorkflowEngine {
    store: Arc<dyn DirectoryStore>,
    settings: EngineSettings,
}

impl WorkflowEngine {
    pub fn new(store: Arc<dyn DirectoryStore>, settings: EngineSettings) -> Self {
        Self { store, settings }
    }

    pub fn settings(&self) -> EngineSettings {
        self.settings
    }

    async fn begin(&self) -> Result<Box<dyn DirectoryTx>> {
        Ok(self.store.begin().await?)
    }
}

/// Gate for mutations: a denial is reported as such.
fn ensure(actor: &Actor, action: Action, resource: &Resource) -> Result<()> {
    if authorize(actor, action, resource).is_allowed() {
        return Ok(());
    }
    tracing::warn!(
        actor_id = %actor.id,
        role = %actor.role,
        action = ?action,
        resource = resource.kind(),
        "authorization denied"
    );
    Err(Error::AuthorizationDenied(format!(
        "{} may not {:?} this {}",
        actor.role,
        action,
        resource.kind()
    )))
}

/// Gate for reads: something the actor may not see does not exist for them.
fn ensure_visible(actor: &Actor, resource: &Resource, what: &str) -> Result<()> {
    if authorize(actor, Action::Read, resource).is_allowed() {
        Ok(())
    } else {
        tracing::debug!(
            actor_id = %actor.id,
            resource = resource.kind(),
            "read hidden from actor"
        );
        Err(not_found(what))
    }
}

/// Listing endpoints are closed to accounts still awaiting approval.
fn ensure_can_browse(actor: &Actor) -> Result<()> {
    if actor.is_superuser || actor.is_approved {
        Ok(())
    } else {
        Err(Error::AuthorizationDenied(
            "account is awaiting approval".to_string(),
        ))
    }
}

fn not_found(what: &str) -> Error {
    Error::NotFound(format!("{} not found", what))
}

fn is_staff(actor: &Actor) -> bool {
    actor.is_superuser || actor.role.is_staff()
}

/// Account id of the user owning `company_id`, if any.
async fn company_owner(tx: &mut dyn DirectoryTx, company_id: Option<Uuid>) -> Result<Option<Uuid>> {
    let Some(company_id) = company_id else {
        return Ok(None);
    };
    Ok(tx.get_company(company_id).await?.map(|c| c.user_id))
}

async fn own_company(tx: &mut dyn DirectoryTx, actor: &Actor) -> Result<Company> {
    tx.company_for_user(actor.id)
        .await?
        .ok_or_else(|| not_found("Company profile"))
}

async fn own_student_profile(tx: &mut dyn DirectoryTx, actor: &Actor) -> Result<StudentProfile> {
    tx.student_profile_for_user(actor.id)
        .await?
        .ok_or_else(|| not_found("Student profile"))
}

/// The company a new listing is attached to: the actor's own for company accounts,
/// the requested one for staff.
async fn listing_company(
    tx: &mut dyn DirectoryTx,
    actor: &Actor,
    requested: Option<Uuid>,
) -> Result<Company> {
    if actor.role == Role::Company {
        return own_company(tx, actor).await;
    }
    let company_id = requested
        .ok_or_else(|| Error::ValidationFailed("company_id is required".to_string()))?;
    tx.get_company(company_id)
        .await?
        .ok_or_else(|| not_found("Company"))
}
