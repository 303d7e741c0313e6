use serde_json::json;
use uuid::Uuid;

use super::{ensure, ensure_visible, not_found, WorkflowEngine};
use crate::database::store::{DirectoryTx, StoreError, EMAIL_UNIQUE, USERNAME_UNIQUE};
use crate::dto::account_dto::{CreateUserPayload, RegisterPayload};
use crate::error::{Error, Result};
use crate::models::{
    company::NewCompany,
    student::NewStudentProfile,
    user::{Actor, NewUser, Role, User},
};
use crate::services::{
    audit_service::{self, ACTION_APPROVED, ACTION_CREATED, ACTION_REJECTED},
    authorization::{Action, Resource},
};

const ENTITY: &str = "user";

fn account_conflict(err: StoreError) -> Error {
    if err.is_conflict_on(USERNAME_UNIQUE) {
        Error::AlreadyExists("Username is already taken".to_string())
    } else if err.is_conflict_on(EMAIL_UNIQUE) {
        Error::AlreadyExists("Email is already registered".to_string())
    } else {
        err.into()
    }
}

/// Inserts the user together with the empty profile its role works through.
async fn provision(tx: &mut dyn DirectoryTx, user: NewUser) -> Result<User> {
    let user = tx.insert_user(user).await.map_err(account_conflict)?;
    match user.role {
        Role::Student => {
            tx.insert_student_profile(NewStudentProfile::placeholder(user.id))
                .await?;
        }
        Role::Company => {
            tx.insert_company(NewCompany::placeholder(user.id, &user.full_name()))
                .await?;
        }
        Role::PlacementCoordinator | Role::CollegeManagement => {}
    }
    Ok(user)
}

impl WorkflowEngine {
    /// Public sign-up. The account can only look after its own profile until staff
    /// approve it.
    pub async fn register(&self, payload: RegisterPayload) -> Result<User> {
        let mut tx = self.begin().await?;
        let user = provision(
            tx.as_mut(),
            NewUser {
                username: payload.username.trim().to_string(),
                email: payload.email.trim().to_string(),
                first_name: payload.first_name,
                last_name: payload.last_name,
                role: payload.role,
                is_superuser: false,
                is_approved: false,
            },
        )
        .await?;
        tx.commit().await?;

        tracing::info!(user_id = %user.id, role = %user.role, "account registered, awaiting approval");
        Ok(user)
    }

    /// Account creation by a superuser; the account is usable immediately.
    pub async fn create_user(&self, actor: &Actor, payload: CreateUserPayload) -> Result<User> {
        if !actor.is_superuser {
            tracing::warn!(actor_id = %actor.id, "non-superuser attempted account creation");
            return Err(Error::AuthorizationDenied(
                "only a superuser may create accounts".to_string(),
            ));
        }

        let mut tx = self.begin().await?;
        let user = provision(
            tx.as_mut(),
            NewUser {
                username: payload.username.trim().to_string(),
                email: payload.email.trim().to_string(),
                first_name: payload.first_name,
                last_name: payload.last_name,
                role: payload.role,
                is_superuser: payload.is_superuser,
                is_approved: true,
            },
        )
        .await?;
        audit_service::record(
            tx.as_mut(),
            actor,
            ACTION_CREATED,
            ENTITY,
            user.id,
            Some(json!({ "role": user.role, "is_superuser": user.is_superuser })),
        )
        .await?;
        tx.commit().await?;

        tracing::info!(actor_id = %actor.id, user_id = %user.id, role = %user.role, "account created");
        Ok(user)
    }

    pub async fn current_user(&self, actor: &Actor) -> Result<User> {
        self.get_user(actor, actor.id).await
    }

    pub async fn get_user(&self, actor: &Actor, id: Uuid) -> Result<User> {
        let mut tx = self.begin().await?;
        let user = tx.get_user(id).await?.ok_or_else(|| not_found("User"))?;
        ensure_visible(actor, &Resource::Account { user_id: user.id }, "User")?;
        Ok(user)
    }

    pub async fn pending_users(&self, actor: &Actor) -> Result<Vec<User>> {
        // Same gate as approving an arbitrary account.
        ensure(
            actor,
            Action::Approve,
            &Resource::Account { user_id: Uuid::nil() },
        )?;
        let mut tx = self.begin().await?;
        Ok(tx.pending_users().await?)
    }

    pub async fn approve_user(&self, actor: &Actor, id: Uuid) -> Result<User> {
        let mut tx = self.begin().await?;
        let user = tx.get_user(id).await?.ok_or_else(|| not_found("User"))?;
        ensure(actor, Action::Approve, &Resource::Account { user_id: user.id })?;
        if user.is_approved {
            return Ok(user);
        }

        let user = tx
            .set_user_approved(user.id)
            .await?
            .ok_or_else(|| not_found("User"))?;
        audit_service::record(
            tx.as_mut(),
            actor,
            ACTION_APPROVED,
            ENTITY,
            user.id,
            Some(json!({ "role": user.role })),
        )
        .await?;
        tx.commit().await?;

        tracing::info!(actor_id = %actor.id, user_id = %user.id, "account approved");
        Ok(user)
    }

    /// Rejecting a pending account removes it along with its profile.
    pub async fn reject_user(&self, actor: &Actor, id: Uuid) -> Result<()> {
        let mut tx = self.begin().await?;
        let user = tx.get_user(id).await?.ok_or_else(|| not_found("User"))?;
        ensure(actor, Action::Reject, &Resource::Account { user_id: user.id })?;
        if user.is_approved || user.is_superuser {
            return Err(Error::ValidationFailed(
                "only accounts awaiting approval can be rejected".to_string(),
            ));
        }

        tx.delete_user(user.id).await?;
        audit_service::record(
            tx.as_mut(),
            actor,
            ACTION_REJECTED,
            ENTITY,
            user.id,
            Some(json!({ "username": user.username, "role": user.role })),
        )
        .await?;
        tx.commit().await?;

        tracing::info!(actor_id = %actor.id, user_id = %user.id, "account rejected and removed");
        Ok(())
    }
}
