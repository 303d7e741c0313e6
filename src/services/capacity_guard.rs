//! Uniqueness and seat-capacity checks for applications and event registrations.
//!
//! Both reservations run inside the caller's unit of work. The existence checks give a
//! clean error in the common case; the store's unique constraints decide the race.

use crate::database::store::{DirectoryTx, APPLICATION_UNIQUE, REGISTRATION_UNIQUE};
use crate::error::{Error, Result};
use crate::models::{
    application::{Application, NewApplication},
    event::{CampusEvent, EventRegistration, NewEventRegistration},
};

pub async fn reserve_application_slot(
    tx: &mut dyn DirectoryTx,
    application: NewApplication,
) -> Result<Application> {
    if tx
        .application_exists(application.student_id, application.job_id)
        .await?
    {
        return Err(already_applied());
    }
    match tx.insert_application(application).await {
        Ok(row) => Ok(row),
        Err(err) if err.is_conflict_on(APPLICATION_UNIQUE) => Err(already_applied()),
        Err(err) => Err(err.into()),
    }
}

/// `event` must have been read with [`DirectoryTx::lock_event`] in this unit of work, so
/// the seat count cannot move between the check and the insert.
pub async fn reserve_event_seat(
    tx: &mut dyn DirectoryTx,
    event: &CampusEvent,
    registration: NewEventRegistration,
) -> Result<EventRegistration> {
    if tx
        .registration_exists(registration.student_id, event.id)
        .await?
    {
        return Err(already_registered());
    }

    let registered = tx.count_registrations(event.id).await?;
    if !event.has_seat_for(registered) {
        return Err(Error::EventFull(format!(
            "{} has no seats left ({} of {} taken)",
            event.title,
            registered,
            event.max_participants.unwrap_or_default()
        )));
    }

    match tx.insert_registration(registration).await {
        Ok(row) => Ok(row),
        Err(err) if err.is_conflict_on(REGISTRATION_UNIQUE) => Err(already_registered()),
        Err(err) => Err(err.into()),
    }
}

fn already_applied() -> Error {
    Error::AlreadyExists("Already applied to this job".to_string())
}

fn already_registered() -> Error {
    Error::AlreadyRegistered("Already registered for this event".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::MemoryDirectoryStore;
    use crate::database::store::DirectoryStore;
    use crate::models::{
        approval::ApprovalState,
        event::{EventType, NewCampusEvent},
        student::NewStudentProfile,
        user::{NewUser, Role},
    };
    use chrono::Utc;
    use uuid::Uuid;

    async fn student(tx: &mut dyn DirectoryTx, name: &str) -> Uuid {
        let user = tx
            .insert_user(NewUser {
                username: name.into(),
                email: format!("{name}@campus.test"),
                first_name: name.into(),
                last_name: String::new(),
                role: Role::Student,
                is_superuser: false,
                is_approved: true,
            })
            .await
            .unwrap();
        tx.insert_student_profile(NewStudentProfile::placeholder(user.id))
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn second_seat_request_for_the_same_student_is_rejected() {
        let store = MemoryDirectoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let student_id = student(tx.as_mut(), "asha").await;
        let event = tx
            .insert_event(NewCampusEvent {
                company_id: None,
                title: "Resume Clinic".into(),
                description: String::new(),
                event_type: EventType::Workshop,
                event_date: Utc::now(),
                location: "Library".into(),
                venue: "L2".into(),
                organizer: "Placement Cell".into(),
                max_participants: Some(5),
                registration_required: true,
                approval_status: ApprovalState::Approved,
                created_by: None,
            })
            .await
            .unwrap();

        let reg = || NewEventRegistration {
            event_id: event.id,
            student_id,
            notes: None,
        };
        reserve_event_seat(tx.as_mut(), &event, reg()).await.unwrap();
        let err = reserve_event_seat(tx.as_mut(), &event, reg())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyRegistered(_)));
    }

    #[tokio::test]
    async fn full_event_turns_students_away() {
        let store = MemoryDirectoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let first = student(tx.as_mut(), "asha").await;
        let second = student(tx.as_mut(), "ravi").await;
        let event = tx
            .insert_event(NewCampusEvent {
                company_id: None,
                title: "Mock Interviews".into(),
                description: String::new(),
                event_type: EventType::Other,
                event_date: Utc::now(),
                location: "Hall".into(),
                venue: "H1".into(),
                organizer: "Placement Cell".into(),
                max_participants: Some(1),
                registration_required: true,
                approval_status: ApprovalState::Approved,
                created_by: None,
            })
            .await
            .unwrap();

        let reg = |student_id| NewEventRegistration {
            event_id: event.id,
            student_id,
            notes: None,
        };
        reserve_event_seat(tx.as_mut(), &event, reg(first)).await.unwrap();
        let err = reserve_event_seat(tx.as_mut(), &event, reg(second))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::EventFull(_)));
        assert_eq!(tx.count_registrations(event.id).await.unwrap(), 1);
    }
}
