use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{EngineSettings, WorkflowEngine};
use crate::database::memory::MemoryDirectoryStore;
use crate::database::store::DirectoryStore;
use crate::dto::{
    account_dto::RegisterPayload,
    application_dto::{ApplicationListQuery, ApplyPayload, UpdateApplicationPayload},
    drive_dto::CreateDrivePayload,
    event_dto::{CreateEventPayload, EventRegistrationPayload},
    job_dto::{CreateJobPayload, JobListQuery, UpdateJobPayload},
    notification_dto::AnnouncementPayload,
    profile_dto::UpdateStudentProfilePayload,
};
use crate::error::Error;
use crate::models::{
    application::ApplicationStatus,
    approval::{ApprovalState, LifecycleStatus},
    company::NewCompany,
    event::EventType,
    job::JobType,
    notification::NotificationType,
    student::NewStudentProfile,
    user::{Actor, NewUser, Role},
};
use crate::services::workflow::DashboardStats;

struct Campus {
    store: MemoryDirectoryStore,
    engine: WorkflowEngine,
}

impl Campus {
    fn new() -> Self {
        Self::with_settings(EngineSettings::default())
    }

    fn with_settings(settings: EngineSettings) -> Self {
        let store = MemoryDirectoryStore::new();
        let engine = WorkflowEngine::new(Arc::new(store.clone()), settings);
        Self { store, engine }
    }

    async fn user(&self, name: &str, role: Role, approved: bool) -> Actor {
        let mut tx = self.store.begin().await.unwrap();
        let user = tx
            .insert_user(NewUser {
                username: name.into(),
                email: format!("{name}@campus.test"),
                first_name: name.into(),
                last_name: "Test".into(),
                role,
                is_superuser: false,
                is_approved: approved,
            })
            .await
            .unwrap();
        match role {
            Role::Student => {
                tx.insert_student_profile(NewStudentProfile::placeholder(user.id))
                    .await
                    .unwrap();
            }
            Role::Company => {
                tx.insert_company(NewCompany::placeholder(user.id, &format!("{name} Ltd")))
                    .await
                    .unwrap();
            }
            _ => {}
        }
        tx.commit().await.unwrap();
        Actor::from(&user)
    }

    async fn student(&self, name: &str) -> Actor {
        self.user(name, Role::Student, true).await
    }

    async fn company(&self, name: &str) -> Actor {
        self.user(name, Role::Company, true).await
    }

    async fn coordinator(&self) -> Actor {
        self.user("coordinator", Role::PlacementCoordinator, true)
            .await
    }

    async fn notifications_of(&self, actor: &Actor) -> Vec<NotificationType> {
        self.engine
            .list_notifications(actor)
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.notification_type)
            .collect()
    }

    /// A posting by `company`, approved by `coordinator` and open for applications.
    async fn open_job(&self, company: &Actor, coordinator: &Actor) -> Uuid {
        let job = self
            .engine
            .create_job(company, job_payload("Backend Engineer"))
            .await
            .unwrap();
        self.engine.approve_job(coordinator, job.id).await.unwrap();
        job.id
    }
}

fn job_payload(title: &str) -> CreateJobPayload {
    CreateJobPayload {
        company_id: None,
        title: title.into(),
        description: "Build and run placement services".into(),
        job_type: JobType::FullTime,
        department: "Engineering".into(),
        required_skills: vec!["Rust".into(), "SQL".into()],
        min_cgpa: None,
        salary_min: None,
        salary_max: None,
        location: "Bengaluru".into(),
        application_deadline: Utc::now() + Duration::days(30),
        is_active: true,
    }
}

fn event_payload(max_participants: Option<i32>, registration_required: bool) -> CreateEventPayload {
    CreateEventPayload {
        company_id: None,
        title: "Resume Workshop".into(),
        description: String::new(),
        event_type: EventType::Workshop,
        event_date: Utc::now() + Duration::days(7),
        location: "Seminar Hall".into(),
        venue: "Block A".into(),
        organizer: "Placement Cell".into(),
        max_participants,
        registration_required,
    }
}

fn drive_payload(title: &str) -> CreateDrivePayload {
    CreateDrivePayload {
        company_id: None,
        job_id: None,
        title: title.into(),
        description: String::new(),
        drive_date: Utc::now() + Duration::days(14),
        location: "Main Campus".into(),
        venue: "Auditorium".into(),
        coordinator_notes: None,
    }
}

fn apply_to(job_id: Uuid) -> ApplyPayload {
    ApplyPayload {
        job_id,
        cover_letter: None,
    }
}

fn status(status: ApplicationStatus) -> UpdateApplicationPayload {
    UpdateApplicationPayload {
        status: Some(status),
        ..UpdateApplicationPayload::default()
    }
}

#[tokio::test]
async fn approving_a_job_twice_notifies_students_once() {
    let campus = Campus::new();
    for name in ["asha", "ravi", "meera"] {
        campus.student(name).await;
    }
    campus.user("pending", Role::Student, false).await;
    let company = campus.company("acme").await;
    let coordinator = campus.coordinator().await;

    let job = campus
        .engine
        .create_job(&company, job_payload("Data Engineer"))
        .await
        .unwrap();
    assert_eq!(job.approval_status, ApprovalState::Pending);

    let approved = campus.engine.approve_job(&coordinator, job.id).await.unwrap();
    assert!(approved.is_approved());
    assert_eq!(campus.store.notification_count().await, 3);

    campus.engine.approve_job(&coordinator, job.id).await.unwrap();
    assert_eq!(campus.store.notification_count().await, 3);

    let approvals = campus
        .store
        .audit_entries()
        .await
        .into_iter()
        .filter(|entry| entry.action == "approved")
        .count();
    assert_eq!(approvals, 1);
}

#[tokio::test]
async fn failed_fanout_rolls_back_the_approval() {
    let campus = Campus::new();
    campus.student("asha").await;
    let company = campus.company("acme").await;
    let coordinator = campus.coordinator().await;
    let job = campus
        .engine
        .create_job(&company, job_payload("Analyst"))
        .await
        .unwrap();

    campus.store.fail_notification_writes(true);
    let err = campus
        .engine
        .approve_job(&coordinator, job.id)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Storage(_)));

    campus.store.fail_notification_writes(false);
    let job = campus.engine.get_job(&coordinator, job.id).await.unwrap();
    assert_eq!(job.approval_status, ApprovalState::Pending);
    assert_eq!(campus.store.notification_count().await, 0);
    assert!(campus.store.audit_entries().await.is_empty());
}

#[tokio::test]
async fn staff_created_jobs_skip_review_without_fanout() {
    let campus = Campus::new();
    campus.student("asha").await;
    let company = campus.company("acme").await;
    let coordinator = campus.coordinator().await;
    let company_id = campus.engine.my_company(&company).await.unwrap().id;

    let job = campus
        .engine
        .create_job(
            &coordinator,
            CreateJobPayload {
                company_id: Some(company_id),
                ..job_payload("Campus Ambassador")
            },
        )
        .await
        .unwrap();
    assert!(job.is_approved());
    assert_eq!(campus.store.notification_count().await, 0);

    let audit = campus.store.audit_entries().await;
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].action, "auto_approved");
    assert_eq!(audit[0].entity_id, job.id);
}

#[tokio::test]
async fn staff_must_name_the_company_they_post_for() {
    let campus = Campus::new();
    let coordinator = campus.coordinator().await;
    let err = campus
        .engine
        .create_job(&coordinator, job_payload("Orphan"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ValidationFailed(_)));
}

#[tokio::test]
async fn rejected_job_cannot_be_approved() {
    let campus = Campus::new();
    let company = campus.company("acme").await;
    let coordinator = campus.coordinator().await;
    let job = campus
        .engine
        .create_job(&company, job_payload("Intern"))
        .await
        .unwrap();

    let rejected = campus.engine.reject_job(&coordinator, job.id).await.unwrap();
    assert_eq!(rejected.approval_status, ApprovalState::Rejected);
    assert!(!rejected.is_active);

    let err = campus
        .engine
        .approve_job(&coordinator, job.id)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ValidationFailed(_)));
}

#[tokio::test]
async fn students_only_see_approved_active_jobs() {
    let campus = Campus::new();
    let student = campus.student("asha").await;
    let company = campus.company("acme").await;
    let coordinator = campus.coordinator().await;

    let pending = campus
        .engine
        .create_job(&company, job_payload("Pending role"))
        .await
        .unwrap();
    let open = campus.open_job(&company, &coordinator).await;
    let closed = campus.open_job(&company, &coordinator).await;
    campus
        .engine
        .update_job(
            &company,
            closed,
            UpdateJobPayload {
                is_active: Some(false),
                ..UpdateJobPayload::default()
            },
        )
        .await
        .unwrap();

    for hidden in [pending.id, closed] {
        let err = campus.engine.get_job(&student, hidden).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
    let visible = campus
        .engine
        .list_jobs(&student, JobListQuery::default())
        .await
        .unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, open);

    let own = campus
        .engine
        .list_jobs(&company, JobListQuery::default())
        .await
        .unwrap();
    assert_eq!(own.len(), 3);
}

#[tokio::test]
async fn companies_cannot_touch_each_others_postings() {
    let campus = Campus::new();
    let acme = campus.company("acme").await;
    let globex = campus.company("globex").await;
    let job = campus
        .engine
        .create_job(&acme, job_payload("SRE"))
        .await
        .unwrap();

    let err = campus
        .engine
        .update_job(
            &globex,
            job.id,
            UpdateJobPayload {
                title: Some("Hijacked".into()),
                ..UpdateJobPayload::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AuthorizationDenied(_)));

    let err = campus.engine.delete_job(&globex, job.id).await.unwrap_err();
    assert!(matches!(err, Error::AuthorizationDenied(_)));

    let err = campus.engine.approve_job(&acme, job.id).await.unwrap_err();
    assert!(matches!(err, Error::AuthorizationDenied(_)));
}

#[tokio::test]
async fn applying_notifies_the_recruiting_company_once() {
    let campus = Campus::new();
    let student = campus.student("asha").await;
    let company = campus.company("acme").await;
    let coordinator = campus.coordinator().await;
    let job_id = campus.open_job(&company, &coordinator).await;

    let app = campus.engine.apply(&student, apply_to(job_id)).await.unwrap();
    assert_eq!(app.status, ApplicationStatus::Applied);
    assert_eq!(
        campus.notifications_of(&company).await,
        vec![NotificationType::ApplicationReceived]
    );

    let err = campus
        .engine
        .apply(&student, apply_to(job_id))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AlreadyExists(_)));
    assert_eq!(campus.notifications_of(&company).await.len(), 1);
}

#[tokio::test]
async fn concurrent_duplicate_applications_create_one_row() {
    let campus = Campus::new();
    let student = campus.student("asha").await;
    let company = campus.company("acme").await;
    let coordinator = campus.coordinator().await;
    let job_id = campus.open_job(&company, &coordinator).await;

    let attempts: Vec<_> = (0..4)
        .map(|_| {
            let engine = campus.engine.clone();
            tokio::spawn(async move { engine.apply(&student, apply_to(job_id)).await })
        })
        .collect();

    let mut created = 0;
    for attempt in attempts {
        match attempt.await.unwrap() {
            Ok(_) => created += 1,
            Err(Error::AlreadyExists(_)) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(created, 1);

    let rows = campus
        .engine
        .list_applications(&coordinator, ApplicationListQuery::default())
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn applications_respect_job_state_and_deadline() {
    let campus = Campus::new();
    let student = campus.student("asha").await;
    let company = campus.company("acme").await;
    let coordinator = campus.coordinator().await;

    let pending = campus
        .engine
        .create_job(&company, job_payload("Pending"))
        .await
        .unwrap();
    let err = campus
        .engine
        .apply(&student, apply_to(pending.id))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ValidationFailed(_)));

    let expired = campus
        .engine
        .create_job(
            &company,
            CreateJobPayload {
                application_deadline: Utc::now() - Duration::days(1),
                ..job_payload("Expired")
            },
        )
        .await
        .unwrap();
    campus.engine.approve_job(&coordinator, expired.id).await.unwrap();
    let err = campus
        .engine
        .apply(&student, apply_to(expired.id))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ValidationFailed(_)));

    let err = campus
        .engine
        .apply(&student, apply_to(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn foreign_company_cannot_move_an_application() {
    let campus = Campus::new();
    let student = campus.student("asha").await;
    let acme = campus.company("acme").await;
    let globex = campus.company("globex").await;
    let coordinator = campus.coordinator().await;
    let job_id = campus.open_job(&acme, &coordinator).await;
    let app = campus.engine.apply(&student, apply_to(job_id)).await.unwrap();

    let err = campus
        .engine
        .update_application(&globex, app.id, status(ApplicationStatus::Shortlisted))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AuthorizationDenied(_)));

    let err = campus
        .engine
        .update_application(&student, app.id, status(ApplicationStatus::Offer))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AuthorizationDenied(_)));

    let err = campus
        .engine
        .get_application(&globex, app.id)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn status_changes_notify_the_student_only_when_the_status_moves() {
    let campus = Campus::new();
    let student = campus.student("asha").await;
    let company = campus.company("acme").await;
    let coordinator = campus.coordinator().await;
    let job_id = campus.open_job(&company, &coordinator).await;
    let app = campus.engine.apply(&student, apply_to(job_id)).await.unwrap();
    let before = campus.notifications_of(&student).await.len();

    campus
        .engine
        .update_application(
            &company,
            app.id,
            UpdateApplicationPayload {
                status: Some(ApplicationStatus::InterviewScheduled),
                interview_date: Some(Utc::now() + Duration::days(3)),
                interview_location: Some("Room 12".into()),
                notes: None,
            },
        )
        .await
        .unwrap();
    let latest = campus.engine.list_notifications(&student).await.unwrap();
    assert_eq!(latest.len(), before + 1);
    assert_eq!(latest[0].notification_type, NotificationType::InterviewScheduled);
    assert!(latest[0].message.contains("(Room 12)"));

    campus
        .engine
        .update_application(
            &company,
            app.id,
            UpdateApplicationPayload {
                status: Some(ApplicationStatus::InterviewScheduled),
                notes: Some("panel confirmed".into()),
                ..UpdateApplicationPayload::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(campus.notifications_of(&student).await.len(), before + 1);
}

#[tokio::test]
async fn lenient_engine_accepts_any_status_overwrite() {
    let campus = Campus::new();
    let student = campus.student("asha").await;
    let company = campus.company("acme").await;
    let coordinator = campus.coordinator().await;
    let job_id = campus.open_job(&company, &coordinator).await;
    let app = campus.engine.apply(&student, apply_to(job_id)).await.unwrap();

    let app = campus
        .engine
        .update_application(&coordinator, app.id, status(ApplicationStatus::Offer))
        .await
        .unwrap();
    assert_eq!(app.status, ApplicationStatus::Offer);
    assert_eq!(
        campus.notifications_of(&student).await[0],
        NotificationType::ApplicationStatusChanged
    );
}

#[tokio::test]
async fn strict_engine_enforces_the_pipeline() {
    let campus = Campus::with_settings(EngineSettings {
        strict_application_transitions: true,
    });
    let student = campus.student("asha").await;
    let company = campus.company("acme").await;
    let coordinator = campus.coordinator().await;
    let job_id = campus.open_job(&company, &coordinator).await;
    let app = campus.engine.apply(&student, apply_to(job_id)).await.unwrap();

    let err = campus
        .engine
        .update_application(&company, app.id, status(ApplicationStatus::Offer))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ValidationFailed(_)));

    campus
        .engine
        .update_application(&company, app.id, status(ApplicationStatus::UnderReview))
        .await
        .unwrap();
    let app = campus
        .engine
        .update_application(&company, app.id, status(ApplicationStatus::Rejected))
        .await
        .unwrap();
    assert_eq!(app.status, ApplicationStatus::Rejected);

    let err = campus
        .engine
        .update_application(&company, app.id, status(ApplicationStatus::UnderReview))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ValidationFailed(_)));
}

#[tokio::test]
async fn management_cannot_move_applications() {
    let campus = Campus::new();
    let student = campus.student("asha").await;
    let company = campus.company("acme").await;
    let coordinator = campus.coordinator().await;
    let management = campus
        .user("dean", Role::CollegeManagement, true)
        .await;
    let job_id = campus.open_job(&company, &coordinator).await;
    let app = campus.engine.apply(&student, apply_to(job_id)).await.unwrap();

    campus.engine.get_application(&management, app.id).await.unwrap();
    let err = campus
        .engine
        .update_application(&management, app.id, status(ApplicationStatus::Shortlisted))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AuthorizationDenied(_)));
}

#[tokio::test]
async fn last_seat_goes_to_exactly_one_student() {
    let campus = Campus::new();
    let coordinator = campus.coordinator().await;
    let first = campus.student("asha").await;
    let second = campus.student("ravi").await;
    let event = campus
        .engine
        .create_event(&coordinator, event_payload(Some(1), true))
        .await
        .unwrap();
    assert!(event.is_approved());

    let racers: Vec<_> = [first, second]
        .into_iter()
        .map(|student| {
            let engine = campus.engine.clone();
            tokio::spawn(async move {
                engine
                    .register_for_event(&student, event.id, EventRegistrationPayload::default())
                    .await
            })
        })
        .collect();

    let mut seated = 0;
    let mut turned_away = 0;
    for racer in racers {
        match racer.await.unwrap() {
            Ok(_) => seated += 1,
            Err(Error::EventFull(_)) => turned_away += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!((seated, turned_away), (1, 1));

    let roster = campus
        .engine
        .list_event_registrations(&coordinator, event.id)
        .await
        .unwrap();
    assert_eq!(roster.len(), 1);
}

#[tokio::test]
async fn registering_twice_is_reported_as_such() {
    let campus = Campus::new();
    let coordinator = campus.coordinator().await;
    let student = campus.student("asha").await;
    let event = campus
        .engine
        .create_event(&coordinator, event_payload(None, true))
        .await
        .unwrap();

    campus
        .engine
        .register_for_event(&student, event.id, EventRegistrationPayload::default())
        .await
        .unwrap();
    let err = campus
        .engine
        .register_for_event(&student, event.id, EventRegistrationPayload::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AlreadyRegistered(_)));
    assert_eq!(campus.engine.my_registrations(&student).await.unwrap().len(), 1);
}

#[tokio::test]
async fn events_must_be_approved_and_open_for_registration() {
    let campus = Campus::new();
    let coordinator = campus.coordinator().await;
    let company = campus.company("acme").await;
    let student = campus.student("asha").await;

    let pending = campus
        .engine
        .create_event(&company, event_payload(None, true))
        .await
        .unwrap();
    let err = campus
        .engine
        .register_for_event(&student, pending.id, EventRegistrationPayload::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ValidationFailed(_)));

    let finished = campus
        .engine
        .create_event(&coordinator, event_payload(None, true))
        .await
        .unwrap();
    campus
        .engine
        .set_event_status(&coordinator, finished.id, LifecycleStatus::Completed)
        .await
        .unwrap();
    let err = campus
        .engine
        .register_for_event(&student, finished.id, EventRegistrationPayload::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ValidationFailed(_)));
}

#[tokio::test]
async fn event_fanout_depends_on_registration() {
    let campus = Campus::new();
    let coordinator = campus.coordinator().await;
    let company = campus.company("acme").await;
    campus.student("asha").await;
    campus.student("ravi").await;

    let talk = campus
        .engine
        .create_event(&company, event_payload(None, false))
        .await
        .unwrap();
    campus.engine.approve_event(&coordinator, talk.id).await.unwrap();
    assert_eq!(campus.store.notification_count().await, 0);

    let workshop = campus
        .engine
        .create_event(&company, event_payload(Some(30), true))
        .await
        .unwrap();
    campus
        .engine
        .approve_event(&coordinator, workshop.id)
        .await
        .unwrap();
    assert_eq!(campus.store.notification_count().await, 2);

    let rejected = campus
        .engine
        .reject_event(&coordinator, workshop.id)
        .await
        .unwrap();
    assert_eq!(rejected.status, LifecycleStatus::Cancelled);
}

#[tokio::test]
async fn unapproved_accounts_only_manage_themselves() {
    let campus = Campus::new();
    let user = campus
        .engine
        .register(RegisterPayload {
            username: "newbie".into(),
            email: "newbie@campus.test".into(),
            first_name: "New".into(),
            last_name: "Student".into(),
            role: Role::Student,
        })
        .await
        .unwrap();
    assert!(!user.is_approved);
    let actor = Actor::from(&user);

    let profile = campus
        .engine
        .update_student_profile(
            &actor,
            UpdateStudentProfilePayload {
                enrollment_number: Some("CS2026-001".into()),
                skills: Some(vec!["Rust".into(), "rust".into()]),
                ..UpdateStudentProfilePayload::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(profile.skills, vec!["rust".to_string()]);

    let err = campus
        .engine
        .list_jobs(&actor, JobListQuery::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AuthorizationDenied(_)));
}

#[tokio::test]
async fn duplicate_sign_up_is_rejected() {
    let campus = Campus::new();
    let payload = RegisterPayload {
        username: "asha".into(),
        email: "asha@campus.test".into(),
        first_name: String::new(),
        last_name: String::new(),
        role: Role::Company,
    };
    campus.engine.register(payload.clone()).await.unwrap();
    let err = campus.engine.register(payload).await.unwrap_err();
    assert!(matches!(err, Error::AlreadyExists(_)));
}

#[tokio::test]
async fn rejecting_a_pending_account_removes_it() {
    let campus = Campus::new();
    let coordinator = campus.coordinator().await;
    let pending = campus.user("latecomer", Role::Student, false).await;
    let approved = campus.student("asha").await;

    let queue = campus.engine.pending_users(&coordinator).await.unwrap();
    assert_eq!(queue.len(), 1);

    let err = campus
        .engine
        .reject_user(&coordinator, approved.id)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ValidationFailed(_)));

    campus
        .engine
        .reject_user(&coordinator, pending.id)
        .await
        .unwrap();
    let err = campus
        .engine
        .get_user(&coordinator, pending.id)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    assert!(campus.engine.pending_users(&coordinator).await.unwrap().is_empty());
}

#[tokio::test]
async fn approving_an_account_opens_browsing() {
    let campus = Campus::new();
    let coordinator = campus.coordinator().await;
    let student = campus.student("asha").await;
    let pending = campus.user("latecomer", Role::Student, false).await;

    let err = campus
        .engine
        .pending_users(&student)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AuthorizationDenied(_)));

    let user = campus
        .engine
        .approve_user(&coordinator, pending.id)
        .await
        .unwrap();
    assert!(user.is_approved);
    campus
        .engine
        .list_jobs(&Actor::from(&user), JobListQuery::default())
        .await
        .unwrap();
}

#[tokio::test]
async fn announcements_reach_the_target_role() {
    let campus = Campus::new();
    let coordinator = campus.coordinator().await;
    let student = campus.student("asha").await;
    let company = campus.company("acme").await;

    let announce = |target: &str| AnnouncementPayload {
        title: "Placement week".into(),
        message: "Drives start Monday".into(),
        target_role: target.into(),
        link: None,
    };

    let sent = campus
        .engine
        .send_announcement(&coordinator, announce("company"))
        .await
        .unwrap();
    assert_eq!(sent, 1);
    assert_eq!(
        campus.notifications_of(&company).await,
        vec![NotificationType::Announcement]
    );

    let sent = campus
        .engine
        .send_announcement(&coordinator, announce("all"))
        .await
        .unwrap();
    assert_eq!(sent, 3);

    let err = campus
        .engine
        .send_announcement(&student, announce("all"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AuthorizationDenied(_)));

    let err = campus
        .engine
        .send_announcement(&coordinator, announce("alumni"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ValidationFailed(_)));
}

#[tokio::test]
async fn notifications_are_private_to_their_recipient() {
    let campus = Campus::new();
    let coordinator = campus.coordinator().await;
    let student = campus.student("asha").await;
    let other = campus.student("ravi").await;
    campus
        .engine
        .send_announcement(
            &coordinator,
            AnnouncementPayload {
                title: "Reminder".into(),
                message: "Update your resume".into(),
                target_role: "student".into(),
                link: None,
            },
        )
        .await
        .unwrap();

    let mine = campus.engine.list_notifications(&student).await.unwrap();
    assert_eq!(mine.len(), 1);
    let err = campus
        .engine
        .mark_notification_read(&other, mine[0].id)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    let read = campus
        .engine
        .mark_notification_read(&student, mine[0].id)
        .await
        .unwrap();
    assert!(read.is_read);
    assert_eq!(campus.engine.unread_notification_count(&student).await.unwrap(), 0);
    assert_eq!(campus.engine.unread_notification_count(&other).await.unwrap(), 1);
    assert_eq!(campus.engine.mark_all_notifications_read(&other).await.unwrap(), 1);
}

#[tokio::test]
async fn student_dashboard_counts_their_pipeline() {
    let campus = Campus::new();
    let student = campus.student("asha").await;
    let company = campus.company("acme").await;
    let coordinator = campus.coordinator().await;
    let first = campus.open_job(&company, &coordinator).await;
    let second = campus.open_job(&company, &coordinator).await;
    campus.engine.apply(&student, apply_to(first)).await.unwrap();
    let app = campus.engine.apply(&student, apply_to(second)).await.unwrap();
    campus
        .engine
        .update_application(&company, app.id, status(ApplicationStatus::Offer))
        .await
        .unwrap();

    let stats = campus.engine.dashboard(&student).await.unwrap();
    assert_eq!(
        stats,
        DashboardStats::Student {
            total_applications: 2,
            pending: 1,
            shortlisted: 0,
            offers: 1,
        }
    );

    match campus.engine.dashboard(&coordinator).await.unwrap() {
        DashboardStats::Coordinator {
            total_jobs,
            total_applications,
            ..
        } => {
            assert_eq!(total_jobs, 2);
            assert_eq!(total_applications, 2);
        }
        other => panic!("unexpected dashboard: {other:?}"),
    }
}

#[tokio::test]
async fn deleting_a_job_removes_its_applications() {
    let campus = Campus::new();
    let student = campus.student("asha").await;
    let company = campus.company("acme").await;
    let coordinator = campus.coordinator().await;
    let job_id = campus.open_job(&company, &coordinator).await;
    let app = campus.engine.apply(&student, apply_to(job_id)).await.unwrap();

    campus.engine.delete_job(&company, job_id).await.unwrap();
    let err = campus
        .engine
        .get_application(&student, app.id)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn approving_a_drive_twice_notifies_approved_students_once() {
    let campus = Campus::new();
    campus.student("asha").await;
    campus.student("ravi").await;
    campus.user("pending", Role::Student, false).await;
    let company = campus.company("acme").await;
    let coordinator = campus.coordinator().await;

    let drive = campus
        .engine
        .create_drive(&company, drive_payload("Acme Hiring Day"))
        .await
        .unwrap();
    assert_eq!(drive.approval_status, ApprovalState::Pending);
    assert_eq!(drive.status, LifecycleStatus::Scheduled);
    assert_eq!(campus.store.notification_count().await, 0);

    let approved = campus
        .engine
        .approve_drive(&coordinator, drive.id)
        .await
        .unwrap();
    assert_eq!(approved.approval_status, ApprovalState::Approved);
    assert_eq!(campus.store.notification_count().await, 2);

    let again = campus
        .engine
        .approve_drive(&coordinator, drive.id)
        .await
        .unwrap();
    assert_eq!(again.approval_status, ApprovalState::Approved);
    assert_eq!(campus.store.notification_count().await, 2);

    let approvals = campus
        .store
        .audit_entries()
        .await
        .into_iter()
        .filter(|entry| entry.action == "approved" && entry.entity_id == drive.id)
        .count();
    assert_eq!(approvals, 1);
}

#[tokio::test]
async fn rejected_drive_stays_cancelled() {
    let campus = Campus::new();
    campus.student("asha").await;
    let company = campus.company("acme").await;
    let coordinator = campus.coordinator().await;
    let drive = campus
        .engine
        .create_drive(&company, drive_payload("Walk-in"))
        .await
        .unwrap();

    let rejected = campus
        .engine
        .reject_drive(&coordinator, drive.id)
        .await
        .unwrap();
    assert_eq!(rejected.approval_status, ApprovalState::Rejected);
    assert_eq!(rejected.status, LifecycleStatus::Cancelled);

    let err = campus
        .engine
        .set_drive_status(&coordinator, drive.id, LifecycleStatus::Scheduled)
        .await
        .unwrap_err();
    assert!(
        matches!(&err, Error::ValidationFailed(msg) if msg == "a rejected drive cannot be reopened")
    );

    let err = campus
        .engine
        .approve_drive(&coordinator, drive.id)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ValidationFailed(_)));
    assert_eq!(campus.store.notification_count().await, 0);
}

#[tokio::test]
async fn companies_cannot_approve_their_own_drives() {
    let campus = Campus::new();
    let company = campus.company("acme").await;
    let drive = campus
        .engine
        .create_drive(&company, drive_payload("Self review"))
        .await
        .unwrap();

    let err = campus
        .engine
        .approve_drive(&company, drive.id)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AuthorizationDenied(_)));
    let unchanged = campus.engine.get_drive(&company, drive.id).await.unwrap();
    assert_eq!(unchanged.approval_status, ApprovalState::Pending);
}

#[tokio::test]
async fn drives_only_link_their_own_company_jobs() {
    let campus = Campus::new();
    let acme = campus.company("acme").await;
    let globex = campus.company("globex").await;
    let coordinator = campus.coordinator().await;
    let acme_job = campus.open_job(&acme, &coordinator).await;

    let err = campus
        .engine
        .create_drive(
            &globex,
            CreateDrivePayload {
                job_id: Some(acme_job),
                ..drive_payload("Borrowed posting")
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ValidationFailed(_)));

    let linked = campus
        .engine
        .create_drive(
            &acme,
            CreateDrivePayload {
                job_id: Some(acme_job),
                ..drive_payload("Backend drive")
            },
        )
        .await
        .unwrap();
    assert_eq!(linked.job_id, Some(acme_job));
}

#[tokio::test]
async fn superuser_listings_skip_review_whatever_their_role() {
    let campus = Campus::new();
    let owner = {
        let mut tx = campus.store.begin().await.unwrap();
        let user = tx
            .insert_user(NewUser {
                username: "root".into(),
                email: "root@campus.test".into(),
                first_name: "Root".into(),
                last_name: "Test".into(),
                role: Role::Company,
                is_superuser: true,
                is_approved: true,
            })
            .await
            .unwrap();
        tx.insert_company(NewCompany::placeholder(user.id, "Root Ltd"))
            .await
            .unwrap();
        tx.commit().await.unwrap();
        Actor::from(&user)
    };

    let job = campus
        .engine
        .create_job(&owner, job_payload("Platform Engineer"))
        .await
        .unwrap();
    assert!(job.is_approved());

    let drive = campus
        .engine
        .create_drive(&owner, drive_payload("Root drive"))
        .await
        .unwrap();
    assert_eq!(drive.approval_status, ApprovalState::Approved);

    let event = campus
        .engine
        .create_event(&owner, event_payload(None, false))
        .await
        .unwrap();
    assert_eq!(event.approval_status, ApprovalState::Approved);

    let auto = campus
        .store
        .audit_entries()
        .await
        .into_iter()
        .filter(|entry| entry.action == "auto_approved")
        .count();
    assert_eq!(auto, 3);
}

#[tokio::test]
async fn recommendations_rank_open_jobs_by_profile_fit() {
    let campus = Campus::new();
    let student = campus.student("asha").await;
    let company = campus.company("acme").await;
    let coordinator = campus.coordinator().await;
    campus
        .engine
        .update_student_profile(
            &student,
            UpdateStudentProfilePayload {
                department: Some("Computer Science Engineering".into()),
                cgpa: Some(Decimal::new(80, 1)),
                skills: Some(vec!["Rust".into(), "Python".into()]),
                ..UpdateStudentProfilePayload::default()
            },
        )
        .await
        .unwrap();

    // skills 10 + department 20
    let engineering = campus.open_job(&company, &coordinator).await;
    // skills 20 + cgpa 15
    let marketing = campus
        .engine
        .create_job(
            &company,
            CreateJobPayload {
                department: "Marketing".into(),
                required_skills: vec!["python".into(), "RUST".into()],
                min_cgpa: Some(Decimal::new(75, 1)),
                ..job_payload("Growth Analyst")
            },
        )
        .await
        .unwrap();
    campus.engine.approve_job(&coordinator, marketing.id).await.unwrap();
    let finance = campus
        .engine
        .create_job(
            &company,
            CreateJobPayload {
                department: "Finance".into(),
                required_skills: vec!["Excel".into()],
                ..job_payload("Accountant")
            },
        )
        .await
        .unwrap();
    campus.engine.approve_job(&coordinator, finance.id).await.unwrap();
    let pending = campus
        .engine
        .create_job(
            &company,
            CreateJobPayload {
                required_skills: vec!["Rust".into(), "Python".into()],
                ..job_payload("Unreviewed")
            },
        )
        .await
        .unwrap();

    let ranked = campus.engine.recommended_jobs(&student).await.unwrap();
    let ids: Vec<Uuid> = ranked.iter().map(|r| r.job.id).collect();
    assert_eq!(ids, vec![marketing.id, engineering]);
    assert_eq!(ranked[0].match_score, 35);
    assert_eq!(ranked[1].match_score, 30);
    assert!(!ids.contains(&pending.id));
    assert!(!ids.contains(&finance.id));
}

#[tokio::test]
async fn recommendations_are_capped_and_student_only() {
    let campus = Campus::new();
    let student = campus.student("asha").await;
    let company = campus.company("acme").await;
    let coordinator = campus.coordinator().await;
    campus
        .engine
        .update_student_profile(
            &student,
            UpdateStudentProfilePayload {
                skills: Some(vec!["sql".into()]),
                ..UpdateStudentProfilePayload::default()
            },
        )
        .await
        .unwrap();
    for _ in 0..12 {
        campus.open_job(&company, &coordinator).await;
    }

    let ranked = campus.engine.recommended_jobs(&student).await.unwrap();
    assert_eq!(ranked.len(), 10);
    assert!(ranked.iter().all(|r| r.match_score == 10));

    for other in [&company, &coordinator] {
        let err = campus.engine.recommended_jobs(other).await.unwrap_err();
        assert!(matches!(err, Error::AuthorizationDenied(_)));
    }
}
