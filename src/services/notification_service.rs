//! Notification fanout.
//!
//! Every workflow transition that informs users describes itself as a [`FanoutEvent`];
//! [`fanout`] resolves the audience, renders one notification per recipient and writes
//! the batch in the caller's unit of work.

use uuid::Uuid;

use crate::database::store::{NotificationWriter, StoreError};
use crate::error::{Error, Result};
use crate::models::{
    application::{Application, ApplicationStatus},
    drive::RecruitmentDrive,
    event::CampusEvent,
    job::JobPosting,
    notification::{NewNotification, NotificationType},
    user::Role,
};

const DASHBOARD_LINK: &str = "/dashboard";

/// Who receives a notification. Only approved accounts are ever addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    User(Uuid),
    Role(Role),
    Everyone,
}

impl Audience {
    pub fn approved_students() -> Self {
        Audience::Role(Role::Student)
    }

    /// Parses an announcement `target_role`: `all`, or any role name.
    pub fn from_target_role(target: &str) -> Result<Self> {
        match target {
            "all" => Ok(Audience::Everyone),
            other => other
                .parse::<Role>()
                .map(Audience::Role)
                .map_err(|e| Error::ValidationFailed(e.to_string())),
        }
    }
}

/// Rendered content of one notification, shared by every recipient of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDraft {
    pub title: String,
    pub message: String,
    pub notification_type: NotificationType,
    pub link: Option<String>,
}

impl NotificationDraft {
    fn for_recipient(&self, recipient_id: Uuid) -> NewNotification {
        NewNotification {
            recipient_id,
            title: self.title.clone(),
            message: self.message.clone(),
            notification_type: self.notification_type,
            link: self.link.clone(),
        }
    }
}

#[derive(Debug)]
pub enum FanoutEvent<'a> {
    JobApproved {
        job: &'a JobPosting,
        company_name: &'a str,
    },
    DriveApproved {
        drive: &'a RecruitmentDrive,
        company_name: &'a str,
    },
    EventApproved {
        event: &'a CampusEvent,
    },
    ApplicationSubmitted {
        job: &'a JobPosting,
        recruiter: Uuid,
        student_name: &'a str,
    },
    ApplicationStatusChanged {
        application: &'a Application,
        job: &'a JobPosting,
        company_name: &'a str,
        student: Uuid,
    },
    Announcement {
        audience: Audience,
        title: &'a str,
        message: &'a str,
        link: Option<&'a str>,
    },
}

impl FanoutEvent<'_> {
    pub fn audience(&self) -> Audience {
        match self {
            FanoutEvent::JobApproved { .. }
            | FanoutEvent::DriveApproved { .. }
            | FanoutEvent::EventApproved { .. } => Audience::approved_students(),
            FanoutEvent::ApplicationSubmitted { recruiter, .. } => Audience::User(*recruiter),
            FanoutEvent::ApplicationStatusChanged { student, .. } => Audience::User(*student),
            FanoutEvent::Announcement { audience, .. } => *audience,
        }
    }

    pub fn draft(&self) -> NotificationDraft {
        match self {
            FanoutEvent::JobApproved { job, company_name } => NotificationDraft {
                title: format!("New Job Posted: {}", job.title),
                message: format!(
                    "A new {} position has been posted by {}",
                    job.job_type.label(),
                    company_name
                ),
                notification_type: NotificationType::JobPosted,
                link: Some(DASHBOARD_LINK.to_string()),
            },
            FanoutEvent::DriveApproved {
                drive,
                company_name,
            } => NotificationDraft {
                title: format!("Recruitment Drive: {}", drive.title),
                message: format!(
                    "{} is conducting a recruitment drive on {} at {}",
                    company_name,
                    drive.drive_date.format("%Y-%m-%d"),
                    drive.location
                ),
                notification_type: NotificationType::Announcement,
                link: Some(DASHBOARD_LINK.to_string()),
            },
            FanoutEvent::EventApproved { event } => NotificationDraft {
                title: format!("New Event: {}", event.title),
                message: format!(
                    "{} is organizing {} on {} at {}. Registration required.",
                    event.organizer,
                    event.event_type.label(),
                    event.event_date.format("%Y-%m-%d"),
                    event.location
                ),
                notification_type: NotificationType::Announcement,
                link: Some(DASHBOARD_LINK.to_string()),
            },
            FanoutEvent::ApplicationSubmitted {
                job, student_name, ..
            } => NotificationDraft {
                title: format!("New Application: {}", job.title),
                message: format!("{} has applied for {}", student_name, job.title),
                notification_type: NotificationType::ApplicationReceived,
                link: None,
            },
            FanoutEvent::ApplicationStatusChanged {
                application,
                job,
                company_name,
                ..
            } => status_change_draft(application, job, company_name),
            FanoutEvent::Announcement {
                title,
                message,
                link,
                ..
            } => NotificationDraft {
                title: title.to_string(),
                message: message.to_string(),
                notification_type: NotificationType::Announcement,
                link: link.map(str::to_string),
            },
        }
    }
}

fn status_change_draft(
    application: &Application,
    job: &JobPosting,
    company_name: &str,
) -> NotificationDraft {
    if application.status != ApplicationStatus::InterviewScheduled {
        return NotificationDraft {
            title: format!("Application Status Updated: {}", job.title),
            message: format!(
                "Your application status has been updated to {}",
                application.status.label()
            ),
            notification_type: NotificationType::ApplicationStatusChanged,
            link: None,
        };
    }

    let mut message = format!(
        "Your interview has been scheduled for {} at {}",
        job.title, company_name
    );
    if let Some(date) = application.interview_date {
        message.push_str(&format!(" on {}", date.format("%Y-%m-%d %H:%M UTC")));
    }
    if let Some(location) = application
        .interview_location
        .as_deref()
        .filter(|l| !l.trim().is_empty())
    {
        message.push_str(&format!(" ({})", location));
    }
    NotificationDraft {
        title: format!("Interview Scheduled: {}", job.title),
        message,
        notification_type: NotificationType::InterviewScheduled,
        link: Some(DASHBOARD_LINK.to_string()),
    }
}

/// Resolves the audience of `event` and writes one notification per recipient.
///
/// Returns the number written. A short write is reported as a storage failure; the
/// caller's unit of work must then be abandoned so no partial batch survives.
pub async fn fanout<W>(writer: &mut W, event: &FanoutEvent<'_>) -> Result<u64>
where
    W: NotificationWriter + ?Sized,
{
    let recipients = match event.audience() {
        Audience::User(id) => vec![id],
        Audience::Role(role) => writer.approved_user_ids(Some(role)).await?,
        Audience::Everyone => writer.approved_user_ids(None).await?,
    };
    if recipients.is_empty() {
        return Ok(0);
    }

    let draft = event.draft();
    let batch: Vec<NewNotification> = recipients
        .iter()
        .map(|id| draft.for_recipient(*id))
        .collect();

    let written = writer.insert_notifications(&batch).await?;
    if written != batch.len() as u64 {
        tracing::error!(
            expected = batch.len(),
            written,
            notification_type = %draft.notification_type,
            "notification batch was short"
        );
        return Err(Error::Storage(StoreError::Unavailable(format!(
            "notification batch wrote {} of {} rows",
            written,
            batch.len()
        ))));
    }

    tracing::info!(
        recipients = written,
        notification_type = %draft.notification_type,
        "notifications fanned out"
    );
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::store::MockNotificationWriter;
    use crate::models::{approval::ApprovalState, job::JobType};
    use chrono::{TimeZone, Utc};

    fn job() -> JobPosting {
        let now = Utc::now();
        JobPosting {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            title: "Backend Engineer".into(),
            description: "Build services".into(),
            job_type: JobType::FullTime,
            department: "Engineering".into(),
            required_skills: vec!["rust".into()],
            min_cgpa: None,
            salary_min: None,
            salary_max: None,
            location: "Pune".into(),
            application_deadline: now,
            is_active: true,
            approval_status: ApprovalState::Pending,
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn application(status: ApplicationStatus) -> Application {
        let now = Utc::now();
        Application {
            id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            job_id: Uuid::new_v4(),
            status,
            cover_letter: None,
            interview_date: Some(Utc.with_ymd_and_hms(2026, 3, 14, 10, 30, 0).unwrap()),
            interview_location: Some("Room 4".into()),
            notes: None,
            applied_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn target_role_parsing() {
        assert_eq!(Audience::from_target_role("all").unwrap(), Audience::Everyone);
        assert_eq!(
            Audience::from_target_role("company").unwrap(),
            Audience::Role(Role::Company)
        );
        assert_eq!(
            Audience::from_target_role("college_management").unwrap(),
            Audience::Role(Role::CollegeManagement)
        );
        assert!(matches!(
            Audience::from_target_role("admins"),
            Err(Error::ValidationFailed(_))
        ));
    }

    #[test]
    fn interview_notification_carries_date_and_location() {
        let job = job();
        let app = application(ApplicationStatus::InterviewScheduled);
        let draft = FanoutEvent::ApplicationStatusChanged {
            application: &app,
            job: &job,
            company_name: "Acme",
            student: Uuid::new_v4(),
        }
        .draft();
        assert_eq!(draft.notification_type, NotificationType::InterviewScheduled);
        assert_eq!(draft.title, "Interview Scheduled: Backend Engineer");
        assert!(draft.message.contains("2026-03-14 10:30"));
        assert!(draft.message.contains("Room 4"));
    }

    #[test]
    fn other_status_changes_use_the_label() {
        let job = job();
        let app = application(ApplicationStatus::Offer);
        let draft = FanoutEvent::ApplicationStatusChanged {
            application: &app,
            job: &job,
            company_name: "Acme",
            student: Uuid::new_v4(),
        }
        .draft();
        assert_eq!(
            draft.notification_type,
            NotificationType::ApplicationStatusChanged
        );
        assert_eq!(
            draft.message,
            "Your application status has been updated to Offer Extended"
        );
    }

    #[tokio::test]
    async fn job_approval_notifies_every_approved_student() {
        let students = vec![Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
        let job = job();

        let mut writer = MockNotificationWriter::new();
        let ids = students.clone();
        writer
            .expect_approved_user_ids()
            .withf(|role| *role == Some(Role::Student))
            .times(1)
            .returning(move |_| Ok(ids.clone()));
        let expected = students.clone();
        writer
            .expect_insert_notifications()
            .times(1)
            .returning(move |batch| {
                let recipients: Vec<Uuid> = batch.iter().map(|n| n.recipient_id).collect();
                assert_eq!(recipients, expected);
                assert!(batch
                    .iter()
                    .all(|n| n.notification_type == NotificationType::JobPosted));
                Ok(batch.len() as u64)
            });

        let sent = fanout(
            &mut writer,
            &FanoutEvent::JobApproved {
                job: &job,
                company_name: "Acme",
            },
        )
        .await
        .unwrap();
        assert_eq!(sent, 3);
    }

    #[tokio::test]
    async fn single_recipient_skips_the_directory_lookup() {
        let recruiter = Uuid::new_v4();
        let job = job();

        let mut writer = MockNotificationWriter::new();
        writer.expect_approved_user_ids().never();
        writer
            .expect_insert_notifications()
            .times(1)
            .returning(move |batch| {
                assert_eq!(batch.len(), 1);
                assert_eq!(batch[0].recipient_id, recruiter);
                assert_eq!(batch[0].message, "Asha Rao has applied for Backend Engineer");
                Ok(1)
            });

        let sent = fanout(
            &mut writer,
            &FanoutEvent::ApplicationSubmitted {
                job: &job,
                recruiter,
                student_name: "Asha Rao",
            },
        )
        .await
        .unwrap();
        assert_eq!(sent, 1);
    }

    #[tokio::test]
    async fn empty_audience_writes_nothing() {
        let mut writer = MockNotificationWriter::new();
        writer
            .expect_approved_user_ids()
            .returning(|_| Ok(Vec::new()));
        writer.expect_insert_notifications().never();

        let sent = fanout(
            &mut writer,
            &FanoutEvent::Announcement {
                audience: Audience::Everyone,
                title: "Hello",
                message: "World",
                link: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(sent, 0);
    }

    #[tokio::test]
    async fn short_batch_is_an_error() {
        let mut writer = MockNotificationWriter::new();
        writer
            .expect_approved_user_ids()
            .returning(|_| Ok(vec![Uuid::new_v4(), Uuid::new_v4()]));
        writer.expect_insert_notifications().returning(|_| Ok(1));

        let err = fanout(
            &mut writer,
            &FanoutEvent::Announcement {
                audience: Audience::Role(Role::Company),
                title: "Hello",
                message: "World",
                link: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }

    #[tokio::test]
    async fn writer_failure_propagates() {
        let mut writer = MockNotificationWriter::new();
        writer
            .expect_approved_user_ids()
            .returning(|_| Ok(vec![Uuid::new_v4()]));
        writer
            .expect_insert_notifications()
            .returning(|_| Err(StoreError::Unavailable("down".into())));

        let err = fanout(
            &mut writer,
            &FanoutEvent::Announcement {
                audience: Audience::Everyone,
                title: "Hello",
                message: "World",
                link: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }
}
