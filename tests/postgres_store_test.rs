use std::env;
use std::sync::Arc;

use chrono::{Duration, Utc};
use placement_backend::{
    database::{pool::run_migrations, postgres::PgDirectoryStore, store::DirectoryStore},
    dto::{application_dto::ApplyPayload, job_dto::CreateJobPayload},
    error::Error,
    models::{
        company::NewCompany,
        job::JobType,
        student::NewStudentProfile,
        user::{Actor, NewUser, Role},
    },
    services::workflow::{EngineSettings, WorkflowEngine},
};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

async fn account(store: &PgDirectoryStore, role: Role) -> Actor {
    let tag = Uuid::new_v4().simple().to_string();
    let mut tx = store.begin().await.expect("begin");
    let user = tx
        .insert_user(NewUser {
            username: format!("pg_{tag}"),
            email: format!("pg_{tag}@campus.test"),
            first_name: "Pg".to_string(),
            last_name: "Tester".to_string(),
            role,
            is_superuser: false,
            is_approved: true,
        })
        .await
        .expect("insert user");
    match role {
        Role::Student => {
            tx.insert_student_profile(NewStudentProfile::placeholder(user.id))
                .await
                .expect("student profile");
        }
        Role::Company => {
            tx.insert_company(NewCompany::placeholder(user.id, &format!("Pg {tag}")))
                .await
                .expect("company");
        }
        _ => {}
    }
    tx.commit().await.expect("commit");
    Actor::from(&user)
}

#[tokio::test]
#[ignore = "requires DATABASE_URL pointing at a disposable Postgres database"]
async fn postgres_store_end_to_end() {
    dotenvy::dotenv().ok();
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("pool");
    run_migrations(&pool).await.expect("migrations");

    let store = PgDirectoryStore::new(pool);
    let company = account(&store, Role::Company).await;
    let coordinator = account(&store, Role::PlacementCoordinator).await;
    let student = account(&store, Role::Student).await;
    let engine = WorkflowEngine::new(Arc::new(store.clone()), EngineSettings::default());

    let job = engine
        .create_job(
            &company,
            CreateJobPayload {
                company_id: None,
                title: "Data Engineer".to_string(),
                description: "Pipelines".to_string(),
                job_type: JobType::FullTime,
                department: "Data".to_string(),
                required_skills: vec!["sql".to_string()],
                min_cgpa: None,
                salary_min: None,
                salary_max: None,
                location: "Pune".to_string(),
                application_deadline: Utc::now() + Duration::days(7),
                is_active: true,
            },
        )
        .await
        .expect("create job");

    engine.approve_job(&coordinator, job.id).await.expect("approve");
    let unread_after_first = engine
        .unread_notification_count(&student)
        .await
        .expect("count");
    engine
        .approve_job(&coordinator, job.id)
        .await
        .expect("approve again");
    let unread_after_second = engine
        .unread_notification_count(&student)
        .await
        .expect("count");
    assert_eq!(unread_after_first, unread_after_second);
    assert!(unread_after_first >= 1);

    let apply = || ApplyPayload {
        job_id: job.id,
        cover_letter: None,
    };
    let (first, second) = tokio::join!(
        engine.apply(&student, apply()),
        engine.apply(&student, apply())
    );
    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .any(|r| matches!(r, Err(Error::AlreadyExists(_)))));

    engine.delete_job(&company, job.id).await.expect("delete job");
}
