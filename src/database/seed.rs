//! Demo accounts for local runs.

use crate::database::store::DirectoryStore;
use crate::error::Result;
use crate::models::{
    company::NewCompany,
    student::NewStudentProfile,
    user::{NewUser, Role},
};

struct DemoAccount {
    username: &'static str,
    first_name: &'static str,
    last_name: &'static str,
    role: Role,
    is_superuser: bool,
}

const DEMO_ACCOUNTS: &[DemoAccount] = &[
    DemoAccount {
        username: "student1",
        first_name: "Asha",
        last_name: "Rao",
        role: Role::Student,
        is_superuser: false,
    },
    DemoAccount {
        username: "company1",
        first_name: "Tech",
        last_name: "Corp",
        role: Role::Company,
        is_superuser: false,
    },
    DemoAccount {
        username: "coordinator",
        first_name: "Placement",
        last_name: "Coordinator",
        role: Role::PlacementCoordinator,
        is_superuser: false,
    },
    DemoAccount {
        username: "management",
        first_name: "College",
        last_name: "Management",
        role: Role::CollegeManagement,
        is_superuser: false,
    },
    DemoAccount {
        username: "admin",
        first_name: "System",
        last_name: "Admin",
        role: Role::CollegeManagement,
        is_superuser: true,
    },
];

/// Creates one approved account per role, with profiles, when the directory is empty.
/// Returns the number of accounts created.
pub async fn seed_demo_users(store: &dyn DirectoryStore) -> Result<usize> {
    let mut tx = store.begin().await?;
    if tx.count_users().await? > 0 {
        tracing::info!("directory already has users, skipping demo seed");
        return Ok(0);
    }

    for account in DEMO_ACCOUNTS {
        let user = tx
            .insert_user(NewUser {
                username: account.username.to_string(),
                email: format!("{}@placement.local", account.username),
                first_name: account.first_name.to_string(),
                last_name: account.last_name.to_string(),
                role: account.role,
                is_superuser: account.is_superuser,
                is_approved: true,
            })
            .await?;
        match account.role {
            Role::Student => {
                let mut profile = NewStudentProfile::placeholder(user.id);
                profile.enrollment_number = "DEMO-0001".to_string();
                profile.department = "Computer Science".to_string();
                profile.course = "B.Tech".to_string();
                profile.year = 4;
                profile.skills = vec!["rust".to_string(), "sql".to_string()];
                tx.insert_student_profile(profile).await?;
            }
            Role::Company => {
                let mut company = NewCompany::placeholder(user.id, "Tech Corp");
                company.industry = "Software".to_string();
                tx.insert_company(company).await?;
            }
            Role::PlacementCoordinator | Role::CollegeManagement => {}
        }
        tracing::info!(username = account.username, role = %account.role, "demo account created");
    }
    tx.commit().await?;
    Ok(DEMO_ACCOUNTS.len())
}
