use rust_decimal::Decimal;
use serde::Serialize;

use super::{ensure_can_browse, own_company, own_student_profile, WorkflowEngine};
use crate::database::store::{ApplicationFilter, ListingFilter};
use crate::error::Result;
use crate::models::{
    application::ApplicationStatus,
    user::{Actor, Role},
};

/// Landing-page counters, shaped by the role asking.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum DashboardStats {
    Student {
        total_applications: usize,
        pending: usize,
        shortlisted: usize,
        offers: usize,
    },
    Company {
        total_jobs: usize,
        active_jobs: usize,
        total_applications: usize,
        pending_review: usize,
    },
    Coordinator {
        total_students: i64,
        total_companies: i64,
        total_jobs: i64,
        active_jobs: i64,
        total_applications: i64,
        pending_approvals: i64,
    },
    Management {
        total_students: i64,
        placed_students: i64,
        /// Percentage of students holding an offer, two decimal places.
        placement_rate: Decimal,
        total_companies: i64,
        total_jobs: i64,
        total_applications: i64,
    },
}

impl WorkflowEngine {
    pub async fn dashboard(&self, actor: &Actor) -> Result<DashboardStats> {
        ensure_can_browse(actor)?;
        let mut tx = self.begin().await?;

        let role = if actor.is_superuser {
            Role::PlacementCoordinator
        } else {
            actor.role
        };
        let stats = match role {
            Role::Student => {
                let profile = own_student_profile(tx.as_mut(), actor).await?;
                let apps = tx
                    .list_applications(ApplicationFilter {
                        student_id: Some(profile.id),
                        ..ApplicationFilter::default()
                    })
                    .await?;
                let count = |f: fn(&ApplicationStatus) -> bool| {
                    apps.iter().filter(|app| f(&app.status)).count()
                };
                DashboardStats::Student {
                    total_applications: apps.len(),
                    pending: count(|s| *s == ApplicationStatus::Applied),
                    shortlisted: count(|s| *s == ApplicationStatus::Shortlisted),
                    offers: count(ApplicationStatus::is_placed),
                }
            }
            Role::Company => {
                let company = own_company(tx.as_mut(), actor).await?;
                let jobs = tx
                    .list_jobs(ListingFilter {
                        company_id: Some(company.id),
                        ..ListingFilter::default()
                    })
                    .await?;
                let apps = tx
                    .list_applications(ApplicationFilter {
                        company_id: Some(company.id),
                        ..ApplicationFilter::default()
                    })
                    .await?;
                DashboardStats::Company {
                    total_jobs: jobs.len(),
                    active_jobs: jobs.iter().filter(|job| job.is_active).count(),
                    total_applications: apps.len(),
                    pending_review: apps
                        .iter()
                        .filter(|app| {
                            matches!(
                                app.status,
                                ApplicationStatus::Applied | ApplicationStatus::UnderReview
                            )
                        })
                        .count(),
                }
            }
            Role::PlacementCoordinator => {
                let totals = tx.directory_totals().await?;
                let pending_users = tx.pending_users().await?.len() as i64;
                DashboardStats::Coordinator {
                    total_students: totals.students,
                    total_companies: totals.companies,
                    total_jobs: totals.jobs,
                    active_jobs: totals.active_jobs,
                    total_applications: totals.applications,
                    pending_approvals: totals.pending_jobs + pending_users,
                }
            }
            Role::CollegeManagement => {
                let totals = tx.directory_totals().await?;
                DashboardStats::Management {
                    total_students: totals.students,
                    placed_students: totals.placed_students,
                    placement_rate: placement_rate(totals.placed_students, totals.students),
                    total_companies: totals.companies,
                    total_jobs: totals.jobs,
                    total_applications: totals.applications,
                }
            }
        };
        Ok(stats)
    }
}

fn placement_rate(placed: i64, students: i64) -> Decimal {
    if students == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(placed) * Decimal::ONE_HUNDRED / Decimal::from(students)).round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn placement_rate_is_a_rounded_percentage() {
        assert_eq!(placement_rate(0, 0), Decimal::ZERO);
        assert_eq!(placement_rate(1, 3), Decimal::from_str("33.33").unwrap());
        assert_eq!(placement_rate(4, 4), Decimal::ONE_HUNDRED);
    }
}
