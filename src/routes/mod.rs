pub mod accounts;
pub mod applications;
pub mod dashboard;
pub mod drives;
pub mod events;
pub mod health;
pub mod jobs;
pub mod notifications;
pub mod profiles;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::{middleware::auth::require_actor, AppState};

/// Full API surface. Everything except `/health` and sign-up requires a bearer token.
pub fn router(state: AppState) -> Router {
    let public_api = Router::new()
        .route("/health", get(health::health))
        .route("/api/auth/register", post(accounts::register));

    let protected_api = Router::new()
        .route("/api/auth/me", get(accounts::me))
        .route("/api/auth/pending", get(accounts::pending_users))
        .route("/api/auth/users", post(accounts::create_user))
        .route("/api/auth/users/:id", get(accounts::get_user))
        .route("/api/auth/users/:id/approve", post(accounts::approve_user))
        .route("/api/auth/users/:id/reject", post(accounts::reject_user))
        .route(
            "/api/students/profiles",
            post(profiles::create_student_profile),
        )
        .route(
            "/api/students/profiles/me",
            get(profiles::my_student_profile).patch(profiles::update_student_profile),
        )
        .route(
            "/api/students/profiles/recommendations",
            get(profiles::recommended_jobs),
        )
        .route(
            "/api/students/profiles/:id",
            get(profiles::get_student_profile),
        )
        .route("/api/companies", post(profiles::create_company))
        .route(
            "/api/companies/me",
            get(profiles::my_company).patch(profiles::update_company),
        )
        .route("/api/companies/:id", get(profiles::get_company))
        .route("/api/jobs", get(jobs::list_jobs).post(jobs::create_job))
        .route(
            "/api/jobs/:id",
            get(jobs::get_job)
                .patch(jobs::update_job)
                .delete(jobs::delete_job),
        )
        .route("/api/jobs/:id/approve", post(jobs::approve_job))
        .route("/api/jobs/:id/reject", post(jobs::reject_job))
        .route(
            "/api/applications",
            get(applications::list_applications).post(applications::apply),
        )
        .route(
            "/api/applications/:id",
            get(applications::get_application).patch(applications::update_application),
        )
        .route(
            "/api/recruitment-drives",
            get(drives::list_drives).post(drives::create_drive),
        )
        .route(
            "/api/recruitment-drives/:id",
            get(drives::get_drive)
                .patch(drives::update_drive)
                .delete(drives::delete_drive),
        )
        .route(
            "/api/recruitment-drives/:id/status",
            patch(drives::set_drive_status),
        )
        .route(
            "/api/recruitment-drives/:id/approve",
            post(drives::approve_drive),
        )
        .route(
            "/api/recruitment-drives/:id/reject",
            post(drives::reject_drive),
        )
        .route(
            "/api/events",
            get(events::list_events).post(events::create_event),
        )
        .route(
            "/api/events/registrations/me",
            get(events::my_registrations),
        )
        .route(
            "/api/events/:id",
            get(events::get_event)
                .patch(events::update_event)
                .delete(events::delete_event),
        )
        .route("/api/events/:id/status", patch(events::set_event_status))
        .route("/api/events/:id/approve", post(events::approve_event))
        .route("/api/events/:id/reject", post(events::reject_event))
        .route("/api/events/:id/register", post(events::register_for_event))
        .route(
            "/api/events/:id/registrations",
            get(events::list_event_registrations),
        )
        .route("/api/notifications", get(notifications::list_notifications))
        .route(
            "/api/notifications/unread-count",
            get(notifications::unread_count),
        )
        .route(
            "/api/notifications/read-all",
            post(notifications::mark_all_read),
        )
        .route(
            "/api/notifications/announcements",
            post(notifications::send_announcement),
        )
        .route("/api/notifications/:id/read", post(notifications::mark_read))
        .route("/api/dashboard/stats", get(dashboard::stats))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_actor,
        ));

    public_api.merge(protected_api).with_state(state)
}
