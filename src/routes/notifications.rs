use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::notification_dto::{
        AnnouncementPayload, AnnouncementResponse, MarkAllReadResponse, UnreadCountResponse,
    },
    error::Result,
    models::user::Actor,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/notifications",
    responses(
        (status = 200, description = "The caller's notifications, newest first", body = Json<Vec<Notification>>)
    )
)]
#[axum::debug_handler]
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.engine.list_notifications(&actor).await?))
}

#[utoipa::path(
    get,
    path = "/api/notifications/unread-count",
    responses(
        (status = 200, description = "Number of unread notifications", body = Json<UnreadCountResponse>)
    )
)]
#[axum::debug_handler]
pub async fn unread_count(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse> {
    let unread_count = state.engine.unread_notification_count(&actor).await?;
    Ok(Json(UnreadCountResponse { unread_count }))
}

#[utoipa::path(
    post,
    path = "/api/notifications/{id}/read",
    params(
        ("id" = Uuid, Path, description = "Notification ID")
    ),
    responses(
        (status = 200, description = "Notification marked read", body = Json<Notification>),
        (status = 404, description = "Notification not found")
    )
)]
#[axum::debug_handler]
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.engine.mark_notification_read(&actor, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/notifications/read-all",
    responses(
        (status = 200, description = "All notifications marked read", body = Json<MarkAllReadResponse>)
    )
)]
#[axum::debug_handler]
pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse> {
    let updated = state.engine.mark_all_notifications_read(&actor).await?;
    Ok(Json(MarkAllReadResponse { updated }))
}

#[utoipa::path(
    post,
    path = "/api/notifications/announcements",
    request_body = AnnouncementPayload,
    responses(
        (status = 201, description = "Announcement delivered", body = Json<AnnouncementResponse>),
        (status = 400, description = "Unknown target role"),
        (status = 403, description = "Caller cannot broadcast")
    )
)]
#[axum::debug_handler]
pub async fn send_announcement(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<AnnouncementPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let sent_count = state.engine.send_announcement(&actor, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(AnnouncementResponse {
            message: format!("Announcement sent to {} users", sent_count),
            sent_count,
        }),
    ))
}
