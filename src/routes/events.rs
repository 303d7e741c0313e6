use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        drive_dto::LifecyclePayload,
        event_dto::{CreateEventPayload, EventRegistrationPayload, UpdateEventPayload},
    },
    error::Result,
    models::user::Actor,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/events",
    request_body = CreateEventPayload,
    responses(
        (status = 201, description = "Event created", body = Json<CampusEvent>),
        (status = 403, description = "Caller may not organise events")
    )
)]
#[axum::debug_handler]
pub async fn create_event(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<CreateEventPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let event = state.engine.create_event(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

#[utoipa::path(
    get,
    path = "/api/events",
    responses(
        (status = 200, description = "Events visible to the caller", body = Json<Vec<CampusEvent>>)
    )
)]
#[axum::debug_handler]
pub async fn list_events(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.engine.list_events(&actor).await?))
}

#[utoipa::path(
    get,
    path = "/api/events/{id}",
    params(
        ("id" = Uuid, Path, description = "Event ID")
    ),
    responses(
        (status = 200, description = "Event found", body = Json<CampusEvent>),
        (status = 404, description = "Event not found")
    )
)]
#[axum::debug_handler]
pub async fn get_event(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.engine.get_event(&actor, id).await?))
}

#[utoipa::path(
    patch,
    path = "/api/events/{id}",
    params(
        ("id" = Uuid, Path, description = "Event ID")
    ),
    request_body = UpdateEventPayload,
    responses(
        (status = 200, description = "Event updated", body = Json<CampusEvent>),
        (status = 400, description = "Capacity below current registrations")
    )
)]
#[axum::debug_handler]
pub async fn update_event(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateEventPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    Ok(Json(state.engine.update_event(&actor, id, payload).await?))
}

#[utoipa::path(
    patch,
    path = "/api/events/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Event ID")
    ),
    request_body = LifecyclePayload,
    responses(
        (status = 200, description = "Event status changed", body = Json<CampusEvent>),
        (status = 400, description = "Rejected events cannot be reopened")
    )
)]
#[axum::debug_handler]
pub async fn set_event_status(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<LifecyclePayload>,
) -> Result<impl IntoResponse> {
    Ok(Json(
        state
            .engine
            .set_event_status(&actor, id, payload.status)
            .await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/events/{id}",
    params(
        ("id" = Uuid, Path, description = "Event ID")
    ),
    responses(
        (status = 204, description = "Event deleted")
    )
)]
#[axum::debug_handler]
pub async fn delete_event(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.engine.delete_event(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/events/{id}/approve",
    params(
        ("id" = Uuid, Path, description = "Event ID")
    ),
    responses(
        (status = 200, description = "Event approved", body = Json<CampusEvent>),
        (status = 403, description = "Caller cannot approve events")
    )
)]
#[axum::debug_handler]
pub async fn approve_event(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.engine.approve_event(&actor, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/events/{id}/reject",
    params(
        ("id" = Uuid, Path, description = "Event ID")
    ),
    responses(
        (status = 200, description = "Event rejected and cancelled", body = Json<CampusEvent>)
    )
)]
#[axum::debug_handler]
pub async fn reject_event(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.engine.reject_event(&actor, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/events/{id}/register",
    params(
        ("id" = Uuid, Path, description = "Event ID")
    ),
    request_body = EventRegistrationPayload,
    responses(
        (status = 201, description = "Seat reserved", body = Json<EventRegistration>),
        (status = 400, description = "Event not open for registration"),
        (status = 409, description = "Already registered or event full")
    )
)]
#[axum::debug_handler]
pub async fn register_for_event(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<EventRegistrationPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let registration = state.engine.register_for_event(&actor, id, payload).await?;
    Ok((StatusCode::CREATED, Json(registration)))
}

#[utoipa::path(
    get,
    path = "/api/events/{id}/registrations",
    params(
        ("id" = Uuid, Path, description = "Event ID")
    ),
    responses(
        (status = 200, description = "Registrations the caller may see", body = Json<Vec<EventRegistration>>),
        (status = 404, description = "Event not found")
    )
)]
#[axum::debug_handler]
pub async fn list_event_registrations(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.engine.list_event_registrations(&actor, id).await?))
}

#[utoipa::path(
    get,
    path = "/api/events/registrations/me",
    responses(
        (status = 200, description = "The calling student's registrations", body = Json<Vec<EventRegistration>>)
    )
)]
#[axum::debug_handler]
pub async fn my_registrations(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.engine.my_registrations(&actor).await?))
}
