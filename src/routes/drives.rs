use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::drive_dto::{CreateDrivePayload, LifecyclePayload, UpdateDrivePayload},
    error::Result,
    models::user::Actor,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/recruitment-drives",
    request_body = CreateDrivePayload,
    responses(
        (status = 201, description = "Recruitment drive created", body = Json<RecruitmentDrive>),
        (status = 400, description = "Invalid payload or foreign job link"),
        (status = 403, description = "Caller may not schedule drives")
    )
)]
#[axum::debug_handler]
pub async fn create_drive(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<CreateDrivePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let drive = state.engine.create_drive(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(drive)))
}

#[utoipa::path(
    get,
    path = "/api/recruitment-drives",
    responses(
        (status = 200, description = "Drives visible to the caller", body = Json<Vec<RecruitmentDrive>>)
    )
)]
#[axum::debug_handler]
pub async fn list_drives(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.engine.list_drives(&actor).await?))
}

#[utoipa::path(
    get,
    path = "/api/recruitment-drives/{id}",
    params(
        ("id" = Uuid, Path, description = "Recruitment drive ID")
    ),
    responses(
        (status = 200, description = "Drive found", body = Json<RecruitmentDrive>),
        (status = 404, description = "Drive not found")
    )
)]
#[axum::debug_handler]
pub async fn get_drive(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.engine.get_drive(&actor, id).await?))
}

#[utoipa::path(
    patch,
    path = "/api/recruitment-drives/{id}",
    params(
        ("id" = Uuid, Path, description = "Recruitment drive ID")
    ),
    request_body = UpdateDrivePayload,
    responses(
        (status = 200, description = "Drive updated", body = Json<RecruitmentDrive>),
        (status = 403, description = "Caller does not own this drive")
    )
)]
#[axum::debug_handler]
pub async fn update_drive(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDrivePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    Ok(Json(state.engine.update_drive(&actor, id, payload).await?))
}

#[utoipa::path(
    patch,
    path = "/api/recruitment-drives/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Recruitment drive ID")
    ),
    request_body = LifecyclePayload,
    responses(
        (status = 200, description = "Drive status changed", body = Json<RecruitmentDrive>),
        (status = 400, description = "Rejected drives cannot be reopened")
    )
)]
#[axum::debug_handler]
pub async fn set_drive_status(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<LifecyclePayload>,
) -> Result<impl IntoResponse> {
    Ok(Json(
        state
            .engine
            .set_drive_status(&actor, id, payload.status)
            .await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/recruitment-drives/{id}",
    params(
        ("id" = Uuid, Path, description = "Recruitment drive ID")
    ),
    responses(
        (status = 204, description = "Drive deleted"),
        (status = 403, description = "Caller does not own this drive")
    )
)]
#[axum::debug_handler]
pub async fn delete_drive(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.engine.delete_drive(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/recruitment-drives/{id}/approve",
    params(
        ("id" = Uuid, Path, description = "Recruitment drive ID")
    ),
    responses(
        (status = 200, description = "Drive approved; students notified once", body = Json<RecruitmentDrive>),
        (status = 403, description = "Caller cannot approve drives")
    )
)]
#[axum::debug_handler]
pub async fn approve_drive(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.engine.approve_drive(&actor, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/recruitment-drives/{id}/reject",
    params(
        ("id" = Uuid, Path, description = "Recruitment drive ID")
    ),
    responses(
        (status = 200, description = "Drive rejected and cancelled", body = Json<RecruitmentDrive>),
        (status = 403, description = "Caller cannot reject drives")
    )
)]
#[axum::debug_handler]
pub async fn reject_drive(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.engine.reject_drive(&actor, id).await?))
}
