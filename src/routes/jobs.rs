use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::job_dto::{CreateJobPayload, JobListQuery, JobResponse, UpdateJobPayload},
    error::Result,
    models::user::Actor,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/jobs",
    request_body = CreateJobPayload,
    responses(
        (status = 201, description = "Job posting created", body = Json<JobResponse>),
        (status = 400, description = "Invalid payload"),
        (status = 403, description = "Caller may not post jobs")
    )
)]
#[axum::debug_handler]
pub async fn create_job(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<CreateJobPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let job = state.engine.create_job(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(JobResponse::from(job))))
}

#[utoipa::path(
    get,
    path = "/api/jobs",
    params(
        ("company_id" = Option<Uuid>, Query, description = "Filter by company")
    ),
    responses(
        (status = 200, description = "Job postings visible to the caller", body = Json<Vec<JobResponse>>)
    )
)]
#[axum::debug_handler]
pub async fn list_jobs(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<JobListQuery>,
) -> Result<impl IntoResponse> {
    let jobs = state.engine.list_jobs(&actor, query).await?;
    Ok(Json(
        jobs.into_iter().map(JobResponse::from).collect::<Vec<_>>(),
    ))
}

#[utoipa::path(
    get,
    path = "/api/jobs/{id}",
    params(
        ("id" = Uuid, Path, description = "Job posting ID")
    ),
    responses(
        (status = 200, description = "Job posting found", body = Json<JobResponse>),
        (status = 404, description = "Job posting not found")
    )
)]
#[axum::debug_handler]
pub async fn get_job(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let job = state.engine.get_job(&actor, id).await?;
    Ok(Json(JobResponse::from(job)))
}

#[utoipa::path(
    patch,
    path = "/api/jobs/{id}",
    params(
        ("id" = Uuid, Path, description = "Job posting ID")
    ),
    request_body = UpdateJobPayload,
    responses(
        (status = 200, description = "Job posting updated", body = Json<JobResponse>),
        (status = 403, description = "Caller does not own this posting"),
        (status = 404, description = "Job posting not found")
    )
)]
#[axum::debug_handler]
pub async fn update_job(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateJobPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let job = state.engine.update_job(&actor, id, payload).await?;
    Ok(Json(JobResponse::from(job)))
}

#[utoipa::path(
    delete,
    path = "/api/jobs/{id}",
    params(
        ("id" = Uuid, Path, description = "Job posting ID")
    ),
    responses(
        (status = 204, description = "Job posting deleted"),
        (status = 403, description = "Caller does not own this posting"),
        (status = 404, description = "Job posting not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_job(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.engine.delete_job(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/jobs/{id}/approve",
    params(
        ("id" = Uuid, Path, description = "Job posting ID")
    ),
    responses(
        (status = 200, description = "Job posting approved; students notified once", body = Json<JobResponse>),
        (status = 400, description = "Posting was rejected"),
        (status = 403, description = "Caller cannot approve postings")
    )
)]
#[axum::debug_handler]
pub async fn approve_job(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let job = state.engine.approve_job(&actor, id).await?;
    Ok(Json(JobResponse::from(job)))
}

#[utoipa::path(
    post,
    path = "/api/jobs/{id}/reject",
    params(
        ("id" = Uuid, Path, description = "Job posting ID")
    ),
    responses(
        (status = 200, description = "Job posting rejected and closed", body = Json<JobResponse>),
        (status = 403, description = "Caller cannot reject postings")
    )
)]
#[axum::debug_handler]
pub async fn reject_job(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let job = state.engine.reject_job(&actor, id).await?;
    Ok(Json(JobResponse::from(job)))
}
