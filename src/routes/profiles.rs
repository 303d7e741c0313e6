use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::profile_dto::{
        CompanyPayload, StudentProfilePayload, UpdateCompanyPayload, UpdateStudentProfilePayload,
    },
    error::Result,
    models::user::Actor,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/students/profiles",
    request_body = StudentProfilePayload,
    responses(
        (status = 201, description = "Profile created", body = Json<StudentProfile>),
        (status = 409, description = "Profile or enrollment number already exists")
    )
)]
#[axum::debug_handler]
pub async fn create_student_profile(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<StudentProfilePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let profile = state.engine.create_student_profile(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

#[utoipa::path(
    get,
    path = "/api/students/profiles/me",
    responses(
        (status = 200, description = "Caller's student profile", body = Json<StudentProfile>),
        (status = 404, description = "No profile")
    )
)]
#[axum::debug_handler]
pub async fn my_student_profile(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.engine.my_student_profile(&actor).await?))
}

#[utoipa::path(
    patch,
    path = "/api/students/profiles/me",
    request_body = UpdateStudentProfilePayload,
    responses(
        (status = 200, description = "Profile updated", body = Json<StudentProfile>),
        (status = 409, description = "Enrollment number already registered")
    )
)]
#[axum::debug_handler]
pub async fn update_student_profile(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<UpdateStudentProfilePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    Ok(Json(state.engine.update_student_profile(&actor, payload).await?))
}

#[utoipa::path(
    get,
    path = "/api/students/profiles/recommendations",
    responses(
        (status = 200, description = "Open postings ranked for the calling student", body = Json<Vec<JobRecommendation>>),
        (status = 403, description = "Only students receive recommendations"),
        (status = 404, description = "No profile")
    )
)]
#[axum::debug_handler]
pub async fn recommended_jobs(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.engine.recommended_jobs(&actor).await?))
}

#[utoipa::path(
    get,
    path = "/api/students/profiles/{id}",
    params(
        ("id" = Uuid, Path, description = "Student profile ID")
    ),
    responses(
        (status = 200, description = "Profile found", body = Json<StudentProfile>),
        (status = 404, description = "Profile not found")
    )
)]
#[axum::debug_handler]
pub async fn get_student_profile(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.engine.get_student_profile(&actor, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/companies",
    request_body = CompanyPayload,
    responses(
        (status = 201, description = "Company created", body = Json<Company>),
        (status = 409, description = "Company already exists for this account")
    )
)]
#[axum::debug_handler]
pub async fn create_company(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<CompanyPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let company = state.engine.create_company(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(company)))
}

#[utoipa::path(
    get,
    path = "/api/companies/me",
    responses(
        (status = 200, description = "Caller's company", body = Json<Company>),
        (status = 404, description = "No company profile")
    )
)]
#[axum::debug_handler]
pub async fn my_company(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.engine.my_company(&actor).await?))
}

#[utoipa::path(
    patch,
    path = "/api/companies/me",
    request_body = UpdateCompanyPayload,
    responses(
        (status = 200, description = "Company updated", body = Json<Company>)
    )
)]
#[axum::debug_handler]
pub async fn update_company(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<UpdateCompanyPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    Ok(Json(state.engine.update_company(&actor, payload).await?))
}

#[utoipa::path(
    get,
    path = "/api/companies/{id}",
    params(
        ("id" = Uuid, Path, description = "Company ID")
    ),
    responses(
        (status = 200, description = "Company found", body = Json<Company>),
        (status = 404, description = "Company not found")
    )
)]
#[axum::debug_handler]
pub async fn get_company(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.engine.get_company(&actor, id).await?))
}
