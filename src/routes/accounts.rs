use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::account_dto::{CreateUserPayload, MessageResponse, RegisterPayload, UserResponse},
    error::Result,
    models::user::Actor,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterPayload,
    responses(
        (status = 201, description = "Account created, awaiting approval", body = Json<UserResponse>),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Username or email already taken")
    )
)]
#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user = state.engine.register(payload).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "The calling account", body = Json<UserResponse>),
        (status = 401, description = "Missing or invalid token")
    )
)]
#[axum::debug_handler]
pub async fn me(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse> {
    let user = state.engine.current_user(&actor).await?;
    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    post,
    path = "/api/auth/users",
    request_body = CreateUserPayload,
    responses(
        (status = 201, description = "Approved account created", body = Json<UserResponse>),
        (status = 403, description = "Caller is not a superuser"),
        (status = 409, description = "Username or email already taken")
    )
)]
#[axum::debug_handler]
pub async fn create_user(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<CreateUserPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user = state.engine.create_user(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

#[utoipa::path(
    get,
    path = "/api/auth/users/{id}",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Account found", body = Json<UserResponse>),
        (status = 404, description = "Account not found")
    )
)]
#[axum::debug_handler]
pub async fn get_user(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let user = state.engine.get_user(&actor, id).await?;
    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    get,
    path = "/api/auth/pending",
    responses(
        (status = 200, description = "Accounts awaiting approval", body = Json<Vec<UserResponse>>),
        (status = 403, description = "Caller cannot review accounts")
    )
)]
#[axum::debug_handler]
pub async fn pending_users(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse> {
    let users = state.engine.pending_users(&actor).await?;
    Ok(Json(
        users.into_iter().map(UserResponse::from).collect::<Vec<_>>(),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/users/{id}/approve",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Account approved", body = Json<UserResponse>),
        (status = 403, description = "Caller cannot review accounts"),
        (status = 404, description = "Account not found")
    )
)]
#[axum::debug_handler]
pub async fn approve_user(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let user = state.engine.approve_user(&actor, id).await?;
    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    post,
    path = "/api/auth/users/{id}/reject",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Account rejected and removed", body = Json<MessageResponse>),
        (status = 400, description = "Account is not awaiting approval"),
        (status = 404, description = "Account not found")
    )
)]
#[axum::debug_handler]
pub async fn reject_user(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.engine.reject_user(&actor, id).await?;
    Ok(Json(MessageResponse::new("User rejected and removed")))
}
