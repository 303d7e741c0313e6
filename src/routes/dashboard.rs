use axum::{
    extract::State,
    response::{IntoResponse, Json},
    Extension,
};

use crate::{error::Result, models::user::Actor, AppState};

#[utoipa::path(
    get,
    path = "/api/dashboard/stats",
    responses(
        (status = 200, description = "Role-specific counters", body = Json<DashboardStats>),
        (status = 403, description = "Account awaiting approval")
    )
)]
#[axum::debug_handler]
pub async fn stats(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.engine.dashboard(&actor).await?))
}
