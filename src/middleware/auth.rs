use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::Error,
    models::user::{Actor, Role},
    AppState,
};

/// Bearer token payload. Tokens are minted by the identity provider in front of this
/// service; only verification happens here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub exp: usize,
    pub role: Role,
    #[serde(default)]
    pub is_superuser: bool,
    #[serde(default)]
    pub is_approved: bool,
}

impl From<Claims> for Actor {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            role: claims.role,
            is_superuser: claims.is_superuser,
            is_approved: claims.is_approved,
        }
    }
}

fn bearer_token(req: &Request) -> Result<&str, Error> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| Error::Unauthorized("missing_authorization".to_string()))?;
    let value = header
        .to_str()
        .map_err(|_| Error::Unauthorized("bad_authorization".to_string()))?;
    value
        .strip_prefix("Bearer ")
        .ok_or_else(|| Error::Unauthorized("unsupported_scheme".to_string()))
}

pub fn decode_actor(token: &str, secret: &[u8]) -> Result<Actor, Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)
        .map(|data| Actor::from(data.claims))
        .map_err(|e| {
            tracing::debug!(error = %e, "rejected bearer token");
            Error::Unauthorized("invalid_token".to_string())
        })
}

/// Resolves the caller into an [`Actor`] request extension, or answers 401.
pub async fn require_actor(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let secret = state.jwt_secret.as_bytes();
    let actor = match bearer_token(&req).and_then(|token| decode_actor(token, secret)) {
        Ok(actor) => actor,
        Err(err) => return err.into_response(),
    };
    req.extensions_mut().insert(actor);
    next.run(req).await
}
