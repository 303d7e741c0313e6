use axum::http::{header, Method};
use tower_http::cors::{Any, CorsLayer};

pub fn permissive_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .allow_origin(Any)
}

/// Same-origin deployments: no cross-origin grants beyond the API's own verbs.
pub fn restricted_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

pub fn cors_layer(permissive: bool) -> CorsLayer {
    if permissive {
        permissive_cors()
    } else {
        restricted_cors()
    }
}
