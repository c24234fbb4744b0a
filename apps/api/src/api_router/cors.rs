use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use hearth_core::AppError;
use tower_http::cors::CorsLayer;

const ALLOWED_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PATCH,
    Method::DELETE,
    Method::OPTIONS,
];

/// Allows the single configured frontend origin to call the API with cookies.
pub(super) fn build_cors_layer(frontend_url: &str) -> Result<CorsLayer, AppError> {
    let origin = HeaderValue::from_str(frontend_url).map_err(|error| {
        AppError::Configuration(format!("invalid FRONTEND_URL '{frontend_url}': {error}"))
    })?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods(ALLOWED_METHODS)
        .allow_headers([CONTENT_TYPE]))
}
