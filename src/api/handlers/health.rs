use axum::{
    http::{HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;

const NAME: &str = env!("CARGO_PKG_NAME");
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up"),
    ),
    tag = "health"
)]
pub async fn health() -> impl IntoResponse {
    let mut headers = HeaderMap::new();
    if let Ok(app) = HeaderValue::from_str(format!("{NAME}-{VERSION}").as_str()) {
        headers.insert("X-App", app);
    }

    (
        StatusCode::OK,
        headers,
        Json(json!({
            "name": NAME,
            "version": VERSION,
        })),
    )
}
