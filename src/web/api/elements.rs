use axum::{extract::State, Json};

use crate::elements::OrbitalElements;
use crate::web::server::AppState;

#[utoipa::path(
    get,
    path = "/api/elements",
    tag = "elements",
    responses(
        (status = 200, description = "Current elements, possibly the stale fallback snapshot", body = OrbitalElements)
    )
)]
pub async fn current_elements(State(state): State<AppState>) -> Json<OrbitalElements> {
    Json(state.predictor.source().get_elements().await)
}

#[utoipa::path(
    post,
    path = "/api/elements/refresh",
    tag = "elements",
    responses(
        (status = 200, description = "Elements refetched from the providers", body = OrbitalElements)
    )
)]
pub async fn refresh_elements(State(state): State<AppState>) -> Json<OrbitalElements> {
    let source = state.predictor.source();
    source.invalidate().await;
    Json(source.get_elements().await)
}
