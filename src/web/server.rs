use axum::{routing::get, routing::post, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::elements::{HttpTransport, SystemClock};
use crate::predict::PassPredictor;

use super::api::elements as elements_handlers;
use super::api::position as position_handlers;
use super::api::predict as predict_handlers;
use super::api_doc::ApiDoc;

pub type Predictor = PassPredictor<HttpTransport, SystemClock>;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub predictor: Arc<Predictor>,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/passes", get(predict_handlers::list_passes))
        .route("/api/position", get(position_handlers::current_position))
        .route("/api/elements", get(elements_handlers::current_elements))
        .route(
            "/api/elements/refresh",
            post(elements_handlers::refresh_elements),
        )
        // OpenAPI / Swagger
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(config: Config, predictor: Predictor) -> std::io::Result<()> {
    let bind_addr = config.web.bind.clone();
    let state = AppState {
        config: Arc::new(config),
        predictor: Arc::new(predictor),
    };

    log::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, router(state)).await
}
