use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::predict::{Observer, PositionReport};
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::server::AppState;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PositionQuery {
    /// Observer latitude; with `lon`, adds distance and direction to the response
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub height_km: Option<f64>,
}

impl PositionQuery {
    fn observer(&self) -> Result<Option<Observer>, ApiError> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => {
                let observer = Observer::new(lat, lon, self.height_km.unwrap_or(0.0));
                observer.validate()?;
                Ok(Some(observer))
            }
            (None, None) => Ok(None),
            _ => Err(ApiError::Validation(
                "lat and lon must be given together".into(),
            )),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/position",
    tag = "position",
    params(PositionQuery),
    responses(
        (status = 200, description = "Current sub-satellite point", body = PositionReport),
        (status = 400, description = "Invalid observer", body = ErrorResponse),
        (status = 500, description = "Elements could not be propagated", body = ErrorResponse)
    )
)]
pub async fn current_position(
    State(state): State<AppState>,
    Query(query): Query<PositionQuery>,
) -> ApiResult<Json<PositionReport>> {
    let observer = query.observer()?;
    let report = state.predictor.position(observer).await?;
    Ok(Json(report))
}
