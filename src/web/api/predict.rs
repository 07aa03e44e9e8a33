use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::config::Config;
use crate::predict::{LocalClock, Observer, Prediction, SearchSettings};
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::server::AppState;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PassesQuery {
    /// Observer latitude, degrees north. Omit with `lon` to use the configured observer.
    #[serde(default)]
    pub lat: Option<f64>,
    /// Observer longitude, degrees east
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub height_km: Option<f64>,
    /// Search window in days
    #[serde(default)]
    pub days: Option<u32>,
    /// Visibility threshold in degrees
    #[serde(default)]
    pub min_elevation: Option<f64>,
    /// IANA time zone for night classification, e.g. `Europe/Madrid`
    #[serde(default)]
    pub tz: Option<String>,
    /// Fixed local clock offset; overrides `tz`. Without either, the
    /// configured observer's clock or else mean solar time is used
    #[serde(default)]
    pub utc_offset_hours: Option<f64>,
}

impl PassesQuery {
    /// Observer from the query, or the configured one when no coordinates are given.
    fn observer(&self, config: &Config) -> Result<(Observer, Option<LocalClock>), ApiError> {
        let (observer, configured_clock) = match (self.lat, self.lon, &config.observer) {
            (Some(lat), Some(lon), _) => (
                Observer::new(lat, lon, self.height_km.unwrap_or(0.0)),
                None,
            ),
            (None, None, Some(configured)) => (
                configured
                    .observer()
                    .map_err(|e| ApiError::Validation(e.to_string()))?,
                configured
                    .local_clock()
                    .map_err(|e| ApiError::Validation(e.to_string()))?,
            ),
            (None, None, None) => {
                return Err(ApiError::Validation(
                    "lat and lon are required when no observer is configured".into(),
                ))
            }
            _ => {
                return Err(ApiError::Validation(
                    "lat and lon must be given together".into(),
                ))
            }
        };
        observer.validate()?;
        Ok((observer, configured_clock))
    }

    fn settings(&self, defaults: SearchSettings) -> Result<SearchSettings, ApiError> {
        let settings = SearchSettings {
            days: self.days.unwrap_or(defaults.days),
            min_elevation_deg: self.min_elevation.unwrap_or(defaults.min_elevation_deg),
        };
        settings.validate()?;
        Ok(settings)
    }

    fn local_clock(&self) -> Result<Option<LocalClock>, ApiError> {
        Ok(LocalClock::from_options(
            self.tz.as_deref(),
            self.utc_offset_hours,
        )?)
    }
}

#[utoipa::path(
    get,
    path = "/api/passes",
    tag = "passes",
    params(PassesQuery),
    responses(
        (status = 200, description = "Up to three passes, ordered by start time", body = Prediction),
        (status = 400, description = "Invalid observer or search parameters", body = ErrorResponse),
        (status = 500, description = "Search failed", body = ErrorResponse)
    )
)]
pub async fn list_passes(
    State(state): State<AppState>,
    Query(query): Query<PassesQuery>,
) -> ApiResult<Json<Prediction>> {
    let (observer, configured_clock) = query.observer(&state.config)?;
    let settings = query.settings(*state.predictor.settings())?;
    let clock = query
        .local_clock()?
        .or(configured_clock)
        .unwrap_or_else(|| LocalClock::solar(&observer));

    let prediction = state
        .predictor
        .predict(observer, clock, settings)
        .await?;

    Ok(Json(prediction))
}
