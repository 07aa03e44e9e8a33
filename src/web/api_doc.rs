use utoipa::OpenApi;

use super::api::error::ErrorResponse;
use crate::elements::{ElementsOrigin, OrbitalElements};
use crate::predict::{
    ClassifiedPass, ElementsSummary, Observer, PassCalculation, PassOrigin, PositionReport,
    Prediction, RelativePosition, SatellitePosition, SearchDirection,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::api::predict::list_passes,
        super::api::position::current_position,
        super::api::elements::current_elements,
        super::api::elements::refresh_elements,
    ),
    components(
        schemas(
            Prediction,
            ClassifiedPass,
            PassCalculation,
            PassOrigin,
            SearchDirection,
            ElementsSummary,
            PositionReport,
            SatellitePosition,
            RelativePosition,
            Observer,
            OrbitalElements,
            ElementsOrigin,
            ErrorResponse,
        )
    ),
    info(
        title = "ISS Overhead API",
        description = "Upcoming ISS passes for an observer on the ground",
        version = "0.1.0"
    ),
    tags(
        (name = "passes", description = "Pass prediction"),
        (name = "position", description = "Where the station is now"),
        (name = "elements", description = "Orbital elements in use")
    )
)]
pub struct ApiDoc;
