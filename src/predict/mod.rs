mod classifier;
mod error;
mod fallback;
mod heuristics;
mod local_clock;
mod local_reference;
mod night;
mod observer;
mod pass_finder;
mod position;
mod predictor;
mod propagation;
mod types;

pub use error::PredictError;
pub use heuristics::Heuristics;
pub use local_clock::LocalClock;
pub use observer::Observer;
pub use pass_finder::SearchSettings;
pub use position::{RelativePosition, SatellitePosition};
pub use predictor::{ElementsSummary, PassPredictor, PositionReport, Prediction};
pub use types::{ClassifiedPass, PassCalculation, PassOrigin, SearchDirection};
