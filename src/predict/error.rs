use thiserror::Error;

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("Invalid observer position: {0}")]
    InvalidObserver(String),
    #[error("Invalid search settings: {0}")]
    InvalidSettings(String),
    #[error("Invalid TLE for {name}: {message}")]
    InvalidTle { name: String, message: String },
    #[error("Propagation error: {0}")]
    Propagation(String),
    #[error("Search task failed: {0}")]
    Task(String),
}
