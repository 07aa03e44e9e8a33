mod clock;
mod error;
mod provider;
mod source;
mod transport;
mod types;

pub use clock::{Clock, SystemClock};
pub use error::SourceError;
pub use provider::{default_providers, Provider, ResponseFormat};
pub use source::ElementSource;
pub use transport::{HttpTransport, Transport};
pub use types::{ElementsOrigin, OrbitalElements, SatelliteTarget};

#[cfg(test)]
pub use clock::ManualClock;
