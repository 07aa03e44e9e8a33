use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::elements::{Clock, ElementSource, ElementsOrigin, OrbitalElements, Transport};
use crate::predict::classifier::PassClassifier;
use crate::predict::error::PredictError;
use crate::predict::heuristics::Heuristics;
use crate::predict::local_clock::LocalClock;
use crate::predict::observer::Observer;
use crate::predict::pass_finder::{search_with_fallback, SearchSettings};
use crate::predict::position::{current_position, SatellitePosition};
use crate::predict::propagation::Sgp4Propagator;
use crate::predict::types::{ClassifiedPass, SearchDirection};

/// Which element set a prediction was computed from.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ElementsSummary {
    pub name: String,
    pub origin: ElementsOrigin,
    /// `None` when the elements could not be parsed for propagation.
    pub epoch: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Prediction {
    pub observer: Observer,
    pub generated_at: DateTime<Utc>,
    /// Clock used for night classification, a zone name or a fixed offset.
    pub time_zone: String,
    /// Offset of that clock at `generated_at`.
    pub utc_offset_seconds: i32,
    pub elements: ElementsSummary,
    pub direction: SearchDirection,
    pub passes: Vec<ClassifiedPass>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PositionReport {
    pub elements: ElementsSummary,
    pub position: SatellitePosition,
}

/// Runs the whole pipeline: elements, search, selection and projection.
pub struct PassPredictor<T, C> {
    source: Arc<ElementSource<T, C>>,
    settings: SearchSettings,
    heuristics: Heuristics,
}

impl<T: Transport, C: Clock> PassPredictor<T, C> {
    pub fn new(
        source: Arc<ElementSource<T, C>>,
        settings: SearchSettings,
        heuristics: Heuristics,
    ) -> Self {
        Self {
            source,
            settings,
            heuristics,
        }
    }

    pub fn source(&self) -> &ElementSource<T, C> {
        &self.source
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Passes from now on. The scan runs on the blocking pool.
    pub async fn predict(
        &self,
        observer: Observer,
        clock: LocalClock,
        settings: SearchSettings,
    ) -> Result<Prediction, PredictError> {
        self.predict_at(observer, clock, settings, Utc::now()).await
    }

    pub async fn predict_at(
        &self,
        observer: Observer,
        clock: LocalClock,
        settings: SearchSettings,
        now: DateTime<Utc>,
    ) -> Result<Prediction, PredictError> {
        observer.validate()?;
        settings.validate()?;
        let elements = self.source.get_elements().await;
        let heuristics = self.heuristics.clone();

        tokio::task::spawn_blocking(move || {
            predict_with_elements(&elements, &observer, now, clock, &settings, &heuristics)
        })
        .await
        .map_err(|e| PredictError::Task(e.to_string()))?
    }

    /// Current sub-satellite point, plus distance and direction when an observer is given.
    pub async fn position(
        &self,
        observer: Option<Observer>,
    ) -> Result<PositionReport, PredictError> {
        self.position_at(observer, Utc::now()).await
    }

    pub async fn position_at(
        &self,
        observer: Option<Observer>,
        now: DateTime<Utc>,
    ) -> Result<PositionReport, PredictError> {
        if let Some(observer) = &observer {
            observer.validate()?;
        }
        let elements = self.source.get_elements().await;
        let propagator = Sgp4Propagator::new(&elements)?;
        let position = current_position(&propagator, observer.as_ref(), now)?;
        Ok(PositionReport {
            elements: ElementsSummary {
                name: elements.name.clone(),
                origin: elements.origin.clone(),
                epoch: Some(propagator.epoch()),
            },
            position,
        })
    }
}

/// Synchronous pipeline over an already-fetched element set.
///
/// Elements that sgp4 rejects are treated as producing no passes, so the
/// caller still gets the synthetic set rather than an error.
pub fn predict_with_elements(
    elements: &OrbitalElements,
    observer: &Observer,
    now: DateTime<Utc>,
    clock: LocalClock,
    settings: &SearchSettings,
    heuristics: &Heuristics,
) -> Result<Prediction, PredictError> {
    observer.validate()?;

    let (epoch, direction, passes) = match Sgp4Propagator::new(elements) {
        Ok(propagator) => {
            let (direction, passes) =
                search_with_fallback(&propagator, observer, now, settings, &heuristics.brightness)?;
            (Some(propagator.epoch()), direction, passes)
        }
        Err(e) => {
            log::warn!("Cannot propagate {}: {}", elements.name, e);
            (None, SearchDirection::None, Vec::new())
        }
    };

    let classifier = PassClassifier {
        latitude_deg: observer.latitude_deg,
        clock,
        bright_day: heuristics.bright_day,
        brightness: heuristics.brightness.clone(),
    };
    let passes = classifier
        .classify(passes, now)
        .into_iter()
        .map(|selected| selected.project(observer))
        .collect();

    Ok(Prediction {
        observer: *observer,
        generated_at: now,
        time_zone: clock.name(),
        utc_offset_seconds: clock.offset_at(now).local_minus_utc(),
        elements: ElementsSummary {
            name: elements.name.clone(),
            origin: elements.origin.clone(),
            epoch,
        },
        direction,
        passes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ElementsConfig;
    use crate::elements::{ManualClock, SourceError};
    use crate::predict::types::PassOrigin;

    struct OfflineTransport;

    impl Transport for OfflineTransport {
        async fn fetch(&self, _url: &str) -> Result<String, SourceError> {
            Err(SourceError::Status(503))
        }
    }

    fn barcelona() -> Observer {
        Observer::new(41.3851, 2.1734, 0.0)
    }

    fn day_after_epoch() -> DateTime<Utc> {
        Sgp4Propagator::new(&OrbitalElements::fallback())
            .unwrap()
            .epoch()
            + chrono::Duration::days(1)
    }

    fn assert_sane(prediction: &Prediction) {
        assert!((1..=3).contains(&prediction.passes.len()));
        for pass in &prediction.passes {
            assert_eq!(pass.origin, PassOrigin::Computed);
            let minutes = (pass.pass.end_time - pass.pass.start_time).num_seconds() as f64 / 60.0;
            assert!((2.0..=10.0).contains(&minutes), "duration {}", minutes);
            assert!((5.0..=90.0).contains(&pass.pass.max_elevation_deg));
            assert!(pass.pass.start_time >= prediction.generated_at);
        }
        assert!(prediction
            .passes
            .windows(2)
            .all(|w| w[0].pass.start_time < w[1].pass.start_time));
    }

    #[test]
    fn barcelona_end_to_end() {
        let observer = barcelona();
        let prediction = predict_with_elements(
            &OrbitalElements::fallback(),
            &observer,
            day_after_epoch(),
            LocalClock::Zone(chrono_tz::Europe::Madrid),
            &SearchSettings::default(),
            &Heuristics::default(),
        )
        .unwrap();

        assert_eq!(prediction.direction, SearchDirection::Upcoming);
        assert_eq!(prediction.elements.origin, ElementsOrigin::StaleFallback);
        assert!(prediction.elements.epoch.is_some());
        assert_eq!(prediction.time_zone, "Europe/Madrid");
        assert_eq!(prediction.utc_offset_seconds, 7200);
        assert_sane(&prediction);
    }

    #[test]
    fn unusable_elements_fall_back_to_synthetic() {
        let mut elements = OrbitalElements::fallback();
        elements.line2 = "2 garbage".to_string();
        let observer = barcelona();
        let now = day_after_epoch();

        let prediction = predict_with_elements(
            &elements,
            &observer,
            now,
            LocalClock::solar(&observer),
            &SearchSettings::default(),
            &Heuristics::default(),
        )
        .unwrap();

        assert_eq!(prediction.direction, SearchDirection::None);
        assert!(prediction.elements.epoch.is_none());
        assert_eq!(prediction.passes.len(), 3);
        assert!(prediction
            .passes
            .iter()
            .all(|p| p.is_synthetic() && p.reason.contains("Synthetic") && !p.viewable));
    }

    #[test]
    fn rejects_invalid_observer() {
        let result = predict_with_elements(
            &OrbitalElements::fallback(),
            &Observer::new(0.0, 0.0, 0.0),
            day_after_epoch(),
            LocalClock::Fixed(chrono::FixedOffset::east_opt(0).unwrap()),
            &SearchSettings::default(),
            &Heuristics::default(),
        );
        assert!(matches!(result, Err(PredictError::InvalidObserver(_))));
    }

    #[tokio::test]
    async fn offline_predictor_uses_stale_snapshot() {
        let source = ElementSource::new(
            OfflineTransport,
            ManualClock::new(day_after_epoch()),
            &ElementsConfig::default(),
        );
        let predictor = PassPredictor::new(
            Arc::new(source),
            SearchSettings::default(),
            Heuristics::default(),
        );
        let observer = barcelona();

        let prediction = predictor
            .predict_at(
                observer,
                LocalClock::fixed_hours(2.0).unwrap(),
                SearchSettings {
                    days: 3,
                    ..SearchSettings::default()
                },
                day_after_epoch(),
            )
            .await
            .unwrap();

        assert_eq!(prediction.elements.name, "ISS (ZARYA) - FALLBACK");
        assert_sane(&prediction);
    }

    #[tokio::test]
    async fn offline_position_from_stale_snapshot() {
        let source = ElementSource::new(
            OfflineTransport,
            ManualClock::new(day_after_epoch()),
            &ElementsConfig::default(),
        );
        let predictor = PassPredictor::new(
            Arc::new(source),
            SearchSettings::default(),
            Heuristics::default(),
        );

        let report = predictor
            .position_at(Some(barcelona()), day_after_epoch())
            .await
            .unwrap();
        assert_eq!(report.elements.origin, ElementsOrigin::StaleFallback);
        assert_eq!(report.position.timestamp, day_after_epoch());
        let relative = report.position.relative.unwrap();
        assert!(relative.range_km >= report.position.altitude_km - 1.0);

        let result = predictor
            .position_at(Some(Observer::new(0.0, 0.0, 0.0)), day_after_epoch())
            .await;
        assert!(matches!(result, Err(PredictError::InvalidObserver(_))));
    }
}
