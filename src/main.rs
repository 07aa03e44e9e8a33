mod config;
mod elements;
mod predict;
mod web;

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::sync::Arc;

use crate::config::Config;
use crate::elements::{ElementSource, HttpTransport, SystemClock};
use crate::predict::{
    LocalClock, Observer, PassPredictor, PositionReport, Prediction, SearchDirection,
    SearchSettings,
};
use crate::web::server::Predictor;

#[derive(Parser)]
#[command(name = "iss-overhead")]
#[command(about = "When and where to look for the ISS")]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict the next passes over an observer
    Predict {
        /// Latitude in degrees; defaults to the configured observer
        #[arg(long, allow_negative_numbers = true, requires = "lon")]
        lat: Option<f64>,
        /// Longitude in degrees; defaults to the configured observer
        #[arg(long, allow_negative_numbers = true, requires = "lat")]
        lon: Option<f64>,
        #[arg(long, default_value_t = 0.0)]
        height_km: f64,
        /// Search window in days
        #[arg(long)]
        days: Option<u32>,
        /// Visibility threshold in degrees
        #[arg(long)]
        min_elevation: Option<f64>,
        /// IANA time zone used for night classification; defaults to this machine's zone
        #[arg(long)]
        tz: Option<String>,
        /// Fixed local clock offset; overrides --tz
        #[arg(long, allow_negative_numbers = true)]
        utc_offset_hours: Option<f64>,
        /// Print the prediction as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show where the station is right now
    Position {
        /// Latitude in degrees; with --lon, adds distance and direction.
        /// Defaults to the configured observer
        #[arg(long, allow_negative_numbers = true, requires = "lon")]
        lat: Option<f64>,
        #[arg(long, allow_negative_numbers = true, requires = "lat")]
        lon: Option<f64>,
        #[arg(long, default_value_t = 0.0)]
        height_km: f64,
        /// Print the position as JSON
        #[arg(long)]
        json: bool,
    },
    /// Fetch and print the orbital elements currently in use
    Elements,
    /// Serve the HTTP API
    Serve,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = match Config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Predict {
            lat,
            lon,
            height_km,
            days,
            min_elevation,
            tz,
            utc_offset_hours,
            json,
        } => {
            let request = PredictRequest {
                lat,
                lon,
                height_km,
                days,
                min_elevation,
                tz,
                utc_offset_hours,
            };
            predict(config, request, json).await
        }
        Commands::Position {
            lat,
            lon,
            height_km,
            json,
        } => {
            let observer = match (lat, lon, &config.observer) {
                (Some(lat), Some(lon), _) => Some(Observer::new(lat, lon, height_km)),
                (_, _, Some(configured)) => match configured.observer() {
                    Ok(o) => Some(o),
                    Err(e) => {
                        eprintln!("Invalid observer: {}", e);
                        return ExitCode::FAILURE;
                    }
                },
                _ => None,
            };
            position(config, observer, json).await
        }
        Commands::Elements => elements(config).await,
        Commands::Serve => serve(config).await,
    }
}

struct PredictRequest {
    lat: Option<f64>,
    lon: Option<f64>,
    height_km: f64,
    days: Option<u32>,
    min_elevation: Option<f64>,
    tz: Option<String>,
    utc_offset_hours: Option<f64>,
}

impl PredictRequest {
    /// Observer and the clock to read night hours from. Command-line options
    /// beat the configured observer's clock; without either, this machine's zone.
    fn observer(&self, config: &Config) -> Result<(Observer, LocalClock), String> {
        let (observer, configured_clock) = match (self.lat, self.lon, &config.observer) {
            (Some(lat), Some(lon), _) => (Observer::new(lat, lon, self.height_km), None),
            (_, _, Some(configured)) => (
                configured.observer().map_err(|e| e.to_string())?,
                configured.local_clock().map_err(|e| e.to_string())?,
            ),
            _ => return Err("--lat and --lon are required without a configured observer".into()),
        };
        observer.validate().map_err(|e| e.to_string())?;
        let clock = LocalClock::from_options(self.tz.as_deref(), self.utc_offset_hours)
            .map_err(|e| e.to_string())?
            .or(configured_clock)
            .unwrap_or(LocalClock::System);
        Ok((observer, clock))
    }

    fn settings(&self, defaults: SearchSettings) -> Result<SearchSettings, String> {
        let settings = SearchSettings {
            days: self.days.unwrap_or(defaults.days),
            min_elevation_deg: self.min_elevation.unwrap_or(defaults.min_elevation_deg),
        };
        settings.validate().map_err(|e| e.to_string())?;
        Ok(settings)
    }
}

fn build_predictor(config: &Config) -> Result<Predictor, String> {
    let transport = HttpTransport::new(config.elements.fetch_timeout)
        .map_err(|e| format!("Failed to create HTTP client: {}", e))?;
    let source = ElementSource::new(transport, SystemClock, &config.elements);
    Ok(PassPredictor::new(
        Arc::new(source),
        config.search,
        config.heuristics.clone(),
    ))
}

async fn predict(config: Config, request: PredictRequest, json: bool) -> ExitCode {
    let (observer, clock) = match request.observer(&config) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Invalid observer: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let settings = match request.settings(config.search) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let predictor = match build_predictor(&config) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let prediction = match predictor.predict(observer, clock, settings).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Prediction failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if json {
        match serde_json::to_string_pretty(&prediction) {
            Ok(s) => println!("{}", s),
            Err(e) => {
                eprintln!("Failed to serialize prediction: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        print_prediction(&prediction, &clock);
    }
    ExitCode::SUCCESS
}

fn print_prediction(prediction: &Prediction, clock: &LocalClock) {
    let elements = &prediction.elements;
    match elements.epoch {
        Some(epoch) => println!("Elements: {} (epoch {})", elements.name, epoch),
        None => println!("Elements: {} (unusable)", elements.name),
    }
    println!(
        "Observer: {:.4}, {:.4} ({})",
        prediction.observer.latitude_deg, prediction.observer.longitude_deg, prediction.time_zone
    );

    match prediction.direction {
        SearchDirection::Upcoming => println!("Upcoming passes:"),
        SearchDirection::Past => println!("No upcoming passes, most recent ones:"),
        SearchDirection::None => println!("No passes found, showing simulated passes:"),
    }

    for (i, classified) in prediction.passes.iter().enumerate() {
        let pass = &classified.pass;
        println!(
            "  {}. {}  {:.1} min  max {:.0}°  {} -> {}",
            i + 1,
            clock.local_time(pass.start_time).format("%a %d %b %H:%M"),
            pass.duration_minutes,
            pass.max_elevation_deg,
            classified.from_direction,
            classified.to_direction
        );
        let note = if classified.is_synthetic() { " (simulated)" } else { "" };
        println!(
            "     {}, {}. {}{}",
            classified.elevation_description,
            classified.brightness_description,
            classified.reason,
            note
        );
    }
}

async fn position(config: Config, observer: Option<Observer>, json: bool) -> ExitCode {
    let predictor = match build_predictor(&config) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let report = match predictor.position(observer).await {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Position failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(s) => println!("{}", s),
            Err(e) => {
                eprintln!("Failed to serialize position: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        print_position(&report);
    }
    ExitCode::SUCCESS
}

fn print_position(report: &PositionReport) {
    let position = &report.position;
    println!("{} at {}", report.elements.name, position.timestamp);
    println!(
        "  {:.4}, {:.4}  altitude {:.0} km  speed {:.2} km/s",
        position.latitude_deg, position.longitude_deg, position.altitude_km, position.velocity_km_s
    );
    if let Some(relative) = &position.relative {
        println!(
            "  {:.0} km away toward {} ({:.0}°), elevation {:.1}°{}",
            relative.ground_distance_km,
            relative.direction,
            relative.bearing_deg,
            relative.elevation_deg,
            if relative.above_horizon { ", above the horizon" } else { "" }
        );
    }
}

async fn elements(config: Config) -> ExitCode {
    let predictor = match build_predictor(&config) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let elements = predictor.source().get_elements().await;
    if elements.is_fallback() {
        println!("All providers failed, using the bundled snapshot");
    }
    println!("{}\n{}\n{}", elements.name, elements.line1, elements.line2);
    ExitCode::SUCCESS
}

async fn serve(config: Config) -> ExitCode {
    let predictor = match build_predictor(&config) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match web::run_server(config, predictor).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}
