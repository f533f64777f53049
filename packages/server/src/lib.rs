#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for Varun, a rainwater harvesting planner.
//!
//! Serves the REST API under `/api`: user accounts, site assessments and
//! feasibility reports, expert bookings, IoT readings, notifications,
//! community leaderboard and badges, plus proxied weather and air
//! quality data. Documents are persisted in a `SQLite` file at
//! `data/varun.db` by default.

pub mod achievements;
pub mod config;
pub mod experts;
mod handlers;

use std::sync::{Arc, Mutex, PoisonError};

use actix_cors::Cors;
use actix_web::error::{InternalError, JsonPayloadError, QueryPayloadError};
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, middleware, web};
use rand::RngCore;
use rand::SeedableRng as _;
use rand::rngs::StdRng;
use varun_database::DocumentStore;
use varun_database::sqlite::SqliteDocumentStore;
use varun_weather::{OpenDataClient, WeatherProvider};

use crate::config::ServerConfig;

/// Shared application state.
pub struct AppState {
    /// Document persistence.
    pub store: Arc<dyn DocumentStore>,
    /// Weather and air quality source.
    pub weather: Arc<dyn WeatherProvider>,
    /// Random source for simulated telemetry.
    rng: Mutex<Box<dyn RngCore + Send>>,
}

impl AppState {
    /// Creates the state from its collaborators.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        weather: Arc<dyn WeatherProvider>,
        rng: impl RngCore + Send + 'static,
    ) -> Self {
        Self {
            store,
            weather,
            rng: Mutex::new(Box::new(rng)),
        }
    }

    /// Runs `f` with exclusive access to the random source.
    pub fn with_rng<T>(&self, f: impl FnOnce(&mut dyn RngCore) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut **rng)
    }
}

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let body = serde_json::json!({ "error": format!("Invalid request body: {err}") });
    InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
}

fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let body = serde_json::json!({ "error": format!("Invalid query parameters: {err}") });
    InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(web::JsonConfig::default().error_handler(json_error))
            .app_data(web::QueryConfig::default().error_handler(query_error))
            .route("/", web::get().to(handlers::root))
            .route("/health", web::get().to(handlers::health))
            // Users
            .route("/auth/register", web::post().to(handlers::register))
            .route("/auth/login", web::post().to(handlers::login))
            .route("/user/{id}", web::get().to(handlers::get_user))
            .route("/user/{id}", web::put().to(handlers::update_user))
            // Assessments
            .route("/assessment/submit", web::post().to(handlers::submit_assessment))
            .route("/assessment/user/{user_id}", web::get().to(handlers::user_assessments))
            .route("/assessment/{id}", web::get().to(handlers::get_assessment))
            .route("/feasibility/calculate", web::post().to(handlers::calculate_feasibility))
            .route("/recharge/classify", web::get().to(handlers::classify_recharge))
            // Dashboard
            .route("/dashboard/{user_id}", web::get().to(handlers::dashboard))
            // Weather
            .route("/weather/current", web::get().to(handlers::weather_current))
            .route("/weather/aqi", web::get().to(handlers::weather_aqi))
            .route("/weather/combined", web::get().to(handlers::weather_combined))
            // Regional data
            .route("/data/rainfall/{location}", web::get().to(handlers::rainfall_data))
            .route("/data/groundwater/{location}", web::get().to(handlers::groundwater_data))
            .route("/data/soil/{location}", web::get().to(handlers::soil_data))
            // Experts
            .route("/experts", web::get().to(handlers::experts))
            .route("/booking/create", web::post().to(handlers::create_booking))
            .route("/booking/user/{user_id}", web::get().to(handlers::user_bookings))
            .route("/booking/{id}", web::get().to(handlers::get_booking))
            .route("/booking/{id}/status", web::put().to(handlers::update_booking_status))
            .route("/booking/{id}/cancel", web::put().to(handlers::cancel_booking))
            // IoT
            .route("/iot/data", web::post().to(handlers::submit_iot_data))
            .route("/iot/data/{user_id}", web::get().to(handlers::iot_data))
            .route("/iot/history/{user_id}", web::get().to(handlers::iot_history))
            // Community
            .route("/community/leaderboard", web::get().to(handlers::leaderboard))
            .route("/community/stats", web::get().to(handlers::community_stats))
            .route("/achievements/{user_id}", web::get().to(handlers::achievements))
            // Notifications
            .route("/notifications/send", web::post().to(handlers::send_notification))
            .route("/notifications/{id}/read", web::put().to(handlers::mark_notification_read))
            .route("/notifications/{user_id}", web::get().to(handlers::notifications)),
    );
}

/// Starts the Varun API server.
///
/// Reads [`ServerConfig`] from the environment, opens the document
/// store, builds the upstream weather client and serves until shutdown.
/// The caller provides the async runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the document store cannot be
/// opened, the upstream registry is incomplete, or the HTTP server fails
/// to bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = ServerConfig::from_env();

    log::info!("Opening document store at {}...", config.database_path.display());
    let store = SqliteDocumentStore::open(&config.database_path)
        .await
        .map_err(std::io::Error::other)?;

    log::info!("Configuring upstream weather services...");
    let weather = OpenDataClient::from_registry().map_err(std::io::Error::other)?;

    let state = web::Data::new(AppState::new(
        Arc::new(store),
        Arc::new(weather),
        StdRng::from_entropy(),
    ));

    log::info!("Starting server on {}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((config.bind_addr, config.port))?
    .run()
    .await
}
