#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Weather and air quality data for the Varun API.
//!
//! Two upstream providers are proxied into normalized records:
//!
//! 1. **Open-Meteo** ([`open_meteo`]) for current conditions and today's
//!    rainfall.
//! 2. **`OpenAQ`** ([`openaq`]) for the nearest station's PM2.5, converted
//!    to a US EPA AQI.
//!
//! Neither provider failure is ever surfaced to callers. When a request
//! fails, times out, returns a non-2xx status or carries no usable data,
//! a fixed fallback record is returned with its `error` field set.

pub mod open_meteo;
pub mod openaq;
pub mod service_registry;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use varun_air_quality::AqiCategory;

use crate::service_registry::UpstreamService;

/// Errors from upstream provider calls. Only visible inside this crate's
/// fetch functions; [`WeatherProvider`] methods never return them.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// HTTP request failed, timed out, or returned a non-2xx status.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// The provider reported a reading that cannot be normalized.
    #[error("Invalid reading: {0}")]
    InvalidReading(#[from] varun_air_quality::InvalidInputError),

    /// A required service is missing from the registry.
    #[error("Unknown upstream service: {0}")]
    UnknownService(String),
}

/// Current weather at a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    /// Air temperature at 2 m, °C.
    pub temperature: f64,
    /// Relative humidity at 2 m, percent.
    pub humidity: f64,
    /// Precipitation in the current interval, mm.
    pub precipitation_current: f64,
    /// Sum of today's hourly precipitation, mm.
    pub rainfall_today: f64,
    /// Human-readable weather condition.
    pub weather_description: String,
    /// WMO weather code.
    pub weather_code: i64,
    /// Wind speed at 10 m, km/h.
    pub wind_speed: f64,
    /// When the record was produced.
    pub timestamp: DateTime<Utc>,
    /// Set when this is a fallback record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WeatherReport {
    /// Record returned when Open-Meteo cannot be reached.
    #[must_use]
    pub fn fallback(now: DateTime<Utc>) -> Self {
        Self {
            temperature: 28.0,
            humidity: 65.0,
            precipitation_current: 0.0,
            rainfall_today: 0.0,
            weather_description: "Data Unavailable".to_string(),
            weather_code: 0,
            wind_speed: 10.0,
            timestamp: now,
            error: Some("Unable to fetch weather data".to_string()),
        }
    }
}

/// Normalized air quality at a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQualityReport {
    /// US EPA AQI.
    pub aqi: u32,
    /// Category for [`Self::aqi`].
    pub aqi_category: AqiCategory,
    /// PM2.5 concentration, µg/m³.
    pub pm25: f64,
    /// Name of the reporting station.
    pub location: String,
    /// When the record was produced.
    pub timestamp: DateTime<Utc>,
    /// Set when this is a fallback record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AirQualityReport {
    /// Record returned when `OpenAQ` fails or has no nearby PM2.5 data.
    #[must_use]
    pub fn fallback(now: DateTime<Utc>) -> Self {
        Self {
            aqi: 65,
            aqi_category: AqiCategory::Moderate,
            pm25: 25.0,
            location: "Estimated".to_string(),
            timestamp: now,
            error: Some("Unable to fetch AQI data".to_string()),
        }
    }
}

/// Source of weather and air quality records.
///
/// Implementations must not fail: transport or data problems are turned
/// into the fallback records.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Current weather and today's rainfall.
    async fn current_weather(&self, latitude: f64, longitude: f64) -> WeatherReport;

    /// Nearest station's air quality.
    async fn air_quality(&self, latitude: f64, longitude: f64) -> AirQualityReport;
}

/// [`WeatherProvider`] backed by the public Open-Meteo and `OpenAQ` APIs.
#[derive(Debug, Clone)]
pub struct OpenDataClient {
    client: reqwest::Client,
    open_meteo: UpstreamService,
    openaq: UpstreamService,
}

impl OpenDataClient {
    /// Creates a client for explicit service configurations.
    #[must_use]
    pub const fn new(
        client: reqwest::Client,
        open_meteo: UpstreamService,
        openaq: UpstreamService,
    ) -> Self {
        Self {
            client,
            open_meteo,
            openaq,
        }
    }

    /// Creates a client from the embedded service registry, honoring the
    /// `OPEN_METEO_URL` / `OPENAQ_URL` overrides.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] if a service is missing from the registry
    /// or the HTTP client cannot be built.
    pub fn from_registry() -> Result<Self, UpstreamError> {
        let lookup = |id: &str| {
            service_registry::service(id).ok_or_else(|| UpstreamError::UnknownService(id.into()))
        };
        let open_meteo = lookup(service_registry::OPEN_METEO)?;
        let openaq = lookup(service_registry::OPENAQ)?;

        log::info!(
            "Upstream services: {} at {}, {} at {}",
            open_meteo.name,
            open_meteo.base_url,
            openaq.name,
            openaq.base_url
        );

        let client = reqwest::Client::builder()
            .user_agent(concat!("varun/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self::new(client, open_meteo, openaq))
    }

    async fn try_weather(&self, latitude: f64, longitude: f64) -> Result<WeatherReport, UpstreamError> {
        let body =
            open_meteo::fetch_forecast(&self.client, &self.open_meteo, latitude, longitude).await?;
        open_meteo::parse_forecast(&body, Utc::now())
    }

    async fn try_air_quality(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<AirQualityReport>, UpstreamError> {
        let body = openaq::fetch_latest(&self.client, &self.openaq, latitude, longitude).await?;
        openaq::parse_latest(&body, Utc::now())
    }
}

#[async_trait]
impl WeatherProvider for OpenDataClient {
    async fn current_weather(&self, latitude: f64, longitude: f64) -> WeatherReport {
        match self.try_weather(latitude, longitude).await {
            Ok(report) => report,
            Err(e) => {
                log::error!("Weather API error for ({latitude}, {longitude}): {e}");
                WeatherReport::fallback(Utc::now())
            }
        }
    }

    async fn air_quality(&self, latitude: f64, longitude: f64) -> AirQualityReport {
        match self.try_air_quality(latitude, longitude).await {
            Ok(Some(report)) => report,
            Ok(None) => {
                log::warn!("No PM2.5 station near ({latitude}, {longitude}), using fallback");
                AirQualityReport::fallback(Utc::now())
            }
            Err(e) => {
                log::error!("AQI API error for ({latitude}, {longitude}): {e}");
                AirQualityReport::fallback(Utc::now())
            }
        }
    }
}

/// Rounds to `digits` decimal places.
pub(crate) fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A client pointed at a closed local port.
    fn unreachable_client() -> OpenDataClient {
        let services = service_registry::all_services();
        let find = |id: &str| {
            services
                .iter()
                .find(|s| s.id == id)
                .cloned()
                .unwrap()
                .with_base_url(Some("http://127.0.0.1:9/unreachable".to_string()))
        };
        OpenDataClient::new(
            reqwest::Client::new(),
            find(service_registry::OPEN_METEO),
            find(service_registry::OPENAQ),
        )
    }

    #[test]
    fn weather_fallback_shape() {
        let report = WeatherReport::fallback(Utc::now());
        assert!((report.temperature - 28.0).abs() < f64::EPSILON);
        assert!((report.humidity - 65.0).abs() < f64::EPSILON);
        assert_eq!(report.weather_description, "Data Unavailable");
        assert_eq!(report.error.as_deref(), Some("Unable to fetch weather data"));
    }

    #[test]
    fn aqi_fallback_shape() {
        let report = AirQualityReport::fallback(Utc::now());
        assert_eq!(report.aqi, 65);
        assert_eq!(report.aqi_category, AqiCategory::Moderate);
        assert!((report.pm25 - 25.0).abs() < f64::EPSILON);
        assert_eq!(report.location, "Estimated");

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["aqi_category"], "Moderate");
        assert_eq!(json["error"], "Unable to fetch AQI data");
    }

    #[test]
    fn live_records_omit_error() {
        let mut report = AirQualityReport::fallback(Utc::now());
        report.error = None;
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("error").is_none());
    }

    #[tokio::test]
    async fn unreachable_upstreams_fall_back() {
        let client = unreachable_client();

        let weather = client.current_weather(13.08, 80.27).await;
        assert!(weather.error.is_some());
        assert_eq!(weather.weather_description, "Data Unavailable");

        let aqi = client.air_quality(13.08, 80.27).await;
        assert!(aqi.error.is_some());
        assert_eq!(aqi.aqi, 65);
    }

    #[test]
    fn rounds() {
        assert!((round_to(1.234_56, 2) - 1.23).abs() < 1e-12);
        assert!((round_to(28.06, 1) - 28.1).abs() < 1e-12);
    }
}
