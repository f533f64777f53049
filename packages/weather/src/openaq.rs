//! `OpenAQ` latest-measurements client.
//!
//! Looks up the nearest monitoring station within 25 km and normalizes its
//! PM2.5 reading into a US EPA AQI.
//!
//! See <https://docs.openaq.org/>

use chrono::{DateTime, Utc};
use varun_air_quality::normalize_air_quality;

use crate::service_registry::UpstreamService;
use crate::{AirQualityReport, UpstreamError, round_to};

/// Search radius around the requested point, meters.
const SEARCH_RADIUS_M: &str = "25000";

/// Fetches the raw latest-measurements JSON nearest to a location.
///
/// # Errors
///
/// Returns [`UpstreamError`] on transport failure, timeout, a non-2xx
/// status, or an undecodable body.
pub async fn fetch_latest(
    client: &reqwest::Client,
    service: &UpstreamService,
    latitude: f64,
    longitude: f64,
) -> Result<serde_json::Value, UpstreamError> {
    let resp = client
        .get(&service.base_url)
        .query(&[
            ("coordinates", format!("{latitude},{longitude}")),
            ("radius", SEARCH_RADIUS_M.to_string()),
            ("limit", "1".to_string()),
            ("order_by", "distance".to_string()),
        ])
        .timeout(service.timeout())
        .send()
        .await?
        .error_for_status()?;

    Ok(resp.json().await?)
}

/// Parses an `OpenAQ` latest response.
///
/// Returns `None` when no station or no PM2.5 measurement is present.
///
/// # Errors
///
/// Returns [`UpstreamError::InvalidReading`] if the station reports a
/// negative or non-finite PM2.5 value.
pub fn parse_latest(
    body: &serde_json::Value,
    now: DateTime<Utc>,
) -> Result<Option<AirQualityReport>, UpstreamError> {
    let Some(station) = body["results"].as_array().and_then(|r| r.first()) else {
        return Ok(None);
    };

    let pm25 = station["measurements"].as_array().and_then(|measurements| {
        measurements
            .iter()
            .find(|m| m["parameter"].as_str() == Some("pm25"))
    });
    let Some(pm25) = pm25 else {
        return Ok(None);
    };

    let value = pm25["value"].as_f64().unwrap_or(0.0);
    let normalized = normalize_air_quality(value)?;

    Ok(Some(AirQualityReport {
        aqi: normalized.aqi,
        aqi_category: normalized.category,
        pm25: round_to(value, 2),
        location: station["location"]
            .as_str()
            .unwrap_or("Unknown")
            .to_string(),
        timestamp: now,
        error: None,
    }))
}
