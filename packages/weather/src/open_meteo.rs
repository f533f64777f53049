//! Open-Meteo forecast client.
//!
//! Free, no API key. Only the current conditions and today's hourly
//! precipitation are requested.
//!
//! See <https://open-meteo.com/en/docs>

use chrono::{DateTime, Utc};

use crate::service_registry::UpstreamService;
use crate::{UpstreamError, WeatherReport, round_to};

const CURRENT_FIELDS: &str =
    "temperature_2m,relative_humidity_2m,precipitation,weather_code,wind_speed_10m";

/// WMO weather interpretation codes used by Open-Meteo.
const WEATHER_DESCRIPTIONS: &[(i64, &str)] = &[
    (0, "Clear Sky"),
    (1, "Mainly Clear"),
    (2, "Partly Cloudy"),
    (3, "Overcast"),
    (45, "Foggy"),
    (48, "Foggy"),
    (51, "Light Drizzle"),
    (53, "Drizzle"),
    (55, "Heavy Drizzle"),
    (61, "Light Rain"),
    (63, "Rain"),
    (65, "Heavy Rain"),
    (71, "Light Snow"),
    (73, "Snow"),
    (75, "Heavy Snow"),
    (80, "Light Showers"),
    (81, "Showers"),
    (82, "Heavy Showers"),
    (95, "Thunderstorm"),
    (96, "Thunderstorm with Hail"),
    (99, "Thunderstorm with Hail"),
];

/// Describes a WMO weather code, or `"Unknown"`.
#[must_use]
pub fn describe_weather_code(code: i64) -> &'static str {
    WEATHER_DESCRIPTIONS
        .iter()
        .find(|(c, _)| *c == code)
        .map_or("Unknown", |(_, desc)| *desc)
}

/// Fetches the raw forecast JSON for a location.
///
/// # Errors
///
/// Returns [`UpstreamError`] on transport failure, timeout, a non-2xx
/// status, or an undecodable body.
pub async fn fetch_forecast(
    client: &reqwest::Client,
    service: &UpstreamService,
    latitude: f64,
    longitude: f64,
) -> Result<serde_json::Value, UpstreamError> {
    let resp = client
        .get(&service.base_url)
        .query(&[
            ("latitude", latitude.to_string()),
            ("longitude", longitude.to_string()),
            ("current", CURRENT_FIELDS.to_string()),
            ("hourly", "precipitation".to_string()),
            ("timezone", "auto".to_string()),
            ("forecast_days", "1".to_string()),
        ])
        .timeout(service.timeout())
        .send()
        .await?
        .error_for_status()?;

    Ok(resp.json().await?)
}

/// Parses an Open-Meteo forecast response.
///
/// Missing fields default to zero, matching how the mobile app renders
/// partial data.
///
/// # Errors
///
/// Returns [`UpstreamError::Parse`] if the body is not a JSON object.
pub fn parse_forecast(
    body: &serde_json::Value,
    now: DateTime<Utc>,
) -> Result<WeatherReport, UpstreamError> {
    if !body.is_object() {
        return Err(UpstreamError::Parse {
            message: "Open-Meteo response is not an object".to_string(),
        });
    }

    let current = &body["current"];
    let rainfall_today: f64 = body["hourly"]["precipitation"]
        .as_array()
        .map(|values| values.iter().filter_map(serde_json::Value::as_f64).sum())
        .unwrap_or(0.0);

    let weather_code = current["weather_code"].as_i64().unwrap_or(0);

    Ok(WeatherReport {
        temperature: round_to(current["temperature_2m"].as_f64().unwrap_or(0.0), 1),
        humidity: current["relative_humidity_2m"].as_f64().unwrap_or(0.0),
        precipitation_current: current["precipitation"].as_f64().unwrap_or(0.0),
        rainfall_today: round_to(rainfall_today, 2),
        weather_description: describe_weather_code(weather_code).to_string(),
        weather_code,
        wind_speed: round_to(current["wind_speed_10m"].as_f64().unwrap_or(0.0), 1),
        timestamp: now,
        error: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_forecast() {
        let body = serde_json::json!({
            "current": {
                "temperature_2m": 31.46,
                "relative_humidity_2m": 72,
                "precipitation": 0.4,
                "weather_code": 63,
                "wind_speed_10m": 12.34
            },
            "hourly": {
                "precipitation": [0.0, 1.25, null, 2.5, 0.004]
            }
        });
        let report = parse_forecast(&body, Utc::now()).unwrap();
        assert!((report.temperature - 31.5).abs() < 1e-9);
        assert!((report.humidity - 72.0).abs() < 1e-9);
        assert!((report.precipitation_current - 0.4).abs() < 1e-9);
        assert!((report.rainfall_today - 3.75).abs() < 1e-9);
        assert_eq!(report.weather_code, 63);
        assert_eq!(report.weather_description, "Rain");
        assert!((report.wind_speed - 12.3).abs() < 1e-9);
        assert!(report.error.is_none());
    }

    #[test]
    fn missing_sections_default_to_zero() {
        let report = parse_forecast(&serde_json::json!({}), Utc::now()).unwrap();
        assert!(report.temperature.abs() < f64::EPSILON);
        assert!(report.rainfall_today.abs() < f64::EPSILON);
        assert_eq!(report.weather_code, 0);
        assert_eq!(report.weather_description, "Clear Sky");
    }

    #[test]
    fn rejects_non_object() {
        assert!(parse_forecast(&serde_json::json!([1, 2]), Utc::now()).is_err());
    }

    #[test]
    fn describes_codes() {
        assert_eq!(describe_weather_code(48), "Foggy");
        assert_eq!(describe_weather_code(99), "Thunderstorm with Hail");
        assert_eq!(describe_weather_code(42), "Unknown");
    }
}
