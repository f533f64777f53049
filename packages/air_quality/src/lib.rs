#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! PM2.5 concentration to US EPA Air Quality Index.
//!
//! The AQI is a piecewise-linear interpolation over six breakpoint bands,
//! truncated to an integer. See
//! <https://www.airnow.gov/aqi/aqi-basics/> for the category scale.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// AQI category, ordered from cleanest to worst.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum AqiCategory {
    /// 0-50
    Good,
    /// 51-100
    Moderate,
    /// 101-150
    #[serde(rename = "Unhealthy for Sensitive Groups")]
    #[strum(serialize = "Unhealthy for Sensitive Groups")]
    UnhealthyForSensitiveGroups,
    /// 151-200
    Unhealthy,
    /// 201-300
    #[serde(rename = "Very Unhealthy")]
    #[strum(serialize = "Very Unhealthy")]
    VeryUnhealthy,
    /// Above 300
    Hazardous,
}

impl AqiCategory {
    /// Returns every category in ascending severity.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Good,
            Self::Moderate,
            Self::UnhealthyForSensitiveGroups,
            Self::Unhealthy,
            Self::VeryUnhealthy,
            Self::Hazardous,
        ]
    }

    /// Maps an AQI value to its category.
    #[must_use]
    pub const fn from_aqi(aqi: u32) -> Self {
        match aqi {
            0..=50 => Self::Good,
            51..=100 => Self::Moderate,
            101..=150 => Self::UnhealthyForSensitiveGroups,
            151..=200 => Self::Unhealthy,
            201..=300 => Self::VeryUnhealthy,
            _ => Self::Hazardous,
        }
    }
}

/// One PM2.5 breakpoint band.
#[derive(Debug, Clone, Copy)]
struct Breakpoint {
    /// Inclusive upper concentration bound used to select the band.
    conc_high: f64,
    /// Concentration the interpolation starts from.
    conc_low: f64,
    /// Concentration width the AQI span is spread over.
    conc_span: f64,
    /// AQI at `conc_low`.
    aqi_low: f64,
    /// AQI width of the band.
    aqi_span: f64,
}

const PM25_BREAKPOINTS: [Breakpoint; 6] = [
    Breakpoint {
        conc_high: 12.0,
        conc_low: 0.0,
        conc_span: 12.0,
        aqi_low: 0.0,
        aqi_span: 50.0,
    },
    Breakpoint {
        conc_high: 35.4,
        conc_low: 12.1,
        conc_span: 23.3,
        aqi_low: 50.0,
        aqi_span: 50.0,
    },
    Breakpoint {
        conc_high: 55.4,
        conc_low: 35.5,
        conc_span: 19.9,
        aqi_low: 100.0,
        aqi_span: 50.0,
    },
    Breakpoint {
        conc_high: 150.4,
        conc_low: 55.5,
        conc_span: 94.9,
        aqi_low: 150.0,
        aqi_span: 50.0,
    },
    Breakpoint {
        conc_high: 250.4,
        conc_low: 150.5,
        conc_span: 99.9,
        aqi_low: 200.0,
        aqi_span: 100.0,
    },
    Breakpoint {
        conc_high: f64::INFINITY,
        conc_low: 250.5,
        conc_span: 250.0,
        aqi_low: 300.0,
        aqi_span: 200.0,
    },
];

/// Error returned for PM2.5 values that cannot be normalized.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum InvalidInputError {
    /// Concentration below zero.
    #[error("pm25 must not be negative (got {0})")]
    Negative(f64),
    /// NaN or infinite concentration.
    #[error("pm25 must be a finite number (got {0})")]
    NotFinite(f64),
}

/// Normalized air quality reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AqiReport {
    /// US EPA AQI (unbounded above 500 for extreme inputs).
    pub aqi: u32,
    /// Category for [`Self::aqi`].
    pub category: AqiCategory,
}

/// Converts a PM2.5 concentration (µg/m³) into an AQI value and category.
///
/// Concentrations in the gaps between bands (e.g. 12.05) are pinned to
/// the bottom of the next band, so the result never decreases as the
/// concentration rises.
///
/// # Errors
///
/// Returns [`InvalidInputError`] if `pm25` is negative or not finite.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::suboptimal_flops
)]
pub fn normalize_air_quality(pm25: f64) -> Result<AqiReport, InvalidInputError> {
    if !pm25.is_finite() {
        return Err(InvalidInputError::NotFinite(pm25));
    }
    if pm25 < 0.0 {
        return Err(InvalidInputError::Negative(pm25));
    }

    let band = PM25_BREAKPOINTS
        .iter()
        .find(|b| pm25 <= b.conc_high)
        .unwrap_or(&PM25_BREAKPOINTS[PM25_BREAKPOINTS.len() - 1]);

    let offset = (pm25 - band.conc_low).max(0.0);
    let value = band.aqi_low + (band.aqi_span / band.conc_span) * offset;
    let aqi = value.trunc() as u32;

    Ok(AqiReport {
        aqi,
        category: AqiCategory::from_aqi(aqi),
    })
}
