#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Rainwater harvesting feasibility calculator.
//!
//! Turns a roof catchment (area in square feet), the site's annual
//! rainfall (mm/year) and its soil type into a [`FeasibilityReport`]:
//! harvestable liters, recharge potential, installation cost, payback
//! period, and tank / recharge pit sizing.
//!
//! Everything here is a pure function of its input. The weighting and
//! cost constants are heuristics; stored reports depend on their exact
//! values.

pub mod recharge;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Fraction of rainfall on a concrete roof that becomes collectible runoff.
pub const RUNOFF_COEFFICIENT: f64 = 0.85;

/// Folds square feet × millimeters into liters.
pub const LITERS_CONVERSION_FACTOR: f64 = 0.0254;

/// Percolation rate (mm/hour) used for soils not in [`SoilType`].
pub const DEFAULT_PERCOLATION_RATE: f64 = 10.0;

/// Percolation rate that counts as "fully rechargeable" (sandy soil).
const REFERENCE_PERCOLATION_RATE: f64 = 25.0;

/// Fixed installation cost, in currency units.
pub const BASE_COST: f64 = 15_000.0;

/// Installation cost per square foot of roof.
pub const COST_PER_SQ_FT: f64 = 50.0;

/// Avoided tanker-water cost per liter (1000 per 5000 L).
pub const TANKER_COST_PER_LITER: f64 = 0.2;

/// Payback period reported when the system never saves anything.
pub const ROI_SATURATION_MONTHS: u32 = 120;

/// Share of the annual harvest the storage tank should hold.
const TANK_FRACTION: f64 = 0.1;

/// Recharge pit footprint per square foot of roof.
const PIT_AREA_FRACTION: f64 = 0.05;

/// The only system design currently recommended.
pub const SYSTEM_RECOMMENDATION: &str =
    "Rooftop Rainwater Harvesting with Underground Tank and Recharge Pit";

/// Soil types with a known percolation rate.
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
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SoilType {
    /// Dense, slow-draining soil.
    Clay,
    /// Fast-draining soil; the recharge reference.
    Sandy,
    /// Mixed soil with moderate drainage.
    Loamy,
    /// Shallow soil over rock, barely percolates.
    Rocky,
}

impl SoilType {
    /// Returns every known soil type.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Clay, Self::Sandy, Self::Loamy, Self::Rocky]
    }

    /// Infiltration speed in mm/hour.
    #[must_use]
    pub const fn percolation_rate(self) -> f64 {
        match self {
            Self::Clay => 2.5,
            Self::Sandy => 25.0,
            Self::Loamy => 13.0,
            Self::Rocky => 0.5,
        }
    }
}

/// Looks up the percolation rate for a free-form soil name.
///
/// Names are matched exactly against the lowercase [`SoilType`] names;
/// anything else gets [`DEFAULT_PERCOLATION_RATE`].
#[must_use]
pub fn percolation_rate(soil_type: &str) -> f64 {
    soil_type
        .parse::<SoilType>()
        .map_or(DEFAULT_PERCOLATION_RATE, SoilType::percolation_rate)
}

/// Error returned when a calculator input is out of its domain.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum InvalidInputError {
    /// The value is below zero.
    #[error("{field} must not be negative (got {value})")]
    Negative {
        /// Name of the offending input.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// The value is NaN or infinite.
    #[error("{field} must be a finite number (got {value})")]
    NotFinite {
        /// Name of the offending input.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// The inputs are individually valid but a derived quantity overflows.
    #[error("inputs are too large: {field} would be {value}")]
    OutOfRange {
        /// Name of the derived quantity.
        field: &'static str,
        /// The overflowing value.
        value: f64,
    },
}

/// Rejects negative and non-finite values.
pub(crate) fn check_non_negative(field: &'static str, value: f64) -> Result<f64, InvalidInputError> {
    if !value.is_finite() {
        return Err(InvalidInputError::NotFinite { field, value });
    }
    if value < 0.0 {
        return Err(InvalidInputError::Negative { field, value });
    }
    Ok(value)
}

/// Validated inputs to the feasibility calculation.
#[derive(Debug, Clone, PartialEq)]
pub struct FeasibilityInput {
    roof_area: f64,
    annual_rainfall: f64,
    soil_type: String,
}

impl FeasibilityInput {
    /// Validates the raw inputs.
    ///
    /// Zero area or rainfall is accepted and produces a degenerate report.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInputError`] if `roof_area` or `annual_rainfall` is
    /// negative, NaN, or infinite, or if their product is too large for the
    /// report to hold finite values.
    pub fn new(
        roof_area: f64,
        annual_rainfall: f64,
        soil_type: impl Into<String>,
    ) -> Result<Self, InvalidInputError> {
        let input = Self {
            roof_area: check_non_negative("roof_area", roof_area)?,
            annual_rainfall: check_non_negative("annual_rainfall", annual_rainfall)?,
            soil_type: soil_type.into(),
        };
        input.check_range()?;
        Ok(input)
    }

    /// Every other real output is bounded by `liters_potential` or
    /// `cost_estimation`; both must survive rounding.
    #[allow(clippy::cast_precision_loss)]
    fn check_range(&self) -> Result<(), InvalidInputError> {
        let liters_potential = self.liters_potential();
        if !(liters_potential * 100.0).is_finite() {
            return Err(InvalidInputError::OutOfRange {
                field: "liters_potential",
                value: liters_potential,
            });
        }
        let cost_estimation = self.cost_estimation();
        if !(cost_estimation * 100.0).is_finite() {
            return Err(InvalidInputError::OutOfRange {
                field: "cost_estimation",
                value: cost_estimation,
            });
        }
        let pit_area = self.roof_area * PIT_AREA_FRACTION;
        if pit_area >= u64::MAX as f64 {
            return Err(InvalidInputError::OutOfRange {
                field: "recharge_pit_size",
                value: pit_area,
            });
        }
        Ok(())
    }

    fn liters_potential(&self) -> f64 {
        self.roof_area * self.annual_rainfall * RUNOFF_COEFFICIENT * LITERS_CONVERSION_FACTOR
    }

    #[allow(clippy::suboptimal_flops)]
    fn cost_estimation(&self) -> f64 {
        BASE_COST + self.roof_area * COST_PER_SQ_FT
    }

    /// Roof catchment area in square feet.
    #[must_use]
    pub const fn roof_area(&self) -> f64 {
        self.roof_area
    }

    /// Annual rainfall in mm/year.
    #[must_use]
    pub const fn annual_rainfall(&self) -> f64 {
        self.annual_rainfall
    }

    /// Soil type as supplied by the caller.
    #[must_use]
    pub fn soil_type(&self) -> &str {
        &self.soil_type
    }

    /// Runs the feasibility calculation.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn compute(&self) -> FeasibilityReport {
        let liters_potential = self.liters_potential();

        let recharge_potential = liters_potential
            * (percolation_rate(&self.soil_type) / REFERENCE_PERCOLATION_RATE);

        let feasibility_score = (liters_potential / 100.0 + recharge_potential / 50.0).min(100.0);

        let cost_estimation = self.cost_estimation();

        let monthly_savings = (liters_potential / 12.0) * TANKER_COST_PER_LITER;
        // Vanishing savings saturate at `u32::MAX` months.
        let roi_months = if monthly_savings > 0.0 {
            (cost_estimation / monthly_savings).floor() as u32
        } else {
            ROI_SATURATION_MONTHS
        };

        let pit_area = (self.roof_area * PIT_AREA_FRACTION).floor() as u64;

        FeasibilityReport {
            feasibility_score: round2(feasibility_score),
            liters_potential: round2(liters_potential),
            recharge_potential: round2(recharge_potential),
            cost_estimation: round2(cost_estimation),
            roi_months,
            tank_capacity: round2(liters_potential * TANK_FRACTION),
            recharge_pit_size: format!("{pit_area}sq ft x 6ft deep"),
            system_recommendation: SYSTEM_RECOMMENDATION.to_string(),
        }
    }
}

/// Result of a feasibility calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeasibilityReport {
    /// Heuristic 0-100 score (capped at 100).
    pub feasibility_score: f64,
    /// Harvestable water per year, liters.
    pub liters_potential: f64,
    /// Share of the harvest usable for groundwater recharge, liters/year.
    pub recharge_potential: f64,
    /// Installation cost estimate.
    pub cost_estimation: f64,
    /// Months until the system pays for itself.
    pub roi_months: u32,
    /// Recommended storage tank size, liters.
    pub tank_capacity: f64,
    /// Recharge pit dimensions, e.g. `"50sq ft x 6ft deep"`.
    pub recharge_pit_size: String,
    /// Recommended system design.
    pub system_recommendation: String,
}

/// Computes a feasibility report from raw inputs.
///
/// # Errors
///
/// Returns [`InvalidInputError`] if `roof_area` or `annual_rainfall` is
/// negative or not finite, or if the report would overflow.
pub fn compute_feasibility(
    roof_area: f64,
    annual_rainfall: f64,
    soil_type: &str,
) -> Result<FeasibilityReport, InvalidInputError> {
    FeasibilityInput::new(roof_area, annual_rainfall, soil_type).map(|input| input.compute())
}

/// Rounds to 2 decimal places.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn loamy_reference_scenario() {
        let report = compute_feasibility(1000.0, 1000.0, "loamy").unwrap();

        assert!(close(report.liters_potential, 21_590.0));
        assert!(close(report.recharge_potential, 11_226.8));
        assert!(close(report.feasibility_score, 100.0));
        assert!(close(report.cost_estimation, 65_000.0));
        assert_eq!(report.roi_months, 180);
        assert!(close(report.tank_capacity, 2159.0));
        assert_eq!(report.recharge_pit_size, "50sq ft x 6ft deep");
        assert_eq!(report.system_recommendation, SYSTEM_RECOMMENDATION);
    }

    #[test]
    fn zero_inputs_give_degenerate_report() {
        let report = compute_feasibility(0.0, 0.0, "clay").unwrap();

        assert!(close(report.liters_potential, 0.0));
        assert!(close(report.recharge_potential, 0.0));
        assert!(close(report.feasibility_score, 0.0));
        assert!(close(report.cost_estimation, 15_000.0));
        assert_eq!(report.roi_months, ROI_SATURATION_MONTHS);
        assert_eq!(report.recharge_pit_size, "0sq ft x 6ft deep");
    }

    #[test]
    fn zero_rainfall_saturates_roi() {
        let report = compute_feasibility(500.0, 0.0, "sandy").unwrap();
        assert_eq!(report.roi_months, ROI_SATURATION_MONTHS);
        assert!(close(report.cost_estimation, 40_000.0));
    }

    #[test]
    fn rejects_negative_inputs() {
        assert_eq!(
            compute_feasibility(-1.0, 1000.0, "loamy"),
            Err(InvalidInputError::Negative {
                field: "roof_area",
                value: -1.0
            })
        );
        assert_eq!(
            compute_feasibility(100.0, -0.5, "loamy"),
            Err(InvalidInputError::Negative {
                field: "annual_rainfall",
                value: -0.5
            })
        );
    }

    #[test]
    fn rejects_non_finite_inputs() {
        assert!(matches!(
            compute_feasibility(f64::NAN, 1000.0, "loamy"),
            Err(InvalidInputError::NotFinite {
                field: "roof_area",
                ..
            })
        ));
        assert!(matches!(
            compute_feasibility(100.0, f64::INFINITY, "loamy"),
            Err(InvalidInputError::NotFinite {
                field: "annual_rainfall",
                ..
            })
        ));
    }

    #[test]
    fn rejects_overflowing_product() {
        assert!(matches!(
            compute_feasibility(1e200, 1e200, "loamy"),
            Err(InvalidInputError::OutOfRange {
                field: "liters_potential",
                ..
            })
        ));
        assert!(matches!(
            compute_feasibility(1e307, 0.0, "loamy"),
            Err(InvalidInputError::OutOfRange {
                field: "cost_estimation",
                ..
            })
        ));
        assert!(matches!(
            compute_feasibility(1e21, 1.0, "clay"),
            Err(InvalidInputError::OutOfRange {
                field: "recharge_pit_size",
                ..
            })
        ));
    }

    #[test]
    fn large_but_representable_inputs_stay_finite() {
        let report = compute_feasibility(1e9, 1e6, "sandy").unwrap();
        for value in [
            report.liters_potential,
            report.recharge_potential,
            report.cost_estimation,
            report.tank_capacity,
        ] {
            assert!(value.is_finite());
        }
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["liters_potential"].is_f64());
        assert_eq!(report.recharge_pit_size, "50000000sq ft x 6ft deep");
    }

    #[test]
    fn unknown_soil_uses_default_rate() {
        for soil in ["", "peat", "Loamy", "silt"] {
            let report = compute_feasibility(120.0, 800.0, soil).unwrap();
            let expected = round2(120.0 * 800.0 * 0.85 * 0.0254 * (10.0 / 25.0));
            assert!(
                close(report.recharge_potential, expected),
                "{soil:?}: {} != {expected}",
                report.recharge_potential
            );
        }
    }

    #[test]
    fn known_soils_parse() {
        for soil in SoilType::all() {
            assert_eq!(soil.to_string().parse::<SoilType>().unwrap(), *soil);
            assert!(close(percolation_rate(soil.as_ref()), soil.percolation_rate()));
        }
        assert!(close(percolation_rate("rocky"), 0.5));
        assert!(close(percolation_rate("gravel"), DEFAULT_PERCOLATION_RATE));
    }

    #[test]
    fn score_is_capped() {
        for (area, rain) in [(10.0, 10.0), (1e4, 3000.0), (1e7, 1e5)] {
            for soil in ["clay", "sandy", "loamy", "rocky", "other"] {
                let report = compute_feasibility(area, rain, soil).unwrap();
                assert!(report.feasibility_score <= 100.0);
            }
        }
    }

    #[test]
    fn liters_monotonic_in_area_and_rainfall() {
        let steps = [0.0, 1.0, 12.5, 100.0, 450.0, 1000.0, 2500.0];
        for &rain in &steps {
            let mut prev = 0.0;
            for &area in &steps {
                let liters = compute_feasibility(area, rain, "clay").unwrap().liters_potential;
                assert!(liters >= prev, "area {area}, rain {rain}");
                prev = liters;
            }
        }
        for &area in &steps {
            let mut prev = 0.0;
            for &rain in &steps {
                let liters = compute_feasibility(area, rain, "clay").unwrap().liters_potential;
                assert!(liters >= prev, "area {area}, rain {rain}");
                prev = liters;
            }
        }
    }

    #[test]
    fn repeated_calls_are_identical() {
        let a = compute_feasibility(873.3, 1234.5, "sandy").unwrap();
        let b = compute_feasibility(873.3, 1234.5, "sandy").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.liters_potential.to_bits(), b.liters_potential.to_bits());
    }

    #[test]
    fn pit_size_floors_area() {
        let report = compute_feasibility(399.0, 900.0, "rocky").unwrap();
        assert_eq!(report.recharge_pit_size, "19sq ft x 6ft deep");
    }
}
