//! Artificial recharge classification.
//!
//! Combines groundwater depth (meters below ground level) with the
//! permeability of the local aquifer into a qualitative recharge rating.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::{InvalidInputError, check_non_negative};

/// Groundwater depth band.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
)]
pub enum DepthClass {
    /// Shallower than 3 m.
    D1,
    /// 3 m to 10 m.
    D2,
    /// 10 m to 20 m.
    D3,
    /// 20 m to 40 m.
    D4,
    /// 40 m or deeper.
    D5,
}

impl DepthClass {
    /// Bands a depth in meters below ground level.
    #[must_use]
    pub fn from_depth(depth_m: f64) -> Self {
        if depth_m < 3.0 {
            Self::D1
        } else if depth_m < 10.0 {
            Self::D2
        } else if depth_m < 20.0 {
            Self::D3
        } else if depth_m < 40.0 {
            Self::D4
        } else {
            Self::D5
        }
    }

    /// Plain-language description of the band.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::D1 => "very shallow",
            Self::D2 => "shallow",
            Self::D3 => "moderate",
            Self::D4 => "deep",
            Self::D5 => "very deep",
        }
    }
}

/// Soil / aquifer permeability class.
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
pub enum Permeability {
    /// Clays and shales.
    Low,
    /// Hard rock, limestone, granite, basalt.
    Medium,
    /// Alluvium, sand, gravel.
    High,
}

impl Permeability {
    /// Classifies an aquifer material name. Unknown materials are medium.
    #[must_use]
    pub fn for_aquifer(aquifer: &str) -> Self {
        match aquifer.trim().to_ascii_lowercase().as_str() {
            "alluvium" | "sand" | "gravel" | "sandy" => Self::High,
            "clay" | "shale" | "clayey" => Self::Low,
            _ => Self::Medium,
        }
    }
}

/// Qualitative artificial recharge rating.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
)]
pub enum RechargeClass {
    /// Recharge structures are not worthwhile.
    #[serde(rename = "Very Low")]
    #[strum(serialize = "Very Low")]
    VeryLow,
    /// Limited benefit.
    Low,
    /// Worth doing with proper design.
    Medium,
    /// Good conditions.
    High,
    /// Excellent conditions.
    #[serde(rename = "Very High")]
    #[strum(serialize = "Very High")]
    VeryHigh,
}

impl RechargeClass {
    /// Looks up the depth × permeability matrix.
    #[must_use]
    pub const fn classify(depth: DepthClass, permeability: Permeability) -> Self {
        use Permeability::{High, Low, Medium};

        match (depth, permeability) {
            (DepthClass::D1, _) | (DepthClass::D2, Low) => Self::VeryLow,
            (DepthClass::D2, Medium) | (DepthClass::D3, Low) => Self::Low,
            (DepthClass::D2, High)
            | (DepthClass::D3, Medium)
            | (DepthClass::D4 | DepthClass::D5, Low) => Self::Medium,
            (DepthClass::D3, High) | (DepthClass::D4 | DepthClass::D5, Medium) => Self::High,
            (DepthClass::D4 | DepthClass::D5, High) => Self::VeryHigh,
        }
    }

    const fn advice(self) -> &'static str {
        match self {
            Self::VeryHigh | Self::High => "Excellent conditions for rainwater recharge structures.",
            Self::Medium => "Moderate conditions suitable for recharge with proper design.",
            Self::Low | Self::VeryLow => {
                "Limited recharge potential, consider alternative water conservation methods."
            }
        }
    }
}

/// Recharge assessment for a site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RechargeAssessment {
    /// Groundwater depth, meters below ground level.
    pub groundwater_level_m_bgl: f64,
    /// Depth band.
    pub depth_class: DepthClass,
    /// Aquifer material as supplied.
    pub aquifer: String,
    /// Permeability derived from the aquifer.
    pub soil_permeability_class: Permeability,
    /// Recharge rating.
    pub recharge_potential: RechargeClass,
    /// One-line summary.
    pub short_reason: String,
    /// Full explanation.
    pub details: String,
}

/// Classifies the artificial recharge potential of a site.
///
/// # Errors
///
/// Returns [`InvalidInputError`] if `groundwater_depth_m` is negative or
/// not finite.
pub fn classify_recharge(
    groundwater_depth_m: f64,
    aquifer: &str,
) -> Result<RechargeAssessment, InvalidInputError> {
    let depth = check_non_negative("groundwater_depth", groundwater_depth_m)?;
    let depth_class = DepthClass::from_depth(depth);
    let permeability = Permeability::for_aquifer(aquifer);
    let rating = RechargeClass::classify(depth_class, permeability);
    let depth_desc = depth_class.description();

    let short_reason = format!(
        "Groundwater at {depth}m depth ({depth_desc}) with {permeability} permeability {aquifer} aquifer."
    );
    let details = format!(
        "The site has {depth_desc} groundwater ({depth_class}: {depth}m bgl) in {aquifer} aquifer \
         with {permeability} soil permeability. This combination yields {} artificial recharge \
         potential. {}",
        rating.to_string().to_lowercase(),
        rating.advice(),
    );

    Ok(RechargeAssessment {
        groundwater_level_m_bgl: depth,
        depth_class,
        aquifer: aquifer.to_string(),
        soil_permeability_class: permeability,
        recharge_potential: rating,
        short_reason,
        details,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_bands() {
        assert_eq!(DepthClass::from_depth(0.0), DepthClass::D1);
        assert_eq!(DepthClass::from_depth(2.99), DepthClass::D1);
        assert_eq!(DepthClass::from_depth(3.0), DepthClass::D2);
        assert_eq!(DepthClass::from_depth(10.0), DepthClass::D3);
        assert_eq!(DepthClass::from_depth(39.9), DepthClass::D4);
        assert_eq!(DepthClass::from_depth(40.0), DepthClass::D5);
    }

    #[test]
    fn aquifer_permeability() {
        assert_eq!(Permeability::for_aquifer("alluvium"), Permeability::High);
        assert_eq!(Permeability::for_aquifer("Gravel"), Permeability::High);
        assert_eq!(Permeability::for_aquifer("shale"), Permeability::Low);
        assert_eq!(Permeability::for_aquifer("basalt"), Permeability::Medium);
        assert_eq!(Permeability::for_aquifer("unobtainium"), Permeability::Medium);
    }

    #[test]
    fn matrix_matches_table() {
        use Permeability::{High, Low, Medium};
        use RechargeClass as R;

        let table = [
            (DepthClass::D1, [R::VeryLow, R::VeryLow, R::VeryLow]),
            (DepthClass::D2, [R::VeryLow, R::Low, R::Medium]),
            (DepthClass::D3, [R::Low, R::Medium, R::High]),
            (DepthClass::D4, [R::Medium, R::High, R::VeryHigh]),
            (DepthClass::D5, [R::Medium, R::High, R::VeryHigh]),
        ];
        for (depth, row) in table {
            for (perm, expected) in [Low, Medium, High].into_iter().zip(row) {
                assert_eq!(RechargeClass::classify(depth, perm), expected, "{depth} {perm}");
            }
        }
    }

    #[test]
    fn explains_deep_sandy_site() {
        let result = classify_recharge(25.0, "sand").unwrap();
        assert_eq!(result.depth_class, DepthClass::D4);
        assert_eq!(result.recharge_potential, RechargeClass::VeryHigh);
        assert_eq!(
            result.short_reason,
            "Groundwater at 25m depth (deep) with high permeability sand aquifer."
        );
        assert!(result.details.contains("very high artificial recharge potential"));
        assert!(result.details.ends_with("Excellent conditions for rainwater recharge structures."));
    }

    #[test]
    fn rejects_negative_depth() {
        assert!(classify_recharge(-2.0, "clay").is_err());
    }

    #[test]
    fn serializes_with_spaces() {
        let json = serde_json::to_value(RechargeClass::VeryLow).unwrap();
        assert_eq!(json, serde_json::json!("Very Low"));
    }
}
