#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the Varun server.
//!
//! Types that are persisted (users, assessments, bookings, ...) double as
//! the stored document shape, so the JSON field names here are also the
//! document store's field names. All JSON is `snake_case`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use varun_feasibility::{FeasibilityReport, SoilType};
use varun_weather::{AirQualityReport, WeatherReport};

/// Serializes document timestamps with a fixed width so that string
/// ordering matches chronological ordering.
pub mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serializes as `YYYY-MM-DDTHH:MM:SS.ffffffZ`.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Micros, true))
    }

    /// Accepts any RFC 3339 timestamp.
    ///
    /// # Errors
    ///
    /// Fails if the value is not an RFC 3339 string.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        DateTime::<Utc>::deserialize(deserializer)
    }
}

/// Banner returned by `GET /api/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiRoot {
    /// Service name.
    pub message: String,
    /// API version.
    pub version: String,
    /// Always `"running"`.
    pub status: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// Plain acknowledgement body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Human-readable message.
    pub message: String,
}

impl MessageResponse {
    /// Creates a message body.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ==================== Users ====================

/// `POST /api/auth/register` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRegister {
    /// Display name.
    pub name: String,
    /// Login email; unique across users.
    pub email: String,
    /// Optional phone number.
    #[serde(default)]
    pub phone: Option<String>,
    /// Accepted for client compatibility. Never stored.
    pub password: String,
}

/// `POST /api/auth/register` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    /// Acknowledgement.
    pub message: String,
    /// Generated user ID.
    pub user_id: String,
    /// Registered email.
    pub email: String,
}

/// `POST /api/auth/login` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserLogin {
    /// Login email.
    pub email: String,
    /// Accepted for client compatibility. Never checked.
    pub password: String,
}

/// `POST /api/auth/login` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Acknowledgement.
    pub message: String,
    /// The user's ID.
    pub user_id: String,
    /// The user's display name.
    pub name: String,
    /// The user's email.
    pub email: String,
}

fn default_language() -> String {
    "en".to_string()
}

/// A registered user (stored in `users`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Opaque user ID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// Phone number.
    #[serde(default)]
    pub phone: Option<String>,
    /// Free-form location object supplied by the client.
    #[serde(default)]
    pub location: Option<serde_json::Value>,
    /// UI language code.
    #[serde(default = "default_language")]
    pub language: String,
    /// Registration time.
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    /// Cumulative harvested water, liters.
    #[serde(default)]
    pub total_liters_saved: f64,
    /// Number of badges earned.
    #[serde(default)]
    pub badges_earned: u32,
    /// Consecutive active days.
    #[serde(default)]
    pub streak_days: u32,
}

impl User {
    /// Creates a new user from a registration request.
    #[must_use]
    pub fn register(id: String, request: UserRegister, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: request.name,
            email: request.email,
            phone: request.phone,
            location: None,
            language: default_language(),
            created_at,
            total_liters_saved: 0.0,
            badges_earned: 0,
            streak_days: 0,
        }
    }
}

// ==================== Assessments ====================

/// Site survey submitted by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentInput {
    /// Submitting user.
    pub user_id: String,
    /// Roof catchment area, square feet.
    pub roof_area: f64,
    /// Annual rainfall, mm.
    pub annual_rainfall: f64,
    /// Groundwater depth below ground, meters.
    #[serde(default)]
    pub groundwater_depth: Option<f64>,
    /// Free-form soil name; see [`SoilType`].
    pub soil_type: String,
    /// Site coordinates (`latitude`, `longitude`).
    #[serde(default)]
    pub location: Option<BTreeMap<String, f64>>,
    /// Photo URLs or encoded images.
    #[serde(default)]
    pub photos: Vec<String>,
}

/// A stored assessment (stored in `assessments`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    /// Opaque assessment ID.
    pub id: String,
    /// Submitted survey.
    #[serde(flatten)]
    pub input: AssessmentInput,
    /// Submission time.
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Feasibility outcome for an assessment (stored in
/// `feasibility_results`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeasibilityResult {
    /// Opaque result ID.
    pub id: String,
    /// Assessment this result was computed for.
    pub assessment_id: String,
    /// The computed figures.
    #[serde(flatten)]
    pub report: FeasibilityReport,
    /// Computation time.
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// `POST /api/feasibility/calculate` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeasibilityRequest {
    /// Roof catchment area, square feet.
    pub roof_area: f64,
    /// Annual rainfall, mm.
    pub annual_rainfall: f64,
    /// Free-form soil name.
    pub soil_type: String,
}

/// Query parameters for `GET /api/recharge/classify`.
#[derive(Debug, Clone, Deserialize)]
pub struct RechargeQueryParams {
    /// Groundwater depth below ground, meters.
    pub groundwater_depth: f64,
    /// Aquifer name, e.g. `"alluvium"` or `"hard rock"`.
    pub aquifer: String,
}

// ==================== Dashboard ====================

/// Per-user dashboard figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardData {
    /// Rain so far today, mm.
    pub rainfall_today: f64,
    /// Groundwater depth, meters below ground.
    pub groundwater_depth: f64,
    /// Storage tank fill, percent.
    pub tank_level: f64,
    /// Water harvested today, liters.
    pub liters_saved_today: f64,
    /// Water harvested this month, liters.
    pub liters_saved_month: f64,
    /// Cumulative harvested water, liters.
    pub liters_saved_total: f64,
    /// Avoided emissions, kg CO2.
    pub carbon_saved: f64,
    /// Share of harvested water recharged, percent.
    pub recharge_efficiency: f64,
    /// Water tanker deliveries avoided.
    pub tankers_avoided: u32,
}

// ==================== Weather ====================

/// Query parameters for the weather endpoints.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CoordinateParams {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl CoordinateParams {
    /// Whether both coordinates are within their valid ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// A latitude/longitude pair echoed back to clients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

/// `GET /api/weather/combined` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinedWeather {
    /// Current weather.
    pub weather: WeatherReport,
    /// Air quality.
    pub aqi: AirQualityReport,
    /// Requested location.
    pub location: Coordinates,
}

// ==================== Regional data ====================

/// Regional rainfall figures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RainfallData {
    /// Requested location name.
    pub location: String,
    /// Annual rainfall, mm.
    pub annual_rainfall: f64,
    /// Average monthly rainfall, mm.
    pub monthly_average: f64,
    /// Data provider.
    pub source: String,
    /// When the figures were produced.
    pub last_updated: DateTime<Utc>,
}

/// Regional groundwater figures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroundwaterData {
    /// Requested location name.
    pub location: String,
    /// Depth below ground, meters.
    pub depth: f64,
    /// Water quality grade.
    pub quality: String,
    /// Data provider.
    pub source: String,
    /// When the figures were produced.
    pub last_updated: DateTime<Utc>,
}

/// Regional soil figures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoilData {
    /// Requested location name.
    pub location: String,
    /// Dominant soil type.
    pub soil_type: SoilType,
    /// Measured percolation rate, mm/hour.
    pub percolation_rate: f64,
    /// Data provider.
    pub source: String,
    /// When the figures were produced.
    pub last_updated: DateTime<Utc>,
}

// ==================== Experts & bookings ====================

/// A consultant users can book a site visit with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expert {
    /// Stable expert ID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Area of expertise.
    pub specialization: String,
    /// Years of experience, e.g. `"15+ years"`.
    pub experience: String,
    /// Average rating out of 5.
    pub rating: f64,
    /// Number of reviews.
    pub reviews: u32,
    /// `"Available"` or `"Busy"`.
    pub availability: String,
}

/// `POST /api/booking/create` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingCreate {
    /// Booking user.
    pub user_id: String,
    /// Expert to book.
    pub expert_id: String,
    /// Requested visit time.
    pub preferred_date: DateTime<Utc>,
    /// Free-form notes for the expert.
    #[serde(default)]
    pub notes: Option<String>,
    /// Photo URLs or encoded images.
    #[serde(default)]
    pub photos: Vec<String>,
}

/// Lifecycle of a booking.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BookingStatus {
    /// Awaiting expert confirmation.
    #[default]
    Pending,
    /// Confirmed by the expert.
    Confirmed,
    /// Visit done.
    Completed,
    /// Called off by either side.
    Cancelled,
}

impl BookingStatus {
    /// Completed and cancelled bookings no longer change status.
    #[must_use]
    pub const fn is_final(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether a booking in this status may move to `next`.
    #[must_use]
    pub const fn can_become(self, next: Self) -> bool {
        !self.is_final() && !matches!(next, Self::Pending)
    }
}

/// `PUT /api/booking/{id}/status` body.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BookingStatusUpdate {
    /// Requested status.
    pub status: BookingStatus,
}

/// A booked site visit (stored in `bookings`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    /// Opaque booking ID.
    pub id: String,
    /// Booking user.
    pub user_id: String,
    /// Booked expert.
    pub expert_id: String,
    /// Booked expert's name at booking time.
    pub expert_name: String,
    /// Scheduled visit time.
    pub scheduled_date: DateTime<Utc>,
    /// Current status.
    #[serde(default)]
    pub status: BookingStatus,
    /// Notes for the expert.
    #[serde(default)]
    pub notes: Option<String>,
    /// Creation time.
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

// ==================== IoT ====================

/// `POST /api/iot/data` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IotReadingSubmit {
    /// Owning user.
    pub user_id: String,
    /// Rain intensity, mm/hour.
    pub rain_intensity: f64,
    /// Tank fill, percent.
    pub tank_level: f64,
    /// Infiltration rate, mm/hour.
    pub infiltration_rate: f64,
    /// Sensor time; defaults to receipt time.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// A sensor reading (stored in `iot_readings`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IotReading {
    /// Opaque reading ID.
    pub id: String,
    /// Owning user.
    pub user_id: String,
    /// Rain intensity, mm/hour.
    pub rain_intensity: f64,
    /// Tank fill, percent.
    pub tank_level: f64,
    /// Infiltration rate, mm/hour.
    pub infiltration_rate: f64,
    /// Sensor time.
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// One day of sensor history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IotHistoryPoint {
    /// Day of the sample.
    pub date: DateTime<Utc>,
    /// Rain intensity, mm/hour.
    pub rain_intensity: f64,
    /// Tank fill, percent.
    pub tank_level: f64,
    /// Infiltration rate, mm/hour.
    pub infiltration_rate: f64,
}

/// Query parameters for `GET /api/iot/history/{user_id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct IotHistoryParams {
    /// Number of days to return; defaults to 7.
    pub days: Option<u32>,
}

// ==================== Community ====================

/// A row of the community leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// 1-based position.
    pub rank: u32,
    /// Ranked user.
    pub user_id: String,
    /// Ranked user's name.
    pub name: String,
    /// Cumulative harvested water, liters.
    pub liters_saved: f64,
    /// Number of badges earned.
    pub badges: u32,
}

/// Community-wide aggregate figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityStats {
    /// Registered users.
    pub total_users: u64,
    /// Water harvested by everyone, liters.
    pub total_liters_saved: f64,
    /// Avoided emissions, kg CO2.
    pub total_carbon_saved: f64,
    /// Tanker deliveries avoided.
    pub tankers_avoided: u32,
    /// Installed systems reporting data.
    pub active_systems: u32,
}

/// An achievement badge and whether the user has it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Badge {
    /// Stable badge ID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// What earns the badge.
    pub description: String,
    /// Icon name.
    pub icon: String,
    /// Hex display color.
    pub color: String,
    /// Whether the user has earned it.
    pub earned: bool,
    /// When it was earned, if known.
    #[serde(default)]
    pub earned_date: Option<DateTime<Utc>>,
}

// ==================== Notifications ====================

/// `POST /api/notifications/send` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSend {
    /// Recipient.
    pub user_id: String,
    /// Short title.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Client-defined category, e.g. `"alert"` or `"achievement"`.
    #[serde(rename = "type")]
    pub kind: String,
}

/// A notification (stored in `notifications`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Opaque notification ID.
    pub id: String,
    /// Recipient.
    pub user_id: String,
    /// Short title.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Client-defined category.
    #[serde(rename = "type")]
    pub kind: String,
    /// Whether the recipient has read it.
    #[serde(default)]
    pub read: bool,
    /// Send time.
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_have_fixed_width() {
        let whole = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let fractional = whole + chrono::Duration::milliseconds(500);

        let notification = |created_at| Notification {
            id: "n".to_string(),
            user_id: "u".to_string(),
            title: "t".to_string(),
            message: "m".to_string(),
            kind: "info".to_string(),
            read: false,
            created_at,
        };

        let a = serde_json::to_value(notification(whole)).unwrap();
        let b = serde_json::to_value(notification(fractional)).unwrap();
        let a = a["created_at"].as_str().unwrap().to_string();
        let b = b["created_at"].as_str().unwrap().to_string();

        assert_eq!(a, "2026-01-01T00:00:00.000000Z");
        assert_eq!(a.len(), b.len());
        assert!(a < b);
    }

    #[test]
    fn notification_kind_is_type_on_the_wire() {
        let json = serde_json::json!({
            "user_id": "u1",
            "title": "Rain alert",
            "message": "Heavy rain expected",
            "type": "alert"
        });
        let send: NotificationSend = serde_json::from_value(json).unwrap();
        assert_eq!(send.kind, "alert");
    }

    #[test]
    fn user_defaults_fill_missing_fields() {
        let json = serde_json::json!({
            "id": "u1",
            "name": "Meena",
            "email": "meena@example.com",
            "created_at": "2026-03-01T10:00:00Z"
        });
        let user: User = serde_json::from_value(json).unwrap();
        assert_eq!(user.language, "en");
        assert!(user.total_liters_saved.abs() < f64::EPSILON);
        assert_eq!(user.streak_days, 0);
        assert!(user.phone.is_none());
    }

    #[test]
    fn feasibility_result_is_flat() {
        let report = varun_feasibility::compute_feasibility(1000.0, 1000.0, "loamy").unwrap();
        let result = FeasibilityResult {
            id: "r1".to_string(),
            assessment_id: "a1".to_string(),
            report,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["assessment_id"], "a1");
        assert_eq!(json["roi_months"], 180);
        assert_eq!(json["recharge_pit_size"], "50sq ft x 6ft deep");

        let back: FeasibilityResult = serde_json::from_value(json).unwrap();
        assert_eq!(back.report.roi_months, 180);
    }

    #[test]
    fn booking_status_defaults_to_pending() {
        assert_eq!(BookingStatus::default(), BookingStatus::Pending);
        assert_eq!(
            serde_json::to_value(BookingStatus::Pending).unwrap(),
            "pending"
        );
    }

    #[test]
    fn booking_status_transitions() {
        use BookingStatus::{Cancelled, Completed, Confirmed, Pending};

        assert!(Pending.can_become(Confirmed));
        assert!(Pending.can_become(Cancelled));
        assert!(Confirmed.can_become(Completed));
        assert!(Confirmed.can_become(Cancelled));
        assert!(!Confirmed.can_become(Pending));
        assert!(!Completed.can_become(Cancelled));
        assert!(!Cancelled.can_become(Confirmed));

        let update: BookingStatusUpdate =
            serde_json::from_value(serde_json::json!({ "status": "confirmed" })).unwrap();
        assert_eq!(update.status, Confirmed);
        assert!(
            serde_json::from_value::<BookingStatusUpdate>(serde_json::json!({ "status": "done" }))
                .is_err()
        );
    }

    #[test]
    fn coordinate_ranges() {
        let ok = CoordinateParams {
            latitude: 13.08,
            longitude: 80.27,
        };
        assert!(ok.is_valid());
        assert!(
            CoordinateParams {
                latitude: 90.0,
                longitude: -180.0
            }
            .is_valid()
        );
        assert!(
            !CoordinateParams {
                latitude: 91.0,
                longitude: 0.0
            }
            .is_valid()
        );
        assert!(
            !CoordinateParams {
                latitude: 0.0,
                longitude: 180.5
            }
            .is_valid()
        );
        assert!(
            !CoordinateParams {
                latitude: f64::NAN,
                longitude: 0.0
            }
            .is_valid()
        );
    }
}
