#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Simulated telemetry for the Varun API.
//!
//! No real sensor network or regional data feed is wired up yet, so the
//! dashboard, IoT and regional endpoints are served from plausible random
//! values. Every generator takes its random source as a parameter;
//! seeding it gives reproducible output.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand::seq::SliceRandom as _;
use varun_feasibility::SoilType;
use varun_server_models::{
    CommunityStats, DashboardData, GroundwaterData, IotHistoryPoint, IotReading, RainfallData,
    SoilData,
};

/// Liters saved assumed for users whose record has no total.
pub const DEFAULT_LITERS_SAVED: f64 = 3650.0;

/// kg of CO2 avoided per liter harvested.
pub const CARBON_PER_LITER: f64 = 0.0009;

/// Liters delivered by one water tanker.
pub const TANKER_CAPACITY_LITERS: f64 = 5000.0;

/// Default length of the IoT history, days.
pub const DEFAULT_HISTORY_DAYS: u32 = 7;

/// Longest IoT history served, days.
pub const MAX_HISTORY_DAYS: u32 = 365;

/// Avoided emissions for a harvested volume, kg CO2.
#[must_use]
pub fn carbon_saved(liters: f64) -> f64 {
    liters * CARBON_PER_LITER
}

/// Whole tanker deliveries replaced by a harvested volume.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn tankers_avoided(liters: f64) -> u32 {
    // `as` saturates, so negative totals count as zero.
    (liters / TANKER_CAPACITY_LITERS).floor() as u32
}

/// Dashboard figures for a user with `liters_saved_total` harvested.
///
/// The cumulative figures are derived from the real total; everything
/// else is simulated.
pub fn dashboard<R: Rng + ?Sized>(rng: &mut R, liters_saved_total: f64) -> DashboardData {
    DashboardData {
        rainfall_today: rng.gen_range(0.0..=50.0),
        groundwater_depth: rng.gen_range(10.0..=20.0),
        tank_level: rng.gen_range(50.0..=90.0),
        liters_saved_today: rng.gen_range(50.0..=200.0),
        liters_saved_month: rng.gen_range(1000.0..=1500.0),
        liters_saved_total,
        carbon_saved: carbon_saved(liters_saved_total),
        recharge_efficiency: rng.gen_range(75.0..=95.0),
        tankers_avoided: tankers_avoided(liters_saved_total),
    }
}

/// Random version 4 UUID drawn from `rng`.
pub fn random_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut bytes = [0u8; 16];
    rng.fill_bytes(&mut bytes);
    uuid::Builder::from_random_bytes(bytes).into_uuid().to_string()
}

/// A single simulated sensor reading.
pub fn iot_reading<R: Rng + ?Sized>(rng: &mut R, user_id: &str, now: DateTime<Utc>) -> IotReading {
    IotReading {
        id: random_id(rng),
        user_id: user_id.to_string(),
        rain_intensity: rng.gen_range(0.0..=10.0),
        tank_level: rng.gen_range(50.0..=90.0),
        infiltration_rate: rng.gen_range(5.0..=20.0),
        timestamp: now,
    }
}

/// One simulated point per day, newest first, starting at `now`.
///
/// `days` is capped at [`MAX_HISTORY_DAYS`].
pub fn iot_history<R: Rng + ?Sized>(
    rng: &mut R,
    days: u32,
    now: DateTime<Utc>,
) -> Vec<IotHistoryPoint> {
    (0..days.min(MAX_HISTORY_DAYS))
        .map(|i| IotHistoryPoint {
            date: now - Duration::days(i64::from(i)),
            rain_intensity: rng.gen_range(0.0..=10.0),
            tank_level: rng.gen_range(50.0..=90.0),
            infiltration_rate: rng.gen_range(5.0..=20.0),
        })
        .collect()
}

/// Community aggregates; only the user count is real.
pub fn community_stats<R: Rng + ?Sized>(rng: &mut R, total_users: u64) -> CommunityStats {
    CommunityStats {
        total_users,
        total_liters_saved: rng.gen_range(100_000.0..=500_000.0),
        total_carbon_saved: rng.gen_range(90.0..=450.0),
        tankers_avoided: rng.gen_range(20..=100),
        active_systems: rng.gen_range(50..=200),
    }
}

/// Regional rainfall for `location`.
pub fn rainfall<R: Rng + ?Sized>(rng: &mut R, location: &str, now: DateTime<Utc>) -> RainfallData {
    RainfallData {
        location: location.to_string(),
        annual_rainfall: rng.gen_range(800.0..=1400.0),
        monthly_average: rng.gen_range(60.0..=120.0),
        source: "IMD (Mock)".to_string(),
        last_updated: now,
    }
}

/// Regional groundwater for `location`.
pub fn groundwater<R: Rng + ?Sized>(
    rng: &mut R,
    location: &str,
    now: DateTime<Utc>,
) -> GroundwaterData {
    GroundwaterData {
        location: location.to_string(),
        depth: rng.gen_range(10.0..=25.0),
        quality: "Good".to_string(),
        source: "Groundwater Board (Mock)".to_string(),
        last_updated: now,
    }
}

/// Regional soil survey for `location`.
pub fn soil<R: Rng + ?Sized>(rng: &mut R, location: &str, now: DateTime<Utc>) -> SoilData {
    let soil_type = SoilType::all()
        .choose(rng)
        .copied()
        .unwrap_or(SoilType::Loamy);

    SoilData {
        location: location.to_string(),
        soil_type,
        percolation_rate: rng.gen_range(2.0..=25.0),
        source: "TN Agriculture Mannvalam (Mock)".to_string(),
        last_updated: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng as _;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn dashboard_ranges() {
        let mut rng = rng();
        for _ in 0..200 {
            let d = dashboard(&mut rng, 12_500.0);
            assert!((0.0..=50.0).contains(&d.rainfall_today));
            assert!((10.0..=20.0).contains(&d.groundwater_depth));
            assert!((50.0..=90.0).contains(&d.tank_level));
            assert!((50.0..=200.0).contains(&d.liters_saved_today));
            assert!((1000.0..=1500.0).contains(&d.liters_saved_month));
            assert!((75.0..=95.0).contains(&d.recharge_efficiency));
        }
    }

    #[test]
    fn dashboard_derives_totals() {
        let d = dashboard(&mut rng(), 12_500.0);
        assert!((d.liters_saved_total - 12_500.0).abs() < f64::EPSILON);
        assert!((d.carbon_saved - 11.25).abs() < 1e-9);
        assert_eq!(d.tankers_avoided, 2);
    }

    #[test]
    fn tanker_edges() {
        assert_eq!(tankers_avoided(0.0), 0);
        assert_eq!(tankers_avoided(4999.99), 0);
        assert_eq!(tankers_avoided(5000.0), 1);
        assert_eq!(tankers_avoided(DEFAULT_LITERS_SAVED), 0);
        assert_eq!(tankers_avoided(-10.0), 0);
    }

    #[test]
    fn same_seed_same_output() {
        let now = Utc::now();
        let a = iot_reading(&mut rng(), "u1", now);
        let b = iot_reading(&mut rng(), "u1", now);
        assert_eq!(a, b);
        assert_eq!(a.id.len(), 36);
    }

    #[test]
    fn iot_reading_ranges() {
        let mut rng = rng();
        let now = Utc::now();
        for _ in 0..200 {
            let r = iot_reading(&mut rng, "u1", now);
            assert_eq!(r.user_id, "u1");
            assert!((0.0..=10.0).contains(&r.rain_intensity));
            assert!((50.0..=90.0).contains(&r.tank_level));
            assert!((5.0..=20.0).contains(&r.infiltration_rate));
        }
    }

    #[test]
    fn history_is_daily_newest_first() {
        let now = Utc::now();
        let history = iot_history(&mut rng(), DEFAULT_HISTORY_DAYS, now);
        assert_eq!(history.len(), 7);
        assert_eq!(history[0].date, now);
        for pair in history.windows(2) {
            assert_eq!(pair[0].date - pair[1].date, Duration::days(1));
        }
    }

    #[test]
    fn history_bounds() {
        let now = Utc::now();
        assert!(iot_history(&mut rng(), 0, now).is_empty());
        assert_eq!(
            iot_history(&mut rng(), 10_000, now).len(),
            MAX_HISTORY_DAYS as usize
        );
    }

    #[test]
    fn community_ranges() {
        let mut rng = rng();
        for _ in 0..200 {
            let s = community_stats(&mut rng, 17);
            assert_eq!(s.total_users, 17);
            assert!((100_000.0..=500_000.0).contains(&s.total_liters_saved));
            assert!((90.0..=450.0).contains(&s.total_carbon_saved));
            assert!((20..=100).contains(&s.tankers_avoided));
            assert!((50..=200).contains(&s.active_systems));
        }
    }

    #[test]
    fn regional_data() {
        let mut rng = rng();
        let now = Utc::now();

        let r = rainfall(&mut rng, "Chennai", now);
        assert_eq!(r.location, "Chennai");
        assert_eq!(r.source, "IMD (Mock)");
        assert!((800.0..=1400.0).contains(&r.annual_rainfall));
        assert!((60.0..=120.0).contains(&r.monthly_average));

        let g = groundwater(&mut rng, "Chennai", now);
        assert_eq!(g.quality, "Good");
        assert!((10.0..=25.0).contains(&g.depth));

        for _ in 0..50 {
            let s = soil(&mut rng, "Madurai", now);
            assert!(SoilType::all().contains(&s.soil_type));
            assert!((2.0..=25.0).contains(&s.percolation_rate));
            assert_eq!(s.source, "TN Agriculture Mannvalam (Mock)");
        }
    }
}
