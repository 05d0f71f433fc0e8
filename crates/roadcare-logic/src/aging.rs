//! Pavement aging — daily health loss from traffic loading.
//!
//! Uses an empirical pavement-quality-index (PQI) degradation curve. Daily
//! traffic is scaled to an annual axle-load proxy `N`, the curve gives the PQI
//! drop per year, and that drop is spread evenly over the days of the year.
//! The curve is evaluated fresh every simulated day with that day's traffic.

use crate::constants::calendar::DAYS_PER_YEAR;

/// Equivalent axle loads per vehicle.
pub const AXLE_LOAD_FACTOR: f64 = 1.49;

/// PQI drop per year with no traffic at all (weathering).
const PQI_BASE_DROP: f64 = 1.164;
const PQI_LINEAR_COEFF: f64 = 6.621e-7;
const PQI_QUADRATIC_COEFF: f64 = 3.381e-14;

/// Annual axle-load proxy for a daily traffic count.
pub fn annual_axle_loads(traffic: f64, days_per_year: f64) -> f64 {
    AXLE_LOAD_FACTOR * sanitize(traffic) * days_per_year
}

/// PQI drop over one year given the annual axle-load proxy.
pub fn pqi_drop_per_year(axle_loads: f64) -> f64 {
    PQI_BASE_DROP + PQI_LINEAR_COEFF * axle_loads + PQI_QUADRATIC_COEFF * axle_loads * axle_loads
}

/// Health lost per day at the given daily traffic, on a 365-day calendar.
///
/// Always positive and non-decreasing in `traffic`.
pub fn aging_speed(traffic: f64) -> f64 {
    aging_speed_for_year(traffic, DAYS_PER_YEAR)
}

/// Health lost per day at the given daily traffic and calendar length.
pub fn aging_speed_for_year(traffic: f64, days_per_year: f64) -> f64 {
    pqi_drop_per_year(annual_axle_loads(traffic, days_per_year)) / days_per_year
}

// Negative or non-finite counts are rejected at config load; treat them as an
// empty road here so the curve stays monotone.
fn sanitize(traffic: f64) -> f64 {
    if traffic.is_finite() && traffic > 0.0 {
        traffic
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_traffic_is_weathering_only() {
        let expected = PQI_BASE_DROP / DAYS_PER_YEAR;
        assert!((aging_speed(0.0) - expected).abs() < 1e-15);
    }

    #[test]
    fn test_reference_value_at_1000_vehicles() {
        let n = 1.49 * 1000.0 * 365.0;
        let expected = (1.164 + 6.621e-7 * n + 3.381e-14 * n * n) / 365.0;
        assert!((aging_speed(1000.0) - expected).abs() < 1e-12);
        // Roughly 0.0042 health per day.
        assert!(aging_speed(1000.0) > 0.0041 && aging_speed(1000.0) < 0.0043);
    }

    #[test]
    fn test_heavy_traffic_ages_faster() {
        assert!(aging_speed(40_000.0) > aging_speed(25_000.0));
        assert!(aging_speed(25_000.0) > aging_speed(1_000.0));
    }

    #[test]
    fn test_negative_and_nan_treated_as_empty() {
        assert_eq!(aging_speed(-10.0), aging_speed(0.0));
        assert_eq!(aging_speed(f64::NAN), aging_speed(0.0));
    }

    #[test]
    fn test_default_calendar_matches_explicit() {
        assert_eq!(
            aging_speed(10_000.0),
            aging_speed_for_year(10_000.0, DAYS_PER_YEAR)
        );
    }
}
