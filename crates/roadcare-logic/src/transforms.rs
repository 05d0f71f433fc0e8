//! Named health and traffic transform strategies.
//!
//! Catalog entries describe their effects with these tagged variants instead
//! of embedded functions, so a catalog stays plain data: it can be loaded from
//! JSON, compared in tests, and written into snapshots.

use serde::{Deserialize, Serialize};

/// How an action or emergency changes a highway's health.
///
/// The result is *unclamped*; callers clamp when the value becomes visible.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HealthTransform {
    /// Health is unchanged.
    Keep,
    /// Health moves by `delta` (negative for damage).
    Add { delta: f64 },
    /// Health is replaced by `value`.
    Set { value: f64 },
}

impl HealthTransform {
    pub fn apply(&self, health: f64) -> f64 {
        match *self {
            Self::Keep => health,
            Self::Add { delta } => health + delta,
            Self::Set { value } => value,
        }
    }

    /// Whether every parameter is a finite number.
    pub fn is_finite(&self) -> bool {
        match *self {
            Self::Keep => true,
            Self::Add { delta } => delta.is_finite(),
            Self::Set { value } => value.is_finite(),
        }
    }
}

/// How a status shapes daily traffic while it is active.
///
/// Called once per day with the status's remaining time and the previous
/// day's traffic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrafficTransform {
    /// Traffic flows unrestricted.
    Passthrough,
    /// Road closed.
    Zero,
    /// Partial closure, e.g. a lane restriction.
    Scale { factor: f64 },
}

impl TrafficTransform {
    pub fn apply(&self, _remaining: f64, traffic: f64) -> f64 {
        match *self {
            Self::Passthrough => traffic,
            Self::Zero => 0.0,
            Self::Scale { factor } => traffic * factor,
        }
    }

    /// Whether the transform keeps non-negative traffic non-negative and finite.
    pub fn is_valid(&self) -> bool {
        match *self {
            Self::Passthrough | Self::Zero => true,
            Self::Scale { factor } => factor.is_finite() && factor >= 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_transforms() {
        assert_eq!(HealthTransform::Keep.apply(42.0), 42.0);
        assert_eq!(HealthTransform::Add { delta: 10.0 }.apply(95.0), 105.0);
        assert_eq!(HealthTransform::Add { delta: -20.0 }.apply(5.0), -15.0);
        assert_eq!(HealthTransform::Set { value: 100.0 }.apply(3.0), 100.0);
    }

    #[test]
    fn test_traffic_transforms() {
        assert_eq!(TrafficTransform::Passthrough.apply(f64::INFINITY, 300.0), 300.0);
        assert_eq!(TrafficTransform::Zero.apply(2.0, 300.0), 0.0);
        assert_eq!(TrafficTransform::Scale { factor: 0.5 }.apply(5.0, 300.0), 150.0);
    }

    #[test]
    fn test_validity_checks() {
        assert!(HealthTransform::Add { delta: 1.0 }.is_finite());
        assert!(!HealthTransform::Set { value: f64::NAN }.is_finite());
        assert!(TrafficTransform::Scale { factor: 0.0 }.is_valid());
        assert!(!TrafficTransform::Scale { factor: -1.0 }.is_valid());
        assert!(!TrafficTransform::Scale { factor: f64::INFINITY }.is_valid());
    }

    #[test]
    fn test_json_tags() {
        let t: HealthTransform = serde_json::from_str(r#"{"kind":"add","delta":10.0}"#).unwrap();
        assert_eq!(t, HealthTransform::Add { delta: 10.0 });
        let z: TrafficTransform = serde_json::from_str(r#"{"kind":"zero"}"#).unwrap();
        assert_eq!(z, TrafficTransform::Zero);
        let json = serde_json::to_string(&HealthTransform::Set { value: 100.0 }).unwrap();
        assert_eq!(json, r#"{"kind":"set","value":100.0}"#);
    }
}
