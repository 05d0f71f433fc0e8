//! Reward computation — per-highway utility and fleet aggregation.
//!
//! One canonical, toll-aware formula:
//!
//! ```text
//! reward = (traffic × toll − cost) / scale + health_weight × health − baseline_offset
//! ```
//!
//! More revenue, less spending and better health all raise the reward.

use serde::{Deserialize, Serialize};

use crate::constants::reward::{BASELINE_OFFSET, HEALTH_WEIGHT, SCALE};
use crate::highway::Highway;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardParams {
    pub scale: f64,
    pub health_weight: f64,
    pub baseline_offset: f64,
}

impl Default for RewardParams {
    fn default() -> Self {
        Self {
            scale: SCALE,
            health_weight: HEALTH_WEIGHT,
            baseline_offset: BASELINE_OFFSET,
        }
    }
}

/// Instantaneous utility of one highway.
pub fn reward(traffic: f64, toll: f64, health: f64, cost: f64, params: &RewardParams) -> f64 {
    let income = traffic * toll;
    (income - cost) / params.scale + params.health_weight * health - params.baseline_offset
}

/// Utility of a highway in its current state after paying `cost`.
pub fn highway_reward(highway: &Highway, cost: f64, params: &RewardParams) -> f64 {
    reward(
        highway.traffic(),
        highway.toll,
        highway.health(),
        cost,
        params,
    )
}

/// Simple mean; zero for an empty fleet.
pub fn average(rewards: &[f64]) -> f64 {
    if rewards.is_empty() {
        return 0.0;
    }
    rewards.iter().sum::<f64>() / rewards.len() as f64
}

/// `Σ γ^t · r_t` over a reward sequence.
pub fn discounted_return(rewards: &[f64], gamma: f64) -> f64 {
    let mut weight = 1.0;
    let mut total = 0.0;
    for r in rewards {
        total += weight * r;
        weight *= gamma;
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_formula() {
        let p = RewardParams::default();
        // (300 × 7 − 0) / 10000 + 10 × 100 − 1000
        let r = reward(300.0, 7.0, 100.0, 0.0, &p);
        assert!((r - 0.21).abs() < 1e-12);
    }

    #[test]
    fn test_cost_lowers_reward() {
        let p = RewardParams::default();
        let free = reward(1000.0, 10.0, 80.0, 0.0, &p);
        let paid = reward(1000.0, 10.0, 80.0, 50_000.0, &p);
        assert!((free - paid - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_monotone_in_traffic_and_health() {
        let p = RewardParams::default();
        assert!(reward(2000.0, 5.0, 50.0, 0.0, &p) > reward(1000.0, 5.0, 50.0, 0.0, &p));
        assert!(reward(1000.0, 5.0, 60.0, 0.0, &p) > reward(1000.0, 5.0, 50.0, 0.0, &p));
    }

    #[test]
    fn test_average_two() {
        let (r1, r2) = (12.345, -987.5);
        assert_eq!(average(&[r1, r2]), (r1 + r2) / 2.0);
        assert_eq!(average(&[]), 0.0);
    }

    #[test]
    fn test_discounted_return() {
        let rs = [1.0, 1.0, 1.0];
        assert!((discounted_return(&rs, 0.5) - 1.75).abs() < 1e-12);
        assert_eq!(discounted_return(&rs, 1.0), 3.0);
        assert_eq!(discounted_return(&[], 0.99), 0.0);
    }

    #[test]
    fn test_params_fill_defaults_from_json() {
        let p: RewardParams = serde_json::from_str(r#"{"scale": 1.0}"#).unwrap();
        assert_eq!(p.scale, 1.0);
        assert_eq!(p.health_weight, HEALTH_WEIGHT);
        assert_eq!(p.baseline_offset, BASELINE_OFFSET);
    }
}
