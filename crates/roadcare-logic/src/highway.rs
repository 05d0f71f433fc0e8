//! Per-segment highway state machine.
//!
//! A [`Highway`] is either idle (aging under traffic) or under an action
//! (health frozen, traffic shaped by the action). Issuing an action stages the
//! post-action health immediately; it becomes visible only when the action's
//! duration elapses and the segment drops back to its default status.

use serde::{Deserialize, Serialize};

use crate::aging::aging_speed_for_year;
use crate::catalog::{ActionSpec, EmergencySpec};
use crate::constants::health;
use crate::status::Status;

/// Result of asking a highway to start an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionOutcome {
    /// The action started; its cost is due.
    Applied,
    /// The current status is not interruptible; nothing changed.
    Blocked,
}

/// What happened during one simulated day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayReport {
    /// Traffic carried that day, after the status's transform.
    pub traffic: f64,
    /// Health lost to aging (zero while under an action).
    pub health_loss: f64,
    /// Whether an action committed and the segment went back to idle.
    pub committed: bool,
}

/// One fixed-length road segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highway {
    /// Road name, shared by all segments of the same road.
    pub name: String,
    /// Unique index within the fleet.
    pub tag: usize,
    /// Index of this segment within its road.
    pub segment: usize,
    pub length_km: f64,
    /// Revenue per vehicle.
    pub toll: f64,
    health: f64,
    traffic: f64,
    base_traffic: f64,
    status: Status,
    default_status: Status,
    pending_health: Option<f64>,
}

impl Highway {
    /// A single idle segment. `health` is clamped into `[0, 100]`.
    pub fn new(
        name: impl Into<String>,
        tag: usize,
        health: f64,
        traffic: f64,
        toll: f64,
        default_status: Status,
    ) -> Self {
        Self {
            name: name.into(),
            tag,
            segment: 0,
            length_km: crate::constants::traffic::UNIT_LENGTH_KM,
            toll,
            health: health::clamp(health),
            traffic,
            base_traffic: traffic,
            status: default_status.clone(),
            default_status,
            pending_health: None,
        }
    }

    pub fn with_segment(mut self, segment: usize, length_km: f64) -> Self {
        self.segment = segment;
        self.length_km = length_km;
        self
    }

    pub fn health(&self) -> f64 {
        self.health
    }

    pub fn traffic(&self) -> f64 {
        self.traffic
    }

    /// Traffic the segment carries when open; restored when an action ends.
    pub fn base_traffic(&self) -> f64 {
        self.base_traffic
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn default_status(&self) -> &Status {
        &self.default_status
    }

    pub fn pending_health(&self) -> Option<f64> {
        self.pending_health
    }

    pub fn is_idle(&self) -> bool {
        self.status.idle
    }

    pub fn is_interruptible(&self) -> bool {
        self.status.interruptible
    }

    /// Start `action` if the current status allows it.
    ///
    /// Starting the idle program returns the segment to its default status and
    /// drops any staged health.
    pub fn apply_action(&mut self, action: &ActionSpec) -> ActionOutcome {
        if !self.status.interruptible {
            return ActionOutcome::Blocked;
        }

        if action.idle {
            self.pending_health = None;
            self.revert_to_default();
        } else {
            self.status = Status::for_action(action);
            self.pending_health = Some(action.health.apply(self.health));
        }
        ActionOutcome::Applied
    }

    /// Apply an emergency's health effect immediately, clamped.
    ///
    /// Staged health from an action in progress takes the same hit, so the
    /// damage survives the commit.
    pub fn apply_emergency(&mut self, emergency: &EmergencySpec) {
        self.health = health::clamp(emergency.health.apply(self.health));
        if let Some(staged) = self.pending_health {
            self.pending_health = Some(health::clamp(emergency.health.apply(staged)));
        }
    }

    /// Advance this segment by one day.
    ///
    /// Traffic is reshaped by the status, idle segments age by that day's
    /// traffic, and an action whose time has run out commits its staged health
    /// and reopens the road.
    ///
    /// Reopening restores `base_traffic` rather than keeping the action's
    /// reshaped traffic; a closed road would otherwise carry zero vehicles
    /// for the rest of the episode.
    pub fn advance_one_day(&mut self, days_per_year: f64) -> DayReport {
        self.traffic = self
            .status
            .traffic
            .apply(self.status.remaining, self.traffic);
        let traffic = self.traffic;

        let mut health_loss = 0.0;
        if self.status.idle {
            let before = self.health;
            self.health = health::clamp(before - aging_speed_for_year(traffic, days_per_year));
            health_loss = before - self.health;
        }

        self.status.remaining -= 1.0;

        let committed = self.status.has_expired();
        if committed {
            if let Some(staged) = self.pending_health.take() {
                self.health = health::clamp(staged);
            }
            self.revert_to_default();
        }

        DayReport {
            traffic,
            health_loss,
            committed,
        }
    }

    /// Back to the default status at base traffic.
    fn revert_to_default(&mut self) {
        self.status = self.default_status.clone();
        self.traffic = self.base_traffic;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aging::aging_speed;
    use crate::catalog::ReferenceAction;
    use crate::constants::calendar::DAYS_PER_YEAR;
    use crate::transforms::{HealthTransform, TrafficTransform};

    fn idle_highway(health: f64, traffic: f64, toll: f64) -> Highway {
        let keep = Status::for_action(&ReferenceAction::Keep.spec());
        Highway::new("GF", 0, health, traffic, toll, keep)
    }

    #[test]
    fn test_new_highway_is_idle() {
        let hw = idle_highway(100.0, 300.0, 7.0);
        assert!(hw.is_idle());
        assert!(hw.is_interruptible());
        assert_eq!(hw.pending_health(), None);
        assert_eq!(hw.status(), hw.default_status());
    }

    #[test]
    fn test_initial_health_clamped() {
        assert_eq!(idle_highway(140.0, 0.0, 0.0).health(), 100.0);
        assert_eq!(idle_highway(-3.0, 0.0, 0.0).health(), 0.0);
    }

    #[test]
    fn test_small_repair_scenario() {
        let mut hw = idle_highway(100.0, 300.0, 7.0);
        let outcome = hw.apply_action(&ReferenceAction::SmallRepair.spec());
        assert_eq!(outcome, ActionOutcome::Applied);
        assert_eq!(hw.pending_health(), Some(110.0));
        assert_eq!(hw.status().name, "small repair");

        let day1 = hw.advance_one_day(DAYS_PER_YEAR);
        assert_eq!(day1.traffic, 0.0);
        assert_eq!(day1.health_loss, 0.0);
        assert!(!day1.committed);
        assert_eq!(hw.health(), 100.0);
        assert_eq!(hw.status().remaining, 1.0);

        let day2 = hw.advance_one_day(DAYS_PER_YEAR);
        assert_eq!(day2.traffic, 0.0);
        assert!(day2.committed);
        assert_eq!(hw.health(), 100.0);
        assert!(hw.is_idle());
        assert_eq!(hw.pending_health(), None);
        assert_eq!(hw.traffic(), 300.0);
    }

    #[test]
    fn test_idle_day_ages_by_curve() {
        let mut hw = idle_highway(50.0, 1000.0, 7.0);
        let report = hw.advance_one_day(DAYS_PER_YEAR);
        let expected = (50.0 - aging_speed(1000.0)).clamp(0.0, 100.0);
        assert_eq!(hw.health(), expected);
        assert_eq!(report.traffic, 1000.0);
        assert!(!report.committed);
        assert!(hw.is_idle());
    }

    #[test]
    fn test_full_remake_resets_to_new() {
        let mut hw = idle_highway(10.0, 20_000.0, 7.0);
        hw.apply_action(&ReferenceAction::FullRemake.spec());
        for _ in 0..59 {
            hw.advance_one_day(DAYS_PER_YEAR);
            assert_eq!(hw.health(), 10.0);
            assert!(!hw.is_idle());
        }
        let last = hw.advance_one_day(DAYS_PER_YEAR);
        assert!(last.committed);
        assert_eq!(hw.health(), 100.0);
        assert!(hw.is_idle());
    }

    #[test]
    fn test_blocked_action_changes_nothing() {
        let mut hw = idle_highway(60.0, 5000.0, 7.0);
        hw.apply_action(&ReferenceAction::BigRepair.spec());
        hw.advance_one_day(DAYS_PER_YEAR);
        let before = hw.clone();

        let outcome = hw.apply_action(&ReferenceAction::FullRemake.spec());
        assert_eq!(outcome, ActionOutcome::Blocked);
        assert_eq!(hw, before);

        let keep = hw.apply_action(&ReferenceAction::Keep.spec());
        assert_eq!(keep, ActionOutcome::Blocked);
        assert_eq!(hw, before);
    }

    #[test]
    fn test_idle_never_commits() {
        let mut hw = idle_highway(100.0, 0.0, 7.0);
        for _ in 0..10_000 {
            let report = hw.advance_one_day(DAYS_PER_YEAR);
            assert!(!report.committed);
        }
        assert_eq!(hw.status().name, "keep");
        assert_eq!(hw.status().remaining, f64::INFINITY);
        assert!(hw.is_idle());
    }

    #[test]
    fn test_zero_duration_commits_same_day() {
        let mut hw = idle_highway(40.0, 1000.0, 7.0);
        let instant = ActionSpec {
            name: "patch".into(),
            cost: 1000.0,
            duration_days: Some(0.0),
            health: HealthTransform::Add { delta: 5.0 },
            traffic: TrafficTransform::Passthrough,
            interruptible: false,
            idle: false,
        };
        hw.apply_action(&instant);
        let report = hw.advance_one_day(DAYS_PER_YEAR);
        assert!(report.committed);
        assert_eq!(report.health_loss, 0.0);
        assert_eq!(hw.health(), 45.0);
        assert!(hw.is_idle());
    }

    #[test]
    fn test_staged_health_clamped_on_commit() {
        let mut hw = idle_highway(95.0, 1000.0, 7.0);
        hw.apply_action(&ReferenceAction::BigRepair.spec());
        assert_eq!(hw.pending_health(), Some(105.0));
        for _ in 0..20 {
            hw.advance_one_day(DAYS_PER_YEAR);
        }
        assert_eq!(hw.health(), 100.0);
    }

    #[test]
    fn test_keep_while_idle_is_applied() {
        let mut hw = idle_highway(70.0, 1000.0, 7.0);
        let outcome = hw.apply_action(&ReferenceAction::Keep.spec());
        assert_eq!(outcome, ActionOutcome::Applied);
        assert!(hw.is_idle());
        assert_eq!(hw.pending_health(), None);
    }

    #[test]
    fn test_interruptible_action_can_be_replaced() {
        let mut hw = idle_highway(50.0, 1000.0, 7.0);
        let lane_closure = ActionSpec {
            name: "lane closure".into(),
            cost: 10_000.0,
            duration_days: Some(5.0),
            health: HealthTransform::Add { delta: 2.0 },
            traffic: TrafficTransform::Scale { factor: 0.5 },
            interruptible: true,
            idle: false,
        };
        hw.apply_action(&lane_closure);
        let report = hw.advance_one_day(DAYS_PER_YEAR);
        assert_eq!(report.traffic, 500.0);

        let outcome = hw.apply_action(&ReferenceAction::FullRemake.spec());
        assert_eq!(outcome, ActionOutcome::Applied);
        assert_eq!(hw.pending_health(), Some(100.0));
        assert_eq!(hw.status().remaining, 60.0);
    }

    #[test]
    fn test_keep_cancelling_interruptible_action_restores_traffic() {
        let mut hw = idle_highway(50.0, 1000.0, 7.0);
        let lane_closure = ActionSpec {
            name: "lane closure".into(),
            cost: 10_000.0,
            duration_days: Some(5.0),
            health: HealthTransform::Add { delta: 2.0 },
            traffic: TrafficTransform::Scale { factor: 0.5 },
            interruptible: true,
            idle: false,
        };
        hw.apply_action(&lane_closure);
        hw.advance_one_day(DAYS_PER_YEAR);
        assert_eq!(hw.traffic(), 500.0);

        assert_eq!(
            hw.apply_action(&ReferenceAction::Keep.spec()),
            ActionOutcome::Applied
        );
        assert!(hw.is_idle());
        assert_eq!(hw.pending_health(), None);
        assert_eq!(hw.traffic(), 1000.0);
        for _ in 0..11 {
            let report = hw.advance_one_day(DAYS_PER_YEAR);
            assert_eq!(report.traffic, 1000.0);
        }
        assert_eq!(hw.traffic(), hw.base_traffic());
    }

    #[test]
    fn test_emergency_during_repair_survives_commit() {
        let mut hw = idle_highway(60.0, 1000.0, 7.0);
        hw.apply_action(&ReferenceAction::BigRepair.spec());
        assert_eq!(hw.pending_health(), Some(70.0));

        hw.apply_emergency(&crate::catalog::ReferenceEmergency::Damage.spec());
        assert_eq!(hw.health(), 55.0);
        assert_eq!(hw.pending_health(), Some(65.0));

        let mut committed = false;
        while !committed {
            committed = hw.advance_one_day(DAYS_PER_YEAR).committed;
        }
        assert_eq!(hw.health(), 65.0);
    }

    #[test]
    fn test_emergency_damage_clamped() {
        let mut hw = idle_highway(10.0, 1000.0, 7.0);
        hw.apply_emergency(&crate::catalog::ReferenceEmergency::Destroy.spec());
        assert_eq!(hw.health(), 0.0);
        // A failed road keeps aging at the floor.
        hw.advance_one_day(DAYS_PER_YEAR);
        assert_eq!(hw.health(), 0.0);
    }
}
