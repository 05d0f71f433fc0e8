//! Maintenance action and emergency catalogs.
//!
//! An [`ActionSpec`] is an immutable, agent-selectable maintenance program; an
//! [`EmergencySpec`] is a random event that damages a segment. Both are plain
//! data. The reference entries mirror the shipped `data/highways.json`.

use serde::{Deserialize, Serialize};

use crate::transforms::{HealthTransform, TrafficTransform};

/// One maintenance program in the action catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionSpec {
    pub name: String,
    /// One-time charge when the action is issued.
    pub cost: f64,
    /// Days the induced status persists. `None` only for the idle program.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_days: Option<f64>,
    /// Staged on issue, committed when the duration elapses.
    pub health: HealthTransform,
    /// Applied every day while the induced status is active.
    pub traffic: TrafficTransform,
    /// Whether a later action may interrupt the induced status.
    pub interruptible: bool,
    /// Marks the keep/idle program that highways default to.
    #[serde(default)]
    pub idle: bool,
}

impl ActionSpec {
    /// Remaining time of the status this action induces.
    pub fn remaining(&self) -> f64 {
        self.duration_days.unwrap_or(f64::INFINITY)
    }
}

/// A random event that changes a segment's health.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencySpec {
    pub name: String,
    pub health: HealthTransform,
    /// Independent chance of firing per highway per day.
    pub daily_probability: f64,
}

// ============================================================================
// REFERENCE ACTIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ReferenceAction {
    SmallRepair = 0,
    BigRepair = 1,
    FullRemake = 2,
    Keep = 3,
}

impl ReferenceAction {
    pub fn spec(&self) -> ActionSpec {
        match self {
            Self::SmallRepair => ActionSpec {
                name: "small repair".into(),
                cost: 50_000.0,
                duration_days: Some(2.0),
                health: HealthTransform::Add { delta: 10.0 },
                traffic: TrafficTransform::Zero,
                interruptible: false,
                idle: false,
            },
            Self::BigRepair => ActionSpec {
                name: "big repair".into(),
                cost: 200_000.0,
                duration_days: Some(20.0),
                health: HealthTransform::Add { delta: 10.0 },
                traffic: TrafficTransform::Zero,
                interruptible: false,
                idle: false,
            },
            Self::FullRemake => ActionSpec {
                name: "full remake".into(),
                cost: 500_000.0,
                duration_days: Some(60.0),
                health: HealthTransform::Set { value: 100.0 },
                traffic: TrafficTransform::Zero,
                interruptible: false,
                idle: false,
            },
            Self::Keep => ActionSpec {
                name: "keep".into(),
                cost: 0.0,
                duration_days: None,
                health: HealthTransform::Keep,
                traffic: TrafficTransform::Passthrough,
                interruptible: true,
                idle: true,
            },
        }
    }

    pub fn all() -> &'static [ReferenceAction] {
        &[
            Self::SmallRepair,
            Self::BigRepair,
            Self::FullRemake,
            Self::Keep,
        ]
    }
}

/// The reference action catalog, indexed by [`ReferenceAction`] discriminant.
pub fn reference_actions() -> Vec<ActionSpec> {
    ReferenceAction::all().iter().map(|a| a.spec()).collect()
}

/// Longer-duration big repair variant: 20 days, `+30` on commit.
pub fn big_repair_extended() -> ActionSpec {
    ActionSpec {
        name: "big repair (extended)".into(),
        health: HealthTransform::Add { delta: 30.0 },
        ..ReferenceAction::BigRepair.spec()
    }
}

// ============================================================================
// REFERENCE EMERGENCIES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ReferenceEmergency {
    /// Once a century on average.
    Destroy = 0,
    /// Once a decade on average.
    Damage = 1,
    /// Once a year on average.
    Wear = 2,
}

impl ReferenceEmergency {
    pub fn spec(&self) -> EmergencySpec {
        use crate::constants::calendar::DAYS_PER_YEAR;
        match self {
            Self::Destroy => EmergencySpec {
                name: "destroy".into(),
                health: HealthTransform::Add { delta: -20.0 },
                daily_probability: 1.0 / DAYS_PER_YEAR / 100.0,
            },
            Self::Damage => EmergencySpec {
                name: "damage".into(),
                health: HealthTransform::Add { delta: -5.0 },
                daily_probability: 1.0 / DAYS_PER_YEAR / 10.0,
            },
            Self::Wear => EmergencySpec {
                name: "wear".into(),
                health: HealthTransform::Add { delta: -1.0 },
                daily_probability: 1.0 / DAYS_PER_YEAR,
            },
        }
    }

    pub fn all() -> &'static [ReferenceEmergency] {
        &[Self::Destroy, Self::Damage, Self::Wear]
    }
}

pub fn reference_emergencies() -> Vec<EmergencySpec> {
    ReferenceEmergency::all().iter().map(|e| e.spec()).collect()
}

// ============================================================================
// LOOKUPS
// ============================================================================

/// Index of the idle program, if the catalog has exactly one.
pub fn idle_action_index(actions: &[ActionSpec]) -> Option<usize> {
    let mut idle = actions.iter().enumerate().filter(|(_, a)| a.idle);
    match (idle.next(), idle.next()) {
        (Some((i, _)), None) => Some(i),
        _ => None,
    }
}

pub fn action_index(actions: &[ActionSpec], name: &str) -> Option<usize> {
    actions.iter().position(|a| a.name == name)
}
