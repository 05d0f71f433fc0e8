//! Operating/maintenance status bound to a highway.

use serde::{Deserialize, Serialize};

use crate::catalog::ActionSpec;
use crate::transforms::TrafficTransform;

/// A highway's current mode.
///
/// `idle` is set once at construction and marks the unrestricted,
/// aging-subject mode. Idle detection never compares names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub name: String,
    /// Days left; `f64::INFINITY` for the idle status.
    pub remaining: f64,
    pub interruptible: bool,
    pub idle: bool,
    pub traffic: TrafficTransform,
}

impl Status {
    /// The status induced by issuing `action`.
    pub fn for_action(action: &ActionSpec) -> Self {
        Self {
            name: action.name.clone(),
            remaining: action.remaining(),
            interruptible: action.interruptible,
            idle: action.idle,
            traffic: action.traffic,
        }
    }

    /// A stand-alone idle status, for highways built outside a catalog.
    pub fn idle(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            remaining: f64::INFINITY,
            interruptible: true,
            idle: true,
            traffic: TrafficTransform::Passthrough,
        }
    }

    pub fn has_expired(&self) -> bool {
        self.remaining <= 0.0
    }
}
