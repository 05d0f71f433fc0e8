//! Static environment configuration.
//!
//! An [`EnvConfig`] describes everything an episode is built from: the
//! calendar, reward constants, highway definitions, and the action and
//! emergency catalogs. It is loaded from JSON (the reference fleet ships in
//! `data/highways.json`) and validated before any environment is built, so the
//! stepping loop never sees a negative traffic count or a non-finite cost.

use serde::{Deserialize, Serialize};

use crate::catalog::{
    idle_action_index, reference_actions, reference_emergencies, ActionSpec, EmergencySpec,
};
use crate::constants::{calendar, health, reward, traffic};
use crate::error::{ConfigError, ConfigIssue};
use crate::highway::Highway;
use crate::reward::RewardParams;
use crate::status::Status;

const REFERENCE_JSON: &str = include_str!("../../../data/highways.json");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeConfig {
    /// Days advanced per `step`.
    pub time_unit_days: u32,
    pub days_per_year: f64,
    /// Episode horizon; the episode is done once the clock passes it.
    pub max_time_days: u64,
    /// Discount factor for agents aggregating rewards over many ticks.
    pub reward_gamma: f64,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            time_unit_days: calendar::TIME_UNIT_DAYS,
            days_per_year: calendar::DAYS_PER_YEAR,
            max_time_days: calendar::MAX_TIME_DAYS,
            reward_gamma: reward::GAMMA,
        }
    }
}

/// Fallbacks for fields a highway definition leaves out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighwayDefaults {
    pub health: f64,
    pub traffic: f64,
    pub unit_length_km: f64,
}

impl Default for HighwayDefaults {
    fn default() -> Self {
        Self {
            health: health::DEFAULT,
            traffic: traffic::DEFAULT,
            unit_length_km: traffic::UNIT_LENGTH_KM,
        }
    }
}

/// One named road. Expands into one or more segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighwayDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traffic: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<f64>,
    pub toll: f64,
    /// Road length; split into `unit_length_km` segments when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_length_km: Option<f64>,
}

impl HighwayDef {
    pub fn new(name: impl Into<String>, traffic: f64, toll: f64) -> Self {
        Self {
            name: name.into(),
            note: None,
            traffic: Some(traffic),
            health: None,
            toll,
            total_length_km: None,
        }
    }

    pub fn with_health(mut self, health: f64) -> Self {
        self.health = Some(health);
        self
    }

    pub fn with_length(mut self, total_length_km: f64) -> Self {
        self.total_length_km = Some(total_length_km);
        self
    }

    /// Raw split count, before bounds are applied. `None` for single-segment roads.
    fn raw_segment_count(&self, unit_length_km: f64) -> Option<f64> {
        match self.total_length_km {
            Some(total) if unit_length_km > 0.0 => Some((total / unit_length_km).floor()),
            _ => None,
        }
    }

    /// Number of segments this road splits into, within
    /// `[1, MAX_SEGMENTS_PER_ROAD]`. Validation rejects roads above the cap.
    pub fn segment_count(&self, unit_length_km: f64) -> usize {
        match self.raw_segment_count(unit_length_km) {
            Some(n) if n.is_finite() => (n as usize).clamp(1, traffic::MAX_SEGMENTS_PER_ROAD),
            Some(_) => traffic::MAX_SEGMENTS_PER_ROAD,
            None => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmergencyConfig {
    /// Emergency sampling is an opt-in extension; off by default.
    pub enabled: bool,
    pub seed: u64,
    pub catalog: Vec<EmergencySpec>,
}

impl Default for EmergencyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            seed: 42,
            catalog: reference_emergencies(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvConfig {
    #[serde(default)]
    pub time: TimeConfig,
    #[serde(default)]
    pub defaults: HighwayDefaults,
    #[serde(default)]
    pub reward: RewardParams,
    pub highways: Vec<HighwayDef>,
    #[serde(default = "reference_actions")]
    pub actions: Vec<ActionSpec>,
    #[serde(default)]
    pub emergencies: EmergencyConfig,
}

impl Default for EnvConfig {
    /// Reference calendar and catalogs with an empty fleet.
    fn default() -> Self {
        Self {
            time: TimeConfig::default(),
            defaults: HighwayDefaults::default(),
            reward: RewardParams::default(),
            highways: Vec::new(),
            actions: reference_actions(),
            emergencies: EmergencyConfig::default(),
        }
    }
}

impl EnvConfig {
    /// Reference calendar and catalogs over the given roads.
    pub fn with_highways(highways: Vec<HighwayDef>) -> Self {
        Self {
            highways,
            ..Self::default()
        }
    }

    /// The reference fleet of nine expressways.
    pub fn reference() -> Result<Self, ConfigError> {
        Self::from_json_str(REFERENCE_JSON)
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validated()
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// `self` if valid, otherwise every issue found.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let issues = self.validate();
        if issues.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Invalid(issues))
        }
    }

    /// Check the whole configuration, returning all issues found.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        self.validate_time(&mut issues);
        self.validate_defaults(&mut issues);
        self.validate_highways(&mut issues);
        self.validate_actions(&mut issues);
        self.validate_emergencies(&mut issues);
        issues
    }

    fn validate_time(&self, issues: &mut Vec<ConfigIssue>) {
        let t = &self.time;
        if t.time_unit_days == 0 {
            issues.push(ConfigIssue::ZeroTimeUnit);
        }
        if !(t.days_per_year.is_finite() && t.days_per_year > 0.0) {
            issues.push(ConfigIssue::InvalidDaysPerYear(t.days_per_year));
        }
        if !(0.0..=1.0).contains(&t.reward_gamma) {
            issues.push(ConfigIssue::InvalidGamma(t.reward_gamma));
        }
        let r = &self.reward;
        if !(r.scale.is_finite()
            && r.scale > 0.0
            && r.health_weight.is_finite()
            && r.baseline_offset.is_finite())
        {
            issues.push(ConfigIssue::InvalidRewardParams);
        }
    }

    fn validate_defaults(&self, issues: &mut Vec<ConfigIssue>) {
        let d = &self.defaults;
        if !(health::MIN..=health::MAX).contains(&d.health) {
            issues.push(ConfigIssue::InvalidDefault {
                field: "health",
                value: d.health,
            });
        }
        if !(d.traffic.is_finite() && d.traffic >= 0.0) {
            issues.push(ConfigIssue::InvalidDefault {
                field: "traffic",
                value: d.traffic,
            });
        }
        if !(d.unit_length_km.is_finite() && d.unit_length_km > 0.0) {
            issues.push(ConfigIssue::InvalidDefault {
                field: "unit_length_km",
                value: d.unit_length_km,
            });
        }
    }

    fn validate_highways(&self, issues: &mut Vec<ConfigIssue>) {
        if self.highways.is_empty() {
            issues.push(ConfigIssue::NoHighways);
        }
        for hw in &self.highways {
            if hw.name.trim().is_empty() {
                issues.push(ConfigIssue::EmptyName("highway"));
            }
            if let Some(t) = hw.traffic {
                if !(t.is_finite() && t >= 0.0) {
                    issues.push(ConfigIssue::InvalidTraffic {
                        highway: hw.name.clone(),
                        value: t,
                    });
                }
            }
            if !(hw.toll.is_finite() && hw.toll >= 0.0) {
                issues.push(ConfigIssue::InvalidToll {
                    highway: hw.name.clone(),
                    value: hw.toll,
                });
            }
            if let Some(h) = hw.health {
                if !(health::MIN..=health::MAX).contains(&h) {
                    issues.push(ConfigIssue::InvalidHealth {
                        highway: hw.name.clone(),
                        value: h,
                    });
                }
            }
            if let Some(len) = hw.total_length_km {
                if !(len.is_finite() && len > 0.0) {
                    issues.push(ConfigIssue::InvalidLength {
                        highway: hw.name.clone(),
                        value: len,
                    });
                } else if let Some(count) = hw.raw_segment_count(self.defaults.unit_length_km) {
                    if !(count.is_finite() && count <= traffic::MAX_SEGMENTS_PER_ROAD as f64) {
                        issues.push(ConfigIssue::TooManySegments {
                            highway: hw.name.clone(),
                            count,
                            max: traffic::MAX_SEGMENTS_PER_ROAD,
                        });
                    }
                }
            }
        }
    }

    fn validate_actions(&self, issues: &mut Vec<ConfigIssue>) {
        if self.actions.is_empty() {
            issues.push(ConfigIssue::NoActions);
            return;
        }

        let idle_count = self.actions.iter().filter(|a| a.idle).count();
        match idle_count {
            0 => issues.push(ConfigIssue::MissingIdleAction),
            1 => {}
            n => issues.push(ConfigIssue::MultipleIdleActions(n)),
        }

        for (i, a) in self.actions.iter().enumerate() {
            if a.name.trim().is_empty() {
                issues.push(ConfigIssue::EmptyName("action"));
            }
            if self.actions[..i].iter().any(|prev| prev.name == a.name) {
                issues.push(ConfigIssue::DuplicateAction(a.name.clone()));
            }
            if !(a.cost.is_finite() && a.cost >= 0.0) {
                issues.push(ConfigIssue::InvalidCost {
                    action: a.name.clone(),
                    value: a.cost,
                });
            }
            if !a.health.is_finite() || !a.traffic.is_valid() {
                issues.push(ConfigIssue::InvalidTransform(a.name.clone()));
            }
            match (a.idle, a.duration_days) {
                (true, Some(_)) => issues.push(ConfigIssue::IdleActionHasDuration(a.name.clone())),
                (true, None) => {}
                (false, None) => issues.push(ConfigIssue::MissingDuration(a.name.clone())),
                (false, Some(d)) => {
                    if !(d.is_finite() && d >= 0.0) {
                        issues.push(ConfigIssue::InvalidDuration {
                            action: a.name.clone(),
                            value: d,
                        });
                    }
                }
            }
            if a.idle && !a.interruptible {
                issues.push(ConfigIssue::IdleActionNotInterruptible(a.name.clone()));
            }
        }
    }

    fn validate_emergencies(&self, issues: &mut Vec<ConfigIssue>) {
        for e in &self.emergencies.catalog {
            if e.name.trim().is_empty() {
                issues.push(ConfigIssue::EmptyName("emergency"));
            }
            if !(0.0..=1.0).contains(&e.daily_probability) {
                issues.push(ConfigIssue::InvalidProbability {
                    emergency: e.name.clone(),
                    value: e.daily_probability,
                });
            }
            if !e.health.is_finite() {
                issues.push(ConfigIssue::InvalidTransform(e.name.clone()));
            }
        }
    }

    /// Index of the idle action. Only meaningful on a validated config.
    pub fn idle_action_index(&self) -> Option<usize> {
        idle_action_index(&self.actions)
    }

    /// Build the fleet: every road expanded into segments, tagged in order.
    pub fn build_highways(&self) -> Vec<Highway> {
        let default_status = self
            .idle_action_index()
            .map(|i| Status::for_action(&self.actions[i]))
            .unwrap_or_else(|| Status::idle("keep"));

        let mut highways = Vec::new();
        for def in &self.highways {
            let unit = self.defaults.unit_length_km;
            let count = def.segment_count(unit);
            let length_km = match def.total_length_km {
                Some(total) if count == 1 => total,
                _ => unit,
            };
            for segment in 0..count {
                let tag = highways.len();
                highways.push(
                    Highway::new(
                        def.name.clone(),
                        tag,
                        def.health.unwrap_or(self.defaults.health),
                        def.traffic.unwrap_or(self.defaults.traffic),
                        def.toll,
                        default_status.clone(),
                    )
                    .with_segment(segment, length_km),
                );
            }
        }
        highways
    }
}
