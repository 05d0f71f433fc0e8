//! Fleet coordinator — the highway maintenance environment.
//!
//! [`HighwayEnv`] owns the fleet and the catalogs and exposes the per-tick
//! transition. Each `step`:
//!
//! 1. validates the selections (one catalog index per highway) before touching
//!    any state,
//! 2. issues each selected action and scores every highway on its
//!    post-action, pre-update state,
//! 3. advances every highway by the time unit (sampling emergencies first
//!    when enabled),
//! 4. moves the clock and reports observation, averaged reward, `done`, and
//!    per-highway diagnostics.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::catalog::ActionSpec;
use crate::config::EnvConfig;
use crate::error::{ConfigError, ConfigIssue, StepError};
use crate::highway::{ActionOutcome, Highway};
use crate::reward::{average, highway_reward};

/// What the agent sees: health and interruptibility per highway, in tag order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub health: Vec<f64>,
    pub interruptible: Vec<bool>,
}

impl Observation {
    pub fn len(&self) -> usize {
        self.health.len()
    }

    pub fn is_empty(&self) -> bool {
        self.health.is_empty()
    }
}

/// Per-highway diagnostics for one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighwayStepInfo {
    pub tag: usize,
    /// Name of the selected action.
    pub action: String,
    pub outcome: ActionOutcome,
    /// Cost actually charged (zero when blocked).
    pub cost: f64,
    /// This highway's share of the tick reward, before averaging.
    pub reward: f64,
}

/// An emergency that fired during the tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyEvent {
    pub tag: usize,
    pub name: String,
    /// Simulated day the event fired on.
    pub day: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepInfo {
    /// Clock after the tick.
    pub time: u64,
    pub highways: Vec<HighwayStepInfo>,
    pub emergencies: Vec<EmergencyEvent>,
    /// Actions that committed during the tick, by highway tag.
    pub committed: Vec<usize>,
}

impl StepInfo {
    pub fn applied_count(&self) -> usize {
        self.highways
            .iter()
            .filter(|h| h.outcome == ActionOutcome::Applied)
            .count()
    }

    pub fn blocked_count(&self) -> usize {
        self.highways
            .iter()
            .filter(|h| h.outcome == ActionOutcome::Blocked)
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub observation: Observation,
    /// Mean of the per-highway rewards.
    pub reward: f64,
    pub done: bool,
    pub info: StepInfo,
}

/// The highway maintenance environment.
#[derive(Debug, Clone)]
pub struct HighwayEnv {
    config: EnvConfig,
    highways: Vec<Highway>,
    idle_action: usize,
    current_time: u64,
    done: bool,
    seed: u64,
    rng: StdRng,
}

impl HighwayEnv {
    /// Build an environment from a configuration, rejecting invalid ones.
    pub fn new(config: EnvConfig) -> Result<Self, ConfigError> {
        let config = config.validated()?;
        let idle_action = config
            .idle_action_index()
            .ok_or(ConfigError::Invalid(vec![ConfigIssue::MissingIdleAction]))?;
        let seed = config.emergencies.seed;
        let highways = config.build_highways();

        log::info!(
            "Highway environment built: {} segments from {} roads, {} actions, horizon {} days, emergencies {}",
            highways.len(),
            config.highways.len(),
            config.actions.len(),
            config.time.max_time_days,
            if config.emergencies.enabled { "on" } else { "off" },
        );

        Ok(Self {
            highways,
            idle_action,
            current_time: 0,
            done: false,
            seed,
            rng: StdRng::seed_from_u64(seed),
            config,
        })
    }

    /// Environment over the reference fleet and catalogs.
    pub fn reference() -> Result<Self, ConfigError> {
        Self::new(EnvConfig::reference()?)
    }

    /// Rebuild all mutable state from the configuration.
    pub fn reset(&mut self) -> Observation {
        self.highways = self.config.build_highways();
        self.current_time = 0;
        self.done = false;
        self.rng = StdRng::seed_from_u64(self.seed);
        log::info!("Highway environment reset (seed {})", self.seed);
        self.observation()
    }

    /// Reset with a new emergency seed.
    pub fn reset_with_seed(&mut self, seed: u64) -> Observation {
        self.seed = seed;
        self.reset()
    }

    /// Advance the world by one time unit.
    pub fn step(&mut self, selections: &[usize]) -> Result<StepResult, StepError> {
        self.check_selections(selections)?;

        // Phase 1: issue actions and score each highway before the day runs.
        let params = self.config.reward;
        let mut highway_info = Vec::with_capacity(self.highways.len());
        let mut rewards = Vec::with_capacity(self.highways.len());
        for (hw, &index) in self.highways.iter_mut().zip(selections) {
            let action = &self.config.actions[index];
            let outcome = hw.apply_action(action);
            let cost = match outcome {
                ActionOutcome::Applied => action.cost,
                ActionOutcome::Blocked => 0.0,
            };
            if outcome == ActionOutcome::Blocked {
                log::debug!(
                    "Highway {} ({}): `{}` blocked by non-interruptible `{}`",
                    hw.tag,
                    hw.name,
                    action.name,
                    hw.status().name
                );
            } else if !action.idle {
                log::debug!(
                    "Highway {} ({}): started `{}` at health {:.2}",
                    hw.tag,
                    hw.name,
                    action.name,
                    hw.health()
                );
            }
            let r = highway_reward(hw, cost, &params);
            rewards.push(r);
            highway_info.push(HighwayStepInfo {
                tag: hw.tag,
                action: action.name.clone(),
                outcome,
                cost,
                reward: r,
            });
        }

        // Phase 2: every highway lives through the time unit.
        let mut emergencies = Vec::new();
        let mut committed = Vec::new();
        for offset in 0..self.config.time.time_unit_days {
            let day = self.current_time + u64::from(offset);
            if self.config.emergencies.enabled {
                emergencies.extend(self.sample_emergencies(day));
            }
            for hw in &mut self.highways {
                let report = hw.advance_one_day(self.config.time.days_per_year);
                if report.committed {
                    log::debug!(
                        "Highway {} ({}): maintenance finished on day {}, health {:.2}",
                        hw.tag,
                        hw.name,
                        day,
                        hw.health()
                    );
                    committed.push(hw.tag);
                }
            }
        }

        // Phase 3: clock.
        self.current_time += u64::from(self.config.time.time_unit_days);
        if self.current_time > self.config.time.max_time_days && !self.done {
            self.done = true;
            log::info!("Episode horizon reached at day {}", self.current_time);
        }

        Ok(StepResult {
            observation: self.observation(),
            reward: average(&rewards),
            done: self.done,
            info: StepInfo {
                time: self.current_time,
                highways: highway_info,
                emergencies,
                committed,
            },
        })
    }

    fn check_selections(&self, selections: &[usize]) -> Result<(), StepError> {
        if selections.len() != self.highways.len() {
            return Err(StepError::SelectionLength {
                expected: self.highways.len(),
                got: selections.len(),
            });
        }
        let catalog_len = self.config.actions.len();
        if let Some((highway, &index)) = selections
            .iter()
            .enumerate()
            .find(|(_, i)| **i >= catalog_len)
        {
            return Err(StepError::ActionOutOfRange {
                highway,
                index,
                catalog_len,
            });
        }
        Ok(())
    }

    /// One independent trial per highway per emergency type.
    fn sample_emergencies(&mut self, day: u64) -> Vec<EmergencyEvent> {
        let mut fired = Vec::new();
        for hw in &mut self.highways {
            for emergency in &self.config.emergencies.catalog {
                if self.rng.gen_bool(emergency.daily_probability) {
                    hw.apply_emergency(emergency);
                    log::info!(
                        "Emergency `{}` on highway {} ({}) day {}: health now {:.2}",
                        emergency.name,
                        hw.tag,
                        hw.name,
                        day,
                        hw.health()
                    );
                    fired.push(EmergencyEvent {
                        tag: hw.tag,
                        name: emergency.name.clone(),
                        day,
                    });
                }
            }
        }
        fired
    }

    pub fn observation(&self) -> Observation {
        Observation {
            health: self.highways.iter().map(|h| h.health()).collect(),
            interruptible: self.highways.iter().map(|h| h.is_interruptible()).collect(),
        }
    }

    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    pub fn highways(&self) -> &[Highway] {
        &self.highways
    }

    pub fn highway(&self, tag: usize) -> Option<&Highway> {
        self.highways.get(tag)
    }

    pub fn actions(&self) -> &[ActionSpec] {
        &self.config.actions
    }

    pub fn num_highways(&self) -> usize {
        self.highways.len()
    }

    pub fn num_actions(&self) -> usize {
        self.config.actions.len()
    }

    /// Catalog index of the keep/idle action.
    pub fn idle_action_index(&self) -> usize {
        self.idle_action
    }

    pub fn current_time(&self) -> u64 {
        self.current_time
    }

    pub fn max_time(&self) -> u64 {
        self.config.time.max_time_days
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Overwrite the mutable state. Callers validate before calling.
    pub(crate) fn set_state(&mut self, highways: Vec<Highway>, current_time: u64, done: bool, seed: u64) {
        self.highways = highways;
        self.current_time = current_time;
        self.done = done;
        self.seed = seed;
        self.rng = StdRng::seed_from_u64(seed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aging::aging_speed;
    use crate::catalog::ReferenceAction;
    use crate::config::HighwayDef;
    use crate::reward::{reward, RewardParams};

    const SMALL: usize = ReferenceAction::SmallRepair as usize;
    const BIG: usize = ReferenceAction::BigRepair as usize;
    const REMAKE: usize = ReferenceAction::FullRemake as usize;
    const KEEP: usize = ReferenceAction::Keep as usize;

    fn two_highway_env() -> HighwayEnv {
        HighwayEnv::new(EnvConfig::with_highways(vec![
            HighwayDef::new("A", 1000.0, 7.0).with_health(50.0),
            HighwayDef::new("B", 300.0, 12.0).with_health(90.0),
        ]))
        .unwrap()
    }

    #[test]
    fn test_new_env_observation() {
        let env = two_highway_env();
        let obs = env.observation();
        assert_eq!(obs.health, vec![50.0, 90.0]);
        assert_eq!(obs.interruptible, vec![true, true]);
        assert_eq!(env.current_time(), 0);
        assert!(!env.is_done());
        assert_eq!(env.idle_action_index(), KEEP);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = HighwayEnv::new(EnvConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_keep_step_ages_and_averages() {
        let mut env = two_highway_env();
        let p = RewardParams::default();
        let r1 = reward(1000.0, 7.0, 50.0, 0.0, &p);
        let r2 = reward(300.0, 12.0, 90.0, 0.0, &p);

        let result = env.step(&[KEEP, KEEP]).unwrap();
        assert_eq!(result.reward, (r1 + r2) / 2.0);
        assert_eq!(result.observation.health[0], 50.0 - aging_speed(1000.0));
        assert_eq!(result.observation.health[1], 90.0 - aging_speed(300.0));
        assert_eq!(result.info.time, 1);
        assert_eq!(result.info.highways[0].action, "keep");
        assert_eq!(result.info.highways[0].outcome, ActionOutcome::Applied);
        assert!(!result.done);
    }

    #[test]
    fn test_reward_uses_post_action_pre_update_state() {
        let mut env = two_highway_env();
        let p = RewardParams::default();
        // Traffic only drops on the daily update, so the repair tick still
        // earns the old traffic but pays the cost.
        let expected = reward(1000.0, 7.0, 50.0, 50_000.0, &p);
        let result = env.step(&[SMALL, KEEP]).unwrap();
        assert_eq!(result.info.highways[0].reward, expected);
        assert_eq!(result.info.highways[0].cost, 50_000.0);
        assert_eq!(result.observation.interruptible, vec![false, true]);
        assert_eq!(env.highway(0).unwrap().traffic(), 0.0);
    }

    #[test]
    fn test_blocked_action_is_free_and_reported() {
        let mut env = two_highway_env();
        env.step(&[BIG, KEEP]).unwrap();
        let before = env.highway(0).unwrap().clone();

        let result = env.step(&[REMAKE, KEEP]).unwrap();
        let info = &result.info.highways[0];
        assert_eq!(info.outcome, ActionOutcome::Blocked);
        assert_eq!(info.action, "full remake");
        assert_eq!(info.cost, 0.0);
        assert_eq!(result.info.blocked_count(), 1);
        assert_eq!(result.info.applied_count(), 1);

        let p = RewardParams::default();
        let expected = reward(before.traffic(), before.toll, before.health(), 0.0, &p);
        assert_eq!(info.reward, expected);
        assert_eq!(env.highway(0).unwrap().status().name, "big repair");
    }

    #[test]
    fn test_repair_commit_reported() {
        let mut env = two_highway_env();
        let first = env.step(&[SMALL, KEEP]).unwrap();
        assert!(first.info.committed.is_empty());
        let second = env.step(&[KEEP, KEEP]).unwrap();
        assert_eq!(second.info.committed, vec![0]);
        assert_eq!(second.observation.health[0], 60.0);
        assert!(second.observation.interruptible[0]);
        assert_eq!(second.info.highways[0].outcome, ActionOutcome::Blocked);
    }

    #[test]
    fn test_wrong_selection_count_rejected() {
        let mut env = two_highway_env();
        let err = env.step(&[KEEP]).unwrap_err();
        assert_eq!(err, StepError::SelectionLength { expected: 2, got: 1 });
        assert_eq!(env.current_time(), 0);
    }

    #[test]
    fn test_out_of_range_rejected_without_mutation() {
        let mut env = two_highway_env();
        let before: Vec<Highway> = env.highways().to_vec();
        let err = env.step(&[SMALL, 4]).unwrap_err();
        assert_eq!(
            err,
            StepError::ActionOutOfRange {
                highway: 1,
                index: 4,
                catalog_len: 4
            }
        );
        assert_eq!(env.highways(), before.as_slice());
        assert_eq!(env.current_time(), 0);
    }

    #[test]
    fn test_done_after_horizon() {
        let mut cfg = EnvConfig::with_highways(vec![HighwayDef::new("A", 1000.0, 7.0)]);
        cfg.time.max_time_days = 3;
        let mut env = HighwayEnv::new(cfg).unwrap();
        for _ in 0..3 {
            assert!(!env.step(&[KEEP]).unwrap().done);
        }
        let last = env.step(&[KEEP]).unwrap();
        assert!(last.done);
        assert_eq!(last.info.time, 4);
    }

    #[test]
    fn test_multi_day_time_unit() {
        let mut cfg = EnvConfig::with_highways(vec![HighwayDef::new("A", 0.0, 7.0)]);
        cfg.time.time_unit_days = 2;
        let mut env = HighwayEnv::new(cfg).unwrap();
        // A two-day repair completes within one two-day tick.
        let result = env.step(&[SMALL]).unwrap();
        assert_eq!(result.info.time, 2);
        assert_eq!(result.info.committed, vec![0]);
        assert!(env.highway(0).unwrap().is_idle());
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut env = two_highway_env();
        let initial = env.observation();
        for _ in 0..30 {
            env.step(&[BIG, SMALL]).unwrap();
        }
        assert_ne!(env.observation(), initial);
        let obs = env.reset();
        assert_eq!(obs, initial);
        assert_eq!(env.current_time(), 0);
        assert!(!env.is_done());
        assert!(env.highways().iter().all(|h| h.is_idle()));
    }

    #[test]
    fn test_emergencies_off_by_default() {
        let mut env = two_highway_env();
        for _ in 0..365 {
            let result = env.step(&[KEEP, KEEP]).unwrap();
            assert!(result.info.emergencies.is_empty());
        }
    }

    #[test]
    fn test_certain_emergency_fires_before_aging() {
        let mut cfg = EnvConfig::with_highways(vec![HighwayDef::new("A", 1000.0, 7.0).with_health(50.0)]);
        cfg.emergencies.enabled = true;
        cfg.emergencies.catalog = vec![crate::catalog::EmergencySpec {
            name: "sinkhole".into(),
            health: crate::transforms::HealthTransform::Add { delta: -5.0 },
            daily_probability: 1.0,
        }];
        let mut env = HighwayEnv::new(cfg).unwrap();
        let result = env.step(&[KEEP]).unwrap();
        assert_eq!(result.info.emergencies.len(), 1);
        assert_eq!(result.info.emergencies[0].name, "sinkhole");
        assert_eq!(result.info.emergencies[0].day, 0);
        assert_eq!(result.observation.health[0], 45.0 - aging_speed(1000.0));
    }

    #[test]
    fn test_emergencies_deterministic_per_seed() {
        let mut cfg = EnvConfig::with_highways(vec![
            HighwayDef::new("A", 1000.0, 7.0),
            HighwayDef::new("B", 1000.0, 7.0),
        ]);
        cfg.emergencies.enabled = true;
        for e in &mut cfg.emergencies.catalog {
            e.daily_probability = 0.05;
        }
        let run = |env: &mut HighwayEnv| -> Vec<EmergencyEvent> {
            (0..200)
                .flat_map(|_| env.step(&[KEEP, KEEP]).unwrap().info.emergencies)
                .collect()
        };
        let mut env = HighwayEnv::new(cfg).unwrap();
        let first = run(&mut env);
        assert!(!first.is_empty());
        env.reset();
        assert_eq!(run(&mut env), first);
    }
}
