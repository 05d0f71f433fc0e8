//! Baseline policies and episode rollouts.
//!
//! Learning agents live outside this crate. These fixed policies give a
//! reference point for rewards and exercise the environment end to end.

use serde::{Deserialize, Serialize};

use crate::env::{HighwayEnv, Observation};
use crate::error::StepError;
use crate::highway::ActionOutcome;
use crate::reward::average;

/// Chooses one action index per highway from an observation.
pub trait Policy {
    fn select(&mut self, observation: &Observation) -> Vec<usize>;

    fn name(&self) -> &str {
        "policy"
    }
}

/// Never intervenes.
#[derive(Debug, Clone)]
pub struct KeepPolicy {
    pub idle_action: usize,
}

impl Policy for KeepPolicy {
    fn select(&mut self, observation: &Observation) -> Vec<usize> {
        vec![self.idle_action; observation.len()]
    }

    fn name(&self) -> &str {
        "keep"
    }
}

/// Issues `repair_action` on any highway whose health has dropped below
/// `threshold` and whose current status can be interrupted.
#[derive(Debug, Clone)]
pub struct ThresholdPolicy {
    pub threshold: f64,
    pub repair_action: usize,
    pub idle_action: usize,
}

impl Policy for ThresholdPolicy {
    fn select(&mut self, observation: &Observation) -> Vec<usize> {
        observation
            .health
            .iter()
            .zip(&observation.interruptible)
            .map(|(&health, &free)| {
                if free && health < self.threshold {
                    self.repair_action
                } else {
                    self.idle_action
                }
            })
            .collect()
    }

    fn name(&self) -> &str {
        "threshold"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RolloutConfig {
    /// Stop after this many ticks even if the horizon is not reached.
    pub max_ticks: Option<u64>,
    /// Record fleet health every N ticks (0 disables recording).
    pub record_interval: u64,
}

impl Default for RolloutConfig {
    fn default() -> Self {
        Self {
            max_ticks: None,
            record_interval: 1,
        }
    }
}

/// Fleet health at one recorded tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub tick: u64,
    pub health: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    pub policy: String,
    pub ticks: u64,
    pub total_reward: f64,
    pub mean_reward: f64,
    /// Discounted with the configured reward gamma.
    pub discounted_return: f64,
    pub final_health: Vec<f64>,
    pub actions_applied: u64,
    pub actions_blocked: u64,
    pub emergencies: u64,
    pub reached_horizon: bool,
    pub trajectory: Vec<TrajectoryPoint>,
}

/// Reset `env` and run `policy` until the episode ends or `max_ticks` is hit.
///
/// Idle selections that were applied are not counted in `actions_applied`.
pub fn run_episode(
    env: &mut HighwayEnv,
    policy: &mut dyn Policy,
    config: &RolloutConfig,
) -> Result<EpisodeSummary, StepError> {
    let gamma = env.config().time.reward_gamma;
    let idle = env.idle_action_index();
    let mut observation = env.reset();

    let mut rewards = Vec::new();
    let mut discounted = 0.0;
    let mut weight = 1.0;
    let mut applied = 0u64;
    let mut blocked = 0u64;
    let mut emergencies = 0u64;
    let mut trajectory = Vec::new();
    let mut ticks = 0u64;
    let mut done = env.is_done();

    while !done && config.max_ticks.map_or(true, |max| ticks < max) {
        let selections = policy.select(&observation);
        let result = env.step(&selections)?;
        ticks += 1;

        for (info, &index) in result.info.highways.iter().zip(&selections) {
            match info.outcome {
                ActionOutcome::Applied if index != idle => applied += 1,
                ActionOutcome::Blocked => blocked += 1,
                _ => {}
            }
        }
        emergencies += result.info.emergencies.len() as u64;

        discounted += weight * result.reward;
        weight *= gamma;
        rewards.push(result.reward);

        if config.record_interval > 0 && ticks % config.record_interval == 0 {
            trajectory.push(TrajectoryPoint {
                tick: ticks,
                health: result.observation.health.clone(),
            });
        }

        observation = result.observation;
        done = result.done;
    }

    let summary = EpisodeSummary {
        policy: policy.name().to_string(),
        ticks,
        total_reward: rewards.iter().sum(),
        mean_reward: average(&rewards),
        discounted_return: discounted,
        final_health: observation.health,
        actions_applied: applied,
        actions_blocked: blocked,
        emergencies,
        reached_horizon: done,
        trajectory,
    };
    log::info!(
        "Episode with `{}` policy: {} ticks, mean reward {:.3}, {} actions, {} blocked",
        summary.policy,
        summary.ticks,
        summary.mean_reward,
        summary.actions_applied,
        summary.actions_blocked
    );
    Ok(summary)
}
