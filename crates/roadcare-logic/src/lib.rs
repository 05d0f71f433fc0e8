//! Pure highway lifecycle simulation logic for roadcare.
//!
//! This crate models the day-by-day degradation of a fleet of highway
//! segments under a finite catalog of maintenance actions, and exposes a
//! per-tick reward signal for sequential decision making. Everything here is
//! synchronous and in-process: functions take plain data and return results,
//! so the engine can be driven by a training harness, a headless validation
//! binary, or unit tests alike.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`aging`] | Pavement-quality degradation curve (traffic → health loss/day) |
//! | [`catalog`] | Maintenance action and emergency catalogs, reference entries |
//! | [`config`] | Static environment configuration, JSON loading, validation |
//! | [`constants`] | Health bounds, calendar and reward reference values |
//! | [`env`] | Fleet coordinator: `reset`/`step`, observations, diagnostics |
//! | [`error`] | Configuration, stepping and snapshot error types |
//! | [`highway`] | Per-segment state machine (health, traffic, status) |
//! | [`persistence`] | Versioned binary snapshots of coordinator state |
//! | [`policy`] | Fixed baseline policies and episode rollouts |
//! | [`reward`] | Per-highway utility, averaging, discounted return |
//! | [`status`] | Maintenance/operating status with explicit idle flag |
//! | [`transforms`] | Named health/traffic transform strategies |
//!
//! ```
//! use roadcare_logic::catalog::ReferenceAction;
//! use roadcare_logic::env::HighwayEnv;
//!
//! let mut env = HighwayEnv::reference().unwrap();
//! let keep = vec![ReferenceAction::Keep as usize; env.num_highways()];
//! let result = env.step(&keep).unwrap();
//! assert_eq!(result.observation.health.len(), env.num_highways());
//! assert!(!result.done);
//! ```

pub mod aging;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod env;
pub mod error;
pub mod highway;
pub mod persistence;
pub mod policy;
pub mod reward;
pub mod status;
pub mod transforms;
