//! roadcare Headless Simulation Harness
//!
//! Validates the pure simulation logic and the shipped reference data.
//! Runs entirely in-process and writes no files.
//!
//! Usage:
//!   cargo run -p roadcare-simtest
//!   cargo run -p roadcare-simtest -- --verbose

use roadcare_logic::aging;
use roadcare_logic::catalog::{ReferenceAction, ReferenceEmergency};
use roadcare_logic::config::{EnvConfig, HighwayDef};
use roadcare_logic::env::HighwayEnv;
use roadcare_logic::highway::ActionOutcome;
use roadcare_logic::persistence;
use roadcare_logic::policy::{self, KeepPolicy, RolloutConfig, ThresholdPolicy};
use roadcare_logic::reward::{self, RewardParams};
use serde::{Deserialize, Serialize};

// ── Reference data (same JSON the library embeds) ──────────────────────
const HIGHWAYS_JSON: &str = include_str!("../../../data/highways.json");

#[derive(Debug, Deserialize)]
struct RawFleet {
    highways: Vec<RawHighway>,
}

#[derive(Debug, Deserialize)]
struct RawHighway {
    name: String,
    traffic: Option<f64>,
    toll: f64,
    note: Option<String>,
}

const SMALL: usize = ReferenceAction::SmallRepair as usize;
const BIG: usize = ReferenceAction::BigRepair as usize;
const REMAKE: usize = ReferenceAction::FullRemake as usize;
const KEEP: usize = ReferenceAction::Keep as usize;

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

/// Compact rollout report printed with `--verbose`.
#[derive(Serialize)]
struct RolloutReport<'a> {
    policy: &'a str,
    ticks: u64,
    mean_reward: f64,
    discounted_return: f64,
    actions_applied: u64,
    actions_blocked: u64,
    final_health: &'a [f64],
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== roadcare Simulation Harness ===\n");

    let mut results = Vec::new();

    // 1. Reference data
    results.extend(validate_reference_data(verbose));

    // 2. Aging curve
    results.extend(validate_aging_curve(verbose));

    // 3. Highway state machine scenarios
    results.extend(validate_state_machine(verbose));

    // 4. Reward computation
    results.extend(validate_rewards(verbose));

    // 5. Full rollouts
    results.extend(validate_rollouts(verbose));

    // 6. Snapshots
    results.extend(validate_snapshots(verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Reference Data ───────────────────────────────────────────────────

fn validate_reference_data(verbose: bool) -> Vec<TestResult> {
    println!("--- Reference Data ---");
    let mut results = Vec::new();

    let raw: RawFleet = match serde_json::from_str(HIGHWAYS_JSON) {
        Ok(r) => r,
        Err(e) => {
            results.push(TestResult {
                name: "data_parse".into(),
                passed: false,
                detail: format!("JSON parse error: {}", e),
            });
            return results;
        }
    };

    let missing_traffic: Vec<_> = raw
        .highways
        .iter()
        .filter(|h| h.traffic.is_none())
        .map(|h| h.name.as_str())
        .collect();
    results.push(TestResult {
        name: "data_explicit_traffic".into(),
        passed: missing_traffic.is_empty(),
        detail: if missing_traffic.is_empty() {
            format!("{} roads with measured traffic", raw.highways.len())
        } else {
            format!("roads without traffic: {}", missing_traffic.join(", "))
        },
    });

    let config = match EnvConfig::from_json_str(HIGHWAYS_JSON) {
        Ok(c) => c,
        Err(e) => {
            results.push(TestResult {
                name: "config_valid".into(),
                passed: false,
                detail: e.to_string(),
            });
            return results;
        }
    };
    results.push(TestResult {
        name: "config_valid".into(),
        passed: true,
        detail: format!(
            "{} roads, {} actions, {} emergencies",
            config.highways.len(),
            config.actions.len(),
            config.emergencies.catalog.len()
        ),
    });

    let catalog_matches = ReferenceAction::all()
        .iter()
        .all(|a| config.actions.get(*a as usize) == Some(&a.spec()));
    results.push(TestResult {
        name: "catalog_matches_reference".into(),
        passed: catalog_matches,
        detail: "data/highways.json actions match ReferenceAction".into(),
    });

    let emergency_names_match = ReferenceEmergency::all()
        .iter()
        .zip(&config.emergencies.catalog)
        .all(|(r, e)| r.spec().name == e.name);
    results.push(TestResult {
        name: "emergencies_match_reference".into(),
        passed: emergency_names_match && !config.emergencies.enabled,
        detail: format!(
            "emergency sampling {}",
            if config.emergencies.enabled { "ON" } else { "off" }
        ),
    });

    if verbose {
        for h in &raw.highways {
            println!(
                "  {:>3}  traffic {:>8.0}  toll {:>4.0}  {}",
                h.name,
                h.traffic.unwrap_or_default(),
                h.toll,
                h.note.as_deref().unwrap_or("")
            );
        }
    }

    results
}

// ── 2. Aging Curve ──────────────────────────────────────────────────────

fn validate_aging_curve(verbose: bool) -> Vec<TestResult> {
    println!("--- Aging Curve ---");
    let mut results = Vec::new();

    let samples: Vec<(f64, f64)> = (0..=50)
        .map(|i| {
            let traffic = i as f64 * 1_000.0;
            (traffic, aging::aging_speed(traffic))
        })
        .collect();

    let non_negative = samples.iter().all(|(_, a)| *a >= 0.0);
    results.push(TestResult {
        name: "aging_non_negative".into(),
        passed: non_negative,
        detail: format!("0..50k vehicles, {} samples", samples.len()),
    });

    let monotone = samples.windows(2).all(|w| w[0].1 <= w[1].1);
    results.push(TestResult {
        name: "aging_monotone".into(),
        passed: monotone,
        detail: format!(
            "{:.5}/day at 0 → {:.5}/day at 50k",
            samples[0].1,
            samples[samples.len() - 1].1
        ),
    });

    // Reference expressway traffic should wear a road out within decades.
    let years_to_fail = 100.0 / (aging::aging_speed(25_000.0) * 365.0);
    results.push(TestResult {
        name: "aging_plausible_lifetime".into(),
        passed: (1.0..50.0).contains(&years_to_fail),
        detail: format!("{:.1} years from new to failed at 25k/day", years_to_fail),
    });

    if verbose {
        for (traffic, a) in samples.iter().step_by(10) {
            println!("  traffic {:>6.0}: {:.5} health/day", traffic, a);
        }
    }

    results
}

// ── 3. State Machine ────────────────────────────────────────────────────

fn single_env(health: f64, traffic: f64) -> Option<HighwayEnv> {
    HighwayEnv::new(EnvConfig::with_highways(vec![
        HighwayDef::new("T", traffic, 7.0).with_health(health),
    ]))
    .ok()
}

fn validate_state_machine(_verbose: bool) -> Vec<TestResult> {
    println!("--- Highway State Machine ---");
    let mut results = Vec::new();

    let Some(mut env) = single_env(100.0, 300.0) else {
        results.push(TestResult {
            name: "env_build".into(),
            passed: false,
            detail: "could not build single-highway environment".into(),
        });
        return results;
    };

    // Small repair at full health: two closed days, commit back to idle at 100.
    let day1 = env.step(&[SMALL]);
    let day2 = env.step(&[KEEP]);
    let passed = match (&day1, &day2) {
        (Ok(a), Ok(b)) => {
            a.observation.health == [100.0]
                && !a.observation.interruptible[0]
                && b.info.committed == [0]
                && b.observation.health == [100.0]
                && env.highways()[0].is_idle()
        }
        _ => false,
    };
    results.push(TestResult {
        name: "small_repair_commits".into(),
        passed,
        detail: "health frozen day 1, committed day 2, back to idle".into(),
    });

    let blocked = day2
        .as_ref()
        .map(|r| r.info.highways[0].outcome == ActionOutcome::Blocked && r.info.highways[0].cost == 0.0)
        .unwrap_or(false);
    results.push(TestResult {
        name: "non_interruptible_blocks".into(),
        passed: blocked,
        detail: "keep during repair is a free no-op".into(),
    });

    // Full remake from 10.
    let remake_ok = single_env(10.0, 30_000.0)
        .map(|mut env| {
            let mut last = None;
            for i in 0..60 {
                let sel = if i == 0 { REMAKE } else { KEEP };
                last = env.step(&[sel]).ok();
            }
            last.map(|r| r.observation.health == [100.0]).unwrap_or(false)
        })
        .unwrap_or(false);
    results.push(TestResult {
        name: "full_remake_resets".into(),
        passed: remake_ok,
        detail: "health 10 → 100 after 60 days".into(),
    });

    // Idle never expires.
    let idle_ok = single_env(100.0, 25_000.0)
        .map(|mut env| {
            let committed = (0..3_650)
                .filter_map(|_| env.step(&[KEEP]).ok())
                .any(|r| !r.info.committed.is_empty());
            !committed && env.highways()[0].status().remaining.is_infinite()
        })
        .unwrap_or(false);
    results.push(TestResult {
        name: "idle_never_commits".into(),
        passed: idle_ok,
        detail: "ten idle years without a commit".into(),
    });

    // Out-of-range selection rejected.
    let rejected = single_env(50.0, 1_000.0)
        .map(|mut env| env.step(&[99]).is_err() && env.current_time() == 0)
        .unwrap_or(false);
    results.push(TestResult {
        name: "out_of_range_rejected".into(),
        passed: rejected,
        detail: "index 99 rejected before any mutation".into(),
    });

    results
}

// ── 4. Rewards ──────────────────────────────────────────────────────────

fn validate_rewards(_verbose: bool) -> Vec<TestResult> {
    println!("--- Rewards ---");
    let mut results = Vec::new();
    let p = RewardParams::default();

    let env = HighwayEnv::new(EnvConfig::with_highways(vec![
        HighwayDef::new("A", 20_000.0, 9.0).with_health(70.0),
        HighwayDef::new("B", 800.0, 50.0).with_health(30.0),
    ]));
    let averaged = env
        .ok()
        .and_then(|mut env| env.step(&[BIG, KEEP]).ok())
        .map(|r| {
            let r1 = reward::reward(20_000.0, 9.0, 70.0, 200_000.0, &p);
            let r2 = reward::reward(800.0, 50.0, 30.0, 0.0, &p);
            r.reward == (r1 + r2) / 2.0
        })
        .unwrap_or(false);
    results.push(TestResult {
        name: "reward_is_fleet_average".into(),
        passed: averaged,
        detail: "two-highway tick averages exactly".into(),
    });

    let cheaper = reward::reward(1_000.0, 5.0, 50.0, 0.0, &p) > reward::reward(1_000.0, 5.0, 50.0, 1.0, &p);
    let healthier = reward::reward(1_000.0, 5.0, 51.0, 0.0, &p) > reward::reward(1_000.0, 5.0, 50.0, 0.0, &p);
    let busier = reward::reward(1_001.0, 5.0, 50.0, 0.0, &p) > reward::reward(1_000.0, 5.0, 50.0, 0.0, &p);
    results.push(TestResult {
        name: "reward_monotone".into(),
        passed: cheaper && healthier && busier,
        detail: "less cost, more health, more traffic all pay".into(),
    });

    results
}

// ── 5. Rollouts ─────────────────────────────────────────────────────────

fn validate_rollouts(verbose: bool) -> Vec<TestResult> {
    println!("--- Rollouts ---");
    let mut results = Vec::new();

    let mut config = match EnvConfig::reference() {
        Ok(c) => c,
        Err(e) => {
            results.push(TestResult {
                name: "rollout_config".into(),
                passed: false,
                detail: e.to_string(),
            });
            return results;
        }
    };
    config.time.max_time_days = 3 * 365;

    let mut env = match HighwayEnv::new(config.clone()) {
        Ok(env) => env,
        Err(e) => {
            results.push(TestResult {
                name: "rollout_env".into(),
                passed: false,
                detail: e.to_string(),
            });
            return results;
        }
    };

    let rollout = RolloutConfig {
        max_ticks: None,
        record_interval: 30,
    };
    let mut keep = KeepPolicy { idle_action: KEEP };
    let mut threshold = ThresholdPolicy {
        threshold: 60.0,
        repair_action: REMAKE,
        idle_action: KEEP,
    };

    let summaries = [
        policy::run_episode(&mut env, &mut keep, &rollout),
        policy::run_episode(&mut env, &mut threshold, &rollout),
    ];

    for summary in &summaries {
        match summary {
            Ok(s) => {
                let in_bounds = s
                    .trajectory
                    .iter()
                    .flat_map(|p| &p.health)
                    .all(|h| (0.0..=100.0).contains(h));
                results.push(TestResult {
                    name: format!("rollout_{}", s.policy),
                    passed: s.reached_horizon && in_bounds,
                    detail: format!(
                        "{} ticks, mean reward {:.2}, {} actions",
                        s.ticks, s.mean_reward, s.actions_applied
                    ),
                });
                if verbose {
                    let report = RolloutReport {
                        policy: &s.policy,
                        ticks: s.ticks,
                        mean_reward: s.mean_reward,
                        discounted_return: s.discounted_return,
                        actions_applied: s.actions_applied,
                        actions_blocked: s.actions_blocked,
                        final_health: &s.final_health,
                    };
                    if let Ok(json) = serde_json::to_string_pretty(&report) {
                        println!("{}", json);
                    }
                }
            }
            Err(e) => results.push(TestResult {
                name: "rollout".into(),
                passed: false,
                detail: e.to_string(),
            }),
        }
    }

    if let [Ok(neglect), Ok(maintained)] = &summaries {
        let worst = |s: &policy::EpisodeSummary| {
            s.final_health.iter().cloned().fold(f64::INFINITY, f64::min)
        };
        results.push(TestResult {
            name: "maintenance_beats_neglect".into(),
            passed: worst(maintained) > worst(neglect),
            detail: format!(
                "worst final health {:.1} maintained vs {:.1} neglected",
                worst(maintained),
                worst(neglect)
            ),
        });
    }

    // Emergencies on: deterministic for a fixed seed.
    config.emergencies.enabled = true;
    config.time.max_time_days = 365;
    let deterministic = HighwayEnv::new(config)
        .ok()
        .map(|mut env| {
            let a = policy::run_episode(&mut env, &mut keep, &rollout).ok();
            let b = policy::run_episode(&mut env, &mut keep, &rollout).ok();
            a.is_some() && a == b
        })
        .unwrap_or(false);
    results.push(TestResult {
        name: "emergencies_deterministic".into(),
        passed: deterministic,
        detail: "same seed, same emergencies".into(),
    });

    results
}

// ── 6. Snapshots ────────────────────────────────────────────────────────

fn validate_snapshots(_verbose: bool) -> Vec<TestResult> {
    println!("--- Snapshots ---");
    let mut results = Vec::new();

    let round_trip = (|| -> Option<bool> {
        let mut env = HighwayEnv::reference().ok()?;
        let mut selections = vec![KEEP; env.num_highways()];
        selections[0] = BIG;
        for _ in 0..10 {
            env.step(&selections).ok()?;
        }
        let bytes = persistence::snapshot_to_bytes(&env).ok()?;
        let mut restored = HighwayEnv::reference().ok()?;
        restored
            .restore(persistence::snapshot_from_bytes(&bytes).ok()?)
            .ok()?;
        let a = env.step(&selections).ok()?;
        let b = restored.step(&selections).ok()?;
        Some(a == b)
    })()
    .unwrap_or(false);
    results.push(TestResult {
        name: "snapshot_round_trip".into(),
        passed: round_trip,
        detail: "restored environment steps identically".into(),
    });

    results
}
