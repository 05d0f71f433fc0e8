//! Save/restore of environment state.
//!
//! Uses bincode for a compact binary snapshot of the mutable part of a
//! [`HighwayEnv`]: clock, termination flag, emergency seed and every highway.
//! Configuration is not stored; a snapshot is restored into an environment
//! built from the same configuration.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::constants::health;
use crate::env::HighwayEnv;
use crate::error::SnapshotError;
use crate::highway::Highway;

/// Version number for the snapshot format (increment when format changes)
const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvSnapshot {
    pub version: u32,
    pub current_time: u64,
    pub done: bool,
    /// The emergency source is reseeded from this on restore, so the random
    /// stream restarts rather than continuing mid-sequence.
    pub seed: u64,
    pub highways: Vec<Highway>,
}

impl HighwayEnv {
    pub fn snapshot(&self) -> EnvSnapshot {
        EnvSnapshot {
            version: SNAPSHOT_VERSION,
            current_time: self.current_time(),
            done: self.is_done(),
            seed: self.seed(),
            highways: self.highways().to_vec(),
        }
    }

    /// Replace this environment's state with `snapshot`.
    ///
    /// The snapshot must come from an environment with the same fleet layout.
    /// Nothing changes if validation fails.
    pub fn restore(&mut self, snapshot: EnvSnapshot) -> Result<(), SnapshotError> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::VersionMismatch {
                found: snapshot.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        if snapshot.highways.len() != self.num_highways() {
            return Err(SnapshotError::HighwayCountMismatch {
                expected: self.num_highways(),
                found: snapshot.highways.len(),
            });
        }
        for (saved, current) in snapshot.highways.iter().zip(self.highways()) {
            if saved.tag != current.tag || saved.name != current.name {
                return Err(SnapshotError::HighwayMismatch {
                    tag: current.tag,
                    expected: current.name.clone(),
                });
            }
            if !(health::MIN..=health::MAX).contains(&saved.health()) {
                return Err(SnapshotError::InvalidHealth {
                    tag: saved.tag,
                    value: saved.health(),
                });
            }
            check_highway_state(saved)?;
        }

        log::info!(
            "Restored snapshot at day {} ({} highways)",
            snapshot.current_time,
            snapshot.highways.len()
        );
        self.set_state(
            snapshot.highways,
            snapshot.current_time,
            snapshot.done,
            snapshot.seed,
        );
        Ok(())
    }
}

/// Numeric fields a restored highway must carry: finite non-negative traffic
/// and toll, staged health within bounds, and a remaining time that is not NaN
/// (infinite for idle).
fn check_highway_state(hw: &Highway) -> Result<(), SnapshotError> {
    let invalid = |field, value| SnapshotError::InvalidState {
        tag: hw.tag,
        field,
        value,
    };
    let non_negative = |v: f64| v.is_finite() && v >= 0.0;

    if !non_negative(hw.traffic()) {
        return Err(invalid("traffic", hw.traffic()));
    }
    if !non_negative(hw.base_traffic()) {
        return Err(invalid("base traffic", hw.base_traffic()));
    }
    if !non_negative(hw.toll) {
        return Err(invalid("toll", hw.toll));
    }
    if let Some(staged) = hw.pending_health() {
        if !(health::MIN..=health::MAX).contains(&staged) {
            return Err(invalid("staged health", staged));
        }
    }
    let remaining = hw.status().remaining;
    if remaining.is_nan() || remaining < 0.0 {
        return Err(invalid("remaining days", remaining));
    }
    Ok(())
}

/// Write a snapshot of `env` to `writer`.
pub fn save_snapshot<W: Write>(env: &HighwayEnv, writer: W) -> Result<(), SnapshotError> {
    bincode::serialize_into(writer, &env.snapshot())?;
    Ok(())
}

/// Read a snapshot previously written by [`save_snapshot`].
pub fn load_snapshot<R: Read>(reader: R) -> Result<EnvSnapshot, SnapshotError> {
    let snapshot: EnvSnapshot = bincode::deserialize_from(reader)?;
    Ok(snapshot)
}

pub fn snapshot_to_bytes(env: &HighwayEnv) -> Result<Vec<u8>, SnapshotError> {
    Ok(bincode::serialize(&env.snapshot())?)
}

pub fn snapshot_from_bytes(bytes: &[u8]) -> Result<EnvSnapshot, SnapshotError> {
    Ok(bincode::deserialize(bytes)?)
}
