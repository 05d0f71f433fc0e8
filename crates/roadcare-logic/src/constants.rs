//! Simulation constants — health bounds, calendar, reward reference values.
//!
//! Grouped in small modules the same way callers think about them. The
//! configuration layer uses these as defaults; nothing here is mutable.

pub mod health {
    /// A failed road segment.
    pub const MIN: f64 = 0.0;
    /// A newly built road segment.
    pub const MAX: f64 = 100.0;
    /// Starting health when a highway definition does not give one.
    pub const DEFAULT: f64 = 100.0;

    /// Clamp a health value into `[MIN, MAX]`.
    pub fn clamp(value: f64) -> f64 {
        value.clamp(MIN, MAX)
    }
}

pub mod calendar {
    /// Days advanced per tick.
    pub const TIME_UNIT_DAYS: u32 = 1;
    pub const DAYS_PER_YEAR: f64 = 365.0;
    /// Episode horizon: one hundred years.
    pub const MAX_TIME_DAYS: u64 = 365 * 100;
}

pub mod traffic {
    /// Daily vehicles when a highway definition does not give a count.
    pub const DEFAULT: f64 = 25_000.0;
    /// Segment length used to split multi-segment roads.
    pub const UNIT_LENGTH_KM: f64 = 1.0;
    /// Upper bound on segments a single road may expand into.
    pub const MAX_SEGMENTS_PER_ROAD: usize = 10_000;
}

pub mod reward {
    /// Divides `traffic × toll − cost` into health-comparable units.
    pub const SCALE: f64 = 10_000.0;
    pub const HEALTH_WEIGHT: f64 = 10.0;
    pub const BASELINE_OFFSET: f64 = 1_000.0;
    /// Discount factor offered to agents for multi-tick aggregation.
    pub const GAMMA: f64 = 0.99;
}
