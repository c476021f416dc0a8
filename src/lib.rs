//! Tap Rush - A reaction-time tapping minigame
//!
//! Core modules:
//! - `config`: Difficulty presets and round rules (lives, duration)
//! - `sim`: Deterministic round engine (timers, targets, scoring)
//!
//! Rendering, layout and settings UI live outside this crate. The surrounding
//! UI drives [`sim::Engine`] with commands and `advance` calls, then reads
//! [`sim::Snapshot`] and drains [`sim::RoundEvent`]s.

pub mod config;
pub mod sim;

pub use config::{Config, ConfigError, Difficulty, DurationRule, LivesRule};
pub use sim::{Engine, RoundEvent, RoundStatus, Snapshot};

/// Game configuration constants
pub mod consts {
    /// Inset from every field edge that targets never cross
    pub const FIELD_PADDING: f32 = 10.0;
    /// Default play surface size, until the UI reports a measured one
    pub const DEFAULT_FIELD_WIDTH: f32 = 360.0;
    pub const DEFAULT_FIELD_HEIGHT: f32 = 520.0;

    /// Target diameter range (inclusive)
    pub const TARGET_SIZE_MIN: u32 = 56;
    pub const TARGET_SIZE_MAX: u32 = 110;

    /// The second spawn of a round lands at this fraction of the cadence
    pub const SECOND_BEAT_FACTOR: f64 = 0.45;

    /// Round countdown refresh interval (ms)
    pub const COUNTDOWN_TICK_MS: u64 = 100;

    /// Delay between a hit and the target leaving the pool (ms, cosmetic)
    pub const HIT_SETTLE_MS: u64 = 140;

    /// Lives and duration bounds
    pub const MIN_LIVES: u32 = 1;
    pub const MIN_DURATION_SEC: u32 = 5;
    pub const MAX_DURATION_SEC: u32 = 30;
}
