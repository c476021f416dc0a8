//! Deterministic round simulation
//!
//! All gameplay logic lives here. Time is virtual and only moves through
//! [`Engine::advance`], so a round is fully reproducible from its seed and
//! the sequence of commands:
//! - Millisecond clock, no wall-clock reads
//! - Seeded RNG only
//! - Timers fire in (time, scheduling order)

pub mod clock;
pub mod engine;
pub mod round_timer;
pub mod spawner;
pub mod target;

pub use clock::{TimerId, TimerQueue, Wake};
pub use engine::{Engine, RoundEvent, RoundStatus, Snapshot, TargetView};
pub use round_timer::RoundTimer;
pub use spawner::{SpawnScheduler, second_beat_ms};
pub use target::{Field, Target, TargetId, TargetPool, random_size};
