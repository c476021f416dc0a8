//! Round engine
//!
//! Owns round status, lives, score and the live targets, and is the only
//! place round state changes. Every mutation runs inside one handler: a UI
//! command or a timer wake-up popped by [`Engine::advance`].

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::clock::{TimerQueue, Wake};
use super::round_timer::RoundTimer;
use super::spawner::SpawnScheduler;
use super::target::{Field, TargetId, TargetPool};
use crate::config::{Config, Difficulty, LivesRule};

/// Round lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundStatus {
    /// No round active
    Ready,
    Playing,
    /// Lives ran out
    Failed,
    /// Time ran out with lives left
    Complete,
}

impl RoundStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoundStatus::Ready => "Ready",
            RoundStatus::Playing => "Playing",
            RoundStatus::Failed => "Failed",
            RoundStatus::Complete => "Complete",
        }
    }
}

/// Things the UI may want to animate or play a sound for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundEvent {
    RoundStarted { difficulty: Difficulty },
    TargetSpawned { id: TargetId },
    TargetHit { id: TargetId, score: u64 },
    TargetExpired { id: TargetId, was_hit: bool },
    /// Hit target finished settling and left the field
    TargetRemoved { id: TargetId },
    /// Miss feedback; `lives` is the count after the miss
    Miss { lives: u32 },
    RoundFailed { score: u64 },
    RoundComplete { score: u64 },
    RoundReset,
}

/// Render-facing view of one live target
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetView {
    pub id: TargetId,
    pub pos: Vec2,
    pub size: u32,
    pub lifetime_ms: u64,
    pub hit: bool,
    /// 1.0 at spawn, 0.0 at expiry
    pub remaining: f32,
}

/// Observable engine state, recomputed on demand
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub status: RoundStatus,
    pub score: u64,
    pub lives: u32,
    pub max_lives: u32,
    /// None when the duration is infinite
    pub time_left_ms: Option<u64>,
    pub is_infinite_lives: bool,
    pub is_infinite_duration: bool,
    pub live_targets: Vec<TargetView>,
}

impl Snapshot {
    /// "∞" or seconds with one decimal
    pub fn time_label(&self) -> String {
        match self.time_left_ms {
            Some(ms) => format!("{:.1}s", ms as f64 / 1000.0),
            None => "∞".to_string(),
        }
    }

    pub fn lives_label(&self) -> String {
        if self.is_infinite_lives {
            "∞".to_string()
        } else {
            self.lives.to_string()
        }
    }
}

/// The tap game session
#[derive(Debug, Clone)]
pub struct Engine {
    /// Settings as last edited
    config: Config,
    /// Settings in effect for the current (or idle) round
    active: Config,
    status: RoundStatus,
    lives: u32,
    score: u64,
    timers: TimerQueue<Wake>,
    pool: TargetPool,
    spawner: SpawnScheduler,
    round_timer: RoundTimer,
    events: Vec<RoundEvent>,
}

impl Engine {
    /// Engine with an entropy-seeded RNG
    pub fn new(config: Config) -> Self {
        Self::with_seed(config, rand::random())
    }

    /// Engine with a fixed RNG seed (reproducible placement)
    pub fn with_seed(config: Config, seed: u64) -> Self {
        let config = config.sanitized();
        let mut round_timer = RoundTimer::new();
        round_timer.seed_idle(config.duration_rule());
        Self {
            lives: config.starting_lives(),
            active: config.clone(),
            config,
            status: RoundStatus::Ready,
            score: 0,
            timers: TimerQueue::new(),
            pool: TargetPool::new(),
            spawner: SpawnScheduler::new(seed),
            round_timer,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn status(&self) -> RoundStatus {
        self.status
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn now_ms(&self) -> u64 {
        self.timers.now()
    }

    pub fn time_left_ms(&self) -> Option<u64> {
        self.round_timer.time_left_ms()
    }

    pub fn live_target_ids(&self) -> Vec<TargetId> {
        self.pool.iter().map(|t| t.id).collect()
    }

    /// Number of callbacks still scheduled (spawns, expiries, countdown)
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Take all events raised since the last call
    pub fn drain_events(&mut self) -> Vec<RoundEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> Snapshot {
        let now = self.timers.now();
        Snapshot {
            status: self.status,
            score: self.score,
            lives: self.lives,
            max_lives: self.active.max_lives,
            time_left_ms: self.round_timer.time_left_ms(),
            is_infinite_lives: self.active.infinite_lives,
            is_infinite_duration: self.active.infinite_duration,
            live_targets: self
                .pool
                .iter()
                .map(|t| TargetView {
                    id: t.id,
                    pos: t.pos,
                    size: t.size,
                    lifetime_ms: t.lifetime_ms,
                    hit: t.hit,
                    remaining: t.remaining_fraction(now),
                })
                .collect(),
        }
    }

    // === Lifecycle commands ===

    /// Begin a round from Ready. Ignored in any other status.
    pub fn start(&mut self) {
        if self.status != RoundStatus::Ready {
            log::debug!("start() ignored while {}", self.status.as_str());
            return;
        }
        self.begin_round();
    }

    /// Begin a fresh round from any status
    pub fn restart(&mut self) {
        self.begin_round();
    }

    /// Abandon any round and return to Ready with idle display values
    pub fn reset(&mut self) {
        self.halt();
        self.status = RoundStatus::Ready;
        self.score = 0;
        self.reseed_idle();
        self.events.push(RoundEvent::RoundReset);
        log::info!("Round reset");
    }

    // === Configuration ===

    /// Select a difficulty by name; unknown names mean Medium
    pub fn set_difficulty(&mut self, name: &str) {
        self.set_difficulty_level(Difficulty::from_name(name));
    }

    pub fn set_difficulty_level(&mut self, difficulty: Difficulty) {
        self.config.difficulty = difficulty;
        self.config_changed();
    }

    pub fn set_max_lives(&mut self, n: i64) {
        self.config.set_max_lives(n);
        self.config_changed();
    }

    pub fn set_infinite_lives(&mut self, infinite: bool) {
        self.config.infinite_lives = infinite;
        self.config_changed();
    }

    pub fn set_duration_sec(&mut self, n: i64) {
        self.config.set_duration_sec(n);
        self.config_changed();
    }

    pub fn set_infinite_duration(&mut self, infinite: bool) {
        self.config.infinite_duration = infinite;
        self.config_changed();
    }

    /// Replace every setting at once (e.g. from a loaded settings file)
    pub fn set_config(&mut self, config: Config) {
        self.config = config.sanitized();
        self.config_changed();
    }

    /// Measured play surface, used from the next spawn on
    pub fn set_field_size(&mut self, width: f32, height: f32) {
        self.spawner.set_field(Field::new(width, height));
    }

    // === Input ===

    /// Tap on a specific target
    pub fn tap_target(&mut self, id: TargetId) {
        if self.status != RoundStatus::Playing {
            return;
        }
        if self.pool.mark_hit(&mut self.timers, id) {
            self.score += 1;
            self.events.push(RoundEvent::TargetHit {
                id,
                score: self.score,
            });
            log::debug!("Hit {:?}, score {}", id, self.score);
        } else {
            log::debug!("Tap on {:?} ignored (gone or already hit)", id);
        }
    }

    /// Tap that landed on no target
    pub fn tap_background(&mut self) {
        if self.status != RoundStatus::Playing {
            return;
        }
        log::debug!("Background tap");
        self.apply_miss();
    }

    /// Tap at a field position, routed to the topmost target under it
    pub fn tap_at(&mut self, x: f32, y: f32) {
        if self.status != RoundStatus::Playing {
            return;
        }
        match self.pool.topmost_at(Vec2::new(x, y)) {
            Some(id) => self.tap_target(id),
            None => self.tap_background(),
        }
    }

    // === Time ===

    /// Advance the virtual clock by `dt_ms`, firing due timers in order
    pub fn advance(&mut self, dt_ms: u64) {
        let until = self.timers.now() + dt_ms;
        self.advance_to(until);
    }

    /// Advance the virtual clock to `now_ms` (never backwards)
    pub fn advance_to(&mut self, now_ms: u64) {
        while let Some((_, wake)) = self.timers.pop_due(now_ms) {
            self.handle_wake(wake);
        }
        self.timers.set_now(now_ms);
    }

    fn handle_wake(&mut self, wake: Wake) {
        if self.status != RoundStatus::Playing {
            // Every timer is cleared on leaving Playing
            log::warn!("Stray {:?} while {}", wake, self.status.as_str());
            return;
        }
        match wake {
            Wake::Spawn => {
                let id = self.spawner.spawn_one(&mut self.timers, &mut self.pool);
                self.events.push(RoundEvent::TargetSpawned { id });
            }
            Wake::Expire(id) => self.expire(id),
            Wake::Settle(id) => {
                if self.pool.remove(&mut self.timers, id).is_some() {
                    self.events.push(RoundEvent::TargetRemoved { id });
                }
            }
            Wake::CountdownTick => {
                if self.round_timer.refresh(self.timers.now()) {
                    self.complete();
                }
            }
            Wake::Deadline => {
                self.round_timer.refresh(self.timers.now());
                self.complete();
            }
        }
    }

    fn expire(&mut self, id: TargetId) {
        let Some(target) = self.pool.remove(&mut self.timers, id) else {
            return;
        };
        self.events.push(RoundEvent::TargetExpired {
            id,
            was_hit: target.hit,
        });
        if !target.hit {
            log::debug!("{:?} expired unhit", id);
            self.apply_miss();
        }
    }

    fn apply_miss(&mut self) {
        match self.active.lives_rule() {
            LivesRule::Infinite => {
                self.events.push(RoundEvent::Miss { lives: self.lives });
            }
            LivesRule::Finite(_) => {
                self.lives = self.lives.saturating_sub(1);
                self.events.push(RoundEvent::Miss { lives: self.lives });
                if self.lives == 0 {
                    self.fail();
                }
            }
        }
    }

    // === Transitions ===

    fn begin_round(&mut self) {
        self.halt();
        self.active = self.config.clone();
        self.lives = self.active.starting_lives();
        self.score = 0;
        self.status = RoundStatus::Playing;
        self.events.push(RoundEvent::RoundStarted {
            difficulty: self.active.difficulty,
        });
        log::info!(
            "Round started: {}, {:?}, {:?}",
            self.active.difficulty,
            self.active.lives_rule(),
            self.active.duration_rule()
        );

        self.round_timer
            .start(&mut self.timers, self.active.duration_rule());
        let first = self
            .spawner
            .start(&mut self.timers, &mut self.pool, self.active.preset());
        self.events.push(RoundEvent::TargetSpawned { id: first });
    }

    fn fail(&mut self) {
        if self.status != RoundStatus::Playing {
            return;
        }
        self.halt();
        self.status = RoundStatus::Failed;
        self.events.push(RoundEvent::RoundFailed { score: self.score });
        log::info!("Round failed with score {}", self.score);
    }

    /// Shared by the countdown refresh and the deadline backstop
    fn complete(&mut self) {
        if self.status != RoundStatus::Playing {
            return;
        }
        self.halt();
        self.round_timer.expire();
        self.status = RoundStatus::Complete;
        self.events.push(RoundEvent::RoundComplete { score: self.score });
        log::info!(
            "Round complete with score {}, lives {}",
            self.score,
            self.lives
        );
    }

    /// Stop spawning and the countdown, drop targets and any pending timer
    fn halt(&mut self) {
        self.spawner.stop(&mut self.timers);
        self.round_timer.stop(&mut self.timers);
        self.timers.clear();
        self.pool.clear();
    }

    fn config_changed(&mut self) {
        if self.status == RoundStatus::Playing {
            log::debug!("Config change deferred to next round");
            return;
        }
        self.reseed_idle();
    }

    fn reseed_idle(&mut self) {
        self.active = self.config.clone();
        self.lives = self.active.starting_lives();
        self.round_timer.seed_idle(self.active.duration_rule());
    }
}
