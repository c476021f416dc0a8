//! Spawn scheduler
//!
//! One target right away, a quick second beat at 45% of the cadence, then a
//! steady repeating beat until stopped.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::clock::{TimerId, TimerQueue, Wake};
use super::target::{Field, TargetId, TargetPool, random_size};
use crate::config::Preset;
use crate::consts::SECOND_BEAT_FACTOR;

/// Delay of the round's second spawn
pub fn second_beat_ms(spawn_every_ms: u64) -> u64 {
    (spawn_every_ms as f64 * SECOND_BEAT_FACTOR).round() as u64
}

#[derive(Debug, Clone)]
pub struct SpawnScheduler {
    rng: Pcg32,
    field: Field,
    lifetime_ms: u64,
    second_beat: Option<TimerId>,
    repeating: Option<TimerId>,
}

impl SpawnScheduler {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            field: Field::default(),
            lifetime_ms: 0,
            second_beat: None,
            repeating: None,
        }
    }

    /// Update the measured play surface; applies to the next spawn
    pub fn set_field(&mut self, field: Field) {
        self.field = field;
    }

    pub fn is_running(&self) -> bool {
        self.repeating.is_some()
    }

    /// Spawn the opening target and arm the second beat and cadence
    pub fn start(
        &mut self,
        timers: &mut TimerQueue<Wake>,
        pool: &mut TargetPool,
        preset: Preset,
    ) -> TargetId {
        self.stop(timers);
        self.lifetime_ms = preset.lifetime_ms;

        let first = self.spawn_one(timers, pool);
        let second = second_beat_ms(preset.spawn_every_ms);
        self.second_beat = Some(timers.schedule_in(second, Wake::Spawn));
        self.repeating = Some(timers.schedule_every(
            preset.spawn_every_ms,
            preset.spawn_every_ms,
            Wake::Spawn,
        ));
        log::debug!(
            "Spawner started: every {}ms, lifetime {}ms",
            preset.spawn_every_ms,
            preset.lifetime_ms
        );
        first
    }

    /// Cancel all pending beats. Safe to call repeatedly.
    pub fn stop(&mut self, timers: &mut TimerQueue<Wake>) {
        for timer in [self.second_beat.take(), self.repeating.take()]
            .into_iter()
            .flatten()
        {
            timers.cancel(timer);
        }
    }

    /// Create one target at a random spot with a random size
    pub fn spawn_one(&mut self, timers: &mut TimerQueue<Wake>, pool: &mut TargetPool) -> TargetId {
        let size = random_size(&mut self.rng);
        let pos = self.field.place(&mut self.rng, size);
        let id = pool.spawn(timers, pos, size, self.lifetime_ms);
        log::debug!("Spawned {:?} at ({:.0}, {:.0}) size {}", id, pos.x, pos.y, size);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Difficulty;

    fn spawn_times(preset: Preset, until: u64) -> Vec<u64> {
        let mut timers = TimerQueue::new();
        let mut pool = TargetPool::new();
        let mut spawner = SpawnScheduler::new(1);
        spawner.start(&mut timers, &mut pool, preset);

        let mut times = vec![0];
        while let Some((_, wake)) = timers.pop_due(until) {
            if wake == Wake::Spawn {
                spawner.spawn_one(&mut timers, &mut pool);
                times.push(timers.now());
            }
        }
        times
    }

    #[test]
    fn test_second_beat_rounding() {
        assert_eq!(second_beat_ms(800), 360);
        assert_eq!(second_beat_ms(650), 293);
        assert_eq!(second_beat_ms(1000), 450);
    }

    #[test]
    fn test_beat_pattern() {
        let preset = Difficulty::Medium.preset();
        assert_eq!(spawn_times(preset, 2500), vec![0, 360, 800, 1600, 2400]);
    }

    #[test]
    fn test_stop_is_idempotent_and_cancels() {
        let mut timers = TimerQueue::new();
        let mut pool = TargetPool::new();
        let mut spawner = SpawnScheduler::new(1);

        spawner.stop(&mut timers);
        spawner.start(&mut timers, &mut pool, Difficulty::Easy.preset());
        assert!(spawner.is_running());
        spawner.stop(&mut timers);
        spawner.stop(&mut timers);
        assert!(!spawner.is_running());

        // Only the opening target's expiry remains
        assert_eq!(timers.len(), 1);
        assert_eq!(
            timers.pop_due(u64::MAX).map(|(_, w)| w),
            Some(Wake::Expire(pool.iter().next().unwrap().id))
        );
    }

    #[test]
    fn test_spawns_copy_lifetime() {
        let mut timers = TimerQueue::new();
        let mut pool = TargetPool::new();
        let mut spawner = SpawnScheduler::new(3);
        let preset = Difficulty::Agony.preset();
        let id = spawner.start(&mut timers, &mut pool, preset);
        assert_eq!(pool.get(id).unwrap().lifetime_ms, preset.lifetime_ms);
    }
}
