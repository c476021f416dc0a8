//! Targets, the live target pool and placement
//!
//! The pool also owns each target's lifecycle timers: an expiry armed at
//! spawn and, once hit, a short settle timer before removal. Removing a
//! target always cancels whatever it still has pending.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::clock::{TimerId, TimerQueue, Wake};
use crate::consts::*;

/// Opaque target identity, unique for the engine's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TargetId(pub u32);

/// A tappable, time-limited circle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    pub id: TargetId,
    /// Top-left of the bounding box, in field coordinates
    pub pos: Vec2,
    /// Diameter
    pub size: u32,
    pub lifetime_ms: u64,
    pub spawned_at_ms: u64,
    /// Set once by a successful tap; resolves hit/expiry races
    pub hit: bool,
    #[serde(skip)]
    expiry: Option<TimerId>,
    #[serde(skip)]
    settle: Option<TimerId>,
}

impl Target {
    pub fn center(&self) -> Vec2 {
        self.pos + Vec2::splat(self.size as f32 / 2.0)
    }

    /// Exact circle test, no forgiveness radius
    pub fn contains_point(&self, point: Vec2) -> bool {
        let r = self.size as f32 / 2.0;
        point.distance_squared(self.center()) <= r * r
    }

    /// Remaining lifetime as a 0..1 fraction (for ring rendering)
    pub fn remaining_fraction(&self, now_ms: u64) -> f32 {
        if self.lifetime_ms == 0 {
            return 0.0;
        }
        let elapsed = now_ms.saturating_sub(self.spawned_at_ms);
        1.0 - (elapsed as f32 / self.lifetime_ms as f32).min(1.0)
    }
}

/// Measured play surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub width: f32,
    pub height: f32,
}

impl Default for Field {
    fn default() -> Self {
        Self {
            width: DEFAULT_FIELD_WIDTH,
            height: DEFAULT_FIELD_HEIGHT,
        }
    }
}

impl Field {
    pub fn new(width: f32, height: f32) -> Self {
        // NaN or negative measurements collapse to an empty field
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    /// Uniform position inside the padded field, clamped so the whole target
    /// fits. Fields too small for the target pin it to the padding.
    pub fn place<R: Rng>(&self, rng: &mut R, size: u32) -> Vec2 {
        Vec2::new(
            place_axis(rng, self.width, size as f32),
            place_axis(rng, self.height, size as f32),
        )
    }
}

fn place_axis<R: Rng>(rng: &mut R, extent: f32, size: f32) -> f32 {
    let span = (extent - FIELD_PADDING * 2.0).max(0.0);
    let raw = FIELD_PADDING + rng.random::<f32>() * span;
    let max = (extent - FIELD_PADDING - size).max(FIELD_PADDING);
    raw.clamp(FIELD_PADDING, max)
}

/// Uniform diameter in the allowed range
pub fn random_size<R: Rng>(rng: &mut R) -> u32 {
    rng.random_range(TARGET_SIZE_MIN..=TARGET_SIZE_MAX)
}

/// Currently live targets, in spawn order
#[derive(Debug, Clone, Default)]
pub struct TargetPool {
    targets: Vec<Target>,
    next_id: u32,
}

impl TargetPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Target> {
        self.targets.iter()
    }

    pub fn get(&self, id: TargetId) -> Option<&Target> {
        self.targets.iter().find(|t| t.id == id)
    }

    /// Add a target and arm its expiry `lifetime_ms` from now
    pub fn spawn(
        &mut self,
        timers: &mut TimerQueue<Wake>,
        pos: Vec2,
        size: u32,
        lifetime_ms: u64,
    ) -> TargetId {
        self.next_id += 1;
        let id = TargetId(self.next_id);
        let expiry = timers.schedule_in(lifetime_ms, Wake::Expire(id));
        self.targets.push(Target {
            id,
            pos,
            size,
            lifetime_ms,
            spawned_at_ms: timers.now(),
            hit: false,
            expiry: Some(expiry),
            settle: None,
        });
        id
    }

    /// Mark a target hit and schedule its settle removal
    ///
    /// Returns false for unknown or already-hit targets.
    pub fn mark_hit(&mut self, timers: &mut TimerQueue<Wake>, id: TargetId) -> bool {
        let Some(target) = self.targets.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        if target.hit {
            return false;
        }
        target.hit = true;
        target.settle = Some(timers.schedule_in(HIT_SETTLE_MS, Wake::Settle(id)));
        true
    }

    /// Remove a target, cancelling its pending timers
    pub fn remove(&mut self, timers: &mut TimerQueue<Wake>, id: TargetId) -> Option<Target> {
        let idx = self.targets.iter().position(|t| t.id == id)?;
        let target = self.targets.remove(idx);
        for timer in [target.expiry, target.settle].into_iter().flatten() {
            timers.cancel(timer);
        }
        Some(target)
    }

    /// Drop every target. Callers clear the timer queue separately.
    pub fn clear(&mut self) {
        self.targets.clear();
    }

    /// Most recently spawned target under `point` (drawn on top)
    pub fn topmost_at(&self, point: Vec2) -> Option<TargetId> {
        self.targets
            .iter()
            .rev()
            .find(|t| t.contains_point(point))
            .map(|t| t.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_spawn_arms_expiry() {
        let mut timers = TimerQueue::new();
        let mut pool = TargetPool::new();
        let id = pool.spawn(&mut timers, Vec2::new(10.0, 10.0), 60, 1400);
        assert_eq!(pool.len(), 1);
        assert_eq!(timers.len(), 1);
        assert_eq!(timers.pop_due(1399), None);
        assert_eq!(timers.pop_due(1400).map(|(_, w)| w), Some(Wake::Expire(id)));
    }

    #[test]
    fn test_hit_once_then_removal_cancels_expiry() {
        let mut timers = TimerQueue::new();
        let mut pool = TargetPool::new();
        let id = pool.spawn(&mut timers, Vec2::ZERO, 60, 1000);

        assert!(pool.mark_hit(&mut timers, id));
        assert!(!pool.mark_hit(&mut timers, id));
        assert_eq!(timers.len(), 2);

        let removed = pool.remove(&mut timers, id).unwrap();
        assert!(removed.hit);
        assert!(timers.is_empty());
        assert!(pool.remove(&mut timers, id).is_none());
        assert!(!pool.mark_hit(&mut timers, id));
    }

    #[test]
    fn test_ids_are_unique_after_clear() {
        let mut timers = TimerQueue::new();
        let mut pool = TargetPool::new();
        let a = pool.spawn(&mut timers, Vec2::ZERO, 60, 1000);
        pool.clear();
        let b = pool.spawn(&mut timers, Vec2::ZERO, 60, 1000);
        assert_ne!(a, b);
    }

    #[test]
    fn test_hit_test_is_exact_circle() {
        let mut timers = TimerQueue::new();
        let mut pool = TargetPool::new();
        let id = pool.spawn(&mut timers, Vec2::new(100.0, 100.0), 60, 1000);

        assert_eq!(pool.topmost_at(Vec2::new(130.0, 130.0)), Some(id));
        assert_eq!(pool.topmost_at(Vec2::new(130.0, 100.5)), Some(id));
        // Inside the bounding box, outside the circle
        assert_eq!(pool.topmost_at(Vec2::new(101.0, 101.0)), None);
    }

    #[test]
    fn test_topmost_prefers_newest() {
        let mut timers = TimerQueue::new();
        let mut pool = TargetPool::new();
        let _under = pool.spawn(&mut timers, Vec2::new(50.0, 50.0), 80, 1000);
        let over = pool.spawn(&mut timers, Vec2::new(60.0, 60.0), 80, 1000);
        assert_eq!(pool.topmost_at(Vec2::new(95.0, 95.0)), Some(over));
    }

    #[test]
    fn test_tiny_field_pins_to_padding() {
        let mut rng = Pcg32::seed_from_u64(7);
        let field = Field::new(40.0, 30.0);
        for _ in 0..50 {
            let pos = field.place(&mut rng, 100);
            assert_eq!(pos, Vec2::splat(FIELD_PADDING));
        }
    }

    #[test]
    fn test_remaining_fraction() {
        let mut timers = TimerQueue::new();
        let mut pool = TargetPool::new();
        let id = pool.spawn(&mut timers, Vec2::ZERO, 60, 1000);
        let target = pool.get(id).unwrap();
        assert_eq!(target.remaining_fraction(0), 1.0);
        assert!((target.remaining_fraction(250) - 0.75).abs() < 1e-6);
        assert_eq!(target.remaining_fraction(5000), 0.0);
    }

    proptest! {
        #[test]
        fn prop_placement_stays_inside_padding(
            seed in any::<u64>(),
            width in 130.0f32..2000.0,
            height in 130.0f32..2000.0,
        ) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let field = Field::new(width, height);
            let size = random_size(&mut rng);
            prop_assert!((TARGET_SIZE_MIN..=TARGET_SIZE_MAX).contains(&size));

            let pos = field.place(&mut rng, size);
            prop_assert!(pos.x >= FIELD_PADDING && pos.y >= FIELD_PADDING);
            prop_assert!(pos.x + size as f32 <= width - FIELD_PADDING + 1e-3);
            prop_assert!(pos.y + size as f32 <= height - FIELD_PADDING + 1e-3);
        }
    }
}
