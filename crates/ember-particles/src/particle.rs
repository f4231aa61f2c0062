//! Particle state and the intrusive-list pool that recycles it
//!
//! Particles live in a single arena owned by the emitter. Each slot is a
//! member of exactly one of two index-linked lists: the active list (alive,
//! updated every frame, in spawn order) or the free list (pooled, inert).
//! Spawning and recycling only move slots between the lists, so a running
//! effect stops allocating once its pool has grown to its peak population.

use crate::render::{BlendMode, TextureHandle};
use ember_core::Vec2;

/// Stable handle to a particle slot
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticleId(u32);

impl ParticleId {
    /// Slot index in the pool arena
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Create an id from a raw slot index (for renderers keying their own tables)
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Which list a particle currently belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Membership {
    Active,
    Free,
    /// Transient state between leaving the free list and joining the active list
    Detached,
}

/// Segment cursors for keyframe lists shared across particles
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ListCursors {
    pub alpha: usize,
    pub scale: usize,
    pub color: usize,
    pub speed: usize,
}

/// Per-particle state owned by individual behaviors.
///
/// Behaviors never read each other's fields except `velocity`, which every
/// movement behavior writes and `moveAcceleration` may turn into a rotation.
#[derive(Clone, Debug, PartialEq)]
pub struct ParticleScratch {
    /// Velocity in units/second (moveSpeed, moveSpeedStatic, moveAcceleration)
    pub velocity: Vec2,
    /// Random speed multiplier rolled at spawn (moveSpeed, movePath)
    pub speed_mult: f32,
    /// Random scale multiplier rolled at spawn (scale)
    pub scale_mult: f32,
    /// Angular velocity in radians/second (rotation)
    pub rotation_speed: f32,
    /// Position at the end of initialization (movePath)
    pub init_position: Vec2,
    /// Rotation at the end of initialization (movePath)
    pub init_rotation: f32,
    /// Distance travelled along the path (movePath)
    pub path_distance: f32,
    /// Animation picked for this particle (animatedSingle, animatedRandom)
    pub anim_index: usize,
    /// Seconds into the current animation (animatedSingle, animatedRandom)
    pub anim_elapsed: f32,
    /// Keyframe segment cursors (alpha, scale, color, moveSpeed/movePath)
    pub cursors: ListCursors,
}

impl Default for ParticleScratch {
    fn default() -> Self {
        Self {
            velocity: Vec2::ZERO,
            speed_mult: 1.0,
            scale_mult: 1.0,
            rotation_speed: 0.0,
            init_position: Vec2::ZERO,
            init_rotation: 0.0,
            path_distance: 0.0,
            anim_index: 0,
            anim_elapsed: 0.0,
            cursors: ListCursors::default(),
        }
    }
}

/// One simulated particle. Plain data: the emitter ages it and behaviors
/// write its visual state.
#[derive(Clone, Debug)]
pub struct Particle {
    pub position: Vec2,
    /// Rotation in radians
    pub rotation: f32,
    pub scale: Vec2,
    pub alpha: f32,
    /// Packed 0xRRGGBB tint
    pub tint: u32,
    pub texture: Option<TextureHandle>,
    pub blend_mode: BlendMode,
    pub visible: bool,
    /// Seconds since spawn
    pub age: f32,
    /// Lifetime in seconds
    pub max_life: f32,
    pub one_over_life: f32,
    /// Normalized (and optionally eased) age in [0, 1]
    pub age_percent: f32,
    pub scratch: ParticleScratch,
    next: Option<ParticleId>,
    prev: Option<ParticleId>,
    membership: Membership,
}

impl Particle {
    fn new() -> Self {
        Self {
            position: Vec2::ZERO,
            rotation: 0.0,
            scale: Vec2::ONE,
            alpha: 1.0,
            tint: 0xFF_FF_FF,
            texture: None,
            blend_mode: BlendMode::Normal,
            visible: false,
            age: 0.0,
            max_life: 0.0,
            one_over_life: 0.0,
            age_percent: 0.0,
            scratch: ParticleScratch::default(),
            next: None,
            prev: None,
            membership: Membership::Detached,
        }
    }

    /// Reset for a new life of `lifetime` seconds and make visible
    pub fn init(&mut self, lifetime: f32) {
        self.age = 0.0;
        self.age_percent = 0.0;
        self.max_life = lifetime;
        self.one_over_life = if lifetime > 0.0 { 1.0 / lifetime } else { 0.0 };
        self.position = Vec2::ZERO;
        self.rotation = 0.0;
        self.scale = Vec2::ONE;
        self.alpha = 1.0;
        self.tint = 0xFF_FF_FF;
        self.blend_mode = BlendMode::Normal;
        self.scratch = ParticleScratch::default();
        self.visible = true;
    }

    /// Hide the particle and drop everything it references
    pub fn clear(&mut self) {
        self.visible = false;
        self.texture = None;
        self.scratch = ParticleScratch::default();
    }

    /// True once the particle has outlived its lifetime (or was aged backwards)
    pub fn is_dead(&self) -> bool {
        self.age >= self.max_life || self.age < 0.0
    }

    pub fn next(&self) -> Option<ParticleId> {
        self.next
    }

    pub fn prev(&self) -> Option<ParticleId> {
        self.prev
    }

    pub fn membership(&self) -> Membership {
        self.membership
    }
}

/// Arena of particles threaded onto an active list and a free list
#[derive(Debug, Default)]
pub struct ParticlePool {
    slots: Vec<Particle>,
    active_head: Option<ParticleId>,
    active_tail: Option<ParticleId>,
    free_head: Option<ParticleId>,
    active_count: usize,
    free_count: usize,
}

impl ParticlePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total slots ever allocated (active + pooled)
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn active_count(&self) -> usize {
        self.active_count
    }

    pub fn free_count(&self) -> usize {
        self.free_count
    }

    pub fn active_head(&self) -> Option<ParticleId> {
        self.active_head
    }

    pub fn active_tail(&self) -> Option<ParticleId> {
        self.active_tail
    }

    pub fn get(&self, id: ParticleId) -> Option<&Particle> {
        self.slots.get(id.index())
    }

    pub fn get_mut(&mut self, id: ParticleId) -> Option<&mut Particle> {
        self.slots.get_mut(id.index())
    }

    /// Take a slot from the free list, allocating a new one when the pool is dry.
    /// The returned particle is detached until passed to [`push_active`](Self::push_active).
    pub fn acquire(&mut self) -> ParticleId {
        if let Some(id) = self.free_head {
            let particle = &mut self.slots[id.index()];
            self.free_head = particle.next;
            particle.next = None;
            particle.prev = None;
            particle.membership = Membership::Detached;
            self.free_count -= 1;
            return id;
        }

        let id = ParticleId(self.slots.len() as u32);
        self.slots.push(Particle::new());
        id
    }

    /// Append a detached particle to the tail of the active list
    pub fn push_active(&mut self, id: ParticleId) {
        debug_assert_eq!(self.slots[id.index()].membership, Membership::Detached);

        let tail = self.active_tail;
        {
            let particle = &mut self.slots[id.index()];
            particle.prev = tail;
            particle.next = None;
            particle.membership = Membership::Active;
        }
        match tail {
            Some(tail) => self.slots[tail.index()].next = Some(id),
            None => self.active_head = Some(id),
        }
        self.active_tail = Some(id);
        self.active_count += 1;
    }

    /// Unlink an active particle and push it onto the free list.
    /// Returns false if the particle was not active.
    pub fn release(&mut self, id: ParticleId) -> bool {
        let Some(particle) = self.slots.get(id.index()) else {
            return false;
        };
        if particle.membership != Membership::Active {
            return false;
        }
        let (prev, next) = (particle.prev, particle.next);

        match prev {
            Some(prev) => self.slots[prev.index()].next = next,
            None => self.active_head = next,
        }
        match next {
            Some(next) => self.slots[next.index()].prev = prev,
            None => self.active_tail = prev,
        }

        let free_head = self.free_head;
        let particle = &mut self.slots[id.index()];
        particle.prev = None;
        particle.next = free_head;
        particle.membership = Membership::Free;
        self.free_head = Some(id);
        self.active_count -= 1;
        self.free_count += 1;
        true
    }

    /// Drop every slot, active and pooled
    pub fn clear(&mut self) {
        self.slots.clear();
        self.active_head = None;
        self.active_tail = None;
        self.free_head = None;
        self.active_count = 0;
        self.free_count = 0;
    }

    /// Iterate active particles from oldest to newest
    pub fn iter_active(&self) -> ActiveIter<'_> {
        ActiveIter {
            pool: self,
            cursor: self.active_head,
        }
    }

    /// Cursor over the active list from `first` to the tail
    pub fn wave(&mut self, first: ParticleId) -> Wave<'_> {
        Wave {
            pool: self,
            first: Some(first),
            cursor: Some(first),
        }
    }

    /// Audit the list structure: both lists well-formed and acyclic, counts
    /// accurate, and every slot in exactly one list.
    pub fn is_consistent(&self) -> bool {
        let mut seen = vec![false; self.slots.len()];

        let mut count = 0;
        let mut prev = None;
        let mut cursor = self.active_head;
        while let Some(id) = cursor {
            let Some(particle) = self.slots.get(id.index()) else {
                return false;
            };
            if seen[id.index()] || particle.membership != Membership::Active || particle.prev != prev
            {
                return false;
            }
            seen[id.index()] = true;
            count += 1;
            prev = Some(id);
            cursor = particle.next;
        }
        if count != self.active_count || prev != self.active_tail {
            return false;
        }

        let mut free = 0;
        let mut cursor = self.free_head;
        while let Some(id) = cursor {
            let Some(particle) = self.slots.get(id.index()) else {
                return false;
            };
            if seen[id.index()] || particle.membership != Membership::Free || particle.prev.is_some()
            {
                return false;
            }
            seen[id.index()] = true;
            free += 1;
            cursor = particle.next;
        }

        free == self.free_count && seen.iter().all(|&s| s)
    }
}

/// Iterator over active particles, oldest first
pub struct ActiveIter<'a> {
    pool: &'a ParticlePool,
    cursor: Option<ParticleId>,
}

impl<'a> Iterator for ActiveIter<'a> {
    type Item = (ParticleId, &'a Particle);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cursor?;
        let particle = &self.pool.slots[id.index()];
        self.cursor = particle.next;
        Some((id, particle))
    }
}

/// Mutable cursor over a freshly spawned wave (the tail of the active list).
///
/// ```ignore
/// while let Some(particle) = wave.next_particle() {
///     particle.alpha = 0.5;
/// }
/// ```
pub struct Wave<'a> {
    pool: &'a mut ParticlePool,
    first: Option<ParticleId>,
    cursor: Option<ParticleId>,
}

impl Wave<'_> {
    pub fn next_particle(&mut self) -> Option<&mut Particle> {
        self.next_with_id().map(|(_, particle)| particle)
    }

    pub fn next_with_id(&mut self) -> Option<(ParticleId, &mut Particle)> {
        let id = self.cursor?;
        let particle = &mut self.pool.slots[id.index()];
        self.cursor = particle.next;
        Some((id, particle))
    }

    /// Restart from the first particle of the wave
    pub fn rewind(&mut self) {
        self.cursor = self.first;
    }

    pub fn first(&self) -> Option<ParticleId> {
        self.first
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn(pool: &mut ParticlePool, lifetime: f32) -> ParticleId {
        let id = pool.acquire();
        pool.get_mut(id).unwrap().init(lifetime);
        pool.push_active(id);
        id
    }

    #[test]
    fn pool_spawn_and_release() {
        let mut pool = ParticlePool::new();
        let a = spawn(&mut pool, 1.0);
        let b = spawn(&mut pool, 1.0);
        let c = spawn(&mut pool, 1.0);
        assert_eq!(pool.active_count(), 3);
        assert!(pool.is_consistent());

        // Release the middle one
        assert!(pool.release(b));
        assert_eq!(pool.active_count(), 2);
        assert_eq!(pool.free_count(), 1);
        assert_eq!(pool.get(a).unwrap().next(), Some(c));
        assert_eq!(pool.get(c).unwrap().prev(), Some(a));
        assert_eq!(pool.get(b).unwrap().membership(), Membership::Free);
        assert!(pool.is_consistent());

        // Releasing twice is refused
        assert!(!pool.release(b));
        assert!(pool.is_consistent());
    }

    #[test]
    fn pool_reuses_released_slots() {
        let mut pool = ParticlePool::new();
        let a = spawn(&mut pool, 1.0);
        pool.release(a);
        let b = spawn(&mut pool, 1.0);
        assert_eq!(a, b);
        assert_eq!(pool.capacity(), 1);
        assert!(pool.is_consistent());
    }

    #[test]
    fn release_head_and_tail() {
        let mut pool = ParticlePool::new();
        let a = spawn(&mut pool, 1.0);
        let b = spawn(&mut pool, 1.0);
        let c = spawn(&mut pool, 1.0);

        pool.release(a);
        assert_eq!(pool.active_head(), Some(b));
        pool.release(c);
        assert_eq!(pool.active_tail(), Some(b));
        pool.release(b);
        assert_eq!(pool.active_head(), None);
        assert_eq!(pool.active_tail(), None);
        assert_eq!(pool.free_count(), 3);
        assert!(pool.is_consistent());
    }

    #[test]
    fn iter_active_in_spawn_order() {
        let mut pool = ParticlePool::new();
        let ids: Vec<_> = (0..4).map(|_| spawn(&mut pool, 1.0)).collect();
        pool.release(ids[1]);
        let order: Vec<_> = pool.iter_active().map(|(id, _)| id).collect();
        assert_eq!(order, vec![ids[0], ids[2], ids[3]]);
    }

    #[test]
    fn wave_walks_to_tail() {
        let mut pool = ParticlePool::new();
        spawn(&mut pool, 1.0);
        let second = spawn(&mut pool, 1.0);
        spawn(&mut pool, 1.0);

        let mut wave = pool.wave(second);
        let mut visited = 0;
        while let Some(particle) = wave.next_particle() {
            particle.alpha = 0.25;
            visited += 1;
        }
        assert_eq!(visited, 2);

        wave.rewind();
        assert_eq!(wave.next_with_id().map(|(id, _)| id), Some(second));

        let alphas: Vec<_> = pool.iter_active().map(|(_, p)| p.alpha).collect();
        assert_eq!(alphas, vec![1.0, 0.25, 0.25]);
    }

    #[test]
    fn init_resets_state() {
        let mut pool = ParticlePool::new();
        let id = spawn(&mut pool, 2.0);
        {
            let p = pool.get_mut(id).unwrap();
            p.age = 1.5;
            p.alpha = 0.1;
            p.scratch.velocity = Vec2::new(3.0, 4.0);
            p.clear();
            assert!(!p.visible);
            p.init(4.0);
        }
        let p = pool.get(id).unwrap();
        assert_eq!(p.age, 0.0);
        assert_eq!(p.alpha, 1.0);
        assert_eq!(p.scratch.velocity, Vec2::ZERO);
        assert!((p.one_over_life - 0.25).abs() < 1e-6);
        assert!(p.visible);
    }

    #[test]
    fn death_conditions() {
        let mut pool = ParticlePool::new();
        let id = spawn(&mut pool, 1.0);
        let p = pool.get_mut(id).unwrap();
        p.age = 0.999;
        assert!(!p.is_dead());
        p.age = 1.0;
        assert!(p.is_dead());
        p.age = -0.01;
        assert!(p.is_dead());
    }

    #[test]
    fn clear_drops_everything() {
        let mut pool = ParticlePool::new();
        let a = spawn(&mut pool, 1.0);
        spawn(&mut pool, 1.0);
        pool.release(a);
        pool.clear();
        assert_eq!(pool.capacity(), 0);
        assert_eq!(pool.active_count(), 0);
        assert_eq!(pool.free_count(), 0);
        assert!(pool.is_consistent());
    }
}
