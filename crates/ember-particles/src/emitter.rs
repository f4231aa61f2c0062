//! The emitter: spawn scheduling and particle lifecycle

use crate::behavior::{Behavior, BehaviorOrder, BehaviorRegistry, BuildContext};
use crate::config::{coerce_frequency, EmitterConfig};
use crate::ease::Ease;
use crate::particle::{ActiveIter, Particle, ParticleId, ParticlePool};
use crate::rand::{ParticleRng, DEFAULT_SEED};
use crate::render::{ParticleInstance, ParticleRenderer, TextureResolver};
use ember_core::{Result, Vec2};

/// Upper bound on waves spawned by a single `update` call
const MAX_WAVES_PER_UPDATE: u64 = 10_000;

/// Called once when emission has ended and the last particle is gone
pub type CompletionCallback = Box<dyn FnOnce()>;

/// Spawns, ages and recycles a bounded population of particles.
///
/// Drive it with [`update`](Self::update) once per frame. The emitter owns
/// every particle it creates; the renderer only sees attach/detach calls.
pub struct Emitter {
    registry: BehaviorRegistry,
    textures: Option<Box<dyn TextureResolver>>,
    renderer: Option<Box<dyn ParticleRenderer>>,
    pool: ParticlePool,
    behaviors: Vec<Box<dyn Behavior>>,
    /// Behaviors before this index have `BehaviorOrder::Spawn`
    spawn_behaviors: usize,
    rng: ParticleRng,
    configured: bool,
    destroyed: bool,

    min_lifetime: f32,
    max_lifetime: f32,
    frequency: f32,
    particles_per_wave: usize,
    spawn_chance: f32,
    max_particles: usize,
    emitter_lifetime: f32,
    add_at_back: bool,
    emit: bool,
    custom_ease: Option<Ease>,

    spawn_timer: f32,
    emitter_life: f32,
    /// Degrees
    rotation: f32,
    spawn_pos: Vec2,
    owner_pos: Vec2,
    prev_emitter_pos: Vec2,
    prev_pos_valid: bool,
    pos_changed: bool,
    completion: Option<CompletionCallback>,
    destroy_when_complete: bool,
}

impl Emitter {
    /// An unconfigured emitter with the built-in behaviors
    pub fn new() -> Self {
        Self::with_registry(BehaviorRegistry::with_builtins())
    }

    pub fn with_registry(registry: BehaviorRegistry) -> Self {
        Self {
            registry,
            textures: None,
            renderer: None,
            pool: ParticlePool::new(),
            behaviors: Vec::new(),
            spawn_behaviors: 0,
            rng: ParticleRng::new(DEFAULT_SEED),
            configured: false,
            destroyed: false,
            min_lifetime: 0.0,
            max_lifetime: 0.0,
            frequency: 1.0,
            particles_per_wave: 1,
            spawn_chance: 1.0,
            max_particles: crate::config::DEFAULT_MAX_PARTICLES,
            emitter_lifetime: -1.0,
            add_at_back: false,
            emit: false,
            custom_ease: None,
            spawn_timer: 0.0,
            emitter_life: -1.0,
            rotation: 0.0,
            spawn_pos: Vec2::ZERO,
            owner_pos: Vec2::ZERO,
            prev_emitter_pos: Vec2::ZERO,
            prev_pos_valid: false,
            pos_changed: false,
            completion: None,
            destroy_when_complete: false,
        }
    }

    /// Build a configured emitter in one step
    pub fn from_config(config: &EmitterConfig) -> Result<Self> {
        let mut emitter = Self::new();
        emitter.configure(config)?;
        Ok(emitter)
    }

    pub fn registry(&self) -> &BehaviorRegistry {
        &self.registry
    }

    /// Register custom behaviors before calling [`configure`](Self::configure)
    pub fn registry_mut(&mut self) -> &mut BehaviorRegistry {
        &mut self.registry
    }

    /// Texture lookup used by texture behaviors at configure time
    pub fn set_texture_resolver(&mut self, resolver: Box<dyn TextureResolver>) {
        self.textures = Some(resolver);
    }

    /// Swap the display target. Live particles are recycled first, since
    /// they are attached to the old renderer.
    pub fn set_renderer(&mut self, renderer: Box<dyn ParticleRenderer>) {
        self.cleanup();
        self.renderer = Some(renderer);
    }

    pub fn take_renderer(&mut self) -> Option<Box<dyn ParticleRenderer>> {
        self.cleanup();
        self.renderer.take()
    }

    /// Apply a configuration.
    ///
    /// On error the emitter is left unconfigured and `update` does nothing.
    /// Particles alive from an earlier configuration keep running; call
    /// [`cleanup`](Self::cleanup) first for a full reset.
    pub fn configure(&mut self, config: &EmitterConfig) -> Result<()> {
        if self.destroyed {
            log::debug!("configure called on a destroyed emitter");
            return Ok(());
        }
        self.configured = false;
        config.validate()?;

        let ctx = BuildContext::new(self.textures.as_deref());
        let mut behaviors = Vec::with_capacity(config.behaviors.len());
        for entry in &config.behaviors {
            behaviors.push(self.registry.build(&entry.kind, &entry.config, &ctx)?);
        }
        // Stable: configuration order is kept within an order class
        behaviors.sort_by_key(|b| b.order());
        self.spawn_behaviors = behaviors.partition_point(|b| b.order() == BehaviorOrder::Spawn);
        self.behaviors = behaviors;

        self.min_lifetime = config.lifetime.min;
        self.max_lifetime = config.lifetime.max;
        self.frequency = coerce_frequency(config.frequency);
        self.particles_per_wave = config.wave_size();
        self.spawn_chance = config.effective_spawn_chance();
        self.max_particles = config.particle_limit();
        self.emitter_lifetime = config.effective_emitter_lifetime();
        self.add_at_back = config.add_at_back;
        self.custom_ease = config.global_ease();
        self.rng = ParticleRng::new(config.rng_seed());

        self.spawn_pos = config.pos;
        self.rotation = 0.0;
        self.spawn_timer = 0.0;
        self.emit = config.emit;
        self.emitter_life = self.emitter_lifetime;
        self.prev_pos_valid = false;
        self.pos_changed = false;
        self.configured = true;

        log::debug!(
            "configured emitter: {} behaviors, frequency {}s, {} per wave, max {}",
            self.behaviors.len(),
            self.frequency,
            self.particles_per_wave,
            self.max_particles
        );
        Ok(())
    }

    /// Advance the simulation by `delta` seconds
    pub fn update(&mut self, delta: f32) {
        if self.destroyed {
            log::debug!("update called on a destroyed emitter");
            return;
        }
        if !self.configured {
            return;
        }
        if !delta.is_finite() {
            log::warn!("ignoring update with non-finite delta {delta}");
            return;
        }

        self.update_particles(delta);

        // Negative deltas never spawn or rewind the timer
        if self.emit && delta >= 0.0 {
            self.spawn_scheduled(delta);
        }

        self.prev_emitter_pos = self.origin();
        self.prev_pos_valid = true;
        self.pos_changed = false;

        if !self.emit && self.pool.active_count() == 0 {
            if let Some(callback) = self.completion.take() {
                callback();
            }
            if self.destroy_when_complete {
                self.destroy();
            }
        }
    }

    fn update_particles(&mut self, delta: f32) {
        let mut cursor = self.pool.active_head();
        while let Some(id) = cursor {
            let Some(particle) = self.pool.get_mut(id) else {
                break;
            };
            cursor = particle.next();
            particle.age += delta;
            if particle.is_dead() {
                self.recycle(id, true);
                continue;
            }
            particle.age_percent = aged_percent(particle, self.custom_ease.as_ref());
            for behavior in &self.behaviors {
                behavior.update_particle(particle, delta);
            }
        }
    }

    fn spawn_scheduled(&mut self, delta: f32) {
        self.spawn_timer -= delta;
        if self.spawn_timer > 0.0 {
            return;
        }

        // Wave times are derived from the start of the frame rather than
        // accumulated, so the loop is bounded however small the period is
        let frequency = f64::from(self.frequency);
        let start = f64::from(self.spawn_timer);
        let due = ((-start / frequency).floor() as u64).saturating_add(1);
        let skipped = due.saturating_sub(MAX_WAVES_PER_UPDATE);
        if skipped > 0 {
            log::warn!("{due} waves due in one update, dropping the oldest {skipped}");
            if !self.consume_emitter_life(skipped) {
                self.stop_emitting();
                return;
            }
        }

        let origin = self.origin();
        let interpolate = self.prev_pos_valid && self.pos_changed && delta > 0.0;

        for index in skipped..due {
            if !self.consume_emitter_life(1) {
                self.stop_emitting();
                return;
            }

            // Nothing dies mid-frame, so the remaining waves would all be deferred too
            if self.pool.active_count() >= self.max_particles {
                if !self.consume_emitter_life(due - index - 1) {
                    self.stop_emitting();
                    return;
                }
                break;
            }

            let timer = (start + index as f64 * frequency) as f32;
            // Spread waves along the path the origin moved this frame
            let emit_pos = if interpolate {
                self.prev_emitter_pos.lerp(origin, 1.0 + timer / delta)
            } else {
                origin
            };
            self.spawn_wave(emit_pos, Some(-timer));
        }

        // Time from now until the first wave after the ones just handled
        self.spawn_timer = (frequency - (-start).rem_euclid(frequency)) as f32;
    }

    /// Charge `waves` waves against the emitter lifetime. Returns false once
    /// the lifetime runs out before all of them could spawn.
    fn consume_emitter_life(&mut self, waves: u64) -> bool {
        if self.emitter_life < 0.0 || waves == 0 {
            return true;
        }
        let life = f64::from(self.emitter_life);
        let frequency = f64::from(self.frequency);
        let remaining = (life / frequency).ceil();
        if (waves as f64) > remaining {
            self.emitter_life = 0.0;
            return false;
        }
        self.emitter_life = (life - waves as f64 * frequency).max(0.0) as f32;
        true
    }

    fn stop_emitting(&mut self) {
        self.spawn_timer = 0.0;
        self.emitter_life = 0.0;
        self.emit = false;
        log::debug!("emitter lifetime exhausted");
    }

    /// Spawn one wave immediately at the current origin, leaving the spawn timer alone
    pub fn emit_now(&mut self) {
        if self.destroyed {
            log::debug!("emit_now called on a destroyed emitter");
            return;
        }
        if !self.configured {
            return;
        }
        let origin = self.origin();
        self.spawn_wave(origin, None);
    }

    /// `catch_up` is how long ago the wave should have spawned
    fn spawn_wave(&mut self, emit_pos: Vec2, catch_up: Option<f32>) {
        let room = self.max_particles.saturating_sub(self.pool.active_count());
        let slots = self.particles_per_wave.min(room);

        let mut first = None;
        let mut spawned = 0;
        for _ in 0..slots {
            if self.spawn_chance < 1.0 && !self.rng.chance(self.spawn_chance) {
                continue;
            }
            let lifetime = if self.min_lifetime == self.max_lifetime {
                self.min_lifetime
            } else {
                self.rng.range(self.min_lifetime, self.max_lifetime)
            };
            // Would already be dead by the end of this frame
            if catch_up.is_some_and(|elapsed| elapsed >= lifetime) {
                continue;
            }
            let id = self.pool.acquire();
            if let Some(particle) = self.pool.get_mut(id) {
                particle.init(lifetime);
            }
            self.pool.push_active(id);
            first.get_or_insert(id);
            spawned += 1;
        }
        let Some(first) = first else {
            return;
        };
        log::trace!("spawned wave of {spawned} at ({}, {})", emit_pos.x, emit_pos.y);

        let rotation = self.rotation.to_radians();
        {
            let (spawn, rest) = self.behaviors.split_at_mut(self.spawn_behaviors);
            let mut wave = self.pool.wave(first);
            for behavior in spawn.iter_mut() {
                wave.rewind();
                behavior.init_particles(&mut wave, &mut self.rng);
            }

            wave.rewind();
            while let Some(particle) = wave.next_particle() {
                if rotation != 0.0 {
                    particle.position = particle.position.rotated(rotation);
                    particle.rotation += rotation;
                }
                particle.position += emit_pos;
            }

            for behavior in rest.iter_mut() {
                wave.rewind();
                behavior.init_particles(&mut wave, &mut self.rng);
            }
        }

        if let Some(elapsed) = catch_up {
            let mut cursor = Some(first);
            while let Some(id) = cursor {
                let Some(particle) = self.pool.get_mut(id) else {
                    break;
                };
                cursor = particle.next();
                particle.age = elapsed;
                particle.age_percent = aged_percent(particle, self.custom_ease.as_ref());
                for behavior in &self.behaviors {
                    behavior.update_particle(particle, elapsed);
                }
            }
        }

        if let Some(renderer) = self.renderer.as_mut() {
            for (id, particle) in iter_from(&self.pool, first) {
                renderer.attach(id, particle, self.add_at_back);
            }
        }
    }

    fn recycle(&mut self, id: ParticleId, natural: bool) {
        if let Some(particle) = self.pool.get_mut(id) {
            for behavior in &self.behaviors {
                behavior.recycle_particle(particle, natural);
            }
            particle.clear();
        }
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.detach(id);
        }
        self.pool.release(id);
    }

    /// Start emitting; `callback` runs once everything has finished
    pub fn play_once(&mut self, callback: impl FnOnce() + 'static) {
        self.destroy_when_complete = false;
        self.completion = Some(Box::new(callback));
        self.set_emit(true);
    }

    /// Like [`play_once`](Self::play_once), then destroy the emitter
    pub fn play_once_and_destroy(&mut self, callback: impl FnOnce() + 'static) {
        self.destroy_when_complete = true;
        self.completion = Some(Box::new(callback));
        self.set_emit(true);
    }

    /// Recycle every live particle, keeping the pool
    pub fn cleanup(&mut self) {
        while let Some(id) = self.pool.active_head() {
            self.recycle(id, false);
        }
    }

    /// Recycle everything and release all owned state. Later calls do nothing.
    pub fn destroy(&mut self) {
        if self.destroyed {
            log::debug!("destroy called on a destroyed emitter");
            return;
        }
        self.cleanup();
        self.pool.clear();
        self.behaviors.clear();
        self.spawn_behaviors = 0;
        self.renderer = None;
        self.textures = None;
        self.completion = None;
        self.custom_ease = None;
        self.emit = false;
        self.configured = false;
        self.destroyed = true;
    }

    /// Rotate the emitter to `degrees`, turning the spawn position with it
    pub fn rotate(&mut self, degrees: f32) {
        if self.rotation == degrees {
            return;
        }
        let diff = degrees - self.rotation;
        self.rotation = degrees;
        self.spawn_pos = self.spawn_pos.rotated(diff.to_radians());
        self.pos_changed = true;
    }

    pub fn update_spawn_position(&mut self, x: f32, y: f32) {
        self.pos_changed = true;
        self.spawn_pos = Vec2::new(x, y);
    }

    pub fn update_owner_position(&mut self, x: f32, y: f32) {
        self.pos_changed = true;
        self.owner_pos = Vec2::new(x, y);
    }

    /// Forget the previous position so the next move is a jump, not a sweep
    pub fn reset_position_tracking(&mut self) {
        self.prev_pos_valid = false;
    }

    pub fn emit(&self) -> bool {
        self.emit
    }

    /// Setting emission also restarts the emitter lifetime
    pub fn set_emit(&mut self, emit: bool) {
        self.emit = emit;
        self.emitter_life = self.emitter_lifetime;
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn set_frequency(&mut self, frequency: f32) {
        self.frequency = coerce_frequency(frequency);
    }

    pub fn set_custom_ease(&mut self, ease: Option<Ease>) {
        self.custom_ease = ease;
    }

    pub fn particle_count(&self) -> usize {
        self.pool.active_count()
    }

    pub fn max_particles(&self) -> usize {
        self.max_particles
    }

    pub fn spawn_position(&self) -> Vec2 {
        self.spawn_pos
    }

    pub fn owner_position(&self) -> Vec2 {
        self.owner_pos
    }

    /// Emitter rotation in degrees
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Seconds until the next scheduled wave
    pub fn spawn_timer(&self) -> f32 {
        self.spawn_timer
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Behavior keys in execution order
    pub fn behavior_kinds(&self) -> Vec<&'static str> {
        self.behaviors.iter().map(|b| b.kind()).collect()
    }

    /// Live particles, oldest first
    pub fn particles(&self) -> ActiveIter<'_> {
        self.pool.iter_active()
    }

    pub fn particle(&self, id: ParticleId) -> Option<&Particle> {
        self.pool.get(id)
    }

    pub fn pool(&self) -> &ParticlePool {
        &self.pool
    }

    /// Append GPU instance data for every visible particle
    pub fn pack_instances(&self, out: &mut Vec<ParticleInstance>) {
        out.extend(
            self.pool
                .iter_active()
                .filter(|(_, p)| p.visible)
                .map(|(_, p)| ParticleInstance::from_particle(p)),
        );
    }

    fn origin(&self) -> Vec2 {
        self.owner_pos + self.spawn_pos
    }
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}

fn aged_percent(particle: &Particle, ease: Option<&Ease>) -> f32 {
    let t = particle.age * particle.one_over_life;
    match ease {
        Some(ease) => ease.apply(t),
        None => t,
    }
}

/// Active particles from `first` to the tail
fn iter_from(
    pool: &ParticlePool,
    first: ParticleId,
) -> impl Iterator<Item = (ParticleId, &Particle)> {
    let mut cursor = Some(first);
    std::iter::from_fn(move || {
        let id = cursor?;
        let particle = pool.get(id)?;
        cursor = particle.next();
        Some((id, particle))
    })
}
