//! Velocity-driven movement
//!
//! All three behaviors launch particles along their spawn rotation and
//! store the velocity in `scratch.velocity`. They run late so that rotation
//! from spawn shapes, the emitter and rotation behaviors is already set.

use super::{decode, roll_multiplier, Behavior, BehaviorOrder, BuildContext};
use crate::particle::{Particle, Wave};
use crate::property::{PropertyList, PropertySpec};
use crate::rand::ParticleRng;
use ember_core::{Result, Vec2};
use serde::Deserialize;

fn default_mult() -> f32 {
    1.0
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpeedConfig {
    speed: PropertySpec<f32>,
    #[serde(default = "default_mult")]
    min_mult: f32,
}

/// Speed over the particle's life; direction is kept, magnitude follows the list
pub struct SpeedBehavior {
    list: PropertyList<f32>,
    min_mult: f32,
}

impl SpeedBehavior {
    pub const KIND: &'static str = "moveSpeed";

    pub fn new(list: PropertyList<f32>, min_mult: f32) -> Self {
        Self { list, min_mult }
    }

    pub fn from_config(config: &toml::Value, _ctx: &BuildContext<'_>) -> Result<Box<dyn Behavior>> {
        let config: SpeedConfig = decode(Self::KIND, config)?;
        Ok(Box::new(Self::new(config.speed.into_list()?, config.min_mult)))
    }
}

impl Behavior for SpeedBehavior {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn order(&self) -> BehaviorOrder {
        BehaviorOrder::Late
    }

    fn init_particles(&mut self, wave: &mut Wave<'_>, rng: &mut ParticleRng) {
        let first = self.list.first_value();
        while let Some(particle) = wave.next_particle() {
            let mult = roll_multiplier(rng, self.min_mult);
            particle.scratch.speed_mult = mult;
            particle.scratch.velocity = Vec2::new(first * mult, 0.0).rotated(particle.rotation);
        }
    }

    fn update_particle(&self, particle: &mut Particle, delta: f32) {
        let cursor = &mut particle.scratch.cursors.speed;
        let speed = self.list.interpolate_with_cursor(particle.age_percent, cursor)
            * particle.scratch.speed_mult;
        let velocity = particle.scratch.velocity.normalized() * speed;
        particle.scratch.velocity = velocity;
        particle.position += velocity * delta;
    }
}

#[derive(Deserialize)]
struct SpeedStaticConfig {
    min: f32,
    max: f32,
}

/// Constant speed rolled in `[min, max)` at spawn
pub struct SpeedStaticBehavior {
    min: f32,
    max: f32,
}

impl SpeedStaticBehavior {
    pub const KIND: &'static str = "moveSpeedStatic";

    pub fn from_config(config: &toml::Value, _ctx: &BuildContext<'_>) -> Result<Box<dyn Behavior>> {
        let config: SpeedStaticConfig = decode(Self::KIND, config)?;
        Ok(Box::new(Self {
            min: config.min,
            max: config.max,
        }))
    }
}

impl Behavior for SpeedStaticBehavior {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn order(&self) -> BehaviorOrder {
        BehaviorOrder::Late
    }

    fn init_particles(&mut self, wave: &mut Wave<'_>, rng: &mut ParticleRng) {
        while let Some(particle) = wave.next_particle() {
            let speed = rng.range(self.min, self.max);
            particle.scratch.velocity = Vec2::new(speed, 0.0).rotated(particle.rotation);
        }
    }

    fn update_particle(&self, particle: &mut Particle, delta: f32) {
        particle.position += particle.scratch.velocity * delta;
    }
}

fn default_true() -> bool {
    true
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccelerationConfig {
    accel: Vec2,
    min_start: f32,
    max_start: f32,
    #[serde(default = "default_true")]
    rotate: bool,
    #[serde(default)]
    max_speed: f32,
}

/// Constant acceleration from a random starting speed
pub struct AccelerationBehavior {
    accel: Vec2,
    min_start: f32,
    max_start: f32,
    /// Face the direction of travel every frame
    rotate: bool,
    /// Speed cap; 0 disables it
    max_speed: f32,
}

impl AccelerationBehavior {
    pub const KIND: &'static str = "moveAcceleration";

    pub fn from_config(config: &toml::Value, _ctx: &BuildContext<'_>) -> Result<Box<dyn Behavior>> {
        let config: AccelerationConfig = decode(Self::KIND, config)?;
        Ok(Box::new(Self {
            accel: config.accel,
            min_start: config.min_start,
            max_start: config.max_start,
            rotate: config.rotate,
            max_speed: config.max_speed,
        }))
    }
}

impl Behavior for AccelerationBehavior {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn order(&self) -> BehaviorOrder {
        BehaviorOrder::Late
    }

    fn init_particles(&mut self, wave: &mut Wave<'_>, rng: &mut ParticleRng) {
        while let Some(particle) = wave.next_particle() {
            let speed = rng.range(self.min_start, self.max_start);
            particle.scratch.velocity = Vec2::new(speed, 0.0).rotated(particle.rotation);
        }
    }

    fn update_particle(&self, particle: &mut Particle, delta: f32) {
        let old = particle.scratch.velocity;
        let mut velocity = old + self.accel * delta;
        if self.max_speed > 0.0 && velocity.length() > self.max_speed {
            velocity = velocity.normalized() * self.max_speed;
        }
        particle.scratch.velocity = velocity;
        // Midpoint of old and new velocity
        particle.position += (old + velocity) * (0.5 * delta);
        if self.rotate {
            particle.rotation = velocity.angle();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::testing::{spawn_wave, table};
    use crate::particle::ParticlePool;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn static_speed_moves_along_rotation() {
        let mut behavior = SpeedStaticBehavior::from_config(
            &table("min = 10\nmax = 10"),
            &BuildContext::default(),
        )
        .unwrap();
        let mut pool = ParticlePool::new();
        let first = spawn_wave(&mut pool, 1, 5.0);
        pool.get_mut(first).unwrap().rotation = FRAC_PI_2;
        behavior.init_particles(&mut pool.wave(first), &mut ParticleRng::new(1));

        let particle = pool.get_mut(first).unwrap();
        behavior.update_particle(particle, 0.5);
        assert!(particle.position.x.abs() < 1e-4);
        assert!((particle.position.y - 5.0).abs() < 1e-4);
    }

    #[test]
    fn speed_list_rescales_velocity() {
        let mut behavior = SpeedBehavior::from_config(
            &table("speed = { list = [{ value = 100, time = 0 }, { value = 0, time = 1 }] }"),
            &BuildContext::default(),
        )
        .unwrap();
        let mut pool = ParticlePool::new();
        let first = spawn_wave(&mut pool, 1, 1.0);
        behavior.init_particles(&mut pool.wave(first), &mut ParticleRng::new(1));

        let particle = pool.get_mut(first).unwrap();
        assert_eq!(particle.scratch.velocity, Vec2::new(100.0, 0.0));
        particle.age_percent = 0.5;
        behavior.update_particle(particle, 0.1);
        assert!((particle.scratch.velocity.x - 50.0).abs() < 1e-4);
        assert!((particle.position.x - 5.0).abs() < 1e-4);
    }

    #[test]
    fn acceleration_uses_midpoint() {
        let mut behavior = AccelerationBehavior::from_config(
            &table("accel = { x = 10, y = 0 }\nminStart = 0\nmaxStart = 0\nrotate = false"),
            &BuildContext::default(),
        )
        .unwrap();
        let mut pool = ParticlePool::new();
        let first = spawn_wave(&mut pool, 1, 5.0);
        behavior.init_particles(&mut pool.wave(first), &mut ParticleRng::new(1));

        let particle = pool.get_mut(first).unwrap();
        behavior.update_particle(particle, 1.0);
        // x = a t^2 / 2
        assert!((particle.position.x - 5.0).abs() < 1e-4);
        assert!((particle.scratch.velocity.x - 10.0).abs() < 1e-4);
        assert_eq!(particle.rotation, 0.0);
    }

    #[test]
    fn acceleration_clamps_and_faces_velocity() {
        let mut behavior = AccelerationBehavior::from_config(
            &table("accel = { x = 0, y = 100 }\nminStart = 0\nmaxStart = 0\nmaxSpeed = 20"),
            &BuildContext::default(),
        )
        .unwrap();
        let mut pool = ParticlePool::new();
        let first = spawn_wave(&mut pool, 1, 5.0);
        behavior.init_particles(&mut pool.wave(first), &mut ParticleRng::new(1));

        let particle = pool.get_mut(first).unwrap();
        behavior.update_particle(particle, 1.0);
        assert!((particle.scratch.velocity.length() - 20.0).abs() < 1e-4);
        assert!((particle.rotation - FRAC_PI_2).abs() < 1e-5);
    }

    #[test]
    fn movement_runs_late() {
        let behavior = SpeedStaticBehavior::from_config(
            &table("min = 1\nmax = 2"),
            &BuildContext::default(),
        )
        .unwrap();
        assert_eq!(behavior.order(), BehaviorOrder::Late);
    }
}
