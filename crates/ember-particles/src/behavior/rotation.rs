use super::{decode, Behavior, BehaviorOrder, BuildContext};
use crate::particle::{Particle, Wave};
use crate::rand::ParticleRng;
use ember_core::Result;
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RotationConfig {
    min_start: f32,
    max_start: f32,
    min_speed: f32,
    max_speed: f32,
    #[serde(default)]
    accel: f32,
}

/// Spinning particles. Configured in degrees, stored in radians.
pub struct RotationBehavior {
    min_start: f32,
    max_start: f32,
    min_speed: f32,
    max_speed: f32,
    accel: f32,
}

impl RotationBehavior {
    pub const KIND: &'static str = "rotation";

    pub fn from_config(config: &toml::Value, _ctx: &BuildContext<'_>) -> Result<Box<dyn Behavior>> {
        let config: RotationConfig = decode(Self::KIND, config)?;
        Ok(Box::new(Self {
            min_start: config.min_start.to_radians(),
            max_start: config.max_start.to_radians(),
            min_speed: config.min_speed.to_radians(),
            max_speed: config.max_speed.to_radians(),
            accel: config.accel.to_radians(),
        }))
    }
}

impl Behavior for RotationBehavior {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn init_particles(&mut self, wave: &mut Wave<'_>, rng: &mut ParticleRng) {
        while let Some(particle) = wave.next_particle() {
            particle.rotation += rng.range(self.min_start, self.max_start);
            particle.scratch.rotation_speed = rng.range(self.min_speed, self.max_speed);
        }
    }

    fn update_particle(&self, particle: &mut Particle, delta: f32) {
        if self.accel != 0.0 {
            let old = particle.scratch.rotation_speed;
            let speed = old + self.accel * delta;
            particle.scratch.rotation_speed = speed;
            particle.rotation += (old + speed) * 0.5 * delta;
        } else {
            particle.rotation += particle.scratch.rotation_speed * delta;
        }
    }
}

#[derive(Deserialize)]
struct RotationStaticConfig {
    min: f32,
    max: f32,
}

/// Random fixed rotation offset, in degrees
pub struct RotationStaticBehavior {
    min: f32,
    max: f32,
}

impl RotationStaticBehavior {
    pub const KIND: &'static str = "rotationStatic";

    pub fn from_config(config: &toml::Value, _ctx: &BuildContext<'_>) -> Result<Box<dyn Behavior>> {
        let config: RotationStaticConfig = decode(Self::KIND, config)?;
        Ok(Box::new(Self {
            min: config.min.to_radians(),
            max: config.max.to_radians(),
        }))
    }
}

impl Behavior for RotationStaticBehavior {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn init_particles(&mut self, wave: &mut Wave<'_>, rng: &mut ParticleRng) {
        while let Some(particle) = wave.next_particle() {
            particle.rotation += rng.range(self.min, self.max);
        }
    }
}

#[derive(Deserialize)]
struct NoRotationConfig {
    #[serde(default)]
    rotation: f32,
}

/// Pins the sprite rotation after movement has used it for direction
pub struct NoRotationBehavior {
    rotation: f32,
}

impl NoRotationBehavior {
    pub const KIND: &'static str = "noRotation";

    pub fn from_config(config: &toml::Value, _ctx: &BuildContext<'_>) -> Result<Box<dyn Behavior>> {
        let config: NoRotationConfig = decode(Self::KIND, config)?;
        Ok(Box::new(Self {
            rotation: config.rotation.to_radians(),
        }))
    }
}

impl Behavior for NoRotationBehavior {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn order(&self) -> BehaviorOrder {
        BehaviorOrder::Final
    }

    fn init_particles(&mut self, wave: &mut Wave<'_>, _rng: &mut ParticleRng) {
        while let Some(particle) = wave.next_particle() {
            particle.rotation = self.rotation;
        }
    }
}
