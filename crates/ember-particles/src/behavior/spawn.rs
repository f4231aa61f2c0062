//! Spawn-order behaviors: shape-local placement before the emitter transform

use super::{decode, Behavior, BehaviorOrder, BuildContext};
use crate::particle::Wave;
use crate::rand::ParticleRng;
use crate::shapes::{BurstShape, ShapeConfig, SpawnShape};
use ember_core::Result;

/// Spawns at the emitter origin
pub struct SpawnPointBehavior;

impl SpawnPointBehavior {
    pub const KIND: &'static str = "spawnPoint";

    pub fn from_config(_: &toml::Value, _ctx: &BuildContext<'_>) -> Result<Box<dyn Behavior>> {
        Ok(Box::new(Self))
    }
}

impl Behavior for SpawnPointBehavior {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn order(&self) -> BehaviorOrder {
        BehaviorOrder::Spawn
    }

    fn init_particles(&mut self, _wave: &mut Wave<'_>, _rng: &mut ParticleRng) {}
}

pub struct SpawnShapeBehavior {
    shape: Box<dyn SpawnShape>,
}

impl SpawnShapeBehavior {
    pub const KIND: &'static str = "spawnShape";

    pub fn new(shape: Box<dyn SpawnShape>) -> Self {
        Self { shape }
    }

    pub fn from_config(config: &toml::Value, _ctx: &BuildContext<'_>) -> Result<Box<dyn Behavior>> {
        let config: ShapeConfig = decode(Self::KIND, config)?;
        Ok(Box::new(Self::new(config.build())))
    }
}

impl Behavior for SpawnShapeBehavior {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn order(&self) -> BehaviorOrder {
        BehaviorOrder::Spawn
    }

    fn init_particles(&mut self, wave: &mut Wave<'_>, rng: &mut ParticleRng) {
        while let Some(particle) = wave.next_particle() {
            self.shape.random_position(particle, rng);
        }
    }
}

pub struct SpawnBurstBehavior {
    shape: BurstShape,
}

impl SpawnBurstBehavior {
    pub const KIND: &'static str = "spawnBurst";

    pub fn new(shape: BurstShape) -> Self {
        Self { shape }
    }

    pub fn from_config(config: &toml::Value, _ctx: &BuildContext<'_>) -> Result<Box<dyn Behavior>> {
        let shape: BurstShape = decode(Self::KIND, config)?;
        Ok(Box::new(Self::new(shape)))
    }
}

impl Behavior for SpawnBurstBehavior {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn order(&self) -> BehaviorOrder {
        BehaviorOrder::Spawn
    }

    fn init_particles(&mut self, wave: &mut Wave<'_>, rng: &mut ParticleRng) {
        let mut index = 0;
        while let Some(particle) = wave.next_particle() {
            self.shape.place(particle, index, rng);
            index += 1;
        }
    }
}
