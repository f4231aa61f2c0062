use super::{decode, Behavior, BuildContext};
use crate::particle::{Particle, Wave};
use crate::property::{PropertyList, PropertySpec};
use crate::rand::ParticleRng;
use ember_core::Result;
use serde::Deserialize;

#[derive(Deserialize)]
struct AlphaConfig {
    alpha: PropertySpec<f32>,
}

/// Alpha over the particle's life
pub struct AlphaBehavior {
    list: PropertyList<f32>,
}

impl AlphaBehavior {
    pub const KIND: &'static str = "alpha";

    pub fn new(list: PropertyList<f32>) -> Self {
        Self { list }
    }

    pub fn from_config(config: &toml::Value, _ctx: &BuildContext<'_>) -> Result<Box<dyn Behavior>> {
        let config: AlphaConfig = decode(Self::KIND, config)?;
        Ok(Box::new(Self::new(config.alpha.into_list()?)))
    }
}

impl Behavior for AlphaBehavior {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn init_particles(&mut self, wave: &mut Wave<'_>, _rng: &mut ParticleRng) {
        let first = self.list.first_value();
        while let Some(particle) = wave.next_particle() {
            particle.alpha = first;
        }
    }

    fn update_particle(&self, particle: &mut Particle, _delta: f32) {
        let cursor = &mut particle.scratch.cursors.alpha;
        particle.alpha = self.list.interpolate_with_cursor(particle.age_percent, cursor);
    }
}

#[derive(Deserialize)]
struct AlphaStaticConfig {
    alpha: f32,
}

/// Fixed alpha for every particle
pub struct AlphaStaticBehavior {
    value: f32,
}

impl AlphaStaticBehavior {
    pub const KIND: &'static str = "alphaStatic";

    pub fn from_config(config: &toml::Value, _ctx: &BuildContext<'_>) -> Result<Box<dyn Behavior>> {
        let config: AlphaStaticConfig = decode(Self::KIND, config)?;
        Ok(Box::new(Self {
            value: config.alpha,
        }))
    }
}

impl Behavior for AlphaStaticBehavior {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn init_particles(&mut self, wave: &mut Wave<'_>, _rng: &mut ParticleRng) {
        while let Some(particle) = wave.next_particle() {
            particle.alpha = self.value;
        }
    }
}
