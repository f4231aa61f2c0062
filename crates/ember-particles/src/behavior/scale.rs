use super::{decode, roll_multiplier, Behavior, BuildContext};
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
struct ScaleConfig {
    scale: PropertySpec<f32>,
    #[serde(default = "default_mult")]
    min_mult: f32,
}

/// Uniform scale over the particle's life, times a per-particle multiplier
/// rolled in `[min_mult, 1)`
pub struct ScaleBehavior {
    list: PropertyList<f32>,
    min_mult: f32,
}

impl ScaleBehavior {
    pub const KIND: &'static str = "scale";

    pub fn new(list: PropertyList<f32>, min_mult: f32) -> Self {
        Self { list, min_mult }
    }

    pub fn from_config(config: &toml::Value, _ctx: &BuildContext<'_>) -> Result<Box<dyn Behavior>> {
        let config: ScaleConfig = decode(Self::KIND, config)?;
        Ok(Box::new(Self::new(config.scale.into_list()?, config.min_mult)))
    }
}

impl Behavior for ScaleBehavior {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn init_particles(&mut self, wave: &mut Wave<'_>, rng: &mut ParticleRng) {
        let first = self.list.first_value();
        while let Some(particle) = wave.next_particle() {
            let mult = roll_multiplier(rng, self.min_mult);
            particle.scratch.scale_mult = mult;
            particle.scale = Vec2::splat(first * mult);
        }
    }

    fn update_particle(&self, particle: &mut Particle, _delta: f32) {
        let cursor = &mut particle.scratch.cursors.scale;
        let value = self.list.interpolate_with_cursor(particle.age_percent, cursor);
        particle.scale = Vec2::splat(value * particle.scratch.scale_mult);
    }
}

#[derive(Deserialize)]
struct ScaleStaticConfig {
    min: f32,
    max: f32,
}

/// Random fixed scale in `[min, max)`
pub struct ScaleStaticBehavior {
    min: f32,
    max: f32,
}

impl ScaleStaticBehavior {
    pub const KIND: &'static str = "scaleStatic";

    pub fn from_config(config: &toml::Value, _ctx: &BuildContext<'_>) -> Result<Box<dyn Behavior>> {
        let config: ScaleStaticConfig = decode(Self::KIND, config)?;
        Ok(Box::new(Self {
            min: config.min,
            max: config.max,
        }))
    }
}

impl Behavior for ScaleStaticBehavior {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn init_particles(&mut self, wave: &mut Wave<'_>, rng: &mut ParticleRng) {
        while let Some(particle) = wave.next_particle() {
            particle.scale = Vec2::splat(rng.range(self.min, self.max));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::testing::{spawn_wave, table};
    use crate::particle::ParticlePool;

    #[test]
    fn scale_multiplier_within_bounds() {
        let mut behavior = ScaleBehavior::from_config(
            &table(
                "minMult = 0.5\nscale = { list = [{ value = 2.0, time = 0.0 }, { value = 4.0, time = 1.0 }] }",
            ),
            &BuildContext::default(),
        )
        .unwrap();
        let mut pool = ParticlePool::new();
        let first = spawn_wave(&mut pool, 20, 1.0);
        behavior.init_particles(&mut pool.wave(first), &mut ParticleRng::new(9));

        for (_, p) in pool.iter_active() {
            assert!((0.5..1.0).contains(&p.scratch.scale_mult));
            assert!((p.scale.x - 2.0 * p.scratch.scale_mult).abs() < 1e-6);
            assert_eq!(p.scale.x, p.scale.y);
        }

        let particle = pool.get_mut(first).unwrap();
        let mult = particle.scratch.scale_mult;
        particle.age_percent = 0.5;
        behavior.update_particle(particle, 0.1);
        assert!((particle.scale.x - 3.0 * mult).abs() < 1e-5);
    }

    #[test]
    fn default_multiplier_is_one() {
        let mut behavior =
            ScaleBehavior::from_config(&table("scale = 1.5"), &BuildContext::default()).unwrap();
        let mut pool = ParticlePool::new();
        let first = spawn_wave(&mut pool, 1, 1.0);
        behavior.init_particles(&mut pool.wave(first), &mut ParticleRng::new(9));
        assert_eq!(pool.get(first).unwrap().scale, Vec2::splat(1.5));
    }

    #[test]
    fn static_scale_in_range() {
        let mut behavior = ScaleStaticBehavior::from_config(
            &table("min = 0.25\nmax = 0.75"),
            &BuildContext::default(),
        )
        .unwrap();
        let mut pool = ParticlePool::new();
        let first = spawn_wave(&mut pool, 50, 1.0);
        behavior.init_particles(&mut pool.wave(first), &mut ParticleRng::new(4));
        assert!(pool
            .iter_active()
            .all(|(_, p)| (0.25..0.75).contains(&p.scale.x)));
    }
}
