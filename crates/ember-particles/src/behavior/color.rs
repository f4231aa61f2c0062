use super::{decode, Behavior, BuildContext};
use crate::particle::{Particle, Wave};
use crate::property::{PropertyList, PropertySpec};
use crate::rand::ParticleRng;
use ember_core::{Result, Rgb};
use serde::Deserialize;

#[derive(Deserialize)]
struct ColorConfig {
    color: PropertySpec<Rgb>,
}

/// Tint over the particle's life
pub struct ColorBehavior {
    list: PropertyList<Rgb>,
}

impl ColorBehavior {
    pub const KIND: &'static str = "color";

    pub fn new(list: PropertyList<Rgb>) -> Self {
        Self { list }
    }

    pub fn from_config(config: &toml::Value, _ctx: &BuildContext<'_>) -> Result<Box<dyn Behavior>> {
        let config: ColorConfig = decode(Self::KIND, config)?;
        Ok(Box::new(Self::new(config.color.into_list()?)))
    }
}

impl Behavior for ColorBehavior {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn init_particles(&mut self, wave: &mut Wave<'_>, _rng: &mut ParticleRng) {
        let tint = self.list.first_value().to_packed();
        while let Some(particle) = wave.next_particle() {
            particle.tint = tint;
        }
    }

    fn update_particle(&self, particle: &mut Particle, _delta: f32) {
        let cursor = &mut particle.scratch.cursors.color;
        particle.tint = self
            .list
            .interpolate_with_cursor(particle.age_percent, cursor)
            .to_packed();
    }
}

#[derive(Deserialize)]
struct ColorStaticConfig {
    color: Rgb,
}

pub struct ColorStaticBehavior {
    tint: u32,
}

impl ColorStaticBehavior {
    pub const KIND: &'static str = "colorStatic";

    pub fn from_config(config: &toml::Value, _ctx: &BuildContext<'_>) -> Result<Box<dyn Behavior>> {
        let config: ColorStaticConfig = decode(Self::KIND, config)?;
        Ok(Box::new(Self {
            tint: config.color.to_packed(),
        }))
    }
}

impl Behavior for ColorStaticBehavior {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn init_particles(&mut self, wave: &mut Wave<'_>, _rng: &mut ParticleRng) {
        while let Some(particle) = wave.next_particle() {
            particle.tint = self.tint;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::testing::{spawn_wave, table};
    use crate::particle::ParticlePool;

    #[test]
    fn color_blends_between_keyframes() {
        let mut behavior = ColorBehavior::from_config(
            &table(
                r##"color = { list = [{ value = "#ff0000", time = 0.0 }, { value = "#0000ff", time = 1.0 }] }"##,
            ),
            &BuildContext::default(),
        )
        .unwrap();
        let mut pool = ParticlePool::new();
        let first = spawn_wave(&mut pool, 1, 1.0);
        behavior.init_particles(&mut pool.wave(first), &mut ParticleRng::new(1));

        let particle = pool.get_mut(first).unwrap();
        assert_eq!(particle.tint, 0xFF0000);
        particle.age_percent = 0.5;
        behavior.update_particle(particle, 0.5);
        assert_eq!(particle.tint, 0x7F007F);
    }

    #[test]
    fn static_color() {
        let mut behavior = ColorStaticBehavior::from_config(
            &table(r##"color = "#336699""##),
            &BuildContext::default(),
        )
        .unwrap();
        let mut pool = ParticlePool::new();
        let first = spawn_wave(&mut pool, 2, 1.0);
        behavior.init_particles(&mut pool.wave(first), &mut ParticleRng::new(1));
        assert!(pool.iter_active().all(|(_, p)| p.tint == 0x336699));
    }

    #[test]
    fn invalid_color_rejected() {
        let result =
            ColorStaticBehavior::from_config(&table(r#"color = "teal""#), &BuildContext::default());
        assert!(result.is_err());
    }
}
