use super::{decode, Behavior, BuildContext};
use crate::particle::Wave;
use crate::rand::ParticleRng;
use crate::render::BlendMode;
use ember_core::Result;
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlendConfig {
    blend_mode: BlendMode,
}

/// Tags particles with a blend mode for the renderer
pub struct BlendModeBehavior {
    mode: BlendMode,
}

impl BlendModeBehavior {
    pub const KIND: &'static str = "blendMode";

    pub fn new(mode: BlendMode) -> Self {
        Self { mode }
    }

    pub fn from_config(config: &toml::Value, _ctx: &BuildContext<'_>) -> Result<Box<dyn Behavior>> {
        let config: BlendConfig = decode(Self::KIND, config)?;
        Ok(Box::new(Self::new(config.blend_mode)))
    }
}

impl Behavior for BlendModeBehavior {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn init_particles(&mut self, wave: &mut Wave<'_>, _rng: &mut ParticleRng) {
        while let Some(particle) = wave.next_particle() {
            particle.blend_mode = self.mode;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::testing::{spawn_wave, table};
    use crate::particle::ParticlePool;

    #[test]
    fn sets_blend_mode() {
        let mut behavior =
            BlendModeBehavior::from_config(&table("blendMode = \"add\""), &BuildContext::default())
                .unwrap();
        let mut pool = ParticlePool::new();
        let first = spawn_wave(&mut pool, 2, 1.0);
        behavior.init_particles(&mut pool.wave(first), &mut ParticleRng::new(1));
        assert!(pool.iter_active().all(|(_, p)| p.blend_mode == BlendMode::Add));
    }

    #[test]
    fn unknown_mode_rejected() {
        let result =
            BlendModeBehavior::from_config(&table("blendMode = \"glow\""), &BuildContext::default());
        assert!(result.is_err());
    }
}
