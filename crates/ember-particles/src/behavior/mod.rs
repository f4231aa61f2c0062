//! Pluggable particle behaviors
//!
//! A behavior is a set of hooks the emitter runs on particles: once per
//! spawned wave (`init_particles`), once per particle per frame
//! (`update_particle`) and when a particle is recycled
//! (`recycle_particle`). Behaviors hold only shared, immutable settings;
//! anything per-particle lives in [`ParticleScratch`](crate::ParticleScratch).
//!
//! Configurations name behaviors by string key. The [`BehaviorRegistry`]
//! maps those keys to factories, so hosts can add their own behaviors next
//! to the built-in ones.

mod alpha;
mod blend;
mod color;
mod movement;
mod path;
mod rotation;
mod scale;
mod spawn;
mod texture;

pub use alpha::{AlphaBehavior, AlphaStaticBehavior};
pub use blend::BlendModeBehavior;
pub use color::{ColorBehavior, ColorStaticBehavior};
pub use movement::{AccelerationBehavior, SpeedBehavior, SpeedStaticBehavior};
pub use path::{PathBehavior, PathFunction};
pub use rotation::{NoRotationBehavior, RotationBehavior, RotationStaticBehavior};
pub use scale::{ScaleBehavior, ScaleStaticBehavior};
pub use spawn::{SpawnBurstBehavior, SpawnPointBehavior, SpawnShapeBehavior};
pub use texture::{
    AnimatedRandomBehavior, AnimatedSingleBehavior, AnimatedTexture, TextureOrderedBehavior,
    TextureRandomBehavior, TextureSingleBehavior,
};

use crate::particle::{Particle, Wave};
use crate::rand::ParticleRng;
use crate::render::{TextureHandle, TextureResolver};
use ember_core::{EmberError, Result};
use serde::de::DeserializeOwned;
use std::collections::HashMap;

/// Execution class. Behaviors run sorted by order, keeping configuration
/// order within a class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BehaviorOrder {
    /// Shape-local placement, before the emitter transform is applied
    Spawn,
    Normal,
    /// Reads values other behaviors have set (rotation, velocity)
    Late,
    /// Overrides applied after everything else
    Final,
}

pub trait Behavior {
    /// Registry key this behavior was built from
    fn kind(&self) -> &'static str;

    fn order(&self) -> BehaviorOrder {
        BehaviorOrder::Normal
    }

    /// Initialize every particle of a freshly spawned wave
    fn init_particles(&mut self, wave: &mut Wave<'_>, rng: &mut ParticleRng);

    fn update_particle(&self, _particle: &mut Particle, _delta: f32) {}

    /// Called before a particle returns to the pool. `natural` is false
    /// when the emitter is cleaned up rather than the particle dying.
    fn recycle_particle(&self, _particle: &mut Particle, _natural: bool) {}
}

/// Host services available while building behaviors
#[derive(Default, Clone, Copy)]
pub struct BuildContext<'a> {
    pub textures: Option<&'a dyn TextureResolver>,
}

impl<'a> BuildContext<'a> {
    pub fn new(textures: Option<&'a dyn TextureResolver>) -> Self {
        Self { textures }
    }

    pub fn resolve_texture(&self, name: &str) -> Result<TextureHandle> {
        let resolver = self.textures.ok_or_else(|| {
            EmberError::Configuration(format!(
                "texture '{name}' requested but no texture resolver is set"
            ))
        })?;
        resolver
            .resolve(name)
            .ok_or_else(|| EmberError::UnknownTexture(name.to_string()))
    }
}

pub type BehaviorFactory =
    Box<dyn Fn(&toml::Value, &BuildContext<'_>) -> Result<Box<dyn Behavior>>>;

/// Behavior type key to factory
pub struct BehaviorRegistry {
    factories: HashMap<String, BehaviorFactory>,
}

impl BehaviorRegistry {
    /// A registry with no behaviors
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// A registry with every built-in behavior
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register(AlphaBehavior::KIND, AlphaBehavior::from_config);
        registry.register(AlphaStaticBehavior::KIND, AlphaStaticBehavior::from_config);
        registry.register(ScaleBehavior::KIND, ScaleBehavior::from_config);
        registry.register(ScaleStaticBehavior::KIND, ScaleStaticBehavior::from_config);
        registry.register(ColorBehavior::KIND, ColorBehavior::from_config);
        registry.register(ColorStaticBehavior::KIND, ColorStaticBehavior::from_config);
        registry.register(SpeedBehavior::KIND, SpeedBehavior::from_config);
        registry.register(SpeedStaticBehavior::KIND, SpeedStaticBehavior::from_config);
        registry.register(AccelerationBehavior::KIND, AccelerationBehavior::from_config);
        registry.register(PathBehavior::KIND, PathBehavior::from_config);
        registry.register(RotationBehavior::KIND, RotationBehavior::from_config);
        registry.register(RotationStaticBehavior::KIND, RotationStaticBehavior::from_config);
        registry.register(NoRotationBehavior::KIND, NoRotationBehavior::from_config);
        registry.register(TextureSingleBehavior::KIND, TextureSingleBehavior::from_config);
        registry.register(TextureRandomBehavior::KIND, TextureRandomBehavior::from_config);
        registry.register(TextureOrderedBehavior::KIND, TextureOrderedBehavior::from_config);
        registry.register(AnimatedSingleBehavior::KIND, AnimatedSingleBehavior::from_config);
        registry.register(AnimatedRandomBehavior::KIND, AnimatedRandomBehavior::from_config);
        registry.register(BlendModeBehavior::KIND, BlendModeBehavior::from_config);
        registry.register(SpawnPointBehavior::KIND, SpawnPointBehavior::from_config);
        registry.register(SpawnShapeBehavior::KIND, SpawnShapeBehavior::from_config);
        registry.register(SpawnBurstBehavior::KIND, SpawnBurstBehavior::from_config);
        registry
    }

    /// Add or replace the factory for `kind`
    pub fn register<F>(&mut self, kind: impl Into<String>, factory: F)
    where
        F: Fn(&toml::Value, &BuildContext<'_>) -> Result<Box<dyn Behavior>> + 'static,
    {
        let kind = kind.into();
        if self.factories.contains_key(&kind) {
            log::debug!("replacing behavior factory '{kind}'");
        }
        self.factories.insert(kind, Box::new(factory));
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    /// Registered keys, sorted
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.factories.keys().map(|k| k.as_str()).collect();
        kinds.sort();
        kinds
    }

    pub fn build(
        &self,
        kind: &str,
        config: &toml::Value,
        ctx: &BuildContext<'_>,
    ) -> Result<Box<dyn Behavior>> {
        let factory = self
            .factories
            .get(kind)
            .ok_or_else(|| EmberError::UnknownBehavior(kind.to_string()))?;
        factory(config, ctx)
    }
}

impl Default for BehaviorRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Decode a behavior's config payload
pub(crate) fn decode<T: DeserializeOwned>(kind: &str, config: &toml::Value) -> Result<T> {
    config
        .clone()
        .try_into()
        .map_err(|e: toml::de::Error| EmberError::Configuration(format!("{kind}: {e}")))
}

/// Random multiplier in `[min_mult, 1)`
pub(crate) fn roll_multiplier(rng: &mut ParticleRng, min_mult: f32) -> f32 {
    rng.next_f32() * (1.0 - min_mult) + min_mult
}
