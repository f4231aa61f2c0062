//! Ember Particles - Pooled 2D particle emitter
//!
//! Provides a frame-driven particle emitter with:
//! - Timer-based wave spawning with sub-frame catch-up and position interpolation
//! - Arena-backed particle pool with O(1) recycle and no per-spawn allocation
//! - Keyframed property lists (linear, stepped, eased) for alpha, scale, color, speed
//! - Pluggable behaviors looked up by string key from TOML or JSON effect files
//! - Spawn shapes (point, rect, torus, burst, polygonal chain)
//! - Renderer-agnostic attach/detach hooks and GPU instance packing

pub mod behavior;
pub mod config;
pub mod ease;
pub mod emitter;
pub mod particle;
pub mod property;
pub mod rand;
pub mod render;
pub mod shapes;

pub use behavior::{Behavior, BehaviorOrder, BehaviorRegistry, BuildContext};
pub use config::{BehaviorConfig, EmitterConfig, LifetimeRange};
pub use ease::{Ease, EaseSegment};
pub use emitter::{CompletionCallback, Emitter};
pub use particle::{Particle, ParticleId, ParticlePool, ParticleScratch, Wave};
pub use property::{InterpolationMode, PropertyList, PropertyNode, PropertySpec, ValueList};
pub use rand::ParticleRng;
pub use render::{
    BlendMode, ParticleInstance, ParticleRenderer, TextureAtlas, TextureHandle, TextureResolver,
};
pub use shapes::{ShapeConfig, SpawnShape};
