//! Renderer and texture collaborator interfaces

use crate::particle::{Particle, ParticleId};
use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Opaque handle to a drawable texture owned by the host
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TextureHandle(pub u32);

/// How a particle's sprite is composited
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlendMode {
    #[default]
    Normal,
    Add,
    Multiply,
    Screen,
}

impl BlendMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlendMode::Normal => "normal",
            BlendMode::Add => "add",
            BlendMode::Multiply => "multiply",
            BlendMode::Screen => "screen",
        }
    }
}

/// Host display tree. The emitter attaches a node when a particle spawns
/// and detaches it when the particle is recycled.
pub trait ParticleRenderer {
    /// Add a visual for `particle`, behind existing particles when `at_back`
    fn attach(&mut self, id: ParticleId, particle: &Particle, at_back: bool);

    fn detach(&mut self, id: ParticleId);
}

/// Maps texture names from configuration to host texture handles
pub trait TextureResolver {
    fn resolve(&self, name: &str) -> Option<TextureHandle>;
}

impl<F> TextureResolver for F
where
    F: Fn(&str) -> Option<TextureHandle>,
{
    fn resolve(&self, name: &str) -> Option<TextureHandle> {
        self(name)
    }
}

/// Name to handle table, the simplest [`TextureResolver`]
#[derive(Debug, Clone, Default)]
pub struct TextureAtlas {
    entries: HashMap<String, TextureHandle>,
    next_id: u32,
}

impl TextureAtlas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a name, returning its existing handle or assigning the next free one
    pub fn register(&mut self, name: impl Into<String>) -> TextureHandle {
        let name = name.into();
        if let Some(handle) = self.entries.get(&name) {
            return *handle;
        }
        let handle = TextureHandle(self.next_id);
        self.next_id += 1;
        self.entries.insert(name, handle);
        handle
    }

    /// Register a name with a host-chosen handle
    pub fn insert(&mut self, name: impl Into<String>, handle: TextureHandle) {
        self.next_id = self.next_id.max(handle.0.saturating_add(1));
        self.entries.insert(name.into(), handle);
    }

    pub fn get(&self, name: &str) -> Option<TextureHandle> {
        self.entries.get(name).copied()
    }

    /// Sorted texture names
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(|s| s.as_str()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TextureResolver for TextureAtlas {
    fn resolve(&self, name: &str) -> Option<TextureHandle> {
        self.get(name)
    }
}

/// GPU instance data for one particle sprite.
/// 48 bytes, 16-byte rows.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct ParticleInstance {
    pub pos_scale: [f32; 4], // xy = position, zw = scale
    pub color: [f32; 4],     // rgba, tint with alpha
    pub params: [f32; 4],    // x = rotation, y = texture, z = blend mode, w = age percent
}

impl ParticleInstance {
    pub fn from_particle(p: &Particle) -> Self {
        let tint = p.tint;
        let channel = |shift: u32| ((tint >> shift) & 0xFF) as f32 / 255.0;
        Self {
            pos_scale: [p.position.x, p.position.y, p.scale.x, p.scale.y],
            color: [channel(16), channel(8), channel(0), p.alpha],
            params: [
                p.rotation,
                p.texture.map(|t| t.0 as f32).unwrap_or(-1.0),
                p.blend_mode as u32 as f32,
                p.age_percent,
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atlas_register_is_stable() {
        let mut atlas = TextureAtlas::new();
        let spark = atlas.register("spark");
        let smoke = atlas.register("smoke");
        assert_ne!(spark, smoke);
        assert_eq!(atlas.register("spark"), spark);
        assert_eq!(atlas.resolve("smoke"), Some(smoke));
        assert_eq!(atlas.resolve("fire"), None);
        assert_eq!(atlas.names(), vec!["smoke", "spark"]);
    }

    #[test]
    fn atlas_insert_bumps_next_id() {
        let mut atlas = TextureAtlas::new();
        atlas.insert("a", TextureHandle(10));
        assert_eq!(atlas.register("b"), TextureHandle(11));
        assert_eq!(atlas.len(), 2);
    }

    #[test]
    fn closure_resolver() {
        let resolver = |name: &str| (name == "dot").then_some(TextureHandle(3));
        assert_eq!(resolver.resolve("dot"), Some(TextureHandle(3)));
        assert_eq!(resolver.resolve("ring"), None);
    }

    #[test]
    fn blend_mode_parses_lowercase() {
        let mode: BlendMode = serde_json::from_str("\"screen\"").unwrap();
        assert_eq!(mode, BlendMode::Screen);
        assert_eq!(mode.as_str(), "screen");
        assert!(serde_json::from_str::<BlendMode>("\"overlay\"").is_err());
    }

    #[test]
    fn instance_layout() {
        assert_eq!(std::mem::size_of::<ParticleInstance>(), 48);
        assert_eq!(std::mem::align_of::<ParticleInstance>(), 4);
    }
}
