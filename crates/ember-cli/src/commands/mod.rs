//! CLI command implementations

pub mod path;
pub mod simulate;
pub mod validate;

use anyhow::{Context, Result};
use ember_particles::{Emitter, EmitterConfig, TextureAtlas};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

pub fn load_config(path: &str) -> Result<EmitterConfig> {
    EmitterConfig::load(Path::new(path))
        .with_context(|| format!("Failed to load emitter config: {}", path))
}

/// An emitter whose texture lookups always succeed. Headless runs have no
/// real textures, so every name gets a fresh handle in the shared atlas.
pub fn headless_emitter() -> (Emitter, Rc<RefCell<TextureAtlas>>) {
    let atlas = Rc::new(RefCell::new(TextureAtlas::new()));
    let mut emitter = Emitter::new();
    let names = atlas.clone();
    emitter.set_texture_resolver(Box::new(move |name: &str| {
        Some(names.borrow_mut().register(name))
    }));
    (emitter, atlas)
}
