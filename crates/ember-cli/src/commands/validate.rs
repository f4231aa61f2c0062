//! Emitter config validation command

use super::{headless_emitter, load_config};
use anyhow::{Context, Result};

pub fn run(config_path: &str) -> Result<()> {
    let config = load_config(config_path)?;
    let (mut emitter, atlas) = headless_emitter();
    emitter
        .configure(&config)
        .with_context(|| format!("Invalid emitter config: {}", config_path))?;

    println!("{}: OK", config_path);
    println!("  lifetime:  {}..{}s", config.lifetime.min, config.lifetime.max);
    println!("  frequency: {}s", emitter.frequency());
    println!("  per wave:  {}", config.wave_size());
    println!("  max:       {}", emitter.max_particles());
    let emitter_lifetime = config.effective_emitter_lifetime();
    if emitter_lifetime >= 0.0 {
        println!("  emitter lifetime: {}s", emitter_lifetime);
    }
    if !config.emit {
        println!("  starts paused");
    }

    println!();
    println!("Behaviors (execution order):");
    let kinds = emitter.behavior_kinds();
    if kinds.is_empty() {
        println!("  (none)");
    }
    for (i, kind) in kinds.iter().enumerate() {
        println!("  {}. {}", i + 1, kind);
    }

    let atlas = atlas.borrow();
    if !atlas.is_empty() {
        println!();
        println!("Textures referenced:");
        for name in atlas.names() {
            println!("  - {}", name);
        }
    }

    Ok(())
}
