//! Headless simulation command

use super::{headless_emitter, load_config};
use anyhow::{Context, Result};
use ember_particles::{
    Emitter, EmitterConfig, Particle, ParticleId, ParticleRenderer, TextureAtlas,
};
use std::cell::RefCell;
use std::rc::Rc;

pub struct SimulateArgs {
    pub config: String,
    pub frames: u32,
    pub dt: f32,
    pub seed: Option<u32>,
    pub json: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RenderCounts {
    pub attached: usize,
    pub detached: usize,
}

/// Stands in for a display tree, counting what the emitter hands it
struct CountingRenderer(Rc<RefCell<RenderCounts>>);

impl ParticleRenderer for CountingRenderer {
    fn attach(&mut self, _id: ParticleId, _particle: &Particle, _at_back: bool) {
        self.0.borrow_mut().attached += 1;
    }

    fn detach(&mut self, _id: ParticleId) {
        self.0.borrow_mut().detached += 1;
    }
}

#[derive(Debug)]
pub struct SimulationReport {
    pub frames: u32,
    pub elapsed: f32,
    pub spawned: usize,
    pub recycled: usize,
    pub peak: usize,
    pub final_count: usize,
    pub emitting: bool,
}

/// Step a configured emitter for `frames` frames of `dt` seconds
pub fn simulate(
    config: &EmitterConfig,
    frames: u32,
    dt: f32,
) -> Result<(Emitter, SimulationReport, Rc<RefCell<TextureAtlas>>)> {
    let (mut emitter, atlas) = headless_emitter();
    let counts = Rc::new(RefCell::new(RenderCounts::default()));
    emitter.set_renderer(Box::new(CountingRenderer(counts.clone())));
    emitter.configure(config).context("Failed to configure emitter")?;

    let mut peak = 0;
    for frame in 0..frames {
        emitter.update(dt);
        peak = peak.max(emitter.particle_count());
        log::trace!("frame {}: {} live", frame, emitter.particle_count());
    }

    let counts = *counts.borrow();
    let report = SimulationReport {
        frames,
        elapsed: frames as f32 * dt,
        spawned: counts.attached,
        recycled: counts.detached,
        peak,
        final_count: emitter.particle_count(),
        emitting: emitter.emit(),
    };
    Ok((emitter, report, atlas))
}

pub fn run(args: SimulateArgs) -> Result<()> {
    if !(args.dt.is_finite() && args.dt >= 0.0) {
        anyhow::bail!("--dt must be a non-negative number, got {}", args.dt);
    }

    let mut config = load_config(&args.config)?;
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let (emitter, report, atlas) = simulate(&config, args.frames, args.dt)?;

    if args.json {
        print_snapshot_json(&emitter, &report, &atlas.borrow());
    } else {
        print_report_text(&report);
    }
    Ok(())
}

fn print_report_text(report: &SimulationReport) {
    println!("Simulated {} frame(s), {:.3}s", report.frames, report.elapsed);
    println!("  spawned:  {}", report.spawned);
    println!("  recycled: {}", report.recycled);
    println!("  peak:     {}", report.peak);
    println!("  live:     {}", report.final_count);
    println!("  emitting: {}", if report.emitting { "yes" } else { "no" });
}

fn print_snapshot_json(emitter: &Emitter, report: &SimulationReport, atlas: &TextureAtlas) {
    let texture_name = |particle: &Particle| {
        particle.texture.and_then(|handle| {
            atlas
                .names()
                .into_iter()
                .find(|name| atlas.get(name) == Some(handle))
                .map(str::to_string)
        })
    };

    let particles: Vec<serde_json::Value> = emitter
        .particles()
        .map(|(id, p)| {
            serde_json::json!({
                "id": id.raw(),
                "x": p.position.x,
                "y": p.position.y,
                "rotation": p.rotation,
                "scale": [p.scale.x, p.scale.y],
                "alpha": p.alpha,
                "tint": format!("#{:06x}", p.tint),
                "texture": texture_name(p),
                "blend_mode": p.blend_mode.as_str(),
                "age": p.age,
                "age_percent": p.age_percent,
            })
        })
        .collect();

    let output = serde_json::json!({
        "frames": report.frames,
        "elapsed": report.elapsed,
        "spawned": report.spawned,
        "recycled": report.recycled,
        "peak": report.peak,
        "live": report.final_count,
        "emitting": report.emitting,
        "particles": particles,
    });

    match serde_json::to_string_pretty(&output) {
        Ok(text) => println!("{}", text),
        Err(e) => log::error!("Failed to serialize snapshot: {}", e),
    }
}
