//! Texture selection: fixed, random, round-robin and frame animations.
//! Names are resolved to handles once, when the behavior is built.

use super::{decode, Behavior, BuildContext};
use crate::particle::{Particle, Wave};
use crate::rand::ParticleRng;
use crate::render::TextureHandle;
use ember_core::{EmberError, Result};
use serde::Deserialize;

fn resolve_all(
    kind: &str,
    names: &[String],
    ctx: &BuildContext<'_>,
) -> Result<Vec<TextureHandle>> {
    if names.is_empty() {
        return Err(EmberError::Configuration(format!(
            "{kind}: textures must not be empty"
        )));
    }
    names.iter().map(|name| ctx.resolve_texture(name)).collect()
}

#[derive(Deserialize)]
struct SingleConfig {
    texture: String,
}

pub struct TextureSingleBehavior {
    texture: TextureHandle,
}

impl TextureSingleBehavior {
    pub const KIND: &'static str = "textureSingle";

    pub fn from_config(config: &toml::Value, ctx: &BuildContext<'_>) -> Result<Box<dyn Behavior>> {
        let config: SingleConfig = decode(Self::KIND, config)?;
        Ok(Box::new(Self {
            texture: ctx.resolve_texture(&config.texture)?,
        }))
    }
}

impl Behavior for TextureSingleBehavior {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn init_particles(&mut self, wave: &mut Wave<'_>, _rng: &mut ParticleRng) {
        while let Some(particle) = wave.next_particle() {
            particle.texture = Some(self.texture);
        }
    }
}

#[derive(Deserialize)]
struct ListConfig {
    textures: Vec<String>,
}

pub struct TextureRandomBehavior {
    textures: Vec<TextureHandle>,
}

impl TextureRandomBehavior {
    pub const KIND: &'static str = "textureRandom";

    pub fn from_config(config: &toml::Value, ctx: &BuildContext<'_>) -> Result<Box<dyn Behavior>> {
        let config: ListConfig = decode(Self::KIND, config)?;
        Ok(Box::new(Self {
            textures: resolve_all(Self::KIND, &config.textures, ctx)?,
        }))
    }
}

impl Behavior for TextureRandomBehavior {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn init_particles(&mut self, wave: &mut Wave<'_>, rng: &mut ParticleRng) {
        while let Some(particle) = wave.next_particle() {
            particle.texture = Some(self.textures[rng.index(self.textures.len())]);
        }
    }
}

/// Hands out textures in order, one per spawned particle, wrapping around
pub struct TextureOrderedBehavior {
    textures: Vec<TextureHandle>,
    next: usize,
}

impl TextureOrderedBehavior {
    pub const KIND: &'static str = "textureOrdered";

    pub fn from_config(config: &toml::Value, ctx: &BuildContext<'_>) -> Result<Box<dyn Behavior>> {
        let config: ListConfig = decode(Self::KIND, config)?;
        Ok(Box::new(Self {
            textures: resolve_all(Self::KIND, &config.textures, ctx)?,
            next: 0,
        }))
    }
}

impl Behavior for TextureOrderedBehavior {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn init_particles(&mut self, wave: &mut Wave<'_>, _rng: &mut ParticleRng) {
        while let Some(particle) = wave.next_particle() {
            particle.texture = Some(self.textures[self.next]);
            self.next = (self.next + 1) % self.textures.len();
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FrameEntry {
    Name(String),
    Repeated { texture: String, count: u32 },
}

fn default_framerate() -> f32 {
    60.0
}

#[derive(Deserialize)]
struct AnimConfig {
    textures: Vec<FrameEntry>,
    /// Frames per second; negative spreads the frames over the particle's life
    #[serde(default = "default_framerate")]
    framerate: f32,
    #[serde(default, rename = "loop")]
    looping: bool,
}

/// A resolved frame sequence
#[derive(Debug, Clone, PartialEq)]
pub struct AnimatedTexture {
    frames: Vec<TextureHandle>,
    framerate: f32,
    duration: f32,
    looping: bool,
}

impl AnimatedTexture {
    /// Build from frames. A negative `framerate` matches the particle's life.
    pub fn new(frames: Vec<TextureHandle>, framerate: f32, looping: bool) -> Result<Self> {
        if frames.is_empty() {
            return Err(EmberError::Configuration(
                "animation needs at least one frame".into(),
            ));
        }
        if framerate == 0.0 || !framerate.is_finite() {
            return Err(EmberError::Configuration(format!(
                "animation framerate must be non-zero, got {framerate}"
            )));
        }
        let duration = if framerate > 0.0 {
            frames.len() as f32 / framerate
        } else {
            0.0
        };
        Ok(Self {
            frames,
            framerate,
            duration,
            looping,
        })
    }

    fn from_config(config: AnimConfig, ctx: &BuildContext<'_>) -> Result<Self> {
        let mut frames = Vec::new();
        for entry in &config.textures {
            match entry {
                FrameEntry::Name(name) => frames.push(ctx.resolve_texture(name)?),
                FrameEntry::Repeated { texture, count } => {
                    let handle = ctx.resolve_texture(texture)?;
                    frames.extend(std::iter::repeat(handle).take(*count as usize));
                }
            }
        }
        Self::new(frames, config.framerate, config.looping)
    }

    pub fn frames(&self) -> &[TextureHandle] {
        &self.frames
    }

    pub fn matches_life(&self) -> bool {
        self.framerate < 0.0
    }

    fn start(&self, particle: &mut Particle) {
        particle.scratch.anim_elapsed = 0.0;
        particle.texture = Some(self.frames[0]);
    }

    fn advance(&self, particle: &mut Particle, delta: f32) {
        let last = self.frames.len() - 1;
        let frame = if self.matches_life() {
            (particle.age_percent * self.frames.len() as f32 + 1e-7) as usize
        } else {
            let mut elapsed = particle.scratch.anim_elapsed + delta;
            if elapsed > self.duration {
                if self.looping {
                    elapsed %= self.duration;
                } else {
                    elapsed = self.duration - 1e-6;
                }
            }
            particle.scratch.anim_elapsed = elapsed;
            (elapsed * self.framerate + 1e-7) as usize
        };
        particle.texture = Some(self.frames[frame.min(last)]);
    }
}

#[derive(Deserialize)]
struct AnimatedSingleConfig {
    anim: AnimConfig,
}

pub struct AnimatedSingleBehavior {
    anim: AnimatedTexture,
}

impl AnimatedSingleBehavior {
    pub const KIND: &'static str = "animatedSingle";

    pub fn new(anim: AnimatedTexture) -> Self {
        Self { anim }
    }

    pub fn from_config(config: &toml::Value, ctx: &BuildContext<'_>) -> Result<Box<dyn Behavior>> {
        let config: AnimatedSingleConfig = decode(Self::KIND, config)?;
        Ok(Box::new(Self::new(AnimatedTexture::from_config(
            config.anim,
            ctx,
        )?)))
    }
}

impl Behavior for AnimatedSingleBehavior {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn init_particles(&mut self, wave: &mut Wave<'_>, _rng: &mut ParticleRng) {
        while let Some(particle) = wave.next_particle() {
            particle.scratch.anim_index = 0;
            self.anim.start(particle);
        }
    }

    fn update_particle(&self, particle: &mut Particle, delta: f32) {
        self.anim.advance(particle, delta);
    }
}

#[derive(Deserialize)]
struct AnimatedRandomConfig {
    anims: Vec<AnimConfig>,
}

/// Each particle plays one animation picked at random
pub struct AnimatedRandomBehavior {
    anims: Vec<AnimatedTexture>,
}

impl AnimatedRandomBehavior {
    pub const KIND: &'static str = "animatedRandom";

    pub fn from_config(config: &toml::Value, ctx: &BuildContext<'_>) -> Result<Box<dyn Behavior>> {
        let config: AnimatedRandomConfig = decode(Self::KIND, config)?;
        if config.anims.is_empty() {
            return Err(EmberError::Configuration(format!(
                "{}: anims must not be empty",
                Self::KIND
            )));
        }
        let anims = config
            .anims
            .into_iter()
            .map(|anim| AnimatedTexture::from_config(anim, ctx))
            .collect::<Result<Vec<_>>>()?;
        Ok(Box::new(Self { anims }))
    }
}

impl Behavior for AnimatedRandomBehavior {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn init_particles(&mut self, wave: &mut Wave<'_>, rng: &mut ParticleRng) {
        while let Some(particle) = wave.next_particle() {
            let index = rng.index(self.anims.len());
            particle.scratch.anim_index = index;
            self.anims[index].start(particle);
        }
    }

    fn update_particle(&self, particle: &mut Particle, delta: f32) {
        if let Some(anim) = self.anims.get(particle.scratch.anim_index) {
            anim.advance(particle, delta);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::testing::{spawn_wave, table};
    use crate::particle::ParticlePool;
    use crate::render::TextureAtlas;

    fn atlas() -> TextureAtlas {
        let mut atlas = TextureAtlas::new();
        for name in ["a", "b", "c"] {
            atlas.register(name);
        }
        atlas
    }

    #[test]
    fn single_texture() {
        let atlas = atlas();
        let ctx = BuildContext::new(Some(&atlas));
        let mut behavior =
            TextureSingleBehavior::from_config(&table("texture = \"b\""), &ctx).unwrap();
        let mut pool = ParticlePool::new();
        let first = spawn_wave(&mut pool, 2, 1.0);
        behavior.init_particles(&mut pool.wave(first), &mut ParticleRng::new(1));
        assert!(pool.iter_active().all(|(_, p)| p.texture == atlas.get("b")));
    }

    #[test]
    fn unknown_texture_fails_build() {
        let atlas = atlas();
        let ctx = BuildContext::new(Some(&atlas));
        let result = TextureSingleBehavior::from_config(&table("texture = \"zzz\""), &ctx);
        assert!(matches!(result, Err(EmberError::UnknownTexture(_))));
        assert!(TextureRandomBehavior::from_config(&table("textures = []"), &ctx).is_err());
    }

    #[test]
    fn ordered_textures_cycle_across_waves() {
        let atlas = atlas();
        let ctx = BuildContext::new(Some(&atlas));
        let mut behavior =
            TextureOrderedBehavior::from_config(&table("textures = [\"a\", \"b\", \"c\"]"), &ctx)
                .unwrap();
        let mut pool = ParticlePool::new();
        let first = spawn_wave(&mut pool, 2, 1.0);
        behavior.init_particles(&mut pool.wave(first), &mut ParticleRng::new(1));
        let second = spawn_wave(&mut pool, 2, 1.0);
        behavior.init_particles(&mut pool.wave(second), &mut ParticleRng::new(1));

        let names: Vec<_> = pool.iter_active().map(|(_, p)| p.texture).collect();
        let expected: Vec<_> = ["a", "b", "c", "a"].iter().map(|n| atlas.get(n)).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn random_texture_from_set() {
        let atlas = atlas();
        let ctx = BuildContext::new(Some(&atlas));
        let mut behavior =
            TextureRandomBehavior::from_config(&table("textures = [\"a\", \"c\"]"), &ctx).unwrap();
        let mut pool = ParticlePool::new();
        let first = spawn_wave(&mut pool, 40, 1.0);
        behavior.init_particles(&mut pool.wave(first), &mut ParticleRng::new(3));
        let allowed = [atlas.get("a"), atlas.get("c")];
        assert!(pool.iter_active().all(|(_, p)| allowed.contains(&p.texture)));
    }

    #[test]
    fn animation_steps_and_loops() {
        let atlas = atlas();
        let ctx = BuildContext::new(Some(&atlas));
        let mut behavior = AnimatedSingleBehavior::from_config(
            &table("anim = { textures = [\"a\", { texture = \"b\", count = 2 }], framerate = 10, loop = true }"),
            &ctx,
        )
        .unwrap();
        let mut pool = ParticlePool::new();
        let first = spawn_wave(&mut pool, 1, 5.0);
        behavior.init_particles(&mut pool.wave(first), &mut ParticleRng::new(1));

        let particle = pool.get_mut(first).unwrap();
        assert_eq!(particle.texture, atlas.get("a"));
        behavior.update_particle(particle, 0.15);
        assert_eq!(particle.texture, atlas.get("b"));
        // 0.35s wraps to 0.05s of the 0.3s loop
        behavior.update_particle(particle, 0.2);
        assert_eq!(particle.texture, atlas.get("a"));
    }

    #[test]
    fn non_looping_animation_holds_last_frame() {
        let atlas = atlas();
        let ctx = BuildContext::new(Some(&atlas));
        let mut behavior = AnimatedSingleBehavior::from_config(
            &table("anim = { textures = [\"a\", \"b\", \"c\"], framerate = 10 }"),
            &ctx,
        )
        .unwrap();
        let mut pool = ParticlePool::new();
        let first = spawn_wave(&mut pool, 1, 5.0);
        behavior.init_particles(&mut pool.wave(first), &mut ParticleRng::new(1));
        let particle = pool.get_mut(first).unwrap();
        behavior.update_particle(particle, 2.0);
        assert_eq!(particle.texture, atlas.get("c"));
    }

    #[test]
    fn animation_matching_life() {
        let atlas = atlas();
        let ctx = BuildContext::new(Some(&atlas));
        let mut behavior = AnimatedSingleBehavior::from_config(
            &table("anim = { textures = [\"a\", \"b\"], framerate = -1 }"),
            &ctx,
        )
        .unwrap();
        let mut pool = ParticlePool::new();
        let first = spawn_wave(&mut pool, 1, 2.0);
        behavior.init_particles(&mut pool.wave(first), &mut ParticleRng::new(1));
        let particle = pool.get_mut(first).unwrap();
        particle.age_percent = 0.4;
        behavior.update_particle(particle, 0.8);
        assert_eq!(particle.texture, atlas.get("a"));
        particle.age_percent = 0.6;
        behavior.update_particle(particle, 0.4);
        assert_eq!(particle.texture, atlas.get("b"));
        particle.age_percent = 1.0;
        behavior.update_particle(particle, 0.8);
        assert_eq!(particle.texture, atlas.get("b"));
    }

    #[test]
    fn random_animation_records_choice() {
        let atlas = atlas();
        let ctx = BuildContext::new(Some(&atlas));
        let mut behavior = AnimatedRandomBehavior::from_config(
            &table(
                r#"anims = [
                    { textures = ["a"], framerate = 5 },
                    { textures = ["b", "c"], framerate = 5 },
                ]"#,
            ),
            &ctx,
        )
        .unwrap();
        let mut pool = ParticlePool::new();
        let first = spawn_wave(&mut pool, 30, 1.0);
        behavior.init_particles(&mut pool.wave(first), &mut ParticleRng::new(12));
        for (_, p) in pool.iter_active() {
            let expected = if p.scratch.anim_index == 0 { "a" } else { "b" };
            assert_eq!(p.texture, atlas.get(expected));
        }
    }

    #[test]
    fn zero_framerate_rejected() {
        assert!(AnimatedTexture::new(vec![TextureHandle(0)], 0.0, false).is_err());
        assert!(AnimatedTexture::new(Vec::new(), 10.0, false).is_err());
    }
}
