//! Emitter configuration loading
//!
//! Configurations are authored in TOML, or exported as JSON by existing
//! particle editors. Both formats share the camelCase key layout:
//!
//! ```toml
//! frequency = 0.05
//! maxParticles = 200
//! pos = { x = 0, y = 0 }
//! lifetime = { min = 0.5, max = 1.2 }
//!
//! [[behaviors]]
//! type = "alpha"
//! config = { alpha = { list = [{ value = 1, time = 0 }, { value = 0, time = 1 }] } }
//!
//! [[behaviors]]
//! type = "moveSpeedStatic"
//! config = { min = 100, max = 200 }
//! ```

use crate::ease::{Ease, EaseSegment};
use crate::rand::DEFAULT_SEED;
use ember_core::{EmberError, Result, Vec2};
use serde::de::{Deserializer, IgnoredAny};
use serde::Deserialize;
use std::path::Path;

const REQUIRED_FIELDS: [&str; 4] = ["lifetime", "frequency", "pos", "behaviors"];

/// Fallback when `maxParticles` is missing or not positive
pub const DEFAULT_MAX_PARTICLES: usize = 1000;

/// Particle lifetime range in seconds
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LifetimeRange {
    pub min: f32,
    pub max: f32,
}

/// One `{type, config}` entry of the behavior list
#[derive(Debug, Clone, Deserialize)]
pub struct BehaviorConfig {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default = "empty_table")]
    pub config: toml::Value,
}

impl BehaviorConfig {
    pub fn new(kind: impl Into<String>, config: toml::Value) -> Self {
        Self {
            kind: kind.into(),
            config,
        }
    }
}

fn empty_table() -> toml::Value {
    toml::Value::Table(toml::map::Map::new())
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmitterConfig {
    pub lifetime: LifetimeRange,
    /// Seconds between waves
    #[serde(deserialize_with = "lenient_frequency")]
    pub frequency: f32,
    /// Spawn position relative to the owner
    pub pos: Vec2,
    pub behaviors: Vec<BehaviorConfig>,
    #[serde(default)]
    pub particles_per_wave: Option<i64>,
    #[serde(default)]
    pub spawn_chance: Option<f32>,
    #[serde(default)]
    pub max_particles: Option<i64>,
    /// Seconds to emit for; absent or non-positive emits forever
    #[serde(default)]
    pub emitter_lifetime: Option<f32>,
    #[serde(default)]
    pub add_at_back: bool,
    #[serde(default = "default_true")]
    pub emit: bool,
    /// Ease applied to every particle's age percent
    #[serde(default)]
    pub ease: Option<Vec<EaseSegment>>,
    #[serde(default)]
    pub seed: Option<u32>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LenientNumber {
    Number(f64),
    Other(IgnoredAny),
}

fn lenient_frequency<'de, D>(deserializer: D) -> std::result::Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match LenientNumber::deserialize(deserializer)? {
        LenientNumber::Number(n) => n as f32,
        LenientNumber::Other(_) => f32::NAN,
    };
    Ok(coerce_frequency(value))
}

/// Shortest spawn period accepted, in seconds
pub const MIN_FREQUENCY: f32 = 1e-4;

/// Frequencies that would stall the spawn loop fall back to one wave per
/// second; positive periods too short to schedule are raised to [`MIN_FREQUENCY`].
pub(crate) fn coerce_frequency(value: f32) -> f32 {
    if !(value.is_finite() && value > 0.0) {
        log::warn!("invalid emitter frequency {value}, using 1.0");
        1.0
    } else if value < MIN_FREQUENCY {
        log::warn!("emitter frequency {value} too short, using {MIN_FREQUENCY}");
        MIN_FREQUENCY
    } else {
        value
    }
}

impl EmitterConfig {
    /// A configuration with no behaviors, spawning at the origin
    pub fn new(min_lifetime: f32, max_lifetime: f32, frequency: f32) -> Self {
        Self {
            lifetime: LifetimeRange {
                min: min_lifetime,
                max: max_lifetime,
            },
            frequency: coerce_frequency(frequency),
            pos: Vec2::ZERO,
            behaviors: Vec::new(),
            particles_per_wave: None,
            spawn_chance: None,
            max_particles: None,
            emitter_lifetime: None,
            add_at_back: false,
            emit: true,
            ease: None,
            seed: None,
        }
    }

    pub fn with_behavior(mut self, kind: impl Into<String>, config: toml::Value) -> Self {
        self.behaviors.push(BehaviorConfig::new(kind, config));
        self
    }

    /// Parse a TOML configuration
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let value: toml::Value = toml::from_str(content)?;
        let table = value
            .as_table()
            .ok_or_else(|| EmberError::Configuration("configuration must be a table".into()))?;
        check_required(|key| table.contains_key(key))?;
        let config: EmitterConfig = value
            .try_into()
            .map_err(|e: toml::de::Error| EmberError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON configuration
    pub fn from_json_str(content: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(content)?;
        let object = value
            .as_object()
            .ok_or_else(|| EmberError::Configuration("configuration must be an object".into()))?;
        check_required(|key| object.contains_key(key))?;
        let config: EmitterConfig = serde_json::from_value(value)
            .map_err(|e| EmberError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from disk; `.json` files are JSON, anything else is TOML
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }

    pub fn validate(&self) -> Result<()> {
        let LifetimeRange { min, max } = self.lifetime;
        if !min.is_finite() || !max.is_finite() {
            return Err(EmberError::Configuration(format!(
                "lifetime must be finite, got {min}..{max}"
            )));
        }
        if min < 0.0 {
            return Err(EmberError::ValueOutOfRange {
                field: "lifetime.min".into(),
                min: 0.0,
                max: max as f64,
                value: min as f64,
            });
        }
        if max < min || max <= 0.0 {
            return Err(EmberError::Configuration(format!(
                "lifetime.max must be positive and at least lifetime.min, got {min}..{max}"
            )));
        }
        if !self.pos.x.is_finite() || !self.pos.y.is_finite() {
            return Err(EmberError::Configuration("pos must be finite".into()));
        }
        Ok(())
    }

    pub fn wave_size(&self) -> usize {
        match self.particles_per_wave {
            Some(n) if n > 0 => n as usize,
            _ => 1,
        }
    }

    pub fn effective_spawn_chance(&self) -> f32 {
        match self.spawn_chance {
            Some(chance) if chance > 0.0 => chance.min(1.0),
            _ => 1.0,
        }
    }

    pub fn particle_limit(&self) -> usize {
        match self.max_particles {
            Some(n) if n > 0 => n as usize,
            _ => DEFAULT_MAX_PARTICLES,
        }
    }

    /// Emitter lifetime in seconds, or -1 for infinite
    pub fn effective_emitter_lifetime(&self) -> f32 {
        match self.emitter_lifetime {
            Some(life) if life > 0.0 => life,
            _ => -1.0,
        }
    }

    pub fn global_ease(&self) -> Option<Ease> {
        self.ease.clone().map(Ease::Segments)
    }

    pub fn rng_seed(&self) -> u32 {
        self.seed.unwrap_or(DEFAULT_SEED)
    }
}

fn check_required(has: impl Fn(&str) -> bool) -> Result<()> {
    match REQUIRED_FIELDS.iter().find(|key| !has(key)) {
        Some(key) => Err(EmberError::MissingRequiredField((*key).to_string())),
        None => Ok(()),
    }
}
