//! Path following: particles travel along `y = f(x)` in their spawn frame

use super::{decode, roll_multiplier, Behavior, BehaviorOrder, BuildContext};
use crate::particle::{Particle, Wave};
use crate::property::{PropertyList, PropertySpec};
use crate::rand::ParticleRng;
use ember_core::{Result, Vec2};
use ember_path::PathExpression;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

/// Lateral offset as a function of distance travelled
#[derive(Clone)]
pub enum PathFunction {
    Expression(PathExpression),
    Custom(Arc<dyn Fn(f32) -> f32 + Send + Sync>),
}

impl PathFunction {
    pub fn custom(f: impl Fn(f32) -> f32 + Send + Sync + 'static) -> Self {
        PathFunction::Custom(Arc::new(f))
    }

    pub fn evaluate(&self, x: f32) -> f32 {
        match self {
            PathFunction::Expression(expr) => expr.evaluate(x as f64) as f32,
            PathFunction::Custom(f) => f(x),
        }
    }
}

impl fmt::Debug for PathFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathFunction::Expression(expr) => {
                f.debug_tuple("Expression").field(&expr.source()).finish()
            }
            PathFunction::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

fn default_mult() -> f32 {
    1.0
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PathConfig {
    path: String,
    speed: PropertySpec<f32>,
    #[serde(default = "default_mult")]
    min_mult: f32,
}

/// Moves particles along a path, rotated by their spawn rotation and
/// anchored at their spawn position
pub struct PathBehavior {
    path: Option<PathFunction>,
    list: PropertyList<f32>,
    min_mult: f32,
}

impl PathBehavior {
    pub const KIND: &'static str = "movePath";

    /// `None` disables movement entirely
    pub fn new(path: Option<PathFunction>, list: PropertyList<f32>, min_mult: f32) -> Self {
        Self {
            path,
            list,
            min_mult,
        }
    }

    pub fn from_config(config: &toml::Value, _ctx: &BuildContext<'_>) -> Result<Box<dyn Behavior>> {
        let config: PathConfig = decode(Self::KIND, config)?;
        let path = match PathExpression::compile(&config.path) {
            Ok(expr) => Some(PathFunction::Expression(expr)),
            Err(err) => {
                log::warn!("movePath: ignoring path '{}': {err}", config.path);
                None
            }
        };
        Ok(Box::new(Self::new(
            path,
            config.speed.into_list()?,
            config.min_mult,
        )))
    }

    pub fn path(&self) -> Option<&PathFunction> {
        self.path.as_ref()
    }
}

impl Behavior for PathBehavior {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn order(&self) -> BehaviorOrder {
        BehaviorOrder::Late
    }

    fn init_particles(&mut self, wave: &mut Wave<'_>, rng: &mut ParticleRng) {
        while let Some(particle) = wave.next_particle() {
            particle.scratch.init_rotation = particle.rotation;
            particle.scratch.init_position = particle.position;
            particle.scratch.path_distance = 0.0;
            particle.scratch.speed_mult = roll_multiplier(rng, self.min_mult);
        }
    }

    fn update_particle(&self, particle: &mut Particle, delta: f32) {
        let Some(path) = &self.path else {
            return;
        };
        let cursor = &mut particle.scratch.cursors.speed;
        let speed = self.list.interpolate_with_cursor(particle.age_percent, cursor)
            * particle.scratch.speed_mult;
        let distance = particle.scratch.path_distance + speed * delta;
        particle.scratch.path_distance = distance;

        let offset =
            Vec2::new(distance, path.evaluate(distance)).rotated(particle.scratch.init_rotation);
        particle.position = particle.scratch.init_position + offset;
    }
}
