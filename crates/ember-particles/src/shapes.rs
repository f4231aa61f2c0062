//! Spawn shapes: local placement for freshly spawned particles

use crate::particle::Particle;
use crate::rand::ParticleRng;
use ember_core::Vec2;
use serde::Deserialize;

/// Places a new particle somewhere in the shape, in emitter-local space
pub trait SpawnShape {
    fn random_position(&self, particle: &mut Particle, rng: &mut ParticleRng);
}

/// Spawn at the emitter origin
#[derive(Debug, Clone, Copy, Default)]
pub struct PointShape;

impl SpawnShape for PointShape {
    fn random_position(&self, _particle: &mut Particle, _rng: &mut ParticleRng) {}
}

/// Uniform within `[x, x + w] × [y, y + h]`
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RectShape {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl SpawnShape for RectShape {
    fn random_position(&self, particle: &mut Particle, rng: &mut ParticleRng) {
        particle.position.x = self.x + rng.next_f32() * self.w;
        particle.position.y = self.y + rng.next_f32() * self.h;
    }
}

/// Ring (or filled circle when `inner_radius` is 0) around `(x, y)`
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TorusShape {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    pub radius: f32,
    #[serde(default)]
    pub inner_radius: f32,
    /// Turn particles to face away from the center
    #[serde(default)]
    pub affect_rotation: bool,
}

impl SpawnShape for TorusShape {
    fn random_position(&self, particle: &mut Particle, rng: &mut ParticleRng) {
        let distance = if self.inner_radius != self.radius {
            rng.range(self.inner_radius, self.radius)
        } else {
            self.radius
        };
        let angle = rng.angle();
        if self.affect_rotation {
            particle.rotation += angle;
        }
        particle.position = Vec2::new(distance, 0.0).rotated(angle) + Vec2::new(self.x, self.y);
    }
}

/// Evenly spaced (or random) directions around the origin.
///
/// Placement depends on the particle's index within its wave, so this is
/// not a [`SpawnShape`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct BurstShape {
    /// Degrees between consecutive particles; 0 picks a random angle
    #[serde(default)]
    pub spacing: f32,
    /// Angle of the first particle, in degrees
    #[serde(default)]
    pub start: f32,
    #[serde(default)]
    pub distance: f32,
}

impl BurstShape {
    pub fn place(&self, particle: &mut Particle, index: usize, rng: &mut ParticleRng) {
        let degrees = if self.spacing != 0.0 {
            self.start + self.spacing * index as f32
        } else {
            rng.range(0.0, 360.0)
        };
        let angle = degrees.to_radians();
        particle.rotation = angle;
        if self.distance != 0.0 {
            particle.position = Vec2::new(self.distance, 0.0).rotated(angle);
        }
    }
}

/// Point lists for [`PolygonalChainShape`]: one chain or several
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ChainData {
    Single(Vec<Vec2>),
    Multi(Vec<Vec<Vec2>>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Segment {
    start: Vec2,
    delta: Vec2,
    length: f32,
}

/// Random points along connected line segments, weighted by segment length
#[derive(Debug, Clone)]
pub struct PolygonalChainShape {
    segments: Vec<Segment>,
    /// Running length at the end of each segment
    cumulative: Vec<f32>,
    total_length: f32,
}

impl PolygonalChainShape {
    pub fn new(data: ChainData) -> Self {
        let chains = match data {
            ChainData::Single(points) => vec![points],
            ChainData::Multi(chains) => chains,
        };

        let mut segments = Vec::new();
        for chain in &chains {
            for pair in chain.windows(2) {
                let delta = pair[1] - pair[0];
                segments.push(Segment {
                    start: pair[0],
                    delta,
                    length: delta.length(),
                });
            }
        }
        if segments.is_empty() {
            segments.push(Segment {
                start: Vec2::ZERO,
                delta: Vec2::ZERO,
                length: 0.0,
            });
        }

        let mut cumulative = Vec::with_capacity(segments.len());
        let mut total_length = 0.0;
        for segment in &segments {
            total_length += segment.length;
            cumulative.push(total_length);
        }

        Self {
            segments,
            cumulative,
            total_length,
        }
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn total_length(&self) -> f32 {
        self.total_length
    }
}

impl SpawnShape for PolygonalChainShape {
    fn random_position(&self, particle: &mut Particle, rng: &mut ParticleRng) {
        let chosen = rng.next_f32() * self.total_length;
        let index = self
            .cumulative
            .partition_point(|&end| end <= chosen)
            .min(self.segments.len() - 1);
        let segment = &self.segments[index];
        let start = self.cumulative[index] - segment.length;
        let t = if segment.length > 0.0 {
            (chosen - start) / segment.length
        } else {
            0.0
        };
        particle.position = segment.start + segment.delta * t;
    }
}

/// `spawnShape` payload: `type` selects the shape, `data` holds its parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ShapeConfig {
    Rect(RectShape),
    Torus(TorusShape),
    PolygonalChain(ChainData),
}

impl ShapeConfig {
    pub fn build(self) -> Box<dyn SpawnShape> {
        match self {
            ShapeConfig::Rect(rect) => Box::new(rect),
            ShapeConfig::Torus(torus) => Box::new(torus),
            ShapeConfig::PolygonalChain(data) => Box::new(PolygonalChainShape::new(data)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::ParticlePool;

    fn with_particle(f: impl FnOnce(&mut Particle)) {
        let mut pool = ParticlePool::new();
        let id = pool.acquire();
        let particle = pool.get_mut(id).unwrap();
        particle.init(1.0);
        f(particle);
    }

    #[test]
    fn rect_stays_inside() {
        let rect = RectShape {
            x: -10.0,
            y: 5.0,
            w: 20.0,
            h: 4.0,
        };
        let mut rng = ParticleRng::new(11);
        with_particle(|p| {
            for _ in 0..500 {
                rect.random_position(p, &mut rng);
                assert!((-10.0..=10.0).contains(&p.position.x));
                assert!((5.0..=9.0).contains(&p.position.y));
            }
        });
    }

    #[test]
    fn torus_respects_radii() {
        let torus = TorusShape {
            x: 100.0,
            y: 0.0,
            radius: 50.0,
            inner_radius: 40.0,
            affect_rotation: false,
        };
        let mut rng = ParticleRng::new(5);
        with_particle(|p| {
            for _ in 0..500 {
                torus.random_position(p, &mut rng);
                let d = p.position.distance(&Vec2::new(100.0, 0.0));
                assert!((39.999..=50.001).contains(&d));
            }
            assert_eq!(p.rotation, 0.0);
        });
    }

    #[test]
    fn torus_affects_rotation() {
        let torus = TorusShape {
            x: 0.0,
            y: 0.0,
            radius: 10.0,
            inner_radius: 10.0,
            affect_rotation: true,
        };
        let mut rng = ParticleRng::new(8);
        with_particle(|p| {
            torus.random_position(p, &mut rng);
            let facing = Vec2::new(10.0, 0.0).rotated(p.rotation);
            assert!(facing.distance(&p.position) < 1e-3);
        });
    }

    #[test]
    fn burst_even_spacing() {
        let burst = BurstShape {
            spacing: 90.0,
            start: 0.0,
            distance: 10.0,
        };
        let mut rng = ParticleRng::new(1);
        with_particle(|p| {
            burst.place(p, 1, &mut rng);
            assert!((p.rotation - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
            assert!(p.position.x.abs() < 1e-4);
            assert!((p.position.y - 10.0).abs() < 1e-4);
        });
    }

    #[test]
    fn chain_points_lie_on_segments() {
        let shape = PolygonalChainShape::new(ChainData::Single(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 30.0),
        ]));
        assert_eq!(shape.segment_count(), 2);
        assert!((shape.total_length() - 40.0).abs() < 1e-6);

        let mut rng = ParticleRng::new(21);
        let mut vertical = 0;
        with_particle(|p| {
            for _ in 0..1000 {
                shape.random_position(p, &mut rng);
                let on_first = p.position.y.abs() < 1e-4 && (0.0..=10.0).contains(&p.position.x);
                let on_second =
                    (p.position.x - 10.0).abs() < 1e-4 && (0.0..=30.0).contains(&p.position.y);
                assert!(on_first || on_second);
                if p.position.y > 1e-4 {
                    vertical += 1;
                }
            }
        });
        // The vertical segment is three quarters of the chain
        assert!((650..850).contains(&vertical));
    }

    #[test]
    fn empty_chain_spawns_at_origin() {
        let shape = PolygonalChainShape::new(ChainData::Multi(Vec::new()));
        let mut rng = ParticleRng::new(2);
        with_particle(|p| {
            p.position = Vec2::new(3.0, 3.0);
            shape.random_position(p, &mut rng);
            assert_eq!(p.position, Vec2::ZERO);
        });
    }

    #[test]
    fn shape_config_from_toml() {
        let value: toml::Value = toml::from_str(
            r#"
            type = "torus"
            data = { radius = 25, innerRadius = 5, affectRotation = true }
            "#,
        )
        .unwrap();
        let config: ShapeConfig = value.try_into().unwrap();
        match config {
            ShapeConfig::Torus(t) => {
                assert_eq!(t.radius, 25.0);
                assert_eq!(t.inner_radius, 5.0);
                assert!(t.affect_rotation);
            }
            other => panic!("expected torus, got {other:?}"),
        }
    }

    #[test]
    fn chain_config_multi() {
        let value: toml::Value = toml::from_str(
            r#"
            type = "polygonalChain"
            data = [[{ x = 0, y = 0 }, { x = 5, y = 0 }], [{ x = 0, y = 5 }, { x = 5, y = 5 }]]
            "#,
        )
        .unwrap();
        let config: ShapeConfig = value.try_into().unwrap();
        assert!(matches!(config, ShapeConfig::PolygonalChain(ChainData::Multi(_))));
    }
}
