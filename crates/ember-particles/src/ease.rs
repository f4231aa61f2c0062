//! Easing functions for keyframe lists and particle age

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// One quadratic bezier piece of a segmented ease, from `s` to `e` with control point `cp`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EaseSegment {
    pub s: f32,
    pub cp: f32,
    pub e: f32,
}

/// Remaps a normalized time in [0, 1]
#[derive(Clone)]
pub enum Ease {
    /// Equal-width bezier segments covering [0, 1]
    Segments(Vec<EaseSegment>),
    /// Host-supplied easing function
    Custom(Arc<dyn Fn(f32) -> f32 + Send + Sync>),
}

impl Ease {
    pub fn segments(segments: Vec<EaseSegment>) -> Self {
        Ease::Segments(segments)
    }

    pub fn custom(f: impl Fn(f32) -> f32 + Send + Sync + 'static) -> Self {
        Ease::Custom(Arc::new(f))
    }

    pub fn apply(&self, t: f32) -> f32 {
        match self {
            Ease::Segments(segments) => sample_segments(segments, t),
            Ease::Custom(f) => f(t),
        }
    }
}

impl fmt::Debug for Ease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ease::Segments(segments) => f.debug_tuple("Segments").field(segments).finish(),
            Ease::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl From<Vec<EaseSegment>> for Ease {
    fn from(segments: Vec<EaseSegment>) -> Self {
        Ease::Segments(segments)
    }
}

fn sample_segments(segments: &[EaseSegment], t: f32) -> f32 {
    let Some(last) = segments.last() else {
        return t;
    };
    let qty = segments.len() as f32;
    let i = (qty * t).floor();
    let local = (t - i / qty) * qty;
    let seg = if i >= 0.0 {
        segments.get(i as usize).unwrap_or(last)
    } else {
        last
    };
    seg.s + local * (2.0 * (1.0 - local) * (seg.cp - seg.s) + local * (seg.e - seg.s))
}
