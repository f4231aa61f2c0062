//! Keyframed particle properties
//!
//! A [`PropertyList`] maps a particle's life fraction to a value. Lists are
//! bound once at configure time and pick an interpolation mode from their
//! shape, so the per-frame path only dispatches on a precomputed tag.

use crate::ease::{Ease, EaseSegment};
use ember_core::{EmberError, Result, Rgb};
use serde::{Deserialize, Serialize};

/// Linear interpolation between two property values
pub trait Lerp: Copy {
    fn lerp(a: Self, b: Self, t: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp(a: Self, b: Self, t: f32) -> Self {
        a + (b - a) * t
    }
}

impl Lerp for Rgb {
    fn lerp(a: Self, b: Self, t: f32) -> Self {
        let channel = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t) as u8;
        Rgb::new(channel(a.r, b.r), channel(a.g, b.g), channel(a.b, b.b))
    }
}

/// A value at a point in a particle's life (`time` in [0, 1])
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertyNode<T> {
    pub value: T,
    pub time: f32,
}

impl<T> PropertyNode<T> {
    pub fn new(value: T, time: f32) -> Self {
        Self { value, time }
    }
}

/// How a bound list produces values
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InterpolationMode {
    /// Single keyframe
    Constant,
    /// Hold each value until the next keyframe
    Stepped,
    /// Two keyframes spanning the whole life
    Simple,
    /// Any other list, walked segment by segment
    Complex,
}

#[derive(Clone, Debug)]
pub struct PropertyList<T> {
    nodes: Vec<PropertyNode<T>>,
    ease: Option<Ease>,
    mode: InterpolationMode,
}

impl<T: Lerp> PropertyList<T> {
    /// A list that always yields `value`
    pub fn constant(value: T) -> Self {
        Self {
            nodes: vec![PropertyNode::new(value, 0.0)],
            ease: None,
            mode: InterpolationMode::Constant,
        }
    }

    /// Validate keyframes and select the interpolation mode
    pub fn bind(nodes: Vec<PropertyNode<T>>, stepped: bool, ease: Option<Ease>) -> Result<Self> {
        if nodes.is_empty() {
            return Err(EmberError::Configuration("keyframe list is empty".into()));
        }
        let mut last = 0.0f32;
        for node in &nodes {
            if !node.time.is_finite() || !(0.0..=1.0).contains(&node.time) {
                return Err(EmberError::ValueOutOfRange {
                    field: "time".into(),
                    min: 0.0,
                    max: 1.0,
                    value: node.time as f64,
                });
            }
            if node.time < last {
                return Err(EmberError::Configuration(format!(
                    "keyframe times must not decrease ({} after {})",
                    node.time, last
                )));
            }
            last = node.time;
        }

        let mode = if nodes.len() == 1 {
            InterpolationMode::Constant
        } else if stepped {
            InterpolationMode::Stepped
        } else if nodes.len() == 2 && nodes[0].time == 0.0 && nodes[1].time >= 1.0 {
            InterpolationMode::Simple
        } else {
            InterpolationMode::Complex
        };

        Ok(Self { nodes, ease, mode })
    }

    pub fn mode(&self) -> InterpolationMode {
        self.mode
    }

    pub fn nodes(&self) -> &[PropertyNode<T>] {
        &self.nodes
    }

    pub fn first_value(&self) -> T {
        self.nodes[0].value
    }

    /// Value at life fraction `t`, walking from the first keyframe
    pub fn interpolate(&self, t: f32) -> T {
        let mut cursor = 0;
        self.interpolate_with_cursor(t, &mut cursor)
    }

    /// Value at life fraction `t`, resuming the segment search at `cursor`.
    ///
    /// The cursor only moves forward while `t` increases, and restarts from
    /// the first keyframe when `t` goes backwards.
    pub fn interpolate_with_cursor(&self, t: f32, cursor: &mut usize) -> T {
        // Stepped lists never ease
        let t = match &self.ease {
            Some(ease) if self.mode != InterpolationMode::Stepped => ease.apply(t),
            _ => t,
        };

        match self.mode {
            InterpolationMode::Constant => self.nodes[0].value,
            InterpolationMode::Simple => {
                let (a, b) = (&self.nodes[0], &self.nodes[1]);
                T::lerp(a.value, b.value, (t / b.time).clamp(0.0, 1.0))
            }
            InterpolationMode::Stepped => {
                let i = self.seek(t, cursor);
                self.nodes[i].value
            }
            InterpolationMode::Complex => {
                let i = self.seek(t, cursor);
                let a = &self.nodes[i];
                let Some(b) = self.nodes.get(i + 1) else {
                    return a.value;
                };
                if t <= a.time {
                    return a.value;
                }
                let span = b.time - a.time;
                if span <= 0.0 {
                    return b.value;
                }
                T::lerp(a.value, b.value, (t - a.time) / span)
            }
        }
    }

    /// Index of the last keyframe whose successor starts at or after `t`
    fn seek(&self, t: f32, cursor: &mut usize) -> usize {
        if *cursor >= self.nodes.len() || (*cursor > 0 && self.nodes[*cursor].time > t) {
            *cursor = 0;
        }
        while *cursor + 1 < self.nodes.len() && t > self.nodes[*cursor + 1].time {
            *cursor += 1;
        }
        *cursor
    }
}

/// Keyframe list as authored in configuration
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueList<T> {
    pub list: Vec<PropertyNode<T>>,
    #[serde(default)]
    pub is_stepped: bool,
    #[serde(default)]
    pub ease: Option<Vec<EaseSegment>>,
}

/// A property that is either a single value or a keyframe list
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum PropertySpec<T> {
    List(ValueList<T>),
    Static(T),
}

impl<T: Lerp> PropertySpec<T> {
    pub fn into_list(self) -> Result<PropertyList<T>> {
        match self {
            PropertySpec::Static(value) => Ok(PropertyList::constant(value)),
            PropertySpec::List(list) => PropertyList::bind(
                list.list,
                list.is_stepped,
                list.ease.map(Ease::Segments),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes(values: &[(f32, f32)]) -> Vec<PropertyNode<f32>> {
        values
            .iter()
            .map(|&(value, time)| PropertyNode::new(value, time))
            .collect()
    }

    #[test]
    fn simple_two_keyframes() {
        let list = PropertyList::bind(nodes(&[(0.0, 0.0), (10.0, 1.0)]), false, None).unwrap();
        assert_eq!(list.mode(), InterpolationMode::Simple);
        assert_eq!(list.interpolate(0.0), 0.0);
        assert_eq!(list.interpolate(1.0), 10.0);
        assert_eq!(list.interpolate(0.5), 5.0);
    }

    #[test]
    fn stepped_holds_values() {
        let list = PropertyList::bind(
            nodes(&[(0.0, 0.0), (5.0, 0.5), (10.0, 1.0)]),
            true,
            None,
        )
        .unwrap();
        assert_eq!(list.mode(), InterpolationMode::Stepped);
        assert_eq!(list.interpolate(0.49), 0.0);
        assert_eq!(list.interpolate(0.51), 5.0);
        assert_eq!(list.interpolate(1.0), 5.0);
    }

    #[test]
    fn stepped_wins_over_simple_shape() {
        let list = PropertyList::bind(nodes(&[(1.0, 0.0), (2.0, 1.0)]), true, None).unwrap();
        assert_eq!(list.mode(), InterpolationMode::Stepped);
        assert_eq!(list.interpolate(0.9), 1.0);
    }

    #[test]
    fn complex_segments() {
        let list = PropertyList::bind(
            nodes(&[(0.0, 0.0), (10.0, 0.5), (0.0, 1.0)]),
            false,
            None,
        )
        .unwrap();
        assert_eq!(list.mode(), InterpolationMode::Complex);
        assert!((list.interpolate(0.25) - 5.0).abs() < 1e-5);
        assert!((list.interpolate(0.5) - 10.0).abs() < 1e-5);
        assert!((list.interpolate(0.75) - 5.0).abs() < 1e-5);
    }

    #[test]
    fn complex_holds_outside_keyframes() {
        let list = PropertyList::bind(nodes(&[(3.0, 0.2), (7.0, 0.6)]), false, None).unwrap();
        assert_eq!(list.mode(), InterpolationMode::Complex);
        assert_eq!(list.interpolate(0.0), 3.0);
        assert_eq!(list.interpolate(0.9), 7.0);
    }

    #[test]
    fn cursor_advances_and_rewinds() {
        let list = PropertyList::bind(
            nodes(&[(0.0, 0.0), (1.0, 0.25), (2.0, 0.5), (3.0, 1.0)]),
            false,
            None,
        )
        .unwrap();
        let mut cursor = 0;
        for step in 0..=10 {
            let t = step as f32 / 10.0;
            let with_cursor = list.interpolate_with_cursor(t, &mut cursor);
            assert!((with_cursor - list.interpolate(t)).abs() < 1e-6);
        }
        assert_eq!(cursor, 2);

        // Going backwards restarts the search
        let v = list.interpolate_with_cursor(0.1, &mut cursor);
        assert!((v - 0.4).abs() < 1e-5);
        assert_eq!(cursor, 0);
    }

    #[test]
    fn constant_list() {
        let list = PropertyList::bind(nodes(&[(4.0, 0.0)]), false, None).unwrap();
        assert_eq!(list.mode(), InterpolationMode::Constant);
        assert_eq!(list.interpolate(0.7), 4.0);
    }

    #[test]
    fn eased_list() {
        let ease = Ease::custom(|t| t * t);
        let list =
            PropertyList::bind(nodes(&[(0.0, 0.0), (10.0, 1.0)]), false, Some(ease)).unwrap();
        assert!((list.interpolate(0.5) - 2.5).abs() < 1e-5);
    }

    #[test]
    fn stepped_list_ignores_ease() {
        let ease = Ease::custom(|t| t * t);
        let list = PropertyList::bind(
            nodes(&[(0.0, 0.0), (5.0, 0.5), (10.0, 1.0)]),
            true,
            Some(ease),
        )
        .unwrap();
        assert_eq!(list.mode(), InterpolationMode::Stepped);
        assert_eq!(list.interpolate(0.6), 5.0);
        assert_eq!(list.interpolate(0.4), 0.0);
    }

    #[test]
    fn bind_rejects_bad_lists() {
        assert!(PropertyList::<f32>::bind(Vec::new(), false, None).is_err());
        assert!(PropertyList::bind(nodes(&[(0.0, 0.0), (1.0, 1.5)]), false, None).is_err());
        assert!(PropertyList::bind(nodes(&[(0.0, 0.6), (1.0, 0.2)]), false, None).is_err());
    }

    #[test]
    fn color_lerp_per_channel() {
        let list = PropertyList::bind(
            vec![
                PropertyNode::new(Rgb::new(0, 0, 0), 0.0),
                PropertyNode::new(Rgb::new(200, 100, 50), 1.0),
            ],
            false,
            None,
        )
        .unwrap();
        assert_eq!(list.interpolate(0.5), Rgb::new(100, 50, 25));
    }

    #[derive(Deserialize)]
    struct Holder {
        alpha: PropertySpec<f32>,
    }

    #[test]
    fn spec_from_static_value() {
        let holder: Holder = toml::from_str("alpha = 0.5").unwrap();
        let list = holder.alpha.into_list().unwrap();
        assert_eq!(list.mode(), InterpolationMode::Constant);
        assert_eq!(list.interpolate(0.3), 0.5);
    }

    #[test]
    fn spec_from_value_list() {
        let holder: Holder = toml::from_str(
            r#"
            [alpha]
            isStepped = true
            list = [
                { value = 1.0, time = 0.0 },
                { value = 0.0, time = 1.0 },
            ]
            "#,
        )
        .unwrap();
        let list = holder.alpha.into_list().unwrap();
        assert_eq!(list.mode(), InterpolationMode::Stepped);
        assert_eq!(list.first_value(), 1.0);
    }

    #[test]
    fn spec_color_list_from_json() {
        let spec: PropertySpec<Rgb> = serde_json::from_str(
            r##"{"list":[{"value":"#ff0000","time":0},{"value":"#0000ff","time":1}]}"##,
        )
        .unwrap();
        let list = spec.into_list().unwrap();
        assert_eq!(list.interpolate(0.0), Rgb::new(255, 0, 0));
        assert_eq!(list.interpolate(1.0), Rgb::new(0, 0, 255));
    }
}
