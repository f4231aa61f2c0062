//! Spatial and color types

use crate::EmberError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub};

/// A 2D vector
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };
    pub const ONE: Self = Self { x: 1.0, y: 1.0 };
    pub const RIGHT: Self = Self { x: 1.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub const fn splat(v: f32) -> Self {
        Self { x: v, y: v }
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn distance(&self, other: &Self) -> f32 {
        (*other - *self).length()
    }

    /// Unit vector in the same direction, or zero for a zero vector
    pub fn normalized(&self) -> Self {
        let len = self.length();
        if len > 0.0 {
            Self {
                x: self.x / len,
                y: self.y / len,
            }
        } else {
            Self::ZERO
        }
    }

    /// Rotate by `angle` radians around the origin
    pub fn rotated(&self, angle: f32) -> Self {
        if angle == 0.0 {
            return *self;
        }
        let (s, c) = angle.sin_cos();
        Self {
            x: self.x * c - self.y * s,
            y: self.x * s + self.y * c,
        }
    }

    /// Angle of the vector from the +x axis, in radians
    pub fn angle(&self) -> f32 {
        self.y.atan2(self.x)
    }

    pub fn lerp(&self, other: Self, t: f32) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}

impl Add for Vec2 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, scalar: f32) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }
}

/// 8-bit RGB color.
///
/// Authored as a hex string (`"#ff8800"`, `"ff8800"` or `"0xff8800"`) and
/// handed to renderers as a packed `0xRRGGBB` tint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Self = Self::new(0xFF, 0xFF, 0xFF);
    pub const BLACK: Self = Self::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn from_packed(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xFF) as u8,
            g: ((hex >> 8) & 0xFF) as u8,
            b: (hex & 0xFF) as u8,
        }
    }

    pub fn to_packed(&self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// Parse a hex color string with an optional `#` or `0x` prefix.
    ///
    /// Accepts `RRGGBB`, or `AARRGGBB` with the alpha byte discarded.
    pub fn from_hex_str(s: &str) -> Result<Self, EmberError> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix('#')
            .or_else(|| trimmed.strip_prefix("0x"))
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        // from_str_radix would also take a leading sign
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(EmberError::InvalidColor(s.to_string()));
        }
        let digits = match digits.len() {
            6 => digits,
            8 => &digits[2..],
            _ => return Err(EmberError::InvalidColor(s.to_string())),
        };
        let packed =
            u32::from_str_radix(digits, 16).map_err(|_| EmberError::InvalidColor(s.to_string()))?;
        Ok(Self::from_packed(packed))
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::WHITE
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Rgb {
    type Error = EmberError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex_str(&value)
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> Self {
        color.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec2_operations() {
        let v1 = Vec2::new(1.0, 2.0);
        let v2 = Vec2::new(4.0, 6.0);

        assert_eq!(v1 + v2, Vec2::new(5.0, 8.0));
        assert_eq!(v2 - v1, Vec2::new(3.0, 4.0));
        assert_eq!(v1 * 2.0, Vec2::new(2.0, 4.0));
        assert!((v1.distance(&v2) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_vec2_rotation_quarter_turn() {
        let v = Vec2::new(1.0, 0.0).rotated(std::f32::consts::FRAC_PI_2);
        assert!(v.x.abs() < 1e-6);
        assert!((v.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_vec2_normalize_zero() {
        assert_eq!(Vec2::ZERO.normalized(), Vec2::ZERO);
        let n = Vec2::new(3.0, 4.0).normalized();
        assert!((n.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_rgb_hex_forms() {
        let expected = Rgb::new(0xFF, 0x88, 0x44);
        assert_eq!(Rgb::from_hex_str("#ff8844").unwrap(), expected);
        assert_eq!(Rgb::from_hex_str("FF8844").unwrap(), expected);
        assert_eq!(Rgb::from_hex_str("0xff8844").unwrap(), expected);
        assert!(Rgb::from_hex_str("#ff88").is_err());
        assert!(Rgb::from_hex_str("#gg8844").is_err());
    }

    #[test]
    fn test_rgb_hex_rejects_signs_and_odd_lengths() {
        assert!(Rgb::from_hex_str("+fffff").is_err());
        assert!(Rgb::from_hex_str("#-fffff").is_err());
        assert!(Rgb::from_hex_str("ff88440").is_err());
        assert!(Rgb::from_hex_str("").is_err());
    }

    #[test]
    fn test_rgb_hex_drops_alpha_byte() {
        let expected = Rgb::new(0xFF, 0x88, 0x44);
        assert_eq!(Rgb::from_hex_str("ffff8844").unwrap(), expected);
        assert_eq!(Rgb::from_hex_str("#00ff8844").unwrap(), expected);
        assert_eq!(Rgb::from_hex_str("0x80FF8844").unwrap(), expected);
    }

    #[test]
    fn test_rgb_packing() {
        let c = Rgb::from_packed(0x12AB34);
        assert_eq!(c, Rgb::new(0x12, 0xAB, 0x34));
        assert_eq!(c.to_packed(), 0x12AB34);
        assert_eq!(c.to_string(), "#12ab34");
    }

    #[test]
    fn test_rgb_deserializes_from_string() {
        #[derive(Deserialize)]
        struct Holder {
            color: Rgb,
        }
        let holder: Holder = toml::from_str(r##"color = "#00ff00""##).unwrap();
        assert_eq!(holder.color, Rgb::new(0, 0xFF, 0));
    }
}
