//! Ember Core - Foundational types for the Ember particle engine
//!
//! This crate provides the types every other Ember crate depends on:
//! - `Vec2` - 2D vector math used for positions, velocities and scales
//! - `Rgb` - 8-bit RGB color with hex parsing and packing
//! - Error types and Result alias

mod error;
mod types;

pub use error::{EmberError, Result};
pub use types::{Rgb, Vec2};
