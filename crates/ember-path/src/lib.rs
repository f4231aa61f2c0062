//! Ember Path - Expression language for particle path-following
//!
//! Path expressions describe a particle's lateral offset as a function of
//! the distance it has travelled, e.g. `sin(x / 25) * 40`. Expressions come
//! from authored effect files, so they are parsed against a strict
//! allow-list (arithmetic, `x`, math constants and functions) and evaluated
//! by walking the parsed tree.

mod eval;
mod parser;

pub use eval::PathExpression;
pub use parser::{parse_path, BinaryOp, Expr, MathFn, PathError, MAX_SOURCE_LEN};

impl From<PathError> for ember_core::EmberError {
    fn from(err: PathError) -> Self {
        ember_core::EmberError::ExpressionParse(err.to_string())
    }
}
