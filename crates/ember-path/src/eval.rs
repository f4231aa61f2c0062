//! Path expression evaluation

use crate::parser::{parse_path, BinaryOp, Expr, MathFn, PathError};

/// A compiled `y = f(x)` path expression.
///
/// Compilation validates the source against the allow-list; evaluation
/// walks the parsed tree and never touches anything but `f64` arithmetic.
#[derive(Debug, Clone, PartialEq)]
pub struct PathExpression {
    source: String,
    root: Expr,
}

impl PathExpression {
    /// Parse and validate an expression
    pub fn compile(source: &str) -> Result<Self, PathError> {
        let root = parse_path(source)?;
        Ok(Self {
            source: source.to_string(),
            root,
        })
    }

    /// The expression as authored
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The parsed expression tree
    pub fn expr(&self) -> &Expr {
        &self.root
    }

    /// Evaluate the expression for the given `x`
    pub fn evaluate(&self, x: f64) -> f64 {
        eval(&self.root, x)
    }
}

fn eval(expr: &Expr, x: f64) -> f64 {
    match expr {
        Expr::Number(n) => *n,
        Expr::Variable => x,
        Expr::Neg(inner) => -eval(inner, x),
        Expr::Binary { op, lhs, rhs } => {
            let a = eval(lhs, x);
            let b = eval(rhs, x);
            match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => a / b,
                BinaryOp::Rem => a % b,
                BinaryOp::Pow => a.powf(b),
            }
        }
        Expr::Call { func, args } => {
            let values: Vec<f64> = args.iter().map(|arg| eval(arg, x)).collect();
            call(*func, &values)
        }
    }
}

fn call(func: MathFn, args: &[f64]) -> f64 {
    let a = args.first().copied().unwrap_or(f64::NAN);
    let b = args.get(1).copied().unwrap_or(f64::NAN);
    match func {
        MathFn::Abs => a.abs(),
        MathFn::Acos => a.acos(),
        MathFn::Acosh => a.acosh(),
        MathFn::Asin => a.asin(),
        MathFn::Asinh => a.asinh(),
        MathFn::Atan => a.atan(),
        MathFn::Atanh => a.atanh(),
        MathFn::Atan2 => a.atan2(b),
        MathFn::Cbrt => a.cbrt(),
        MathFn::Ceil => a.ceil(),
        MathFn::Cos => a.cos(),
        MathFn::Cosh => a.cosh(),
        MathFn::Exp => a.exp(),
        MathFn::Expm1 => a.exp_m1(),
        MathFn::Floor => a.floor(),
        MathFn::Fround => a as f32 as f64,
        MathFn::Hypot => args.iter().map(|v| v * v).sum::<f64>().sqrt(),
        MathFn::Log => a.ln(),
        MathFn::Log1p => a.ln_1p(),
        MathFn::Log10 => a.log10(),
        MathFn::Log2 => a.log2(),
        MathFn::Max => args.iter().copied().fold(f64::NEG_INFINITY, nan_max),
        MathFn::Min => args.iter().copied().fold(f64::INFINITY, nan_min),
        MathFn::Pow => a.powf(b),
        // Halves round towards +infinity
        MathFn::Round => (a + 0.5).floor(),
        MathFn::Sign => {
            if a.is_nan() || a == 0.0 {
                a
            } else {
                a.signum()
            }
        }
        MathFn::Sin => a.sin(),
        MathFn::Sinh => a.sinh(),
        MathFn::Sqrt => a.sqrt(),
        MathFn::Tan => a.tan(),
        MathFn::Tanh => a.tanh(),
    }
}

fn nan_max(acc: f64, v: f64) -> f64 {
    if acc.is_nan() || v.is_nan() {
        f64::NAN
    } else {
        acc.max(v)
    }
}

fn nan_min(acc: f64, v: f64) -> f64 {
    if acc.is_nan() || v.is_nan() {
        f64::NAN
    } else {
        acc.min(v)
    }
}
