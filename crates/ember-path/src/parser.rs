//! Path expression parser
//!
//! Turns an authored expression such as `sin(x / 20) * 30` into an [`Expr`]
//! tree. Only the variable `x`, a fixed set of math constants and a fixed set
//! of math functions are accepted; anything else is rejected here, before an
//! expression can ever be evaluated.

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use thiserror::Error;

#[derive(Parser)]
#[grammar = "grammar.pest"]
struct PathParser;

/// Longest expression source accepted by [`parse_path`]
pub const MAX_SOURCE_LEN: usize = 1024;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PathError {
    #[error("Syntax error: {0}")]
    Syntax(String),
    #[error("Unknown identifier: {0}")]
    UnknownIdentifier(String),
    #[error("Unknown function: {0}")]
    UnknownFunction(String),
    #[error("Function {function} expects {expected} argument(s), got {got}")]
    Arity {
        function: &'static str,
        expected: &'static str,
        got: usize,
    },
    #[error("Expression is {len} bytes long, the limit is {max}")]
    TooLong { len: usize, max: usize },
}

/// A parsed path expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    /// The input variable `x`
    Variable,
    Neg(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        func: MathFn,
        args: Vec<Expr>,
    },
}

/// Arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

/// Allowed math functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathFn {
    Abs,
    Acos,
    Acosh,
    Asin,
    Asinh,
    Atan,
    Atanh,
    Atan2,
    Cbrt,
    Ceil,
    Cos,
    Cosh,
    Exp,
    Expm1,
    Floor,
    Fround,
    Hypot,
    Log,
    Log1p,
    Log10,
    Log2,
    Max,
    Min,
    Pow,
    Round,
    Sign,
    Sin,
    Sinh,
    Sqrt,
    Tan,
    Tanh,
}

/// Accepted argument counts
enum Arity {
    Exactly(usize),
    Any,
}

impl MathFn {
    pub fn from_name(name: &str) -> Option<Self> {
        let func = match name {
            "abs" => MathFn::Abs,
            "acos" => MathFn::Acos,
            "acosh" => MathFn::Acosh,
            "asin" => MathFn::Asin,
            "asinh" => MathFn::Asinh,
            "atan" => MathFn::Atan,
            "atanh" => MathFn::Atanh,
            "atan2" => MathFn::Atan2,
            "cbrt" => MathFn::Cbrt,
            "ceil" => MathFn::Ceil,
            "cos" => MathFn::Cos,
            "cosh" => MathFn::Cosh,
            "exp" => MathFn::Exp,
            "expm1" => MathFn::Expm1,
            "floor" => MathFn::Floor,
            "fround" => MathFn::Fround,
            "hypot" => MathFn::Hypot,
            "log" => MathFn::Log,
            "log1p" => MathFn::Log1p,
            "log10" => MathFn::Log10,
            "log2" => MathFn::Log2,
            "max" => MathFn::Max,
            "min" => MathFn::Min,
            "pow" => MathFn::Pow,
            "round" => MathFn::Round,
            "sign" => MathFn::Sign,
            "sin" => MathFn::Sin,
            "sinh" => MathFn::Sinh,
            "sqrt" => MathFn::Sqrt,
            "tan" => MathFn::Tan,
            "tanh" => MathFn::Tanh,
            _ => return None,
        };
        Some(func)
    }

    pub fn name(&self) -> &'static str {
        match self {
            MathFn::Abs => "abs",
            MathFn::Acos => "acos",
            MathFn::Acosh => "acosh",
            MathFn::Asin => "asin",
            MathFn::Asinh => "asinh",
            MathFn::Atan => "atan",
            MathFn::Atanh => "atanh",
            MathFn::Atan2 => "atan2",
            MathFn::Cbrt => "cbrt",
            MathFn::Ceil => "ceil",
            MathFn::Cos => "cos",
            MathFn::Cosh => "cosh",
            MathFn::Exp => "exp",
            MathFn::Expm1 => "expm1",
            MathFn::Floor => "floor",
            MathFn::Fround => "fround",
            MathFn::Hypot => "hypot",
            MathFn::Log => "log",
            MathFn::Log1p => "log1p",
            MathFn::Log10 => "log10",
            MathFn::Log2 => "log2",
            MathFn::Max => "max",
            MathFn::Min => "min",
            MathFn::Pow => "pow",
            MathFn::Round => "round",
            MathFn::Sign => "sign",
            MathFn::Sin => "sin",
            MathFn::Sinh => "sinh",
            MathFn::Sqrt => "sqrt",
            MathFn::Tan => "tan",
            MathFn::Tanh => "tanh",
        }
    }

    fn arity(&self) -> Arity {
        match self {
            MathFn::Atan2 | MathFn::Pow => Arity::Exactly(2),
            MathFn::Hypot | MathFn::Max | MathFn::Min => Arity::Any,
            _ => Arity::Exactly(1),
        }
    }

    fn check_arity(&self, got: usize) -> Result<(), PathError> {
        match self.arity() {
            Arity::Any => Ok(()),
            Arity::Exactly(n) if n == got => Ok(()),
            Arity::Exactly(n) => Err(PathError::Arity {
                function: self.name(),
                expected: if n == 1 { "1" } else { "2" },
                got,
            }),
        }
    }
}

/// Named constants usable in expressions
fn constant(name: &str) -> Option<f64> {
    use std::f64::consts;
    let value = match name {
        "E" => consts::E,
        "LN10" => consts::LN_10,
        "LN2" => consts::LN_2,
        "LOG2E" => consts::LOG2_E,
        "LOG10E" => consts::LOG10_E,
        "PI" => consts::PI,
        "SQRT1_2" => consts::FRAC_1_SQRT_2,
        "SQRT2" => consts::SQRT_2,
        _ => return None,
    };
    Some(value)
}

/// Parse a path expression string
pub fn parse_path(input: &str) -> Result<Expr, PathError> {
    if input.len() > MAX_SOURCE_LEN {
        return Err(PathError::TooLong {
            len: input.len(),
            max: MAX_SOURCE_LEN,
        });
    }

    let mut pairs =
        PathParser::parse(Rule::path, input).map_err(|e| PathError::Syntax(e.to_string()))?;

    let path = pairs
        .next()
        .ok_or_else(|| PathError::Syntax("empty expression".to_string()))?;

    for inner in path.into_inner() {
        if inner.as_rule() == Rule::sum {
            return build_sum(inner);
        }
    }

    Err(PathError::Syntax("empty expression".to_string()))
}

fn build_sum(pair: Pair<Rule>) -> Result<Expr, PathError> {
    let mut inner = pair.into_inner();
    let mut expr = match inner.next() {
        Some(first) => build_product(first)?,
        None => return Err(PathError::Syntax("missing operand".to_string())),
    };

    while let (Some(op), Some(rhs)) = (inner.next(), inner.next()) {
        let op = match op.as_str() {
            "+" => BinaryOp::Add,
            _ => BinaryOp::Sub,
        };
        expr = Expr::Binary {
            op,
            lhs: Box::new(expr),
            rhs: Box::new(build_product(rhs)?),
        };
    }

    Ok(expr)
}

fn build_product(pair: Pair<Rule>) -> Result<Expr, PathError> {
    let mut inner = pair.into_inner();
    let mut expr = match inner.next() {
        Some(first) => build_unary(first)?,
        None => return Err(PathError::Syntax("missing operand".to_string())),
    };

    while let (Some(op), Some(rhs)) = (inner.next(), inner.next()) {
        let op = match op.as_str() {
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            _ => BinaryOp::Rem,
        };
        expr = Expr::Binary {
            op,
            lhs: Box::new(expr),
            rhs: Box::new(build_unary(rhs)?),
        };
    }

    Ok(expr)
}

fn build_unary(pair: Pair<Rule>) -> Result<Expr, PathError> {
    let mut negate = false;
    let mut operand = None;

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::sign => {
                if inner.as_str() == "-" {
                    negate = !negate;
                }
            }
            Rule::power => operand = Some(build_power(inner)?),
            _ => {}
        }
    }

    let operand = operand.ok_or_else(|| PathError::Syntax("missing operand".to_string()))?;
    Ok(if negate {
        Expr::Neg(Box::new(operand))
    } else {
        operand
    })
}

fn build_power(pair: Pair<Rule>) -> Result<Expr, PathError> {
    let mut base = None;
    let mut exponent = None;

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::pow_op => {}
            Rule::unary => exponent = Some(build_unary(inner)?),
            _ => base = Some(build_atom(inner)?),
        }
    }

    let base = base.ok_or_else(|| PathError::Syntax("missing operand".to_string()))?;
    Ok(match exponent {
        Some(exponent) => Expr::Binary {
            op: BinaryOp::Pow,
            lhs: Box::new(base),
            rhs: Box::new(exponent),
        },
        None => base,
    })
}

fn build_atom(pair: Pair<Rule>) -> Result<Expr, PathError> {
    match pair.as_rule() {
        Rule::number => pair
            .as_str()
            .parse::<f64>()
            .map(Expr::Number)
            .map_err(|_| PathError::Syntax(format!("invalid number '{}'", pair.as_str()))),
        Rule::ident => build_identifier(pair.as_str()),
        Rule::call => build_call(pair),
        Rule::sum => build_sum(pair),
        rule => Err(PathError::Syntax(format!("unexpected {:?}", rule))),
    }
}

fn build_identifier(raw: &str) -> Result<Expr, PathError> {
    let name = raw.strip_prefix("Math.").unwrap_or(raw);
    if name == "x" && name.len() == raw.len() {
        return Ok(Expr::Variable);
    }
    constant(name)
        .map(Expr::Number)
        .ok_or_else(|| PathError::UnknownIdentifier(raw.to_string()))
}

fn build_call(pair: Pair<Rule>) -> Result<Expr, PathError> {
    let mut inner = pair.into_inner();
    let raw = inner
        .next()
        .map(|p| p.as_str().to_string())
        .ok_or_else(|| PathError::Syntax("missing function name".to_string()))?;
    let name = raw.strip_prefix("Math.").unwrap_or(&raw);
    let func = MathFn::from_name(name).ok_or_else(|| PathError::UnknownFunction(raw.clone()))?;

    let args = inner.map(build_sum).collect::<Result<Vec<_>, _>>()?;
    func.check_arity(args.len())?;

    Ok(Expr::Call { func, args })
}
