//! Path expression tabulation command

use anyhow::{Context, Result};
use ember_path::PathExpression;

pub struct PathArgs {
    pub expression: String,
    pub from: f64,
    pub to: f64,
    pub steps: u32,
}

/// Sample `expression` at `steps + 1` evenly spaced points
pub fn tabulate(expression: &PathExpression, from: f64, to: f64, steps: u32) -> Vec<(f64, f64)> {
    let steps = steps.max(1);
    (0..=steps)
        .map(|i| {
            let x = from + (to - from) * i as f64 / steps as f64;
            (x, expression.evaluate(x))
        })
        .collect()
}

pub fn run(args: PathArgs) -> Result<()> {
    let expression = PathExpression::compile(&args.expression)
        .with_context(|| format!("Failed to compile path: {}", args.expression))?;

    println!("y = {}", expression.source());
    println!();
    println!("{:>12}  {:>12}", "x", "y");
    for (x, y) in tabulate(&expression, args.from, args.to, args.steps) {
        println!("{:>12.4}  {:>12.4}", x, y);
    }
    Ok(())
}
