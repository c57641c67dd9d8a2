// Equation evaluation - x -> value
//
// The sequencer only needs `evaluate(expression, x) -> f64`. Parsing is
// delegated to `meval`; parsed expressions are cached per source string since
// the scheduler evaluates the same few equations on every tick.

use std::collections::HashMap;

/// Errors from evaluating an instrument equation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("Failed to parse '{expression}': {message}")]
    Parse { expression: String, message: String },

    #[error("Failed to evaluate '{expression}': {message}")]
    Evaluation { expression: String, message: String },

    #[error("'{expression}' produced a non-numeric result at x = {x}")]
    NonFinite { expression: String, x: f64 },
}

/// Evaluates an expression in the single free variable `x`
pub trait Evaluator {
    fn evaluate(&mut self, expression: &str, x: f64) -> Result<f64, EvalError>;
}

/// Closures can stand in for an evaluator (used by tests and previews)
impl<F> Evaluator for F
where
    F: FnMut(&str, f64) -> Result<f64, EvalError>,
{
    fn evaluate(&mut self, expression: &str, x: f64) -> Result<f64, EvalError> {
        self(expression, x)
    }
}

/// `meval`-backed evaluator with a parse cache
///
/// Besides meval's builtins (`sin`, `cos`, `ln`, `sqrt`, `abs`, `^`, ...) it
/// understands `log(x)` as the natural logarithm.
#[derive(Default)]
pub struct MathEvaluator {
    parsed: HashMap<String, meval::Expr>,
}

impl MathEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check an expression parses, without evaluating it
    pub fn validate(&mut self, expression: &str) -> Result<(), EvalError> {
        self.parse(expression).map(|_| ())
    }

    fn parse(&mut self, expression: &str) -> Result<&meval::Expr, EvalError> {
        if !self.parsed.contains_key(expression) {
            let expr: meval::Expr = expression.parse().map_err(|e: meval::Error| EvalError::Parse {
                expression: expression.to_string(),
                message: e.to_string(),
            })?;
            self.parsed.insert(expression.to_string(), expr);
        }

        self.parsed
            .get(expression)
            .ok_or_else(|| EvalError::Parse {
                expression: expression.to_string(),
                message: "expression cache miss".to_string(),
            })
    }
}

impl Evaluator for MathEvaluator {
    fn evaluate(&mut self, expression: &str, x: f64) -> Result<f64, EvalError> {
        let expr = self.parse(expression)?;

        let mut ctx = meval::Context::new();
        ctx.var("x", x);
        ctx.func("log", f64::ln);

        let value = expr
            .eval_with_context(ctx)
            .map_err(|e| EvalError::Evaluation {
                expression: expression.to_string(),
                message: e.to_string(),
            })?;

        if value.is_nan() {
            return Err(EvalError::NonFinite {
                expression: expression.to_string(),
                x,
            });
        }

        Ok(value)
    }
}
