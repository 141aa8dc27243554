//! The expression evaluation contract consumed by the decoding core.
//!
//! The expression language itself lives outside this crate; dynamic sizes,
//! indices and conditions reach the core only through this trait. [`Const`]
//! and the impl for [`Reference`] cover the two cases the core needs on its
//! own: literal sizes and sizes taken straight from an earlier field.

use crate::error::BindError;
use crate::scope::{Reference, Resolver};
use crate::value::Value;

pub trait Expression: Send + Sync {
    /// Evaluate against the current resolver. Any failure aborts the field
    /// decode that triggered the evaluation.
    fn evaluate(&self, resolver: &Resolver<'_>) -> Result<Value, BindError>;

    /// Human-readable rendering for diagnostics and documentation.
    fn describe(&self) -> String;
}

/// A literal value; evaluation never consults the resolver.
pub struct Const(pub Value);

impl Expression for Const {
    fn evaluate(&self, _resolver: &Resolver<'_>) -> Result<Value, BindError> {
        Ok(self.0.clone())
    }

    fn describe(&self) -> String {
        match &self.0 {
            Value::Text(s) => format!("{s:?}"),
            v => match v.as_i64() {
                Some(n) => n.to_string(),
                None => format!("{v:?}"),
            },
        }
    }
}

impl Expression for Reference {
    fn evaluate(&self, resolver: &Resolver<'_>) -> Result<Value, BindError> {
        self.resolve(resolver)
    }

    fn describe(&self) -> String {
        Reference::describe(self)
    }
}

/// Evaluate an expression expected to produce a non-negative byte count or
/// index. Anything else is reported as an evaluation failure.
pub fn evaluate_size(
    expr: &dyn Expression,
    resolver: &Resolver<'_>,
) -> Result<u64, BindError> {
    let value = expr.evaluate(resolver)?;
    match value.as_i64() {
        Some(n) if n >= 0 => Ok(n as u64),
        Some(n) => Err(BindError::Expression(format!(
            "{} evaluated to negative size {n}",
            expr.describe()
        ))),
        None => Err(BindError::Expression(format!(
            "{} did not evaluate to an integer",
            expr.describe()
        ))),
    }
}
