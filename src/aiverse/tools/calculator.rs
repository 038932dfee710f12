//! # Calculator Tool
//!
//! Arithmetic evaluation for agents, backed by [`evalexpr`].
//!
//! Supported input:
//!
//! - **Operators**: `+`, `-`, `*`, `/`, `%`, `^` (also `**`), parentheses
//! - **Functions**: `sqrt()`, `abs()`, `ln()`, `exp()`, `sin()`, `cos()`, `tan()` (radians),
//!   `floor()`, `ceil()`, `round()`, `min(a, b)`, `max(a, b)`
//! - **Constants**: `pi`, `e`
//!
//! Integer literals are evaluated as floating point numbers, so `7 / 2` is `3.5` and not the
//! integer quotient.
//!
//! ```rust,ignore
//! use aiverse::tools::Calculator;
//!
//! let calc = Calculator::new();
//! assert_eq!(calc.evaluate("2 + 3 * 4").await?, 14.0);
//! assert_eq!(calc.evaluate("7 / 2").await?, 3.5);
//! ```
//!
//! Invalid syntax, unknown identifiers and non-finite results (`1/0`, `sqrt(-1)`) are reported
//! as [`CalculatorError`]s.

use evalexpr::ContextWithMutableVariables;
use std::error::Error;
use std::fmt;

/// Functions that live in evalexpr's `math::` namespace.
const MATH_FUNCTIONS: &[&str] = &["sqrt", "abs", "ln", "exp", "sin", "cos", "tan"];

/// Error type for calculator operations
#[derive(Debug, Clone, PartialEq)]
pub struct CalculatorError {
    message: String,
}

impl CalculatorError {
    pub fn new(message: impl Into<String>) -> Self {
        CalculatorError {
            message: message.into(),
        }
    }
}

impl fmt::Display for CalculatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Calculator error: {}", self.message)
    }
}

impl Error for CalculatorError {}

/// Either a computed `f64` value or a `CalculatorError`.
pub type CalculatorResult = Result<f64, CalculatorError>;

/// Stateless arithmetic evaluator, safe to share across tasks.
#[derive(Clone, Default)]
pub struct Calculator {}

impl Calculator {
    pub fn new() -> Self {
        Calculator {}
    }

    /// Evaluate an arithmetic expression.
    pub async fn evaluate(&self, expression: &str) -> CalculatorResult {
        let expression = expression.trim();
        if expression.is_empty() {
            return Err(CalculatorError::new("Empty expression"));
        }

        let prepared = prepare_expression(expression);

        let mut context: evalexpr::HashMapContext = evalexpr::HashMapContext::new();
        context
            .set_value(
                "math::PI".to_string(),
                evalexpr::Value::Float(std::f64::consts::PI),
            )
            .map_err(|e| CalculatorError::new(format!("Context error: {}", e)))?;
        context
            .set_value(
                "math::E".to_string(),
                evalexpr::Value::Float(std::f64::consts::E),
            )
            .map_err(|e| CalculatorError::new(format!("Context error: {}", e)))?;

        let value = evalexpr::eval_with_context(&prepared, &context)
            .map_err(|e| CalculatorError::new(format!("Evaluation error: {}", e)))?;
        let number = value
            .as_number()
            .map_err(|_| CalculatorError::new("Result is not a number"))?;

        if !number.is_finite() {
            return Err(CalculatorError::new(format!(
                "Result of '{}' is not a finite number",
                expression
            )));
        }
        Ok(number)
    }
}

/// Render a result the way a person would write it: `6` rather than `6.0`.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Rewrite user syntax into evalexpr syntax.
///
/// Single pass over the input: numbers without a fractional part get `.0` appended,
/// known function names get the `math::` prefix, and `pi`/`e` become context variables.
fn prepare_expression(expr: &str) -> String {
    let expr = expr.replace("**", "^");
    let chars: Vec<char> = expr.chars().collect();
    let mut out = String::with_capacity(expr.len() + 16);
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];

        if ch.is_ascii_digit() || (ch == '.' && chars.get(i + 1).is_some_and(|c| c.is_ascii_digit())) {
            let start = i;
            let mut has_dot = false;
            while i < chars.len() && (chars[i].is_ascii_digit() || (chars[i] == '.' && !has_dot)) {
                if chars[i] == '.' {
                    has_dot = true;
                }
                i += 1;
            }
            let literal: String = chars[start..i].iter().collect();
            if literal.starts_with('.') {
                out.push('0');
            }
            out.push_str(&literal);
            let followed_by_ident = chars
                .get(i)
                .is_some_and(|c| c.is_alphanumeric() || *c == '_');
            if literal.ends_with('.') {
                out.push('0');
            } else if !has_dot && !followed_by_ident {
                out.push_str(".0");
            }
            continue;
        }

        if ch.is_alphabetic() || ch == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let ident: String = chars[start..i].iter().collect();
            let already_namespaced = out.ends_with("::");

            let mut j = i;
            while j < chars.len() && chars[j].is_whitespace() {
                j += 1;
            }
            let is_call = chars.get(j) == Some(&'(');

            if !already_namespaced && is_call && MATH_FUNCTIONS.contains(&ident.as_str()) {
                out.push_str("math::");
                out.push_str(&ident);
            } else if !already_namespaced && !is_call && ident == "pi" {
                out.push_str("math::PI");
            } else if !already_namespaced && !is_call && ident == "e" {
                out.push_str("math::E");
            } else {
                out.push_str(&ident);
            }
            continue;
        }

        out.push(ch);
        i += 1;
    }

    out
}
