//! Expression evaluation for `${...}` interpolation spans
//!
//! The composition engine depends only on the [`Evaluator`] trait, so hosts
//! can plug in their own expression language. The default
//! [`ExpressionEvaluator`] implements a small closed grammar: literals,
//! variables, property/index access, arithmetic, comparisons, conditionals,
//! list/map literals, and filter pipelines.

pub mod ast;
pub mod grammar;
pub mod interp;
pub mod lexer;

use crate::error::EvalError;
use crate::value::{Scope, Value};

/// Substitutes `${expr}` spans in a composed template body
pub trait Evaluator {
    fn evaluate(&self, body: &str, scope: &Scope) -> Result<String, EvalError>;
}

/// The built-in evaluator backed by the crate's expression grammar
#[derive(Debug, Default, Clone, Copy)]
pub struct ExpressionEvaluator;

impl Evaluator for ExpressionEvaluator {
    fn evaluate(&self, body: &str, scope: &Scope) -> Result<String, EvalError> {
        let mut out = String::with_capacity(body.len());
        let mut rest = body;

        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let expr_start = start + 2;
            let end = span_end(&rest[expr_start..]).ok_or(EvalError::UnterminatedInterpolation)?;
            let source = &rest[expr_start..expr_start + end];
            let value = evaluate_expression(source, scope)?;
            out.push_str(&value.to_string());
            rest = &rest[expr_start + end + 1..];
        }

        out.push_str(rest);
        Ok(out)
    }
}

/// Parse and evaluate one expression
pub fn evaluate_expression(source: &str, scope: &Scope) -> Result<Value, EvalError> {
    let expr = grammar::parse(source).map_err(|mut errs| {
        if errs.is_empty() {
            EvalError::Syntax {
                span: 0..source.len(),
                message: "invalid expression".to_string(),
                expected: vec![],
            }
        } else {
            errs.remove(0)
        }
    })?;
    interp::eval(&expr, scope)
}

/// Find the byte offset of the `}` closing an interpolation span.
///
/// Unlike escape and block scanning this is a balanced scan, honoring
/// quotes, because the expression grammar itself contains braces (map
/// literals).
fn span_end(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '{' => depth += 1,
            '}' => {
                if depth == 0 {
                    return Some(i);
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    None
}
