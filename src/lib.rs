//! Odesza - a text template composition engine
//!
//! Templates are plain text with three composition directives (`extends`,
//! `block`/`endblock`, `include`) resolved at composition time, plus
//! `${...}` interpolation spans evaluated against a caller-supplied
//! variable scope. `#{...}` escapes emit literal text that would otherwise
//! look like an interpolation.
//!
//! # Example
//!
//! ```rust
//! use odesza::{render, Scope, Value};
//!
//! let mut vars = Scope::new();
//! vars.insert("value".to_string(), Value::from("world"));
//!
//! let out = render("hello ${value}", &vars).unwrap();
//! assert_eq!(out, "hello world");
//! ```

pub mod cache;
pub mod compose;
pub mod error;
pub mod eval;
pub mod source;
pub mod value;

pub use compose::Composer;
pub use error::EvalError;
pub use eval::{Evaluator, ExpressionEvaluator};
pub use value::{Scope, Value};

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during the render pipeline. Every variant aborts
/// the render chain outright; there is no partial output.
#[derive(Debug, Error)]
pub enum RenderError {
    /// No candidate file exists for a template reference
    #[error("cannot find template file: {reference}")]
    NotFound { reference: String },

    /// A resolved file could not be read
    #[error("error reading template file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The reference is not usable path text (empty or embedded NUL)
    #[error("invalid template reference: {reference:?}")]
    InvalidReference { reference: String },

    /// More than one `extends` directive in one template body
    #[error("a template can only extend one file at a time")]
    MultipleExtends,

    /// A `block` was opened without a matching `endblock`
    #[error("'endblock' statement required after block '{block}'")]
    UnterminatedBlock { block: String },

    /// An extends/include chain revisited a file already being rendered
    #[error("cyclic template reference detected: {chain}")]
    CycleDetected { chain: String },

    /// The expression evaluator rejected the composed body; the cause is
    /// carried by the source chain
    #[error("expression evaluation failed")]
    Evaluation(#[source] EvalError),
}

/// Render a template body with the default expression evaluator
pub fn render(body: &str, scope: &Scope) -> Result<String, RenderError> {
    Engine::default().render(body, scope)
}

/// Resolve, load, and render a template file with the default evaluator
pub fn render_file(reference: &str, scope: &Scope) -> Result<String, RenderError> {
    Engine::default().render_file(reference, scope)
}

/// Callback-style adapter for host frameworks that expect a
/// `(path, options, callback)` entry point.
pub fn render_file_with<F>(reference: &str, scope: &Scope, callback: F)
where
    F: FnOnce(Result<String, RenderError>),
{
    callback(render_file(reference, scope));
}

/// A render pipeline bound to an expression evaluator.
///
/// Each call creates a fresh [`Composer`], so the block store and cycle
/// tracking never leak between renders and concurrent calls are safe.
pub struct Engine {
    evaluator: Box<dyn Evaluator>,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            evaluator: Box::new(ExpressionEvaluator),
        }
    }
}

impl Engine {
    /// Create an engine with the built-in expression evaluator
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine backed by a custom evaluator
    pub fn with_evaluator(evaluator: Box<dyn Evaluator>) -> Self {
        Self { evaluator }
    }

    /// Render a template body. Relative directive references resolve
    /// against the process working directory.
    pub fn render(&self, body: &str, scope: &Scope) -> Result<String, RenderError> {
        Composer::new(self.evaluator.as_ref()).render(body, scope, None)
    }

    /// Render a template file; nested directive references resolve against
    /// the file's own directory.
    pub fn render_file(&self, reference: &str, scope: &Scope) -> Result<String, RenderError> {
        Composer::new(self.evaluator.as_ref()).render_file(reference, scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_variable() {
        let mut vars = Scope::new();
        vars.insert("value".to_string(), Value::from("world"));
        assert_eq!(render("hello ${value}", &vars).unwrap(), "hello world");
    }

    #[test]
    fn test_render_trims_result() {
        let out = render("  spaced out  ", &Scope::new()).unwrap();
        assert_eq!(out, "spaced out");
    }

    #[test]
    fn test_escape_round_trip() {
        let out = render("Hello #{${name}}", &Scope::new()).unwrap();
        assert_eq!(out, "Hello ${name}");
    }

    #[test]
    fn test_render_missing_file_is_not_found() {
        let err = render_file("definitely/not/here", &Scope::new()).unwrap_err();
        assert!(matches!(err, RenderError::NotFound { .. }));
    }

    #[test]
    fn test_callback_adapter_forwards_result() {
        let mut vars = Scope::new();
        vars.insert("value".to_string(), Value::from("world"));
        let mut got: Option<Result<String, RenderError>> = None;
        render_file_with("missing-template", &vars, |result| got = Some(result));
        assert!(matches!(got, Some(Err(RenderError::NotFound { .. }))));
    }

    #[test]
    fn test_evaluation_error_cause_is_source_only() {
        let err = render("${ghost}", &Scope::new()).unwrap_err();
        assert_eq!(err.to_string(), "expression evaluation failed");
        let source = std::error::Error::source(&err).expect("Should carry a source");
        assert_eq!(source.to_string(), "unknown variable: ghost");
    }

    #[test]
    fn test_custom_evaluator() {
        struct Shouting;
        impl Evaluator for Shouting {
            fn evaluate(&self, body: &str, _scope: &Scope) -> Result<String, EvalError> {
                Ok(body.to_uppercase())
            }
        }

        let engine = Engine::with_evaluator(Box::new(Shouting));
        assert_eq!(engine.render("quiet", &Scope::new()).unwrap(), "QUIET");
    }
}
