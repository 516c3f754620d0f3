//! Template composition: directives, inheritance, includes, escapes
//!
//! The composition pipeline turns a template body plus its inheritance
//! chain and included fragments into a single flat string, ready for
//! expression evaluation. See [`Composer`] for the orchestration.

mod directives;
mod engine;
mod escape;
mod strip;

pub use directives::{extract, Directive, Directives};
pub use engine::Composer;
pub use escape::{mask, unmask, EscapeRecord};
pub use strip::strip_comments;
