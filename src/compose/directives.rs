//! Directive extraction for `extends`, `block`, and `include` statements
//!
//! Two surface syntaxes are accepted and treated identically: the space form
//! (`include header`) and the call form (`include('header')` or
//! `include("header")`). Matching keeps the original engine's
//! first-occurrence semantics: a keyword is recognized wherever it appears,
//! even mid-word, which is why the comment stripper must run first.

use logos::Logos;

/// Raw directive statements recognized in a template body
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum RawDirective {
    #[regex(r#"extends([ \t]+[A-Za-z0-9_./]+|\('[^']*'\)|\("[^"]*"\))"#)]
    Extends,

    #[regex(r#"block([ \t]+[A-Za-z0-9_./]+|\('[^']*'\)|\("[^"]*"\))"#)]
    Block,

    #[regex(r#"include([ \t]+[A-Za-z0-9_./]+|\('[^']*'\)|\("[^"]*"\))"#)]
    Include,
}

/// One extracted directive: the reference (path or block name) and the exact
/// source text of the statement, used for textual substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub reference: String,
    pub raw: String,
}

/// All directives found in one template body, in the order described in the
/// module docs: extends in source order, blocks and includes sorted by
/// descending reference length so that a name which is a prefix of another
/// is never substituted first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directives {
    pub extends: Vec<Directive>,
    pub blocks: Vec<Directive>,
    pub includes: Vec<Directive>,
}

/// Scan a template body for directive statements
pub fn extract(body: &str) -> Directives {
    let mut out = Directives::default();
    let mut lexer = RawDirective::lexer(body);

    while let Some(token) = lexer.next() {
        let Ok(token) = token else { continue };
        let raw = lexer.slice().to_string();
        let directive = Directive {
            reference: parse_reference(&raw),
            raw,
        };
        let bucket = match token {
            RawDirective::Extends => &mut out.extends,
            RawDirective::Block => &mut out.blocks,
            RawDirective::Include => &mut out.includes,
        };
        // One entry per distinct statement text; substitution is by literal
        // text, so duplicates would just re-render the same content
        if !bucket.contains(&directive) {
            bucket.push(directive);
        }
    }

    sort_longest_first(&mut out.blocks);
    sort_longest_first(&mut out.includes);
    out
}

/// Stable sort by descending reference length
fn sort_longest_first(directives: &mut [Directive]) {
    directives.sort_by(|a, b| b.reference.len().cmp(&a.reference.len()));
}

/// Pull the reference out of a matched statement: strip the keyword, then
/// either the surrounding whitespace (space form) or parens and quotes
/// (call form).
fn parse_reference(raw: &str) -> String {
    let rest = raw.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    let rest = rest.trim();
    match rest.strip_prefix('(') {
        Some(inner) => inner
            .trim_end_matches(')')
            .trim()
            .trim_matches(|c| c == '\'' || c == '"')
            .to_string(),
        None => rest.to_string(),
    }
}
