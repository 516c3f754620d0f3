//! Composition engine: inheritance merge and include expansion
//!
//! A [`Composer`] is created per top-level render call and owns the block
//! store and the visited-path set for that chain, so concurrent renders
//! never share inheritance state. Composition is a synchronous, recursive,
//! deterministic transformation; every failure aborts the whole render.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::compose::directives::{extract, Directive};
use crate::compose::{escape, strip};
use crate::eval::Evaluator;
use crate::source;
use crate::value::Scope;
use crate::RenderError;

pub struct Composer<'e> {
    evaluator: &'e dyn Evaluator,
    /// Block name -> overriding body, pushed by child templates and consumed
    /// exactly once by the ancestor that declares the placeholder
    blocks: HashMap<String, String>,
    /// Paths currently being rendered in this chain, for cycle detection
    visiting: HashSet<PathBuf>,
}

impl<'e> Composer<'e> {
    pub fn new(evaluator: &'e dyn Evaluator) -> Self {
        Self {
            evaluator,
            blocks: HashMap::new(),
            visiting: HashSet::new(),
        }
    }

    /// Render a template body against a variable scope. `base` is the
    /// directory used to resolve relative `extends`/`include` references;
    /// `None` falls back to the process working directory.
    pub fn render(
        &mut self,
        body: &str,
        scope: &Scope,
        base: Option<&Path>,
    ) -> Result<String, RenderError> {
        let stripped = strip::strip_comments(body);
        let (mut template, records) = escape::mask(&stripped);
        let mut statements = extract(&template);

        if !statements.extends.is_empty() {
            // Only one extends target is allowed per template
            if statements.extends.len() > 1 {
                return Err(RenderError::MultipleExtends);
            }

            for block in &statements.blocks {
                // Already in memory means a deeper child has overridden it
                // (multi-level inheritance), so this level's body is skipped
                if self.blocks.contains_key(&block.reference) {
                    continue;
                }
                let content = capture_block(&template, block)?;
                self.blocks.insert(block.reference.clone(), content);
            }

            let target = join_reference(base, &statements.extends[0].reference);
            template = self.render_file(&target, scope)?;

            // The rendered ancestor may carry statements of its own
            statements = extract(&template);
        } else {
            // Terminal template of the chain: fill the placeholders.
            // A placeholder with no overriding content renders as nothing.
            for block in &statements.blocks {
                match self.blocks.remove(&block.reference) {
                    Some(content) => template = template.replace(&block.raw, &content),
                    None => template = template.replace(&block.raw, ""),
                }
            }
        }

        for include in &statements.includes {
            let target = join_reference(base, &include.reference);
            let rendered = self.render_file(&target, scope)?;
            // Every occurrence of the literal statement fans out to the one
            // rendered result
            template = template.replace(&include.raw, &rendered);
        }

        let evaluated = self
            .evaluator
            .evaluate(&template, scope)
            .map_err(RenderError::Evaluation)?;

        Ok(escape::unmask(&evaluated, &records).trim().to_string())
    }

    /// Resolve a template reference, load its content, and render it with
    /// nested references resolved relative to the file's own directory.
    pub fn render_file(&mut self, reference: &str, scope: &Scope) -> Result<String, RenderError> {
        let resolved = source::resolve(reference)?;

        if !self.visiting.insert(resolved.clone()) {
            return Err(RenderError::CycleDetected {
                chain: self.describe_chain(&resolved),
            });
        }

        let base = resolved.parent().map(Path::to_path_buf);
        let body = source::load(&resolved);
        let result = match body {
            Ok(body) => self.render(&body, scope, base.as_deref()),
            Err(e) => Err(e),
        };

        self.visiting.remove(&resolved);
        result
    }

    fn describe_chain(&self, repeated: &Path) -> String {
        let mut parts: Vec<String> = self
            .visiting
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        parts.sort();
        parts.push(repeated.display().to_string());
        parts.join(" -> ")
    }
}

/// Extract the body between a block's opening marker and the next
/// `endblock`, scanning forward from the marker.
fn capture_block(template: &str, block: &Directive) -> Result<String, RenderError> {
    let open = find_marker(template, &block.raw).ok_or_else(|| RenderError::UnterminatedBlock {
        block: block.reference.clone(),
    })?;
    let start = open + block.raw.len();
    let end = template[start..]
        .find("endblock")
        .ok_or_else(|| RenderError::UnterminatedBlock {
            block: block.reference.clone(),
        })?;
    Ok(template[start..start + end].trim().to_string())
}

/// Find the first occurrence of a statement's text that is not a prefix of
/// a longer statement (so `block nav` never lands on `block navigation`).
fn find_marker(template: &str, raw: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(at) = template[from..].find(raw).map(|i| i + from) {
        let next = template[at + raw.len()..].chars().next();
        let extends_reference = matches!(
            next,
            Some(c) if c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '/'
        );
        if !extends_reference {
            return Some(at);
        }
        from = at + raw.len();
    }
    None
}

/// Join a directive reference onto the declaring file's directory
fn join_reference(base: Option<&Path>, reference: &str) -> String {
    match base {
        Some(dir) if !Path::new(reference).is_absolute() => {
            dir.join(reference).to_string_lossy().into_owned()
        }
        _ => reference.to_string(),
    }
}
