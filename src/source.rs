//! Template file lookup and loading
//!
//! A logical reference resolves to the first existing candidate of `R`,
//! `R.ode`, `R.odesza`. Resolution results and trimmed file contents are
//! memoized through [`crate::cache`].

use std::path::{Path, PathBuf};

use crate::cache;
use crate::RenderError;

/// Extension suffixes tried after the exact reference, in order
const SUFFIXES: [&str; 2] = [".ode", ".odesza"];

/// Resolve a template reference to a concrete file path.
///
/// Relative references are resolved against the current working directory;
/// callers pre-join a base directory for references that came out of
/// `extends`/`include` directives.
pub fn resolve(reference: &str) -> Result<PathBuf, RenderError> {
    if reference.trim().is_empty() || reference.contains('\0') {
        return Err(RenderError::InvalidReference {
            reference: reference.to_string(),
        });
    }

    if let Some(hit) = cache::cached_path(reference) {
        return Ok(hit);
    }

    let requested = Path::new(reference);
    let absolute = if requested.is_absolute() {
        requested.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|source| RenderError::Io {
                path: requested.to_path_buf(),
                source,
            })?
            .join(requested)
    };

    let mut candidates = Vec::with_capacity(1 + SUFFIXES.len());
    candidates.push(absolute.clone());
    for suffix in SUFFIXES {
        candidates.push(PathBuf::from(format!("{}{}", absolute.display(), suffix)));
    }

    for candidate in candidates {
        if candidate.is_file() {
            cache::store_path(reference, &candidate);
            return Ok(candidate);
        }
    }

    Err(RenderError::NotFound {
        reference: reference.to_string(),
    })
}

/// Load a resolved template file, trimmed of surrounding whitespace
pub fn load(path: &Path) -> Result<String, RenderError> {
    if let Some(hit) = cache::cached_content(path) {
        return Ok(hit);
    }

    let text = std::fs::read_to_string(path).map_err(|source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let text = text.trim().to_string();
    cache::store_content(path, &text);
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("odesza-source-{}-{}", std::process::id(), name));
        fs::create_dir_all(&dir).expect("Should create scratch dir");
        dir
    }

    #[test]
    fn test_resolve_prefers_exact_path() {
        let dir = scratch_dir("exact");
        let exact = dir.join("page");
        fs::write(&exact, "exact").unwrap();
        fs::write(dir.join("page.ode"), "suffixed").unwrap();

        let resolved = resolve(exact.to_str().unwrap()).expect("Should resolve");
        assert_eq!(resolved, exact);
    }

    #[test]
    fn test_resolve_tries_ode_suffix() {
        let dir = scratch_dir("ode");
        fs::write(dir.join("greet.ode"), "hi").unwrap();

        let reference = dir.join("greet");
        let resolved = resolve(reference.to_str().unwrap()).expect("Should resolve");
        assert_eq!(resolved, dir.join("greet.ode"));
    }

    #[test]
    fn test_resolve_tries_odesza_suffix() {
        let dir = scratch_dir("odesza");
        fs::write(dir.join("greet.odesza"), "hi").unwrap();

        let reference = dir.join("greet");
        let resolved = resolve(reference.to_str().unwrap()).expect("Should resolve");
        assert_eq!(resolved, dir.join("greet.odesza"));
    }

    #[test]
    fn test_resolve_missing_is_not_found() {
        let dir = scratch_dir("missing");
        let reference = dir.join("nope");
        let err = resolve(reference.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, RenderError::NotFound { .. }));
    }

    #[test]
    fn test_resolve_rejects_empty_reference() {
        assert!(matches!(
            resolve(""),
            Err(RenderError::InvalidReference { .. })
        ));
        assert!(matches!(
            resolve("   "),
            Err(RenderError::InvalidReference { .. })
        ));
    }

    #[test]
    fn test_load_trims_content() {
        let dir = scratch_dir("load");
        let path = dir.join("padded.ode");
        fs::write(&path, "\n  hello ${name}  \n\n").unwrap();

        let text = load(&path).expect("Should load");
        assert_eq!(text, "hello ${name}");
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = scratch_dir("io");
        let err = load(&dir.join("ghost.ode")).unwrap_err();
        assert!(matches!(err, RenderError::Io { .. }));
    }
}
