//! Process-wide memoization of path resolution and file content
//!
//! Both caches are pure memoizations of idempotent lookups, so they stay
//! process-wide behind a read-mostly lock. Disabling the cache clears both
//! maps; there is no partial eviction.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{OnceLock, RwLock};

static ENABLED: AtomicBool = AtomicBool::new(true);

#[derive(Default)]
struct Store {
    /// Requested reference string -> resolved absolute path
    paths: HashMap<String, PathBuf>,
    /// Resolved path -> trimmed file content
    contents: HashMap<PathBuf, String>,
}

fn store() -> &'static RwLock<Store> {
    static STORE: OnceLock<RwLock<Store>> = OnceLock::new();
    STORE.get_or_init(|| RwLock::new(Store::default()))
}

/// Whether the caches are currently consulted
pub fn enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

/// Toggle caching. Disabling clears both caches so re-enabling starts fresh.
pub fn set_enabled(on: bool) {
    ENABLED.store(on, Ordering::Relaxed);
    if !on {
        clear();
    }
}

/// Drop every cached path and content entry
pub fn clear() {
    let mut guard = store().write().unwrap_or_else(|e| e.into_inner());
    guard.paths.clear();
    guard.contents.clear();
}

pub fn cached_path(reference: &str) -> Option<PathBuf> {
    if !enabled() {
        return None;
    }
    let guard = store().read().unwrap_or_else(|e| e.into_inner());
    guard.paths.get(reference).cloned()
}

pub fn store_path(reference: &str, path: &Path) {
    if !enabled() {
        return;
    }
    let mut guard = store().write().unwrap_or_else(|e| e.into_inner());
    guard.paths.insert(reference.to_string(), path.to_path_buf());
}

pub fn cached_content(path: &Path) -> Option<String> {
    if !enabled() {
        return None;
    }
    let guard = store().read().unwrap_or_else(|e| e.into_inner());
    guard.contents.get(path).cloned()
}

pub fn store_content(path: &Path, content: &str) {
    if !enabled() {
        return;
    }
    let mut guard = store().write().unwrap_or_else(|e| e.into_inner());
    guard.contents.insert(path.to_path_buf(), content.to_string());
}
