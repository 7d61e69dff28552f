//! Discovery of ggml model files on disk.
//!
//! Hosts pick a model by index from this list (see the `"model"` pipeline
//! parameter), so the order must be stable across calls: directories are
//! searched in a fixed order and entries within each are sorted by name.

use std::env;
use std::path::PathBuf;

use tracing::debug;

/// Environment variable overriding the model search path. Accepts multiple
/// directories separated like `PATH`.
pub const MODELS_PATH_VAR: &str = "SCRIBA_MODELS_PATH";

const MODEL_EXTENSION: &str = "bin";

/// Directories searched for models, in priority order: the override
/// variable's entries, then the per-user config dir, then the per-user data
/// dir.
pub fn search_dirs() -> Vec<PathBuf> {
    let mut out = Vec::new();
    if let Some(paths) = env::var_os(MODELS_PATH_VAR) {
        out.extend(env::split_paths(&paths));
    }
    if let Some(config) = dirs::config_dir() {
        out.push(config.join("scriba").join("models"));
    }
    if let Some(data) = dirs::data_dir() {
        out.push(data.join("scriba").join("models"));
    }
    out
}

/// All `.bin` model files under `search_dirs()`, in a stable order.
/// Missing directories and unreadable entries are skipped silently.
pub fn discover() -> Vec<PathBuf> {
    let mut models = Vec::new();
    for dir in search_dirs() {
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(_) => continue,
        };
        let mut found: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().is_some_and(|ext| ext == MODEL_EXTENSION)
            })
            .collect();
        found.sort();
        debug!(dir = %dir.display(), count = found.len(), "scanned model directory");
        models.extend(found);
    }
    models
}
