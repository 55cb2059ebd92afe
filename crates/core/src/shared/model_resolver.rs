use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::constants::APP_DIR_NAME;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("model file not found: {0}")]
    ExplicitMissing(PathBuf),
    #[error("model {name} not found; searched: {}", format_searched(.searched))]
    NotFound { name: String, searched: Vec<PathBuf> },
    #[error("could not determine cache directory")]
    NoCacheDir,
}

fn format_searched(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Resolve a detector model file by name.
///
/// Resolution order:
/// 1. Explicit path (an error if given but missing)
/// 2. Bundled directory (development checkouts / pre-packaged installs)
/// 3. User cache directory (platform-specific)
pub fn resolve(
    name: &str,
    explicit: Option<&Path>,
    bundled_dir: Option<&Path>,
) -> Result<PathBuf, ModelResolveError> {
    resolve_in(name, explicit, &search_dirs(bundled_dir))
}

/// Directories [`resolve`] searches, in order.
pub fn search_dirs(bundled_dir: Option<&Path>) -> Vec<PathBuf> {
    let mut searched = Vec::new();
    if let Some(dir) = bundled_dir {
        searched.push(dir.to_path_buf());
    }
    if let Ok(dir) = model_cache_dir() {
        searched.push(dir);
    }
    searched
}

/// Same as [`resolve`] with the directory search list supplied by the caller.
pub fn resolve_in(
    name: &str,
    explicit: Option<&Path>,
    search_dirs: &[PathBuf],
) -> Result<PathBuf, ModelResolveError> {
    if let Some(path) = explicit {
        return if path.is_file() {
            Ok(path.to_path_buf())
        } else {
            Err(ModelResolveError::ExplicitMissing(path.to_path_buf()))
        };
    }

    let candidates: Vec<PathBuf> = search_dirs.iter().map(|d| d.join(name)).collect();
    if let Some(found) = candidates.iter().find(|p| p.is_file()) {
        log::debug!("Resolved model {name} at {}", found.display());
        return Ok(found.clone());
    }

    Err(ModelResolveError::NotFound {
        name: name.to_string(),
        searched: candidates,
    })
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/FaceRange/models/`
/// - Linux: `$XDG_CACHE_HOME/FaceRange/models/` or `~/.cache/FaceRange/models/`
/// - Windows: `%LOCALAPPDATA%/FaceRange/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    {
        dirs::data_dir()
            .map(|d| d.join(APP_DIR_NAME).join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::cache_dir()
            .map(|d| d.join(APP_DIR_NAME).join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
}
