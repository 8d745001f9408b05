//! Script sources: where funscript text comes from.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use scriptsync_core::{Result, SyncError};
use tracing::{debug, info};

const SCRIPT_EXT: &str = "funscript";

fn is_script(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(SCRIPT_EXT))
}

fn unavailable(reason: impl Into<String>) -> SyncError {
    SyncError::SourceUnavailable {
        reason: reason.into(),
    }
}

#[async_trait]
pub trait ScriptSource: Send + Sync {
    /// Fetch the raw script text stored under `key`.
    async fn fetch(&self, key: &str) -> Result<String>;
}

/// Reads `.funscript` files (extension matched case-insensitively) below a
/// root directory.
///
/// When the requested file is missing, the first `.funscript` (by name) in the
/// same directory is used instead, so a script named after a different video
/// file still plays.
#[derive(Clone, Debug)]
pub struct FileScriptSource {
    root: PathBuf,
}

impl FileScriptSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> Result<PathBuf> {
        let rel = Path::new(key);
        if rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(unavailable(format!("script key '{key}' escapes the source root")));
        }
        if !is_script(rel) {
            return Err(unavailable(format!("'{key}' is not a .{SCRIPT_EXT} file")));
        }
        Ok(self.root.join(rel))
    }

    async fn sibling_script(dir: &Path) -> Result<Option<PathBuf>> {
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let mut candidates = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if is_script(&path) {
                candidates.push(path);
            }
        }
        candidates.sort();
        Ok(candidates.into_iter().next())
    }
}

#[async_trait]
impl ScriptSource for FileScriptSource {
    async fn fetch(&self, key: &str) -> Result<String> {
        let path = self.resolve(key)?;
        if tokio::fs::try_exists(&path).await? {
            debug!(path = %path.display(), "reading script");
            return Ok(tokio::fs::read_to_string(&path).await?);
        }

        let dir = path.parent().unwrap_or(&self.root);
        match Self::sibling_script(dir).await? {
            Some(fallback) => {
                info!(
                    requested = %path.display(),
                    using = %fallback.display(),
                    "script not found; using sibling script"
                );
                Ok(tokio::fs::read_to_string(&fallback).await?)
            }
            None => Err(unavailable(format!("no script found for '{key}'"))),
        }
    }
}
