use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::oracle::Provider;

pub fn get_root_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("konspekt")
}

/// Per-URL cache directory, keyed by a hash of the locator.
pub fn get_cache_dir(url: &str) -> PathBuf {
    let mut hasher = DefaultHasher::new();
    url.hash(&mut hasher);
    get_root_cache_dir().join(hasher.finish().to_string())
}

pub fn get_transcript_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join("transcript.json")
}

pub fn get_outline_path(cache_dir: &Path, provider: &Provider) -> PathBuf {
    cache_dir.join(format!("outline_{}.json", provider.slug()))
}

pub fn get_show_notes_path(cache_dir: &Path, provider: &Provider) -> PathBuf {
    cache_dir.join(format!("notes_{}.json", provider.slug()))
}

pub fn get_quiz_path(cache_dir: &Path, provider: &Provider) -> PathBuf {
    cache_dir.join(format!("quiz_{}.json", provider.slug()))
}

/// Opportunistic cache read. Anything short of a well-formed entry is a
/// miss, never an error for the pipeline.
pub async fn load_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let raw = tokio::fs::read_to_string(path).await.ok()?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "ignoring unreadable cache entry");
            None
        }
    }
}

/// Opportunistic cache write; a failure only skips the optimization.
pub async fn store_json<T: Serialize>(path: &Path, value: &T) {
    let Ok(pretty) = serde_json::to_string_pretty(value) else {
        return;
    };
    if let Some(parent) = path.parent() {
        if let Err(err) = tokio::fs::create_dir_all(parent).await {
            tracing::debug!(path = %path.display(), error = %err, "cache dir creation failed, skipping write");
            return;
        }
    }
    if let Err(err) = tokio::fs::write(path, &pretty).await {
        tracing::debug!(path = %path.display(), error = %err, "cache write failed, skipping");
    }
}
