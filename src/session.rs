//! Keeps the CLI's records between runs in a single JSON file.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::db::{GrowStore, Snapshot};

/// Reads the store saved at `path`. A missing or empty file gives an empty store.
pub fn load(path: &Path) -> Result<GrowStore> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no session file yet");
            return Ok(GrowStore::new());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("reading session file {}", path.display()))
        }
    };
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(GrowStore::new());
    }
    let snapshot: Snapshot = serde_json::from_slice(&bytes)
        .with_context(|| format!("parsing session file {}", path.display()))?;
    let store = GrowStore::from_snapshot(snapshot)
        .with_context(|| format!("checking records in {}", path.display()))?;
    Ok(store)
}

pub fn save(path: &Path, store: &GrowStore) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(store)?;
    std::fs::write(path, json)
        .with_context(|| format!("writing session file {}", path.display()))?;
    info!(path = %path.display(), "session saved");
    Ok(())
}
