//! Persisted presence snapshot.
//!
//! Written to a sibling `.tmp` file and renamed over the target, so an
//! interrupted write never leaves a partial snapshot behind.

use crate::aggregate::PresenceLog;
use crate::error::ScrapeResult;
use std::path::{Path, PathBuf};

/// Load a snapshot. A missing file is an empty log.
pub fn load(path: &Path) -> ScrapeResult<PresenceLog> {
    if !path.exists() {
        tracing::debug!("no presence snapshot at {}", path.display());
        return Ok(PresenceLog::new());
    }
    let bytes = std::fs::read(path)?;
    let log: PresenceLog = serde_json::from_slice(&bytes)?;
    tracing::info!(
        entities = log.len(),
        "loaded presence snapshot from {}",
        path.display()
    );
    Ok(log)
}

/// Atomically replace the snapshot with `log`.
pub fn persist(path: &Path, log: &PresenceLog) -> ScrapeResult<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let tmp = tmp_path(path);
    std::fs::write(&tmp, serde_json::to_vec_pretty(log)?)?;
    std::fs::rename(&tmp, path)?;
    tracing::debug!(entities = log.len(), "persisted presence snapshot");
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "presence.json".into());
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScrapeError;
    use tempfile::TempDir;

    #[test]
    fn test_missing_snapshot_is_empty() {
        let dir = TempDir::new().unwrap();
        let log = load(&dir.path().join("absent.json")).unwrap();
        assert!(log.is_empty());
    }

    #[test]
    fn test_persist_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("active.json");

        let mut log = PresenceLog::new();
        log.observe("222", 20);
        log.observe("111", 10);
        log.observe("222", 30);
        persist(&path, &log).unwrap();

        assert!(!tmp_path(&path).exists());
        let loaded = load(&path).unwrap();
        assert_eq!(loaded, log);
        assert_eq!(loaded.0.keys().collect::<Vec<_>>(), vec!["222", "111"]);
    }

    #[test]
    fn test_persist_replaces_previous() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("active.json");

        let mut log = PresenceLog::new();
        log.observe("111", 10);
        persist(&path, &log).unwrap();
        log.observe("111", 11);
        persist(&path, &log).unwrap();

        assert_eq!(load(&path).unwrap().timestamps("111"), &[10, 11]);
    }

    #[test]
    fn test_corrupt_snapshot_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("active.json");
        std::fs::write(&path, "[1, 2").unwrap();
        assert!(matches!(load(&path), Err(ScrapeError::Json(_))));
    }
}
