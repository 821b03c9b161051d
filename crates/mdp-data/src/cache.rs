//! Day-keyed persistent universe cache.
//!
//! Layout: `{cache_dir}/universe_YYYY-MM-DD.json`, one snapshot per calendar
//! date. Writes are atomic: serialize to `.json.tmp`, then rename into
//! place, so a reader never observes a partially written snapshot.

use crate::error::{DataError, Result};
use chrono::NaiveDate;
use mdp_core::UniverseSnapshot;
use std::fs;
use std::path::{Path, PathBuf};

const FILE_PREFIX: &str = "universe_";
const FILE_SUFFIX: &str = ".json";

/// Persistent store of discovered universe snapshots.
pub struct UniverseCache {
    cache_dir: PathBuf,
}

impl UniverseCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn snapshot_path(&self, date: NaiveDate) -> PathBuf {
        self.cache_dir
            .join(format!("{FILE_PREFIX}{date}{FILE_SUFFIX}"))
    }

    /// Snapshot for the exact date, if present. No fuzzy matching.
    pub fn read(&self, date: NaiveDate) -> Result<Option<UniverseSnapshot>> {
        let path = self.snapshot_path(date);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)
            .map_err(|e| DataError::CacheIo(format!("{}: {e}", path.display())))?;
        let snapshot: UniverseSnapshot = serde_json::from_str(&content)
            .map_err(|e| DataError::CacheCorrupt(format!("{}: {e}", path.display())))?;
        Ok(Some(snapshot))
    }

    /// Most recent snapshot with date <= the given date.
    ///
    /// Used as the fallback when the live fetch fails. Entries that cannot
    /// be dated or decoded are skipped with a warning so one corrupt file
    /// does not block the fallback.
    pub fn read_latest_before_or_on(&self, date: NaiveDate) -> Result<Option<UniverseSnapshot>> {
        if !self.cache_dir.exists() {
            return Ok(None);
        }
        let mut dates: Vec<NaiveDate> = Vec::new();
        for entry in fs::read_dir(&self.cache_dir).map_err(|e| DataError::CacheIo(e.to_string()))? {
            let entry = entry.map_err(|e| DataError::CacheIo(e.to_string()))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Some(entry_date) = parse_snapshot_date(name) else {
                continue;
            };
            if entry_date <= date {
                dates.push(entry_date);
            }
        }
        dates.sort_unstable();

        // Newest first; skip corrupt entries rather than fail the fallback.
        for candidate in dates.into_iter().rev() {
            match self.read(candidate) {
                Ok(Some(snapshot)) => return Ok(Some(snapshot)),
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(date = %candidate, error = %e, "skipping unreadable cache snapshot");
                }
            }
        }
        Ok(None)
    }

    /// Persist a snapshot under its own date, replacing any prior snapshot
    /// for that date.
    pub fn write(&self, snapshot: &UniverseSnapshot) -> Result<()> {
        fs::create_dir_all(&self.cache_dir)
            .map_err(|e| DataError::CacheIo(format!("create cache dir: {e}")))?;

        let path = self.snapshot_path(snapshot.as_of);
        let tmp_path = path.with_extension("json.tmp");
        let payload = serde_json::to_string_pretty(snapshot)
            .map_err(|e| DataError::CacheIo(format!("serialize snapshot: {e}")))?;

        fs::write(&tmp_path, payload)
            .map_err(|e| DataError::CacheIo(format!("write {}: {e}", tmp_path.display())))?;
        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            DataError::CacheIo(format!("atomic rename failed: {e}"))
        })?;

        tracing::debug!(path = %path.display(), count = snapshot.len(), "universe snapshot cached");
        Ok(())
    }
}

fn parse_snapshot_date(file_name: &str) -> Option<NaiveDate> {
    let stem = file_name
        .strip_prefix(FILE_PREFIX)?
        .strip_suffix(FILE_SUFFIX)?;
    stem.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdp_core::{Exchange, InstrumentRecord};

    fn snapshot(date: &str, symbols: &[&str]) -> UniverseSnapshot {
        UniverseSnapshot::new(
            date.parse().unwrap(),
            symbols
                .iter()
                .map(|s| InstrumentRecord::new(*s, Exchange::Hsx))
                .collect(),
        )
    }

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let cache = UniverseCache::new(dir.path());

        let snap = snapshot("2026-08-07", &["VNM", "FPT"]);
        cache.write(&snap).unwrap();

        let loaded = cache.read(snap.as_of).unwrap().unwrap();
        assert_eq!(loaded, snap);
    }

    #[test]
    fn read_absent_date_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let cache = UniverseCache::new(dir.path());
        assert!(cache.read("2026-08-07".parse().unwrap()).unwrap().is_none());
    }

    #[test]
    fn same_date_write_replaces_prior_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let cache = UniverseCache::new(dir.path());

        cache.write(&snapshot("2026-08-07", &["VNM"])).unwrap();
        cache.write(&snapshot("2026-08-07", &["VNM", "FPT"])).unwrap();

        let loaded = cache.read("2026-08-07".parse().unwrap()).unwrap().unwrap();
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn latest_before_or_on_picks_most_recent() {
        let dir = tempfile::tempdir().unwrap();
        let cache = UniverseCache::new(dir.path());

        cache.write(&snapshot("2026-08-04", &["AAA"])).unwrap();
        cache.write(&snapshot("2026-08-06", &["BBB"])).unwrap();
        cache.write(&snapshot("2026-08-08", &["CCC"])).unwrap();

        let loaded = cache
            .read_latest_before_or_on("2026-08-07".parse().unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(loaded.as_of, "2026-08-06".parse().unwrap());

        assert!(cache
            .read_latest_before_or_on("2026-08-03".parse().unwrap())
            .unwrap()
            .is_none());
    }

    #[test]
    fn corrupt_snapshot_is_error_on_exact_read_but_skipped_on_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let cache = UniverseCache::new(dir.path());

        cache.write(&snapshot("2026-08-05", &["AAA"])).unwrap();
        fs::write(dir.path().join("universe_2026-08-07.json"), "not json").unwrap();

        assert!(matches!(
            cache.read("2026-08-07".parse().unwrap()),
            Err(DataError::CacheCorrupt(_))
        ));

        // Fallback skips the corrupt entry and serves the older snapshot.
        let loaded = cache
            .read_latest_before_or_on("2026-08-07".parse().unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(loaded.as_of, "2026-08-05".parse().unwrap());
    }

    #[test]
    fn foreign_files_in_cache_dir_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let cache = UniverseCache::new(dir.path());

        fs::write(dir.path().join("notes.txt"), "hi").unwrap();
        cache.write(&snapshot("2026-08-06", &["AAA"])).unwrap();

        let loaded = cache
            .read_latest_before_or_on("2026-08-07".parse().unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(loaded.as_of, "2026-08-06".parse().unwrap());
    }
}
