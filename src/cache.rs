// File-backed memoization for provider responses.
//
// One JSON file per key under the cache directory, each wrapping the payload
// with its storage timestamp. Anything unreadable, unparseable, or older
// than the caller's TTL is a miss; the caller falls through to the network.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Serialize, Deserialize)]
struct Entry {
    stored_at: DateTime<Utc>,
    payload: serde_json::Value,
}

/// A cache rooted at a directory, or disabled entirely.
#[derive(Debug, Clone)]
pub struct Cache {
    dir: Option<PathBuf>,
}

impl Cache {
    pub fn new(dir: PathBuf) -> Self {
        Cache { dir: Some(dir) }
    }

    /// A cache that never hits and never stores.
    pub fn disabled() -> Self {
        Cache { dir: None }
    }

    /// The platform cache directory for this application, or a disabled
    /// cache when no home directory can be determined.
    pub fn open_default() -> Self {
        match ProjectDirs::from("", "", "rosterbot") {
            Some(dirs) => Cache::new(dirs.cache_dir().to_path_buf()),
            None => {
                warn!("no cache directory available; response caching disabled");
                Cache::disabled()
            }
        }
    }

    /// Fetch a value stored under `key` if it is younger than `ttl`.
    pub fn get<T: DeserializeOwned>(&self, key: &str, ttl: Duration) -> Option<T> {
        let path = self.path_for(key)?;
        let raw = fs::read_to_string(&path).ok()?;

        let entry: Entry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key, error = %e, "discarding corrupt cache entry");
                return None;
            }
        };

        if Utc::now() - entry.stored_at > ttl {
            debug!(key, "cache entry expired");
            return None;
        }

        match serde_json::from_value(entry.payload) {
            Ok(value) => {
                debug!(key, "cache hit");
                Some(value)
            }
            Err(e) => {
                warn!(key, error = %e, "cache entry no longer deserializes");
                None
            }
        }
    }

    /// Store a value under `key`. Failures are logged and swallowed; the
    /// cache is an optimization, never a correctness dependency.
    pub fn put<T: Serialize>(&self, key: &str, value: &T) {
        let Some(path) = self.path_for(key) else {
            return;
        };

        let payload = match serde_json::to_value(value) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key, error = %e, "failed to serialize cache payload");
                return;
            }
        };

        let entry = Entry {
            stored_at: Utc::now(),
            payload,
        };

        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!(key, error = %e, "failed to create cache directory");
                return;
            }
        }

        match serde_json::to_string(&entry) {
            Ok(serialized) => {
                if let Err(e) = fs::write(&path, serialized) {
                    warn!(key, error = %e, "failed to write cache entry");
                }
            }
            Err(e) => warn!(key, error = %e, "failed to serialize cache entry"),
        }
    }

    fn path_for(&self, key: &str) -> Option<PathBuf> {
        self.dir.as_ref().map(|dir| dir.join(format!("{key}.json")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_values() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = Cache::new(tmp.path().to_path_buf());

        cache.put("answer", &vec![1u32, 2, 3]);
        let hit: Option<Vec<u32>> = cache.get("answer", Duration::hours(1));
        assert_eq!(hit, Some(vec![1, 2, 3]));
    }

    #[test]
    fn misses_unknown_keys() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = Cache::new(tmp.path().to_path_buf());
        let miss: Option<String> = cache.get("nothing", Duration::hours(1));
        assert!(miss.is_none());
    }

    #[test]
    fn expired_entries_miss() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = Cache::new(tmp.path().to_path_buf());
        cache.put("stale", &"value".to_string());

        let miss: Option<String> = cache.get("stale", Duration::seconds(-1));
        assert!(miss.is_none());
    }

    #[test]
    fn corrupt_entries_are_treated_as_misses() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = Cache::new(tmp.path().to_path_buf());
        std::fs::write(tmp.path().join("bad.json"), "not json at all").unwrap();

        let miss: Option<String> = cache.get("bad", Duration::hours(1));
        assert!(miss.is_none());
    }

    #[test]
    fn disabled_cache_never_hits() {
        let cache = Cache::disabled();
        cache.put("key", &42u32);
        let miss: Option<u32> = cache.get("key", Duration::hours(1));
        assert!(miss.is_none());
    }

    #[test]
    fn round_trips_model_with_unset_optionals() {
        use crate::models::{Player, PlayerValuation, Position};

        let tmp = tempfile::tempdir().unwrap();
        let cache = Cache::new(tmp.path().to_path_buf());

        let player = Player {
            guid: "p1".to_string(),
            first_name: "Free".to_string(),
            last_name: "Agent".to_string(),
            team: None,
            position: Position::TightEnd,
            number: None,
            bye_week: None,
            status: None,
            injury_status: None,
            dynasty: PlayerValuation::default(),
            redraft: PlayerValuation::single("ktc", 0.5, Some(0.1)),
        };

        cache.put("player", &player);
        let hit: Player = cache.get("player", Duration::hours(1)).unwrap();
        assert_eq!(hit.guid, "p1");
        assert!(hit.team.is_none());
        assert!(hit.status.is_none());
        assert_eq!(hit.redraft, player.redraft);
    }
}
