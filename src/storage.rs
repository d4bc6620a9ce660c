//! Local persistence: JSON cache blobs and the last-update preference.
//!
//! Every failure here is non-fatal. `load` treats any problem as "nothing
//! cached" and `save` only logs, so a broken disk never stops the network
//! path from delivering fresh data.
use crate::error::CacheError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const WORLD_STATISTICS_KEY: &str = "worldStatistics.json";
pub const COUNTRIES_STATISTICS_KEY: &str = "countriesStatistics.json";
const COUNTRIES_TIMESERIES_SUFFIX: &str = "countriesTimeseries.json";

const PREFERENCES_FILE: &str = "preferences.json";
const LAST_UPDATE_KEY: &str = "LastUpdate";

/// Cache key for one country's time series, e.g. `DEcountriesTimeseries.json`.
pub fn timeseries_key(country_code: &str) -> String {
    format!("{}{}", country_code, COUNTRIES_TIMESERIES_SUFFIX)
}

/// Writable per-user cache directory backed by an optional read-only seed
/// directory that ships with the application.
#[derive(Debug, Clone)]
pub struct CacheStore {
    cache_dir: PathBuf,
    seed_dir: Option<PathBuf>,
}

impl CacheStore {
    pub fn new(cache_dir: impl Into<PathBuf>, seed_dir: Option<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            seed_dir,
        }
    }

    /// Read `key`, falling back to the seed directory. `None` on any failure.
    pub fn load<T: Serialize + DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.try_load(key) {
            Ok(v) => {
                log::debug!("cache hit for {}", key);
                Some(v)
            }
            Err(CacheError::Missing(_)) => {
                log::debug!("cache miss for {}", key);
                None
            }
            Err(e) => {
                log::warn!("ignoring cache entry {}: {}", key, e);
                None
            }
        }
    }

    /// Like [`CacheStore::load`] but reports why nothing was returned.
    ///
    /// A value decoded from either location is written back to the cache
    /// directory, so a seed entry is copied on first use.
    pub fn try_load<T: Serialize + DeserializeOwned>(&self, key: &str) -> Result<T, CacheError> {
        let bytes = match read_if_exists(&self.cache_dir.join(key))? {
            Some(b) => b,
            None => {
                let seeded = match &self.seed_dir {
                    Some(dir) => read_if_exists(&dir.join(key))?,
                    None => None,
                };
                seeded.ok_or_else(|| CacheError::Missing(key.to_string()))?
            }
        };
        let value: T = serde_json::from_slice(&bytes).map_err(CacheError::Decode)?;
        self.save(key, &value);
        Ok(value)
    }

    /// Overwrite `key` with `value`. Failures are logged and dropped.
    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        if let Err(e) = self.try_save(key, value) {
            log::warn!("could not cache {}: {}", key, e);
        }
    }

    pub fn try_save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let data = serde_json::to_vec(value).map_err(CacheError::Encode)?;
        fs::create_dir_all(&self.cache_dir)?;
        fs::write(self.cache_dir.join(key), data)?;
        Ok(())
    }
}

fn read_if_exists(path: &Path) -> Result<Option<Vec<u8>>, CacheError> {
    match fs::read(path) {
        Ok(b) => Ok(Some(b)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(CacheError::Io(e)),
    }
}

/// Small string key-value store kept next to the cache blobs.
#[derive(Debug, Clone)]
pub struct Preferences {
    path: PathBuf,
}

impl Preferences {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(PREFERENCES_FILE),
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.read_all().ok()?.remove(key)
    }

    pub fn set(&self, key: &str, value: &str) {
        let mut map = self.read_all().unwrap_or_default();
        map.insert(key.to_string(), value.to_string());
        if let Err(e) = self.write_all(&map) {
            log::warn!("could not persist preference {}: {}", key, e);
        }
    }

    /// Persisted last-update label, or an empty string if never set.
    pub fn last_update(&self) -> String {
        self.get(LAST_UPDATE_KEY).unwrap_or_default()
    }

    pub fn set_last_update(&self, label: &str) {
        self.set(LAST_UPDATE_KEY, label);
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, CacheError> {
        let bytes = read_if_exists(&self.path)?
            .ok_or_else(|| CacheError::Missing(PREFERENCES_FILE.to_string()))?;
        serde_json::from_slice(&bytes).map_err(CacheError::Decode)
    }

    fn write_all(&self, map: &BTreeMap<String, String>) -> Result<(), CacheError> {
        let data = serde_json::to_vec_pretty(map).map_err(CacheError::Encode)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, data)?;
        Ok(())
    }
}
