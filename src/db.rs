use std::{
    ffi::OsString,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
    time::{Instant, SystemTime, UNIX_EPOCH},
};

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::{
    fs,
    sync::{Mutex, MutexGuard},
};

use crate::{config::StoreConfig, models::UrlDatabase};

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Store file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store file {} is unreadable: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

pub type DbResult<T> = Result<T, DatabaseError>;

/// Handle to the flat-file store.
///
/// The whole table lives in memory behind one mutex and is written back to a
/// single JSON file after every mutation. Holding the guard across the write
/// serializes read-modify-write-persist sequences, so no update is lost and
/// writes never land out of order.
#[derive(Clone)]
pub struct Database {
    path: Arc<PathBuf>,
    state: Arc<Mutex<UrlDatabase>>,
}

/// Database health status
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum DBHealthStatus {
    Healthy,
    Unhealthy,
}

/// Store information
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DbInfo {
    pub path: String,
    pub entries: usize,
    pub last_id: u64,
}

/// Complete store health check result
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseHealth {
    pub status: DBHealthStatus,
    pub response_time_ms: u64,
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_info: Option<DbInfo>,
}

impl Database {
    /// Load the store file, creating it when missing.
    ///
    /// An unreadable file is fatal unless `recover_on_corrupt` is set, in which
    /// case it is moved aside and an empty store takes its place.
    pub async fn open(config: &StoreConfig) -> DbResult<Self> {
        info!("Opening store file {}", config.path.display());

        let (state, needs_write) = match Self::read_file(&config.path).await {
            Ok(Some(state)) => {
                info!(
                    "Store loaded: {} short URLs, last id {}",
                    state.urls.len(),
                    state.last_id
                );
                (state, false)
            }
            Ok(None) => {
                info!("Store file not found, creating {}", config.path.display());
                (UrlDatabase::default(), true)
            }
            Err(e) => {
                error!("Failed to load store file: {}", e);
                if !config.recover_on_corrupt {
                    return Err(e);
                }

                Self::set_aside(&config.path).await;
                warn!("Starting with an empty store; previous entries are not available");
                (UrlDatabase::default(), true)
            }
        };

        let db = Database {
            path: Arc::new(config.path.clone()),
            state: Arc::new(Mutex::new(state)),
        };

        if needs_write {
            if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).await?;
            }
            let guard = db.lock().await;
            db.persist(&guard).await?;
        }

        Ok(db)
    }

    /// `Ok(None)` when the file does not exist
    async fn read_file(path: &Path) -> DbResult<Option<UrlDatabase>> {
        let raw = match fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(DatabaseError::Corrupt {
                    path: path.to_path_buf(),
                    source: Box::new(e),
                })
            }
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| DatabaseError::Corrupt {
                path: path.to_path_buf(),
                source: Box::new(e),
            })
    }

    async fn set_aside(path: &Path) {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let backup = suffixed(path, &format!(".corrupt-{}", stamp));

        match fs::rename(path, &backup).await {
            Ok(()) => warn!("Moved unreadable store file to {}", backup.display()),
            Err(e) => warn!("Could not move unreadable store file aside: {}", e),
        }
    }

    /// Exclusive access to the in-memory table
    pub async fn lock(&self) -> MutexGuard<'_, UrlDatabase> {
        self.state.lock().await
    }

    /// Rewrite the whole store file from `snapshot`.
    ///
    /// Callers pass the guarded state while still holding the lock. The data is
    /// written to a sibling temp file and renamed over the store file.
    pub async fn persist(&self, snapshot: &UrlDatabase) -> DbResult<()> {
        let json = serde_json::to_vec_pretty(snapshot)?;
        let tmp = suffixed(&self.path, ".tmp");

        fs::write(&tmp, &json).await?;
        fs::rename(&tmp, self.path.as_path()).await?;

        debug!(
            "Persisted {} short URLs ({} bytes) to {}",
            snapshot.urls.len(),
            json.len(),
            self.path.display()
        );
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn health_check(&self) -> DatabaseHealth {
        let start = Instant::now();
        let (entries, last_id) = {
            let state = self.lock().await;
            (state.urls.len(), state.last_id)
        };

        let (status, message) = match fs::metadata(self.path.as_path()).await {
            Ok(meta) if meta.is_file() => (DBHealthStatus::Healthy, None),
            Ok(_) => (
                DBHealthStatus::Unhealthy,
                Some("Store path is not a regular file".to_string()),
            ),
            Err(e) => (
                DBHealthStatus::Unhealthy,
                Some(format!("Store file is not accessible: {}", e)),
            ),
        };

        DatabaseHealth {
            status,
            response_time_ms: start.elapsed().as_millis() as u64,
            message,
            db_info: Some(DbInfo {
                path: self.path.display().to_string(),
                entries,
                last_id,
            }),
        }
    }
}

fn suffixed(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::ShortenedUrl;

    /// Store config pointing at a fresh, not yet existing file
    pub(crate) fn temp_store_config() -> StoreConfig {
        let dir = std::env::temp_dir().join(format!("shortener-test-{}", uuid::Uuid::new_v4()));
        StoreConfig {
            path: dir.join("urls.json"),
            recover_on_corrupt: false,
        }
    }

    #[tokio::test]
    async fn test_open_creates_missing_file() {
        let config = temp_store_config();

        let db = Database::open(&config).await.unwrap();

        let raw = std::fs::read_to_string(&config.path).unwrap();
        let on_disk: UrlDatabase = serde_json::from_str(&raw).unwrap();
        assert_eq!(on_disk, UrlDatabase::default());
        assert!(raw.contains("\"lastId\": 0"));
        assert_eq!(db.lock().await.urls.len(), 0);
    }

    #[tokio::test]
    async fn test_open_adopts_existing_file() {
        let config = temp_store_config();
        std::fs::create_dir_all(config.path.parent().unwrap()).unwrap();
        std::fs::write(
            &config.path,
            r#"{"lastId": 2, "urls": {"2": {"url": "https://example.com/", "createdAt": "2024-01-01T00:00:00.000Z", "visits": 4}}}"#,
        )
        .unwrap();

        let db = Database::open(&config).await.unwrap();

        let state = db.lock().await;
        assert_eq!(state.last_id, 2);
        assert_eq!(state.urls["2"].visits, 4);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_fatal_by_default() {
        let config = temp_store_config();
        std::fs::create_dir_all(config.path.parent().unwrap()).unwrap();
        std::fs::write(&config.path, "{ not json").unwrap();

        let err = Database::open(&config).await.err().unwrap();

        assert!(matches!(err, DatabaseError::Corrupt { .. }));
        // Untouched
        assert_eq!(std::fs::read_to_string(&config.path).unwrap(), "{ not json");
    }

    #[tokio::test]
    async fn test_foreign_json_file_is_corrupt() {
        let config = temp_store_config();
        std::fs::create_dir_all(config.path.parent().unwrap()).unwrap();
        let foreign = r#"{"data": {"keep": "me"}}"#;
        std::fs::write(&config.path, foreign).unwrap();

        let err = Database::open(&config).await.err().unwrap();

        assert!(matches!(err, DatabaseError::Corrupt { .. }));
        assert_eq!(std::fs::read_to_string(&config.path).unwrap(), foreign);
    }

    #[tokio::test]
    async fn test_corrupt_file_recovery_keeps_backup() {
        let mut config = temp_store_config();
        config.recover_on_corrupt = true;
        let dir = config.path.parent().unwrap().to_path_buf();
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(&config.path, "{ not json").unwrap();

        let db = Database::open(&config).await.unwrap();

        assert_eq!(*db.lock().await, UrlDatabase::default());
        let backups: Vec<_> = std::fs::read_dir(&dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".corrupt-"))
            .collect();
        assert_eq!(backups.len(), 1);
        assert_eq!(
            std::fs::read_to_string(backups[0].path()).unwrap(),
            "{ not json"
        );
        let on_disk: UrlDatabase =
            serde_json::from_str(&std::fs::read_to_string(&config.path).unwrap()).unwrap();
        assert_eq!(on_disk, UrlDatabase::default());
    }

    #[tokio::test]
    async fn test_persist_rewrites_whole_file() {
        let config = temp_store_config();
        let db = Database::open(&config).await.unwrap();

        {
            let mut state = db.lock().await;
            state.last_id = 1;
            state
                .urls
                .insert("1".to_string(), ShortenedUrl::new("https://example.com/a"));
            db.persist(&state).await.unwrap();
        }

        let reopened = Database::open(&config).await.unwrap();
        let state = reopened.lock().await;
        assert_eq!(state.last_id, 1);
        assert_eq!(state.urls["1"].url, "https://example.com/a");
        assert!(!suffixed(&config.path, ".tmp").exists());
    }

    #[tokio::test]
    async fn test_health_check() {
        let config = temp_store_config();
        let db = Database::open(&config).await.unwrap();

        let health = db.health_check().await;
        assert_eq!(health.status, DBHealthStatus::Healthy);
        assert_eq!(health.db_info.as_ref().unwrap().entries, 0);

        std::fs::remove_file(&config.path).unwrap();
        let health = db.health_check().await;
        assert_eq!(health.status, DBHealthStatus::Unhealthy);
        assert!(health.message.is_some());
    }
}
