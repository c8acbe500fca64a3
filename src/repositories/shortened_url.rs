// src/repositories/shortened_url.rs - Data access
use async_trait::async_trait;
use chrono::Utc;
use log::{debug, error};

#[cfg(test)]
use mockall::automock;

use crate::db::Database;
use crate::errors::RepositoryError;
use crate::models::{RecordedVisit, ShortenedUrl};
use crate::utils::id_generator;

type Result<T> = std::result::Result<T, RepositoryError>;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ShortenedUrlRepositoryTrait {
    /// Assigns the next sequential short code to `url` and persists the store
    ///
    /// ### Returns
    /// * `Result<(String, ShortenedUrl)>` - The assigned code and the stored entry
    ///
    /// ### Errors
    /// * `RepositoryError::Database` - If the store file cannot be written; the entry is not kept
    /// * `RepositoryError::InvalidData` - If the counter is exhausted
    async fn insert_generated(&self, url: &str) -> Result<(String, ShortenedUrl)>;

    /// Stores `url` under a caller-chosen alias and persists the store
    ///
    /// ### Errors
    /// * `RepositoryError::Conflict` - If the alias is already taken or is a reserved
    ///   route segment; nothing changes
    /// * `RepositoryError::Database` - If the store file cannot be written; the entry is not kept
    async fn insert_with_alias(&self, alias: &str, url: &str) -> Result<ShortenedUrl>;

    /// Finds a shortened URL by its short code without touching it
    async fn find_by_code(&self, code: &str) -> Result<Option<ShortenedUrl>>;

    /// Counts a visit on `code` and persists the store
    ///
    /// ### Returns
    /// * `None` - If the code is unknown
    /// * `Some(RecordedVisit)` - The updated entry, plus the outcome of the write.
    ///   A failed write leaves the visit counted in memory only.
    async fn record_visit(&self, code: &str) -> Option<RecordedVisit>;
}

pub struct ShortenedUrlRepository {
    db: Database,
}

impl ShortenedUrlRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ShortenedUrlRepositoryTrait for ShortenedUrlRepository {
    async fn insert_generated(&self, url: &str) -> Result<(String, ShortenedUrl)> {
        let mut guard = self.db.lock().await;
        let state = &mut *guard;

        let code = id_generator::next_sequential_code(&mut state.last_id, |c| {
            state.urls.contains_key(c) || id_generator::is_reserved(c)
        })
        .ok_or_else(|| RepositoryError::InvalidData("Short code counter exhausted".to_string()))?;

        let entry = ShortenedUrl::new(url);
        state.urls.insert(code.clone(), entry.clone());

        if let Err(e) = self.db.persist(state).await {
            error!("Failed to persist new short URL '{}': {}", code, e);
            // The counter stays advanced; only the entry is rolled back
            state.urls.remove(&code);
            return Err(e.into());
        }

        debug!("Stored '{}' -> '{}' (last id {})", code, url, state.last_id);
        Ok((code, entry))
    }

    async fn insert_with_alias(&self, alias: &str, url: &str) -> Result<ShortenedUrl> {
        let mut guard = self.db.lock().await;

        if guard.urls.contains_key(alias) || id_generator::is_reserved(alias) {
            return Err(RepositoryError::Conflict(
                "Custom alias already in use".to_string(),
            ));
        }

        let entry = ShortenedUrl::new(url);
        guard.urls.insert(alias.to_string(), entry.clone());

        if let Err(e) = self.db.persist(&guard).await {
            error!("Failed to persist custom alias '{}': {}", alias, e);
            guard.urls.remove(alias);
            return Err(e.into());
        }

        debug!("Stored custom alias '{}' -> '{}'", alias, url);
        Ok(entry)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<ShortenedUrl>> {
        Ok(self.db.lock().await.urls.get(code).cloned())
    }

    async fn record_visit(&self, code: &str) -> Option<RecordedVisit> {
        let mut guard = self.db.lock().await;

        let entry = guard.urls.get_mut(code)?;
        entry.record_visit(Utc::now());
        let entry = entry.clone();

        let persisted = self.db.persist(&guard).await.map_err(RepositoryError::from);
        Some(RecordedVisit { entry, persisted })
    }
}
