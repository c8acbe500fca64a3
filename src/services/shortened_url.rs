// src/services/shortened_url.rs - Business logic
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, error, info};
use url::Url;
use validator::Validate;

use crate::errors::ServiceError;
use crate::models::{CreateShortenedUrlDto, CreatedShortenedUrl, ShortenedUrl};
use crate::repositories::ShortenedUrlRepositoryTrait;
use crate::validations::{describe_errors, INVALID_URL_MESSAGE};

type Result<T> = std::result::Result<T, ServiceError>;

#[async_trait]
pub trait ShortenedUrlServiceTrait {
    /// Shortens a URL, under a custom alias when one is given
    async fn create(&self, dto: CreateShortenedUrlDto) -> Result<CreatedShortenedUrl>;
    /// Counts a visit and returns the entry to redirect to
    async fn resolve(&self, code: &str) -> Result<ShortenedUrl>;
    /// Returns the entry without counting a visit
    async fn stats(&self, code: &str) -> Result<ShortenedUrl>;
}

pub struct ShortenedUrlService<T: ShortenedUrlRepositoryTrait> {
    repository: Arc<T>,
}

impl<T: ShortenedUrlRepositoryTrait> ShortenedUrlService<T> {
    pub fn new(repository: Arc<T>) -> Self {
        Self { repository }
    }
}

fn not_found(code: &str) -> ServiceError {
    ServiceError::NotFound(format!("Short URL '{}' not found", code))
}

#[async_trait]
impl<T: ShortenedUrlRepositoryTrait + Send + Sync> ShortenedUrlServiceTrait
    for ShortenedUrlService<T>
{
    async fn create(&self, dto: CreateShortenedUrlDto) -> Result<CreatedShortenedUrl> {
        let dto = dto.normalized();

        let Some(raw_url) = dto.url.as_deref() else {
            return Err(ServiceError::ValidationError(
                "Missing \"url\" in request body".to_string(),
            ));
        };

        if let Err(e) = dto.validate() {
            return Err(ServiceError::ValidationError(describe_errors(&e)));
        }

        // Store the parser's canonical form
        let url = Url::parse(raw_url)
            .map_err(|_| ServiceError::ValidationError(INVALID_URL_MESSAGE.to_string()))?
            .to_string();

        let created = match dto.custom_alias {
            Some(alias) => {
                let entry = self.repository.insert_with_alias(&alias, &url).await?;
                CreatedShortenedUrl { code: alias, entry }
            }
            None => {
                let (code, entry) = self.repository.insert_generated(&url).await?;
                CreatedShortenedUrl { code, entry }
            }
        };

        info!("Shortened '{}' as '{}'", created.entry.url, created.code);
        Ok(created)
    }

    async fn resolve(&self, code: &str) -> Result<ShortenedUrl> {
        let visit = self
            .repository
            .record_visit(code)
            .await
            .ok_or_else(|| not_found(code))?;

        // Visit counts are best-effort; the redirect still goes out
        if let Err(e) = visit.persisted {
            error!("Failed to save visit count for '{}': {}", code, e);
        }

        debug!("Code '{}' visited {} times", code, visit.entry.visits);
        Ok(visit.entry)
    }

    async fn stats(&self, code: &str) -> Result<ShortenedUrl> {
        self.repository
            .find_by_code(code)
            .await?
            .ok_or_else(|| not_found(code))
    }
}
