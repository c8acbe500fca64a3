mod shortened_url;

#[cfg(test)]
pub use shortened_url::MockShortenedUrlRepositoryTrait;
pub use shortened_url::{ShortenedUrlRepository, ShortenedUrlRepositoryTrait};
