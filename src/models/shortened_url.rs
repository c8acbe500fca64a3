// src/models/shortened_url.rs - Pure data structures
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::timestamp;
use crate::errors::RepositoryError;
use crate::validations::{validate_custom_alias, validate_url};

// DTO for creating a new shortened URL, accepted as JSON or as a form
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateShortenedUrlDto {
    #[validate(custom(function = "validate_url"))]
    pub url: Option<String>,

    #[validate(custom(function = "validate_custom_alias"))]
    pub custom_alias: Option<String>,
}

impl CreateShortenedUrlDto {
    /// Treats empty strings as absent fields.
    pub fn normalized(self) -> Self {
        Self {
            url: self.url.filter(|u| !u.is_empty()),
            custom_alias: self.custom_alias.filter(|a| !a.is_empty()),
        }
    }
}

/// A stored short link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortenedUrl {
    /// The original, long URL that was shortened
    pub url: String,

    /// When this shortened URL was created
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,

    /// Number of times this shortened URL has been visited
    #[serde(default)]
    pub visits: u64,

    /// When this shortened URL was last visited
    #[serde(
        default,
        with = "timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_visited: Option<DateTime<Utc>>,
}

impl ShortenedUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            created_at: Utc::now(),
            visits: 0,
            last_visited: None,
        }
    }

    pub fn record_visit(&mut self, at: DateTime<Utc>) {
        self.visits = self.visits.saturating_add(1);
        self.last_visited = Some(at);
    }
}

/// Whole contents of the store file. `urls` is required and unknown top-level
/// keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UrlDatabase {
    /// Last counter value handed out to a generated code
    #[serde(default)]
    pub last_id: u64,

    pub urls: BTreeMap<String, ShortenedUrl>,
}

/// Result of recording a visit. The entry is valid even when `persisted` failed.
#[derive(Debug)]
pub struct RecordedVisit {
    pub entry: ShortenedUrl,
    pub persisted: Result<(), RepositoryError>,
}

/// A newly created short link and its code
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedShortenedUrl {
    pub code: String,
    pub entry: ShortenedUrl,
}

// DTO for the create response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortenedUrlResponseDto {
    pub short_url: String,
}

// DTO for the stats response
#[derive(Debug, Serialize)]
pub struct ShortenedUrlStatsDto {
    pub code: String,
    #[serde(flatten)]
    pub entry: ShortenedUrl,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_database_file_layout() {
        let created = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let db = UrlDatabase {
            last_id: 1,
            urls: BTreeMap::from([(
                "1".to_string(),
                ShortenedUrl {
                    url: "https://example.com/a".to_string(),
                    created_at: created,
                    visits: 0,
                    last_visited: None,
                },
            )]),
        };

        let value = serde_json::to_value(&db).unwrap();
        assert_eq!(
            value,
            json!({
                "lastId": 1,
                "urls": {
                    "1": {
                        "url": "https://example.com/a",
                        "createdAt": "2024-05-01T12:30:00.000Z",
                        "visits": 0
                    }
                }
            })
        );
    }

    #[test]
    fn test_reads_legacy_entries() {
        // Millisecond timestamps and a missing visit count
        let raw = r#"{
            "lastId": 3,
            "urls": {
                "3": { "url": "https://example.com/", "createdAt": "2023-11-14T08:00:00.123Z" },
                "docs": {
                    "url": "https://docs.rs/",
                    "createdAt": "2023-11-14T09:00:00.000Z",
                    "visits": 7,
                    "lastVisited": "2023-11-15T10:11:12.345Z"
                }
            }
        }"#;

        let db: UrlDatabase = serde_json::from_str(raw).unwrap();
        assert_eq!(db.last_id, 3);
        assert_eq!(db.urls["3"].visits, 0);
        assert_eq!(db.urls["3"].last_visited, None);
        assert_eq!(db.urls["docs"].visits, 7);
        assert_eq!(
            db.urls["docs"].last_visited.unwrap().to_rfc3339(),
            "2023-11-15T10:11:12.345+00:00"
        );
    }

    #[test]
    fn test_rejects_foreign_json() {
        for raw in [
            r#"{}"#,
            r#"{"data": {"1": "x"}}"#,
            r#"{"lastId": 1, "urls": {}, "extra": true}"#,
        ] {
            assert!(serde_json::from_str::<UrlDatabase>(raw).is_err(), "{}", raw);
        }

        // A counter-less file is still a store
        let db: UrlDatabase = serde_json::from_str(r#"{"urls": {}}"#).unwrap();
        assert_eq!(db, UrlDatabase::default());
    }

    #[test]
    fn test_record_visit() {
        let mut entry = ShortenedUrl::new("https://example.com/");
        let at = Utc::now();

        entry.record_visit(at);
        entry.record_visit(at);

        assert_eq!(entry.visits, 2);
        assert_eq!(entry.last_visited, Some(at));
    }

    #[test]
    fn test_stats_dto_flattens_entry() {
        let mut entry = ShortenedUrl::new("https://example.com/a");
        entry.record_visit(Utc::now());

        let value = serde_json::to_value(ShortenedUrlStatsDto {
            code: "1".to_string(),
            entry,
        })
        .unwrap();

        assert_eq!(value["code"], "1");
        assert_eq!(value["url"], "https://example.com/a");
        assert_eq!(value["visits"], 1);
        assert!(value["lastVisited"].is_string());
        assert!(value["createdAt"].is_string());
    }

    #[test]
    fn test_normalized_drops_empty_fields() {
        let dto = CreateShortenedUrlDto {
            url: Some(String::new()),
            custom_alias: Some(String::new()),
        }
        .normalized();

        assert!(dto.url.is_none());
        assert!(dto.custom_alias.is_none());
    }
}
