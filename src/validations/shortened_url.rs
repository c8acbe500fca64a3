use url::Url;
use validator::{ValidationError, ValidationErrors};

pub const INVALID_URL_MESSAGE: &str = "Invalid URL";
pub const INVALID_ALIAS_MESSAGE: &str = "Invalid customAlias. Use letters, numbers, _ or -";

/// Validates that a URL string is absolute, has a host and uses http/https
pub fn validate_url(url_str: &str) -> Result<(), ValidationError> {
    match Url::parse(url_str) {
        Ok(url) if url.host().is_some() && matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => {
            let mut err = ValidationError::new("invalid_url");
            err.message = Some(INVALID_URL_MESSAGE.into());
            Err(err)
        }
    }
}

/// Validates that a custom alias only uses ASCII letters, digits, `_` and `-`
pub fn validate_custom_alias(alias: &str) -> Result<(), ValidationError> {
    let is_valid = !alias.is_empty()
        && alias
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');

    if !is_valid {
        let mut err = ValidationError::new("invalid_custom_alias");
        err.message = Some(INVALID_ALIAS_MESSAGE.into());
        return Err(err);
    }

    Ok(())
}

/// Flattens field errors into one client-facing message, ordered by field name
pub fn describe_errors(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|(a, _), (b, _)| a.cmp(b));

    fields
        .into_iter()
        .flat_map(|(_, errs)| errs.iter())
        .map(|e| {
            e.message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| e.code.to_string())
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use fake::{faker::internet::en::DomainSuffix, Fake};
    use validator::Validate;

    use super::*;
    use crate::models::CreateShortenedUrlDto;

    #[test]
    fn test_validate_url() {
        // Valid URLs
        assert!(validate_url("https://example.com").is_ok());
        assert!(validate_url("http://example.com/path?query=value").is_ok());
        assert!(validate_url("https://user@example.com:8443/a#frag").is_ok());

        // Invalid URLs
        assert!(validate_url("not-a-url").is_err());
        assert!(validate_url("/relative/path").is_err());
        assert!(validate_url("ftp://example.com").is_err()); // Not http/https
        assert!(validate_url("javascript:alert(1)").is_err());
    }

    #[test]
    fn test_validate_url_generated_domains() {
        for _ in 0..20 {
            let suffix: String = DomainSuffix().fake();
            let url = format!("https://example.{}/landing", suffix);
            assert!(validate_url(&url).is_ok(), "{}", url);
        }
    }

    #[test]
    fn test_validate_custom_alias() {
        // Valid aliases
        assert!(validate_custom_alias("my-link").is_ok());
        assert!(validate_custom_alias("valid_alias123").is_ok());
        assert!(validate_custom_alias(&"a".repeat(200)).is_ok());

        // Invalid aliases
        assert!(validate_custom_alias("").is_err());
        assert!(validate_custom_alias("my link").is_err());
        assert!(validate_custom_alias("me@home").is_err());
        assert!(validate_custom_alias("invalid/alias").is_err());
        assert!(validate_custom_alias("café").is_err());
    }

    #[test]
    fn test_describe_errors() {
        let dto = CreateShortenedUrlDto {
            url: Some("https://example.com".to_string()),
            custom_alias: Some("my link".to_string()),
        };

        let errors = dto.validate().unwrap_err();
        assert_eq!(describe_errors(&errors), INVALID_ALIAS_MESSAGE);
    }

    #[test]
    fn test_describe_errors_orders_fields() {
        let dto = CreateShortenedUrlDto {
            url: Some("nope".to_string()),
            custom_alias: Some("@".to_string()),
        };

        let errors = dto.validate().unwrap_err();
        assert_eq!(
            describe_errors(&errors),
            format!("{}; {}", INVALID_ALIAS_MESSAGE, INVALID_URL_MESSAGE)
        );
    }
}
