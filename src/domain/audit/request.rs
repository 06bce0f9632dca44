//! Audit request value objects.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{UserId, ValidationError};

/// A normalized storefront URL.
///
/// Always carries an `http` or `https` scheme and a non-empty host. A bare
/// host such as `example.myshopify.com` is accepted and given `https://`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreUrl(String);

impl StoreUrl {
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, ValidationError> {
        let raw = raw.as_ref().trim();
        if raw.is_empty() {
            return Err(ValidationError::empty_field("storeUrl"));
        }
        if raw.chars().any(char::is_whitespace) {
            return Err(ValidationError::invalid_format(
                "storeUrl",
                "must not contain whitespace",
            ));
        }

        let normalized = if raw.contains("://") {
            raw.to_string()
        } else {
            format!("https://{}", raw)
        };

        let rest = normalized
            .strip_prefix("https://")
            .or_else(|| normalized.strip_prefix("http://"))
            .ok_or_else(|| {
                ValidationError::invalid_format("storeUrl", "scheme must be http or https")
            })?;

        let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
        let host = host.rsplit('@').next().unwrap_or_default();
        let host_name = host.split(':').next().unwrap_or_default();
        if host_name.is_empty() || (!host_name.contains('.') && host_name != "localhost") {
            return Err(ValidationError::invalid_format("storeUrl", "missing host"));
        }

        Ok(Self(normalized.trim_end_matches('/').to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the host portion, lowercased.
    pub fn host(&self) -> String {
        let rest = self.0.split_once("://").map(|(_, r)| r).unwrap_or(&self.0);
        rest.split(['/', '?', '#', ':'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase()
    }
}

impl fmt::Display for StoreUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether the audit was requested by an identified caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditType {
    Public,
    Authenticated,
}

impl AuditType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditType::Public => "public",
            AuditType::Authenticated => "authenticated",
        }
    }
}

/// One audit run, fixed at request time.
///
/// The presence of `user_id` decides where the result is deposited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRequest {
    store_url: StoreUrl,
    user_id: Option<UserId>,
}

impl AuditRequest {
    pub fn new(store_url: StoreUrl, user_id: Option<UserId>) -> Self {
        Self { store_url, user_id }
    }

    pub fn store_url(&self) -> &StoreUrl {
        &self.store_url
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    pub fn audit_type(&self) -> AuditType {
        if self.user_id.is_some() {
            AuditType::Authenticated
        } else {
            AuditType::Public
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_url_accepts_https_url() {
        let url = StoreUrl::parse("https://example.myshopify.com").unwrap();
        assert_eq!(url.as_str(), "https://example.myshopify.com");
        assert_eq!(url.host(), "example.myshopify.com");
    }

    #[test]
    fn store_url_adds_https_to_bare_host() {
        let url = StoreUrl::parse("  example.myshopify.com/ ").unwrap();
        assert_eq!(url.as_str(), "https://example.myshopify.com");
    }

    #[test]
    fn store_url_rejects_empty() {
        assert_eq!(
            StoreUrl::parse("   "),
            Err(ValidationError::empty_field("storeUrl"))
        );
    }

    #[test]
    fn store_url_rejects_other_schemes() {
        assert!(StoreUrl::parse("ftp://example.com").is_err());
        assert!(StoreUrl::parse("javascript://alert").is_err());
    }

    #[test]
    fn store_url_rejects_missing_host() {
        assert!(StoreUrl::parse("https://").is_err());
        assert!(StoreUrl::parse("https:///path").is_err());
        assert!(StoreUrl::parse("nodots").is_err());
    }

    #[test]
    fn store_url_keeps_path_and_strips_trailing_slash() {
        let url = StoreUrl::parse("http://shop.test/collections/all/").unwrap();
        assert_eq!(url.as_str(), "http://shop.test/collections/all");
        assert_eq!(url.host(), "shop.test");
    }

    #[test]
    fn audit_type_follows_user_presence() {
        let url = StoreUrl::parse("https://shop.test").unwrap();
        let anon = AuditRequest::new(url.clone(), None);
        let known = AuditRequest::new(url, Some(UserId::new("u-1").unwrap()));

        assert_eq!(anon.audit_type(), AuditType::Public);
        assert_eq!(known.audit_type(), AuditType::Authenticated);
    }
}
