//! Request and response types for the hosted backend's auth and table APIs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user record from the auth service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Free-form profile data supplied at sign-up, e.g. `display_name`.
    #[serde(default)]
    pub user_metadata: serde_json::Value,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl AuthUser {
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.user_metadata
            .get("display_name")
            .and_then(serde_json::Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }
}

/// Tokens returned by a successful password sign-in.
#[derive(Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Lifetime of `access_token` in seconds.
    #[serde(default)]
    pub expires_in: u64,
    #[serde(default)]
    pub refresh_token: String,
    pub user: AuthUser,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"[redacted]")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("refresh_token", &"[redacted]")
            .field("user", &self.user)
            .finish()
    }
}

/// Filters for a `products` table read. Results are always newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub owner_id: Option<String>,
    /// Case-insensitive substring match on the product name.
    pub search: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl ProductQuery {
    #[must_use]
    pub fn for_owner(owner_id: &str) -> Self {
        Self {
            owner_id: Some(owner_id.to_string()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = category.filter(|c| !c.trim().is_empty());
        self
    }

    #[must_use]
    pub fn with_search(mut self, search: Option<String>) -> Self {
        self.search = search.filter(|s| !s.trim().is_empty());
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: Option<u32>) -> Self {
        self.limit = limit;
        self
    }

    #[must_use]
    pub fn with_offset(mut self, offset: Option<u32>) -> Self {
        self.offset = offset;
        self
    }

    /// PostgREST query parameters for this filter set.
    pub(crate) fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("select", "*".to_string()),
            ("order", "created_at.desc,id.desc".to_string()),
        ];
        if let Some(category) = &self.category {
            params.push(("category", format!("eq.{}", category.trim())));
        }
        if let Some(owner_id) = &self.owner_id {
            params.push(("owner_id", format!("eq.{owner_id}")));
        }
        if let Some(search) = &self.search {
            let term = sanitize_search(search);
            if !term.is_empty() {
                params.push(("name", format!("ilike.*{term}*")));
            }
        }
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(offset) = self.offset.filter(|o| *o > 0) {
            params.push(("offset", offset.to_string()));
        }
        params
    }
}

/// Removes characters with meaning in PostgREST filter syntax.
fn sanitize_search(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '*' | ',' | '(' | ')' | '%'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Body of a product insert: the listing plus the owning user.
#[derive(Debug, Serialize)]
pub(crate) struct ProductInsert<'a> {
    #[serde(flatten)]
    pub product: &'a souq_core::NewProduct,
    pub owner_id: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct PasswordCredentials<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct SignUpRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub data: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_query_is_newest_first_select_all() {
        let params = ProductQuery::default().to_params();
        assert_eq!(
            params,
            vec![
                ("select", "*".to_string()),
                ("order", "created_at.desc,id.desc".to_string())
            ]
        );
    }

    #[test]
    fn offset_is_emitted_only_when_positive() {
        let first = ProductQuery::default()
            .with_limit(Some(100))
            .with_offset(Some(0))
            .to_params();
        assert!(first.iter().all(|(k, _)| *k != "offset"));

        let second = ProductQuery::default()
            .with_limit(Some(100))
            .with_offset(Some(100))
            .to_params();
        assert!(second.contains(&("offset", "100".to_string())));
    }

    #[test]
    fn owner_query_adds_eq_filter() {
        let params = ProductQuery::for_owner("u-1").to_params();
        assert!(params.contains(&("owner_id", "eq.u-1".to_string())));
    }

    #[test]
    fn blank_filters_are_dropped() {
        let query = ProductQuery::default()
            .with_category(Some("  ".to_string()))
            .with_search(Some(String::new()));
        assert_eq!(query, ProductQuery::default());
    }

    #[test]
    fn search_is_sanitized_for_filter_syntax() {
        let params = ProductQuery::default()
            .with_search(Some("tv,(samsung)*".to_string()))
            .to_params();
        assert!(params.contains(&("name", "ilike.*tvsamsung*".to_string())));
    }

    #[test]
    fn search_of_only_syntax_chars_adds_no_filter() {
        let params = ProductQuery::default()
            .with_search(Some("**".to_string()))
            .to_params();
        assert!(params.iter().all(|(k, _)| *k != "name"));
    }

    #[test]
    fn session_debug_redacts_tokens() {
        let session: Session = serde_json::from_value(serde_json::json!({
            "access_token": "secret-access",
            "refresh_token": "secret-refresh",
            "expires_in": 3600,
            "user": { "id": "u-1" }
        }))
        .unwrap();
        let debug = format!("{session:?}");
        assert!(!debug.contains("secret"));
        assert_eq!(session.token_type, "bearer");
    }

    #[test]
    fn display_name_reads_user_metadata() {
        let user: AuthUser = serde_json::from_value(serde_json::json!({
            "id": "u-1",
            "email": "a@b.c",
            "user_metadata": { "display_name": "Yasmine" }
        }))
        .unwrap();
        assert_eq!(user.display_name(), Some("Yasmine"));

        let bare: AuthUser = serde_json::from_value(serde_json::json!({ "id": "u-2" })).unwrap();
        assert_eq!(bare.display_name(), None);
    }
}
