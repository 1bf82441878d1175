//! Catalog enrichment backed by the Open Library API
//!
//! Display metadata only: the collaborator hands back cover URLs,
//! descriptions and subjects keyed by ISBN, and the read path merges them
//! additively. It has no access to inventory state.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::time::Duration;

use crate::{
    config::EnrichmentConfig,
    error::{AppError, AppResult},
    models::book::BookEnrichment,
};

#[cfg(test)]
use mockall::automock;

static ISBN_SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9Xx]").unwrap());

/// Strip separators from an ISBN, keeping digits and the X check character
pub fn normalize_isbn(isbn: &str) -> String {
    ISBN_SEPARATORS.replace_all(isbn, "").to_uppercase()
}

/// External metadata source for the catalog read path
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Enricher: Send + Sync {
    /// Cover URL derived from the ISBN alone; no network involved
    fn cover_url(&self, isbn: &str) -> Option<String>;

    /// Fetch description and subjects for an ISBN
    async fn lookup(&self, isbn: &str) -> AppResult<Option<BookEnrichment>>;
}

/// Production enricher talking to covers.openlibrary.org / openlibrary.org
pub struct OpenLibraryClient {
    client: reqwest::Client,
    covers_base_url: String,
    api_base_url: String,
}

impl OpenLibraryClient {
    pub fn new(config: &EnrichmentConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            covers_base_url: config.covers_base_url.trim_end_matches('/').to_string(),
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Enricher for OpenLibraryClient {
    fn cover_url(&self, isbn: &str) -> Option<String> {
        let clean = normalize_isbn(isbn);
        if clean.is_empty() {
            return None;
        }
        Some(format!("{}/b/isbn/{}-L.jpg", self.covers_base_url, clean))
    }

    async fn lookup(&self, isbn: &str) -> AppResult<Option<BookEnrichment>> {
        let clean = normalize_isbn(isbn);
        if clean.is_empty() {
            return Ok(None);
        }

        let url = format!(
            "{}/api/books?bibkeys=ISBN:{}&format=json&jscmd=data",
            self.api_base_url, clean
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::Enrichment(format!("Open Library request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Enrichment(format!(
                "Open Library returned {}",
                response.status()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::Enrichment(format!("Invalid Open Library response: {}", e)))?;

        let data = match body.get(format!("ISBN:{}", clean)) {
            Some(data) => data,
            None => return Ok(None),
        };

        Ok(Some(BookEnrichment {
            cover_image_url: self.cover_url(isbn),
            description: parse_description(data),
            subjects: parse_subjects(data),
        }))
    }
}

/// Description comes from the first excerpt when present, falling back to
/// the notes field, which Open Library serves either as a plain string or
/// as an object with a `value` key.
fn parse_description(data: &Value) -> Option<String> {
    if let Some(text) = data.pointer("/excerpts/0/text").and_then(Value::as_str) {
        return Some(text.to_string());
    }
    match data.get("notes") {
        Some(Value::String(notes)) => Some(notes.clone()),
        Some(notes) => notes.get("value").and_then(Value::as_str).map(str::to_string),
        None => None,
    }
}

fn parse_subjects(data: &Value) -> Vec<String> {
    data.get("subjects")
        .and_then(Value::as_array)
        .map(|subjects| {
            subjects
                .iter()
                .filter_map(|s| s.get("name").and_then(Value::as_str).map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
