//! Book model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Book model from database
///
/// `available_copies` is owned by the inventory ledger and only ever moves
/// through its conditional updates.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub genre: Option<String>,
    pub description: Option<String>,
    pub cover_image_url: Option<String>,
    pub published_year: Option<i32>,
    pub total_copies: i32,
    pub available_copies: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// Whether at least one copy is on the shelf
    pub fn is_available(&self) -> bool {
        self.available_copies > 0
    }
}

/// Display metadata fetched from the catalog enrichment collaborator.
///
/// Deliberately carries no copy counts: enrichment can never touch
/// ledger-owned fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BookEnrichment {
    pub cover_image_url: Option<String>,
    pub description: Option<String>,
    pub subjects: Vec<String>,
}

impl BookEnrichment {
    pub fn is_empty(&self) -> bool {
        self.cover_image_url.is_none() && self.description.is_none() && self.subjects.is_empty()
    }
}

/// Book representation for API reads, with enrichment merged in
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookDetails {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub genre: Option<String>,
    pub description: Option<String>,
    pub cover_image_url: Option<String>,
    pub published_year: Option<i32>,
    pub total_copies: i32,
    pub available_copies: i32,
    pub is_available: bool,
    pub subjects: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Book> for BookDetails {
    fn from(book: Book) -> Self {
        BookDetails {
            id: book.id,
            title: book.title,
            author: book.author,
            isbn: book.isbn,
            genre: book.genre,
            description: book.description,
            cover_image_url: book.cover_image_url,
            published_year: book.published_year,
            total_copies: book.total_copies,
            available_copies: book.available_copies,
            is_available: book.available_copies > 0,
            subjects: None,
            created_at: book.created_at,
            updated_at: book.updated_at,
        }
    }
}

impl BookDetails {
    /// Additive merge: fills display fields that are still empty and leaves
    /// everything already present untouched.
    pub fn apply_enrichment(&mut self, enrichment: BookEnrichment) {
        if self.cover_image_url.is_none() {
            self.cover_image_url = enrichment.cover_image_url;
        }
        if self.description.is_none() {
            self.description = enrichment.description;
        }
        if self.subjects.is_none() && !enrichment.subjects.is_empty() {
            self.subjects = Some(enrichment.subjects);
        }
    }
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, max = 255, message = "Author is required"))]
    pub author: String,
    #[validate(length(max = 20, message = "ISBN too long"))]
    pub isbn: Option<String>,
    #[validate(length(max = 100, message = "Genre too long"))]
    pub genre: Option<String>,
    pub description: Option<String>,
    #[validate(length(max = 500, message = "Cover URL too long"))]
    pub cover_image_url: Option<String>,
    pub published_year: Option<i32>,
    #[validate(range(min = 0, message = "Total copies must be at least 0"))]
    pub total_copies: Option<i32>,
}

/// Update book request. `total_copies` edits go through the inventory
/// ledger's capacity adjustment.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 255, message = "Title must not be empty"))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 255, message = "Author must not be empty"))]
    pub author: Option<String>,
    #[validate(length(max = 20, message = "ISBN too long"))]
    pub isbn: Option<String>,
    #[validate(length(max = 100, message = "Genre too long"))]
    pub genre: Option<String>,
    pub description: Option<String>,
    #[validate(length(max = 500, message = "Cover URL too long"))]
    pub cover_image_url: Option<String>,
    pub published_year: Option<i32>,
    #[validate(range(min = 0, message = "Total copies must be at least 0"))]
    pub total_copies: Option<i32>,
}

/// Book list query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    pub genre: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Keyword search query
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct BookSearchQuery {
    pub keyword: String,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_book() -> Book {
        Book {
            id: 1,
            title: "The Left Hand of Darkness".to_string(),
            author: "Ursula K. Le Guin".to_string(),
            isbn: Some("9780441478125".to_string()),
            genre: Some("Science Fiction".to_string()),
            description: None,
            cover_image_url: None,
            published_year: Some(1969),
            total_copies: 3,
            available_copies: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_enrichment_fills_missing_fields() {
        let mut details = BookDetails::from(sample_book());
        details.apply_enrichment(BookEnrichment {
            cover_image_url: Some("https://covers.example/1.jpg".to_string()),
            description: Some("A planet of ambisexual humans.".to_string()),
            subjects: vec!["Gender".to_string(), "First contact".to_string()],
        });
        assert_eq!(details.cover_image_url.as_deref(), Some("https://covers.example/1.jpg"));
        assert_eq!(details.description.as_deref(), Some("A planet of ambisexual humans."));
        assert_eq!(details.subjects.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn test_enrichment_never_overwrites() {
        let mut book = sample_book();
        book.description = Some("Curated description".to_string());
        book.cover_image_url = Some("https://local/cover.jpg".to_string());
        let mut details = BookDetails::from(book);
        details.apply_enrichment(BookEnrichment {
            cover_image_url: Some("https://remote/other.jpg".to_string()),
            description: Some("Remote description".to_string()),
            subjects: vec![],
        });
        assert_eq!(details.cover_image_url.as_deref(), Some("https://local/cover.jpg"));
        assert_eq!(details.description.as_deref(), Some("Curated description"));
        assert_eq!(details.subjects, None);
        // counters come straight from the row
        assert_eq!(details.total_copies, 3);
        assert_eq!(details.available_copies, 1);
    }

    #[test]
    fn test_availability() {
        let mut book = sample_book();
        assert!(book.is_available());
        book.available_copies = 0;
        assert!(!book.is_available());
        assert!(!BookDetails::from(book).is_available);
    }
}
