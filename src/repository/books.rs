//! Books repository and inventory ledger operations
//!
//! The ledger functions (`reserve`, `release`, `adjust_capacity`) are the only
//! code paths that move `available_copies`. Each is a single conditional
//! UPDATE, so the row lock scopes the critical section to one book and
//! concurrent traffic on unrelated titles is never serialized.

use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookQuery, CreateBook, UpdateBook},
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// List books with optional genre filter, paginated
    pub async fn list(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;
        let genre_filter = query.genre.as_deref();

        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT * FROM books
            WHERE ($1::text IS NULL OR genre = $1)
            ORDER BY title
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(genre_filter)
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM books WHERE ($1::text IS NULL OR genre = $1)",
        )
        .bind(genre_filter)
        .fetch_one(&self.pool)
        .await?;

        Ok((books, total))
    }

    /// Keyword search over title, author, genre and ISBN
    pub async fn search(&self, keyword: &str, page: i64, per_page: i64) -> AppResult<(Vec<Book>, i64)> {
        let pattern = format!("%{}%", keyword);
        let offset = (page - 1) * per_page;

        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT * FROM books
            WHERE title ILIKE $1 OR author ILIKE $1 OR genre ILIKE $1 OR isbn ILIKE $1
            ORDER BY title
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(&pattern)
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM books
            WHERE title ILIKE $1 OR author ILIKE $1 OR genre ILIKE $1 OR isbn ILIKE $1
            "#,
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        Ok((books, total))
    }

    /// Books with at least one copy on the shelf
    pub async fn list_available(&self) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            "SELECT * FROM books WHERE available_copies > 0 ORDER BY title",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    /// Distinct genres present in the catalog
    pub async fn genres(&self) -> AppResult<Vec<String>> {
        let genres = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT genre FROM books WHERE genre IS NOT NULL ORDER BY genre",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(genres)
    }

    /// Create a new book. All copies start on the shelf.
    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        let total = book.total_copies.unwrap_or(1);

        sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author, isbn, genre, description, cover_image_url,
                               published_year, total_copies, available_copies)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(&book.genre)
        .bind(&book.description)
        .bind(&book.cover_image_url)
        .bind(book.published_year)
        .bind(total)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.constraint() == Some("books_isbn_unique") => {
                AppError::Conflict(format!("A book with ISBN {:?} already exists", book.isbn))
            }
            _ => e.into(),
        })
    }

    /// Update book details; a `total_copies` edit goes through the
    /// capacity-adjustment ledger operation in the same transaction.
    pub async fn update(&self, id: i64, update: &UpdateBook) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let book = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET
                title = COALESCE($2, title),
                author = COALESCE($3, author),
                isbn = COALESCE($4, isbn),
                genre = COALESCE($5, genre),
                description = COALESCE($6, description),
                cover_image_url = COALESCE($7, cover_image_url),
                published_year = COALESCE($8, published_year),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&update.title)
        .bind(&update.author)
        .bind(&update.isbn)
        .bind(&update.genre)
        .bind(&update.description)
        .bind(&update.cover_image_url)
        .bind(update.published_year)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.constraint() == Some("books_isbn_unique") => {
                AppError::Conflict(format!("A book with ISBN {:?} already exists", update.isbn))
            }
            _ => e.into(),
        })?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        let book = match update.total_copies {
            Some(new_total) if new_total != book.total_copies => {
                Self::adjust_capacity(&mut tx, id, new_total).await?
            }
            _ => book,
        };

        tx.commit().await?;
        Ok(book)
    }

    /// Delete a book. Refused while any copy is out on loan.
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let result = sqlx::query(
            "DELETE FROM books WHERE id = $1 AND available_copies = total_copies",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let mut conn = self.pool.acquire().await?;
            if Self::exists(&mut conn, id).await? {
                return Err(AppError::Conflict(format!(
                    "Book {} has copies out on loan and cannot be deleted",
                    id
                )));
            }
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        Ok(())
    }

    /// Count catalog entries
    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // --- Inventory ledger -------------------------------------------------
    //
    // Associated functions over a connection so the loan transaction can run
    // them on its own `&mut *tx`.

    /// Atomically take one copy off the shelf.
    ///
    /// Under N concurrent reserves with k copies available, exactly min(N, k)
    /// succeed; the rest get OutOfStock.
    pub async fn reserve(conn: &mut PgConnection, book_id: i64) -> AppResult<Book> {
        let updated = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET available_copies = available_copies - 1, updated_at = NOW()
            WHERE id = $1 AND available_copies > 0
            RETURNING *
            "#,
        )
        .bind(book_id)
        .fetch_optional(&mut *conn)
        .await?;

        match updated {
            Some(book) => Ok(book),
            None => {
                if Self::exists(conn, book_id).await? {
                    Err(AppError::OutOfStock(format!(
                        "No copies of book {} are available",
                        book_id
                    )))
                } else {
                    Err(AppError::NotFound(format!("Book with id {} not found", book_id)))
                }
            }
        }
    }

    /// Put one copy back on the shelf.
    ///
    /// Refuses to exceed `total_copies`: a duplicate release is reported as a
    /// consistency breach instead of corrupting the count.
    pub async fn release(conn: &mut PgConnection, book_id: i64) -> AppResult<Book> {
        let updated = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET available_copies = available_copies + 1, updated_at = NOW()
            WHERE id = $1 AND available_copies < total_copies
            RETURNING *
            "#,
        )
        .bind(book_id)
        .fetch_optional(&mut *conn)
        .await?;

        match updated {
            Some(book) => Ok(book),
            None => {
                if Self::exists(conn, book_id).await? {
                    Err(AppError::Invariant(format!(
                        "Release of book {} would exceed total_copies",
                        book_id
                    )))
                } else {
                    Err(AppError::NotFound(format!("Book with id {} not found", book_id)))
                }
            }
        }
    }

    /// Change `total_copies`, applying the same delta to `available_copies`.
    ///
    /// Rejected when the delta would drive the available count negative,
    /// i.e. when the reduction would strand copies that are out on loan.
    pub async fn adjust_capacity(
        conn: &mut PgConnection,
        book_id: i64,
        new_total: i32,
    ) -> AppResult<Book> {
        let updated = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET available_copies = available_copies + ($2 - total_copies),
                total_copies = $2,
                updated_at = NOW()
            WHERE id = $1 AND available_copies + ($2 - total_copies) >= 0
            RETURNING *
            "#,
        )
        .bind(book_id)
        .bind(new_total)
        .fetch_optional(&mut *conn)
        .await?;

        match updated {
            Some(book) => Ok(book),
            None => {
                if Self::exists(conn, book_id).await? {
                    Err(AppError::InvalidCapacityChange(format!(
                        "Cannot set total_copies of book {} to {}: copies out on loan exceed it",
                        book_id, new_total
                    )))
                } else {
                    Err(AppError::NotFound(format!("Book with id {} not found", book_id)))
                }
            }
        }
    }

    async fn exists(conn: &mut PgConnection, book_id: i64) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
            .bind(book_id)
            .fetch_one(conn)
            .await?;
        Ok(exists)
    }
}
