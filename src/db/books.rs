//! Catalog storage — book listing, search, detail, and admin CRUD

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;

#[derive(sqlx::FromRow, Serialize)]
pub struct BookRow {
    pub isbn_number: String,
    pub title: String,
    pub publication_year: Option<i32>,
    pub quantity_stock: i32,
    pub category: Option<String>,
    pub threshold: i32,
    pub selling_price: Decimal,
    pub book_image: Option<String>,
    pub publisher_id: Option<i64>,
    pub publisher_name: Option<String>,
}

#[derive(Serialize)]
pub struct BookWithAuthors {
    #[serde(flatten)]
    pub book: BookRow,
    pub authors: Vec<String>,
}

/// Filters for the paginated catalog listing.
pub struct CatalogFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub limit: i64,
    pub offset: i64,
}

pub async fn list(pool: &PgPool, filter: &CatalogFilter) -> Result<Vec<BookRow>, sqlx::Error> {
    sqlx::query_as(
        "SELECT b.isbn_number, b.title, b.publication_year, b.quantity_stock,
                b.category, b.threshold, b.selling_price, b.book_image,
                b.publisher_id, p.name AS publisher_name
         FROM book b
         LEFT JOIN publisher p ON b.publisher_id = p.publisher_id
         WHERE ($1::TEXT IS NULL OR b.title ILIKE '%' || $1 || '%')
           AND ($2::TEXT IS NULL OR b.category = $2)
           AND ($3::NUMERIC IS NULL OR b.selling_price >= $3)
           AND ($4::NUMERIC IS NULL OR b.selling_price <= $4)
         ORDER BY b.title
         LIMIT $5 OFFSET $6",
    )
    .bind(&filter.search)
    .bind(&filter.category)
    .bind(filter.min_price)
    .bind(filter.max_price)
    .bind(filter.limit)
    .bind(filter.offset)
    .fetch_all(pool)
    .await
}

/// Unfiltered listing for the admin console.
pub async fn list_all(pool: &PgPool) -> Result<Vec<BookRow>, sqlx::Error> {
    sqlx::query_as(
        "SELECT b.isbn_number, b.title, b.publication_year, b.quantity_stock,
                b.category, b.threshold, b.selling_price, b.book_image,
                b.publisher_id, p.name AS publisher_name
         FROM book b
         LEFT JOIN publisher p ON b.publisher_id = p.publisher_id
         ORDER BY b.title",
    )
    .fetch_all(pool)
    .await
}

/// Parameters for the LIKE search across title/isbn/category/author/publisher.
pub struct SearchParams {
    pub isbn: Option<String>,
    pub title: Option<String>,
    pub category: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
}

pub async fn search(pool: &PgPool, params: &SearchParams) -> Result<Vec<BookRow>, sqlx::Error> {
    sqlx::query_as(
        "SELECT DISTINCT b.isbn_number, b.title, b.publication_year, b.quantity_stock,
                b.category, b.threshold, b.selling_price, b.book_image,
                b.publisher_id, p.name AS publisher_name
         FROM book b
         LEFT JOIN publisher p ON b.publisher_id = p.publisher_id
         LEFT JOIN author a ON a.isbn_number = b.isbn_number
         WHERE ($1::TEXT IS NULL OR b.isbn_number = $1)
           AND ($2::TEXT IS NULL OR b.title ILIKE '%' || $2 || '%')
           AND ($3::TEXT IS NULL OR b.category ILIKE '%' || $3 || '%')
           AND ($4::TEXT IS NULL OR a.author_name ILIKE '%' || $4 || '%')
           AND ($5::TEXT IS NULL OR p.name ILIKE '%' || $5 || '%')
         ORDER BY b.title",
    )
    .bind(&params.isbn)
    .bind(&params.title)
    .bind(&params.category)
    .bind(&params.author)
    .bind(&params.publisher)
    .fetch_all(pool)
    .await
}

pub async fn find_by_isbn(pool: &PgPool, isbn: &str) -> Result<Option<BookRow>, sqlx::Error> {
    sqlx::query_as(
        "SELECT b.isbn_number, b.title, b.publication_year, b.quantity_stock,
                b.category, b.threshold, b.selling_price, b.book_image,
                b.publisher_id, p.name AS publisher_name
         FROM book b
         LEFT JOIN publisher p ON b.publisher_id = p.publisher_id
         WHERE b.isbn_number = $1",
    )
    .bind(isbn)
    .fetch_optional(pool)
    .await
}

pub async fn authors(pool: &PgPool, isbn: &str) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT author_name FROM author WHERE isbn_number = $1 ORDER BY id")
        .bind(isbn)
        .fetch_all(pool)
        .await
}

/// Attach author lists to a set of book rows with one bulk query.
pub async fn with_authors(
    pool: &PgPool,
    rows: Vec<BookRow>,
) -> Result<Vec<BookWithAuthors>, sqlx::Error> {
    let isbns: Vec<&str> = rows.iter().map(|b| b.isbn_number.as_str()).collect();
    let pairs: Vec<(String, String)> = sqlx::query_as(
        "SELECT isbn_number, author_name FROM author WHERE isbn_number = ANY($1) ORDER BY id",
    )
    .bind(&isbns)
    .fetch_all(pool)
    .await?;

    let mut by_isbn: HashMap<String, Vec<String>> = HashMap::new();
    for (isbn, author) in pairs {
        by_isbn.entry(isbn).or_default().push(author);
    }

    Ok(rows
        .into_iter()
        .map(|book| {
            let authors = by_isbn.remove(&book.isbn_number).unwrap_or_default();
            BookWithAuthors { book, authors }
        })
        .collect())
}

pub struct NewBook<'a> {
    pub isbn: &'a str,
    pub title: &'a str,
    pub publication_year: Option<i32>,
    pub quantity_stock: i32,
    pub category: Option<&'a str>,
    pub threshold: i32,
    pub selling_price: Decimal,
    pub publisher_id: Option<i64>,
    pub book_image: Option<&'a str>,
    pub authors: &'a [String],
}

/// Insert a book and its author rows in one transaction.
pub async fn create(pool: &PgPool, book: &NewBook<'_>) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO book (isbn_number, title, publication_year, quantity_stock,
                           category, threshold, selling_price, publisher_id, book_image)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(book.isbn)
    .bind(book.title)
    .bind(book.publication_year)
    .bind(book.quantity_stock)
    .bind(book.category)
    .bind(book.threshold)
    .bind(book.selling_price)
    .bind(book.publisher_id)
    .bind(book.book_image)
    .execute(&mut *tx)
    .await?;

    for author in book.authors {
        sqlx::query("INSERT INTO author (isbn_number, author_name) VALUES ($1, $2)")
            .bind(book.isbn)
            .bind(author)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Structured partial update: only `Some` fields change.
#[derive(Default)]
pub struct BookUpdate {
    pub title: Option<String>,
    pub publication_year: Option<i32>,
    pub quantity_stock: Option<i32>,
    pub category: Option<String>,
    pub threshold: Option<i32>,
    pub selling_price: Option<Decimal>,
    pub publisher_id: Option<i64>,
    pub book_image: Option<String>,
    pub authors: Option<Vec<String>>,
}

impl BookUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.publication_year.is_none()
            && self.quantity_stock.is_none()
            && self.category.is_none()
            && self.threshold.is_none()
            && self.selling_price.is_none()
            && self.publisher_id.is_none()
            && self.book_image.is_none()
            && self.authors.is_none()
    }
}

/// Apply a partial update. Returns false if the book does not exist.
/// A provided author list replaces the existing one in the same transaction.
pub async fn update(pool: &PgPool, isbn: &str, update: &BookUpdate) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        "UPDATE book SET
             title = COALESCE($2, title),
             publication_year = COALESCE($3, publication_year),
             quantity_stock = COALESCE($4, quantity_stock),
             category = COALESCE($5, category),
             threshold = COALESCE($6, threshold),
             selling_price = COALESCE($7, selling_price),
             publisher_id = COALESCE($8, publisher_id),
             book_image = COALESCE($9, book_image)
         WHERE isbn_number = $1",
    )
    .bind(isbn)
    .bind(&update.title)
    .bind(update.publication_year)
    .bind(update.quantity_stock)
    .bind(&update.category)
    .bind(update.threshold)
    .bind(update.selling_price)
    .bind(update.publisher_id)
    .bind(&update.book_image)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(false);
    }

    if let Some(authors) = &update.authors {
        sqlx::query("DELETE FROM author WHERE isbn_number = $1")
            .bind(isbn)
            .execute(&mut *tx)
            .await?;
        for author in authors {
            sqlx::query("INSERT INTO author (isbn_number, author_name) VALUES ($1, $2)")
                .bind(isbn)
                .bind(author)
                .execute(&mut *tx)
                .await?;
        }
    }

    tx.commit().await?;
    Ok(true)
}

/// Delete a book. Referencing order lines make this fail with a foreign-key
/// violation, surfaced to the caller.
pub async fn delete(pool: &PgPool, isbn: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM book WHERE isbn_number = $1")
        .bind(isbn)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
