//! Admin endpoints: book CRUD, publisher orders, customer orders, reports

use axum::response::IntoResponse;
use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::NaiveDate;
use http::StatusCode;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::db;
use crate::db::books::{BookUpdate, BookWithAuthors, NewBook};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::util::normalize_image_path;

// ── Book management ──

/// Shared guard for create and partial update: stock, threshold and price
/// must not be negative wherever they are supplied.
fn validate_book_numbers(
    stock: Option<i32>,
    threshold: Option<i32>,
    price: Option<Decimal>,
) -> Result<(), ApiError> {
    if stock.is_some_and(|s| s < 0)
        || threshold.is_some_and(|t| t < 0)
        || price.is_some_and(|p| p < Decimal::ZERO)
    {
        return Err(ApiError::BadRequest(
            "Stock, threshold and price must not be negative".into(),
        ));
    }
    Ok(())
}

/// GET /api/admin/books
pub async fn list_all_books(State(state): State<AppState>) -> ApiResult<Vec<BookWithAuthors>> {
    let rows = db::books::list_all(&state.pool).await?;
    let books = db::books::with_authors(&state.pool, rows).await?;
    Ok(Json(books))
}

/// GET /api/admin/books/{isbn}
pub async fn get_book(
    State(state): State<AppState>,
    Path(isbn): Path<String>,
) -> ApiResult<BookWithAuthors> {
    let book = db::books::find_by_isbn(&state.pool, &isbn)
        .await?
        .ok_or(ApiError::NotFound("Book"))?;
    let authors = db::books::authors(&state.pool, &isbn).await?;
    Ok(Json(BookWithAuthors { book, authors }))
}

/// POST /api/admin/books
#[derive(Deserialize)]
pub struct CreateBookRequest {
    #[serde(rename = "ISBN_number")]
    pub isbn: String,
    pub title: String,
    pub publication_year: Option<i32>,
    pub quantity_stock: i32,
    pub category: Option<String>,
    pub threshold: i32,
    pub selling_price: Decimal,
    pub publisher_id: Option<i64>,
    pub book_image: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
}

pub async fn add_book(
    State(state): State<AppState>,
    Json(req): Json<CreateBookRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let isbn = req.isbn.trim();
    if isbn.is_empty() || req.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Missing required fields".into()));
    }
    validate_book_numbers(
        Some(req.quantity_stock),
        Some(req.threshold),
        Some(req.selling_price),
    )?;

    let book_image = req.book_image.as_deref().map(normalize_image_path);

    db::books::create(
        &state.pool,
        &NewBook {
            isbn,
            title: req.title.trim(),
            publication_year: req.publication_year,
            quantity_stock: req.quantity_stock,
            category: req.category.as_deref(),
            threshold: req.threshold,
            selling_price: req.selling_price,
            publisher_id: req.publisher_id,
            book_image: book_image.as_deref(),
            authors: &req.authors,
        },
    )
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(db_err) = &e
            && db_err.is_unique_violation()
        {
            return ApiError::Conflict("Book with this ISBN already exists".into());
        }
        ApiError::from(e)
    })?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "msg": "Book created successfully" })),
    ))
}

/// PUT /api/admin/books/{isbn}
#[derive(Deserialize)]
pub struct UpdateBookRequest {
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

pub async fn update_book(
    State(state): State<AppState>,
    Path(isbn): Path<String>,
    Json(req): Json<UpdateBookRequest>,
) -> ApiResult<serde_json::Value> {
    validate_book_numbers(req.quantity_stock, req.threshold, req.selling_price)?;

    let update = BookUpdate {
        title: req.title,
        publication_year: req.publication_year,
        quantity_stock: req.quantity_stock,
        category: req.category,
        threshold: req.threshold,
        selling_price: req.selling_price,
        publisher_id: req.publisher_id,
        book_image: req.book_image.as_deref().map(normalize_image_path),
        authors: req.authors,
    };

    if update.is_empty() {
        return Err(ApiError::BadRequest("No changes made".into()));
    }

    if !db::books::update(&state.pool, &isbn, &update).await? {
        return Err(ApiError::NotFound("Book"));
    }

    Ok(Json(
        serde_json::json!({ "msg": "Book updated successfully" }),
    ))
}

/// DELETE /api/admin/books/{isbn}
pub async fn remove_book(
    State(state): State<AppState>,
    Path(isbn): Path<String>,
) -> ApiResult<serde_json::Value> {
    match db::books::delete(&state.pool, &isbn).await {
        Ok(true) => Ok(Json(
            serde_json::json!({ "msg": "Book deleted successfully" }),
        )),
        Ok(false) => Err(ApiError::NotFound("Book")),
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_foreign_key_violation()
            {
                return Err(ApiError::BadRequest(
                    "Cannot delete book: it is referenced in orders".into(),
                ));
            }
            Err(e.into())
        }
    }
}

// ── Publishers & replenishment orders ──

/// GET /api/admin/publishers
pub async fn list_publishers(
    State(state): State<AppState>,
) -> ApiResult<Vec<db::publishers::PublisherRow>> {
    Ok(Json(db::publishers::list(&state.pool).await?))
}

/// GET /api/admin/publisher-orders
pub async fn list_publisher_orders(
    State(state): State<AppState>,
) -> ApiResult<Vec<db::publisher_orders::PublisherOrderRow>> {
    Ok(Json(db::publisher_orders::list(&state.pool).await?))
}

/// PUT /api/admin/publisher-orders/{order_id}/confirm
pub async fn confirm_publisher_order(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
) -> ApiResult<serde_json::Value> {
    if db::publisher_orders::confirm(&state.pool, order_id).await? {
        Ok(Json(
            serde_json::json!({ "msg": "Publisher order confirmed successfully" }),
        ))
    } else {
        Err(ApiError::NotFound("Pending publisher order"))
    }
}

// ── Customer orders ──

/// GET /api/admin/customer-orders
pub async fn list_customer_orders(
    State(state): State<AppState>,
) -> ApiResult<Vec<db::orders::AdminCustomerOrder>> {
    Ok(Json(db::orders::list_all(&state.pool).await?))
}

// ── Reports ──

/// GET /api/admin/reports/sales/previous-month
pub async fn sales_previous_month(State(state): State<AppState>) -> ApiResult<serde_json::Value> {
    let total = db::reports::sales_previous_month(&state.pool).await?;
    Ok(Json(serde_json::json!({ "total_sales": total })))
}

/// GET /api/admin/reports/sales/by-date?date=YYYY-MM-DD
#[derive(Deserialize)]
pub struct SalesByDateQuery {
    pub date: Option<String>,
}

pub async fn sales_by_date(
    State(state): State<AppState>,
    Query(query): Query<SalesByDateQuery>,
) -> ApiResult<serde_json::Value> {
    let raw = query
        .date
        .ok_or_else(|| ApiError::BadRequest("Missing date parameter".into()))?;
    let date = NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest("Invalid date; expected YYYY-MM-DD".into()))?;

    let total = db::reports::sales_by_date(&state.pool, date).await?;
    Ok(Json(serde_json::json!({ "total_sales": total })))
}

/// GET /api/admin/reports/top-customers
pub async fn top_customers(
    State(state): State<AppState>,
) -> ApiResult<Vec<db::reports::TopCustomer>> {
    Ok(Json(db::reports::top_customers(&state.pool).await?))
}

/// GET /api/admin/reports/top-books
pub async fn top_books(State(state): State<AppState>) -> ApiResult<Vec<db::reports::TopBook>> {
    Ok(Json(db::reports::top_books(&state.pool).await?))
}

/// GET /api/admin/reports/replenishment-history/{isbn}
pub async fn replenishment_history(
    State(state): State<AppState>,
    Path(isbn): Path<String>,
) -> ApiResult<serde_json::Value> {
    db::books::find_by_isbn(&state.pool, &isbn)
        .await?
        .ok_or(ApiError::NotFound("Book"))?;

    let count = db::publisher_orders::replenishment_count(&state.pool, &isbn).await?;
    Ok(Json(
        serde_json::json!({ "number_of_replenishments": count }),
    ))
}
