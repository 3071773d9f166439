//! Public catalog endpoints and the customer checkout endpoint

use axum::response::IntoResponse;
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use http::StatusCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::db;
use crate::db::books::{BookWithAuthors, CatalogFilter, SearchParams};
use crate::db::orders::LineItem;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// GET /api/books
#[derive(Deserialize)]
pub struct BooksQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub search: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

pub async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<BooksQuery>,
) -> ApiResult<Vec<BookWithAuthors>> {
    let filter = CatalogFilter {
        search: query.search,
        category: query.category,
        min_price: query.min_price,
        max_price: query.max_price,
        limit: query.limit.unwrap_or(20).clamp(1, 100),
        offset: query.offset.unwrap_or(0).max(0),
    };

    let rows = db::books::list(&state.pool, &filter).await?;
    let books = db::books::with_authors(&state.pool, rows).await?;
    Ok(Json(books))
}

/// GET /api/books/search
#[derive(Deserialize)]
pub struct SearchQuery {
    pub isbn: Option<String>,
    pub title: Option<String>,
    pub category: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
}

pub async fn search_books(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Vec<BookWithAuthors>> {
    let params = SearchParams {
        isbn: query.isbn,
        title: query.title,
        category: query.category,
        author: query.author,
        publisher: query.publisher,
    };

    let rows = db::books::search(&state.pool, &params).await?;
    let books = db::books::with_authors(&state.pool, rows).await?;
    Ok(Json(books))
}

/// GET /api/books/{isbn}
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

/// POST /api/books/orders
///
/// Identity comes from the authenticated session, never the body.
#[derive(Deserialize)]
pub struct OrderRequest {
    pub credit_card_number: String,
    pub expiration_date: Option<String>,
    pub books: Vec<OrderItemRequest>,
}

#[derive(Deserialize)]
pub struct OrderItemRequest {
    #[serde(rename = "ISBN_number")]
    pub isbn: String,
    pub quantity: i32,
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub msg: &'static str,
    pub order_id: i64,
}

pub async fn order_books(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<OrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.books.is_empty() || req.credit_card_number.trim().is_empty() {
        return Err(ApiError::BadRequest("Missing Arguments".into()));
    }

    let items: Vec<LineItem> = req
        .books
        .into_iter()
        .map(|b| LineItem {
            isbn: b.isbn,
            quantity: b.quantity,
        })
        .collect();

    let order_id = db::orders::place_order(
        &state.pool,
        &user.username,
        req.credit_card_number.trim(),
        req.expiration_date.as_deref(),
        &items,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(OrderResponse {
            msg: "Order placed successfully",
            order_id,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_request_accepts_original_field_names() {
        let req: OrderRequest = serde_json::from_str(
            r#"{
                "credit_card_number": "4111-1111",
                "expiration_date": "2027-03",
                "books": [
                    {"ISBN_number": "978-1", "quantity": 2},
                    {"ISBN_number": "978-1", "quantity": 1}
                ]
            }"#,
        )
        .expect("deserialize");

        assert_eq!(req.books.len(), 2);
        assert_eq!(req.books[0].isbn, "978-1");
        assert_eq!(req.books[0].quantity, 2);
        assert_eq!(req.expiration_date.as_deref(), Some("2027-03"));
    }

    #[test]
    fn expiration_date_is_optional() {
        let req: OrderRequest = serde_json::from_str(
            r#"{"credit_card_number": "4111", "books": [{"ISBN_number": "978-1", "quantity": 1}]}"#,
        )
        .expect("deserialize");
        assert!(req.expiration_date.is_none());
    }
}
