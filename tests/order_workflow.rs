//! Database-backed tests for the order placement workflow.
//!
//! Each test runs against a fresh database created by `#[sqlx::test]` with
//! the crate migrations applied.

use bookstore_server::db::orders::{LineItem, place_order};
use bookstore_server::error::OrderError;
use chrono::{Datelike, Days, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

const USER: &str = "alice";
const CARD: &str = "4111111111111111";

async fn seed_user(pool: &PgPool, username: &str) {
    sqlx::query(
        "INSERT INTO users (username, password_hash, email, first_name, last_name)
         VALUES ($1, 'x', $1 || '@example.com', 'Test', 'User')",
    )
    .bind(username)
    .execute(pool)
    .await
    .unwrap();
}

async fn seed_book(pool: &PgPool, isbn: &str, stock: i32, threshold: i32, price: &str) {
    sqlx::query(
        "INSERT INTO book (isbn_number, title, quantity_stock, threshold, selling_price)
         VALUES ($1, 'Book ' || $1, $2, $3, $4::NUMERIC)",
    )
    .bind(isbn)
    .bind(stock)
    .bind(threshold)
    .bind(price)
    .execute(pool)
    .await
    .unwrap();
}

async fn stock(pool: &PgPool, isbn: &str) -> i32 {
    sqlx::query_scalar("SELECT quantity_stock FROM book WHERE isbn_number = $1")
        .bind(isbn)
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn count(pool: &PgPool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}

fn item(isbn: &str, quantity: i32) -> LineItem {
    LineItem { isbn: isbn.into(), quantity }
}

/// A `YYYY-MM` expiration safely in the future.
fn future_expiration() -> String {
    format!("{}-12", Utc::now().year() + 1)
}

#[sqlx::test]
async fn order_decrements_stock_and_records_cost(pool: PgPool) {
    seed_user(&pool, USER).await;
    seed_book(&pool, "978-1", 5, 0, "10.00").await;

    let order_id = place_order(
        &pool,
        USER,
        CARD,
        Some(&future_expiration()),
        &[item("978-1", 2)],
    )
    .await
    .unwrap();

    assert_eq!(stock(&pool, "978-1").await, 3);

    let cost: Decimal = sqlx::query_scalar("SELECT cost FROM customer_order WHERE order_id = $1")
        .bind(order_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(cost, Decimal::new(2000, 2));
}

#[sqlx::test]
async fn failed_line_rolls_back_earlier_lines(pool: PgPool) {
    seed_user(&pool, USER).await;
    seed_book(&pool, "978-1", 5, 0, "10.00").await;
    seed_book(&pool, "978-2", 1, 0, "15.00").await;

    let err = place_order(
        &pool,
        USER,
        CARD,
        Some(&future_expiration()),
        &[item("978-1", 2), item("978-2", 3)],
    )
    .await
    .unwrap_err();
    assert!(matches!(err, OrderError::InsufficientStock(isbn) if isbn == "978-2"));

    // First line's decrement must be undone, and nothing persisted at all.
    assert_eq!(stock(&pool, "978-1").await, 5);
    assert_eq!(stock(&pool, "978-2").await, 1);
    assert_eq!(count(&pool, "customer_order").await, 0);
    assert_eq!(count(&pool, "book_order").await, 0);
}

#[sqlx::test]
async fn failed_order_registers_no_card(pool: PgPool) {
    seed_user(&pool, USER).await;
    seed_book(&pool, "978-1", 1, 0, "10.00").await;

    // The card is new; the insufficient-stock failure must also discard it.
    let err = place_order(
        &pool,
        USER,
        CARD,
        Some(&future_expiration()),
        &[item("978-1", 5)],
    )
    .await
    .unwrap_err();
    assert!(matches!(err, OrderError::InsufficientStock(_)));
    assert_eq!(count(&pool, "credit_card").await, 0);
}

#[sqlx::test]
async fn unknown_book_rolls_back(pool: PgPool) {
    seed_user(&pool, USER).await;
    seed_book(&pool, "978-1", 5, 0, "10.00").await;

    let err = place_order(
        &pool,
        USER,
        CARD,
        Some(&future_expiration()),
        &[item("978-1", 1), item("978-missing", 1)],
    )
    .await
    .unwrap_err();
    assert!(matches!(err, OrderError::BookNotFound(isbn) if isbn == "978-missing"));

    assert_eq!(stock(&pool, "978-1").await, 5);
    assert_eq!(count(&pool, "customer_order").await, 0);
}

#[sqlx::test]
async fn duplicate_isbns_become_separate_lines(pool: PgPool) {
    seed_user(&pool, USER).await;
    seed_book(&pool, "978-1", 5, 0, "10.00").await;

    let order_id = place_order(
        &pool,
        USER,
        CARD,
        Some(&future_expiration()),
        &[item("978-1", 1), item("978-1", 1)],
    )
    .await
    .unwrap();

    let lines: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM book_order WHERE order_id = $1")
            .bind(order_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(lines, 2);
    assert_eq!(stock(&pool, "978-1").await, 3);

    let cost: Decimal = sqlx::query_scalar("SELECT cost FROM customer_order WHERE order_id = $1")
        .bind(order_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(cost, Decimal::new(2000, 2));
}

#[sqlx::test]
async fn recorded_price_survives_catalog_update(pool: PgPool) {
    seed_user(&pool, USER).await;
    seed_book(&pool, "978-1", 5, 0, "10.00").await;

    let order_id = place_order(
        &pool,
        USER,
        CARD,
        Some(&future_expiration()),
        &[item("978-1", 2)],
    )
    .await
    .unwrap();

    sqlx::query("UPDATE book SET selling_price = 99.99 WHERE isbn_number = '978-1'")
        .execute(&pool)
        .await
        .unwrap();

    let unit_price: Decimal =
        sqlx::query_scalar("SELECT unit_price FROM book_order WHERE order_id = $1")
            .bind(order_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(unit_price, Decimal::new(1000, 2));

    let cost: Decimal = sqlx::query_scalar("SELECT cost FROM customer_order WHERE order_id = $1")
        .bind(order_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(cost, Decimal::new(2000, 2));
}

#[sqlx::test]
async fn stock_cannot_go_negative_across_orders(pool: PgPool) {
    seed_user(&pool, USER).await;
    seed_book(&pool, "978-1", 3, 0, "10.00").await;

    let expiration = future_expiration();
    place_order(&pool, USER, CARD, Some(&expiration), &[item("978-1", 2)])
        .await
        .unwrap();
    assert_eq!(stock(&pool, "978-1").await, 1);

    let err = place_order(&pool, USER, CARD, None, &[item("978-1", 2)])
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InsufficientStock(_)));
    assert_eq!(stock(&pool, "978-1").await, 1);
    assert_eq!(count(&pool, "customer_order").await, 1);
}

#[sqlx::test]
async fn unknown_card_without_expiration_is_rejected(pool: PgPool) {
    seed_user(&pool, USER).await;
    seed_book(&pool, "978-1", 5, 0, "10.00").await;

    let err = place_order(&pool, USER, CARD, None, &[item("978-1", 1)])
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::PaymentInstrumentNotFound));

    assert_eq!(stock(&pool, "978-1").await, 5);
    assert_eq!(count(&pool, "customer_order").await, 0);
    assert_eq!(count(&pool, "credit_card").await, 0);
}

#[sqlx::test]
async fn expired_card_is_rejected(pool: PgPool) {
    seed_user(&pool, USER).await;
    seed_book(&pool, "978-1", 5, 0, "10.00").await;

    let last_month = (Utc::now().date_naive().with_day(1).unwrap() - Days::new(1))
        .with_day(1)
        .unwrap();
    sqlx::query("INSERT INTO credit_card (card_number, expire_date) VALUES ($1, $2)")
        .bind(CARD)
        .bind(last_month)
        .execute(&pool)
        .await
        .unwrap();

    let err = place_order(&pool, USER, CARD, None, &[item("978-1", 1)])
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::PaymentInstrumentExpired));
    assert_eq!(count(&pool, "customer_order").await, 0);
}

#[sqlx::test]
async fn malformed_expiration_registers_no_card(pool: PgPool) {
    seed_user(&pool, USER).await;
    seed_book(&pool, "978-1", 5, 0, "10.00").await;

    let err = place_order(&pool, USER, CARD, Some("12/27"), &[item("978-1", 1)])
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InvalidPaymentInstrument));
    assert_eq!(count(&pool, "credit_card").await, 0);
}

#[sqlx::test]
async fn low_stock_queues_one_replenishment(pool: PgPool) {
    seed_user(&pool, USER).await;
    seed_book(&pool, "978-1", 5, 4, "10.00").await;

    let expiration = future_expiration();
    place_order(&pool, USER, CARD, Some(&expiration), &[item("978-1", 2)])
        .await
        .unwrap();

    let (quantity, status): (i32, String) = sqlx::query_as(
        "SELECT quantity, status FROM publisher_order WHERE isbn_number = '978-1'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(quantity, 8);
    assert_eq!(status, "Pending");

    // A second low-stock order must not queue another while one is pending.
    place_order(&pool, USER, CARD, None, &[item("978-1", 1)])
        .await
        .unwrap();
    assert_eq!(count(&pool, "publisher_order").await, 1);
}
