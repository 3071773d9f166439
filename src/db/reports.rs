//! Admin reporting aggregates

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;

/// Total sales over the previous calendar month. `None` when no orders.
pub async fn sales_previous_month(pool: &PgPool) -> Result<Option<Decimal>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT SUM(cost)
         FROM customer_order
         WHERE order_date >= date_trunc('month', now()) - interval '1 month'
           AND order_date < date_trunc('month', now())",
    )
    .fetch_one(pool)
    .await
}

pub async fn sales_by_date(pool: &PgPool, date: NaiveDate) -> Result<Option<Decimal>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT SUM(cost)
         FROM customer_order
         WHERE order_date::date = $1",
    )
    .bind(date)
    .fetch_one(pool)
    .await
}

#[derive(sqlx::FromRow, Serialize)]
pub struct TopCustomer {
    pub first_name: String,
    pub last_name: String,
    pub total_purchase_amount: Decimal,
}

/// Top 5 customers by purchase amount over the last 3 months.
pub async fn top_customers(pool: &PgPool) -> Result<Vec<TopCustomer>, sqlx::Error> {
    sqlx::query_as(
        "SELECT u.first_name, u.last_name, SUM(co.cost) AS total_purchase_amount
         FROM customer_order co
         JOIN users u ON u.username = co.username
         WHERE co.order_date >= now() - interval '3 months'
         GROUP BY co.username, u.first_name, u.last_name
         ORDER BY total_purchase_amount DESC
         LIMIT 5",
    )
    .fetch_all(pool)
    .await
}

#[derive(sqlx::FromRow, Serialize)]
pub struct TopBook {
    pub title: String,
    pub total_number_of_copies_sold: i64,
}

/// Top 10 selling books by copies sold over the last 3 months.
pub async fn top_books(pool: &PgPool) -> Result<Vec<TopBook>, sqlx::Error> {
    sqlx::query_as(
        "SELECT b.title, SUM(bo.item_quantity) AS total_number_of_copies_sold
         FROM book_order bo
         JOIN book b ON b.isbn_number = bo.isbn_number
         JOIN customer_order co ON co.order_id = bo.order_id
         WHERE co.order_date >= now() - interval '3 months'
         GROUP BY b.title
         ORDER BY total_number_of_copies_sold DESC
         LIMIT 10",
    )
    .fetch_all(pool)
    .await
}
