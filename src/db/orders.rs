//! Order placement and order queries
//!
//! [`place_order`] is the checkout workflow: one transaction covering the
//! credit-card resolution, the order header, every line insert with its
//! stock decrement and price snapshot, and the total. Any error drops the
//! transaction and rolls everything back, so a failed order leaves no
//! header, no lines, no stock change, and no provisionally created card.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{PgConnection, PgPool};

use crate::db::{credit_cards, publisher_orders};
use crate::error::OrderError;

/// One requested book-quantity pair. Duplicate ISBNs in a request are
/// independent lines, never merged.
#[derive(Debug, Clone)]
pub struct LineItem {
    pub isbn: String,
    pub quantity: i32,
}

/// Place a customer order. Returns the new order id on success.
pub async fn place_order(
    pool: &PgPool,
    username: &str,
    card_number: &str,
    expiration: Option<&str>,
    items: &[LineItem],
) -> Result<i64, OrderError> {
    validate_items(items)?;

    let today = Utc::now().date_naive();
    let mut tx = pool.begin().await?;

    resolve_card(&mut *tx, card_number, expiration, today).await?;

    // Header first: line rows reference the order id.
    let order_id: i64 = sqlx::query_scalar(
        "INSERT INTO customer_order (username, card_number, cost)
         VALUES ($1, $2, 0)
         RETURNING order_id",
    )
    .bind(username)
    .bind(card_number)
    .fetch_one(&mut *tx)
    .await?;

    let mut total = Decimal::ZERO;
    for (idx, item) in items.iter().enumerate() {
        // The conditional decrement is both the stock check and the price
        // snapshot: zero rows means the book is missing or under-stocked,
        // and the returned price is the one in effect at decrement time.
        let row: Option<(Decimal, i32, i32)> = sqlx::query_as(
            "UPDATE book
             SET quantity_stock = quantity_stock - $2
             WHERE isbn_number = $1 AND quantity_stock >= $2
             RETURNING selling_price, quantity_stock, threshold",
        )
        .bind(&item.isbn)
        .bind(item.quantity)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((unit_price, stock_left, threshold)) = row else {
            let exists: Option<i32> =
                sqlx::query_scalar("SELECT 1 FROM book WHERE isbn_number = $1")
                    .bind(&item.isbn)
                    .fetch_optional(&mut *tx)
                    .await?;
            return Err(match exists {
                Some(_) => OrderError::InsufficientStock(item.isbn.clone()),
                None => OrderError::BookNotFound(item.isbn.clone()),
            });
        };

        sqlx::query(
            "INSERT INTO book_order (order_id, line_no, isbn_number, item_quantity, unit_price)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(order_id)
        .bind(idx as i32 + 1)
        .bind(&item.isbn)
        .bind(item.quantity)
        .bind(unit_price)
        .execute(&mut *tx)
        .await?;

        if stock_left < threshold {
            publisher_orders::replenish_if_needed(&mut *tx, &item.isbn, threshold).await?;
        }

        total += line_total(unit_price, item.quantity);
    }

    sqlx::query("UPDATE customer_order SET cost = $2 WHERE order_id = $1")
        .bind(order_id)
        .bind(total)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(order_id, username, lines = items.len(), "order placed");
    Ok(order_id)
}

fn validate_items(items: &[LineItem]) -> Result<(), OrderError> {
    for item in items {
        if item.quantity <= 0 {
            return Err(OrderError::InvalidQuantity(item.isbn.clone()));
        }
    }
    Ok(())
}

/// Resolve the payment instrument: an existing card is checked for expiry;
/// an unknown card is registered from the supplied `YYYY-MM` expiration.
/// The insert happens inside the caller's transaction, so a failed order
/// does not leave an orphaned card.
async fn resolve_card(
    conn: &mut PgConnection,
    card_number: &str,
    expiration: Option<&str>,
    today: NaiveDate,
) -> Result<(), OrderError> {
    let expire_date = match credit_cards::find_expiration(&mut *conn, card_number).await? {
        Some(d) => d,
        None => {
            let supplied = expiration.ok_or(OrderError::PaymentInstrumentNotFound)?;
            let d = parse_expiration(supplied).ok_or(OrderError::InvalidPaymentInstrument)?;
            credit_cards::insert(&mut *conn, card_number, d).await?;
            d
        }
    };

    if is_expired(expire_date, today) {
        return Err(OrderError::PaymentInstrumentExpired);
    }
    Ok(())
}

/// Parse a `YYYY-MM` expiration into a month-granularity date (day = 1st).
/// Both parts must be bare digits; `parse` alone would accept a signed year.
fn parse_expiration(s: &str) -> Option<NaiveDate> {
    let (year, month) = s.split_once('-')?;
    if year.len() != 4 || month.len() != 2 {
        return None;
    }
    if !year.bytes().all(|b| b.is_ascii_digit()) || !month.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, 1)
}

/// A card dated strictly before the current month is expired; a card
/// expiring in the current month is still accepted.
fn is_expired(expire_date: NaiveDate, today: NaiveDate) -> bool {
    match today.with_day(1) {
        Some(month_start) => expire_date < month_start,
        None => false,
    }
}

fn line_total(unit_price: Decimal, quantity: i32) -> Decimal {
    unit_price * Decimal::from(quantity)
}

// ── Order queries ──

#[derive(sqlx::FromRow, Serialize)]
pub struct OrderSummary {
    pub order_id: i64,
    pub order_date: DateTime<Utc>,
    pub total_cost: Decimal,
}

#[derive(sqlx::FromRow, Serialize)]
pub struct AdminOrderSummary {
    pub order_id: i64,
    pub order_date: DateTime<Utc>,
    pub total_cost: Decimal,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(sqlx::FromRow, Serialize)]
pub struct OrderLine {
    pub isbn_number: String,
    pub title: String,
    pub item_quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Serialize)]
pub struct CustomerOrder {
    #[serde(flatten)]
    pub order: OrderSummary,
    pub books: Vec<OrderLine>,
}

#[derive(Serialize)]
pub struct AdminCustomerOrder {
    #[serde(flatten)]
    pub order: AdminOrderSummary,
    pub books: Vec<OrderLine>,
}

/// Fetch the lines of a set of orders in one query, grouped by order id.
async fn lines_by_order(
    pool: &PgPool,
    order_ids: &[i64],
) -> Result<HashMap<i64, Vec<OrderLine>>, sqlx::Error> {
    let rows: Vec<(i64, String, String, i32, Decimal)> = sqlx::query_as(
        "SELECT bo.order_id, bo.isbn_number, b.title, bo.item_quantity, bo.unit_price
         FROM book_order bo
         JOIN book b ON b.isbn_number = bo.isbn_number
         WHERE bo.order_id = ANY($1)
         ORDER BY bo.order_id, bo.line_no",
    )
    .bind(order_ids)
    .fetch_all(pool)
    .await?;

    let mut by_order: HashMap<i64, Vec<OrderLine>> = HashMap::new();
    for (order_id, isbn_number, title, item_quantity, unit_price) in rows {
        by_order.entry(order_id).or_default().push(OrderLine {
            isbn_number,
            title,
            item_quantity,
            unit_price,
        });
    }
    Ok(by_order)
}

/// Orders belonging to one user, newest first, with their lines.
pub async fn list_for_user(
    pool: &PgPool,
    username: &str,
) -> Result<Vec<CustomerOrder>, sqlx::Error> {
    let orders: Vec<OrderSummary> = sqlx::query_as(
        "SELECT order_id, order_date, cost AS total_cost
         FROM customer_order
         WHERE username = $1
         ORDER BY order_date DESC",
    )
    .bind(username)
    .fetch_all(pool)
    .await?;

    let ids: Vec<i64> = orders.iter().map(|o| o.order_id).collect();
    let mut lines = lines_by_order(pool, &ids).await?;
    Ok(orders
        .into_iter()
        .map(|order| CustomerOrder {
            books: lines.remove(&order.order_id).unwrap_or_default(),
            order,
        })
        .collect())
}

/// All orders with owner names and lines, newest first (admin view).
pub async fn list_all(pool: &PgPool) -> Result<Vec<AdminCustomerOrder>, sqlx::Error> {
    let orders: Vec<AdminOrderSummary> = sqlx::query_as(
        "SELECT co.order_id, co.order_date, co.cost AS total_cost,
                co.username, u.first_name, u.last_name
         FROM customer_order co
         JOIN users u ON u.username = co.username
         ORDER BY co.order_date DESC",
    )
    .fetch_all(pool)
    .await?;

    let ids: Vec<i64> = orders.iter().map(|o| o.order_id).collect();
    let mut lines = lines_by_order(pool, &ids).await?;
    Ok(orders
        .into_iter()
        .map(|order| AdminCustomerOrder {
            books: lines.remove(&order.order_id).unwrap_or_default(),
            order,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn expiration_parses_to_first_of_month() {
        assert_eq!(parse_expiration("2027-03"), Some(date(2027, 3, 1)));
        assert_eq!(parse_expiration("2027-12"), Some(date(2027, 12, 1)));
    }

    #[test]
    fn malformed_expirations_are_rejected() {
        for bad in [
            "2027", "2027-3", "27-03", "2027-13", "2027-00", "202703", "2027-3x", "",
            "+027-03", "-027-03", "2027-+3",
        ] {
            assert_eq!(parse_expiration(bad), None, "accepted {bad:?}");
        }
    }

    #[test]
    fn card_expiring_this_month_is_accepted() {
        let today = date(2026, 8, 30);
        assert!(!is_expired(date(2026, 8, 1), today));
        assert!(!is_expired(date(2026, 9, 1), today));
    }

    #[test]
    fn card_expiring_last_month_is_rejected() {
        let today = date(2026, 8, 1);
        assert!(is_expired(date(2026, 7, 1), today));
        assert!(is_expired(date(2020, 1, 1), today));
    }

    #[test]
    fn non_positive_quantities_fail_validation() {
        let items = vec![LineItem { isbn: "978-1".into(), quantity: 0 }];
        assert!(matches!(
            validate_items(&items),
            Err(OrderError::InvalidQuantity(isbn)) if isbn == "978-1"
        ));

        let items = vec![LineItem { isbn: "978-1".into(), quantity: -3 }];
        assert!(validate_items(&items).is_err());
    }

    #[test]
    fn duplicate_isbns_are_valid_independent_lines() {
        let items = vec![
            LineItem { isbn: "978-1".into(), quantity: 1 },
            LineItem { isbn: "978-1".into(), quantity: 1 },
        ];
        assert!(validate_items(&items).is_ok());
    }

    #[test]
    fn line_totals_use_decimal_arithmetic() {
        let price = Decimal::new(1000, 2); // 10.00
        assert_eq!(line_total(price, 2), Decimal::new(2000, 2));
        assert_eq!(line_total(Decimal::new(999, 2), 3), Decimal::new(2997, 2));
    }
}
