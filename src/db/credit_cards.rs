//! Credit card storage
//!
//! Rows are created only by the order workflow, inside the order
//! transaction, so both functions take the open connection rather than the
//! pool.

use chrono::NaiveDate;
use sqlx::PgConnection;

pub async fn find_expiration(
    conn: &mut PgConnection,
    card_number: &str,
) -> Result<Option<NaiveDate>, sqlx::Error> {
    sqlx::query_scalar("SELECT expire_date FROM credit_card WHERE card_number = $1")
        .bind(card_number)
        .fetch_optional(conn)
        .await
}

pub async fn insert(
    conn: &mut PgConnection,
    card_number: &str,
    expire_date: NaiveDate,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO credit_card (card_number, expire_date) VALUES ($1, $2)")
        .bind(card_number)
        .bind(expire_date)
        .execute(conn)
        .await?;
    Ok(())
}
