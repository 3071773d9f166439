use serde::Serialize;
use sqlx::PgPool;

#[derive(sqlx::FromRow, Serialize)]
pub struct PublisherRow {
    pub publisher_id: i64,
    pub name: String,
}

pub async fn list(pool: &PgPool) -> Result<Vec<PublisherRow>, sqlx::Error> {
    sqlx::query_as("SELECT publisher_id, name FROM publisher ORDER BY name")
        .fetch_all(pool)
        .await
}
