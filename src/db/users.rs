use sqlx::PgPool;

#[derive(sqlx::FromRow)]
pub struct User {
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub shipping_address: Option<String>,
    pub phone_number: Option<String>,
}

pub struct NewUser<'a> {
    pub username: &'a str,
    pub password_hash: &'a str,
    pub email: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub shipping_address: Option<&'a str>,
    pub phone_number: Option<&'a str>,
}

/// Insert a new Customer account. Uniqueness of username and email is
/// enforced by the schema; violations bubble up as `sqlx::Error`.
pub async fn create(pool: &PgPool, user: &NewUser<'_>) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO users (username, password_hash, role, email, first_name, last_name, shipping_address, phone_number)
         VALUES ($1, $2, 'Customer', $3, $4, $5, $6, $7)",
    )
    .bind(user.username)
    .bind(user.password_hash)
    .bind(user.email)
    .bind(user.first_name)
    .bind(user.last_name)
    .bind(user.shipping_address)
    .bind(user.phone_number)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await
}
