//! Account endpoints: register, login, profile, order history

use axum::response::IntoResponse;
use axum::{Extension, Json, extract::State};
use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::auth::{AuthUser, Role, create_token};
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::util::{hash_password, verify_password};

/// POST /api/users/register
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub shipping_address: Option<String>,
    pub phone_number: Option<String>,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = req.username.trim();
    let email = req.email.trim().to_lowercase();

    if username.is_empty()
        || email.is_empty()
        || req.first_name.trim().is_empty()
        || req.last_name.trim().is_empty()
    {
        return Err(ApiError::BadRequest("Missing required fields".into()));
    }
    if req.password.len() < 8 {
        return Err(ApiError::BadRequest(
            "Password must be at least 8 characters".into(),
        ));
    }

    let password_hash = hash_password(&req.password).map_err(|e| {
        tracing::error!("Password hashing failed: {e}");
        ApiError::Internal
    })?;

    // New accounts are always Customers; admins are provisioned directly.
    db::users::create(
        &state.pool,
        &db::users::NewUser {
            username,
            password_hash: &password_hash,
            email: &email,
            first_name: req.first_name.trim(),
            last_name: req.last_name.trim(),
            shipping_address: req.shipping_address.as_deref(),
            phone_number: req.phone_number.as_deref(),
        },
    )
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(db_err) = &e
            && db_err.is_unique_violation()
        {
            return ApiError::Conflict("Username or email already exists".into());
        }
        ApiError::from(e)
    })?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "msg": "success" })),
    ))
}

/// POST /api/users/login
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub role: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let user = db::users::find_by_username(&state.pool, req.username.trim())
        .await?
        .ok_or(ApiError::Unauthorized)?;

    if !verify_password(&req.password, &user.password_hash) {
        return Err(ApiError::Unauthorized);
    }

    let role = Role::from_db(&user.role).ok_or_else(|| {
        tracing::error!(username = %user.username, role = %user.role, "unknown role in users table");
        ApiError::Internal
    })?;

    let access_token = create_token(&user.username, role, &state.jwt_secret).map_err(|e| {
        tracing::error!("JWT creation failed: {e}");
        ApiError::Internal
    })?;

    Ok(Json(LoginResponse {
        access_token,
        role: user.role,
    }))
}

/// GET /api/users/me
#[derive(Serialize)]
pub struct Profile {
    pub username: String,
    pub role: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub shipping_address: Option<String>,
    pub phone_number: Option<String>,
}

pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Profile> {
    let user = db::users::find_by_username(&state.pool, &auth.username)
        .await?
        .ok_or(ApiError::NotFound("User"))?;

    Ok(Json(Profile {
        username: user.username,
        role: user.role,
        email: user.email,
        first_name: user.first_name,
        last_name: user.last_name,
        shipping_address: user.shipping_address,
        phone_number: user.phone_number,
    }))
}

/// GET /api/users/me/orders
pub async fn my_orders(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Vec<db::orders::CustomerOrder>> {
    let orders = db::orders::list_for_user(&state.pool, &auth.username).await?;
    Ok(Json(orders))
}
