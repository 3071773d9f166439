//! JWT authentication for the customer and admin API
//!
//! Tokens carry the username and role. The auth middleware validates the
//! bearer token and injects an [`AuthUser`] into request extensions; the
//! admin middleware additionally requires `Role::Admin`.

use axum::{
    Extension,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// JWT claims for user authentication
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Username
    pub sub: String,
    /// Role: Customer | Admin
    pub role: String,
    /// Expiration (Unix timestamp seconds)
    pub exp: usize,
    /// Issued at (Unix timestamp seconds)
    pub iat: usize,
}

/// User role, as stored in the `users.role` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Customer,
    Admin,
}

impl Role {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "Customer" => Some(Self::Customer),
            "Admin" => Some(Self::Admin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "Customer",
            Self::Admin => "Admin",
        }
    }
}

/// Authenticated identity extracted from the JWT
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub username: String,
    pub role: Role,
}

const JWT_EXPIRY_HOURS: i64 = 24;

/// Create a JWT token for a user
pub fn create_token(
    username: &str,
    role: Role,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now();
    let claims = Claims {
        sub: username.to_string(),
        role: role.as_str().to_string(),
        exp: (now + chrono::Duration::hours(JWT_EXPIRY_HOURS)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Decode and validate a JWT token
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

/// Middleware that extracts and verifies the JWT from the Authorization header
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| error_response(401, "Missing Authorization header"))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| error_response(401, "Invalid Authorization format"))?;

    let claims = decode_token(token, &state.jwt_secret).map_err(|e| {
        tracing::debug!("JWT validation failed: {e}");
        error_response(401, "Invalid or expired token")
    })?;

    let role = Role::from_db(&claims.role)
        .ok_or_else(|| error_response(401, "Invalid or expired token"))?;

    request.extensions_mut().insert(AuthUser {
        username: claims.sub,
        role,
    });

    Ok(next.run(request).await)
}

/// Middleware gating admin-only routes; runs after [`auth_middleware`]
pub async fn require_admin(
    Extension(user): Extension<AuthUser>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    if user.role != Role::Admin {
        return Err(error_response(403, "Admin access required"));
    }
    Ok(next.run(request).await)
}

fn error_response(status: u16, message: &str) -> Response {
    let body = serde_json::json!({ "msg": message });
    let status =
        http::StatusCode::from_u16(status).unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR);
    (status, axum::Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_roundtrip_preserves_identity_and_role() {
        let token = create_token("alice", Role::Admin, "test-secret").expect("encode");
        let claims = decode_token(&token, "test-secret").expect("decode");
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.role, "Admin");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = create_token("alice", Role::Customer, "test-secret").expect("encode");
        assert!(decode_token(&token, "other-secret").is_err());
    }

    #[test]
    fn role_from_db_rejects_unknown() {
        assert_eq!(Role::from_db("Customer"), Some(Role::Customer));
        assert_eq!(Role::from_db("Admin"), Some(Role::Admin));
        assert_eq!(Role::from_db("root"), None);
    }
}
