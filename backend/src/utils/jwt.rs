// src/utils/jwt.rs

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{config::Config, error::AppError, models::user::User};

/// JWT Claims structure.
///
/// This is the authenticated identity handed to every operation: handlers
/// receive it explicitly through request extensions.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    /// Subject - Stores the User ID (as string).
    pub sub: String,
    /// User's role ('user' or 'admin').
    pub role: String,
    /// Branch the user registered under, if any.
    pub branch_id: Option<i64>,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

impl Claims {
    pub fn user_id(&self) -> Result<i64, AppError> {
        self.sub
            .parse::<i64>()
            .map_err(|_| AppError::AuthError("Invalid token subject".to_string()))
    }

    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

/// Claims of an attempt token, issued when a quiz attempt starts.
/// Redeemable once: the attempt id is unique among recorded scores.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AttemptClaims {
    /// Attempt id (UUID v4).
    pub sub: String,
    pub quiz_id: i64,
    pub user_id: i64,
    pub exp: usize,
}

fn expires_at(seconds: u64) -> Result<usize, AppError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .as_secs();

    Ok(usize::try_from(now.saturating_add(seconds)).unwrap_or(usize::MAX))
}

fn sign<T: Serialize>(claims: &T, secret: &str) -> Result<String, AppError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

fn verify<T: DeserializeOwned>(token: &str, secret: &str) -> Result<T, AppError> {
    decode::<T>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::AuthError("Invalid token".to_string()))
}

/// Signs a login token for the user.
pub fn sign_jwt(user: &User, secret: &str, expiration_seconds: u64) -> Result<String, AppError> {
    let claims = Claims {
        sub: user.id.to_string(), // Store User ID in 'sub' claim
        role: user.role().to_owned(),
        branch_id: user.branch_id,
        exp: expires_at(expiration_seconds)?,
    };

    sign(&claims, secret)
}

/// Verifies and decodes a login token.
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    verify(token, secret)
}

/// Signs an attempt token binding `attempt_id` to one user and one quiz.
pub fn sign_attempt_token(
    attempt_id: &str,
    quiz_id: i64,
    user_id: i64,
    secret: &str,
    ttl_seconds: u64,
) -> Result<String, AppError> {
    let claims = AttemptClaims {
        sub: attempt_id.to_owned(),
        quiz_id,
        user_id,
        exp: expires_at(ttl_seconds)?,
    };

    sign(&claims, secret)
}

/// Verifies an attempt token. Login tokens are rejected (they lack the quiz binding).
pub fn verify_attempt_token(token: &str, secret: &str) -> Result<AttemptClaims, AppError> {
    verify(token, secret)
        .map_err(|_| AppError::BadRequest("Invalid or expired attempt token".to_string()))
}

/// Axum Middleware: Authentication.
///
/// Intercepts requests, validates the 'Authorization: Bearer <token>' header.
/// If valid, injects `Claims` into the request extensions for handlers to use.
/// If invalid, returns 401 Unauthorized.
pub async fn auth_middleware(
    State(config): State<Config>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    match verify_jwt(token, &config.jwt_secret) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            Ok(next.run(req).await)
        }
        Err(_) => Err(StatusCode::UNAUTHORIZED),
    }
}

/// Axum Middleware: Admin Authorization.
///
/// Must be used AFTER `auth_middleware`. Checks if the injected `Claims` has 'admin' role.
/// If not, returns 403 Forbidden.
pub async fn admin_middleware(req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    let claims = req
        .extensions()
        .get::<Claims>()
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if !claims.is_admin() {
        return Err(StatusCode::FORBIDDEN);
    }

    Ok(next.run(req).await)
}
