// src/services/accounts.rs

use serde_json::{Map, Value, json};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    config::Config,
    error::{AppError, FieldError},
    models::user::{ChangePasswordRequest, LoginRequest, RegisterRequest, User, Viewer},
    services::crud::{self, ModelKind, Record},
    utils::{
        hash::{hash_password, verify_password},
        jwt::sign_jwt,
    },
};

/// Self-registration. Goes through the generic dispatcher so the user
/// allow-list, uniqueness and reference checks apply unchanged.
pub async fn register(pool: &SqlitePool, payload: RegisterRequest) -> Result<User, AppError> {
    payload.validate()?;

    let email = payload.email.unwrap_or_else(|| payload.username.clone());

    let mut input = Map::new();
    input.insert("username".into(), Value::String(payload.username));
    input.insert("password".into(), Value::String(payload.password));
    input.insert("name".into(), Value::String(payload.name));
    input.insert("email".into(), Value::String(email));
    input.insert("dob".into(), json!(payload.dob));
    if let Some(branch_id) = payload.branch_id {
        input.insert("branch_id".into(), json!(branch_id));
    }

    let user = save_user(pool, None, &input).await?;
    tracing::info!(user = user.id, "user registered");
    Ok(user)
}

/// Fields a user may change on their own account.
const SELF_EDITABLE: &[&str] = &["username", "name", "dob"];

/// Self-service edit of the caller's own details. Rights (`is_admin`,
/// `branch_id`) and the password are outside the allow-list.
pub async fn update_details(
    pool: &SqlitePool,
    user_id: i64,
    input: &Map<String, Value>,
) -> Result<User, AppError> {
    let forbidden: Vec<FieldError> = input
        .keys()
        .filter(|key| !SELF_EDITABLE.contains(&key.as_str()))
        .map(|key| FieldError::new(key.as_str(), "cannot be changed here"))
        .collect();
    if !forbidden.is_empty() {
        return Err(AppError::Validation(forbidden));
    }
    if input.is_empty() {
        return Err(AppError::BadRequest("No fields to update".to_string()));
    }

    let user = save_user(pool, Some(user_id), input).await?;
    tracing::info!(user = user.id, "user details updated");
    Ok(user)
}

/// Replaces the caller's password once the current one is confirmed.
pub async fn change_password(
    pool: &SqlitePool,
    user_id: i64,
    payload: ChangePasswordRequest,
) -> Result<(), AppError> {
    payload.validate()?;

    let stored: String = sqlx::query_scalar("SELECT password_hash FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if !verify_password(&payload.current_password, &stored)? {
        tracing::warn!(user = user_id, "rejected password change");
        return Err(AppError::Validation(vec![FieldError::new(
            "current_password",
            "is incorrect",
        )]));
    }

    // Only the secret changes, so the rest of the user form is not re-validated.
    sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
        .bind(hash_password(&payload.password)?)
        .bind(user_id)
        .execute(pool)
        .await?;

    tracing::info!(user = user_id, "password changed");
    Ok(())
}

/// The user's rights as currently stored. A deleted account has none.
pub async fn viewer(pool: &SqlitePool, user_id: i64) -> Result<Viewer, AppError> {
    sqlx::query_as::<_, Viewer>("SELECT is_admin, branch_id FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::AuthError("Account no longer exists".to_string()))
}

async fn save_user(
    pool: &SqlitePool,
    id: Option<i64>,
    input: &Map<String, Value>,
) -> Result<User, AppError> {
    match crud::add_or_edit(pool, ModelKind::User, id, input).await? {
        Record::User(user) => Ok(user),
        other => Err(AppError::InternalServerError(format!(
            "user write produced a non-user record {}",
            other.id()
        ))),
    }
}

/// Checks credentials and signs a login token.
///
/// Unknown usernames and wrong passwords are reported identically.
pub async fn authenticate(
    pool: &SqlitePool,
    config: &Config,
    payload: &LoginRequest,
) -> Result<(String, User), AppError> {
    payload.validate()?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ? COLLATE NOCASE")
        .bind(payload.username.trim())
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            tracing::error!("Login DB error: {:?}", e);
            AppError::from(e)
        })?;

    let invalid = || AppError::AuthError("Invalid username or password".to_string());

    let user = user.ok_or_else(invalid)?;
    if !verify_password(&payload.password, &user.password_hash)? {
        tracing::warn!(user = user.id, "rejected login attempt");
        return Err(invalid());
    }

    let token = sign_jwt(&user, &config.jwt_secret, config.jwt_expiration)?;
    Ok((token, user))
}

/// Creates the admin account named in the configuration when it does not exist yet.
pub async fn seed_admin(pool: &SqlitePool, config: &Config) -> Result<(), AppError> {
    let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password) else {
        return Ok(());
    };

    let exists: i64 =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = ? COLLATE NOCASE)")
            .bind(username)
            .fetch_one(pool)
            .await?;
    if exists != 0 {
        return Ok(());
    }

    tracing::info!("Seeding admin user: {}", username);
    let hashed_password = hash_password(password)?;

    sqlx::query(
        "INSERT INTO users (username, password_hash, name, email, is_admin) VALUES (?, ?, 'Admin', ?, 1)",
    )
    .bind(username)
    .bind(hashed_password)
    .bind(username)
    .execute(pool)
    .await?;

    tracing::info!("Admin user created successfully.");
    Ok(())
}
