// src/models/branch.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'branches' table in the database.
/// Top-level grouping of users and subjects (e.g. a department).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Branch {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}
