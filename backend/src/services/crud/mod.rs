// src/services/crud/mod.rs

//! Generic, registry-driven CRUD over the quiz catalogue and user accounts.
//!
//! Every operation resolves a [`ModelKind`], checks its input against the
//! model's field allow-list and runs inside one transaction: validation first,
//! then mutation, then commit. Any early return drops the transaction, which
//! rolls it back.

pub mod fields;
pub mod forms;
pub mod registry;
pub mod store;

use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::{SqliteConnection, SqlitePool};

use crate::{
    error::{AppError, FieldError},
    models::{
        branch::Branch, chapter::Chapter, question::Question, quiz::Quiz, subject::Subject,
        user::User,
    },
};

pub use fields::{FieldKind, FieldMap, FieldSpec, FieldValue, Mode};
pub use registry::ModelKind;

/// A row of any registered model.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Record {
    Branch(Branch),
    Subject(Subject),
    Chapter(Chapter),
    Quiz(Quiz),
    Question(Question),
    User(User),
}

fn text(value: &str) -> FieldValue {
    FieldValue::Text(value.to_string())
}

fn optional_text(value: &Option<String>) -> FieldValue {
    value.as_deref().map(text).unwrap_or(FieldValue::Null)
}

fn optional_int(value: Option<i64>) -> FieldValue {
    value.map(FieldValue::Int).unwrap_or(FieldValue::Null)
}

impl Record {
    pub fn id(&self) -> i64 {
        match self {
            Record::Branch(r) => r.id,
            Record::Subject(r) => r.id,
            Record::Chapter(r) => r.id,
            Record::Quiz(r) => r.id,
            Record::Question(r) => r.id,
            Record::User(r) => r.id,
        }
    }

    /// The name-like field searched by list/search.
    fn search_text(&self) -> &str {
        match self {
            Record::Branch(r) => &r.name,
            Record::Subject(r) => &r.name,
            Record::Chapter(r) => &r.name,
            Record::Quiz(r) => &r.name,
            Record::Question(r) => &r.question_text,
            Record::User(r) => &r.username,
        }
    }

    /// Current values of the editable fields (write-only fields excluded).
    fn values(&self) -> FieldMap {
        let mut map = FieldMap::new();
        match self {
            Record::Branch(r) => {
                map.insert("name", text(&r.name));
                map.insert("description", optional_text(&r.description));
            }
            Record::Subject(r) => {
                map.insert("name", text(&r.name));
                map.insert("description", optional_text(&r.description));
                map.insert("branch_id", FieldValue::Int(r.branch_id));
            }
            Record::Chapter(r) => {
                map.insert("name", text(&r.name));
                map.insert("description", optional_text(&r.description));
                map.insert("subject_id", FieldValue::Int(r.subject_id));
            }
            Record::Quiz(r) => {
                map.insert("name", text(&r.name));
                map.insert("chapter_id", FieldValue::Int(r.chapter_id));
                map.insert("subject_id", FieldValue::Int(r.subject_id));
                map.insert("question_count", FieldValue::Int(r.question_count));
                map.insert("time_limit", FieldValue::Int(r.time_limit));
            }
            Record::Question(r) => {
                map.insert("quiz_id", FieldValue::Int(r.quiz_id));
                map.insert("question_text", text(&r.question_text));
                map.insert("option1", text(&r.option1));
                map.insert("option2", text(&r.option2));
                map.insert("option3", text(&r.option3));
                map.insert("option4", text(&r.option4));
                map.insert("correct_option", FieldValue::Int(r.correct_option));
                map.insert("marks", FieldValue::Int(r.marks));
            }
            Record::User(r) => {
                map.insert("username", text(&r.username));
                map.insert("name", text(&r.name));
                map.insert("email", text(&r.email));
                map.insert("dob", r.dob.map(FieldValue::Date).unwrap_or(FieldValue::Null));
                map.insert("is_admin", FieldValue::Bool(r.is_admin));
                map.insert("branch_id", optional_int(r.branch_id));
            }
        }
        map
    }
}

fn not_found(kind: ModelKind, id: i64) -> AppError {
    AppError::NotFound(format!("No {kind} with id {id}"))
}

/// Lists every record of `kind`, or those whose name-like field contains
/// `query` case-insensitively. Read-only.
pub async fn list_or_search(
    pool: &SqlitePool,
    kind: ModelKind,
    query: Option<&str>,
) -> Result<Vec<Record>, AppError> {
    let mut conn = pool.acquire().await?;
    let records = store::load_all(&mut conn, kind).await?;

    let Some(query) = query.filter(|q| !q.is_empty()) else {
        return Ok(records);
    };

    let needle = query.to_lowercase();
    Ok(records
        .into_iter()
        .filter(|record| record.search_text().to_lowercase().contains(&needle))
        .collect())
}

pub async fn find(pool: &SqlitePool, kind: ModelKind, id: i64) -> Result<Record, AppError> {
    let mut conn = pool.acquire().await?;
    store::load_one(&mut conn, kind, id)
        .await?
        .ok_or_else(|| not_found(kind, id))
}

/// Creates a record (`id` absent) or overwrites the submitted fields of an
/// existing one. The merged record must pass full-form validation.
pub async fn add_or_edit(
    pool: &SqlitePool,
    kind: ModelKind,
    id: Option<i64>,
    input: &Map<String, Value>,
) -> Result<Record, AppError> {
    let mut changes = fields::parse(kind, input, Mode::Form)?;

    let mut tx = pool.begin().await?;

    let mut merged = match id {
        Some(id) => store::load_one(&mut tx, kind, id)
            .await?
            .ok_or_else(|| not_found(kind, id))?
            .values(),
        None => FieldMap::new(),
    };

    derive_fields(&mut tx, kind, &mut changes).await?;
    merged.extend(changes.iter().map(|(name, value)| (*name, value.clone())));

    let mut errors = fields::missing_required(kind, &merged, id.is_none());
    if errors.is_empty() {
        errors.extend(forms::validate(kind, &merged)?);
    }
    errors.extend(check_references(&mut tx, kind, &changes).await?);
    errors.extend(check_unique(&mut tx, kind, &changes, id).await?);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    fields::seal_passwords(kind, &mut changes)?;
    let id = write(&mut tx, kind, id, &changes).await?;
    let record = store::load_one(&mut tx, kind, id)
        .await?
        .ok_or_else(|| not_found(kind, id))?;

    tx.commit().await?;
    tracing::info!(model = %kind, id, "record saved");

    Ok(record)
}

/// Quick single-field edits. Only inline-editable fields are accepted and each
/// value is coerced on its own; references must still resolve.
pub async fn inline_edit(
    pool: &SqlitePool,
    kind: ModelKind,
    id: i64,
    input: &Map<String, Value>,
) -> Result<Record, AppError> {
    let mut changes = fields::parse(kind, input, Mode::Inline)?;
    if changes.is_empty() {
        return Err(AppError::BadRequest("No fields to update".to_string()));
    }

    let mut tx = pool.begin().await?;

    if !store::exists(&mut tx, kind, id).await? {
        return Err(not_found(kind, id));
    }

    derive_fields(&mut tx, kind, &mut changes).await?;

    let mut errors = check_references(&mut tx, kind, &changes).await?;
    errors.extend(check_unique(&mut tx, kind, &changes, Some(id)).await?);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    write(&mut tx, kind, Some(id), &changes).await?;
    let record = store::load_one(&mut tx, kind, id)
        .await?
        .ok_or_else(|| not_found(kind, id))?;

    tx.commit().await?;
    tracing::info!(model = %kind, id, fields = changes.len(), "record edited inline");

    Ok(record)
}

/// Deletes a record. Refused while other rows still reference it.
pub async fn delete(
    pool: &SqlitePool,
    kind: ModelKind,
    id: i64,
    actor_id: i64,
) -> Result<(), AppError> {
    if kind == ModelKind::User && id == actor_id {
        return Err(AppError::BadRequest("Cannot delete yourself".to_string()));
    }

    let mut tx = pool.begin().await?;

    if !store::exists(&mut tx, kind, id).await? {
        return Err(not_found(kind, id));
    }

    let mut blockers = Vec::new();
    for dependent in kind.dependents() {
        let count = store::count_dependents(&mut tx, dependent, id).await?;
        if count > 0 {
            blockers.push(format!("{count} {}", dependent.label));
        }
    }
    if !blockers.is_empty() {
        return Err(AppError::Conflict(format!(
            "Cannot delete {kind} {id}: still referenced by {}",
            blockers.join(", ")
        )));
    }

    store::delete(&mut tx, kind, id).await?;
    tx.commit().await?;
    tracing::info!(model = %kind, id, "record deleted");

    Ok(())
}

/// Fills server-computed fields. A quiz's subject always follows its chapter.
async fn derive_fields(
    conn: &mut SqliteConnection,
    kind: ModelKind,
    changes: &mut FieldMap,
) -> Result<(), AppError> {
    if kind != ModelKind::Quiz {
        return Ok(());
    }
    if let Some(FieldValue::Int(chapter_id)) = changes.get("chapter_id").cloned() {
        // A missing chapter is reported by the reference check.
        if let Some(subject_id) = store::chapter_subject(conn, chapter_id).await? {
            changes.insert("subject_id", FieldValue::Int(subject_id));
        }
    }
    Ok(())
}

async fn check_references(
    conn: &mut SqliteConnection,
    kind: ModelKind,
    changes: &FieldMap,
) -> Result<Vec<FieldError>, AppError> {
    let mut errors = Vec::new();
    for (name, value) in changes {
        let (Some(spec), FieldValue::Int(target_id)) = (kind.field(name), value) else {
            continue;
        };
        if let FieldKind::Reference { model } = spec.kind {
            if !store::exists(conn, model, *target_id).await? {
                errors.push(FieldError::new(*name, format!("no {model} with id {target_id}")));
            }
        }
    }
    Ok(errors)
}

async fn check_unique(
    conn: &mut SqliteConnection,
    kind: ModelKind,
    changes: &FieldMap,
    id: Option<i64>,
) -> Result<Vec<FieldError>, AppError> {
    let mut errors = Vec::new();
    for (name, value) in changes {
        let (Some(spec), FieldValue::Text(text)) = (kind.field(name), value) else {
            continue;
        };
        if spec.unique && store::is_taken(conn, kind, spec.column, text, id).await? {
            errors.push(FieldError::new(*name, "is already taken"));
        }
    }
    Ok(errors)
}

async fn write(
    conn: &mut SqliteConnection,
    kind: ModelKind,
    id: Option<i64>,
    changes: &FieldMap,
) -> Result<i64, AppError> {
    let id = match id {
        Some(id) => {
            store::update(conn, kind, id, changes).await?;
            id
        }
        None => store::insert(conn, kind, changes).await?,
    };

    if kind == ModelKind::Chapter {
        if let Some(FieldValue::Int(subject_id)) = changes.get("subject_id") {
            let moved = store::resync_quiz_subjects(conn, id, *subject_id).await?;
            tracing::debug!(chapter = id, subject = subject_id, quizzes = moved, "quiz subjects re-derived");
        }
    }

    Ok(id)
}
