// src/services/crud/store.rs
//
// SQL for the generic CRUD paths. Table and column names interpolated into
// statements come from the static registry, never from request input; every
// value is bound.

use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection, sqlite::SqliteRow};

use super::{
    Record,
    fields::{FieldMap, FieldValue},
    registry::{Dependent, ModelKind},
};
use crate::models::{
    branch::Branch, chapter::Chapter, question::Question, quiz::Quiz, subject::Subject, user::User,
};

async fn rows<T>(
    conn: &mut SqliteConnection,
    sql: &str,
    id: Option<i64>,
) -> Result<Vec<T>, sqlx::Error>
where
    T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
{
    let mut query = sqlx::query_as::<_, T>(sql);
    if let Some(id) = id {
        query = query.bind(id);
    }
    query.fetch_all(conn).await
}

async fn load(
    conn: &mut SqliteConnection,
    kind: ModelKind,
    id: Option<i64>,
) -> Result<Vec<Record>, sqlx::Error> {
    let sql = match id {
        Some(_) => format!("SELECT * FROM {} WHERE id = ?", kind.table()),
        None => format!("SELECT * FROM {} ORDER BY id", kind.table()),
    };

    let records = match kind {
        ModelKind::Branch => rows::<Branch>(conn, &sql, id).await?.into_iter().map(Record::Branch).collect(),
        ModelKind::Subject => rows::<Subject>(conn, &sql, id).await?.into_iter().map(Record::Subject).collect(),
        ModelKind::Chapter => rows::<Chapter>(conn, &sql, id).await?.into_iter().map(Record::Chapter).collect(),
        ModelKind::Quiz => rows::<Quiz>(conn, &sql, id).await?.into_iter().map(Record::Quiz).collect(),
        ModelKind::Question => rows::<Question>(conn, &sql, id).await?.into_iter().map(Record::Question).collect(),
        ModelKind::User => rows::<User>(conn, &sql, id).await?.into_iter().map(Record::User).collect(),
    };

    Ok(records)
}

/// Every row of the model, ordered by id.
pub async fn load_all(conn: &mut SqliteConnection, kind: ModelKind) -> Result<Vec<Record>, sqlx::Error> {
    load(conn, kind, None).await
}

pub async fn load_one(
    conn: &mut SqliteConnection,
    kind: ModelKind,
    id: i64,
) -> Result<Option<Record>, sqlx::Error> {
    Ok(load(conn, kind, Some(id)).await?.into_iter().next())
}

pub async fn exists(conn: &mut SqliteConnection, kind: ModelKind, id: i64) -> Result<bool, sqlx::Error> {
    let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?)", kind.table());
    let found: i64 = sqlx::query_scalar(&sql).bind(id).fetch_one(conn).await?;
    Ok(found != 0)
}

/// Whether another row already holds `value` in a unique column (case-insensitive).
pub async fn is_taken(
    conn: &mut SqliteConnection,
    kind: ModelKind,
    column: &str,
    value: &str,
    except_id: Option<i64>,
) -> Result<bool, sqlx::Error> {
    let sql = format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE {} = ? COLLATE NOCASE AND id != ?)",
        kind.table(),
        column
    );
    let found: i64 = sqlx::query_scalar(&sql)
        .bind(value)
        .bind(except_id.unwrap_or(0))
        .fetch_one(conn)
        .await?;
    Ok(found != 0)
}

pub async fn count_dependents(
    conn: &mut SqliteConnection,
    dependent: &Dependent,
    id: i64,
) -> Result<i64, sqlx::Error> {
    let sql = format!(
        "SELECT COUNT(*) FROM {} WHERE {} = ?",
        dependent.table, dependent.column
    );
    sqlx::query_scalar(&sql).bind(id).fetch_one(conn).await
}

fn push_value(builder: &mut QueryBuilder<'_, Sqlite>, value: &FieldValue) {
    match value.clone() {
        FieldValue::Null => builder.push("NULL"),
        FieldValue::Int(v) => builder.push_bind(v),
        FieldValue::Bool(v) => builder.push_bind(v),
        FieldValue::Date(v) => builder.push_bind(v),
        FieldValue::Text(v) => builder.push_bind(v),
    };
}

fn column_of(kind: ModelKind, name: &str) -> String {
    kind.field(name)
        .map(|spec| spec.column.to_string())
        .unwrap_or_else(|| name.to_string())
}

/// Inserts a row and returns its id.
pub async fn insert(
    conn: &mut SqliteConnection,
    kind: ModelKind,
    values: &FieldMap,
) -> Result<i64, sqlx::Error> {
    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("INSERT INTO {} (", kind.table()));

    for (i, name) in values.keys().enumerate() {
        if i > 0 {
            builder.push(", ");
        }
        builder.push(column_of(kind, name));
    }

    builder.push(") VALUES (");
    for (i, value) in values.values().enumerate() {
        if i > 0 {
            builder.push(", ");
        }
        push_value(&mut builder, value);
    }
    builder.push(")");

    let result = builder.build().execute(conn).await?;
    Ok(result.last_insert_rowid())
}

/// Overwrites the given columns of one row. An empty map is a no-op.
pub async fn update(
    conn: &mut SqliteConnection,
    kind: ModelKind,
    id: i64,
    values: &FieldMap,
) -> Result<(), sqlx::Error> {
    if values.is_empty() {
        return Ok(());
    }

    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("UPDATE {} SET ", kind.table()));

    for (i, (name, value)) in values.iter().enumerate() {
        if i > 0 {
            builder.push(", ");
        }
        builder.push(column_of(kind, name));
        builder.push(" = ");
        push_value(&mut builder, value);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    builder.build().execute(conn).await?;
    Ok(())
}

pub async fn delete(conn: &mut SqliteConnection, kind: ModelKind, id: i64) -> Result<u64, sqlx::Error> {
    let sql = format!("DELETE FROM {} WHERE id = ?", kind.table());
    let result = sqlx::query(&sql).bind(id).execute(conn).await?;
    Ok(result.rows_affected())
}

/// Subject of a chapter, `None` when the chapter does not exist.
pub async fn chapter_subject(
    conn: &mut SqliteConnection,
    chapter_id: i64,
) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar("SELECT subject_id FROM chapters WHERE id = ?")
        .bind(chapter_id)
        .fetch_optional(conn)
        .await
}

/// Re-derives the subject of every quiz in a chapter after the chapter moved.
pub async fn resync_quiz_subjects(
    conn: &mut SqliteConnection,
    chapter_id: i64,
    subject_id: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE quizzes SET subject_id = ? WHERE chapter_id = ?")
        .bind(subject_id)
        .bind(chapter_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}
