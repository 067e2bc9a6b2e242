// src/services/crud/fields.rs

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};
use validator::ValidateEmail;

use super::registry::ModelKind;
use crate::{
    error::{AppError, FieldError},
    utils::{hash::hash_password, html::clean_html},
};

/// How a submitted value is interpreted before it may reach the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    /// Plain single-line text, trimmed.
    Text { max: usize },
    /// Free text rendered by clients; trimmed and HTML-sanitized.
    Prose { max: usize },
    Integer { min: i64, max: i64 },
    /// Id of a row of another model. Nullable unless the field is required.
    Reference { model: ModelKind },
    Email,
    /// `YYYY-MM-DD`.
    Date,
    Flag,
    /// Write-only; hashed before it is stored.
    Password,
}

/// One entry of a model's editable-field allow-list.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    #[serde(skip)]
    pub column: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub unique: bool,
    /// Accepted by inline edits.
    pub inline: bool,
    /// Computed by the server, never accepted from input.
    pub derived: bool,
    /// Stored when an optional integer is submitted blank.
    pub default: Option<i64>,
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            column: name,
            kind,
            required: false,
            unique: false,
            inline: true,
            derived: false,
            default: None,
        }
    }

    pub const fn required(self) -> Self {
        Self { required: true, ..self }
    }

    pub const fn unique(self) -> Self {
        Self { unique: true, ..self }
    }

    pub const fn form_only(self) -> Self {
        Self { inline: false, ..self }
    }

    pub const fn derived(self) -> Self {
        Self {
            derived: true,
            inline: false,
            ..self
        }
    }

    pub const fn defaults_to(self, value: i64) -> Self {
        Self {
            default: Some(value),
            ..self
        }
    }

    pub const fn column(self, column: &'static str) -> Self {
        Self { column, ..self }
    }

    fn write_only(&self) -> bool {
        matches!(self.kind, FieldKind::Password)
    }
}

/// A coerced, typed field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Int(i64),
    Bool(bool),
    Date(NaiveDate),
    Text(String),
}

pub type FieldMap = BTreeMap<&'static str, FieldValue>;

/// Which write path the input arrives through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Form,
    Inline,
}

/// Checks every submitted key against the model's allow-list and coerces its value.
///
/// All offending fields are reported together.
pub fn parse(kind: ModelKind, input: &Map<String, Value>, mode: Mode) -> Result<FieldMap, AppError> {
    let mut values = FieldMap::new();
    let mut errors = Vec::new();

    for (key, raw) in input {
        let Some(spec) = kind.field(key) else {
            errors.push(FieldError::new(key.as_str(), "unknown field"));
            continue;
        };
        if spec.derived {
            errors.push(FieldError::new(spec.name, "is derived and cannot be set"));
            continue;
        }
        if mode == Mode::Inline && !spec.inline {
            errors.push(FieldError::new(spec.name, "cannot be edited inline"));
            continue;
        }
        match coerce(spec, raw) {
            Ok(value) => {
                values.insert(spec.name, value);
            }
            Err(reason) => errors.push(FieldError::new(spec.name, reason)),
        }
    }

    if errors.is_empty() {
        Ok(values)
    } else {
        Err(AppError::Validation(errors))
    }
}

/// Coerces one raw input value according to its field kind.
pub fn coerce(spec: &FieldSpec, raw: &Value) -> Result<FieldValue, String> {
    if is_blank(raw) {
        return match (spec.required, spec.default) {
            (true, _) => Err("is required".to_string()),
            (false, Some(default)) => Ok(FieldValue::Int(default)),
            (false, None) => Ok(FieldValue::Null),
        };
    }

    match spec.kind {
        FieldKind::Text { max } => {
            let text = as_text(raw)?;
            check_length(&text, max)?;
            Ok(FieldValue::Text(text))
        }
        FieldKind::Prose { max } => {
            let text = clean_html(&as_text(raw)?);
            if text.is_empty() && spec.required {
                return Err("is required".to_string());
            }
            check_length(&text, max)?;
            Ok(FieldValue::Text(text))
        }
        FieldKind::Integer { min, max } => {
            let n = as_int(raw)?;
            if n < min || n > max {
                return Err(format!("must be between {min} and {max}"));
            }
            Ok(FieldValue::Int(n))
        }
        FieldKind::Reference { .. } => {
            let id = as_int(raw)?;
            if id < 1 {
                return Err("must be a positive id".to_string());
            }
            Ok(FieldValue::Int(id))
        }
        FieldKind::Email => {
            let text = as_text(raw)?;
            if !text.validate_email() {
                return Err("must be a valid email address".to_string());
            }
            Ok(FieldValue::Text(text))
        }
        FieldKind::Date => {
            let text = as_text(raw)?;
            NaiveDate::parse_from_str(&text, "%Y-%m-%d")
                .map(FieldValue::Date)
                .map_err(|_| "must be a date in YYYY-MM-DD format".to_string())
        }
        FieldKind::Flag => as_flag(raw).map(FieldValue::Bool),
        FieldKind::Password => {
            // Passwords are taken verbatim, whitespace included.
            let Value::String(password) = raw else {
                return Err("must be text".to_string());
            };
            let len = password.chars().count();
            if !(8..=128).contains(&len) {
                return Err("must be between 8 and 128 characters".to_string());
            }
            Ok(FieldValue::Text(password.clone()))
        }
    }
}

/// Required fields absent (or null) in `values`.
///
/// On edits the record already has a stored secret, so write-only fields are skipped.
pub fn missing_required(kind: ModelKind, values: &FieldMap, creating: bool) -> Vec<FieldError> {
    kind.fields()
        .iter()
        .filter(|spec| spec.required && !spec.derived)
        .filter(|spec| creating || !spec.write_only())
        .filter(|spec| matches!(values.get(spec.name), None | Some(FieldValue::Null)))
        .map(|spec| FieldError::new(spec.name, "is required"))
        .collect()
}

/// Replaces plaintext passwords by their hashes. Runs only once validation has passed.
pub fn seal_passwords(kind: ModelKind, values: &mut FieldMap) -> Result<(), AppError> {
    for spec in kind.fields().iter().filter(|spec| spec.write_only()) {
        if let Some(FieldValue::Text(plain)) = values.get(spec.name) {
            let hashed = hash_password(plain)?;
            values.insert(spec.name, FieldValue::Text(hashed));
        }
    }
    Ok(())
}

fn is_blank(raw: &Value) -> bool {
    match raw {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn as_text(raw: &Value) -> Result<String, String> {
    match raw {
        Value::String(s) => Ok(s.trim().to_string()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err("must be text".to_string()),
    }
}

/// Accepts JSON numbers and numeric strings (HTML forms submit everything as text).
fn as_int(raw: &Value) -> Result<i64, String> {
    match raw {
        Value::Number(n) => n.as_i64().ok_or_else(|| "must be a whole number".to_string()),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| "must be a whole number".to_string()),
        _ => Err("must be a whole number".to_string()),
    }
}

fn as_flag(raw: &Value) -> Result<bool, String> {
    match raw {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) if n.as_i64() == Some(0) => Ok(false),
        Value::Number(n) if n.as_i64() == Some(1) => Ok(true),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "on" | "yes" | "1" => Ok(true),
            "false" | "off" | "no" | "0" => Ok(false),
            _ => Err("must be true or false".to_string()),
        },
        _ => Err("must be true or false".to_string()),
    }
}

fn check_length(text: &str, max: usize) -> Result<(), String> {
    if text.chars().count() > max {
        return Err(format!("must be at most {max} characters"));
    }
    Ok(())
}
