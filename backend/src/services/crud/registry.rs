// src/services/crud/registry.rs

use std::{fmt, str::FromStr};

use serde::Serialize;

use super::fields::{FieldKind, FieldSpec};
use crate::error::AppError;

/// The closed set of models the admin CRUD surface manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Branch,
    Subject,
    Chapter,
    Quiz,
    Question,
    User,
}

/// A table holding a reference to another model's rows.
#[derive(Debug)]
pub struct Dependent {
    pub table: &'static str,
    pub column: &'static str,
    pub label: &'static str,
}

const fn text(name: &'static str, max: usize) -> FieldSpec {
    FieldSpec::new(name, FieldKind::Text { max })
}

const fn prose(name: &'static str, max: usize) -> FieldSpec {
    FieldSpec::new(name, FieldKind::Prose { max })
}

const fn integer(name: &'static str, min: i64, max: i64) -> FieldSpec {
    FieldSpec::new(name, FieldKind::Integer { min, max })
}

const fn reference(name: &'static str, model: ModelKind) -> FieldSpec {
    FieldSpec::new(name, FieldKind::Reference { model })
}

const BRANCH_FIELDS: &[FieldSpec] = &[
    text("name", 50).required().unique(),
    prose("description", 500),
];

const SUBJECT_FIELDS: &[FieldSpec] = &[
    text("name", 50).required().unique(),
    prose("description", 500),
    reference("branch_id", ModelKind::Branch).required(),
];

const CHAPTER_FIELDS: &[FieldSpec] = &[
    text("name", 50).required().unique(),
    prose("description", 500),
    reference("subject_id", ModelKind::Subject).required(),
];

const QUIZ_FIELDS: &[FieldSpec] = &[
    text("name", 50).required().unique(),
    reference("chapter_id", ModelKind::Chapter).required(),
    reference("subject_id", ModelKind::Subject).derived(),
    integer("question_count", 1, 500).required(),
    integer("time_limit", 0, 86_400).defaults_to(0),
];

const QUESTION_FIELDS: &[FieldSpec] = &[
    reference("quiz_id", ModelKind::Quiz).required(),
    prose("question_text", 500).required(),
    prose("option1", 100).required(),
    prose("option2", 100).required(),
    prose("option3", 100).required(),
    prose("option4", 100).required(),
    integer("correct_option", 1, 4).required(),
    integer("marks", 1, 1000).required(),
];

const USER_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("username", FieldKind::Email).required().unique(),
    FieldSpec::new("password", FieldKind::Password)
        .required()
        .form_only()
        .column("password_hash"),
    text("name", 100).required(),
    FieldSpec::new("email", FieldKind::Email).required().unique(),
    FieldSpec::new("dob", FieldKind::Date).required(),
    FieldSpec::new("is_admin", FieldKind::Flag).form_only(),
    reference("branch_id", ModelKind::Branch),
];

const BRANCH_DEPENDENTS: &[Dependent] = &[
    Dependent { table: "subjects", column: "branch_id", label: "subject(s)" },
    Dependent { table: "users", column: "branch_id", label: "user(s)" },
];

const SUBJECT_DEPENDENTS: &[Dependent] = &[
    Dependent { table: "chapters", column: "subject_id", label: "chapter(s)" },
    Dependent { table: "quizzes", column: "subject_id", label: "quiz(zes)" },
];

const CHAPTER_DEPENDENTS: &[Dependent] = &[
    Dependent { table: "quizzes", column: "chapter_id", label: "quiz(zes)" },
];

const QUIZ_DEPENDENTS: &[Dependent] = &[
    Dependent { table: "questions", column: "quiz_id", label: "question(s)" },
    Dependent { table: "scores", column: "quiz_id", label: "recorded score(s)" },
];

const USER_DEPENDENTS: &[Dependent] = &[
    Dependent { table: "scores", column: "user_id", label: "recorded score(s)" },
];

impl ModelKind {
    pub const ALL: [ModelKind; 6] = [
        ModelKind::Branch,
        ModelKind::Subject,
        ModelKind::Chapter,
        ModelKind::Quiz,
        ModelKind::Question,
        ModelKind::User,
    ];

    /// Resolves a model name from a request path. Plural forms are accepted.
    pub fn resolve(name: &str) -> Result<Self, AppError> {
        name.parse()
    }

    pub fn name(self) -> &'static str {
        match self {
            ModelKind::Branch => "branch",
            ModelKind::Subject => "subject",
            ModelKind::Chapter => "chapter",
            ModelKind::Quiz => "quiz",
            ModelKind::Question => "question",
            ModelKind::User => "user",
        }
    }

    pub fn table(self) -> &'static str {
        match self {
            ModelKind::Branch => "branches",
            ModelKind::Subject => "subjects",
            ModelKind::Chapter => "chapters",
            ModelKind::Quiz => "quizzes",
            ModelKind::Question => "questions",
            ModelKind::User => "users",
        }
    }

    /// Editable fields, in form order.
    pub fn fields(self) -> &'static [FieldSpec] {
        match self {
            ModelKind::Branch => BRANCH_FIELDS,
            ModelKind::Subject => SUBJECT_FIELDS,
            ModelKind::Chapter => CHAPTER_FIELDS,
            ModelKind::Quiz => QUIZ_FIELDS,
            ModelKind::Question => QUESTION_FIELDS,
            ModelKind::User => USER_FIELDS,
        }
    }

    pub fn field(self, name: &str) -> Option<&'static FieldSpec> {
        self.fields().iter().find(|spec| spec.name == name)
    }

    /// Tables whose rows must be gone before a row of this model can be deleted.
    pub fn dependents(self) -> &'static [Dependent] {
        match self {
            ModelKind::Branch => BRANCH_DEPENDENTS,
            ModelKind::Subject => SUBJECT_DEPENDENTS,
            ModelKind::Chapter => CHAPTER_DEPENDENTS,
            ModelKind::Quiz => QUIZ_DEPENDENTS,
            ModelKind::Question => &[],
            ModelKind::User => USER_DEPENDENTS,
        }
    }
}

impl FromStr for ModelKind {
    type Err = AppError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_ascii_lowercase().as_str() {
            "branch" | "branches" => Ok(ModelKind::Branch),
            "subject" | "subjects" => Ok(ModelKind::Subject),
            "chapter" | "chapters" => Ok(ModelKind::Chapter),
            "quiz" | "quizzes" => Ok(ModelKind::Quiz),
            "question" | "questions" => Ok(ModelKind::Question),
            "user" | "users" => Ok(ModelKind::User),
            _ => Err(AppError::UnknownModel(name.to_string())),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
