// src/services/crud/forms.rs
//
// Full-form validation run by add/edit over the merged record (stored values
// overlaid with the submitted ones). Inline edits skip this step.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, de::DeserializeOwned};
use validator::Validate;

use super::{fields::FieldMap, registry::ModelKind};
use crate::error::{AppError, FieldError, field_errors};

#[derive(Debug, Deserialize, Validate)]
pub struct BranchForm {
    #[validate(length(min = 1, max = 50, message = "Branch name must be 1 to 50 characters."))]
    pub name: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SubjectForm {
    #[validate(length(min = 1, max = 50, message = "Subject name must be 1 to 50 characters."))]
    pub name: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[validate(range(min = 1, message = "A branch must be selected."))]
    pub branch_id: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChapterForm {
    #[validate(length(min = 1, max = 50, message = "Chapter name must be 1 to 50 characters."))]
    pub name: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[validate(range(min = 1, message = "A subject must be selected."))]
    pub subject_id: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct QuizForm {
    #[validate(length(min = 1, max = 50, message = "Quiz name must be 1 to 50 characters."))]
    pub name: String,
    #[validate(range(min = 1, message = "A chapter must be selected."))]
    pub chapter_id: i64,
    #[validate(range(min = 1, max = 500, message = "Number of questions must be 1 to 500."))]
    pub question_count: i64,
    #[validate(range(min = 0, max = 86400, message = "Time limit must be 0 to 86400 seconds."))]
    pub time_limit: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct QuestionForm {
    #[validate(range(min = 1, message = "A quiz must be selected."))]
    pub quiz_id: i64,
    #[validate(length(min = 1, max = 500))]
    pub question_text: String,
    #[validate(length(min = 1, max = 100))]
    pub option1: String,
    #[validate(length(min = 1, max = 100))]
    pub option2: String,
    #[validate(length(min = 1, max = 100))]
    pub option3: String,
    #[validate(length(min = 1, max = 100))]
    pub option4: String,
    #[validate(range(min = 1, max = 4, message = "Correct answer must be option 1, 2, 3 or 4."))]
    pub correct_option: i64,
    #[validate(range(min = 1, max = 1000, message = "Marks must be 1 to 1000."))]
    pub marks: i64,
}

impl QuestionForm {
    /// The four options must be told apart by the quiz taker.
    fn duplicate_options(&self) -> Vec<FieldError> {
        let options = [&self.option1, &self.option2, &self.option3, &self.option4];
        let mut errors = Vec::new();
        for (i, option) in options.iter().enumerate() {
            let normalized = option.trim().to_lowercase();
            if options[..i]
                .iter()
                .any(|earlier| earlier.trim().to_lowercase() == normalized)
            {
                errors.push(FieldError::new(
                    format!("option{}", i + 1),
                    "duplicates an earlier option",
                ));
            }
        }
        errors
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UserForm {
    #[validate(email(message = "Username must be an email address."))]
    pub username: String,
    #[validate(length(min = 1, max = 100, message = "Name is required."))]
    pub name: String,
    #[validate(email(message = "Email must be a valid address."))]
    pub email: String,
    #[validate(custom(function = validate_dob))]
    pub dob: Option<NaiveDate>,
    pub is_admin: Option<bool>,
    pub branch_id: Option<i64>,
}

fn validate_dob(dob: &NaiveDate) -> Result<(), validator::ValidationError> {
    if *dob > Utc::now().date_naive() {
        let mut err = validator::ValidationError::new("dob_in_future");
        err.message = Some("Date of birth cannot be in the future.".into());
        return Err(err);
    }
    Ok(())
}

/// Validates the merged record of `kind`. Returns per-field errors, empty when valid.
pub fn validate(kind: ModelKind, merged: &FieldMap) -> Result<Vec<FieldError>, AppError> {
    let value = serde_json::to_value(merged)?;

    let errors = match kind {
        ModelKind::Branch => check::<BranchForm>(value)?.1,
        ModelKind::Subject => check::<SubjectForm>(value)?.1,
        ModelKind::Chapter => check::<ChapterForm>(value)?.1,
        ModelKind::Quiz => check::<QuizForm>(value)?.1,
        ModelKind::Question => {
            let (form, mut errors) = check::<QuestionForm>(value)?;
            errors.extend(form.duplicate_options());
            errors
        }
        ModelKind::User => check::<UserForm>(value)?.1,
    };

    Ok(errors)
}

fn check<F: DeserializeOwned + Validate>(
    value: serde_json::Value,
) -> Result<(F, Vec<FieldError>), AppError> {
    let form: F = serde_json::from_value(value)?;
    let errors = match form.validate() {
        Ok(()) => Vec::new(),
        Err(errors) => field_errors(&errors),
    };
    Ok((form, errors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::crud::fields::FieldValue;

    fn question(options: [&str; 4]) -> FieldMap {
        let mut map = FieldMap::new();
        map.insert("quiz_id", FieldValue::Int(1));
        map.insert("question_text", FieldValue::Text("Pick one".into()));
        map.insert("option1", FieldValue::Text(options[0].into()));
        map.insert("option2", FieldValue::Text(options[1].into()));
        map.insert("option3", FieldValue::Text(options[2].into()));
        map.insert("option4", FieldValue::Text(options[3].into()));
        map.insert("correct_option", FieldValue::Int(2));
        map.insert("marks", FieldValue::Int(5));
        map
    }

    #[test]
    fn distinct_options_pass() {
        let errors = validate(ModelKind::Question, &question(["1", "2", "3", "4"])).unwrap();
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn repeated_options_are_flagged_on_the_later_slot() {
        let errors = validate(ModelKind::Question, &question(["Paris", "Rome", "paris ", "Oslo"])).unwrap();
        assert_eq!(errors, vec![FieldError::new("option3", "duplicates an earlier option")]);
    }

    #[test]
    fn user_form_checks_email_shape_and_birth_date() {
        let mut map = FieldMap::new();
        map.insert("username", FieldValue::Text("not-an-email".into()));
        map.insert("name", FieldValue::Text("Ada".into()));
        map.insert("email", FieldValue::Text("ada@example.com".into()));
        map.insert("dob", FieldValue::Date(NaiveDate::from_ymd_opt(2999, 1, 1).unwrap()));

        let fields: Vec<String> = validate(ModelKind::User, &map)
            .unwrap()
            .into_iter()
            .map(|e| e.field)
            .collect();
        assert_eq!(fields, vec!["dob", "username"]);
    }

    #[test]
    fn derived_quiz_subject_does_not_disturb_the_form() {
        let mut map = FieldMap::new();
        map.insert("name", FieldValue::Text("Algebra Basics".into()));
        map.insert("chapter_id", FieldValue::Int(4));
        map.insert("subject_id", FieldValue::Int(9));
        map.insert("question_count", FieldValue::Int(2));
        map.insert("time_limit", FieldValue::Null);
        assert!(validate(ModelKind::Quiz, &map).unwrap().is_empty());
    }
}
