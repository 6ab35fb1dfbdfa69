//! User-facing form definitions.
//!
//! DESIGN
//! ======
//! Each form states its exposed fields, labels and help texts as static
//! `FieldSpec` tables and validates the submitted request shape by hand.
//! Nothing is inferred from the table schema: a field that is not listed
//! here cannot be set by a user, whatever the request carries.
//!
//! ERROR HANDLING
//! ==============
//! Validation problems are collected per field into `FormErrors` and returned
//! as data; only infrastructure failures (database lookups made during
//! validation) surface as `FormError::Database`.

pub mod comment;
pub mod post;

use std::collections::BTreeMap;

use serde::Serialize;

pub use comment::{CommentForm, CommentFormData};
pub use post::{CleanedPost, ImageChange, PostForm, PostFormData};

pub const MSG_REQUIRED: &str = "This field is required.";
pub const MSG_INVALID_CHOICE: &str = "Select a valid choice. That choice is not one of the available choices.";

/// How a field is rendered by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Widget {
    Textarea,
    Select,
    ClearableFileInput,
}

/// Static description of one exposed form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_text: Option<&'static str>,
    pub required: bool,
    pub widget: Widget,
    /// Values are formatted according to the active locale when displayed.
    pub localized: bool,
}

/// Per-field validation messages, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<&'static str, Vec<String>>);

impl FormErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a single message on a single field.
    #[must_use]
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// `Ok(value)` when no errors were collected.
    ///
    /// # Errors
    ///
    /// Returns `self` when any field has a message.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FormError {
    #[error("form is invalid")]
    Invalid(FormErrors),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<FormErrors> for FormError {
    fn from(errors: FormErrors) -> Self {
        Self::Invalid(errors)
    }
}

/// Strip a submitted text value; blank counts as missing.
pub(crate) fn clean_text(raw: Option<String>) -> Option<String> {
    raw.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_errors_collect_per_field() {
        let mut errors = FormErrors::new();
        assert!(errors.is_empty());
        errors.add("text", MSG_REQUIRED);
        errors.add("text", "second");
        errors.add("group", MSG_INVALID_CHOICE);

        assert_eq!(errors.get("text").map(<[String]>::len), Some(2));
        assert!(errors.has("group"));
        assert!(!errors.has("image"));
    }

    #[test]
    fn form_errors_serialize_as_plain_map() {
        let errors = FormErrors::single("text", MSG_REQUIRED);
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json, serde_json::json!({"text": [MSG_REQUIRED]}));
    }

    #[test]
    fn into_result_passes_value_when_clean() {
        assert_eq!(FormErrors::new().into_result(5), Ok(5));
        assert!(FormErrors::single("x", "bad").into_result(5).is_err());
    }

    #[test]
    fn clean_text_strips_and_drops_blank() {
        assert_eq!(clean_text(Some("  hi \n".into())), Some("hi".into()));
        assert_eq!(clean_text(Some("   ".into())), None);
        assert_eq!(clean_text(None), None);
    }

    #[test]
    fn field_spec_omits_missing_label() {
        let spec = FieldSpec {
            name: "text",
            label: None,
            help_text: None,
            required: true,
            widget: Widget::Textarea,
            localized: true,
        };
        let json = serde_json::to_value(spec).unwrap();
        assert!(json.get("label").is_none());
        assert_eq!(json["widget"], "textarea");
        assert_eq!(json["localized"], true);
    }
}
