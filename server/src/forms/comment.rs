//! `CommentForm`: a single localized `text` field.

use serde::Deserialize;

use super::{FieldSpec, FormErrors, MSG_REQUIRED, Widget, clean_text};

const FIELDS: [FieldSpec; 1] = [FieldSpec {
    name: "text",
    label: None,
    help_text: None,
    required: true,
    widget: Widget::Textarea,
    localized: true,
}];

/// Raw urlencoded comment submission. Unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentFormData {
    pub text: Option<String>,
}

pub struct CommentForm;

impl CommentForm {
    #[must_use]
    pub fn fields() -> &'static [FieldSpec] {
        &FIELDS
    }

    /// Validate a submission into the comment text to store.
    ///
    /// # Errors
    ///
    /// Returns a `text` error when the text is missing or blank.
    pub fn clean(data: CommentFormData) -> Result<String, FormErrors> {
        clean_text(data.text).ok_or_else(|| FormErrors::single("text", MSG_REQUIRED))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exposes_only_localized_text() {
        let fields = CommentForm::fields();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "text");
        assert!(fields[0].required);
        assert!(fields[0].localized);
    }

    #[test]
    fn clean_returns_stripped_text() {
        let text = CommentForm::clean(CommentFormData { text: Some(" nice post ".into()) }).unwrap();
        assert_eq!(text, "nice post");
    }

    #[test]
    fn clean_requires_text() {
        let errors = CommentForm::clean(CommentFormData { text: Some("\t".into()) }).unwrap_err();
        assert_eq!(errors.get("text"), Some(&[MSG_REQUIRED.to_owned()][..]));
        assert!(CommentForm::clean(CommentFormData::default()).is_err());
    }

    #[test]
    fn deserialize_ignores_extra_fields() {
        let data: CommentFormData = serde_json::from_value(serde_json::json!({"text": "hi", "author": "mallory"})).unwrap();
        assert_eq!(data.text.as_deref(), Some("hi"));
    }
}
