//! `PostForm`: the `text`, `group` and `image` fields of a post.

use sqlx::PgPool;

use super::{FieldSpec, FormError, FormErrors, MSG_INVALID_CHOICE, MSG_REQUIRED, Widget, clean_text};
use crate::media::{ImageKind, UploadedFile, detect_image_kind, extension, valid_filename};
use crate::services::group;

pub const MSG_EMPTY_FILE: &str = "The submitted file is empty.";
pub const MSG_NO_FILENAME: &str = "No file was submitted. Check the encoding type on the form.";
pub const MSG_INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";
pub const MSG_INVALID_FILENAME: &str =
    "Enter a valid filename. It must contain a letter or digit before the extension.";
pub const MSG_INVALID_EXTENSION: &str =
    "File extension is not allowed. Allowed extensions are: gif, jpeg, jpg, png, webp.";
pub const MSG_CLEAR_AND_UPLOAD: &str = "Please either submit a file or check the clear checkbox, not both.";

const FIELDS: [FieldSpec; 3] = [
    FieldSpec {
        name: "text",
        label: Some("Text"),
        help_text: Some("Text of the new post"),
        required: true,
        widget: Widget::Textarea,
        localized: false,
    },
    FieldSpec {
        name: "group",
        label: Some("Group"),
        help_text: Some("Group the post will belong to"),
        required: false,
        widget: Widget::Select,
        localized: false,
    },
    FieldSpec {
        name: "image",
        label: None,
        help_text: None,
        required: false,
        widget: Widget::ClearableFileInput,
        localized: false,
    },
];

/// Raw submitted values, before any validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFormData {
    pub text: Option<String>,
    pub group: Option<String>,
    pub image: Option<UploadedFile>,
    /// The `image-clear` checkbox of the clearable file input.
    pub image_clear: bool,
}

/// What a save should do with the post's stored image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageChange {
    Keep,
    Clear,
    Replace(UploadedFile),
}

/// Validated values ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedPost {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: ImageChange,
}

pub struct PostForm;

impl PostForm {
    /// Exposed fields, in display order.
    #[must_use]
    pub fn fields() -> &'static [FieldSpec] {
        &FIELDS
    }

    /// Field-level validation that needs no database access.
    ///
    /// # Errors
    ///
    /// Returns the collected per-field messages.
    pub fn clean(data: PostFormData) -> Result<CleanedPost, FormErrors> {
        let mut errors = FormErrors::new();

        let text = clean_text(data.text);
        if text.is_none() {
            errors.add("text", MSG_REQUIRED);
        }

        let group_id = match data.group.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => match raw.parse::<i64>() {
                Ok(id) if id > 0 => Some(id),
                _ => {
                    errors.add("group", MSG_INVALID_CHOICE);
                    None
                }
            },
        };

        let image = match (data.image, data.image_clear) {
            (None, false) => ImageChange::Keep,
            (None, true) => ImageChange::Clear,
            (Some(_), true) => {
                errors.add("image", MSG_CLEAR_AND_UPLOAD);
                ImageChange::Keep
            }
            (Some(upload), false) => match clean_image(&upload) {
                Ok(()) => ImageChange::Replace(upload),
                Err(message) => {
                    errors.add("image", message);
                    ImageChange::Keep
                }
            },
        };

        let cleaned = CleanedPost { text: text.unwrap_or_default(), group_id, image };
        errors.into_result(cleaned)
    }

    /// Full validation: field checks plus the group reference.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::Invalid`] with per-field messages, or
    /// [`FormError::Database`] if the group lookup fails.
    pub async fn validate(pool: &PgPool, data: PostFormData) -> Result<CleanedPost, FormError> {
        let cleaned = Self::clean(data)?;
        if let Some(group_id) = cleaned.group_id {
            if !group::exists(pool, group_id).await? {
                return Err(FormErrors::single("group", MSG_INVALID_CHOICE).into());
            }
        }
        Ok(cleaned)
    }
}

/// Accept an upload only if its name survives storage cleaning, its
/// extension is an allowed image type, the content is that same type and
/// the whole file decodes.
fn clean_image(upload: &UploadedFile) -> Result<(), &'static str> {
    if upload.filename.trim().is_empty() {
        return Err(MSG_NO_FILENAME);
    }
    if upload.bytes.is_empty() {
        return Err(MSG_EMPTY_FILE);
    }
    let name = valid_filename(&upload.filename).ok_or(MSG_INVALID_FILENAME)?;
    let kind = extension(&name)
        .and_then(ImageKind::from_extension)
        .ok_or(MSG_INVALID_EXTENSION)?;
    if detect_image_kind(&upload.bytes) != Some(kind) || !kind.decodes(&upload.bytes) {
        return Err(MSG_INVALID_IMAGE);
    }
    Ok(())
}

#[cfg(test)]
#[path = "post_test.rs"]
mod tests;
