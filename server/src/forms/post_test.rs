use super::*;
use crate::state::test_helpers::{SMALL_GIF, small_gif_upload};

fn data(text: &str, group: &str) -> PostFormData {
    PostFormData { text: Some(text.into()), group: Some(group.into()), ..PostFormData::default() }
}

// =============================================================================
// field table
// =============================================================================

#[test]
fn exposes_exactly_text_group_image() {
    let names: Vec<&str> = PostForm::fields().iter().map(|f| f.name).collect();
    assert_eq!(names, ["text", "group", "image"]);
}

#[test]
fn labels_and_help_texts() {
    let fields = PostForm::fields();
    assert_eq!(fields[0].label, Some("Text"));
    assert_eq!(fields[0].help_text, Some("Text of the new post"));
    assert_eq!(fields[1].label, Some("Group"));
    assert_eq!(fields[1].help_text, Some("Group the post will belong to"));
    assert!(fields[2].help_text.is_none());
}

#[test]
fn only_text_is_required() {
    let required: Vec<&str> = PostForm::fields()
        .iter()
        .filter(|f| f.required)
        .map(|f| f.name)
        .collect();
    assert_eq!(required, ["text"]);
}

// =============================================================================
// clean
// =============================================================================

#[test]
fn clean_accepts_text_group_and_gif() {
    let form = PostFormData { image: Some(small_gif_upload()), ..data("Test post", "3") };
    let cleaned = PostForm::clean(form).unwrap();
    assert_eq!(cleaned.text, "Test post");
    assert_eq!(cleaned.group_id, Some(3));
    match cleaned.image {
        ImageChange::Replace(upload) => {
            assert_eq!(upload.filename, "small.gif");
            assert_eq!(upload.bytes, SMALL_GIF);
        }
        other => panic!("expected replacement image, got {other:?}"),
    }
}

#[test]
fn clean_strips_text() {
    let cleaned = PostForm::clean(data("  padded \n", "")).unwrap();
    assert_eq!(cleaned.text, "padded");
    assert_eq!(cleaned.group_id, None);
    assert_eq!(cleaned.image, ImageChange::Keep);
}

#[test]
fn clean_requires_text() {
    for text in [None, Some(String::new()), Some("   ".to_owned())] {
        let form = PostFormData { text, ..PostFormData::default() };
        let errors = PostForm::clean(form).unwrap_err();
        assert_eq!(errors.get("text"), Some(&[MSG_REQUIRED.to_owned()][..]));
    }
}

#[test]
fn clean_rejects_non_numeric_group() {
    for group in ["abc", "-1", "0", "1.5"] {
        let errors = PostForm::clean(data("ok", group)).unwrap_err();
        assert_eq!(errors.get("group"), Some(&[MSG_INVALID_CHOICE.to_owned()][..]), "group {group:?}");
    }
}

#[test]
fn clean_reports_every_invalid_field_at_once() {
    let form = PostFormData {
        text: None,
        group: Some("x".into()),
        image: Some(UploadedFile { filename: "a.txt".into(), content_type: None, bytes: b"plain".to_vec() }),
        image_clear: false,
    };
    let errors = PostForm::clean(form).unwrap_err();
    assert!(errors.has("text"));
    assert!(errors.has("group"));
    assert_eq!(errors.get("image"), Some(&[MSG_INVALID_EXTENSION.to_owned()][..]));
}

#[test]
fn clean_rejects_empty_file() {
    let form = PostFormData {
        image: Some(UploadedFile { filename: "small.gif".into(), content_type: None, bytes: Vec::new() }),
        ..data("ok", "")
    };
    let errors = PostForm::clean(form).unwrap_err();
    assert_eq!(errors.get("image"), Some(&[MSG_EMPTY_FILE.to_owned()][..]));
}

#[test]
fn clean_rejects_missing_filename() {
    let form = PostFormData {
        image: Some(UploadedFile { filename: " ".into(), content_type: None, bytes: SMALL_GIF.to_vec() }),
        ..data("ok", "")
    };
    let errors = PostForm::clean(form).unwrap_err();
    assert_eq!(errors.get("image"), Some(&[MSG_NO_FILENAME.to_owned()][..]));
}

#[test]
fn clean_handles_clear_checkbox() {
    let cleared = PostForm::clean(PostFormData { image_clear: true, ..data("ok", "") }).unwrap();
    assert_eq!(cleared.image, ImageChange::Clear);

    let conflicting = PostFormData { image_clear: true, image: Some(small_gif_upload()), ..data("ok", "") };
    let errors = PostForm::clean(conflicting).unwrap_err();
    assert_eq!(errors.get("image"), Some(&[MSG_CLEAR_AND_UPLOAD.to_owned()][..]));
}

// =============================================================================
// image validation
// =============================================================================

fn upload(filename: &str, bytes: &[u8]) -> PostFormData {
    PostFormData {
        image: Some(UploadedFile { filename: filename.into(), content_type: None, bytes: bytes.to_vec() }),
        ..data("ok", "")
    }
}

fn image_error(form: PostFormData) -> String {
    let errors = PostForm::clean(form).unwrap_err();
    let messages = errors.get("image").expect("image error");
    assert_eq!(messages.len(), 1);
    messages[0].clone()
}

#[test]
fn clean_accepts_cyrillic_filename() {
    let cleaned = PostForm::clean(upload("фото.gif", SMALL_GIF)).unwrap();
    match cleaned.image {
        ImageChange::Replace(upload) => assert_eq!(upload.filename, "фото.gif"),
        other => panic!("expected replacement image, got {other:?}"),
    }
}

#[test]
fn clean_accepts_uppercase_extension() {
    assert!(PostForm::clean(upload("CAT.GIF", SMALL_GIF)).is_ok());
}

#[test]
fn clean_rejects_filename_without_usable_stem() {
    for name in ["???.gif", "***", "(!).gif"] {
        assert_eq!(image_error(upload(name, SMALL_GIF)), MSG_INVALID_FILENAME, "{name}");
    }
}

#[test]
fn clean_rejects_missing_or_unknown_extension() {
    for name in ["фото", "x.txt", "x.gif.exe", "x.bmp"] {
        assert_eq!(image_error(upload(name, SMALL_GIF)), MSG_INVALID_EXTENSION, "{name}");
    }
}

#[test]
fn clean_rejects_gif_header_followed_by_junk() {
    let mut bytes = b"GIF89a".to_vec();
    bytes.extend_from_slice(b"definitely not an image");
    assert_eq!(image_error(upload("x.gif", &bytes)), MSG_INVALID_IMAGE);
}

#[test]
fn clean_rejects_content_that_does_not_match_extension() {
    assert_eq!(image_error(upload("photo.png", SMALL_GIF)), MSG_INVALID_IMAGE);
    assert_eq!(image_error(upload("photo.jpg", SMALL_GIF)), MSG_INVALID_IMAGE);
}

#[test]
fn extension_message_lists_every_allowed_extension() {
    for ext in crate::media::IMAGE_EXTENSIONS {
        assert!(MSG_INVALID_EXTENSION.contains(ext), "{ext}");
    }
}
