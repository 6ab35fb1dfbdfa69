//! Media storage for uploaded files.
//!
//! DESIGN
//! ======
//! Files live under a single media root and are addressed by a path relative
//! to it (`posts/<filename>`), which is what gets stored in the database.
//! Filenames are reduced to a safe basename; when the name is taken a random
//! suffix is appended so an existing upload is never overwritten.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use rand::Rng;
use rand::distr::Alphanumeric;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Maximum length of a stored relative path (matches the `posts.image` column).
pub const MAX_PATH_LEN: usize = 100;
const SUFFIX_LEN: usize = 7;
const MAX_NAME_ATTEMPTS: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("invalid filename: {0:?}")]
    InvalidName(String),
    #[error("could not find a free name for {0:?}")]
    NameExhausted(String),
    #[error("media io error: {0}")]
    Io(#[from] std::io::Error),
}

/// File received from a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Gif,
    Png,
    Jpeg,
    Webp,
}

/// Extensions accepted for image uploads, lowercase.
pub const IMAGE_EXTENSIONS: [&str; 5] = ["gif", "jpeg", "jpg", "png", "webp"];

impl ImageKind {
    /// Kind implied by a file extension (without the dot), case-insensitive.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "gif" => Some(Self::Gif),
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::Webp),
            _ => None,
        }
    }

    fn format(self) -> image::ImageFormat {
        match self {
            Self::Gif => image::ImageFormat::Gif,
            Self::Png => image::ImageFormat::Png,
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::Webp => image::ImageFormat::WebP,
        }
    }

    /// Whether `bytes` fully decode as an image of this kind.
    #[must_use]
    pub fn decodes(self, bytes: &[u8]) -> bool {
        match image::load_from_memory_with_format(bytes, self.format()) {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(error = %e, kind = ?self, "image decode failed");
                false
            }
        }
    }
}

/// Identify an image by its leading magic bytes.
#[must_use]
pub fn detect_image_kind(bytes: &[u8]) -> Option<ImageKind> {
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some(ImageKind::Gif)
    } else if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        Some(ImageKind::Png)
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some(ImageKind::Jpeg)
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some(ImageKind::Webp)
    } else {
        None
    }
}

/// Reduce a client-supplied filename to a safe basename.
///
/// Directory components are dropped, spaces become underscores and anything
/// other than Unicode letters, digits, `_`, `.` and `-` is removed. Names
/// left without a stem (empty, or starting with a dot) are refused.
#[must_use]
pub fn valid_filename(raw: &str) -> Option<String> {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    let cleaned: String = base
        .chars()
        .map(|c| if c == ' ' { '_' } else { c })
        .filter(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    if cleaned.is_empty() || cleaned.starts_with('.') {
        return None;
    }
    Some(cleaned)
}

/// Extension of a name without the dot, if any.
#[must_use]
pub fn extension(name: &str) -> Option<&str> {
    let (_, ext) = split_ext(name);
    ext.strip_prefix('.').filter(|e| !e.is_empty())
}

/// Split `name.ext` into (`name`, `.ext`); dotfiles keep their whole name as stem.
fn split_ext(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    }
}

fn random_suffix() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(char::from)
        .collect()
}

/// Build the relative path for `name` under `upload_to`, truncating the stem
/// so the result fits in [`MAX_PATH_LEN`].
fn build_relative(upload_to: &str, stem: &str, suffix: &str, ext: &str) -> Option<String> {
    let dir = upload_to.trim_matches('/');
    let fixed = dir.chars().count() + 1 + suffix.chars().count() + ext.chars().count();
    if fixed >= MAX_PATH_LEN {
        return None;
    }
    let room = MAX_PATH_LEN - fixed;
    let stem: String = stem.chars().take(room).collect();
    if stem.is_empty() {
        return None;
    }
    Some(format!("{dir}/{stem}{suffix}{ext}"))
}

/// Write `bytes` to a freshly created file at `path`; on failure the partial
/// file is removed so its name is not left reserved.
async fn write_or_remove<W>(mut file: W, path: &Path, bytes: &[u8]) -> Result<(), MediaError>
where
    W: AsyncWrite + Unpin,
{
    let written = match file.write_all(bytes).await {
        Ok(()) => file.flush().await,
        Err(e) => Err(e),
    };
    let Err(e) = written else {
        return Ok(());
    };
    drop(file);
    if let Err(cleanup) = tokio::fs::remove_file(path).await {
        tracing::warn!(error = %cleanup, path = %path.display(), "failed to remove partial upload");
    }
    Err(e.into())
}

#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
}

impl MediaStorage {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a stored relative path.
    #[must_use]
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Create the media root if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub async fn ensure_root(&self) -> Result<(), MediaError> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Write `bytes` under `upload_to` and return the stored relative path.
    ///
    /// # Errors
    ///
    /// Returns an error if the filename is unusable, no free name is found,
    /// or the write fails.
    pub async fn save(&self, upload_to: &str, filename: &str, bytes: &[u8]) -> Result<String, MediaError> {
        let name = valid_filename(filename).ok_or_else(|| MediaError::InvalidName(filename.to_owned()))?;
        let (stem, ext) = split_ext(&name);

        let dir = self.root.join(upload_to.trim_matches('/'));
        tokio::fs::create_dir_all(&dir).await?;

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let suffix = if attempt == 0 { String::new() } else { format!("_{}", random_suffix()) };
            let relative = build_relative(upload_to, stem, &suffix, ext)
                .ok_or_else(|| MediaError::InvalidName(filename.to_owned()))?;

            let file = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(self.path(&relative))
                .await;
            let file = match file {
                Ok(f) => f,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            };

            write_or_remove(file, &self.path(&relative), bytes).await?;
            tracing::debug!(path = %relative, size = bytes.len(), "media file stored");
            return Ok(relative);
        }

        Err(MediaError::NameExhausted(name))
    }

    /// Remove a stored file. Missing files are not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the path escapes the media root or removal fails.
    pub async fn delete(&self, relative: &str) -> Result<(), MediaError> {
        if relative.split('/').any(|part| part == "..") {
            return Err(MediaError::InvalidName(relative.to_owned()));
        }
        match tokio::fs::remove_file(self.path(relative)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[path = "media_test.rs"]
mod tests;
