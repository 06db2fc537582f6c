//! Image upload storage.
//!
//! Uploaded images are written under the static directory so they can be
//! served back at the URL returned to the client. Files are kept
//! indefinitely and a repeated filename overwrites the previous file.

use std::path::{Path, PathBuf};

use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::config::ServerConfig;

/// Media type used when neither the part nor the extension identifies one.
pub const DEFAULT_MEDIA_TYPE: &str = "image/jpeg";

/// Errors that can occur while storing an upload.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Filesystem error.
    #[error("upload I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// An image persisted to the upload directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// Sanitized filename on disk.
    pub filename: String,
    /// Full path of the written file.
    pub path: PathBuf,
    /// Public URL path, e.g. `/static/uploads/look.jpg`.
    pub url: String,
    /// Media type sent to the model alongside the bytes.
    pub media_type: String,
}

/// Writes uploaded images into a fixed directory.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
    url_prefix: String,
}

impl UploadStore {
    /// Create a store writing to `dir`, served under `url_prefix`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    /// Create a store from the server configuration.
    #[must_use]
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.upload_dir(), config.upload_url_prefix())
    }

    /// Create the upload directory if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::Io` if the directory cannot be created.
    pub async fn ensure_dir(&self) -> Result<(), UploadError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Persist an uploaded image.
    ///
    /// `content_type` is the multipart part's declared type, if any.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::Io` if the file cannot be written.
    pub async fn save(
        &self,
        original_filename: &str,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<StoredImage, UploadError> {
        let media_type = media_type_for(original_filename, content_type);

        let filename = match sanitize_filename(original_filename) {
            Some(name) => name,
            None => generated_filename(&media_type),
        };

        let path = self.dir.join(&filename);
        tokio::fs::write(&path, bytes).await?;

        tracing::info!(
            filename = %filename,
            size = bytes.len(),
            media_type = %media_type,
            "stored uploaded image"
        );

        Ok(StoredImage {
            url: format!("{}/{filename}", self.url_prefix),
            filename,
            path,
            media_type,
        })
    }
}

/// Reduce a client-supplied filename to a safe, flat ASCII name.
///
/// The name is NFKD-normalized so accented letters keep their ASCII base.
/// Path separators become word breaks, characters outside
/// `[A-Za-z0-9._-]` are dropped, whitespace runs become `_`, and leading or
/// trailing dots and underscores are stripped. Returns `None` if nothing
/// survives.
#[must_use]
pub fn sanitize_filename(filename: &str) -> Option<String> {
    let spaced: String = filename
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");

    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();

    let trimmed = kept.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Pick the media type for an upload.
///
/// An `image/*` part type wins; otherwise the extension decides, falling
/// back to [`DEFAULT_MEDIA_TYPE`].
#[must_use]
pub fn media_type_for(filename: &str, content_type: Option<&str>) -> String {
    if let Some(declared) = content_type
        .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_ascii_lowercase())
        .filter(|ct| ct.starts_with("image/"))
    {
        return declared;
    }

    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        Some("heif") => "image/heif",
        _ => DEFAULT_MEDIA_TYPE,
    }
    .to_string()
}

fn extension_for(media_type: &str) -> Option<&'static str> {
    match media_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        "image/heif" => Some("heif"),
        _ => None,
    }
}

fn generated_filename(media_type: &str) -> String {
    let id = Uuid::new_v4();
    match extension_for(media_type) {
        Some(ext) => format!("upload-{id}.{ext}"),
        None => format!("upload-{id}"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename_plain() {
        assert_eq!(sanitize_filename("kurta.jpg").as_deref(), Some("kurta.jpg"));
        assert_eq!(
            sanitize_filename("My Summer Look.PNG").as_deref(),
            Some("My_Summer_Look.PNG")
        );
    }

    #[test]
    fn test_sanitize_filename_strips_paths() {
        assert_eq!(
            sanitize_filename("../../etc/passwd").as_deref(),
            Some("etc_passwd")
        );
        assert_eq!(
            sanitize_filename(r"C:\Users\asha\saree.jpg").as_deref(),
            Some("C_Users_asha_saree.jpg")
        );
    }

    #[test]
    fn test_sanitize_filename_drops_disallowed_chars() {
        assert_eq!(
            sanitize_filename("look (1)#final!.jpeg").as_deref(),
            Some("look_1final.jpeg")
        );
        assert_eq!(sanitize_filename(".hidden").as_deref(), Some("hidden"));
    }

    #[test]
    fn test_sanitize_filename_folds_accents() {
        assert_eq!(sanitize_filename("café.png").as_deref(), Some("cafe.png"));
        assert_eq!(
            sanitize_filename("Crème Brûlée Dress.JPG").as_deref(),
            Some("Creme_Brulee_Dress.JPG")
        );
        assert_eq!(sanitize_filename("ﬁt.png").as_deref(), Some("fit.png"));
    }

    #[test]
    fn test_sanitize_filename_empty_result() {
        assert_eq!(sanitize_filename(""), None);
        assert_eq!(sanitize_filename("..."), None);
        assert_eq!(sanitize_filename("तस्वीर"), None);
    }

    #[test]
    fn test_media_type_prefers_declared_image_type() {
        assert_eq!(media_type_for("a.jpg", Some("image/png")), "image/png");
        assert_eq!(
            media_type_for("a.jpg", Some("image/WEBP; charset=binary")),
            "image/webp"
        );
    }

    #[test]
    fn test_media_type_from_extension() {
        assert_eq!(media_type_for("a.PNG", None), "image/png");
        assert_eq!(
            media_type_for("a.heic", Some("application/octet-stream")),
            "image/heic"
        );
        assert_eq!(media_type_for("a.jpeg", None), "image/jpeg");
        assert_eq!(media_type_for("noext", None), DEFAULT_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn test_save_writes_file_and_builds_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path().join("uploads"), "/static/uploads/");
        store.ensure_dir().await.unwrap();

        let stored = store
            .save("blue shirt.png", Some("image/png"), b"pngbytes")
            .await
            .unwrap();

        assert_eq!(stored.filename, "blue_shirt.png");
        assert_eq!(stored.url, "/static/uploads/blue_shirt.png");
        assert_eq!(stored.media_type, "image/png");
        assert_eq!(tokio::fs::read(&stored.path).await.unwrap(), b"pngbytes");
    }

    #[tokio::test]
    async fn test_save_overwrites_same_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path(), "/static/uploads");

        store.save("look.jpg", None, b"first").await.unwrap();
        let stored = store.save("look.jpg", None, b"second").await.unwrap();

        assert_eq!(tokio::fs::read(&stored.path).await.unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_save_generates_name_when_sanitized_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path(), "/static/uploads");

        let stored = store.save("???", Some("image/gif"), b"gif").await.unwrap();

        assert!(stored.filename.starts_with("upload-"));
        assert!(
            Path::new(&stored.filename)
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("gif"))
        );
        assert!(stored.path.exists());
    }
}
