use std::{io, path::{Path, PathBuf}};
use tokio::fs;

use derive_more::Display;
use uuid::Uuid;

use crate::errors::{AppError, FieldError};

/// Prefix of the relative picture references handed to clients.
pub const PUBLIC_PREFIX: &str = "uploads";

/// Stores uploaded profile pictures on the local filesystem.
#[derive(Debug, Clone)]
pub struct PictureStore {
    root: PathBuf,
    max_size: usize,
}

impl PictureStore {
    pub fn new(root: impl Into<PathBuf>, max_size: usize) -> Self {
        PictureStore {
            root: root.into(),
            max_size,
        }
    }

    pub async fn ensure_root(&self) -> io::Result<()> {
        fs::create_dir_all(&self.root).await
    }

    /// Validates an uploaded temp file as an image and copies it into the store.
    ///
    /// Returns the relative reference `uploads/<generated name>`.
    pub async fn save(&self, temp_path: &Path) -> Result<String, UploadError> {
        let metadata = fs::metadata(temp_path).await.map_err(UploadError::IoError)?;
        if metadata.len() > self.max_size as u64 {
            return Err(UploadError::FileTooLarge);
        }

        let kind = match infer::get_from_path(temp_path) {
            Ok(Some(kind)) if kind.mime_type().starts_with("image/") => kind,
            Ok(Some(kind)) => return Err(UploadError::InvalidType(kind.mime_type().to_string())),
            Ok(None) => return Err(UploadError::NotAnImage),
            Err(e) => return Err(UploadError::MimeDetectionFailed(e.to_string())),
        };

        let file_name = format!("{}.{}", Uuid::new_v4(), kind.extension());
        fs::copy(temp_path, self.root.join(&file_name))
            .await
            .map_err(UploadError::IoError)?;

        tracing::info!("Stored picture {}", file_name);
        Ok(format!("{}/{}", PUBLIC_PREFIX, file_name))
    }

    /// Removes a stored picture by its relative reference. Failures are only logged.
    pub async fn discard(&self, reference: &str) {
        let Some(file_name) = file_name_from_reference(reference) else {
            return;
        };

        if let Err(e) = fs::remove_file(self.root.join(file_name)).await {
            tracing::warn!("Failed to remove picture {}: {}", reference, e);
        }
    }

    /// Reads a stored picture and sniffs its content type.
    pub async fn open(&self, file_name: &str) -> Result<(Vec<u8>, &'static str), UploadError> {
        if !is_safe_file_name(file_name) {
            return Err(UploadError::InvalidName);
        }

        let bytes = fs::read(self.root.join(file_name)).await.map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => UploadError::NotFound,
            _ => UploadError::IoError(e),
        })?;

        let mime = infer::get(&bytes)
            .map(|kind| kind.mime_type())
            .unwrap_or("application/octet-stream");

        Ok((bytes, mime))
    }
}

fn file_name_from_reference(reference: &str) -> Option<&str> {
    reference
        .strip_prefix(PUBLIC_PREFIX)
        .and_then(|rest| rest.strip_prefix('/'))
        .filter(|name| is_safe_file_name(name))
}

fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\'])
        && !name.contains("..")
}

/// All errors related to picture uploads.
#[derive(Debug, Display)]
pub enum UploadError {
    #[display("Only image uploads are allowed, got {_0}")]
    InvalidType(String),

    #[display("Not an image!")]
    NotAnImage,

    #[display("File size exceeds maximum allowed.")]
    FileTooLarge,

    #[display("Invalid file name.")]
    InvalidName,

    #[display("File not found.")]
    NotFound,

    #[display("Failed to store file: {_0}")]
    IoError(io::Error),

    #[display("MIME detection failed: {_0}")]
    MimeDetectionFailed(String),
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::InvalidType(_)
            | UploadError::NotAnImage
            | UploadError::FileTooLarge
            | UploadError::InvalidName => FieldError::new("picture", err.to_string()).into(),
            UploadError::NotFound => AppError::NotFound("File not found".to_string()),
            UploadError::IoError(e) => AppError::from(e),
            UploadError::MimeDetectionFailed(msg) => AppError::InternalError(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Smallest valid PNG header infer recognises.
    const PNG_BYTES: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];

    #[tokio::test]
    async fn saves_images_under_generated_names() {
        let store_dir = tempfile::tempdir().unwrap();
        let upload_dir = tempfile::tempdir().unwrap();
        let temp_path = upload_dir.path().join("upload.tmp");
        std::fs::write(&temp_path, PNG_BYTES).unwrap();

        let store = PictureStore::new(store_dir.path(), 1024);
        let reference = store.save(&temp_path).await.unwrap();

        assert!(reference.starts_with("uploads/"));
        assert!(reference.ends_with(".png"));

        let file_name = reference.trim_start_matches("uploads/");
        let (bytes, mime) = store.open(file_name).await.unwrap();
        assert_eq!(bytes, PNG_BYTES);
        assert_eq!(mime, "image/png");

        store.discard(&reference).await;
        assert!(matches!(store.open(file_name).await, Err(UploadError::NotFound)));
    }

    #[tokio::test]
    async fn rejects_non_images_and_oversized_files() {
        let store_dir = tempfile::tempdir().unwrap();
        let upload_dir = tempfile::tempdir().unwrap();
        let text_path = upload_dir.path().join("notes.tmp");
        std::fs::write(&text_path, b"just some text").unwrap();

        let store = PictureStore::new(store_dir.path(), 1024);
        assert!(matches!(store.save(&text_path).await, Err(UploadError::NotAnImage)));

        let tiny_store = PictureStore::new(store_dir.path(), 4);
        let png_path = upload_dir.path().join("big.tmp");
        std::fs::write(&png_path, PNG_BYTES).unwrap();
        assert!(matches!(tiny_store.save(&png_path).await, Err(UploadError::FileTooLarge)));
    }

    #[tokio::test]
    async fn refuses_path_traversal() {
        let store = PictureStore::new("uploads", 1024);

        assert!(matches!(store.open("../Cargo.toml").await, Err(UploadError::InvalidName)));
        assert!(matches!(store.open("a/b.png").await, Err(UploadError::InvalidName)));
        assert_eq!(file_name_from_reference("uploads/../secret"), None);
        assert_eq!(file_name_from_reference("uploads/abc.png"), Some("abc.png"));
    }
}
