use std::path::PathBuf;

use bytes::Bytes;

use crate::engine::status::StoredFile;
use crate::error::{Error, Result};
use crate::models::application::DocumentKind;
use crate::utils::files::{extension_of, safe_component};

/// Raw multipart field handed to the service layer.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub kind: DocumentKind,
    pub original_name: String,
    pub data: Bytes,
}

/// Persists uploaded bytes under the uploads directory and produces the
/// metadata the engine records.
#[derive(Clone)]
pub struct FileService {
    uploads_dir: PathBuf,
}

impl FileService {
    pub fn new(uploads_dir: impl Into<PathBuf>) -> Self {
        Self {
            uploads_dir: uploads_dir.into(),
        }
    }

    pub async fn store_document(
        &self,
        email: &str,
        kind: DocumentKind,
        original_name: &str,
        data: Bytes,
    ) -> Result<StoredFile> {
        if data.is_empty() {
            return Err(Error::Validation(format!(
                "Empty file for {}: {}",
                kind, original_name
            )));
        }

        let extension = extension_of(original_name);
        let allowed: &[&str] = match kind {
            DocumentKind::Photo => &["jpg", "jpeg", "png"],
            _ => &["pdf", "doc", "docx", "jpg", "jpeg", "png"],
        };
        if !allowed.contains(&extension.as_str()) {
            return Err(Error::Validation(format!(
                "File type not allowed for {}. Allowed: {}",
                kind,
                allowed.join(", ")
            )));
        }

        let dir = self
            .uploads_dir
            .join(safe_component(email))
            .join(kind.as_str());
        tokio::fs::create_dir_all(&dir).await?;

        let file_id = uuid::Uuid::new_v4();
        let path = dir.join(format!("{}.{}", file_id, extension));
        let size_bytes = data.len() as u64;
        tokio::fs::write(&path, data).await?;

        Ok(StoredFile {
            original_name: original_name.to_string(),
            stored_path: path.to_string_lossy().into_owned(),
            size_bytes,
        })
    }

    /// Removes every file stored for an applicant. Used by the explicit
    /// admin delete action only.
    pub async fn remove_all_for(&self, email: &str) -> Result<()> {
        let dir = self.uploads_dir.join(safe_component(email));
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
