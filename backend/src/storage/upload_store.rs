use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("File too large")]
    FileTooLarge,
    #[error("Failed to store upload: {0}")]
    Io(#[from] std::io::Error),
}

/// Keeps uploaded scans on local disk, named by content hash.
#[derive(Debug, Clone)]
pub struct UploadStore {
    upload_dir: PathBuf,
}

impl UploadStore {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn calculate_image_hash(image_data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(image_data);
        hex::encode(hasher.finalize())
    }

    /// Extension kept from the client's file name when it is a known image type.
    pub fn extract_file_extension(file_name: Option<&str>) -> &'static str {
        let extension = file_name
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        match extension.as_deref() {
            Some("jpg") | Some("jpeg") => "jpg",
            Some("png") => "png",
            Some("bmp") => "bmp",
            Some("gif") => "gif",
            Some("webp") => "webp",
            Some("tif") | Some("tiff") => "tiff",
            _ => "img",
        }
    }

    pub fn validate_image_size(image_data: &[u8]) -> Result<(), UploadError> {
        if image_data.len() > MAX_UPLOAD_BYTES {
            return Err(UploadError::FileTooLarge);
        }
        Ok(())
    }

    pub fn save(&self, image_data: &[u8], file_name: Option<&str>) -> Result<PathBuf, UploadError> {
        Self::validate_image_size(image_data)?;

        let image_hash = Self::calculate_image_hash(image_data);
        let extension = Self::extract_file_extension(file_name);
        let path = self.upload_dir.join(format!("{}.{}", image_hash, extension));

        fs::create_dir_all(&self.upload_dir)?;
        fs::write(&path, image_data)?;
        log::debug!("Stored upload {} ({} bytes)", path.display(), image_data.len());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn extension_is_normalized() {
        assert_eq!(UploadStore::extract_file_extension(Some("scan.JPEG")), "jpg");
        assert_eq!(UploadStore::extract_file_extension(Some("scan.png")), "png");
        assert_eq!(UploadStore::extract_file_extension(Some("../../etc/passwd")), "img");
        assert_eq!(UploadStore::extract_file_extension(None), "img");
    }

    #[test]
    fn save_names_file_by_content_hash() {
        let dir = TempDir::new().unwrap();
        let store = UploadStore::new(dir.path().join("uploads"));

        let path = store.save(b"pixels", Some("../scan.png")).unwrap();
        assert_eq!(path.parent().unwrap(), dir.path().join("uploads"));
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            format!("{}.png", UploadStore::calculate_image_hash(b"pixels"))
        );
        assert_eq!(fs::read(&path).unwrap(), b"pixels");
    }

    #[test]
    fn oversized_upload_is_rejected() {
        let data = vec![0u8; MAX_UPLOAD_BYTES + 1];
        assert!(matches!(
            UploadStore::validate_image_size(&data),
            Err(UploadError::FileTooLarge)
        ));
    }
}
