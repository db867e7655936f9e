use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use uuid::Uuid;

use crate::error::AppError;

pub const PROOF_NAMESPACE: &str = "bookings/payment_proofs";
pub const MAX_PROOF_BYTES: usize = 5 * 1024 * 1024;

/// Where uploaded files live. Paths handed out by `put` are relative to the
/// store and are the only thing persisted on a booking.
pub trait BlobStore: Send + Sync {
    fn put(&self, namespace: &str, filename: &str, bytes: &[u8]) -> Result<String, AppError>;
    fn read(&self, path: &str) -> Result<Vec<u8>, AppError>;
    fn delete(&self, path: &str) -> Result<(), AppError>;
    fn exists(&self, path: &str) -> Result<bool, AppError>;
    fn url_for(&self, path: &str) -> String;
}

#[derive(Debug, Clone)]
pub struct LocalDiskStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalDiskStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_owned(),
        }
    }

    fn resolve(&self, path: &str) -> io::Result<PathBuf> {
        let relative = Path::new(path);
        let clean = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if path.is_empty() || !clean {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("refusing path outside the store: {}", path),
            ));
        }
        Ok(self.root.join(relative))
    }
}

impl BlobStore for LocalDiskStore {
    fn put(&self, namespace: &str, filename: &str, bytes: &[u8]) -> Result<String, AppError> {
        let path = format!("{}/{}", namespace.trim_matches('/'), filename);
        let target = self.resolve(&path).map_err(AppError::StorageWrite)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(AppError::StorageWrite)?;
        }
        fs::write(&target, bytes).map_err(AppError::StorageWrite)?;
        log::debug!("stored {} bytes at {}", bytes.len(), path);
        Ok(path)
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, AppError> {
        let target = self.resolve(path).map_err(AppError::StorageRead)?;
        match fs::read(target) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(AppError::NotFound("file")),
            Err(e) => Err(AppError::StorageRead(e)),
        }
    }

    fn delete(&self, path: &str) -> Result<(), AppError> {
        let target = self.resolve(path).map_err(AppError::StorageWrite)?;
        match fs::remove_file(target) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::StorageWrite(e)),
        }
    }

    fn exists(&self, path: &str) -> Result<bool, AppError> {
        let target = self.resolve(path).map_err(AppError::StorageRead)?;
        Ok(target.is_file())
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/storage/{}", self.public_base_url, path)
    }
}

/// An uploaded file exactly as the client sent it.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofKind {
    Jpeg,
    Png,
    Pdf,
}

impl ProofKind {
    fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "jpg" | "jpeg" => Some(ProofKind::Jpeg),
            "png" => Some(ProofKind::Png),
            "pdf" => Some(ProofKind::Pdf),
            _ => None,
        }
    }

    fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(ProofKind::Jpeg),
            "image/png" => Some(ProofKind::Png),
            "application/pdf" => Some(ProofKind::Pdf),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ProofKind::Jpeg => "jpg",
            ProofKind::Png => "png",
            ProofKind::Pdf => "pdf",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ProofKind::Jpeg => "image/jpeg",
            ProofKind::Png => "image/png",
            ProofKind::Pdf => "application/pdf",
        }
    }

    fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ProofKind::Jpeg)
        } else if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(ProofKind::Png)
        } else if bytes.starts_with(b"%PDF") {
            Some(ProofKind::Pdf)
        } else {
            None
        }
    }
}

/// A proof that passed validation. Its kind decides the stored extension.
#[derive(Debug, Clone)]
pub struct CheckedProof<'a> {
    pub kind: ProofKind,
    pub bytes: &'a [u8],
}

pub fn validate_proof(file: Option<&UploadedFile>) -> Result<CheckedProof<'_>, AppError> {
    let file = match file {
        Some(f) if !f.bytes.is_empty() => f,
        _ => return Err(AppError::MissingFile),
    };

    if file.bytes.len() > MAX_PROOF_BYTES {
        return Err(AppError::FileTooLarge {
            limit: MAX_PROOF_BYTES,
        });
    }

    let extension = Path::new(&file.file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .ok_or(AppError::UnsupportedFileType)?;
    let claimed = ProofKind::from_extension(&extension).ok_or(AppError::UnsupportedFileType)?;

    if let Some(mime) = file.content_type.as_deref() {
        // browsers fall back to octet-stream when they cannot guess
        if mime != "application/octet-stream" && ProofKind::from_mime(mime) != Some(claimed) {
            return Err(AppError::UnsupportedFileType);
        }
    }

    if ProofKind::sniff(&file.bytes) != Some(claimed) {
        return Err(AppError::UnsupportedFileType);
    }

    Ok(CheckedProof {
        kind: claimed,
        bytes: &file.bytes,
    })
}

/// Write a validated proof under a fresh collision-free name.
pub fn store_proof(store: &dyn BlobStore, proof: &CheckedProof<'_>) -> Result<String, AppError> {
    let filename = format!("{}.{}", Uuid::new_v4(), proof.kind.extension());
    store.put(PROOF_NAMESPACE, &filename, proof.bytes)
}

/// Best effort removal used when a database write does not go through.
pub fn discard(store: &dyn BlobStore, path: &str) {
    if let Err(e) = store.delete(path) {
        log::warn!("failed to remove orphaned file {}: {:?}", path, e);
    }
}

pub fn content_type_for(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    ext.as_deref()
        .and_then(ProofKind::from_extension)
        .map_or("application/octet-stream", ProofKind::content_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
    const PDF: &[u8] = b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n";

    fn upload(name: &str, mime: Option<&str>, bytes: &[u8]) -> UploadedFile {
        UploadedFile {
            file_name: name.to_owned(),
            content_type: mime.map(str::to_owned),
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn absent_or_empty_file_is_missing() {
        assert!(matches!(validate_proof(None), Err(AppError::MissingFile)));
        let empty = upload("proof.png", Some("image/png"), b"");
        assert!(matches!(validate_proof(Some(&empty)), Err(AppError::MissingFile)));
    }

    #[test]
    fn accepts_each_supported_type() {
        let png = upload("receipt.PNG", Some("image/png"), PNG);
        let checked = validate_proof(Some(&png)).unwrap();
        assert_eq!(checked.kind, ProofKind::Png);

        let pdf = upload("receipt.pdf", Some("application/pdf"), PDF);
        assert_eq!(validate_proof(Some(&pdf)).unwrap().kind, ProofKind::Pdf);

        let jpg = upload("receipt.jpg", None, &[0xFF, 0xD8, 0xFF, 0xE0, 0x00]);
        assert_eq!(validate_proof(Some(&jpg)).unwrap().kind, ProofKind::Jpeg);
    }

    #[test]
    fn rejects_other_extensions() {
        let gif = upload("receipt.gif", Some("image/gif"), b"GIF89a");
        assert!(matches!(
            validate_proof(Some(&gif)),
            Err(AppError::UnsupportedFileType)
        ));
        let bare = upload("receipt", None, PNG);
        assert!(matches!(
            validate_proof(Some(&bare)),
            Err(AppError::UnsupportedFileType)
        ));
    }

    #[test]
    fn rejects_content_that_does_not_match_extension() {
        let disguised = upload("receipt.png", Some("image/png"), b"MZ\x90\0executable");
        assert!(matches!(
            validate_proof(Some(&disguised)),
            Err(AppError::UnsupportedFileType)
        ));
    }

    #[test]
    fn rejects_files_over_five_mebibytes() {
        let mut bytes = PNG.to_vec();
        bytes.resize(MAX_PROOF_BYTES + 1, 0);
        let big = upload("receipt.png", Some("image/png"), &bytes);
        assert!(matches!(
            validate_proof(Some(&big)),
            Err(AppError::FileTooLarge { .. })
        ));

        bytes.truncate(MAX_PROOF_BYTES);
        let at_limit = upload("receipt.png", Some("image/png"), &bytes);
        assert!(validate_proof(Some(&at_limit)).is_ok());
    }

    #[test]
    fn store_proof_keeps_extension_and_namespaces_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalDiskStore::new(dir.path(), "http://localhost:8080/");
        let file = upload("scan.PDF", Some("application/pdf"), PDF);
        let checked = validate_proof(Some(&file)).unwrap();

        let first = store_proof(&store, &checked).unwrap();
        let second = store_proof(&store, &checked).unwrap();

        assert!(first.starts_with("bookings/payment_proofs/"));
        assert!(first.ends_with(".pdf"));
        assert_eq!(content_type_for(&first), "application/pdf");
        assert_ne!(first, second);
        assert!(store.exists(&first).unwrap());
        assert_eq!(store.read(&first).unwrap(), PDF);
        assert_eq!(
            store.url_for(&first),
            format!("http://localhost:8080/storage/{}", first)
        );
    }

    #[test]
    fn delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalDiskStore::new(dir.path(), "http://localhost");
        let path = store.put("misc", "a.png", PNG).unwrap();
        store.delete(&path).unwrap();
        assert!(!store.exists(&path).unwrap());
        store.delete(&path).unwrap();
    }

    #[test]
    fn refuses_paths_escaping_the_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalDiskStore::new(dir.path(), "http://localhost");
        assert!(matches!(
            store.read("../etc/passwd"),
            Err(AppError::StorageRead(_))
        ));
        assert!(matches!(
            store.put("../outside", "x.png", PNG),
            Err(AppError::StorageWrite(_))
        ));
    }

    #[test]
    fn missing_file_reads_as_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalDiskStore::new(dir.path(), "http://localhost");
        assert!(matches!(
            store.read("bookings/payment_proofs/nope.png"),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn content_type_follows_extension() {
        assert_eq!(content_type_for("a/b.JPG"), "image/jpeg");
        assert_eq!(content_type_for("a/b.pdf"), "application/pdf");
        assert_eq!(content_type_for("a/b.bin"), "application/octet-stream");
    }

    #[test]
    fn stored_name_follows_detected_kind() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalDiskStore::new(dir.path(), "http://localhost");
        let file = upload("photo.JPEG", Some("image/jpeg"), &[0xFF, 0xD8, 0xFF, 0xE0, 0x00]);
        let checked = validate_proof(Some(&file)).unwrap();
        assert_eq!(checked.kind, ProofKind::Jpeg);

        let path = store_proof(&store, &checked).unwrap();
        assert!(path.ends_with(".jpg"));
        assert_eq!(content_type_for(&path), checked.kind.content_type());
    }
}
