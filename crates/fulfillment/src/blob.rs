//! Blob storage for uploaded evidence and delivery proof.
//!
//! Files are stored before any aggregate mutation: if the store fails the
//! command never runs, and if the command fails the orphaned blob is
//! harmless and swept out of band.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use domain::dispute::{Evidence, EvidenceKind, Party};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::FulfillmentError;

/// Most files accepted in one upload request.
pub const MAX_FILES_PER_UPLOAD: usize = 10;

/// Largest accepted file, in bytes.
pub const MAX_FILE_BYTES: usize = 50 * 1024 * 1024;

/// An uploaded file, as received from the HTTP layer.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Content-addressable storage for uploaded files.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores a file and returns its URL.
    async fn put(&self, file: &UploadFile) -> Result<String, FulfillmentError>;
}

/// In-memory blob store used in tests and local development.
#[derive(Clone, Default)]
pub struct InMemoryBlobStore {
    objects: Arc<RwLock<HashMap<String, UploadFile>>>,
    fail: Arc<AtomicBool>,
}

impl InMemoryBlobStore {
    /// Creates an empty in-memory blob store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent put fail, for testing failure paths.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Returns the number of stored objects.
    pub async fn object_count(&self) -> usize {
        self.objects.read().await.len()
    }

    /// Returns a stored object by URL.
    pub async fn get(&self, url: &str) -> Option<UploadFile> {
        self.objects.read().await.get(url).cloned()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(&self, file: &UploadFile) -> Result<String, FulfillmentError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(FulfillmentError::BlobStorage(
                "simulated storage outage".to_string(),
            ));
        }

        let url = format!("mem://uploads/{}/{}", Uuid::new_v4(), file.filename);
        self.objects.write().await.insert(url.clone(), file.clone());
        Ok(url)
    }
}

/// Checks an upload batch against count, size, and content-type limits.
pub fn validate_files(files: &[UploadFile]) -> Result<(), FulfillmentError> {
    if files.len() > MAX_FILES_PER_UPLOAD {
        return Err(FulfillmentError::UploadRejected(format!(
            "at most {MAX_FILES_PER_UPLOAD} files per upload"
        )));
    }
    for file in files {
        if file.bytes.is_empty() {
            return Err(FulfillmentError::UploadRejected(format!(
                "{} is empty",
                file.filename
            )));
        }
        if file.bytes.len() > MAX_FILE_BYTES {
            return Err(FulfillmentError::UploadRejected(format!(
                "{} exceeds the 50 MB limit",
                file.filename
            )));
        }
        if !content_type_allowed(&file.content_type) {
            return Err(FulfillmentError::UploadRejected(format!(
                "{} has unsupported content type {}",
                file.filename, file.content_type
            )));
        }
    }
    Ok(())
}

fn content_type_allowed(content_type: &str) -> bool {
    content_type.starts_with("image/")
        || content_type.starts_with("video/")
        || content_type == "application/pdf"
        || content_type == "application/msword"
        || content_type
            .starts_with("application/vnd.openxmlformats-officedocument.wordprocessingml")
        || content_type == "text/plain"
}

/// Returns the evidence kind a content type maps to.
pub fn evidence_kind_for(content_type: &str) -> EvidenceKind {
    if content_type.starts_with("image/") {
        EvidenceKind::Image
    } else if content_type.starts_with("video/") {
        EvidenceKind::Video
    } else if content_type == "application/pdf"
        || content_type == "application/msword"
        || content_type.starts_with("application/vnd.openxmlformats-officedocument")
        || content_type == "text/plain"
    {
        EvidenceKind::Document
    } else {
        EvidenceKind::Other
    }
}

/// Validates and stores an upload batch, returning the evidence entries
/// to attach to a dispute.
pub async fn store_evidence<B: BlobStore + ?Sized>(
    blobs: &B,
    files: &[UploadFile],
    submitted_by: Party,
) -> Result<Vec<Evidence>, FulfillmentError> {
    validate_files(files)?;

    let mut entries = Vec::with_capacity(files.len());
    for file in files {
        let url = blobs.put(file).await?;
        entries.push(Evidence {
            kind: evidence_kind_for(&file.content_type),
            url,
            description: Some(file.filename.clone()),
            submitted_by,
            uploaded_at: Utc::now(),
        });
    }
    Ok(entries)
}
