//! Certificate upload handling

use std::time::SystemTime;

use serde::Serialize;
use sha2::{Digest, Sha256};

use super::store::ObjectStore;
use super::{
    certificate_key, metadata_key, CertificateKind, CertificateMetadata, ContentType,
    DEFAULT_MAX_CERTIFICATE_BYTES,
};
use crate::{Error, Result};

/// What an upload did to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadOutcome {
    /// No certificate of this kind existed
    Created,
    /// A different file replaced the previous one
    Replaced,
    /// The same bytes were already stored
    Unchanged,
}

/// Result of an upload
#[derive(Debug, Clone)]
pub struct UploadResult {
    pub outcome: UploadOutcome,
    pub metadata: CertificateMetadata,
}

/// Validates and stores student certificates
pub struct CertificateUploader<S> {
    store: S,
    max_bytes: u64,
}

impl<S: ObjectStore> CertificateUploader<S> {
    /// Create an uploader with the default size limit
    pub fn new(store: S) -> Self {
        Self {
            store,
            max_bytes: DEFAULT_MAX_CERTIFICATE_BYTES,
        }
    }

    /// Override the size limit
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Upload or replace a student's certificate of `kind`
    ///
    /// Uploading the same bytes again is a no-op reported as
    /// [`UploadOutcome::Unchanged`]. Metadata left behind by a missing
    /// object is ignored and the upload counts as
    /// [`UploadOutcome::Created`].
    pub async fn upload(
        &self,
        student_id: i64,
        kind: &CertificateKind,
        filename: &str,
        data: &[u8],
    ) -> Result<UploadResult> {
        let content_type = self.validate(data)?;
        let sha256 = hex_digest(data);

        let object_key = certificate_key(student_id, kind);
        let existing = if self.store.exists(&object_key).await? {
            self.metadata(student_id, kind).await?
        } else {
            if self.store.exists(&metadata_key(student_id, kind)).await? {
                tracing::warn!(
                    student_id,
                    kind = %kind,
                    "Discarding metadata of a missing certificate"
                );
            }
            None
        };
        let now = SystemTime::now();

        let (outcome, metadata) = match existing {
            Some(previous) if previous.sha256 == sha256 => {
                tracing::debug!(student_id, kind = %kind, "Certificate unchanged");
                return Ok(UploadResult {
                    outcome: UploadOutcome::Unchanged,
                    metadata: previous,
                });
            }
            Some(previous) => (
                UploadOutcome::Replaced,
                CertificateMetadata {
                    original_filename: filename.to_string(),
                    content_type,
                    sha256,
                    size: data.len() as u64,
                    updated_at: now,
                    revision: previous.revision + 1,
                    ..previous
                },
            ),
            None => (
                UploadOutcome::Created,
                CertificateMetadata {
                    student_id,
                    kind: kind.clone(),
                    original_filename: filename.to_string(),
                    content_type,
                    sha256,
                    size: data.len() as u64,
                    first_uploaded_at: now,
                    updated_at: now,
                    revision: 1,
                },
            ),
        };

        self.store.put(&object_key, data).await?;
        self.store
            .put(
                &metadata_key(student_id, kind),
                metadata.to_toml()?.as_bytes(),
            )
            .await?;

        tracing::info!(
            student_id,
            kind = %kind,
            outcome = ?outcome,
            revision = metadata.revision,
            "Certificate stored"
        );

        Ok(UploadResult { outcome, metadata })
    }

    /// Read a certificate's bytes
    pub async fn get(&self, student_id: i64, kind: &CertificateKind) -> Result<Vec<u8>> {
        match self.store.get(&certificate_key(student_id, kind)).await {
            Err(Error::NotFound(_)) => Err(Error::NotFound(format!(
                "Certificate {} for student {}",
                kind, student_id
            ))),
            other => other,
        }
    }

    /// Read a certificate's metadata, if it exists
    pub async fn metadata(
        &self,
        student_id: i64,
        kind: &CertificateKind,
    ) -> Result<Option<CertificateMetadata>> {
        let key = metadata_key(student_id, kind);
        if !self.store.exists(&key).await? {
            return Ok(None);
        }
        let bytes = self.store.get(&key).await?;
        let content = String::from_utf8(bytes)
            .map_err(|e| Error::Storage(format!("Metadata {} is not UTF-8: {}", key, e)))?;
        CertificateMetadata::from_toml(&content).map(Some)
    }

    /// All certificates held by a student, ordered by kind
    pub async fn list(&self, student_id: i64) -> Result<Vec<CertificateMetadata>> {
        let prefix = format!("certificates/{}", student_id);
        let mut result = Vec::new();
        for key in self.store.list(&prefix).await? {
            let Some(kind) = key
                .rsplit('/')
                .next()
                .and_then(|name| name.strip_suffix(".meta.toml"))
            else {
                continue;
            };
            let Ok(kind) = CertificateKind::new(kind) else {
                tracing::warn!(key = %key, "Skipping metadata with invalid kind");
                continue;
            };
            if let Some(metadata) = self.metadata(student_id, &kind).await? {
                result.push(metadata);
            }
        }
        Ok(result)
    }

    /// Remove a certificate and its metadata; returns whether it existed
    pub async fn remove(&self, student_id: i64, kind: &CertificateKind) -> Result<bool> {
        let removed = self.store.delete(&certificate_key(student_id, kind)).await?;
        let removed_meta = self.store.delete(&metadata_key(student_id, kind)).await?;
        if removed || removed_meta {
            tracing::info!(student_id, kind = %kind, "Certificate removed");
        }
        Ok(removed || removed_meta)
    }

    fn validate(&self, data: &[u8]) -> Result<ContentType> {
        if data.is_empty() {
            return Err(Error::InvalidInput("Certificate file is empty".to_string()));
        }
        if data.len() as u64 > self.max_bytes {
            return Err(Error::InvalidInput(format!(
                "Certificate is {} bytes; the limit is {} bytes",
                data.len(),
                self.max_bytes
            )));
        }
        ContentType::sniff(data).ok_or_else(|| {
            Error::InvalidInput("Certificate must be a PDF, PNG or JPEG file".to_string())
        })
    }
}

fn hex_digest(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}
