//! Student certificate uploads
//!
//! Each student holds at most one certificate per kind. The file lives at
//! `certificates/{student_id}/{kind}` in an [`ObjectStore`] and a TOML sidecar
//! at `{key}.meta.toml` records where it came from.

pub mod store;
pub mod upload;

use std::fmt;
use std::str::FromStr;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub use store::{LocalObjectStore, ObjectStore};
pub use upload::{CertificateUploader, UploadOutcome, UploadResult};

/// Default upload size limit (5 MiB)
pub const DEFAULT_MAX_CERTIFICATE_BYTES: u64 = 5 * 1024 * 1024;

const MAX_KIND_LEN: usize = 64;

/// Certificate kind slug, e.g. `toefl` or `organization_award`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CertificateKind(String);

impl CertificateKind {
    /// Validate and wrap a kind slug
    pub fn new(kind: &str) -> Result<Self> {
        let valid_chars = kind
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_' || b == b'-');
        if kind.is_empty() || kind.len() > MAX_KIND_LEN || !valid_chars {
            return Err(Error::InvalidInput(format!(
                "Certificate kind '{}' must be 1-{} characters of a-z, 0-9, '_' or '-'",
                kind, MAX_KIND_LEN
            )));
        }
        Ok(Self(kind.to_string()))
    }

    /// The slug
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CertificateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CertificateKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for CertificateKind {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<CertificateKind> for String {
    fn from(kind: CertificateKind) -> Self {
        kind.0
    }
}

/// Accepted certificate file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Pdf,
    Png,
    Jpeg,
}

impl ContentType {
    /// Detect the format from the file's leading bytes
    pub fn sniff(data: &[u8]) -> Option<Self> {
        if data.starts_with(b"%PDF") {
            Some(Self::Pdf)
        } else if data.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(Self::Png)
        } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else {
            None
        }
    }

    /// MIME type
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

/// Sidecar metadata stored next to each certificate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificateMetadata {
    /// Owning student
    pub student_id: i64,

    /// Certificate kind
    pub kind: CertificateKind,

    /// File name as uploaded
    pub original_filename: String,

    /// Detected format
    pub content_type: ContentType,

    /// Lowercase hex SHA-256 of the stored bytes
    pub sha256: String,

    /// Size in bytes
    pub size: u64,

    /// When the first version was uploaded
    #[serde(with = "humantime_serde")]
    pub first_uploaded_at: SystemTime,

    /// When the current version was uploaded
    #[serde(with = "humantime_serde")]
    pub updated_at: SystemTime,

    /// Starts at 1 and increases on every replacement
    pub revision: u32,
}

impl CertificateMetadata {
    pub(crate) fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Storage(format!("Failed to encode certificate metadata: {}", e)))
    }

    pub(crate) fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::Storage(format!("Failed to decode certificate metadata: {}", e)))
    }
}

/// Object key of a student's certificate
pub fn certificate_key(student_id: i64, kind: &CertificateKind) -> String {
    format!("certificates/{}/{}", student_id, kind)
}

/// Object key of a certificate's sidecar metadata
pub fn metadata_key(student_id: i64, kind: &CertificateKind) -> String {
    format!("{}.meta.toml", certificate_key(student_id, kind))
}
