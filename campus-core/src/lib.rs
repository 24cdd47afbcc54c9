//! Campus Core - letter request workflow for the campus portal
//!
//! This crate provides the role-gated approval workflow for student letter
//! requests, history replay and verification, and certificate uploads.

pub mod certificate;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod letter;
pub mod role;
#[cfg(feature = "database")]
pub mod service;
pub mod workflow;

pub use certificate::{
    CertificateKind, CertificateMetadata, CertificateUploader, LocalObjectStore, ObjectStore,
    UploadOutcome,
};
pub use config::Config;
pub use dashboard::DashboardStats;
pub use error::{Error, Result};
pub use letter::{LetterRequest, LetterType};
pub use role::{Actor, Role};
#[cfg(feature = "database")]
pub use service::{LetterService, User, UserDirectory, VerifyReport};
pub use workflow::{
    HistoryEntry, LetterAction, LetterState, LetterStatus, LetterWorkflow, TransitionResult,
    WorkflowStage,
};
