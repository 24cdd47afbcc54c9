//! Certificate commands

use std::path::PathBuf;

use anyhow::Context;
use campus_core::{
    CertificateKind, CertificateMetadata, CertificateUploader, Config, LocalObjectStore, Role,
    UserDirectory,
};
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};

use super::{open_database, print_json};

/// Certificate commands
#[derive(Args, Debug)]
pub struct CertificateArgs {
    #[command(subcommand)]
    pub command: CertificateCommand,
}

#[derive(Subcommand, Debug)]
pub enum CertificateCommand {
    /// Upload or replace a certificate
    Upload {
        /// Owning student's user ID
        #[arg(long, value_name = "USER_ID")]
        student: i64,

        /// Certificate kind (e.g., toefl)
        #[arg(short, long)]
        kind: String,

        /// PDF, PNG or JPEG file
        file: PathBuf,
    },

    /// List a student's certificates
    List {
        /// Student's user ID
        #[arg(long, value_name = "USER_ID")]
        student: i64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show certificate metadata, optionally saving the file
    Show {
        /// Student's user ID
        #[arg(long, value_name = "USER_ID")]
        student: i64,

        /// Certificate kind
        #[arg(short, long)]
        kind: String,

        /// Write the stored file here
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove a certificate
    Remove {
        /// Student's user ID
        #[arg(long, value_name = "USER_ID")]
        student: i64,

        /// Certificate kind
        #[arg(short, long)]
        kind: String,
    },
}

impl CertificateArgs {
    /// Execute the certificate command
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let root = config
            .storage_root()
            .context("No certificate storage root configured")?;
        let uploader = CertificateUploader::new(LocalObjectStore::new(root))
            .with_max_bytes(config.storage.max_certificate_bytes);

        match &self.command {
            CertificateCommand::Upload {
                student,
                kind,
                file,
            } => {
                ensure_student(config, *student)?;
                let kind: CertificateKind = kind.parse()?;
                let data = tokio::fs::read(file)
                    .await
                    .with_context(|| format!("Failed to read {}", file.display()))?;
                let filename = file
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| kind.to_string());

                let result = uploader.upload(*student, &kind, &filename, &data).await?;
                println!(
                    "{:?}: {} for student {} (revision {})",
                    result.outcome, kind, student, result.metadata.revision
                );
            }
            CertificateCommand::List { student, json } => {
                let list = uploader.list(*student).await?;
                if *json {
                    return print_json(&list);
                }
                if list.is_empty() {
                    println!("No certificates.");
                }
                for metadata in &list {
                    print_metadata(metadata);
                }
            }
            CertificateCommand::Show {
                student,
                kind,
                output,
                json,
            } => {
                let kind: CertificateKind = kind.parse()?;
                let metadata = uploader
                    .metadata(*student, &kind)
                    .await?
                    .with_context(|| format!("No {} certificate for student {}", kind, student))?;

                if let Some(path) = output {
                    let data = uploader.get(*student, &kind).await?;
                    tokio::fs::write(path, &data)
                        .await
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    tracing::info!(path = %path.display(), "Certificate saved");
                }

                if *json {
                    return print_json(&metadata);
                }
                print_metadata(&metadata);
            }
            CertificateCommand::Remove { student, kind } => {
                let kind: CertificateKind = kind.parse()?;
                if uploader.remove(*student, &kind).await? {
                    println!("Removed {} certificate for student {}", kind, student);
                } else {
                    println!("No {} certificate for student {}", kind, student);
                }
            }
        }

        Ok(())
    }
}

fn ensure_student(config: &Config, id: i64) -> anyhow::Result<()> {
    let db = open_database(config)?;
    let user = UserDirectory::new(&db).get(id)?;
    if user.role != Role::Student {
        anyhow::bail!("User {} is {}, not a student", id, user.role);
    }
    Ok(())
}

fn print_metadata(metadata: &CertificateMetadata) {
    println!("  {} (revision {})", metadata.kind, metadata.revision);
    println!("      File: {}", metadata.original_filename);
    println!(
        "      Type: {}, {} bytes",
        metadata.content_type, metadata.size
    );
    println!("      SHA-256: {}", metadata.sha256);
    println!(
        "      Updated: {}",
        DateTime::<Utc>::from(metadata.updated_at).format("%Y-%m-%d %H:%M")
    );
}
