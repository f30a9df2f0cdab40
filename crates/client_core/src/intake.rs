//! Upload intake: one file at a time, allowlisted document types only, and
//! nothing while a run is in flight.

use std::sync::Arc;

use shared::{
    domain::RunId,
    error::{ErrorCode, ErrorReport},
    protocol::FileDescriptor,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::controller::ProgressController;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptedType {
    pub mime_type: &'static str,
    pub extensions: &'static [&'static str],
    pub label: &'static str,
}

pub const ACCEPTED_TYPES: [AcceptedType; 4] = [
    AcceptedType {
        mime_type: "application/pdf",
        extensions: &[".pdf"],
        label: "PDF",
    },
    AcceptedType {
        mime_type: "application/msword",
        extensions: &[".doc"],
        label: "DOC",
    },
    AcceptedType {
        mime_type: "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        extensions: &[".docx"],
        label: "DOCX",
    },
    AcceptedType {
        mime_type: "text/plain",
        extensions: &[".txt"],
        label: "TXT",
    },
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntakeError {
    #[error("unsupported file type for '{name}' ({})", mime_type.as_deref().unwrap_or("unknown type"))]
    UnsupportedFileType {
        name: String,
        mime_type: Option<String>,
    },
    #[error("only one file can be analyzed at a time; received {count}")]
    TooManyFiles { count: usize },
}

impl IntakeError {
    pub fn report(&self) -> ErrorReport {
        let code = match self {
            Self::UnsupportedFileType { .. } => ErrorCode::UnsupportedFileType,
            Self::TooManyFiles { .. } => ErrorCode::TooManyFiles,
        };
        ErrorReport::new(code, self.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeOutcome {
    Started(RunId),
    /// Nothing to do: no file was given or a run is already in flight.
    Ignored,
}

/// Matches when either the declared MIME type or the file extension is on the
/// allowlist. File bytes are never inspected.
pub fn accepted_type(file: &FileDescriptor) -> Option<&'static AcceptedType> {
    let mime = file
        .mime_type
        .as_deref()
        .map(|mime| mime.trim().to_ascii_lowercase());
    let extension = file.extension();

    ACCEPTED_TYPES.iter().find(|accepted| {
        mime.as_deref() == Some(accepted.mime_type)
            || extension
                .as_deref()
                .is_some_and(|ext| accepted.extensions.contains(&ext))
    })
}

pub fn validate(file: &FileDescriptor) -> Result<&'static AcceptedType, IntakeError> {
    accepted_type(file).ok_or_else(|| IntakeError::UnsupportedFileType {
        name: file.name.clone(),
        mime_type: file.mime_type.clone(),
    })
}

pub struct UploadIntake {
    controller: Arc<ProgressController>,
}

impl UploadIntake {
    pub fn new(controller: Arc<ProgressController>) -> Self {
        Self { controller }
    }

    pub fn controller(&self) -> &Arc<ProgressController> {
        &self.controller
    }

    pub async fn is_armed(&self) -> bool {
        !self.controller.is_analyzing().await
    }

    pub async fn submit(&self, file: FileDescriptor) -> Result<IntakeOutcome, IntakeError> {
        if self.controller.is_analyzing().await {
            debug!(file = %file.name, "intake: disabled while analyzing");
            return Ok(IntakeOutcome::Ignored);
        }

        let accepted = validate(&file)?;
        info!("intake: accepted file={} type={}", file.name, accepted.label);

        Ok(match self.controller.start_if_idle(file).await {
            Some(run) => IntakeOutcome::Started(run),
            None => IntakeOutcome::Ignored,
        })
    }

    /// Drop/browse entry point. Several files at once are rejected as a whole.
    pub async fn submit_batch(
        &self,
        files: Vec<FileDescriptor>,
    ) -> Result<IntakeOutcome, IntakeError> {
        if self.controller.is_analyzing().await {
            debug!(count = files.len(), "intake: disabled while analyzing");
            return Ok(IntakeOutcome::Ignored);
        }

        let count = files.len();
        let mut files = files.into_iter();
        match (files.next(), count) {
            (None, _) => Ok(IntakeOutcome::Ignored),
            (Some(file), 1) => self.submit(file).await,
            (Some(_), count) => Err(IntakeError::TooManyFiles { count }),
        }
    }
}

#[cfg(test)]
#[path = "tests/intake_tests.rs"]
mod tests;
