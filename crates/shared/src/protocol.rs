use std::{path::Path, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::domain::{StepId, StepStatus};

/// A submitted document: declared name and MIME type plus its raw bytes.
#[derive(Debug, Clone)]
pub struct FileDescriptor {
    pub name: String,
    pub mime_type: Option<String>,
    pub content: Arc<[u8]>,
}

impl FileDescriptor {
    pub fn new(
        name: impl Into<String>,
        mime_type: Option<String>,
        content: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type,
            content: content.into(),
        }
    }

    /// Descriptor without content, for callers that only have metadata.
    pub fn named(name: impl Into<String>, mime_type: Option<&str>) -> Self {
        Self::new(name, mime_type.map(str::to_string), Vec::new())
    }

    /// Lower-cased extension including the leading dot, e.g. `.pdf`.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
    }

    pub fn size_bytes(&self) -> usize {
        self.content.len()
    }

    pub fn summary(&self) -> FileSummary {
        FileSummary {
            name: self.name.clone(),
            mime_type: self.mime_type.clone(),
            size_bytes: self.size_bytes() as u64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    pub size_bytes: u64,
}

/// One status change of one step, as emitted by an analysis engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepTransition {
    pub step_id: StepId,
    pub status: StepStatus,
}

impl StepTransition {
    pub fn processing(step_id: StepId) -> Self {
        Self {
            step_id,
            status: StepStatus::Processing,
        }
    }

    pub fn completed(step_id: StepId) -> Self {
        Self {
            step_id,
            status: StepStatus::Completed,
        }
    }
}
