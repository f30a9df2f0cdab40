use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// Generation tag of one analysis run; a controller never reuses a value.
id_newtype!(RunId);

impl RunId {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Stable identifier of a step, unique within a run. Carries no ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepId(pub String);

impl StepId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Processing,
    Completed,
}

impl StepStatus {
    /// Position in the forward-only progression of a step.
    pub fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Processing => 1,
            Self::Completed => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    Analyzing,
    Completed,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High];

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Importance {
    High,
    Medium,
    Low,
}

impl Importance {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// Step content as supplied by an analysis engine before a run starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDefinition {
    pub id: StepId,
    pub title: String,
    pub description: String,
}

impl StepDefinition {
    pub fn new(id: impl Into<String>, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: StepId::new(id),
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn to_pending_step(&self) -> AnalysisStep {
        AnalysisStep {
            id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            status: StepStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisStep {
    pub id: StepId,
    pub title: String,
    pub description: String,
    pub status: StepStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportantClause {
    pub clause: String,
    pub explanation: String,
    pub importance: Importance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentAnalysis {
    pub id: Uuid,
    pub file_name: String,
    pub document_type: String,
    pub upload_date: DateTime<Utc>,
    pub status: AnalysisStatus,
    pub risk_level: RiskLevel,
    pub summary: String,
    pub plain_language_explanation: String,
    pub key_points: Vec<String>,
    pub recommendations: Vec<String>,
    pub important_clauses: Vec<ImportantClause>,
}

impl DocumentAnalysis {
    /// Terminal record for a run whose engine could not produce a result.
    pub fn errored(file_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            file_name: file_name.into(),
            document_type: "Unknown".to_string(),
            upload_date: Utc::now(),
            status: AnalysisStatus::Error,
            risk_level: RiskLevel::default(),
            summary: reason.into(),
            plain_language_explanation: String::new(),
            key_points: Vec::new(),
            recommendations: Vec::new(),
            important_clauses: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_analysis_uses_camel_case_contract() {
        let analysis = DocumentAnalysis::errored("contract.pdf", "engine unavailable");
        let json = serde_json::to_value(&analysis).expect("serialize");

        assert_eq!(json["fileName"], "contract.pdf");
        assert_eq!(json["status"], "error");
        assert_eq!(json["riskLevel"], "low");
        assert!(json.get("plainLanguageExplanation").is_some());
        assert!(json.get("importantClauses").is_some());
        assert!(json.get("uploadDate").is_some());
    }

    #[test]
    fn step_status_ranks_are_forward_only() {
        assert!(StepStatus::Pending.rank() < StepStatus::Processing.rank());
        assert!(StepStatus::Processing.rank() < StepStatus::Completed.rank());
    }

    #[test]
    fn definition_builds_pending_step() {
        let step = StepDefinition::new("1", "Document Processing", "Extracting text").to_pending_step();
        assert_eq!(step.id, StepId::new("1"));
        assert_eq!(step.status, StepStatus::Pending);
    }

    #[test]
    fn run_ids_increase() {
        assert_eq!(RunId(4).next(), RunId(5));
    }
}
