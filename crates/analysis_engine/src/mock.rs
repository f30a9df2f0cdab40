use std::{sync::Mutex, time::Duration};

use async_trait::async_trait;
use chrono::Utc;
use futures::stream::{self, BoxStream, StreamExt};
use rand::{rngs::StdRng, seq::IndexedRandom, SeedableRng};
use shared::{
    domain::{AnalysisStatus, DocumentAnalysis, RiskLevel, StepDefinition, StepId},
    protocol::{FileDescriptor, StepTransition},
};
use tracing::debug;
use uuid::Uuid;

use crate::{templates, AnalysisEngine};

const DEFAULT_STEP_DELAY: Duration = Duration::from_millis(1500);
const DEFAULT_RESULT_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockEngineOptions {
    /// Simulated work per step, between its `processing` and `completed` signals.
    pub step_delay: Duration,
    /// Simulated work before the final result is handed back.
    pub result_delay: Duration,
}

impl Default for MockEngineOptions {
    fn default() -> Self {
        Self {
            step_delay: DEFAULT_STEP_DELAY,
            result_delay: DEFAULT_RESULT_DELAY,
        }
    }
}

/// Engine that paces the five canned steps with fixed delays and fills the
/// result from static templates. Document type and risk level are drawn
/// uniformly at random.
pub struct MockAnalysisEngine {
    options: MockEngineOptions,
    rng: Mutex<StdRng>,
}

impl MockAnalysisEngine {
    pub fn new(options: MockEngineOptions) -> Self {
        Self {
            options,
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    pub fn with_rng_seed(options: MockEngineOptions, seed: u64) -> Self {
        Self {
            options,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn options(&self) -> MockEngineOptions {
        self.options
    }

    /// Builds the result immediately, without the simulated result delay.
    pub fn synthesize(&self, file_name: &str) -> DocumentAnalysis {
        let (document_type, risk_level) = {
            let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            let document_type = templates::DOCUMENT_TYPES
                .choose(&mut *rng)
                .copied()
                .unwrap_or(templates::DOCUMENT_TYPES[0]);
            let risk_level = RiskLevel::ALL
                .choose(&mut *rng)
                .copied()
                .unwrap_or_default();
            (document_type, risk_level)
        };

        DocumentAnalysis {
            id: Uuid::new_v4(),
            file_name: file_name.to_string(),
            document_type: document_type.to_string(),
            upload_date: Utc::now(),
            status: AnalysisStatus::Completed,
            risk_level,
            summary: templates::SUMMARY.to_string(),
            plain_language_explanation: templates::PLAIN_LANGUAGE_EXPLANATION.to_string(),
            key_points: templates::KEY_POINTS.iter().map(|p| p.to_string()).collect(),
            recommendations: templates::RECOMMENDATIONS
                .iter()
                .map(|r| r.to_string())
                .collect(),
            important_clauses: templates::important_clauses(),
        }
    }
}

impl Default for MockAnalysisEngine {
    fn default() -> Self {
        Self::new(MockEngineOptions::default())
    }
}

struct StepCursor {
    step_ids: Vec<StepId>,
    index: usize,
    announced: bool,
}

#[async_trait]
impl AnalysisEngine for MockAnalysisEngine {
    fn step_plan(&self, _file: &FileDescriptor) -> Vec<StepDefinition> {
        templates::analysis_steps()
    }

    fn run_steps(
        &self,
        file: &FileDescriptor,
    ) -> BoxStream<'static, anyhow::Result<StepTransition>> {
        let cursor = StepCursor {
            step_ids: self.step_plan(file).into_iter().map(|step| step.id).collect(),
            index: 0,
            announced: false,
        };
        let step_delay = self.options.step_delay;

        stream::unfold(cursor, move |mut cursor| async move {
            let step_id = cursor.step_ids.get(cursor.index)?.clone();
            if !cursor.announced {
                cursor.announced = true;
                debug!(step = %step_id, "mock engine: step processing");
                return Some((Ok(StepTransition::processing(step_id)), cursor));
            }

            tokio::time::sleep(step_delay).await;
            cursor.index += 1;
            cursor.announced = false;
            debug!(step = %step_id, "mock engine: step completed");
            Some((Ok(StepTransition::completed(step_id)), cursor))
        })
        .boxed()
    }

    async fn produce_result(&self, file: &FileDescriptor) -> anyhow::Result<DocumentAnalysis> {
        tokio::time::sleep(self.options.result_delay).await;
        Ok(self.synthesize(&file.name))
    }
}
