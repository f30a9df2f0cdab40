//! Analysis engine seam: the collaborator that turns a submitted document into
//! ordered step transitions and, at the end, one `DocumentAnalysis`.

use anyhow::anyhow;
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use shared::{
    domain::{DocumentAnalysis, StepDefinition},
    protocol::{FileDescriptor, StepTransition},
};

mod mock;
pub mod templates;

pub use mock::{MockAnalysisEngine, MockEngineOptions};

#[async_trait]
pub trait AnalysisEngine: Send + Sync {
    /// Ordered steps this engine will report for `file`.
    fn step_plan(&self, file: &FileDescriptor) -> Vec<StepDefinition>;

    /// Lazy, finite, single-use stream of transitions in step order.
    fn run_steps(&self, file: &FileDescriptor)
        -> BoxStream<'static, anyhow::Result<StepTransition>>;

    async fn produce_result(&self, file: &FileDescriptor) -> anyhow::Result<DocumentAnalysis>;
}

pub struct MissingAnalysisEngine;

#[async_trait]
impl AnalysisEngine for MissingAnalysisEngine {
    fn step_plan(&self, _file: &FileDescriptor) -> Vec<StepDefinition> {
        Vec::new()
    }

    fn run_steps(
        &self,
        file: &FileDescriptor,
    ) -> BoxStream<'static, anyhow::Result<StepTransition>> {
        let message = format!("analysis engine unavailable for {}", file.name);
        stream::once(async move { Err(anyhow!(message)) }).boxed()
    }

    async fn produce_result(&self, file: &FileDescriptor) -> anyhow::Result<DocumentAnalysis> {
        Err(anyhow!("analysis engine unavailable for {}", file.name))
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
