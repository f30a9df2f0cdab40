//! Run state container. Every write names the run it belongs to, so writes
//! from a superseded run are rejected instead of applied.

use serde::Serialize;
use shared::{
    domain::{
        AnalysisStatus, AnalysisStep, DocumentAnalysis, RunId, StepDefinition, StepId, StepStatus,
    },
    error::ErrorReport,
    protocol::{FileSummary, StepTransition},
};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum RunPhase {
    Idle,
    Running { step_index: usize },
    Finalizing,
    Completed,
    Failed,
}

impl RunPhase {
    pub fn is_active(self) -> bool {
        matches!(self, Self::Running { .. } | Self::Finalizing)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running { .. } => "running",
            Self::Finalizing => "finalizing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionRejected {
    #[error("stale write for run {stale}; active run is {active}")]
    Stale { stale: RunId, active: RunId },
    #[error("run {run} does not accept this write in phase {phase}")]
    WrongPhase { run: RunId, phase: &'static str },
    #[error("step {step} is out of order; current step is {expected}")]
    OutOfOrder { step: StepId, expected: StepId },
    #[error("step {step} cannot move from {from:?} to {to:?}")]
    InvalidStatus {
        step: StepId,
        from: StepStatus,
        to: StepStatus,
    },
}

impl TransitionRejected {
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale { .. })
    }
}

/// Effect of an accepted step write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step entered `processing`.
    Started { index: usize },
    /// The step was already `processing`; nothing changed.
    Acknowledged,
    /// The step reached `completed`; `next` is the phase after it.
    Completed { index: usize, next: RunPhase },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetOutcome {
    pub aborted: Option<RunId>,
    pub generation: RunId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub run_id: RunId,
    pub phase: RunPhase,
    pub file: Option<FileSummary>,
    pub steps: Vec<AnalysisStep>,
    pub analysis: Option<DocumentAnalysis>,
    pub failure: Option<ErrorReport>,
}

impl SessionSnapshot {
    pub fn is_analyzing(&self) -> bool {
        self.phase.is_active()
    }
}

#[derive(Debug)]
pub struct RunSession {
    run_id: RunId,
    phase: RunPhase,
    file: Option<FileSummary>,
    steps: Vec<AnalysisStep>,
    analysis: Option<DocumentAnalysis>,
    failure: Option<ErrorReport>,
}

impl Default for RunSession {
    fn default() -> Self {
        Self::new()
    }
}

impl RunSession {
    pub fn new() -> Self {
        Self {
            run_id: RunId(0),
            phase: RunPhase::Idle,
            file: None,
            steps: Vec::new(),
            analysis: None,
            failure: None,
        }
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn steps(&self) -> &[AnalysisStep] {
        &self.steps
    }

    pub fn analysis(&self) -> Option<&DocumentAnalysis> {
        self.analysis.as_ref()
    }

    pub fn failure(&self) -> Option<&ErrorReport> {
        self.failure.as_ref()
    }

    pub fn file(&self) -> Option<&FileSummary> {
        self.file.as_ref()
    }

    pub fn is_analyzing(&self) -> bool {
        self.phase.is_active()
    }

    /// Step the active run is working on, if it is still in `Running`.
    pub fn current_step(&self) -> Option<&AnalysisStep> {
        match self.phase {
            RunPhase::Running { step_index } => self.steps.get(step_index),
            _ => None,
        }
    }

    /// True while `run` is the active run and has not reached a terminal phase.
    pub fn accepts(&self, run: RunId) -> bool {
        self.run_id == run && self.phase.is_active()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            run_id: self.run_id,
            phase: self.phase,
            file: self.file.clone(),
            steps: self.steps.clone(),
            analysis: self.analysis.clone(),
            failure: self.failure.clone(),
        }
    }

    /// Starts a new run with every step `pending`. Whatever the previous run
    /// held is dropped.
    pub fn begin(&mut self, file: FileSummary, plan: &[StepDefinition]) -> RunId {
        self.run_id = self.run_id.next();
        self.file = Some(file);
        self.steps = plan.iter().map(StepDefinition::to_pending_step).collect();
        self.analysis = None;
        self.failure = None;
        self.phase = if self.steps.is_empty() {
            RunPhase::Finalizing
        } else {
            RunPhase::Running { step_index: 0 }
        };
        self.run_id
    }

    /// Returns to `Idle` with nothing retained. The generation moves forward
    /// even when idle so no earlier run can write again.
    pub fn reset(&mut self) -> ResetOutcome {
        let aborted = self.phase.is_active().then_some(self.run_id);
        self.run_id = self.run_id.next();
        self.phase = RunPhase::Idle;
        self.file = None;
        self.steps.clear();
        self.analysis = None;
        self.failure = None;
        ResetOutcome {
            aborted,
            generation: self.run_id,
        }
    }

    pub fn apply(
        &mut self,
        run: RunId,
        transition: &StepTransition,
    ) -> Result<StepOutcome, TransitionRejected> {
        match transition.status {
            StepStatus::Processing => self.mark_processing(run, &transition.step_id),
            StepStatus::Completed => self.mark_completed(run, &transition.step_id),
            StepStatus::Pending => {
                let index = self.current_index(run)?;
                Err(TransitionRejected::InvalidStatus {
                    step: transition.step_id.clone(),
                    from: self.steps[index].status,
                    to: StepStatus::Pending,
                })
            }
        }
    }

    pub fn mark_processing(
        &mut self,
        run: RunId,
        step_id: &StepId,
    ) -> Result<StepOutcome, TransitionRejected> {
        let index = self.current_index(run)?;
        self.expect_current(index, step_id)?;

        let step = &mut self.steps[index];
        match step.status {
            StepStatus::Pending => {
                step.status = StepStatus::Processing;
                Ok(StepOutcome::Started { index })
            }
            StepStatus::Processing => Ok(StepOutcome::Acknowledged),
            StepStatus::Completed => Err(TransitionRejected::InvalidStatus {
                step: step_id.clone(),
                from: StepStatus::Completed,
                to: StepStatus::Processing,
            }),
        }
    }

    pub fn mark_completed(
        &mut self,
        run: RunId,
        step_id: &StepId,
    ) -> Result<StepOutcome, TransitionRejected> {
        let index = self.current_index(run)?;
        self.expect_current(index, step_id)?;

        let step = &mut self.steps[index];
        if step.status != StepStatus::Processing {
            return Err(TransitionRejected::InvalidStatus {
                step: step_id.clone(),
                from: step.status,
                to: StepStatus::Completed,
            });
        }
        step.status = StepStatus::Completed;

        let next = if index + 1 < self.steps.len() {
            RunPhase::Running {
                step_index: index + 1,
            }
        } else {
            RunPhase::Finalizing
        };
        self.phase = next;
        Ok(StepOutcome::Completed { index, next })
    }

    /// Publishes the result of a finalizing run. A record still marked
    /// `analyzing` is stored as `completed`; the controller never passes an
    /// `error` record here.
    pub fn complete(
        &mut self,
        run: RunId,
        mut analysis: DocumentAnalysis,
    ) -> Result<&DocumentAnalysis, TransitionRejected> {
        self.ensure_run(run)?;
        if self.phase != RunPhase::Finalizing {
            return Err(TransitionRejected::WrongPhase {
                run,
                phase: self.phase.name(),
            });
        }

        analysis.status = AnalysisStatus::Completed;
        self.phase = RunPhase::Completed;
        Ok(self.analysis.insert(analysis))
    }

    /// Ends an active run with an `error` record. Step progress made so far
    /// stays visible.
    pub fn fail(
        &mut self,
        run: RunId,
        failure: ErrorReport,
    ) -> Result<&DocumentAnalysis, TransitionRejected> {
        self.ensure_run(run)?;
        if !self.phase.is_active() {
            return Err(TransitionRejected::WrongPhase {
                run,
                phase: self.phase.name(),
            });
        }

        let file_name = self
            .file
            .as_ref()
            .map(|file| file.name.clone())
            .unwrap_or_default();
        let record = DocumentAnalysis::errored(file_name, failure.message.clone());
        self.failure = Some(failure);
        self.phase = RunPhase::Failed;
        Ok(self.analysis.insert(record))
    }

    fn ensure_run(&self, run: RunId) -> Result<(), TransitionRejected> {
        if self.run_id != run {
            return Err(TransitionRejected::Stale {
                stale: run,
                active: self.run_id,
            });
        }
        Ok(())
    }

    fn current_index(&self, run: RunId) -> Result<usize, TransitionRejected> {
        self.ensure_run(run)?;
        match self.phase {
            RunPhase::Running { step_index } => Ok(step_index),
            other => Err(TransitionRejected::WrongPhase {
                run,
                phase: other.name(),
            }),
        }
    }

    fn expect_current(&self, index: usize, step_id: &StepId) -> Result<(), TransitionRejected> {
        let expected = &self.steps[index].id;
        if expected != step_id {
            return Err(TransitionRejected::OutOfOrder {
                step: step_id.clone(),
                expected: expected.clone(),
            });
        }
        Ok(())
    }
}

/// Checks the ordering invariant: completed steps form a prefix, at most one
/// step is processing and it directly follows that prefix, the rest pend.
pub fn steps_are_ordered(steps: &[AnalysisStep]) -> bool {
    let mut seen = StepStatus::Completed;
    let mut processing = 0;
    for step in steps {
        if step.status.rank() > seen.rank() {
            return false;
        }
        if step.status == StepStatus::Processing {
            processing += 1;
        }
        seen = match step.status {
            StepStatus::Completed => StepStatus::Completed,
            StepStatus::Processing | StepStatus::Pending => StepStatus::Pending,
        };
    }
    processing <= 1
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
