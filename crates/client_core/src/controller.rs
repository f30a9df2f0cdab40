//! Drives one analysis run at a time against an `AnalysisEngine`.
//!
//! All writes go through `RunSession` under one lock and carry the run id
//! they were issued for. `reset` and `start` move the generation forward and
//! abort the previous driver task; anything the old task still manages to
//! deliver is rejected as stale.

use std::{sync::Arc, time::Duration};

use analysis_engine::AnalysisEngine;
use futures::{stream::BoxStream, StreamExt};
use shared::{
    domain::{AnalysisStatus, AnalysisStep, DocumentAnalysis, RunId, StepId, StepStatus},
    error::{ErrorCode, ErrorReport},
    protocol::{FileDescriptor, FileSummary, StepTransition},
};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, error, info, warn};

use crate::{
    config::ControllerSettings,
    session::{RunPhase, RunSession, SessionSnapshot, StepOutcome, TransitionRejected},
};

#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    RunStarted {
        run: RunId,
        file: FileSummary,
        steps: Vec<AnalysisStep>,
    },
    StepChanged {
        run: RunId,
        index: usize,
        step_id: StepId,
        status: StepStatus,
    },
    Finalizing {
        run: RunId,
    },
    RunCompleted {
        run: RunId,
        analysis: DocumentAnalysis,
    },
    RunFailed {
        run: RunId,
        failure: ErrorReport,
        analysis: DocumentAnalysis,
    },
    RunAborted {
        run: RunId,
    },
}

impl ControllerEvent {
    pub fn run(&self) -> RunId {
        match self {
            Self::RunStarted { run, .. }
            | Self::StepChanged { run, .. }
            | Self::Finalizing { run }
            | Self::RunCompleted { run, .. }
            | Self::RunFailed { run, .. }
            | Self::RunAborted { run } => *run,
        }
    }

    /// True for events after which the run never changes again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::RunCompleted { .. } | Self::RunFailed { .. } | Self::RunAborted { .. }
        )
    }
}

/// Why a driver stopped waiting on the engine.
enum DriverStop {
    Superseded,
    Failed(ErrorReport),
}

impl From<TransitionRejected> for DriverStop {
    fn from(rejected: TransitionRejected) -> Self {
        if rejected.is_stale() {
            Self::Superseded
        } else {
            Self::Failed(ErrorReport::new(
                ErrorCode::ProtocolViolation,
                rejected.to_string(),
            ))
        }
    }
}

struct ActiveDriver {
    run: RunId,
    task: JoinHandle<()>,
}

pub struct ProgressController {
    engine: Arc<dyn AnalysisEngine>,
    settings: ControllerSettings,
    session: Mutex<RunSession>,
    driver: Mutex<Option<ActiveDriver>>,
    events: broadcast::Sender<ControllerEvent>,
}

impl ProgressController {
    pub fn new(engine: Arc<dyn AnalysisEngine>) -> Arc<Self> {
        Self::new_with_settings(engine, ControllerSettings::default())
    }

    pub fn new_with_settings(
        engine: Arc<dyn AnalysisEngine>,
        settings: ControllerSettings,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(settings.event_buffer.max(1));
        Arc::new(Self {
            engine,
            settings,
            session: Mutex::new(RunSession::new()),
            driver: Mutex::new(None),
            events,
        })
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    pub fn event_stream(&self) -> BroadcastStream<ControllerEvent> {
        BroadcastStream::new(self.events.subscribe())
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.session.lock().await.snapshot()
    }

    pub async fn is_analyzing(&self) -> bool {
        self.session.lock().await.is_analyzing()
    }

    /// Starts a run for `file`, superseding any run still in flight.
    pub async fn start(self: &Arc<Self>, file: FileDescriptor) -> RunId {
        let plan = self.engine.step_plan(&file);
        let run = {
            let mut session = self.session.lock().await;
            let outcome = session.reset();
            if let Some(aborted) = outcome.aborted {
                info!("analysis: run={aborted} superseded");
                self.publish(ControllerEvent::RunAborted { run: aborted });
            }
            self.begin_locked(&mut session, &file, &plan)
        };
        self.spawn_driver(run, file).await;
        run
    }

    /// Starts a run only when none is in flight; otherwise leaves the active
    /// run untouched and returns `None`.
    pub async fn start_if_idle(self: &Arc<Self>, file: FileDescriptor) -> Option<RunId> {
        let plan = self.engine.step_plan(&file);
        let run = {
            let mut session = self.session.lock().await;
            if session.is_analyzing() {
                debug!(file = %file.name, "analysis: run in flight, submission ignored");
                return None;
            }
            self.begin_locked(&mut session, &file, &plan)
        };
        self.spawn_driver(run, file).await;
        Some(run)
    }

    /// Clears the step sequence, file and result and returns to idle. Safe in
    /// any phase.
    pub async fn reset(&self) {
        let outcome = {
            let mut session = self.session.lock().await;
            let outcome = session.reset();
            match outcome.aborted {
                Some(run) => {
                    info!("analysis: run={run} aborted");
                    self.publish(ControllerEvent::RunAborted { run });
                }
                None => debug!("analysis: reset while idle"),
            }
            outcome
        };

        let mut driver = self.driver.lock().await;
        // A newer start may already own the slot; leave its task alone.
        if driver
            .as_ref()
            .is_some_and(|active| active.run < outcome.generation)
        {
            if let Some(active) = driver.take() {
                active.task.abort();
            }
        }
    }

    fn begin_locked(
        &self,
        session: &mut RunSession,
        file: &FileDescriptor,
        plan: &[shared::domain::StepDefinition],
    ) -> RunId {
        let run = session.begin(file.summary(), plan);
        info!(
            "analysis: run={} started file={} steps={}",
            run,
            file.name,
            plan.len()
        );
        self.publish(ControllerEvent::RunStarted {
            run,
            file: file.summary(),
            steps: session.steps().to_vec(),
        });
        run
    }

    async fn spawn_driver(self: &Arc<Self>, run: RunId, file: FileDescriptor) {
        let controller = Arc::clone(self);
        let task = tokio::spawn(async move { controller.drive(run, file).await });

        let mut driver = self.driver.lock().await;
        match driver.as_ref() {
            Some(active) if active.run > run => {
                // Lost a race with a newer start.
                task.abort();
            }
            _ => {
                if let Some(previous) = driver.replace(ActiveDriver { run, task }) {
                    previous.task.abort();
                }
            }
        }
    }

    async fn drive(self: Arc<Self>, run: RunId, file: FileDescriptor) {
        let mut transitions = self.engine.run_steps(&file);

        loop {
            let step_id = match self.advance(run).await {
                Ok(Some(step_id)) => step_id,
                Ok(None) => break,
                Err(stop) => return self.stop(run, stop).await,
            };

            let wait = self.await_step_completion(run, &step_id, &mut transitions);
            let waited = match self.settings.step_timeout() {
                Some(limit) => match tokio::time::timeout(limit, wait).await {
                    Ok(result) => result,
                    Err(_) => Err(DriverStop::Failed(timeout_report(&step_id, limit))),
                },
                None => wait.await,
            };
            if let Err(stop) = waited {
                return self.stop(run, stop).await;
            }
        }

        drop(transitions);
        self.finalize(run, &file).await;
    }

    /// Marks the current step `processing`. `None` once every step is done.
    async fn advance(&self, run: RunId) -> Result<Option<StepId>, DriverStop> {
        let mut session = self.session.lock().await;
        if !session.accepts(run) {
            return Err(DriverStop::Superseded);
        }
        let Some(step_id) = session.current_step().map(|step| step.id.clone()) else {
            return Ok(None);
        };

        if let StepOutcome::Started { index } = session.mark_processing(run, &step_id)? {
            debug!(run = %run, step = %step_id, "analysis: step processing");
            self.publish(ControllerEvent::StepChanged {
                run,
                index,
                step_id: step_id.clone(),
                status: StepStatus::Processing,
            });
        }
        Ok(Some(step_id))
    }

    async fn await_step_completion(
        &self,
        run: RunId,
        step_id: &StepId,
        transitions: &mut BoxStream<'static, anyhow::Result<StepTransition>>,
    ) -> Result<(), DriverStop> {
        loop {
            let transition = match transitions.next().await {
                Some(Ok(transition)) => transition,
                Some(Err(err)) => {
                    return Err(DriverStop::Failed(ErrorReport::new(
                        ErrorCode::EngineFailure,
                        format!("{err:#}"),
                    )))
                }
                None => {
                    return Err(DriverStop::Failed(ErrorReport::new(
                        ErrorCode::EngineFailure,
                        format!("engine stopped before step {step_id} completed"),
                    )))
                }
            };

            let mut session = self.session.lock().await;
            match session.apply(run, &transition) {
                Ok(StepOutcome::Acknowledged) => continue,
                Ok(StepOutcome::Started { .. }) => continue,
                Ok(StepOutcome::Completed { index, next }) => {
                    debug!(run = %run, step = %transition.step_id, "analysis: step completed");
                    self.publish(ControllerEvent::StepChanged {
                        run,
                        index,
                        step_id: transition.step_id,
                        status: StepStatus::Completed,
                    });
                    if next == RunPhase::Finalizing {
                        self.publish(ControllerEvent::Finalizing { run });
                    }
                    return Ok(());
                }
                Err(rejected) => {
                    if !rejected.is_stale() {
                        warn!(run = %run, "analysis: engine protocol violation: {rejected}");
                    }
                    return Err(rejected.into());
                }
            }
        }
    }

    async fn finalize(&self, run: RunId, file: &FileDescriptor) {
        if !self.session.lock().await.accepts(run) {
            debug!(run = %run, "analysis: dropping finalize for superseded run");
            return;
        }

        let produced = match self.settings.step_timeout() {
            Some(limit) => match tokio::time::timeout(limit, self.engine.produce_result(file)).await
            {
                Ok(result) => result.map_err(|err| engine_failure(&err)),
                Err(_) => Err(ErrorReport::new(
                    ErrorCode::StepTimeout,
                    format!("engine produced no result within {}ms", limit.as_millis()),
                )),
            },
            None => self
                .engine
                .produce_result(file)
                .await
                .map_err(|err| engine_failure(&err)),
        };

        let analysis = match produced {
            // An `error` record is the engine's own failure signal.
            Ok(analysis) if analysis.status == AnalysisStatus::Error => {
                let report = ErrorReport::new(
                    ErrorCode::EngineFailure,
                    format!("engine reported an error: {}", analysis.summary),
                );
                return self.stop(run, DriverStop::Failed(report)).await;
            }
            Ok(analysis) => analysis,
            Err(report) => return self.stop(run, DriverStop::Failed(report)).await,
        };

        let mut session = self.session.lock().await;
        match session.complete(run, analysis) {
            Ok(stored) => {
                info!(
                    "analysis: run={} completed risk={} type={}",
                    run,
                    stored.risk_level.label(),
                    stored.document_type
                );
                let analysis = stored.clone();
                self.publish(ControllerEvent::RunCompleted { run, analysis });
            }
            Err(rejected) if rejected.is_stale() => {
                debug!(run = %run, "analysis: dropping stale result: {rejected}");
            }
            Err(rejected) => {
                warn!(run = %run, "analysis: result rejected: {rejected}");
            }
        }
    }

    async fn stop(&self, run: RunId, stop: DriverStop) {
        let failure = match stop {
            DriverStop::Superseded => {
                debug!(run = %run, "analysis: driver exiting for superseded run");
                return;
            }
            DriverStop::Failed(failure) => failure,
        };

        let mut session = self.session.lock().await;
        match session.fail(run, failure.clone()) {
            Ok(record) => {
                error!(
                    "analysis: run={} failed code={:?} message={}",
                    run, failure.code, failure.message
                );
                let analysis = record.clone();
                self.publish(ControllerEvent::RunFailed {
                    run,
                    failure,
                    analysis,
                });
            }
            Err(rejected) => {
                debug!(run = %run, "analysis: dropping failure for superseded run: {rejected}");
            }
        }
    }

    fn publish(&self, event: ControllerEvent) {
        let _ = self.events.send(event);
    }
}

fn engine_failure(err: &anyhow::Error) -> ErrorReport {
    ErrorReport::new(ErrorCode::EngineFailure, format!("{err:#}"))
}

fn timeout_report(step_id: &StepId, limit: Duration) -> ErrorReport {
    ErrorReport::new(
        ErrorCode::StepTimeout,
        format!(
            "step {step_id} did not complete within {}ms",
            limit.as_millis()
        ),
    )
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
