//! Async driver that executes [`SessionEffect`]s against a [`RecordSource`].

use std::{collections::VecDeque, sync::Arc};

use shared::domain::{DocId, Label, ProjectId};
use tokio::sync::{broadcast, Mutex};
use tracing::{error, info, warn};

use crate::{
    error::RecordSourceError,
    ledger::LedgerEntry,
    record_source::RecordSource,
    session::{SessionEffect, SessionMachine, SessionState, UndoBanner},
    stats::{StatisticsSynchronizer, StatisticsView},
};

#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    pub undo_banner: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self { undo_banner: true }
    }
}

#[derive(Debug, Clone)]
pub enum ReviewEvent {
    StateChanged(SessionState),
    UndoBanner(UndoBanner),
    UndoBannerClosed(DocId),
    SubmissionFailed {
        doc_id: DocId,
        label: Label,
        error: RecordSourceError,
    },
    StatisticsUpdated(StatisticsView),
}

/// Read-only view handed to the presentation layer.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub undo_available: bool,
    pub undo_banner: Option<UndoBanner>,
    pub statistics: StatisticsView,
}

/// One reviewing session for one project.
///
/// Commands take `&self`; the machine lock is never held across a backend call, so a
/// command arriving while a fetch is in flight sees `Loading` and is dropped.
pub struct ReviewSession {
    source: Arc<dyn RecordSource>,
    machine: Mutex<SessionMachine>,
    statistics: StatisticsSynchronizer,
    events: broadcast::Sender<ReviewEvent>,
}

impl ReviewSession {
    pub fn new(source: Arc<dyn RecordSource>, project: ProjectId, options: SessionOptions) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            statistics: StatisticsSynchronizer::new(Arc::clone(&source), project.clone()),
            machine: Mutex::new(SessionMachine::new(project, options.undo_banner)),
            source,
            events,
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ReviewEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let (state, undo_available, undo_banner) = {
            let machine = self.machine.lock().await;
            (
                machine.state().clone(),
                machine.undo_available(),
                machine.undo_banner().cloned(),
            )
        };
        SessionSnapshot {
            state,
            undo_available,
            undo_banner,
            statistics: self.statistics.view().await,
        }
    }

    pub async fn state(&self) -> SessionState {
        self.machine.lock().await.state().clone()
    }

    pub async fn ledger(&self) -> Option<LedgerEntry> {
        self.machine.lock().await.ledger().cloned()
    }

    pub async fn can_decide(&self) -> bool {
        self.machine.lock().await.can_decide()
    }

    pub async fn undo_available(&self) -> bool {
        self.machine.lock().await.undo_available()
    }

    pub async fn start(&self) {
        let effects = self.transition(|machine| machine.start()).await;
        self.run(effects).await;
    }

    pub async fn decide(&self, label: Label) {
        let effects = self.transition(|machine| machine.decide(label)).await;
        self.run(effects).await;
    }

    pub async fn retry(&self) {
        let effects = self.transition(|machine| machine.retry()).await;
        self.run(effects).await;
    }

    pub async fn undo(&self) -> bool {
        let (doc_id, state) = {
            let mut machine = self.machine.lock().await;
            let doc_id = machine.undo_banner().map(|banner| banner.doc_id);
            if !machine.undo() {
                return false;
            }
            (doc_id, machine.state().clone())
        };
        if let Some(doc_id) = doc_id {
            self.emit(ReviewEvent::UndoBannerClosed(doc_id));
        }
        self.emit(ReviewEvent::StateChanged(state));
        true
    }

    /// Closes banner `banner_id` if it is still the open one. A newer banner stays open.
    pub async fn dismiss_undo_banner(&self, banner_id: u64) {
        let closed = {
            let mut machine = self.machine.lock().await;
            let doc_id = machine.undo_banner().map(|banner| banner.doc_id);
            doc_id.filter(|_| machine.dismiss_undo_banner(banner_id))
        };
        if let Some(doc_id) = closed {
            self.emit(ReviewEvent::UndoBannerClosed(doc_id));
        }
    }

    /// Clears ledger and state so the session can be started again.
    pub async fn reset(&self) {
        let state = {
            let mut machine = self.machine.lock().await;
            machine.reset();
            machine.state().clone()
        };
        self.emit(ReviewEvent::StateChanged(state));
    }

    pub async fn refresh_statistics(&self) -> StatisticsView {
        let view = self.statistics.refresh().await;
        self.emit(ReviewEvent::StatisticsUpdated(view.clone()));
        view
    }

    async fn transition(
        &self,
        command: impl FnOnce(&mut SessionMachine) -> Vec<SessionEffect>,
    ) -> Vec<SessionEffect> {
        let mut machine = self.machine.lock().await;
        let before = machine.state().clone();
        let effects = command(&mut *machine);
        if *machine.state() != before {
            self.emit(ReviewEvent::StateChanged(machine.state().clone()));
        }
        effects
    }

    async fn run(&self, effects: Vec<SessionEffect>) {
        let mut pending = VecDeque::from(effects);
        while let Some(effect) = pending.pop_front() {
            match effect {
                SessionEffect::SubmitLabel {
                    doc_id,
                    label,
                    revision,
                } => self.submit(doc_id, label, revision).await,
                SessionEffect::ShowUndoBanner(banner) => {
                    self.emit(ReviewEvent::UndoBanner(banner));
                }
                SessionEffect::FetchNext { generation } => {
                    pending.extend(self.fetch_next(generation).await);
                }
                SessionEffect::RefreshStatistics => {
                    self.refresh_statistics().await;
                }
            }
        }
    }

    async fn submit(&self, doc_id: DocId, label: Label, revision: bool) {
        let project = self.machine.lock().await.project().clone();
        match self
            .source
            .submit_label(&project, doc_id, label, revision)
            .await
        {
            Ok(()) => info!(%project, %doc_id, %label, revision, "label submitted"),
            Err(err) => {
                warn!(
                    %project,
                    %doc_id,
                    %label,
                    revision,
                    error = %err,
                    "label submission failed; continuing"
                );
                self.emit(ReviewEvent::SubmissionFailed {
                    doc_id,
                    label,
                    error: err,
                });
            }
        }
    }

    async fn fetch_next(&self, generation: u64) -> Vec<SessionEffect> {
        let project = self.machine.lock().await.project().clone();
        let result = self.source.fetch_next(&project).await;
        match &result {
            Err(err @ RecordSourceError::Connectivity(_)) => {
                error!(%project, error = %err, "record fetch failed");
            }
            Err(err) => warn!(%project, error = %err, "record fetch rejected"),
            Ok(_) => {}
        }
        self.transition(|machine| machine.apply_fetch(generation, result))
            .await
    }

    fn emit(&self, event: ReviewEvent) {
        // No receivers is fine; the snapshot stays authoritative.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[path = "tests/review_tests.rs"]
mod tests;
