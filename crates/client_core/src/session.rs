//! Review session state machine.
//!
//! [`SessionMachine`] is synchronous and performs no I/O. Every command returns the
//! [`SessionEffect`]s the driver must carry out, in order. Fetch results are fed back
//! through [`SessionMachine::apply_fetch`] tagged with the generation they were issued
//! under, so a result that outlives a `reset()` cannot leak into the next session.

use shared::{
    domain::{DocId, Label, ProjectId, Record},
    protocol::NextRecord,
};
use tracing::{debug, info};

use crate::{
    error::RecordSourceError,
    ledger::{DecisionLedger, LedgerEntry},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Loading,
    Ready {
        record: Record,
        selection: Option<Label>,
    },
    Error {
        message: String,
        retryable: bool,
    },
    Exhausted,
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Ready { .. } => "ready",
            Self::Error { .. } => "error",
            Self::Exhausted => "exhausted",
        }
    }

    pub fn record(&self) -> Option<&Record> {
        match self {
            Self::Ready { record, .. } => Some(record),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoBanner {
    /// Unique per banner within a machine, so a timer can only close the banner it was started for.
    pub id: u64,
    pub doc_id: DocId,
    pub label: Label,
    pub revision: bool,
    pub message: String,
}

impl UndoBanner {
    fn new(id: u64, doc_id: DocId, label: Label, revision: bool) -> Self {
        let message = if revision {
            format!("Converted to {label}")
        } else {
            format!("Marked as {label}")
        };
        Self {
            id,
            doc_id,
            label,
            revision,
            message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEffect {
    SubmitLabel {
        doc_id: DocId,
        label: Label,
        revision: bool,
    },
    ShowUndoBanner(UndoBanner),
    FetchNext { generation: u64 },
    RefreshStatistics,
}

pub struct SessionMachine {
    project: ProjectId,
    undo_banner_enabled: bool,
    state: SessionState,
    ledger: DecisionLedger,
    undo_banner: Option<UndoBanner>,
    banner_seq: u64,
    generation: u64,
}

impl SessionMachine {
    pub fn new(project: ProjectId, undo_banner_enabled: bool) -> Self {
        Self {
            project,
            undo_banner_enabled,
            state: SessionState::Idle,
            ledger: DecisionLedger::default(),
            undo_banner: None,
            banner_seq: 0,
            generation: 0,
        }
    }

    pub fn project(&self) -> &ProjectId {
        &self.project
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn ledger(&self) -> Option<&LedgerEntry> {
        self.ledger.peek()
    }

    pub fn undo_banner(&self) -> Option<&UndoBanner> {
        self.undo_banner.as_ref()
    }

    pub fn can_decide(&self) -> bool {
        matches!(self.state, SessionState::Ready { .. })
    }

    /// Undo is permitted while the banner is up and belongs to the ledger's record, with a
    /// record on screen or a failed fetch. Never while a fetch is in flight.
    pub fn undo_available(&self) -> bool {
        if !matches!(
            self.state,
            SessionState::Ready { .. } | SessionState::Error { .. }
        ) {
            return false;
        }
        match (&self.undo_banner, self.ledger.peek()) {
            (Some(banner), Some(entry)) => banner.doc_id == entry.record.doc_id,
            _ => false,
        }
    }

    pub fn start(&mut self) -> Vec<SessionEffect> {
        if self.state != SessionState::Idle {
            debug!(project = %self.project, state = self.state.name(), "start ignored");
            return Vec::new();
        }
        info!(project = %self.project, "review session started");
        self.begin_loading()
    }

    pub fn decide(&mut self, label: Label) -> Vec<SessionEffect> {
        let SessionState::Ready { record, .. } = &self.state else {
            debug!(
                project = %self.project,
                state = self.state.name(),
                %label,
                "decision dropped; no record awaiting a decision"
            );
            return Vec::new();
        };
        let current = record.clone();

        let prior = self.ledger.peek();
        let same_record = prior.is_some_and(|entry| entry.record.doc_id == current.doc_id);
        let unchanged = same_record && prior.is_some_and(|entry| entry.label == label);

        let mut effects = Vec::with_capacity(4);
        if unchanged {
            debug!(
                project = %self.project,
                doc_id = %current.doc_id,
                %label,
                "label unchanged; skipping submission"
            );
        } else {
            effects.push(SessionEffect::SubmitLabel {
                doc_id: current.doc_id,
                label,
                revision: same_record,
            });
        }

        let doc_id = current.doc_id;
        self.ledger.remember(current, label);

        if self.undo_banner_enabled {
            self.banner_seq += 1;
            let banner = UndoBanner::new(
                self.banner_seq,
                doc_id,
                label,
                same_record && !unchanged,
            );
            self.undo_banner = Some(banner.clone());
            effects.push(SessionEffect::ShowUndoBanner(banner));
        }

        effects.extend(self.begin_loading());
        effects
    }

    /// Restores the ledger's record with its label selected. Returns whether anything changed.
    pub fn undo(&mut self) -> bool {
        if !self.undo_available() {
            debug!(project = %self.project, state = self.state.name(), "undo dropped");
            return false;
        }
        let Some(entry) = self.ledger.peek() else {
            return false;
        };

        info!(
            project = %self.project,
            doc_id = %entry.record.doc_id,
            label = %entry.label,
            "decision undone"
        );
        self.state = SessionState::Ready {
            record: entry.record.clone(),
            selection: Some(entry.label),
        };
        self.undo_banner = None;
        true
    }

    /// Closes the undo banner if it is still banner `banner_id`. The ledger is untouched.
    pub fn dismiss_undo_banner(&mut self, banner_id: u64) -> bool {
        if self
            .undo_banner
            .as_ref()
            .is_some_and(|banner| banner.id == banner_id)
        {
            self.undo_banner = None;
            return true;
        }
        false
    }

    pub fn retry(&mut self) -> Vec<SessionEffect> {
        if !matches!(self.state, SessionState::Error { .. }) {
            debug!(project = %self.project, state = self.state.name(), "retry ignored");
            return Vec::new();
        }
        info!(project = %self.project, "retrying record fetch");
        self.begin_loading()
    }

    pub fn apply_fetch(
        &mut self,
        generation: u64,
        result: Result<NextRecord, RecordSourceError>,
    ) -> Vec<SessionEffect> {
        if generation != self.generation {
            debug!(
                project = %self.project,
                generation,
                current = self.generation,
                "dropping fetch result from a previous session"
            );
            return Vec::new();
        }

        match result {
            Ok(NextRecord::PoolEmpty) => {
                info!(project = %self.project, "labeling pool exhausted");
                self.state = SessionState::Exhausted;
                self.undo_banner = None;
                vec![SessionEffect::RefreshStatistics]
            }
            _ if self.state != SessionState::Loading => {
                debug!(
                    project = %self.project,
                    state = self.state.name(),
                    "dropping stale fetch result"
                );
                Vec::new()
            }
            Ok(NextRecord::Record(record)) => {
                debug!(project = %self.project, doc_id = %record.doc_id, "record loaded");
                self.state = SessionState::Ready {
                    record,
                    selection: None,
                };
                vec![SessionEffect::RefreshStatistics]
            }
            Err(err) => {
                self.state = SessionState::Error {
                    message: err.to_string(),
                    retryable: err.is_retryable(),
                };
                Vec::new()
            }
        }
    }

    pub fn reset(&mut self) {
        info!(project = %self.project, "review session reset");
        self.state = SessionState::Idle;
        self.ledger.clear();
        self.undo_banner = None;
        self.generation += 1;
    }

    fn begin_loading(&mut self) -> Vec<SessionEffect> {
        self.state = SessionState::Loading;
        vec![SessionEffect::FetchNext {
            generation: self.generation,
        }]
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
