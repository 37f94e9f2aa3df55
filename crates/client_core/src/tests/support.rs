use std::{collections::VecDeque, sync::Arc};

use async_trait::async_trait;
use shared::{
    domain::{DocId, Label, ProjectId, Record},
    protocol::{HistoryEntry, NextRecord, StatisticsSnapshot},
};
use tokio::sync::{Mutex, Notify};

use crate::{
    error::RecordSourceError,
    record_source::{RecordSource, SourceResult},
};

pub fn record(doc_id: i64) -> Record {
    Record {
        doc_id: DocId(doc_id),
        title: format!("Title {doc_id}"),
        abstract_text: format!("Abstract {doc_id}"),
        debug_label: None,
    }
}

pub fn project() -> ProjectId {
    ProjectId::new("demo-project")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    FetchNext,
    Submit {
        doc_id: DocId,
        label: Label,
        revision: bool,
    },
    Statistics,
    History,
}

/// In-memory backend that replays queued fetch results and records every call.
pub struct ScriptedSource {
    fetches: Mutex<VecDeque<SourceResult<NextRecord>>>,
    submit_error: Mutex<Option<RecordSourceError>>,
    statistics: Mutex<SourceResult<StatisticsSnapshot>>,
    history: Mutex<SourceResult<Vec<HistoryEntry>>>,
    fetch_gate: Mutex<Option<Arc<Notify>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self {
            fetches: Mutex::new(VecDeque::new()),
            submit_error: Mutex::new(None),
            statistics: Mutex::new(Ok(StatisticsSnapshot {
                project_name: "Demo".into(),
                total_records: 10,
                ..StatisticsSnapshot::default()
            })),
            history: Mutex::new(Ok(Vec::new())),
            fetch_gate: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_records(ids: impl IntoIterator<Item = i64>) -> Self {
        let source = Self::new();
        source
            .fetches
            .try_lock()
            .expect("fresh source")
            .extend(ids.into_iter().map(|id| Ok(NextRecord::Record(record(id)))));
        source
    }

    pub async fn push_fetch(&self, result: SourceResult<NextRecord>) {
        self.fetches.lock().await.push_back(result);
    }

    pub async fn fail_submissions(&self, err: RecordSourceError) {
        *self.submit_error.lock().await = Some(err);
    }

    pub async fn set_statistics(&self, result: SourceResult<StatisticsSnapshot>) {
        *self.statistics.lock().await = result;
    }

    pub async fn set_history(&self, result: SourceResult<Vec<HistoryEntry>>) {
        *self.history.lock().await = result;
    }

    /// Makes subsequent fetches wait until the returned handle is notified.
    pub async fn hold_fetches(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.fetch_gate.lock().await = Some(Arc::clone(&gate));
        gate
    }

    pub async fn calls(&self) -> Vec<Call> {
        self.calls.lock().await.clone()
    }

    pub async fn submissions(&self) -> Vec<Call> {
        self.calls()
            .await
            .into_iter()
            .filter(|call| matches!(call, Call::Submit { .. }))
            .collect()
    }

    pub async fn fetch_count(&self) -> usize {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|call| **call == Call::FetchNext)
            .count()
    }

    pub async fn clear_calls(&self) {
        self.calls.lock().await.clear();
    }
}

#[async_trait]
impl RecordSource for ScriptedSource {
    async fn fetch_next(&self, _project: &ProjectId) -> SourceResult<NextRecord> {
        self.calls.lock().await.push(Call::FetchNext);
        let gate = self.fetch_gate.lock().await.clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.fetches
            .lock()
            .await
            .pop_front()
            .unwrap_or(Ok(NextRecord::PoolEmpty))
    }

    async fn submit_label(
        &self,
        _project: &ProjectId,
        doc_id: DocId,
        label: Label,
        revision: bool,
    ) -> SourceResult<()> {
        self.calls.lock().await.push(Call::Submit {
            doc_id,
            label,
            revision,
        });
        match self.submit_error.lock().await.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn fetch_statistics(&self, _project: &ProjectId) -> SourceResult<StatisticsSnapshot> {
        self.calls.lock().await.push(Call::Statistics);
        self.statistics.lock().await.clone()
    }

    async fn fetch_history(&self, _project: &ProjectId) -> SourceResult<Vec<HistoryEntry>> {
        self.calls.lock().await.push(Call::History);
        self.history.lock().await.clone()
    }
}
