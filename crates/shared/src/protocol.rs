use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{DocId, Label, Record};

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("next-record response carried neither a record nor pool_empty")]
    EmptyNextRecord,
}

/// Body of `GET /api/projects/{project}/get_document`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NextRecordResponse {
    #[serde(default)]
    pub pool_empty: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<Record>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextRecord {
    Record(Record),
    PoolEmpty,
}

impl NextRecordResponse {
    pub fn into_next(self) -> Result<NextRecord, ProtocolError> {
        if self.pool_empty {
            return Ok(NextRecord::PoolEmpty);
        }
        self.record
            .map(NextRecord::Record)
            .ok_or(ProtocolError::EmptyNextRecord)
    }
}

/// Body of the label create (`POST`) and update (`PUT`) requests.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LabelRequest {
    pub label: Label,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressResponse {
    pub included: u64,
    pub excluded: u64,
    pub total_records: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub records_since_last_inclusion: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectInfoResponse {
    pub name: String,
    #[serde(default)]
    pub authors: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub doc_id: DocId,
    #[serde(default)]
    pub title: String,
    pub label: Label,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labeled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsSnapshot {
    pub project_name: String,
    pub authors: Option<String>,
    pub included: u64,
    pub excluded: u64,
    pub total_records: u64,
    pub records_since_last_inclusion: Option<u64>,
}

impl StatisticsSnapshot {
    pub fn from_parts(progress: ProgressResponse, info: ProjectInfoResponse) -> Self {
        Self {
            project_name: info.name,
            authors: info.authors,
            included: progress.included,
            excluded: progress.excluded,
            total_records: progress.total_records,
            records_since_last_inclusion: progress.records_since_last_inclusion,
        }
    }

    pub fn labeled(&self) -> u64 {
        self.included + self.excluded
    }

    pub fn remaining(&self) -> u64 {
        self.total_records.saturating_sub(self.labeled())
    }
}

/// Counts the irrelevant decisions after the most recent inclusion. `history` is oldest-first.
pub fn records_since_last_inclusion(history: &[HistoryEntry]) -> u64 {
    history
        .iter()
        .rev()
        .take_while(|entry| entry.label == Label::Irrelevant)
        .count() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(doc_id: i64, label: Label) -> HistoryEntry {
        HistoryEntry {
            doc_id: DocId(doc_id),
            title: format!("doc {doc_id}"),
            label,
            labeled_at: None,
        }
    }

    #[test]
    fn pool_empty_wins_over_record() {
        let body = r#"{"pool_empty":true,"record":{"doc_id":3,"title":"t","abstract":"a"}}"#;
        let response: NextRecordResponse = serde_json::from_str(body).expect("decode");
        assert_eq!(response.into_next().expect("next"), NextRecord::PoolEmpty);
    }

    #[test]
    fn decodes_record_with_debug_label() {
        let body = r#"{"record":{"doc_id":7,"title":"Title","abstract":"Body","debug_label":1}}"#;
        let response: NextRecordResponse = serde_json::from_str(body).expect("decode");
        let NextRecord::Record(record) = response.into_next().expect("next") else {
            panic!("expected record");
        };
        assert_eq!(record.doc_id, DocId(7));
        assert_eq!(record.abstract_text, "Body");
        assert_eq!(record.debug_label, Some(Label::Relevant));
        assert!(record.is_exploration());
    }

    #[test]
    fn empty_next_record_is_rejected() {
        let response: NextRecordResponse = serde_json::from_str("{}").expect("decode");
        assert!(matches!(
            response.into_next(),
            Err(ProtocolError::EmptyNextRecord)
        ));
    }

    #[test]
    fn label_encodes_as_integer() {
        let json = serde_json::to_string(&LabelRequest {
            label: Label::Irrelevant,
        })
        .expect("encode");
        assert_eq!(json, r#"{"label":0}"#);
        assert!(serde_json::from_str::<Label>("2").is_err());
    }

    #[test]
    fn counts_trailing_irrelevant_decisions() {
        let history = vec![
            entry(1, Label::Irrelevant),
            entry(2, Label::Relevant),
            entry(3, Label::Irrelevant),
            entry(4, Label::Irrelevant),
        ];
        assert_eq!(records_since_last_inclusion(&history), 2);
        assert_eq!(records_since_last_inclusion(&[]), 0);
    }

    #[test]
    fn remaining_saturates() {
        let snapshot = StatisticsSnapshot {
            included: 4,
            excluded: 8,
            total_records: 10,
            ..StatisticsSnapshot::default()
        };
        assert_eq!(snapshot.labeled(), 12);
        assert_eq!(snapshot.remaining(), 0);
    }
}
