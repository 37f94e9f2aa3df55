use shared::domain::{Label, Record};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub record: Record,
    pub label: Label,
}

/// Holds the single most recent decision so it can be undone or revised.
#[derive(Debug, Default)]
pub struct DecisionLedger {
    entry: Option<LedgerEntry>,
}

impl DecisionLedger {
    pub fn remember(&mut self, record: Record, label: Label) {
        self.entry = Some(LedgerEntry { record, label });
    }

    pub fn peek(&self) -> Option<&LedgerEntry> {
        self.entry.as_ref()
    }

    pub fn clear(&mut self) {
        self.entry = None;
    }
}
