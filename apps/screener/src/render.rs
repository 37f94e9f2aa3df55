//! Plain-text presentation of session snapshots.

use client_core::{KeyBindings, SessionState, StatisticsView};
use shared::protocol::HistoryEntry;

pub fn state(state: &SessionState) -> Option<String> {
    match state {
        SessionState::Idle | SessionState::Loading => None,
        SessionState::Ready { record, selection } => {
            let mut out = format!("\n#{}  {}\n", record.doc_id, record.title.trim());
            if let Some(label) = record.debug_label {
                out.push_str(&format!("[exploration dataset: labeled {label}]\n"));
            }
            out.push_str(record.abstract_text.trim());
            out.push('\n');
            if let Some(label) = selection {
                out.push_str(&format!("(previously marked {label})\n"));
            }
            Some(out)
        }
        SessionState::Error { message, retryable } => Some(if *retryable {
            format!("Error: {message}\nType `retry` to try again.")
        } else {
            format!("Error: {message}\nThe review server cannot be reached; restart the application.")
        }),
        SessionState::Exhausted => Some(
            "All records have been screened. Type `reset` to start over or `quit` to leave."
                .to_string(),
        ),
    }
}

pub fn statistics(view: &StatisticsView) -> String {
    let mut out = match &view.snapshot {
        Some(snapshot) => {
            let mut out = snapshot.project_name.clone();
            if let Some(authors) = &snapshot.authors {
                out.push_str(&format!(" ({authors})"));
            }
            out.push_str(&format!(
                "\nincluded {}  excluded {}  remaining {} of {}",
                snapshot.included,
                snapshot.excluded,
                snapshot.remaining(),
                snapshot.total_records
            ));
            if let Some(since) = snapshot.records_since_last_inclusion {
                out.push_str(&format!("  since last inclusion {since}"));
            }
            out
        }
        None => "No statistics available yet.".to_string(),
    };
    if let Some(error) = &view.error {
        out.push_str(&format!("\n(statistics may be stale: {error})"));
    }
    out
}

pub fn history(entries: &[HistoryEntry]) -> String {
    if entries.is_empty() {
        return "No decisions yet.".to_string();
    }
    entries
        .iter()
        .map(|entry| {
            let when = entry
                .labeled_at
                .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default();
            format!("{when:>16}  {:<10}  #{} {}", entry.label, entry.doc_id, entry.title)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn help(bindings: Option<KeyBindings>) -> String {
    let mut out = String::from(
        "Commands: relevant | irrelevant | undo | retry | reset | stats | history | quit",
    );
    if let Some(keys) = bindings {
        out.push_str(&format!(
            "\nKeys: {} relevant, {} irrelevant, {} undo",
            keys.relevant, keys.irrelevant, keys.undo
        ));
    }
    out
}
