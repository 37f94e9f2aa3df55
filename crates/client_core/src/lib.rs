//! Client-side review session controller for the screening workflow.

pub mod config;
pub mod error;
pub mod input;
pub mod ledger;
pub mod record_source;
pub mod review;
pub mod session;
pub mod stats;

pub use config::{load_settings, ReviewSettings};
pub use error::{RecordSourceError, SettingsError};
pub use input::{InputAdapter, InputEvent, InputGate, KeyBindings, Modifiers, ReviewCommand};
pub use ledger::{DecisionLedger, LedgerEntry};
pub use record_source::{HttpRecordSource, RecordSource, SourceResult};
pub use review::{ReviewEvent, ReviewSession, SessionOptions, SessionSnapshot};
pub use session::{SessionEffect, SessionMachine, SessionState, UndoBanner};
pub use stats::{StatisticsSynchronizer, StatisticsView};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
