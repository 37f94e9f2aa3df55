use std::sync::Arc;

use shared::{
    domain::ProjectId,
    protocol::{records_since_last_inclusion, HistoryEntry, StatisticsSnapshot},
};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::record_source::RecordSource;

/// Last known statistics and decision history. `error` is set when the latest refresh failed;
/// the data from the previous successful refresh is kept alongside it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatisticsView {
    pub snapshot: Option<StatisticsSnapshot>,
    pub history: Vec<HistoryEntry>,
    pub error: Option<String>,
}

pub struct StatisticsSynchronizer {
    source: Arc<dyn RecordSource>,
    project: ProjectId,
    view: RwLock<StatisticsView>,
}

impl StatisticsSynchronizer {
    pub fn new(source: Arc<dyn RecordSource>, project: ProjectId) -> Self {
        Self {
            source,
            project,
            view: RwLock::new(StatisticsView::default()),
        }
    }

    pub async fn view(&self) -> StatisticsView {
        self.view.read().await.clone()
    }

    pub async fn refresh(&self) -> StatisticsView {
        let (statistics, history) = futures::join!(
            self.source.fetch_statistics(&self.project),
            self.source.fetch_history(&self.project)
        );

        let mut failures = Vec::new();
        let mut view = self.view.write().await;

        match history {
            Ok(history) => view.history = history,
            Err(err) => {
                warn!(project = %self.project, error = %err, "failed to refresh decision history");
                failures.push(format!("history: {err}"));
            }
        }

        match statistics {
            Ok(mut snapshot) => {
                if snapshot.records_since_last_inclusion.is_none() {
                    snapshot.records_since_last_inclusion =
                        Some(records_since_last_inclusion(&view.history));
                }
                debug!(
                    project = %self.project,
                    included = snapshot.included,
                    excluded = snapshot.excluded,
                    remaining = snapshot.remaining(),
                    "statistics refreshed"
                );
                view.snapshot = Some(snapshot);
            }
            Err(err) => {
                warn!(project = %self.project, error = %err, "failed to refresh statistics");
                failures.push(format!("statistics: {err}"));
            }
        }

        view.error = if failures.is_empty() {
            None
        } else {
            Some(failures.join("; "))
        };
        view.clone()
    }
}

#[cfg(test)]
#[path = "tests/stats_tests.rs"]
mod tests;
