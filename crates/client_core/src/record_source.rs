//! Record Source capability and its HTTP transport.

use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{DocId, Label, ProjectId},
    error::ApiError,
    protocol::{
        HistoryEntry, LabelRequest, NextRecord, NextRecordResponse, ProgressResponse,
        ProjectInfoResponse, StatisticsSnapshot,
    },
};
use tracing::debug;
use url::Url;

use crate::error::RecordSourceError;

pub type SourceResult<T> = std::result::Result<T, RecordSourceError>;

/// Remote backend that serves records and stores labels.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch_next(&self, project: &ProjectId) -> SourceResult<NextRecord>;
    async fn submit_label(
        &self,
        project: &ProjectId,
        doc_id: DocId,
        label: Label,
        revision: bool,
    ) -> SourceResult<()>;
    async fn fetch_statistics(&self, project: &ProjectId) -> SourceResult<StatisticsSnapshot>;
    /// Past decisions, most recent last.
    async fn fetch_history(&self, project: &ProjectId) -> SourceResult<Vec<HistoryEntry>>;
}

pub struct HttpRecordSource {
    http: Client,
    base_url: Url,
}

impl HttpRecordSource {
    pub fn new(server_url: &str, request_timeout: Option<Duration>) -> anyhow::Result<Self> {
        let base_url = Url::parse(server_url)
            .with_context(|| format!("invalid review server url '{server_url}'"))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("review server url '{server_url}' cannot be a base url"));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("failed to build http client")?;

        Ok(Self { http, base_url })
    }

    fn endpoint(&self, project: &ProjectId, tail: &[&str]) -> SourceResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RecordSourceError::connectivity("review server url cannot be a base"))?
            .pop_if_empty()
            .extend(["api", "projects", project.as_str()])
            .extend(tail);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> SourceResult<T> {
        debug!(%url, "review backend GET");
        let response = self.http.get(url).send().await?;
        Ok(check_status(response).await?.json().await?)
    }
}

async fn check_status(response: Response) -> SourceResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = ApiError::from_body(&body)
        .map(|err| err.message)
        .unwrap_or_else(|| format!("review server returned {status}"));
    Err(RecordSourceError::server(message))
}

#[async_trait]
impl RecordSource for HttpRecordSource {
    async fn fetch_next(&self, project: &ProjectId) -> SourceResult<NextRecord> {
        let url = self.endpoint(project, &["get_document"])?;
        let response: NextRecordResponse = self.get_json(url).await?;
        response
            .into_next()
            .map_err(|err| RecordSourceError::server(err.to_string()))
    }

    async fn submit_label(
        &self,
        project: &ProjectId,
        doc_id: DocId,
        label: Label,
        revision: bool,
    ) -> SourceResult<()> {
        let doc = doc_id.to_string();
        let url = self.endpoint(project, &["record", doc.as_str()])?;
        let request = if revision {
            self.http.put(url)
        } else {
            self.http.post(url)
        };
        let response = request.json(&LabelRequest { label }).send().await?;
        check_status(response).await?;
        Ok(())
    }

    async fn fetch_statistics(&self, project: &ProjectId) -> SourceResult<StatisticsSnapshot> {
        let progress_url = self.endpoint(project, &["progress"])?;
        let info_url = self.endpoint(project, &["info"])?;
        let (progress, info) = futures::try_join!(
            self.get_json::<ProgressResponse>(progress_url),
            self.get_json::<ProjectInfoResponse>(info_url)
        )?;
        Ok(StatisticsSnapshot::from_parts(progress, info))
    }

    async fn fetch_history(&self, project: &ProjectId) -> SourceResult<Vec<HistoryEntry>> {
        let url = self.endpoint(project, &["history"])?;
        self.get_json(url).await
    }
}

#[cfg(test)]
#[path = "tests/record_source_tests.rs"]
mod tests;
