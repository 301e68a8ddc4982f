use crate::pipeline::{Pipeline, PipelineError};
use crate::request::OutboundRequest;
use serde::de::DeserializeOwned;

pub const DEFAULT_ACTIVITY_LIMIT: u32 = 50;

/// `/analytics/*` reporting endpoints. `date_range` is passed through
/// verbatim (`7d`, `30d`, `90d`, ...).
pub struct AnalyticsApi<'a> {
    pipeline: &'a Pipeline,
}

impl<'a> AnalyticsApi<'a> {
    pub(crate) fn new(pipeline: &'a Pipeline) -> Self {
        Self { pipeline }
    }

    pub async fn dashboard<T: DeserializeOwned>(&self) -> Result<T, PipelineError> {
        let request = OutboundRequest::get("/analytics/dashboard").build()?;
        self.pipeline.json(request).await
    }

    pub async fn opportunities<T: DeserializeOwned>(&self, date_range: &str) -> Result<T, PipelineError> {
        self.ranged("/analytics/opportunities", date_range).await
    }

    pub async fn proposals<T: DeserializeOwned>(&self, date_range: &str) -> Result<T, PipelineError> {
        self.ranged("/analytics/proposals", date_range).await
    }

    pub async fn campaigns<T: DeserializeOwned>(&self, date_range: &str) -> Result<T, PipelineError> {
        self.ranged("/analytics/campaigns", date_range).await
    }

    pub async fn revenue<T: DeserializeOwned>(&self, date_range: &str) -> Result<T, PipelineError> {
        self.ranged("/analytics/revenue", date_range).await
    }

    pub async fn activity<T: DeserializeOwned>(&self, limit: u32) -> Result<T, PipelineError> {
        let request = OutboundRequest::get("/analytics/activity")
            .query("limit", limit)
            .build()?;
        self.pipeline.json(request).await
    }

    async fn ranged<T: DeserializeOwned>(&self, path: &str, date_range: &str) -> Result<T, PipelineError> {
        let request = OutboundRequest::get(path)
            .query("date_range", date_range)
            .build()?;
        self.pipeline.json(request).await
    }
}
