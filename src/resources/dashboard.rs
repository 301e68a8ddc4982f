use crate::pipeline::{Pipeline, PipelineError};
use crate::request::OutboundRequest;
use serde::de::DeserializeOwned;

pub const DEFAULT_RECENT_ACTIVITY_LIMIT: u32 = 10;

pub struct DashboardApi<'a> {
    pipeline: &'a Pipeline,
}

impl<'a> DashboardApi<'a> {
    pub(crate) fn new(pipeline: &'a Pipeline) -> Self {
        Self { pipeline }
    }

    pub async fn statistics<T: DeserializeOwned>(&self, date_range: &str) -> Result<T, PipelineError> {
        self.ranged("/dashboard/statistics", date_range).await
    }

    pub async fn opportunities_analytics<T: DeserializeOwned>(
        &self,
        date_range: &str,
    ) -> Result<T, PipelineError> {
        self.ranged("/dashboard/analytics/opportunities", date_range).await
    }

    pub async fn proposals_analytics<T: DeserializeOwned>(
        &self,
        date_range: &str,
    ) -> Result<T, PipelineError> {
        self.ranged("/dashboard/analytics/proposals", date_range).await
    }

    pub async fn campaigns_analytics<T: DeserializeOwned>(
        &self,
        date_range: &str,
    ) -> Result<T, PipelineError> {
        self.ranged("/dashboard/analytics/campaigns", date_range).await
    }

    pub async fn recent_activity<T: DeserializeOwned>(&self, limit: u32) -> Result<T, PipelineError> {
        let request = OutboundRequest::get("/dashboard/recent-activity")
            .query("limit", limit)
            .build()?;
        self.pipeline.json(request).await
    }

    pub async fn overview<T: DeserializeOwned>(&self) -> Result<T, PipelineError> {
        let request = OutboundRequest::get("/dashboard/overview").build()?;
        self.pipeline.json(request).await
    }

    async fn ranged<T: DeserializeOwned>(&self, path: &str, date_range: &str) -> Result<T, PipelineError> {
        let request = OutboundRequest::get(path)
            .query("date_range", date_range)
            .build()?;
        self.pipeline.json(request).await
    }
}
