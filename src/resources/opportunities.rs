use super::{CrudResource, Id};
use crate::pipeline::{Pipeline, PipelineError};
use crate::request::OutboundRequest;
use serde::de::DeserializeOwned;
use serde_json::json;

pub struct OpportunitiesApi<'a> {
    pipeline: &'a Pipeline,
}

impl<'a> OpportunitiesApi<'a> {
    pub(crate) fn new(pipeline: &'a Pipeline) -> Self {
        Self { pipeline }
    }

    /// `PATCH /opportunities/<id>/status`
    pub async fn update_status<T: DeserializeOwned>(
        &self,
        opportunity_id: Id,
        status: &str,
    ) -> Result<T, PipelineError> {
        let request = OutboundRequest::patch(format!("/opportunities/{}/status", opportunity_id))
            .json(&json!({ "status": status }))
            .build()?;
        self.pipeline.json(request).await
    }
}

impl CrudResource for OpportunitiesApi<'_> {
    fn pipeline(&self) -> &Pipeline {
        self.pipeline
    }

    fn collection(&self) -> &'static str {
        "/opportunities"
    }
}
