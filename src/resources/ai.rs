use super::Id;
use crate::pipeline::{Pipeline, PipelineError};
use crate::request::OutboundRequest;
use crate::streaming::{StreamHandle, StreamTransportError, StreamingConsumer};
use serde::de::DeserializeOwned;
use serde_json::json;

/// AI actions. The buffered calls go through the pipeline; the streaming
/// analysis goes through the [`StreamingConsumer`].
pub struct AiApi<'a> {
    pipeline: &'a Pipeline,
    streaming: &'a StreamingConsumer,
}

impl<'a> AiApi<'a> {
    pub(crate) fn new(pipeline: &'a Pipeline, streaming: &'a StreamingConsumer) -> Self {
        Self {
            pipeline,
            streaming,
        }
    }

    pub async fn analyze_extract<T: DeserializeOwned>(&self, post_id: Id) -> Result<T, PipelineError> {
        let request = OutboundRequest::post("/ai/analyze-extract")
            .json(&json!({ "post_id": post_id }))
            .build()?;
        self.pipeline.json(request).await
    }

    pub async fn analyze_opportunity<T: DeserializeOwned>(
        &self,
        post_id: Id,
        enable_cache: bool,
    ) -> Result<T, PipelineError> {
        let request = OutboundRequest::post("/ai/analyze-opportunity")
            .json(&json!({ "post_id": post_id, "enable_cache": enable_cache }))
            .build()?;
        self.pipeline.json(request).await
    }

    pub async fn analyze_opportunity_stream(
        &self,
        post_id: Id,
        enable_cache: bool,
    ) -> Result<StreamHandle, StreamTransportError> {
        self.streaming.analyze_stream(post_id, enable_cache).await
    }

    pub async fn generate_proposal<T: DeserializeOwned>(
        &self,
        opportunity_id: Id,
        template_id: Option<Id>,
        additional_context: Option<&str>,
    ) -> Result<T, PipelineError> {
        let request = OutboundRequest::post("/ai/generate-proposal")
            .json(&json!({
                "opportunity_id": opportunity_id,
                "template_id": template_id,
                "additional_context": additional_context,
            }))
            .build()?;
        self.pipeline.json(request).await
    }
}
