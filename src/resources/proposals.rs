use super::{CrudResource, Id};
use crate::pipeline::{Pipeline, PipelineError};
use crate::request::{OutboundRequest, ResponseMode};
use bytes::Bytes;
use serde::de::DeserializeOwned;

/// Export formats accepted by `GET /proposals/<id>/export`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Markdown,
    Pdf,
    Docx,
    Html,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Markdown => "markdown",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Docx => "docx",
            ExportFormat::Html => "html",
        }
    }
}

pub struct ProposalsApi<'a> {
    pipeline: &'a Pipeline,
}

impl<'a> ProposalsApi<'a> {
    pub(crate) fn new(pipeline: &'a Pipeline) -> Self {
        Self { pipeline }
    }

    /// Ask the backend to draft a proposal. Parameters travel in the query string.
    pub async fn generate_ai<T: DeserializeOwned>(
        &self,
        opportunity_id: Id,
        additional_context: Option<&str>,
    ) -> Result<T, PipelineError> {
        let request = OutboundRequest::post("/proposals/generate-ai")
            .query("opportunity_id", opportunity_id)
            .query_opt("additional_context", additional_context)
            .build()?;
        self.pipeline.json(request).await
    }

    /// Download a rendered proposal as an opaque file payload.
    pub async fn export(&self, proposal_id: Id, format: ExportFormat) -> Result<Bytes, PipelineError> {
        let request = OutboundRequest::get(format!("/proposals/{}/export", proposal_id))
            .query("format", format.as_str())
            .response_mode(ResponseMode::Blob)
            .build()?;
        self.pipeline.blob(request).await
    }

    pub async fn duplicate<T: DeserializeOwned>(
        &self,
        proposal_id: Id,
        new_opportunity_id: Id,
    ) -> Result<T, PipelineError> {
        let request = OutboundRequest::post(format!("/proposals/{}/duplicate", proposal_id))
            .query("new_opportunity_id", new_opportunity_id)
            .build()?;
        self.pipeline.json(request).await
    }

    pub async fn by_opportunity<T: DeserializeOwned>(&self, opportunity_id: Id) -> Result<T, PipelineError> {
        let request =
            OutboundRequest::get(format!("/proposals/by-opportunity/{}", opportunity_id)).build()?;
        self.pipeline.json(request).await
    }
}

impl CrudResource for ProposalsApi<'_> {
    fn pipeline(&self) -> &Pipeline {
        self.pipeline
    }

    fn collection(&self) -> &'static str {
        "/proposals"
    }
}
