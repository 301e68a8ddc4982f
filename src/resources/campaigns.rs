use super::{CrudResource, Id};
use crate::pipeline::{Pipeline, PipelineError};
use crate::request::OutboundRequest;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Campaigns plus their notes and follow-ups.
pub struct CampaignsApi<'a> {
    pipeline: &'a Pipeline,
}

impl<'a> CampaignsApi<'a> {
    pub(crate) fn new(pipeline: &'a Pipeline) -> Self {
        Self { pipeline }
    }

    pub async fn archive<T: DeserializeOwned>(&self, campaign_id: Id) -> Result<T, PipelineError> {
        let request = OutboundRequest::post(format!("/campaigns/{}/archive", campaign_id)).build()?;
        self.pipeline.json(request).await
    }

    pub async fn create_note<B, T>(&self, note: &B) -> Result<T, PipelineError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = OutboundRequest::post("/campaigns/notes").json(note).build()?;
        self.pipeline.json(request).await
    }

    pub async fn notes<T: DeserializeOwned>(&self, campaign_id: Id) -> Result<T, PipelineError> {
        let request = OutboundRequest::get(format!("/campaigns/{}/notes", campaign_id)).build()?;
        self.pipeline.json(request).await
    }

    pub async fn note<T: DeserializeOwned>(&self, note_id: Id) -> Result<T, PipelineError> {
        let request = OutboundRequest::get(format!("/campaigns/notes/{}", note_id)).build()?;
        self.pipeline.json(request).await
    }

    pub async fn update_note<B, T>(&self, note_id: Id, note: &B) -> Result<T, PipelineError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = OutboundRequest::put(format!("/campaigns/notes/{}", note_id))
            .json(note)
            .build()?;
        self.pipeline.json(request).await
    }

    pub async fn delete_note<T: DeserializeOwned>(&self, note_id: Id) -> Result<T, PipelineError> {
        let request = OutboundRequest::delete(format!("/campaigns/notes/{}", note_id)).build()?;
        self.pipeline.json(request).await
    }

    pub async fn overdue_follow_ups<T: DeserializeOwned>(&self) -> Result<T, PipelineError> {
        let request = OutboundRequest::get("/campaigns/follow-ups/overdue").build()?;
        self.pipeline.json(request).await
    }

    pub async fn notes_by_opportunity<T: DeserializeOwned>(
        &self,
        opportunity_id: Id,
    ) -> Result<T, PipelineError> {
        let request =
            OutboundRequest::get(format!("/campaigns/notes/by-opportunity/{}", opportunity_id))
                .build()?;
        self.pipeline.json(request).await
    }
}

impl CrudResource for CampaignsApi<'_> {
    fn pipeline(&self) -> &Pipeline {
        self.pipeline
    }

    fn collection(&self) -> &'static str {
        "/campaigns"
    }
}
