use super::{search, CrudResource, Id};
use crate::pipeline::{Pipeline, PipelineError};
use crate::request::OutboundRequest;
use serde::de::DeserializeOwned;

pub struct ContactsApi<'a> {
    pipeline: &'a Pipeline,
}

impl<'a> ContactsApi<'a> {
    pub(crate) fn new(pipeline: &'a Pipeline) -> Self {
        Self { pipeline }
    }

    pub async fn search<T: DeserializeOwned>(&self, query: &str) -> Result<T, PipelineError> {
        search(self.pipeline, self.collection(), query).await
    }

    pub async fn by_company<T: DeserializeOwned>(&self, company_id: Id) -> Result<T, PipelineError> {
        let request = OutboundRequest::get(format!("/contacts/by-company/{}", company_id)).build()?;
        self.pipeline.json(request).await
    }
}

impl CrudResource for ContactsApi<'_> {
    fn pipeline(&self) -> &Pipeline {
        self.pipeline
    }

    fn collection(&self) -> &'static str {
        "/contacts"
    }
}
