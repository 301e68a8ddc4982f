use super::{search, CrudResource};
use crate::pipeline::{Pipeline, PipelineError};
use serde::de::DeserializeOwned;

pub struct CompaniesApi<'a> {
    pipeline: &'a Pipeline,
}

impl<'a> CompaniesApi<'a> {
    pub(crate) fn new(pipeline: &'a Pipeline) -> Self {
        Self { pipeline }
    }

    pub async fn search<T: DeserializeOwned>(&self, query: &str) -> Result<T, PipelineError> {
        search(self.pipeline, self.collection(), query).await
    }
}

impl CrudResource for CompaniesApi<'_> {
    fn pipeline(&self) -> &Pipeline {
        self.pipeline
    }

    fn collection(&self) -> &'static str {
        "/companies"
    }
}
