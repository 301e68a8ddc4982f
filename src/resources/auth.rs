use crate::pipeline::{Pipeline, PipelineError};
use crate::request::OutboundRequest;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Profile and permission lookups for the signed-in user.
pub struct AuthApi<'a> {
    pipeline: &'a Pipeline,
}

impl<'a> AuthApi<'a> {
    pub(crate) fn new(pipeline: &'a Pipeline) -> Self {
        Self { pipeline }
    }

    pub async fn profile<T: DeserializeOwned>(&self) -> Result<T, PipelineError> {
        let request = OutboundRequest::get("/auth/profile").build()?;
        self.pipeline.json(request).await
    }

    pub async fn update_profile<B, T>(&self, profile: &B) -> Result<T, PipelineError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = OutboundRequest::put("/auth/profile").json(profile).build()?;
        self.pipeline.json(request).await
    }

    pub async fn permissions<T: DeserializeOwned>(&self) -> Result<T, PipelineError> {
        let request = OutboundRequest::get("/auth/permissions").build()?;
        self.pipeline.json(request).await
    }

    /// A 401 here ends the session like any other call.
    pub async fn verify<T: DeserializeOwned>(&self) -> Result<T, PipelineError> {
        let request = OutboundRequest::get("/auth/verify").build()?;
        self.pipeline.json(request).await
    }
}
