//! Resource client set.
//!
//! One thin binding per backend resource. Each operation is a mapping from a
//! logical call to `{method, path, query, body, mode}` executed through the
//! [`Pipeline`]; none of them add behavior of their own. Response schemas are
//! owned by the backend, so every read is generic over the caller's
//! `DeserializeOwned` type (`serde_json::Value` works everywhere).

mod ai;
mod analytics;
mod auth;
mod campaigns;
mod companies;
mod contacts;
mod dashboard;
mod opportunities;
mod posts;
mod proposals;

pub use ai::AiApi;
pub use analytics::AnalyticsApi;
pub use auth::AuthApi;
pub use campaigns::CampaignsApi;
pub use companies::CompaniesApi;
pub use contacts::ContactsApi;
pub use dashboard::DashboardApi;
pub use opportunities::OpportunitiesApi;
pub use posts::PostsApi;
pub use proposals::{ExportFormat, ProposalsApi};

use crate::pipeline::{Pipeline, PipelineError};
use crate::request::OutboundRequest;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Identifier type used by every resource path.
pub type Id = i64;

/// Default window for analytics endpoints.
pub const DEFAULT_DATE_RANGE: &str = "30d";

/// Query parameters for list endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    pairs: Vec<(String, String)>,
}

impl ListParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(self, term: impl Into<String>) -> Self {
        self.param("search", term.into())
    }

    pub fn status(self, status: impl Into<String>) -> Self {
        self.param("status", status.into())
    }

    pub fn skip(self, skip: u32) -> Self {
        self.param("skip", skip.to_string())
    }

    pub fn limit(self, limit: u32) -> Self {
        self.param("limit", limit.to_string())
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.pairs.push((key.into(), value.into()));
        self
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// List/get/create/update/delete/statistics over one collection path.
///
/// Implementors only name their pipeline and collection; the operations are
/// provided.
#[async_trait]
pub trait CrudResource: Sync {
    fn pipeline(&self) -> &Pipeline;

    /// Collection path, e.g. `/companies`.
    fn collection(&self) -> &'static str;

    async fn list<T>(&self, params: &ListParams) -> Result<T, PipelineError>
    where
        T: DeserializeOwned + Send,
    {
        let request = OutboundRequest::get(self.collection())
            .query_pairs(params.pairs().iter().cloned())
            .build()?;
        self.pipeline().json(request).await
    }

    async fn get<T>(&self, id: Id) -> Result<T, PipelineError>
    where
        T: DeserializeOwned + Send,
    {
        let request = OutboundRequest::get(format!("{}/{}", self.collection(), id)).build()?;
        self.pipeline().json(request).await
    }

    async fn create<B, T>(&self, body: &B) -> Result<T, PipelineError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned + Send,
    {
        let request = OutboundRequest::post(self.collection()).json(body).build()?;
        self.pipeline().json(request).await
    }

    async fn update<B, T>(&self, id: Id, body: &B) -> Result<T, PipelineError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned + Send,
    {
        let request = OutboundRequest::put(format!("{}/{}", self.collection(), id))
            .json(body)
            .build()?;
        self.pipeline().json(request).await
    }

    async fn delete<T>(&self, id: Id) -> Result<T, PipelineError>
    where
        T: DeserializeOwned + Send,
    {
        let request = OutboundRequest::delete(format!("{}/{}", self.collection(), id)).build()?;
        self.pipeline().json(request).await
    }

    async fn statistics<T>(&self) -> Result<T, PipelineError>
    where
        T: DeserializeOwned + Send,
    {
        let request =
            OutboundRequest::get(format!("{}/statistics", self.collection())).build()?;
        self.pipeline().json(request).await
    }
}

/// `GET <collection>/search?q=<query>`
pub(crate) async fn search<T: DeserializeOwned>(
    pipeline: &Pipeline,
    collection: &str,
    query: &str,
) -> Result<T, PipelineError> {
    let request = OutboundRequest::get(format!("{}/search", collection))
        .query("q", query)
        .build()?;
    pipeline.json(request).await
}
