use crate::auth::CredentialBinding;
use crate::config::ClientConfig;
use crate::pipeline::{ApiResponse, Pipeline, PipelineError};
use crate::request::OutboundRequest;
use crate::resources::{
    AiApi, AnalyticsApi, AuthApi, CampaignsApi, CompaniesApi, ContactsApi, DashboardApi,
    OpportunitiesApi, PostsApi, ProposalsApi,
};
use crate::streaming::StreamingConsumer;
use crate::transport::HttpTransport;
use std::sync::Arc;

/// Process-wide client for the MapMyClient backend.
///
/// Cheap to share behind an `Arc`; resource accessors borrow from it.
pub struct ApiClient {
    pub(crate) config: ClientConfig,
    pub(crate) credentials: Arc<CredentialBinding>,
    pub(crate) transport: Arc<HttpTransport>,
    pub(crate) pipeline: Arc<Pipeline>,
    pub(crate) streaming: StreamingConsumer,
}

impl ApiClient {
    pub fn builder() -> crate::client::ApiClientBuilder {
        crate::client::ApiClientBuilder::new()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The binding the host installs its identity provider into.
    pub fn credentials(&self) -> &Arc<CredentialBinding> {
        &self.credentials
    }

    pub fn transport(&self) -> &Arc<HttpTransport> {
        &self.transport
    }

    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }

    pub fn streaming(&self) -> &StreamingConsumer {
        &self.streaming
    }

    /// Send an arbitrary request through the pipeline.
    pub async fn send(&self, request: OutboundRequest) -> Result<ApiResponse, PipelineError> {
        self.pipeline.send(request).await
    }

    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi::new(&self.pipeline)
    }

    pub fn companies(&self) -> CompaniesApi<'_> {
        CompaniesApi::new(&self.pipeline)
    }

    pub fn contacts(&self) -> ContactsApi<'_> {
        ContactsApi::new(&self.pipeline)
    }

    pub fn opportunities(&self) -> OpportunitiesApi<'_> {
        OpportunitiesApi::new(&self.pipeline)
    }

    pub fn proposals(&self) -> ProposalsApi<'_> {
        ProposalsApi::new(&self.pipeline)
    }

    pub fn campaigns(&self) -> CampaignsApi<'_> {
        CampaignsApi::new(&self.pipeline)
    }

    pub fn posts(&self) -> PostsApi<'_> {
        PostsApi::new(&self.pipeline)
    }

    pub fn analytics(&self) -> AnalyticsApi<'_> {
        AnalyticsApi::new(&self.pipeline)
    }

    pub fn dashboard(&self) -> DashboardApi<'_> {
        DashboardApi::new(&self.pipeline)
    }

    pub fn ai(&self) -> AiApi<'_> {
        AiApi::new(&self.pipeline, &self.streaming)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.transport.base_url())
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}
