use super::{Id, ListParams};
use crate::pipeline::{Pipeline, PipelineError};
use crate::request::OutboundRequest;
use serde::de::DeserializeOwned;
use serde::Serialize;

#[derive(Serialize)]
struct Batch<'b, B> {
    posts: &'b [B],
}

/// LinkedIn posts ingested for opportunity analysis.
pub struct PostsApi<'a> {
    pipeline: &'a Pipeline,
}

impl<'a> PostsApi<'a> {
    pub(crate) fn new(pipeline: &'a Pipeline) -> Self {
        Self { pipeline }
    }

    pub async fn list<T: DeserializeOwned>(&self, params: &ListParams) -> Result<T, PipelineError> {
        let request = OutboundRequest::get("/linkedin/posts")
            .query_pairs(params.pairs().iter().cloned())
            .build()?;
        self.pipeline.json(request).await
    }

    pub async fn get<T: DeserializeOwned>(&self, post_id: Id) -> Result<T, PipelineError> {
        let request = OutboundRequest::get(format!("/linkedin/posts/{}", post_id)).build()?;
        self.pipeline.json(request).await
    }

    pub async fn ingest<B, T>(&self, post: &B) -> Result<T, PipelineError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = OutboundRequest::post("/linkedin/ingest").json(post).build()?;
        self.pipeline.json(request).await
    }

    /// Body is wrapped as `{"posts": [...]}`.
    pub async fn batch_ingest<B, T>(&self, posts: &[B]) -> Result<T, PipelineError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let request = OutboundRequest::post("/linkedin/ingest/batch")
            .json(&Batch { posts })
            .build()?;
        self.pipeline.json(request).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, post_id: Id) -> Result<T, PipelineError> {
        let request = OutboundRequest::delete(format!("/linkedin/posts/{}", post_id)).build()?;
        self.pipeline.json(request).await
    }

    pub async fn statistics<T: DeserializeOwned>(&self) -> Result<T, PipelineError> {
        let request = OutboundRequest::get("/linkedin/posts/statistics").build()?;
        self.pipeline.json(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RequestError;
    use std::collections::HashMap;

    #[test]
    fn batch_body_wraps_posts() {
        let request = OutboundRequest::post("/linkedin/ingest/batch")
            .json(&Batch {
                posts: &[serde_json::json!({"url": "https://linkedin.test/p/1"})],
            })
            .build()
            .unwrap();
        assert_eq!(
            request.body(),
            Some(&serde_json::json!({"posts": [{"url": "https://linkedin.test/p/1"}]}))
        );
    }

    #[test]
    fn unserializable_batch_is_a_request_error() {
        let mut post = HashMap::new();
        post.insert((1, 2), 3);
        let err = OutboundRequest::post("/linkedin/ingest/batch")
            .json(&Batch { posts: &[post] })
            .build()
            .unwrap_err();
        assert!(matches!(err, RequestError::Body(_)));
    }
}
