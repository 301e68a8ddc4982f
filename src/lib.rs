//! # mapmyclient-sdk
//!
//! Client-side request pipeline for the MapMyClient API.
//!
//! ## Overview
//!
//! Every backend call goes through one [`Pipeline`]: a credential is attached
//! before sending when an identity provider is installed, and every failure is
//! classified into a closed [`PipelineError`] set after receiving. A 401 ends
//! the session through the identity provider. On top of the pipeline sit thin
//! resource bindings, async state primitives for a view layer, and a
//! streaming consumer for incremental AI analysis.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mapmyclient_sdk::auth::StaticTokenProvider;
//! use mapmyclient_sdk::resources::ListParams;
//! use mapmyclient_sdk::{ApiClientBuilder, CrudResource};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> mapmyclient_sdk::Result<()> {
//!     let client = ApiClientBuilder::new()
//!         .identity_provider(Arc::new(StaticTokenProvider::new("access-token")))
//!         .build()?;
//!
//!     let companies: serde_json::Value = client
//!         .companies()
//!         .list(&ListParams::new().search("acme"))
//!         .await?;
//!     println!("{companies}");
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`auth`] | Identity provider trait and the late-bound credential binding |
//! | [`client`] | [`ApiClient`] facade and its builder |
//! | [`config`] | Base URL, identity and timeout configuration |
//! | [`hooks`] | `{data, loading, error}` query and mutation primitives |
//! | [`pipeline`] | Pre-send / transport / post-receive stages and error classes |
//! | [`request`] | Outbound request description and builder |
//! | [`resources`] | One binding per backend resource |
//! | [`streaming`] | Streaming analysis consumer and chunk/record readers |
//! | [`transport`] | reqwest-backed HTTP execution |

pub mod auth;
pub mod client;
pub mod config;
pub mod hooks;
pub mod pipeline;
pub mod request;
pub mod resources;
pub mod streaming;
pub mod transport;

// Re-export main types for convenience
pub use auth::{CredentialBinding, IdentityProvider, TokenRequest};
pub use client::{ApiClient, ApiClientBuilder};
pub use config::ClientConfig;
pub use hooks::{AsyncState, Mutation, Query};
pub use pipeline::{ApiResponse, Pipeline, PipelineError};
pub use request::{HttpMethod, OutboundRequest, ResponseMode};
pub use resources::CrudResource;
pub use streaming::{StreamEvent, StreamHandle, StreamTransportError};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
