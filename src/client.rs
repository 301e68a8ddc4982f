//! Application-facing client.
//!
//! [`ApiClient`] owns the shared credential binding, the request pipeline and
//! the streaming consumer, and hands out borrowed resource bindings.
//! Construction lives in [`builder`].

pub mod builder;
pub mod core;

pub use builder::ApiClientBuilder;
pub use core::ApiClient;
