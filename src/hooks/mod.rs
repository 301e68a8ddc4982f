//! Async operation primitives exposing `{data, loading, error}`.
//!
//! - [`Query`]: read operation driven by a dependency value; re-invoked when
//!   the dependency changes (by `PartialEq`) or on [`Query::refetch`].
//! - [`Mutation`]: write operation invoked on demand; the result goes back to
//!   the caller, a failure is both recorded in state and returned.
//!
//! Every invocation is stamped with a generation number. On settlement the
//! outcome is committed only if its generation is still the latest one issued
//! and the owner has not been torn down, which gives "last start wins" without
//! cancelling the in-flight future.
//!
//! State changes are published on a `tokio::sync::watch` channel so a view
//! layer can re-render on [`Query::subscribe`].

mod mutation;
mod query;
mod state;

pub use mutation::{Mutation, MutationState};
pub use query::{Invocation, Query};
pub use state::AsyncState;

/// What happened to an invocation's outcome when it settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// Written to state.
    Committed,
    /// A newer invocation had started; the outcome was discarded.
    Stale,
    /// The owner was torn down; nothing was written.
    Detached,
}
