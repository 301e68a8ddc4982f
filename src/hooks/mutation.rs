use super::state::StateCell;
use super::Settlement;
use crate::pipeline::PipelineError;
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Observable state of a mutation. The success value is not stored; callers
/// read it from the return value of [`Mutation::mutate`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MutationState {
    pub loading: bool,
    pub error: Option<PipelineError>,
}

type Producer<A, T> = Arc<dyn Fn(A) -> BoxFuture<'static, Result<T, PipelineError>> + Send + Sync>;

/// Write operation invoked on demand, never automatically.
///
/// A failure is recorded in `error` *and* returned to the caller; both
/// channels carry the same value. With overlapping calls only the most
/// recently started one writes state, but every caller gets its own result.
pub struct Mutation<A, T> {
    producer: Producer<A, T>,
    cell: Arc<StateCell<MutationState>>,
}

impl<A, T> Mutation<A, T>
where
    A: Send + 'static,
    T: Send + 'static,
{
    pub fn new<F, Fut>(producer: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, PipelineError>> + Send + 'static,
    {
        Self {
            producer: Arc::new(move |args: A| -> BoxFuture<'static, Result<T, PipelineError>> {
                Box::pin(producer(args))
            }),
            cell: Arc::new(StateCell::new(MutationState::default())),
        }
    }

    /// Run the producer. `loading` flips to true immediately, before the
    /// returned future is first polled.
    pub fn mutate(&self, args: A) -> impl Future<Output = Result<T, PipelineError>> + Send + 'static {
        let generation = self.cell.begin(|s| {
            s.loading = true;
            s.error = None;
        });
        let future = (self.producer)(args);
        let cell = self.cell.clone();

        async move {
            let outcome = future.await;
            let error = outcome.as_ref().err().cloned();
            if let Some(e) = &error {
                warn!(generation, error_class = e.class(), error = %e, "mutation failed");
            }

            let settlement = cell.commit(generation, |s| {
                s.loading = false;
                s.error = error;
            });
            if settlement != Settlement::Committed {
                debug!(generation, ?settlement, "mutation state left untouched");
            }

            outcome
        }
    }

    pub fn state(&self) -> MutationState {
        self.cell.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<MutationState> {
        self.cell.subscribe()
    }

    pub fn unmount(&self) {
        self.cell.teardown();
    }
}

impl<A, T> Drop for Mutation<A, T> {
    fn drop(&mut self) {
        self.cell.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn idle_until_invoked() {
        let m = Mutation::new(|x: u32| async move { Ok::<_, PipelineError>(x) });
        assert_eq!(m.state(), MutationState::default());
    }

    #[tokio::test]
    async fn success_returns_value_and_clears_state() {
        let m = Mutation::new(|x: u32| async move { Ok(x + 1) });
        let fut = m.mutate(41);
        assert!(m.state().loading);
        assert_eq!(fut.await, Ok(42));
        assert_eq!(
            m.state(),
            MutationState {
                loading: false,
                error: None
            }
        );
    }

    #[tokio::test]
    async fn failure_is_recorded_and_returned() {
        let details = json!({"detail": "name required"});
        let expected = PipelineError::ValidationFailed(details.clone());
        let m = Mutation::new(move |_: ()| {
            let d = details.clone();
            async move { Err::<(), _>(PipelineError::ValidationFailed(d)) }
        });

        let err = m.mutate(()).await.unwrap_err();
        assert_eq!(err, expected);
        assert_eq!(m.state().error, Some(expected));
        assert!(!m.state().loading);
    }

    #[tokio::test]
    async fn new_invocation_resets_error() {
        let m = Mutation::new(|fail: bool| async move {
            if fail {
                Err(PipelineError::ServerFault { status: 500 })
            } else {
                Ok(())
            }
        });
        assert!(m.mutate(true).await.is_err());
        let next = m.mutate(false);
        assert_eq!(m.state().error, None);
        next.await.unwrap();
        assert_eq!(m.state().error, None);
    }

    #[tokio::test]
    async fn unmounted_mutation_still_returns_result() {
        let m = Mutation::new(|_: ()| async { Err::<(), _>(PipelineError::NotFound) });
        let fut = m.mutate(());
        m.unmount();
        assert_eq!(fut.await, Err(PipelineError::NotFound));
        assert!(m.state().loading);
        assert_eq!(m.state().error, None);
    }
}
