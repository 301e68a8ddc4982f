use super::state::{AsyncState, StateCell};
use super::Settlement;
use crate::pipeline::PipelineError;
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

type Producer<T, D> =
    Arc<dyn Fn(&D) -> BoxFuture<'static, Result<T, PipelineError>> + Send + Sync>;

/// Read operation bound to a dependency value.
///
/// The producer receives the current dependency on every invocation, which is
/// the explicit form of a closure re-capturing its inputs.
///
/// ```rust,no_run
/// # async fn demo(client: std::sync::Arc<mapmyclient_sdk::ApiClient>) {
/// use mapmyclient_sdk::hooks::Query;
/// use mapmyclient_sdk::resources::ListParams;
/// use mapmyclient_sdk::CrudResource;
///
/// let c = client.clone();
/// let (mut query, first) = Query::mount("acme".to_string(), move |search: &String| {
///     let c = c.clone();
///     let params = ListParams::new().search(search.clone());
///     async move { c.companies().list::<serde_json::Value>(&params).await }
/// });
/// first.spawn();
///
/// if let Some(next) = query.set_deps("globex".to_string()) {
///     next.spawn();
/// }
/// # }
/// ```
pub struct Query<T, D> {
    producer: Producer<T, D>,
    deps: D,
    keep_previous_data: bool,
    cell: Arc<StateCell<AsyncState<T>>>,
}

impl<T, D> Query<T, D>
where
    T: Send + Sync + 'static,
    D: PartialEq,
{
    /// Create without invoking. State starts as `loading = true`.
    pub fn new<F, Fut>(deps: D, producer: F) -> Self
    where
        F: Fn(&D) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, PipelineError>> + Send + 'static,
    {
        Self {
            producer: Arc::new(move |d: &D| -> BoxFuture<'static, Result<T, PipelineError>> {
                Box::pin(producer(d))
            }),
            deps,
            keep_previous_data: false,
            cell: Arc::new(StateCell::new(AsyncState::initial())),
        }
    }

    /// Create and start the first invocation.
    pub fn mount<F, Fut>(deps: D, producer: F) -> (Self, Invocation<T>)
    where
        F: Fn(&D) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, PipelineError>> + Send + 'static,
    {
        let query = Self::new(deps, producer);
        let first = query.refetch();
        (query, first)
    }

    /// Keep the last settled `data` visible while a new invocation is loading.
    /// Off by default: a new invocation clears `data`.
    pub fn keep_previous_data(mut self, keep: bool) -> Self {
        self.keep_previous_data = keep;
        self
    }

    /// Start a new invocation when `deps` differs from the current value.
    ///
    /// The returned invocation must be settled or spawned; dropping it
    /// unsettled ends the loading window without data.
    pub fn set_deps(&mut self, deps: D) -> Option<Invocation<T>> {
        if self.deps == deps {
            return None;
        }
        self.deps = deps;
        Some(self.refetch())
    }

    /// Re-run the producer with the current dependency.
    pub fn refetch(&self) -> Invocation<T> {
        let keep = self.keep_previous_data;
        let generation = self.cell.begin(|s| {
            s.loading = true;
            s.error = None;
            if !keep {
                s.data = None;
            }
        });
        Invocation {
            generation,
            cell: self.cell.clone(),
            future: Some((self.producer)(&self.deps)),
            settled: false,
        }
    }

    pub fn deps(&self) -> &D {
        &self.deps
    }

    pub fn state(&self) -> AsyncState<T>
    where
        T: Clone,
    {
        self.cell.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<AsyncState<T>> {
        self.cell.subscribe()
    }

    /// Tear down: outstanding invocations settle without touching state.
    pub fn unmount(&self) {
        self.cell.teardown();
    }
}

impl<T, D> Drop for Query<T, D> {
    fn drop(&mut self) {
        self.cell.teardown();
    }
}

/// One started query invocation. Does nothing until awaited or spawned.
///
/// Dropped before it settles (never polled, or cancelled mid-flight), it
/// clears `loading` if it is still the current invocation and writes nothing
/// else.
#[must_use = "an invocation does nothing until it is settled or spawned"]
pub struct Invocation<T> {
    generation: u64,
    cell: Arc<StateCell<AsyncState<T>>>,
    future: Option<BoxFuture<'static, Result<T, PipelineError>>>,
    settled: bool,
}

impl<T> Invocation<T>
where
    T: Send + Sync + 'static,
{
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Drive the producer to completion and commit its outcome if still current.
    pub async fn settle(mut self) -> Settlement {
        let generation = self.generation;
        let Some(future) = self.future.take() else {
            self.settled = true;
            return Settlement::Detached;
        };

        let outcome = future.await;
        if let Err(e) = &outcome {
            warn!(generation, error_class = e.class(), error = %e, "query failed");
        }

        let settlement = self.cell.commit(generation, |s| {
            s.loading = false;
            match outcome {
                Ok(v) => {
                    s.data = Some(v);
                    s.error = None;
                }
                Err(e) => {
                    s.data = None;
                    s.error = Some(e);
                }
            }
        });
        self.settled = true;

        if settlement != Settlement::Committed {
            debug!(
                generation,
                latest = self.cell.latest_generation(),
                ?settlement,
                "query outcome discarded"
            );
        }
        settlement
    }

    pub fn spawn(self) -> JoinHandle<Settlement> {
        tokio::spawn(self.settle())
    }
}

impl<T> Drop for Invocation<T> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let settlement = self.cell.commit(self.generation, |s| s.loading = false);
        debug!(
            generation = self.generation,
            ?settlement,
            "query invocation dropped before settling"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn initial_state_is_loading() {
        let query = Query::new((), |_: &()| async { Ok::<_, PipelineError>(1u32) });
        assert_eq!(query.state(), AsyncState::initial());
    }

    #[tokio::test]
    async fn settles_to_data() {
        let (query, first) = Query::mount(7u32, |d: &u32| {
            let d = *d;
            async move { Ok(d * 2) }
        });
        assert!(query.state().loading);
        assert_eq!(first.settle().await, Settlement::Committed);
        assert_eq!(
            query.state(),
            AsyncState {
                data: Some(14),
                loading: false,
                error: None
            }
        );
    }

    #[tokio::test]
    async fn settles_to_error_and_clears_data() {
        let (query, first) = Query::mount((), |_: &()| async {
            Err::<u32, _>(PipelineError::Forbidden)
        });
        first.settle().await;
        let state = query.state();
        assert_eq!(state.data, None);
        assert_eq!(state.error, Some(PipelineError::Forbidden));
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn unchanged_deps_do_not_reinvoke() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_in = calls.clone();
        let (mut query, first) = Query::mount(1u32, move |_: &u32| {
            calls_in.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        });
        first.settle().await;

        assert!(query.set_deps(1).is_none());
        let next = query.set_deps(2).expect("changed deps re-invoke");
        next.settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(*query.deps(), 2);
    }

    #[tokio::test]
    async fn last_started_wins_when_older_settles_later() {
        let gates: Arc<Mutex<Vec<oneshot::Receiver<Result<String, PipelineError>>>>> =
            Arc::new(Mutex::new(Vec::new()));
        let (tx_a, rx_a) = oneshot::channel();
        let (tx_b, rx_b) = oneshot::channel();
        gates.lock().unwrap().extend([rx_b, rx_a]);

        let gates_in = gates.clone();
        let (mut query, a) = Query::mount("a".to_string(), move |_: &String| {
            let rx = gates_in.lock().unwrap().pop().expect("gate");
            async move { rx.await.expect("gate sender") }
        });
        let b = query.set_deps("b".to_string()).unwrap();

        tx_b.send(Ok("from b".into())).unwrap();
        assert_eq!(b.settle().await, Settlement::Committed);
        tx_a.send(Ok("from a".into())).unwrap();
        assert_eq!(a.settle().await, Settlement::Stale);

        assert_eq!(query.state().data.as_deref(), Some("from b"));
        assert!(!query.state().loading);
    }

    #[tokio::test]
    async fn keep_previous_data_during_refetch() {
        let n = Arc::new(AtomicU32::new(0));
        let n_in = n.clone();
        let query = Query::new((), move |_: &()| {
            let v = n_in.fetch_add(1, Ordering::SeqCst);
            async move { Ok(v) }
        })
        .keep_previous_data(true);

        query.refetch().settle().await;
        let second = query.refetch();
        let during = query.state();
        assert!(during.loading);
        assert_eq!(during.data, Some(0));
        second.settle().await;
        assert_eq!(query.state().data, Some(1));
    }

    #[tokio::test]
    async fn dropped_query_detaches_invocation() {
        let (query, first) = Query::mount((), |_: &()| async { Ok(5u8) });
        let rx = query.subscribe();
        drop(query);
        assert_eq!(first.settle().await, Settlement::Detached);
        assert!(rx.borrow().loading);
    }

    #[tokio::test]
    async fn dropped_invocation_does_not_leave_loading_stuck() {
        let (mut query, first) = Query::mount(1u32, |d: &u32| {
            let d = *d;
            async move { Ok(d) }
        });
        first.settle().await;

        drop(query.set_deps(2));
        let state = query.state();
        assert!(!state.loading);
        assert_eq!(state.data, None);
        assert_eq!(state.error, None);
    }

    #[tokio::test]
    async fn dropping_a_superseded_invocation_leaves_state_alone() {
        let (query, first) = Query::mount((), |_: &()| async { Ok(1u8) });
        let second = query.refetch();
        drop(first);
        assert!(query.state().loading);
        assert_eq!(second.settle().await, Settlement::Committed);
        assert_eq!(query.state().data, Some(1));
    }
}
