use super::Settlement;
use crate::pipeline::PipelineError;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::watch;

/// Observable state of one query.
///
/// After settlement exactly one of `data` / `error` is set and `loading` is
/// false; while an invocation is outstanding `loading` is true.
#[derive(Debug, Clone, PartialEq)]
pub struct AsyncState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<PipelineError>,
}

impl<T> AsyncState<T> {
    pub(crate) fn initial() -> Self {
        Self {
            data: None,
            loading: true,
            error: None,
        }
    }

    pub fn is_settled(&self) -> bool {
        !self.loading
    }
}

/// Watch channel plus the generation/teardown guards shared by an owner and
/// its in-flight invocations.
pub(crate) struct StateCell<S> {
    state: watch::Sender<S>,
    generation: AtomicU64,
    mounted: AtomicBool,
}

impl<S> StateCell<S> {
    pub(crate) fn new(initial: S) -> Self {
        let (state, _) = watch::channel(initial);
        Self {
            state,
            generation: AtomicU64::new(0),
            mounted: AtomicBool::new(true),
        }
    }

    /// Issue a new generation and apply the invocation-start transition.
    pub(crate) fn begin(&self, reset: impl FnOnce(&mut S)) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if self.is_mounted() {
            self.state.send_modify(reset);
        }
        generation
    }

    /// Apply the settlement transition if `generation` is still current.
    ///
    /// The check runs under the channel's write lock, so a `begin` racing with
    /// this commit either lands before it (commit is stale) or after it.
    pub(crate) fn commit(&self, generation: u64, settle: impl FnOnce(&mut S)) -> Settlement {
        let mut settlement = Settlement::Detached;
        self.state.send_if_modified(|s| {
            if !self.is_mounted() {
                return false;
            }
            if self.generation.load(Ordering::SeqCst) != generation {
                settlement = Settlement::Stale;
                return false;
            }
            settle(s);
            settlement = Settlement::Committed;
            true
        });
        settlement
    }

    pub(crate) fn latest_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub(crate) fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    pub(crate) fn teardown(&self) {
        self.mounted.store(false, Ordering::SeqCst);
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<S> {
        self.state.subscribe()
    }

    pub(crate) fn snapshot(&self) -> S
    where
        S: Clone,
    {
        self.state.borrow().clone()
    }
}
