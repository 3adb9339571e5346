//! Per-source view state.
//!
//! Every data source on a screen owns an isolated `{data, is_loading, error}`
//! slice. A fetch takes a generation ticket when it starts; its completion is
//! committed only if that ticket is still the newest for the source and the
//! screen is still mounted.

use crate::core::error::ApiError;
use futures::future::join_all;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Lifetime of one mounted screen.
pub struct Scope {
    mounted: AtomicBool,
    revision: watch::Sender<u64>,
}

impl Scope {
    pub fn new() -> Arc<Self> {
        let (revision, _) = watch::channel(0);
        Arc::new(Self {
            mounted: AtomicBool::new(true),
            revision,
        })
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    /// Marks the screen as gone. Completions arriving later are dropped.
    pub fn close(&self) {
        self.mounted.store(false, Ordering::SeqCst);
    }

    /// Number of state changes committed so far.
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    fn bump(&self) {
        self.revision.send_modify(|r| *r += 1);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceError {
    pub message: String,
    pub cause: ApiError,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceState<T> {
    pub data: Option<T>,
    pub is_loading: bool,
    pub error: Option<SourceError>,
}

impl<T> Default for SourceState<T> {
    fn default() -> Self {
        Self {
            data: None,
            is_loading: false,
            error: None,
        }
    }
}

/// What a panel should render for a source.
#[derive(Debug, Clone, PartialEq)]
pub enum Panel<T> {
    /// Nothing requested yet, or the source does not apply to the selection.
    Idle,
    Loading,
    Failed(SourceError),
    /// The fetch succeeded but there is nothing to show.
    Empty,
    Ready(T),
}

impl<T> Panel<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Panel<U> {
        match self {
            Panel::Idle => Panel::Idle,
            Panel::Loading => Panel::Loading,
            Panel::Failed(e) => Panel::Failed(e),
            Panel::Empty => Panel::Empty,
            Panel::Ready(data) => Panel::Ready(f(data)),
        }
    }

    pub fn empty_if(self, is_empty: impl FnOnce(&T) -> bool) -> Panel<T> {
        match self {
            Panel::Ready(data) if is_empty(&data) => Panel::Empty,
            other => other,
        }
    }
}

impl<T> SourceState<T> {
    pub fn into_panel(self) -> Panel<T> {
        if self.is_loading {
            return Panel::Loading;
        }
        if let Some(error) = self.error {
            return Panel::Failed(error);
        }
        match self.data {
            Some(data) => Panel::Ready(data),
            None => Panel::Idle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

pub struct Source<T> {
    name: &'static str,
    failure_message: Option<&'static str>,
    generation: AtomicU64,
    state: RwLock<SourceState<T>>,
    scope: Arc<Scope>,
}

impl<T: Clone> Source<T> {
    /// `failure_message` replaces the underlying error text in the view; with
    /// `None` the error is shown as is.
    pub fn new(
        name: &'static str,
        scope: &Arc<Scope>,
        failure_message: Option<&'static str>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name,
            failure_message,
            generation: AtomicU64::new(0),
            state: RwLock::new(SourceState::default()),
            scope: Arc::clone(scope),
        })
    }

    pub fn snapshot(&self) -> SourceState<T> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Starts a fetch. Returns `None` once the screen is unmounted.
    pub fn begin(&self) -> Option<Ticket> {
        if !self.scope.is_mounted() {
            return None;
        }
        let ticket = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            let ticket = Ticket(self.generation.fetch_add(1, Ordering::SeqCst) + 1);
            state.is_loading = true;
            state.error = None;
            ticket
        };
        debug!(source = self.name, generation = ticket.0, "Fetch started");
        self.scope.bump();
        Some(ticket)
    }

    /// Applies a fetch result. Returns false when the result was discarded
    /// because a newer fetch superseded it or the screen went away.
    pub fn commit(&self, ticket: Ticket, result: Result<T, ApiError>) -> bool {
        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            if !self.scope.is_mounted() || self.generation.load(Ordering::SeqCst) != ticket.0 {
                debug!(
                    source = self.name,
                    generation = ticket.0,
                    "Discarding stale result"
                );
                return false;
            }

            match result {
                Ok(data) => {
                    state.data = Some(data);
                    state.error = None;
                }
                Err(cause) => {
                    warn!(source = self.name, error = %cause, "Fetch failed");
                    // Previous data is kept; the error takes precedence in the view.
                    state.error = Some(SourceError {
                        message: self
                            .failure_message
                            .map_or_else(|| cause.to_string(), str::to_string),
                        cause,
                    });
                }
            }
            state.is_loading = false;
        }
        self.scope.bump();
        true
    }

    /// Sets data computed locally, superseding any fetch in flight.
    pub fn set_local(&self, data: T) {
        if !self.scope.is_mounted() {
            return;
        }
        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            self.generation.fetch_add(1, Ordering::SeqCst);
            *state = SourceState {
                data: Some(data),
                is_loading: false,
                error: None,
            };
        }
        self.scope.bump();
    }

    /// Clears the slice and invalidates fetches in flight.
    pub fn reset(&self) {
        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            self.generation.fetch_add(1, Ordering::SeqCst);
            *state = SourceState::default();
        }
        self.scope.bump();
    }
}

/// Fetch tasks spawned by one screen.
#[derive(Default)]
pub struct TaskSet {
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl TaskSet {
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(task);
        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    /// Waits until every task spawned so far, and any they spawned, has finished.
    pub async fn settle(&self) {
        loop {
            let pending: Vec<_> = self
                .handles
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .drain(..)
                .collect();
            if pending.is_empty() {
                break;
            }
            for result in join_all(pending).await {
                if let Err(e) = result {
                    warn!(error = %e, "Fetch task did not complete");
                }
            }
        }
    }
}

/// Runs `fetch` as an independent task and commits its result to `source`.
pub fn load<T, Fut>(tasks: &TaskSet, source: &Arc<Source<T>>, fetch: Fut)
where
    T: Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
{
    let Some(ticket) = source.begin() else {
        return;
    };
    let source = Arc::clone(source);
    tasks.spawn(async move {
        let result = fetch.await;
        source.commit(ticket, result);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure() -> ApiError {
        ApiError::HttpStatus {
            status: 500,
            resource: "test".to_string(),
        }
    }

    #[test]
    fn test_commit_success_and_failure() {
        let scope = Scope::new();
        let source = Source::<i32>::new("test", &scope, Some("Failed to load test data."));

        let ticket = source.begin().unwrap();
        assert!(source.snapshot().is_loading);
        assert!(source.commit(ticket, Ok(7)));
        assert_eq!(source.snapshot().into_panel(), Panel::Ready(7));

        let ticket = source.begin().unwrap();
        assert!(source.commit(ticket, Err(failure())));
        let state = source.snapshot();
        assert_eq!(state.data, Some(7));
        assert!(!state.is_loading);
        let error = state.error.clone().unwrap();
        assert_eq!(error.message, "Failed to load test data.");
        assert_eq!(error.cause.status(), Some(500));
        assert!(matches!(state.into_panel(), Panel::Failed(_)));
    }

    #[test]
    fn test_error_text_without_failure_message() {
        let scope = Scope::new();
        let source = Source::<i32>::new("test", &scope, None);
        let ticket = source.begin().unwrap();
        source.commit(ticket, Err(failure()));
        assert_eq!(
            source.snapshot().error.unwrap().message,
            "HTTP error: 500 for test"
        );
    }

    #[test]
    fn test_newer_ticket_wins() {
        let scope = Scope::new();
        let source = Source::<&str>::new("test", &scope, None);

        let first = source.begin().unwrap();
        let second = source.begin().unwrap();
        assert!(source.commit(second, Ok("new")));
        assert!(!source.commit(first, Ok("old")));
        assert_eq!(source.snapshot().data, Some("new"));
    }

    #[test]
    fn test_reset_invalidates_in_flight() {
        let scope = Scope::new();
        let source = Source::<i32>::new("test", &scope, None);

        let ticket = source.begin().unwrap();
        source.reset();
        assert!(!source.commit(ticket, Ok(1)));
        assert_eq!(source.snapshot(), SourceState::default());
        assert_eq!(source.snapshot().into_panel(), Panel::Idle);
    }

    #[test]
    fn test_closed_scope_discards_everything() {
        let scope = Scope::new();
        let source = Source::<i32>::new("test", &scope, None);

        let ticket = source.begin().unwrap();
        scope.close();
        let revision = scope.revision();

        assert!(!source.commit(ticket, Ok(1)));
        assert!(source.begin().is_none());
        source.set_local(2);
        assert_eq!(scope.revision(), revision);
        assert_eq!(source.snapshot().data, None);
    }

    #[test]
    fn test_panel_helpers() {
        let empty: Panel<Vec<i32>> = Panel::Ready(vec![]);
        assert_eq!(empty.empty_if(Vec::is_empty), Panel::Empty);
        assert_eq!(Panel::Ready(2).map(|v| v * 2), Panel::Ready(4));
        assert_eq!(Panel::<i32>::Loading.map(|v| v * 2), Panel::Loading);
    }

    #[tokio::test]
    async fn test_load_and_settle() {
        let scope = Scope::new();
        let tasks = TaskSet::default();
        let source = Source::<u32>::new("test", &scope, None);

        load(&tasks, &source, async { Ok(42) });
        tasks.settle().await;
        assert_eq!(source.snapshot().data, Some(42));
        assert!(scope.revision() >= 2);
    }
}
