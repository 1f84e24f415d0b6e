//! LiveListClient — snapshot load plus push-channel reconciliation.
//!
//! One client owns one list and at most one live channel. The channel task
//! drains events in receive order, merges them through [`ListState`], and on
//! any channel loss sleeps a fixed delay and reconnects, indefinitely, until
//! [`LiveListClient::disconnect`] is called. Completion events arm a guarded
//! one-shot timer that re-fetches the snapshot wholesale.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::channel::{ChannelEvent, ChannelFactory, ListChannel};
use crate::event::{self, ListEvent};
use crate::kind::{ListKind, ScopeFilter};
use crate::snapshot::{SnapshotQuery, SnapshotSource};
use crate::state::{ListState, ListView, UpsertOutcome};
use crate::LiveListError;

/// Delay between a channel loss and the next connect attempt. Fixed — no
/// backoff and no retry cap: an admin console operator notices a
/// persistently down backend through other means.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// Delay between a completion event and the wholesale re-fetch, long enough
/// for a subscriber to display the terminal state before the list reshuffles.
pub const DEFAULT_REFRESH_DELAY: Duration = Duration::from_secs(1);

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// A live-synchronized list of one entity kind.
///
/// Collaborators are injected explicitly: a [`SnapshotSource`] for full-list
/// fetches and a [`ChannelFactory`] for the push channel. Subscribe to list
/// changes via [`subscribe`](Self::subscribe).
pub struct LiveListClient<S, F> {
    kind: Arc<ListKind>,
    source: Arc<S>,
    factory: Arc<F>,
    query: SnapshotQuery,
    reconnect_delay: Duration,
    refresh_delay: Duration,
    state: Arc<Mutex<ListState>>,
    view_rx: watch::Receiver<ListView>,
    shutdown_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl<S, F> LiveListClient<S, F>
where
    S: SnapshotSource,
    F: ChannelFactory,
{
    /// Start building a client for `kind` over the given collaborators.
    pub fn builder(kind: ListKind, source: S, factory: F) -> LiveListClientBuilder<S, F> {
        LiveListClientBuilder::new(kind, source, factory)
    }

    /// Populate the list with an initial snapshot.
    ///
    /// On failure the error is recorded in the published view, the list is
    /// left empty and the caller decides the retry policy — there is no
    /// automatic retry of the snapshot fetch. An already-open push channel
    /// is unaffected.
    pub async fn initialize(&self) -> Result<(), LiveListError> {
        info!(resource = %self.kind.name(), "loading initial snapshot");
        self.refresh().await
    }

    /// Re-fetch the snapshot now and replace the list wholesale. This is the
    /// manual recovery path after a surfaced snapshot failure.
    pub async fn refresh(&self) -> Result<(), LiveListError> {
        match self.source.fetch(&self.kind, &self.query).await {
            Ok(page) => {
                if let Ok(mut state) = self.state.lock() {
                    state.replace(page);
                }
                Ok(())
            }
            Err(e) => {
                if let Ok(mut state) = self.state.lock() {
                    state.set_error(e.to_string());
                }
                Err(e)
            }
        }
    }

    /// Open the push channel and start reconciling.
    ///
    /// Only one channel is live per client: calling `connect` while already
    /// connected tears the prior channel down first, so events are never
    /// delivered twice.
    pub fn connect(&mut self) {
        self.teardown();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        self.shutdown_tx = shutdown_tx;

        let handle = tokio::spawn(run_channel(
            Arc::clone(&self.kind),
            Arc::clone(&self.source),
            Arc::clone(&self.factory),
            self.query.clone(),
            Arc::clone(&self.state),
            self.reconnect_delay,
            self.refresh_delay,
            shutdown_rx,
        ));
        self.task = Some(handle);
    }

    /// Close the channel and cancel any pending reconnect or refresh timer.
    ///
    /// Idempotent and safe in any state — connecting, open, or already
    /// closed. After this call no further connect attempt occurs.
    pub fn disconnect(&mut self) {
        self.teardown();
        if let Ok(mut state) = self.state.lock() {
            state.set_live(false);
        }
    }

    /// Subscribe to list changes. The receiver always holds the latest
    /// published [`ListView`]; late subscribers see current state
    /// immediately.
    pub fn subscribe(&self) -> watch::Receiver<ListView> {
        self.view_rx.clone()
    }

    /// Current view of the list.
    pub fn view(&self) -> ListView {
        self.view_rx.borrow().clone()
    }

    /// Whether the push channel is currently open.
    pub fn is_live(&self) -> bool {
        self.view_rx.borrow().live
    }

    pub fn kind(&self) -> &ListKind {
        &self.kind
    }

    fn teardown(&mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl<S, F> Drop for LiveListClient<S, F> {
    fn drop(&mut self) {
        // Unmount path: stop the channel task and wake any pending refresh
        // timers so nothing touches state after teardown.
        let _ = self.shutdown_tx.send(true);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

// ---------------------------------------------------------------------------
// Channel task
// ---------------------------------------------------------------------------

#[allow(clippy::too_many_arguments)]
async fn run_channel<S, F>(
    kind: Arc<ListKind>,
    source: Arc<S>,
    factory: Arc<F>,
    query: SnapshotQuery,
    state: Arc<Mutex<ListState>>,
    reconnect_delay: Duration,
    refresh_delay: Duration,
    mut shutdown: watch::Receiver<bool>,
) where
    S: SnapshotSource,
    F: ChannelFactory,
{
    let path = kind.ws_path();
    loop {
        if *shutdown.borrow() {
            return;
        }

        match factory.connect(&path).await {
            Ok(mut channel) => {
                debug!(resource = %kind.name(), "push channel connected");
                if let Ok(mut st) = state.lock() {
                    st.set_live(true);
                }

                loop {
                    tokio::select! {
                        _ = shutdown.changed() => {
                            channel.close().await;
                            return;
                        }
                        event = channel.next_event() => match event {
                            ChannelEvent::Message(text) => handle_message(
                                &kind,
                                &source,
                                &query,
                                &state,
                                refresh_delay,
                                &shutdown,
                                &text,
                            ),
                            ChannelEvent::Closed => break,
                        }
                    }
                }

                if let Ok(mut st) = state.lock() {
                    st.set_live(false);
                }
                warn!(resource = %kind.name(), "push channel closed, will reconnect");
            }
            Err(e) => {
                warn!(resource = %kind.name(), error = %e, "push channel connect failed, will retry");
            }
        }

        tokio::select! {
            _ = shutdown.changed() => return,
            _ = tokio::time::sleep(reconnect_delay) => {}
        }
    }
}

/// Dispatch one raw channel message. Malformed messages are logged and
/// skipped; they never terminate the channel or affect other entries.
fn handle_message<S: SnapshotSource>(
    kind: &Arc<ListKind>,
    source: &Arc<S>,
    query: &SnapshotQuery,
    state: &Arc<Mutex<ListState>>,
    refresh_delay: Duration,
    shutdown: &watch::Receiver<bool>,
    raw: &str,
) {
    match event::decode(kind, raw) {
        Ok(ListEvent::Upserted(entity)) => {
            let outcome = match state.lock() {
                Ok(mut st) => st.apply_upsert(entity),
                Err(_) => return,
            };
            match outcome {
                UpsertOutcome::Unkeyed => {
                    warn!(resource = %kind.name(), "dropping upsert without identity key");
                }
                outcome => trace!(resource = %kind.name(), ?outcome, "applied upsert"),
            }
        }
        Ok(ListEvent::Deleted(entity)) => {
            if let Ok(mut st) = state.lock() {
                st.apply_delete(&entity);
            }
        }
        Ok(ListEvent::Completed(entity)) => {
            let key = kind.key_of(&entity).map(|k| k.to_string());
            debug!(resource = %kind.name(), key = key.as_deref().unwrap_or("?"),
                   "item completed, scheduling list refresh");
            tokio::spawn(refresh_after(
                Arc::clone(kind),
                Arc::clone(source),
                query.clone(),
                Arc::clone(state),
                refresh_delay,
                shutdown.clone(),
            ));
        }
        Ok(ListEvent::Ignored) => {
            trace!(resource = %kind.name(), "ignoring unrecognized event type");
        }
        Err(e) => {
            warn!(resource = %kind.name(), error = %e, "skipping malformed push message");
        }
    }
}

/// One-shot guarded refresh: wait `delay`, then re-fetch the snapshot and
/// replace the list wholesale. Exactly one fetch per completion event; the
/// timer is cancelled by client teardown so it can never fire after unmount.
async fn refresh_after<S: SnapshotSource>(
    kind: Arc<ListKind>,
    source: Arc<S>,
    query: SnapshotQuery,
    state: Arc<Mutex<ListState>>,
    delay: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    tokio::select! {
        _ = shutdown.changed() => return,
        _ = tokio::time::sleep(delay) => {}
    }
    if *shutdown.borrow() {
        return;
    }

    match source.fetch(&kind, &query).await {
        Ok(page) => {
            if let Ok(mut st) = state.lock() {
                st.replace(page);
            }
        }
        Err(e) => {
            warn!(resource = %kind.name(), error = %e, "post-completion refresh failed");
            if let Ok(mut st) = state.lock() {
                st.set_error(e.to_string());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for [`LiveListClient`].
///
/// # Example
/// ```rust,ignore
/// let mut client = LiveListClient::builder(
///         ListKind::documents(),
///         HttpSnapshotSource::new("http://localhost:8080"),
///         WsChannelFactory::new("http://localhost:8080"),
///     )
///     .scope(ScopeFilter::field_equals("project", "alpha"))
///     .page_size(25)
///     .build();
/// client.initialize().await?;
/// client.connect();
/// ```
pub struct LiveListClientBuilder<S, F> {
    kind: ListKind,
    source: S,
    factory: F,
    query: SnapshotQuery,
    scope: Option<ScopeFilter>,
    page_cap: bool,
    reconnect_delay: Duration,
    refresh_delay: Duration,
}

impl<S, F> LiveListClientBuilder<S, F>
where
    S: SnapshotSource,
    F: ChannelFactory,
{
    pub fn new(kind: ListKind, source: S, factory: F) -> Self {
        LiveListClientBuilder {
            kind,
            source,
            factory,
            query: SnapshotQuery::default(),
            scope: None,
            page_cap: true,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            refresh_delay: DEFAULT_REFRESH_DELAY,
        }
    }

    /// Restrict live appends to entities matching the filter. Also forwards
    /// the filter to the snapshot query when it targets the `project` field.
    pub fn scope(mut self, scope: ScopeFilter) -> Self {
        if scope.field() == "project" {
            self.query.project = Some(scope.value().to_string());
        }
        self.scope = Some(scope);
        self
    }

    /// Page size for snapshot fetches; doubles as the cap on live appends.
    pub fn page_size(mut self, limit: u32) -> Self {
        self.query.limit = limit;
        self
    }

    /// Full snapshot query (page, sort, search). The query's `limit` still
    /// acts as the append cap.
    pub fn query(mut self, query: SnapshotQuery) -> Self {
        self.query = query;
        self
    }

    /// Disable the page cap — for unpaginated views that render the whole
    /// list (models).
    pub fn no_page_cap(mut self) -> Self {
        self.page_cap = false;
        self
    }

    /// Override the fixed reconnect delay (default 2 s).
    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Override the completion-refresh delay (default 1 s).
    pub fn refresh_delay(mut self, delay: Duration) -> Self {
        self.refresh_delay = delay;
        self
    }

    pub fn build(self) -> LiveListClient<S, F> {
        let cap = self.page_cap.then_some(self.query.limit as usize);
        let (state, view_rx) = ListState::new(self.kind.clone(), self.scope, cap);
        let (shutdown_tx, _shutdown_rx) = watch::channel(false);
        LiveListClient {
            kind: Arc::new(self.kind),
            source: Arc::new(self.source),
            factory: Arc::new(self.factory),
            query: self.query,
            reconnect_delay: self.reconnect_delay,
            refresh_delay: self.refresh_delay,
            state: Arc::new(Mutex::new(state)),
            view_rx,
            shutdown_tx,
            task: None,
        }
    }
}
