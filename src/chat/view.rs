// Chat view - one browser page's cache, input and latest response
// Author: kelexine (https://github.com/kelexine)

use super::models::{
    PhaseKind, ViewPhase, ViewSnapshot, INIT_ERROR_MESSAGE, NOT_READY_MESSAGE, QUERY_ERROR_MESSAGE,
};
use crate::cache::{CacheHandle, CacheInitializer, DocumentReference};
use crate::error::{ChatError, Result};
use crate::query::QueryForwarder;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

struct ViewState {
    phase: ViewPhase,
    input: String,
    response: String,
    sending: bool,
    /// Ticket of the most recent send; older results are stale.
    latest_ticket: u64,
    /// Set once the cache-create request is about to go out. From then on
    /// the init task must run to completion so the entry can be released.
    creating_cache: bool,
    mounted_at: DateTime<Utc>,
}

/// Clears `sending` when a dispatched query is dropped before it finishes,
/// e.g. when the client disconnects mid-request.
struct InFlight {
    state: Arc<Mutex<ViewState>>,
    ticket: u64,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        if state.latest_ticket == self.ticket {
            state.sending = false;
        }
    }
}

/// A query that passed the send gate.
struct PendingQuery {
    cache: CacheHandle,
    text: String,
    ticket: u64,
}

impl ViewState {
    fn new() -> Self {
        Self {
            phase: ViewPhase::Uninitialized,
            input: String::new(),
            response: String::new(),
            sending: false,
            latest_ticket: 0,
            creating_cache: false,
            mounted_at: Utc::now(),
        }
    }

    fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            phase: self.phase.kind(),
            input: self.input.clone(),
            response: self.response.clone(),
            sending: self.sending,
            cache: self.phase.cache().cloned(),
        }
    }

    fn ready_cache(&self) -> Result<&CacheHandle> {
        self.phase.cache().ok_or(ChatError::UninitializedCache)
    }

    /// `Uninitialized -> Initializing`; false if initialization already ran.
    fn begin_initialization(&mut self) -> bool {
        if self.phase != ViewPhase::Uninitialized {
            return false;
        }
        self.phase = ViewPhase::Initializing;
        self.mounted_at = Utc::now();
        true
    }

    /// Apply the initialization outcome. Returns a handle that nobody will
    /// use anymore because the view closed meanwhile.
    fn finish_initialization(&mut self, outcome: Result<CacheHandle>) -> Option<CacheHandle> {
        if self.phase == ViewPhase::Closed {
            debug!("View closed during initialization");
            return outcome.ok();
        }

        match outcome {
            Ok(cache) => {
                info!("Chat view ready with cache {}", cache.name);
                self.phase = ViewPhase::Ready(cache);
            }
            Err(e) => {
                error!("Cache initialization failed: {}", e);
                self.phase = ViewPhase::Failed;
                self.response = INIT_ERROR_MESSAGE.to_string();
            }
        }
        None
    }

    /// Gate between file processing and cache creation. False if the view
    /// closed while the document was being processed.
    fn begin_cache_creation(&mut self) -> bool {
        if self.phase == ViewPhase::Closed {
            debug!("View closed before cache creation");
            return false;
        }
        self.creating_cache = true;
        true
    }

    fn begin_send(&mut self) -> Option<PendingQuery> {
        if self.input.trim().is_empty() {
            return None;
        }
        if matches!(self.phase, ViewPhase::Failed | ViewPhase::Closed) {
            return None;
        }

        let cache = match self.ready_cache() {
            Ok(cache) => cache.clone(),
            Err(e) => {
                debug!("Send rejected: {}", e);
                self.response = NOT_READY_MESSAGE.to_string();
                return None;
            }
        };

        self.latest_ticket += 1;
        self.sending = true;
        Some(PendingQuery {
            cache,
            text: self.input.clone(),
            ticket: self.latest_ticket,
        })
    }

    fn finish_send(&mut self, ticket: u64, outcome: Result<String>) {
        if self.phase == ViewPhase::Closed {
            debug!("Discarding response #{} for closed view", ticket);
            return;
        }
        if ticket != self.latest_ticket {
            debug!(
                "Discarding stale response #{} (latest is #{})",
                ticket, self.latest_ticket
            );
            return;
        }

        self.sending = false;
        match outcome {
            Ok(answer) => {
                self.response = answer;
                self.input.clear();
            }
            Err(e) => {
                error!("Error fetching response: {}", e);
                self.response = QUERY_ERROR_MESSAGE.to_string();
            }
        }
    }
}

/// State machine behind one chat page.
///
/// `Uninitialized -> Initializing -> Ready | Failed`, and `Closed` after
/// teardown. Queries are only issued from `Ready`, with the cache handle
/// taken from that phase. Overlapping sends resolve latest-wins: every send
/// takes a ticket and only the newest ticket's result is applied.
pub struct ChatView {
    state: Arc<Mutex<ViewState>>,
    initializer: Arc<CacheInitializer>,
    forwarder: Arc<QueryForwarder>,
    document: DocumentReference,
    init_task: Mutex<Option<JoinHandle<()>>>,
}

impl ChatView {
    pub fn new(
        initializer: Arc<CacheInitializer>,
        forwarder: Arc<QueryForwarder>,
        document: DocumentReference,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(ViewState::new())),
            initializer,
            forwarder,
            document,
            init_task: Mutex::new(None),
        }
    }

    /// Start cache initialization in the background. Only the first call
    /// has an effect.
    pub fn mount(&self) {
        if !self.state.lock().begin_initialization() {
            return;
        }

        let state = self.state.clone();
        let initializer = self.initializer.clone();
        let document = self.document.clone();
        let task = tokio::spawn(async move {
            run_initialization(state, initializer, document).await;
        });
        *self.init_task.lock() = Some(task);
    }

    /// Run cache initialization to completion on the current task.
    pub async fn initialize(&self) -> ViewSnapshot {
        if self.state.lock().begin_initialization() {
            run_initialization(self.state.clone(), self.initializer.clone(), self.document.clone())
                .await;
        }
        self.snapshot()
    }

    pub fn set_input(&self, text: impl Into<String>) {
        self.state.lock().input = text.into();
    }

    /// Send the current input. Empty input is ignored; before the cache is
    /// ready the response shows a wait message and nothing is sent.
    pub async fn send(&self) -> ViewSnapshot {
        let pending = self.state.lock().begin_send();
        self.dispatch(pending).await
    }

    /// Replace the input with `text` and send it.
    pub async fn submit(&self, text: impl Into<String>) -> ViewSnapshot {
        let pending = {
            let mut state = self.state.lock();
            state.input = text.into();
            state.begin_send()
        };
        self.dispatch(pending).await
    }

    async fn dispatch(&self, pending: Option<PendingQuery>) -> ViewSnapshot {
        let Some(pending) = pending else {
            return self.snapshot();
        };

        debug!("Sending query #{} against {}", pending.ticket, pending.cache.name);
        let _in_flight = InFlight {
            state: self.state.clone(),
            ticket: pending.ticket,
        };
        let outcome = self.forwarder.query(&pending.cache, &pending.text).await;

        let mut state = self.state.lock();
        state.finish_send(pending.ticket, outcome);
        state.snapshot()
    }

    /// Tear the view down: stop initialization, drop in-flight results and
    /// delete the remote cache entry if one exists.
    pub async fn unmount(&self) {
        let (cache, creating_cache) = {
            let mut state = self.state.lock();
            state.sending = false;
            let cache = match std::mem::replace(&mut state.phase, ViewPhase::Closed) {
                ViewPhase::Ready(cache) => Some(cache),
                _ => None,
            };
            (cache, state.creating_cache)
        };

        // A task past the creation gate releases its own cache once it lands.
        let task = self.init_task.lock().take();
        if let Some(task) = task {
            if !creating_cache {
                task.abort();
            }
        }

        if let Some(cache) = cache {
            release_cache(&self.initializer, &cache).await;
        }
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        self.state.lock().snapshot()
    }

    pub fn phase(&self) -> PhaseKind {
        self.state.lock().phase.kind()
    }

    pub fn cache(&self) -> Option<CacheHandle> {
        self.state.lock().phase.cache().cloned()
    }

    /// Whether the session can be dropped: its cache has expired, or it
    /// failed or closed longer than one cache lifetime ago.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        let state = self.state.lock();
        match &state.phase {
            ViewPhase::Ready(cache) => cache.is_expired(now),
            ViewPhase::Failed | ViewPhase::Closed => {
                CacheHandle::expiry_from_ttl(state.mounted_at, self.document.ttl_seconds) <= now
            }
            ViewPhase::Uninitialized | ViewPhase::Initializing => false,
        }
    }
}

async fn run_initialization(
    state: Arc<Mutex<ViewState>>,
    initializer: Arc<CacheInitializer>,
    document: DocumentReference,
) {
    let file = match initializer.prepare(&document).await {
        Ok(file) => file,
        Err(e) => {
            state.lock().finish_initialization(Err(e));
            return;
        }
    };
    if !state.lock().begin_cache_creation() {
        return;
    }

    let outcome = initializer.create_cache(&document, &file).await;
    let orphan = state.lock().finish_initialization(outcome);
    if let Some(cache) = orphan {
        release_cache(&initializer, &cache).await;
    }
}

async fn release_cache(initializer: &CacheInitializer, cache: &CacheHandle) {
    match initializer.release(cache).await {
        Ok(()) => debug!("Released cache {}", cache.name),
        Err(e) => warn!("Failed to release cache {}: {}", cache.name, e),
    }
}
