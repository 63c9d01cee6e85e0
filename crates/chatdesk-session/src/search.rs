//! Debounced conversation-history search.
//!
//! Every `set_query` and every explicit refresh bumps a generation counter.
//! A debounce fire or a response only takes effect if its generation is still
//! the latest one, so stale timers do nothing and stale responses are dropped.

use chatdesk_types::ChatSummary;
use std::cell::RefCell;
use std::time::Duration;

use crate::backend::{BackendError, ChatBackend, Sleeper};
use crate::gate::{Operation, RequestGate};
use crate::token_store::TokenStore;

/// Quiet period after the last keystroke before a search is issued
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Handle returned by [`HistorySearch::set_query`]; identifies one generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchTicket(u64);

/// What became of a settle or refresh request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// A newer query or refresh replaced this one; nothing was applied
    Superseded,
    /// Another request held the gate; the fetch runs once it is released
    Deferred,
    /// Results for `query` are now the visible results
    Applied { query: String, count: usize },
    /// No credential, so no request was made
    NotSignedIn,
    /// The backend rejected the credential; the caller must end the session
    AuthRejected,
    Failed(BackendError),
}

#[derive(Debug, Default)]
struct SearchState {
    query: String,
    generation: u64,
    applied_query: Option<String>,
    results: Vec<ChatSummary>,
    rerun: bool,
}

pub struct HistorySearch {
    state: RefCell<SearchState>,
    debounce: Duration,
}

impl HistorySearch {
    pub fn new(debounce: Duration) -> Self {
        Self {
            state: RefCell::new(SearchState::default()),
            debounce,
        }
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Text most recently typed
    pub fn query(&self) -> String {
        self.state.borrow().query.clone()
    }

    /// Query whose results are currently visible
    pub fn applied_query(&self) -> Option<String> {
        self.state.borrow().applied_query.clone()
    }

    pub fn results(&self) -> Vec<ChatSummary> {
        self.state.borrow().results.clone()
    }

    /// Record new query text and restart the debounce window
    pub fn set_query(&self, text: &str) -> SearchTicket {
        let mut state = self.state.borrow_mut();
        state.query = text.to_string();
        state.generation += 1;
        SearchTicket(state.generation)
    }

    pub fn is_current(&self, ticket: SearchTicket) -> bool {
        self.state.borrow().generation == ticket.0
    }

    /// Forget query and results; any pending fire or response becomes stale
    pub fn reset(&self) {
        let mut state = self.state.borrow_mut();
        let generation = state.generation + 1;
        *state = SearchState {
            generation,
            ..SearchState::default()
        };
    }

    /// Whether a fetch was deferred and is still owed. Clears the flag.
    pub fn take_rerun(&self) -> bool {
        std::mem::take(&mut self.state.borrow_mut().rerun)
    }

    /// Wait out the debounce window for `ticket`, then fetch if it is still
    /// the latest query.
    pub async fn settle(
        &self,
        ticket: SearchTicket,
        sleeper: &dyn Sleeper,
        backend: &dyn ChatBackend,
        tokens: &TokenStore,
        gate: &RequestGate,
    ) -> SearchOutcome {
        sleeper.sleep(self.debounce).await;
        if !self.is_current(ticket) {
            log::debug!("Search debounce fire superseded");
            return SearchOutcome::Superseded;
        }
        self.fetch(backend, tokens, gate).await
    }

    /// Fetch results for the current query immediately, superseding anything
    /// still pending.
    pub async fn refresh(
        &self,
        backend: &dyn ChatBackend,
        tokens: &TokenStore,
        gate: &RequestGate,
    ) -> SearchOutcome {
        self.state.borrow_mut().generation += 1;
        self.fetch(backend, tokens, gate).await
    }

    async fn fetch(
        &self,
        backend: &dyn ChatBackend,
        tokens: &TokenStore,
        gate: &RequestGate,
    ) -> SearchOutcome {
        loop {
            let Some(credential) = tokens.get() else {
                return SearchOutcome::NotSignedIn;
            };
            let Some(guard) = gate.try_acquire(Operation::Search) else {
                self.state.borrow_mut().rerun = true;
                return SearchOutcome::Deferred;
            };

            let (generation, query) = {
                let state = self.state.borrow();
                (state.generation, state.query.clone())
            };
            let filter = query.trim();
            let filter = (!filter.is_empty()).then_some(filter);
            log::debug!("Fetching chat history (filter: {:?})", filter);

            let result = backend.list_chats(&credential, filter).await;
            drop(guard);

            let outcome = self.apply(generation, query, result);
            if outcome == SearchOutcome::AuthRejected {
                return outcome;
            }
            if self.take_rerun() {
                log::debug!("Running deferred history fetch");
                continue;
            }
            return outcome;
        }
    }

    fn apply(
        &self,
        generation: u64,
        query: String,
        result: Result<Vec<ChatSummary>, BackendError>,
    ) -> SearchOutcome {
        match result {
            Err(e) if e.is_auth_rejection() => SearchOutcome::AuthRejected,
            _ if self.state.borrow().generation != generation => {
                log::debug!("Discarding history results for superseded query {:?}", query);
                SearchOutcome::Superseded
            }
            Ok(results) => {
                let mut state = self.state.borrow_mut();
                let count = results.len();
                state.results = results;
                state.applied_query = Some(query.clone());
                SearchOutcome::Applied { query, count }
            }
            Err(e) => {
                log::warn!("History fetch failed: {}", e);
                SearchOutcome::Failed(e)
            }
        }
    }
}

impl Default for HistorySearch {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}
