//! View state shared by the chat session and its HTTP representation.

// Author: kelexine (https://github.com/kelexine)

use crate::cache::CacheHandle;
use serde::Serialize;

/// Shown when cache initialization fails. The session stays unusable.
pub const INIT_ERROR_MESSAGE: &str = "Error initializing cache. Please refresh.";

/// Shown when a send is attempted before the cache exists.
pub const NOT_READY_MESSAGE: &str = "Cache not initialized. Please wait.";

/// Shown when a query fails. Raw error detail only goes to the log.
pub const QUERY_ERROR_MESSAGE: &str = "Error fetching response. Please try again.";

/// Lifecycle of a chat view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewPhase {
    Uninitialized,
    Initializing,
    Ready(CacheHandle),
    Failed,
    Closed,
}

impl ViewPhase {
    pub fn kind(&self) -> PhaseKind {
        match self {
            ViewPhase::Uninitialized => PhaseKind::Uninitialized,
            ViewPhase::Initializing => PhaseKind::Initializing,
            ViewPhase::Ready(_) => PhaseKind::Ready,
            ViewPhase::Failed => PhaseKind::Failed,
            ViewPhase::Closed => PhaseKind::Closed,
        }
    }

    pub fn cache(&self) -> Option<&CacheHandle> {
        match self {
            ViewPhase::Ready(cache) => Some(cache),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseKind {
    Uninitialized,
    Initializing,
    Ready,
    Failed,
    Closed,
}

/// Point-in-time copy of a view, as rendered by the browser page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewSnapshot {
    pub phase: PhaseKind,
    pub input: String,
    pub response: String,
    pub sending: bool,
    pub cache: Option<CacheHandle>,
}

impl ViewSnapshot {
    /// Whether the page should enable its send action.
    pub fn can_send(&self) -> bool {
        self.phase == PhaseKind::Ready
    }
}
