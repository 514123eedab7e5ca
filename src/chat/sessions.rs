// Session registry - one chat view per open browser page
// Author: kelexine (https://github.com/kelexine)

use super::view::ChatView;
use crate::cache::{CacheInitializer, DocumentReference};
use crate::error::{ChatError, Result};
use crate::query::QueryForwarder;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

/// Opens, looks up and tears down chat views.
///
/// Each page load gets its own view, which uploads and caches the document
/// again; nothing is shared between sessions except the backend.
#[derive(Clone)]
pub struct SessionRegistry {
    initializer: Arc<CacheInitializer>,
    forwarder: Arc<QueryForwarder>,
    document: DocumentReference,
    /// Session id → mounted view
    sessions: Arc<RwLock<HashMap<Uuid, Arc<ChatView>>>>,
}

impl SessionRegistry {
    pub fn new(
        initializer: Arc<CacheInitializer>,
        forwarder: Arc<QueryForwarder>,
        document: DocumentReference,
    ) -> Self {
        Self {
            initializer,
            forwarder,
            document,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn document(&self) -> &DocumentReference {
        &self.document
    }

    pub fn model(&self) -> &str {
        self.initializer.model()
    }

    /// Create and mount a new view. Expired sessions are dropped first.
    pub async fn open(&self) -> (Uuid, Arc<ChatView>) {
        self.prune_expired().await;

        let id = Uuid::new_v4();
        let view = Arc::new(ChatView::new(
            self.initializer.clone(),
            self.forwarder.clone(),
            self.document.clone(),
        ));
        view.mount();

        self.sessions.write().await.insert(id, view.clone());
        info!("Opened chat session {}", id);
        (id, view)
    }

    pub async fn get(&self, id: Uuid) -> Result<Arc<ChatView>> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(ChatError::SessionNotFound(id))
    }

    /// Unmount and forget a session.
    pub async fn close(&self, id: Uuid) -> Result<()> {
        let view = self
            .sessions
            .write()
            .await
            .remove(&id)
            .ok_or(ChatError::SessionNotFound(id))?;

        view.unmount().await;
        info!("Closed chat session {}", id);
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    async fn prune_expired(&self) {
        let now = Utc::now();
        let expired: Vec<(Uuid, Arc<ChatView>)> = {
            let mut sessions = self.sessions.write().await;
            let ids: Vec<Uuid> = sessions
                .iter()
                .filter(|(_, view)| view.is_expired(now))
                .map(|(id, _)| *id)
                .collect();
            ids.into_iter()
                .filter_map(|id| sessions.remove(&id).map(|view| (id, view)))
                .collect()
        };

        for (id, view) in expired {
            debug!("Pruning expired chat session {}", id);
            view.unmount().await;
        }
    }
}
