use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::auth::Session;
use crate::lifecycle::board::BoardReconciler;
use crate::lifecycle::store::AbsenceStore;

/// Per-session boards, keyed by bearer token.
///
/// An entry lives until its TTL runs out, the session logs out, or the
/// upstream rejects the token.
#[derive(Clone)]
pub struct BoardCache {
    boards: Cache<String, Arc<BoardReconciler>>,
}

impl BoardCache {
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        Self {
            boards: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Returns the session's board, creating an empty one on first use.
    pub async fn board_for(
        &self,
        session: &Session,
        store: impl FnOnce() -> Arc<dyn AbsenceStore>,
    ) -> Arc<BoardReconciler> {
        self.boards
            .get_with(session.token.clone(), async move {
                Arc::new(BoardReconciler::new(store()))
            })
            .await
    }

    /// Returns the session's board only if one was already loaded.
    pub async fn existing(&self, session: &Session) -> Option<Arc<BoardReconciler>> {
        self.boards.get(&session.token).await
    }

    pub async fn evict(&self, session: &Session) {
        self.boards.invalidate(&session.token).await;
    }
}
