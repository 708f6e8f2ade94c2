//! Optimistic Kanban board over absence requests.
//!
//! The board keeps a single ordered list of requests; each column is the
//! subsequence whose `status` matches the column id, so a request can never
//! sit in two columns or in the wrong one. Status moves are applied locally
//! first and then sent upstream. On any upstream failure the whole board is
//! reloaded instead of undoing the move by hand: the reload is the rollback.
//!
//! The state lock is only held for local edits, never across an upstream
//! call. Two overlapping moves therefore both apply and both call upstream;
//! whichever reload lands last decides what the board shows.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, info, instrument, warn};

use super::policy;
use super::store::{AbsenceStore, StoreError};
use crate::auth::auth::Session;
use crate::model::absence::{AbsenceFilters, AbsenceRequest, AbsenceStatus, ProcessAction};
use crate::model::board::{BoardView, ColumnView, DragEvent};
use crate::model::id::Id;

const LOAD_FAILED: &str = "Failed to load absence requests. Please try again.";
const UPDATE_FAILED: &str = "Failed to update absence status.";

#[derive(Debug)]
pub enum MoveOutcome {
    /// Nothing happened: same slot, dropped outside, stale or out of range.
    Unchanged,
    Reordered,
    /// Refused before touching local state.
    Denied,
    /// Upstream accepted the move; the optimistic state stands.
    Committed,
    /// The destination has no upstream action; the board was reloaded.
    /// Carries the reload error, if the reload failed too.
    Reverted(Option<StoreError>),
    /// Upstream refused or failed; the board was reloaded.
    RolledBack {
        cause: StoreError,
        reload_error: Option<StoreError>,
    },
}

impl MoveOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            MoveOutcome::Unchanged => "unchanged",
            MoveOutcome::Reordered => "reordered",
            MoveOutcome::Denied => "denied",
            MoveOutcome::Committed => "committed",
            MoveOutcome::Reverted(_) => "reverted",
            MoveOutcome::RolledBack { .. } => "rolled_back",
        }
    }

    /// True when the move or the reload behind it hit an upstream 401.
    pub fn session_expired(&self) -> bool {
        let expired = |e: &Option<StoreError>| matches!(e, Some(StoreError::Unauthorized));
        match self {
            MoveOutcome::Reverted(reload_error) => expired(reload_error),
            MoveOutcome::RolledBack {
                cause,
                reload_error,
            } => matches!(cause, StoreError::Unauthorized) || expired(reload_error),
            _ => false,
        }
    }
}

/// Upstream call implied by dropping a ticket on a column.
enum RemoteAction {
    Process(ProcessAction),
    Cancel,
}

impl RemoteAction {
    fn for_target(target: AbsenceStatus) -> Option<Self> {
        match target {
            AbsenceStatus::Approved => Some(RemoteAction::Process(ProcessAction::Approve)),
            AbsenceStatus::Rejected => Some(RemoteAction::Process(ProcessAction::Reject)),
            AbsenceStatus::Cancelled => Some(RemoteAction::Cancel),
            AbsenceStatus::Pending => None,
        }
    }
}

#[derive(Debug, Default)]
struct BoardState {
    requests: Vec<AbsenceRequest>,
    filters: AbsenceFilters,
    error: Option<String>,
}

impl BoardState {
    fn positions(&self, column: AbsenceStatus) -> Vec<usize> {
        self.requests
            .iter()
            .enumerate()
            .filter(|(_, request)| request.status == column)
            .map(|(position, _)| position)
            .collect()
    }

    fn item(&self, column: AbsenceStatus, index: usize) -> Option<&AbsenceRequest> {
        self.requests
            .iter()
            .filter(|request| request.status == column)
            .nth(index)
    }

    /// False when a dragged ticket is no longer at `index` of `column`.
    fn holds(&self, column: AbsenceStatus, index: usize, dragged: Option<&Id>) -> bool {
        match dragged {
            Some(id) => self.item(column, index).is_some_and(|request| &request.id == id),
            None => true,
        }
    }

    fn column_len(&self, column: AbsenceStatus) -> usize {
        self.requests.iter().filter(|r| r.status == column).count()
    }

    fn reorder(&mut self, column: AbsenceStatus, from: usize, to: usize) -> bool {
        let positions = self.positions(column);
        if from >= positions.len() || to >= positions.len() {
            return false;
        }

        let mut items: Vec<AbsenceRequest> = positions
            .iter()
            .map(|&position| self.requests[position].clone())
            .collect();
        let moved = items.remove(from);
        items.insert(to, moved);

        for (position, item) in positions.into_iter().zip(items) {
            self.requests[position] = item;
        }
        true
    }

    fn take(&mut self, column: AbsenceStatus, index: usize) -> Option<AbsenceRequest> {
        let position = *self.positions(column).get(index)?;
        Some(self.requests.remove(position))
    }

    fn insert(&mut self, column: AbsenceStatus, index: usize, item: AbsenceRequest) {
        let positions = self.positions(column);
        let at = match positions.get(index) {
            Some(&position) => position,
            None => positions
                .last()
                .map(|&last| last + 1)
                .unwrap_or(self.requests.len()),
        };
        self.requests.insert(at, item);
    }

    fn view(&self) -> BoardView {
        let columns = AbsenceStatus::ALL
            .into_iter()
            .map(|status| {
                let items: Vec<AbsenceRequest> = self
                    .requests
                    .iter()
                    .filter(|request| request.status == status)
                    .cloned()
                    .collect();
                ColumnView {
                    id: status,
                    title: status.title().to_string(),
                    count: items.len(),
                    items,
                }
            })
            .collect();

        BoardView {
            columns,
            error: self.error.clone(),
        }
    }
}

pub struct BoardReconciler {
    store: Arc<dyn AbsenceStore>,
    state: Mutex<BoardState>,
}

impl BoardReconciler {
    pub fn new(store: Arc<dyn AbsenceStore>) -> Self {
        Self {
            store,
            state: Mutex::new(BoardState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BoardState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn view(&self) -> BoardView {
        self.lock().view()
    }

    /// Fetches requests matching `filters` and partitions them into columns.
    ///
    /// On failure the board is emptied and carries an error message; the
    /// error is also returned so callers can react to an expired session.
    /// Nothing retries automatically.
    #[instrument(name = "board_load", skip(self))]
    pub async fn load_board(&self, filters: AbsenceFilters) -> Result<BoardView, StoreError> {
        let result = self.store.list(&filters).await;

        let mut state = self.lock();
        state.filters = filters;
        match result {
            Ok(page) => {
                debug!(count = page.requests.len(), total = ?page.count, "Board loaded");
                state.requests = page.requests;
                state.error = None;
                Ok(state.view())
            }
            Err(e) => {
                error!(error = %e, "Failed to load absence requests");
                state.requests.clear();
                state.error = Some(LOAD_FAILED.to_string());
                Err(e)
            }
        }
    }

    /// Reloads with the filters of the last load.
    pub async fn refresh(&self) -> Result<BoardView, StoreError> {
        let filters = self.lock().filters.clone();
        self.load_board(filters).await
    }

    /// Local-only reorder inside one column.
    ///
    /// Dragging is a manager/admin gesture, so employees are refused here too.
    pub fn reorder_within_column(
        &self,
        column: AbsenceStatus,
        source_index: usize,
        dest_index: usize,
        dragged: Option<&Id>,
        session: &Session,
    ) -> MoveOutcome {
        if !session.role.is_privileged() {
            debug!("Board moves are limited to managers and admins");
            return MoveOutcome::Denied;
        }
        if source_index == dest_index {
            return MoveOutcome::Unchanged;
        }

        let mut state = self.lock();
        if !state.holds(column, source_index, dragged) {
            return MoveOutcome::Unchanged;
        }
        if state.reorder(column, source_index, dest_index) {
            MoveOutcome::Reordered
        } else {
            MoveOutcome::Unchanged
        }
    }

    /// Moves the ticket at `source_index` of `source` into `dest`.
    ///
    /// When `dragged` is given the move only happens if that ticket is still
    /// at `source_index`; the check and the local edit share one lock.
    #[instrument(
        name = "board_move",
        skip(self, session),
        fields(user_id = %session.user_id, role = %session.role)
    )]
    pub async fn move_across_columns(
        &self,
        source: AbsenceStatus,
        dest: AbsenceStatus,
        source_index: usize,
        dest_index: usize,
        dragged: Option<&Id>,
        session: &Session,
    ) -> MoveOutcome {
        if source == dest {
            return self.reorder_within_column(source, source_index, dest_index, dragged, session);
        }

        if !session.role.is_privileged() {
            debug!("Board moves are limited to managers and admins");
            return MoveOutcome::Denied;
        }

        let id = {
            let mut state = self.lock();
            if !state.holds(source, source_index, dragged) {
                return MoveOutcome::Unchanged;
            }
            let Some(current) = state.item(source, source_index) else {
                return MoveOutcome::Unchanged;
            };
            if !policy::authorize(session, current, dest) {
                debug!(id = %current.id, from = %current.status, to = %dest, "Transition refused");
                return MoveOutcome::Denied;
            }
            if dest_index > state.column_len(dest) {
                return MoveOutcome::Unchanged;
            }

            let Some(mut moved) = state.take(source, source_index) else {
                return MoveOutcome::Unchanged;
            };
            let id = moved.id.clone();
            moved.status = dest;
            state.insert(dest, dest_index, moved);
            id
        };

        let result = match RemoteAction::for_target(dest) {
            Some(RemoteAction::Process(action)) => self.store.process(&id, action, "").await,
            Some(RemoteAction::Cancel) => self.store.cancel(&id).await,
            None => {
                warn!(%id, to = %dest, "No upstream action for destination, reloading board");
                return MoveOutcome::Reverted(self.refresh().await.err());
            }
        };

        match result {
            Ok(()) => {
                info!(%id, to = %dest, "Absence status updated");
                MoveOutcome::Committed
            }
            Err(cause) => {
                warn!(%id, to = %dest, error = %cause, "Status update failed, reloading board");
                let reload_error = self.refresh().await.err();
                if reload_error.is_none() {
                    self.lock().error = Some(UPDATE_FAILED.to_string());
                }
                MoveOutcome::RolledBack {
                    cause,
                    reload_error,
                }
            }
        }
    }

    /// Entry point for drop events from the drag-and-drop layer.
    pub async fn handle_drag(&self, event: &DragEvent, session: &Session) -> MoveOutcome {
        let Some(dest) = event.dest_column_id else {
            return MoveOutcome::Unchanged;
        };

        self.move_across_columns(
            event.source_column_id,
            dest,
            event.source_index,
            event.dest_index,
            event.dragged_item_id.as_ref(),
            session,
        )
        .await
    }
}
