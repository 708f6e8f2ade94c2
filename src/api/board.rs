use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use super::teardown;
use crate::auth::auth::Session;
use crate::client::upstream::Upstream;
use crate::error::ApiError;
use crate::lifecycle::board::{BoardReconciler, MoveOutcome};
use crate::lifecycle::store::StoreError;
use crate::model::absence::AbsenceFilters;
use crate::model::board::{BoardView, DragEvent};
use crate::utils::board_cache::BoardCache;

#[derive(Serialize, ToSchema)]
pub struct DragResult {
    /// unchanged, reordered, denied, committed, reverted or rolled_back
    #[schema(example = "committed")]
    pub outcome: &'static str,
    pub board: BoardView,
}

async fn respond_with_load(
    result: Result<BoardView, StoreError>,
    board: &BoardReconciler,
    boards: &BoardCache,
    session: &Session,
) -> actix_web::Result<HttpResponse> {
    match result {
        Ok(view) => Ok(HttpResponse::Ok().json(view)),
        Err(StoreError::Unauthorized) => {
            teardown(boards, session).await;
            Err(ApiError::Unauthorized.into())
        }
        // The board carries its own error message and empty columns.
        Err(_) => Ok(HttpResponse::BadGateway().json(board.view())),
    }
}

/* =========================
Load board
========================= */
#[utoipa::path(
    get,
    path = "/api/board",
    params(AbsenceFilters),
    responses(
        (status = 200, description = "Requests partitioned into status columns", body = BoardView),
        (status = 401, description = "Unauthorized"),
        (status = 502, description = "Upstream failed; board is empty and carries an error", body = BoardView)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Board"
)]
#[instrument(skip(upstream, boards, session), fields(user_id = %session.user_id))]
pub async fn get_board(
    session: Session,
    query: web::Query<AbsenceFilters>,
    upstream: web::Data<dyn Upstream>,
    boards: web::Data<BoardCache>,
) -> actix_web::Result<impl Responder> {
    let board = boards
        .board_for(&session, || upstream.absences(&session))
        .await;
    let result = board.load_board(query.into_inner()).await;
    respond_with_load(result, &board, &boards, &session).await
}

/* =========================
Explicit reload
========================= */
#[utoipa::path(
    post,
    path = "/api/board/refresh",
    responses(
        (status = 200, description = "Board reloaded with the last filters", body = BoardView),
        (status = 401, description = "Unauthorized"),
        (status = 502, description = "Upstream failed", body = BoardView)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Board"
)]
#[instrument(skip_all, fields(user_id = %session.user_id))]
pub async fn refresh_board(
    session: Session,
    upstream: web::Data<dyn Upstream>,
    boards: web::Data<BoardCache>,
) -> actix_web::Result<impl Responder> {
    let board = boards
        .board_for(&session, || upstream.absences(&session))
        .await;
    let result = board.refresh().await;
    respond_with_load(result, &board, &boards, &session).await
}

/* =========================
Drop a ticket
========================= */
/// Same column reorders locally; another column moves the request to that
/// status. Refused moves answer 200 with outcome `denied` and an untouched board.
#[utoipa::path(
    post,
    path = "/api/board/drag",
    request_body(content = DragEvent, content_type = "application/json"),
    responses(
        (status = 200, description = "Drop handled", body = DragResult),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Board"
)]
#[instrument(skip(upstream, boards, session), fields(user_id = %session.user_id, role = %session.role))]
pub async fn drag(
    session: Session,
    event: web::Json<DragEvent>,
    upstream: web::Data<dyn Upstream>,
    boards: web::Data<BoardCache>,
) -> actix_web::Result<impl Responder> {
    let board = boards
        .board_for(&session, || upstream.absences(&session))
        .await;
    let outcome = board.handle_drag(&event, &session).await;

    if outcome.session_expired() {
        teardown(&boards, &session).await;
        return Err(ApiError::Unauthorized.into());
    }
    match &outcome {
        MoveOutcome::RolledBack { cause, .. } => warn!(error = %cause, "Move rolled back"),
        other => info!(outcome = other.label(), "Drop handled"),
    }

    Ok(HttpResponse::Ok().json(DragResult {
        outcome: outcome.label(),
        board: board.view(),
    }))
}
