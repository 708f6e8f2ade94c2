use crate::{auth::auth::Session, utils::board_cache::BoardCache};
use actix_web::{HttpResponse, Responder, get, web};
use serde_json::json;
use tracing::{info, instrument};

// session end points

#[get("/session")]
pub async fn current_session(session: Session) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "user_id": session.user_id,
        "name": session.name,
        "role": session.role,
    }))
}

/// Drops everything held for this session. The token itself is owned by the
/// upstream issuer and simply expires.
#[instrument(skip_all, fields(user_id = %session.user_id))]
pub async fn logout(session: Session, boards: web::Data<BoardCache>) -> impl Responder {
    boards.evict(&session).await;
    info!("Session closed");

    HttpResponse::NoContent().finish()
}
