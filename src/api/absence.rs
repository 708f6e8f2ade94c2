use actix_web::{HttpResponse, Responder, ResponseError, web};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument};
use utoipa::ToSchema;

use super::{refresh_cached_board, settle, teardown};
use crate::auth::auth::Session;
use crate::client::upstream::Upstream;
use crate::error::ApiError;
use crate::lifecycle::balance::compute_duration;
use crate::lifecycle::form::{
    AbsenceForm, AbsenceFormController, FormPreview, FormValidation, SubmitError,
};
use crate::lifecycle::policy::{self, AllowedActions};
use crate::lifecycle::store::StoreError;
use crate::model::absence::{AbsenceRequest, AbsenceStatus, ProcessAction, parse_day};
use crate::model::id::Id;
use crate::utils::board_cache::BoardCache;

#[derive(Serialize, ToSchema)]
pub struct AbsenceDetails {
    pub request: AbsenceRequest,
    #[schema(example = 5)]
    pub duration_days: u32,
    pub allowed_actions: AllowedActions,
    /// Prefill for the edit form.
    pub form: AbsenceForm,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct ProcessComments {
    #[schema(example = "Enjoy your holiday")]
    pub comments: String,
}

// Balance year follows the requested start date, falling back to the current year.
fn balance_year(form: &AbsenceForm) -> i32 {
    parse_day(&form.start_date)
        .map(|day| day.year())
        .unwrap_or_else(|_| Utc::now().year())
}

async fn form_controller(
    session: &Session,
    upstream: &dyn Upstream,
    form: &AbsenceForm,
) -> AbsenceFormController {
    let mut controller =
        AbsenceFormController::new(upstream.absences(session), upstream.balances(session));
    controller.load_balance(balance_year(form)).await;
    controller
}

async fn submit(
    session: Session,
    form: AbsenceForm,
    editing: Option<Id>,
    upstream: &dyn Upstream,
    boards: &BoardCache,
) -> actix_web::Result<HttpResponse> {
    let controller = form_controller(&session, upstream, &form).await;

    match controller.submit(&form, editing.as_ref()).await {
        Ok(saved) => {
            refresh_cached_board(boards, &session).await;
            if editing.is_some() {
                Ok(HttpResponse::Ok().json(saved))
            } else {
                Ok(HttpResponse::Created().json(saved))
            }
        }
        Err(SubmitError::Invalid(validation)) => {
            Ok(HttpResponse::UnprocessableEntity().json(validation))
        }
        Err(SubmitError::Remote {
            source: StoreError::Unauthorized,
            ..
        }) => {
            teardown(boards, &session).await;
            Err(ApiError::Unauthorized.into())
        }
        Err(SubmitError::Remote { general, source }) => {
            let status = ApiError::from(source).status_code();
            Ok(HttpResponse::build(status).json(FormValidation {
                general: Some(general),
                ..Default::default()
            }))
        }
    }
}

async fn transition(
    session: Session,
    id: Id,
    target: AbsenceStatus,
    comments: String,
    upstream: &dyn Upstream,
    boards: &BoardCache,
) -> actix_web::Result<HttpResponse> {
    let store = upstream.absences(&session);
    let record = settle(store.get(&id).await, boards, &session).await?;

    if !policy::authorize(&session, &record, target) {
        info!(%id, from = %record.status, to = %target, "Transition refused");
        return Err(ApiError::Forbidden(format!(
            "Cannot move a {} request to {}",
            record.status, target
        ))
        .into());
    }

    let result = match target {
        AbsenceStatus::Approved => store.process(&id, ProcessAction::Approve, &comments).await,
        AbsenceStatus::Rejected => store.process(&id, ProcessAction::Reject, &comments).await,
        _ => store.cancel(&id).await,
    };
    settle(result, boards, &session).await?;
    info!(%id, to = %target, "Absence status updated");

    refresh_cached_board(boards, &session).await;
    Ok(HttpResponse::Ok().json(json!({
        "message": format!("Absence request {}", target),
        "status": target
    })))
}

/* =========================
Request details
========================= */
#[utoipa::path(
    get,
    path = "/api/absences/{id}",
    params(
        ("id" = String, Path, description = "Absence request id")
    ),
    responses(
        (status = 200, description = "Request with the actions the caller may take", body = AbsenceDetails),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Absence request not found", body = Object, example = json!({
            "error": "Absence request not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Absence"
)]
#[instrument(skip(upstream, boards, session), fields(user_id = %session.user_id))]
pub async fn get_absence(
    session: Session,
    path: web::Path<String>,
    upstream: web::Data<dyn Upstream>,
    boards: web::Data<BoardCache>,
) -> actix_web::Result<impl Responder> {
    let id = Id::new(path.into_inner());
    let store = upstream.absences(&session);
    let request = settle(store.get(&id).await, &boards, &session).await?;

    Ok(HttpResponse::Ok().json(AbsenceDetails {
        duration_days: compute_duration(request.start_date, request.end_date),
        allowed_actions: policy::allowed_actions(&session, &request),
        form: AbsenceForm::from_request(&request),
        request,
    }))
}

/* =========================
Live form preview
========================= */
/// Advisory check while the user types. Never blocks.
#[utoipa::path(
    post,
    path = "/api/absences/preview",
    request_body(content = AbsenceForm, content_type = "application/json"),
    responses(
        (status = 200, description = "Requested days and balance warning", body = FormPreview),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Absence"
)]
#[instrument(skip_all, fields(user_id = %session.user_id))]
pub async fn preview_absence(
    session: Session,
    form: web::Json<AbsenceForm>,
    upstream: web::Data<dyn Upstream>,
) -> actix_web::Result<impl Responder> {
    let controller = form_controller(&session, upstream.get_ref(), &form).await;
    Ok(HttpResponse::Ok().json(controller.preview(&form)))
}

/* =========================
Create request
========================= */
#[utoipa::path(
    post,
    path = "/api/absences",
    request_body(content = AbsenceForm, description = "Absence request form", content_type = "application/json"),
    responses(
        (status = 201, description = "Absence request submitted", body = AbsenceRequest),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "Validation failed; nothing was sent upstream", body = FormValidation),
        (status = 400, description = "Upstream refused the request", body = FormValidation)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Absence"
)]
#[instrument(skip_all, fields(user_id = %session.user_id))]
pub async fn create_absence(
    session: Session,
    form: web::Json<AbsenceForm>,
    upstream: web::Data<dyn Upstream>,
    boards: web::Data<BoardCache>,
) -> actix_web::Result<impl Responder> {
    submit(session, form.into_inner(), None, upstream.get_ref(), &boards).await
}

/* =========================
Edit request
========================= */
#[utoipa::path(
    put,
    path = "/api/absences/{id}",
    params(
        ("id" = String, Path, description = "Absence request id")
    ),
    request_body(content = AbsenceForm, content_type = "application/json"),
    responses(
        (status = 200, description = "Absence request updated", body = AbsenceRequest),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "Validation failed", body = FormValidation)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Absence"
)]
#[instrument(skip(form, upstream, boards, session), fields(user_id = %session.user_id))]
pub async fn update_absence(
    session: Session,
    path: web::Path<String>,
    form: web::Json<AbsenceForm>,
    upstream: web::Data<dyn Upstream>,
    boards: web::Data<BoardCache>,
) -> actix_web::Result<impl Responder> {
    let id = Id::new(path.into_inner());
    submit(session, form.into_inner(), Some(id), upstream.get_ref(), &boards).await
}

/* =========================
Approve (Manager/Admin)
========================= */
#[utoipa::path(
    post,
    path = "/api/absences/{id}/approve",
    params(
        ("id" = String, Path, description = "Absence request id")
    ),
    request_body(content = ProcessComments, description = "Optional reviewer comments", content_type = "application/json"),
    responses(
        (status = 200, description = "Absence approved", body = Object, example = json!({
            "message": "Absence request approved",
            "status": "approved"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Transition not allowed for this caller or status"),
        (status = 404, description = "Absence request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Absence"
)]
#[instrument(skip(body, upstream, boards, session), fields(user_id = %session.user_id))]
pub async fn approve_absence(
    session: Session,
    path: web::Path<String>,
    body: Option<web::Json<ProcessComments>>,
    upstream: web::Data<dyn Upstream>,
    boards: web::Data<BoardCache>,
) -> actix_web::Result<impl Responder> {
    let comments = body.map(|b| b.into_inner().comments).unwrap_or_default();
    transition(
        session,
        Id::new(path.into_inner()),
        AbsenceStatus::Approved,
        comments,
        upstream.get_ref(),
        &boards,
    )
    .await
}

/* =========================
Reject (Manager/Admin)
========================= */
#[utoipa::path(
    post,
    path = "/api/absences/{id}/reject",
    params(
        ("id" = String, Path, description = "Absence request id")
    ),
    request_body(content = ProcessComments, description = "Optional reviewer comments", content_type = "application/json"),
    responses(
        (status = 200, description = "Absence rejected", body = Object, example = json!({
            "message": "Absence request rejected",
            "status": "rejected"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Transition not allowed for this caller or status"),
        (status = 404, description = "Absence request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Absence"
)]
#[instrument(skip(body, upstream, boards, session), fields(user_id = %session.user_id))]
pub async fn reject_absence(
    session: Session,
    path: web::Path<String>,
    body: Option<web::Json<ProcessComments>>,
    upstream: web::Data<dyn Upstream>,
    boards: web::Data<BoardCache>,
) -> actix_web::Result<impl Responder> {
    let comments = body.map(|b| b.into_inner().comments).unwrap_or_default();
    transition(
        session,
        Id::new(path.into_inner()),
        AbsenceStatus::Rejected,
        comments,
        upstream.get_ref(),
        &boards,
    )
    .await
}

/* =========================
Cancel (owner, assigned manager or admin)
========================= */
#[utoipa::path(
    delete,
    path = "/api/absences/{id}",
    params(
        ("id" = String, Path, description = "Absence request id")
    ),
    responses(
        (status = 200, description = "Absence cancelled", body = Object, example = json!({
            "message": "Absence request cancelled",
            "status": "cancelled"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Transition not allowed for this caller or status"),
        (status = 404, description = "Absence request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Absence"
)]
#[instrument(skip(upstream, boards, session), fields(user_id = %session.user_id))]
pub async fn cancel_absence(
    session: Session,
    path: web::Path<String>,
    upstream: web::Data<dyn Upstream>,
    boards: web::Data<BoardCache>,
) -> actix_web::Result<impl Responder> {
    transition(
        session,
        Id::new(path.into_inner()),
        AbsenceStatus::Cancelled,
        String::new(),
        upstream.get_ref(),
        &boards,
    )
    .await
}
