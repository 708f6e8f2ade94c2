use actix_web::{HttpResponse, Responder, web};
use chrono::{Datelike, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use utoipa::IntoParams;

use super::settle;
use crate::auth::auth::Session;
use crate::client::upstream::Upstream;
use crate::lifecycle::balance::validate_balance_update;
use crate::model::id::Id;
use crate::model::leave_balance::{BalanceUpdate, LeaveBalance};
use crate::utils::board_cache::BoardCache;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct YearQuery {
    /// Balance year, defaults to the current year
    pub year: Option<i32>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TeamQuery {
    /// Restrict to one department
    pub department_id: Option<String>,
    /// Balance year, defaults to the current year
    pub year: Option<i32>,
}

fn year_or_current(year: Option<i32>) -> i32 {
    year.unwrap_or_else(|| Utc::now().year())
}

/* =========================
Own balance
========================= */
#[utoipa::path(
    get,
    path = "/api/leave-balances/me",
    params(YearQuery),
    responses(
        (status = 200, description = "Signed-in employee's balance", body = LeaveBalance),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No balance recorded for that year")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave balance"
)]
#[instrument(skip(upstream, boards, session), fields(user_id = %session.user_id))]
pub async fn my_balance(
    session: Session,
    query: web::Query<YearQuery>,
    upstream: web::Data<dyn Upstream>,
    boards: web::Data<BoardCache>,
) -> actix_web::Result<impl Responder> {
    let year = year_or_current(query.year);
    let balance = settle(
        upstream.balances(&session).current_balance(year).await,
        &boards,
        &session,
    )
    .await?;
    Ok(HttpResponse::Ok().json(balance))
}

/* =========================
Team balances (Manager/Admin)
========================= */
#[utoipa::path(
    get,
    path = "/api/leave-balances/team",
    params(TeamQuery),
    responses(
        (status = 200, description = "Balances of the caller's team", body = [LeaveBalance]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave balance"
)]
#[instrument(skip(upstream, boards, session), fields(user_id = %session.user_id))]
pub async fn team_balances(
    session: Session,
    query: web::Query<TeamQuery>,
    upstream: web::Data<dyn Upstream>,
    boards: web::Data<BoardCache>,
) -> actix_web::Result<impl Responder> {
    session.require_manager_or_admin()?;

    let year = year_or_current(query.year);
    let balances = settle(
        upstream
            .balances(&session)
            .team_balances(query.department_id.as_deref(), year)
            .await,
        &boards,
        &session,
    )
    .await?;
    Ok(HttpResponse::Ok().json(balances))
}

/* =========================
One employee's balance (Manager/Admin)
========================= */
#[utoipa::path(
    get,
    path = "/api/leave-balances/{employee_id}",
    params(
        ("employee_id" = String, Path, description = "Employee account id"),
        YearQuery
    ),
    responses(
        (status = 200, description = "Employee balance", body = LeaveBalance),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "No balance recorded")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave balance"
)]
#[instrument(skip(upstream, boards, session), fields(user_id = %session.user_id))]
pub async fn employee_balance(
    session: Session,
    path: web::Path<String>,
    query: web::Query<YearQuery>,
    upstream: web::Data<dyn Upstream>,
    boards: web::Data<BoardCache>,
) -> actix_web::Result<impl Responder> {
    session.require_manager_or_admin()?;

    let employee_id = Id::new(path.into_inner());
    let year = year_or_current(query.year);
    let balance = settle(
        upstream
            .balances(&session)
            .employee_balance(&employee_id, year)
            .await,
        &boards,
        &session,
    )
    .await?;
    Ok(HttpResponse::Ok().json(balance))
}

/* =========================
Update allotment (Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave-balances/{employee_id}",
    params(
        ("employee_id" = String, Path, description = "Employee account id")
    ),
    request_body(content = BalanceUpdate, content_type = "application/json"),
    responses(
        (status = 200, description = "Balance updated", body = LeaveBalance),
        (status = 400, description = "Validation failed", body = Object, example = json!({
            "errors": { "year": "Year is required" }
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave balance"
)]
#[instrument(skip(upstream, boards, session), fields(user_id = %session.user_id))]
pub async fn update_balance(
    session: Session,
    path: web::Path<String>,
    payload: web::Json<BalanceUpdate>,
    upstream: web::Data<dyn Upstream>,
    boards: web::Data<BoardCache>,
) -> actix_web::Result<impl Responder> {
    session.require_admin()?;

    let errors = validate_balance_update(&payload);
    if !errors.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({ "errors": errors })));
    }

    let employee_id = Id::new(path.into_inner());
    let balance = settle(
        upstream
            .balances(&session)
            .update_balance(&employee_id, &payload)
            .await,
        &boards,
        &session,
    )
    .await?;

    info!(%employee_id, "Leave balance updated");
    Ok(HttpResponse::Ok().json(balance))
}
