use actix_web::{get, post, web, HttpResponse, Responder};
use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use sea_orm::{ActiveValue::{Set, Unchanged}, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::Session,
    entity::{advance, incentive, prelude::*, sea_orm_active_enums::AdvanceStatus},
    error::{PayrollError, PayrollResult},
    payroll::{self, advance::AdvanceLedger, sources, TenantScope},
};

pub(super) fn config(cfg: &mut web::ServiceConfig) {
    cfg
        .service(record_incentive)
        .service(request_advance)
        .service(approve_advance)
        .service(reject_advance)
        .service(get_balance);
}

#[derive(Debug, Serialize, Deserialize)]
struct RecordIncentive {
    staff_id: Uuid,
    amount: Decimal,
    earned_on: Option<NaiveDate>,
    #[serde(default)]
    description: String,
}

/// Requests are always dated today
#[derive(Debug, Serialize, Deserialize)]
struct RequestAdvance {
    staff_id: Uuid,
    amount: Decimal,
}

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
struct AdvanceBalance {
    staff_id: Uuid,
    #[serde(flatten)]
    ledger: AdvanceLedger,
    claimable: Decimal,
}

#[post("/incentive")]
async fn record_incentive(db: web::Data<DatabaseConnection>, session: Session, payload: web::Json<RecordIncentive>) -> actix_web::Result<impl Responder> {
    session.require("advance.approve")?;

    if payload.amount <= Decimal::ZERO {
        return Err(PayrollError::validation("incentive amount must be positive").into());
    }

    let staff = sources::staff(&db, &session.scope(), payload.staff_id).await?;
    let payload = payload.into_inner();
    let now = Local::now();

    let model = Incentive::insert(incentive::ActiveModel {
        created_by: Set(Some(session.user_id)),
        updated_by: Set(Some(session.user_id)),
        created_at: Set(now.fixed_offset()),
        updated_at: Set(now.fixed_offset()),
        tenant_id: Set(session.tenant_id),
        staff_id: Set(staff.id),
        amount: Set(payload.amount),
        earned_on: Set(payload.earned_on.unwrap_or_else(|| now.date_naive())),
        description: Set(payload.description),
        ..Default::default()
    }).exec_with_returning(db.as_ref()).await.map_err(PayrollError::from)?;

    Ok(
        HttpResponse::Created()
            .json(web::Json(model))
    )
}

/// Files a pending advance against the lifetime balance, other pending requests reserved
#[post("")]
async fn request_advance(db: web::Data<DatabaseConnection>, session: Session, payload: web::Json<RequestAdvance>) -> actix_web::Result<impl Responder> {
    session.require("advance.request")?;

    let scope = session.scope();
    let now = Local::now();

    let staff = sources::staff(&db, &scope, payload.staff_id).await?;
    let ledger = sources::advance_ledger(&db, &scope, staff.id).await?;

    payroll::advance::validate_request(payload.amount, ledger.claimable())?;

    let model = Advance::insert(advance::ActiveModel {
        created_by: Set(Some(session.user_id)),
        updated_by: Set(Some(session.user_id)),
        created_at: Set(now.fixed_offset()),
        updated_at: Set(now.fixed_offset()),
        tenant_id: Set(session.tenant_id),
        staff_id: Set(staff.id),
        amount: Set(payload.amount),
        status: Set(AdvanceStatus::Pending),
        requested_on: Set(now.date_naive()),
        decided_on: Set(None),
        ..Default::default()
    }).exec_with_returning(db.as_ref()).await.map_err(PayrollError::from)?;

    tracing::info!(advance_id = %model.id, staff_id = %staff.id, amount = %model.amount, claimable = %ledger.claimable(), "advance requested");

    Ok(
        HttpResponse::Created()
            .json(web::Json(model))
    )
}

/// Settles a pending advance
///
/// Approval checks the amount against the balance again, since other requests may have been
/// approved since this one was filed. The update only matches a row that is still pending, so
/// two concurrent decisions cannot both succeed.
async fn decide(db: &DatabaseConnection, scope: &TenantScope, advance_id: Uuid, to: AdvanceStatus) -> PayrollResult<advance::Model> {
    let model = Advance::find_by_id(advance_id)
        .filter(advance::Column::TenantId.eq(scope.tenant_id))
        .one(db).await?
        .ok_or(PayrollError::NotFound("advance"))?;

    let status = payroll::advance::transition(model.status, to)?;

    if status == AdvanceStatus::Approved {
        let ledger = sources::advance_ledger(db, scope, model.staff_id).await?;
        payroll::advance::validate_request(model.amount, ledger.approvable())?;
    }

    let now = Local::now();

    let active = advance::ActiveModel {
        id: Unchanged(model.id),
        updated_by: Set(Some(scope.actor_id)),
        updated_at: Set(now.fixed_offset()),
        status: Set(status),
        decided_on: Set(Some(now.date_naive())),
        ..Default::default()
    };

    let model = Advance::update(active)
        .filter(advance::Column::TenantId.eq(scope.tenant_id))
        .filter(advance::Column::Status.eq(AdvanceStatus::Pending))
        .exec(db).await
        .map_err(|err| match err {
            DbErr::RecordNotUpdated => PayrollError::TerminalState("advance was already decided".to_string()),
            err => PayrollError::from(err),
        })?;

    tracing::info!(advance_id = %model.id, staff_id = %model.staff_id, status = ?model.status, "advance decided");

    Ok(model)
}

#[post("/{advance_id}/approve")]
async fn approve_advance(db: web::Data<DatabaseConnection>, session: Session, path: web::Path<Uuid>) -> actix_web::Result<impl Responder> {
    session.require("advance.approve")?;

    let model = decide(&db, &session.scope(), path.into_inner(), AdvanceStatus::Approved).await?;

    Ok(web::Json(model))
}

#[post("/{advance_id}/reject")]
async fn reject_advance(db: web::Data<DatabaseConnection>, session: Session, path: web::Path<Uuid>) -> actix_web::Result<impl Responder> {
    session.require("advance.approve")?;

    let model = decide(&db, &session.scope(), path.into_inner(), AdvanceStatus::Rejected).await?;

    Ok(web::Json(model))
}

#[get("/{staff_id}/balance")]
async fn get_balance(db: web::Data<DatabaseConnection>, session: Session, path: web::Path<Uuid>) -> actix_web::Result<impl Responder> {
    session.require_any(&["advance.view", "advance.request", "advance.approve"])?;

    let scope = session.scope();

    let staff = sources::staff(&db, &scope, path.into_inner()).await?;
    let ledger = sources::advance_ledger(&db, &scope, staff.id).await?;

    Ok(web::Json(AdvanceBalance {
        staff_id: staff.id,
        claimable: ledger.claimable(),
        ledger,
    }))
}
