use actix_web::{get, put, web, Responder};
use chrono::Local;
use sea_orm::{ActiveValue::{Set, Unchanged}, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};

use crate::{
    auth::Session,
    entity::{position_rate, position_target, prelude::*, tenant},
    error::{PayrollError, PayrollResult},
    payroll::{rates::{resolve_rates, Rates}, sources, TenantScope},
};

pub(super) fn config(cfg: &mut web::ServiceConfig) {
    cfg
        .service(put_default_rates)
        .service(put_position_rates)
        .service(put_target_hours)
        .service(get_position_settings);
}

#[derive(Debug, Serialize, Deserialize)]
struct TargetHours {
    required_hours: i32,
}

#[derive(Debug, Serialize, Deserialize)]
struct PositionSettings {
    position: String,
    rates: Rates,
    /// Rates come from a position override rather than the tenant defaults
    overridden: bool,
    required_hours: Option<i32>,
}

#[put("/rates")]
async fn put_default_rates(db: web::Data<DatabaseConnection>, session: Session, payload: web::Json<Rates>) -> actix_web::Result<impl Responder> {
    session.require("settings.manage")?;
    payload.validate()?;

    let model = tenant::ActiveModel {
        id: Unchanged(session.tenant_id),
        updated_at: Set(Local::now().fixed_offset()),
        default_ot_rate: Set(payload.ot_rate),
        default_extra_day_rate: Set(payload.extra_day_rate),
        ..Default::default()
    };

    let tenant = Tenant::update(model)
        .exec(db.as_ref()).await
        .map_err(PayrollError::from)?;

    tracing::info!(tenant_id = %tenant.id, ot_rate = %tenant.default_ot_rate, extra_day_rate = %tenant.default_extra_day_rate, "default rates changed");

    Ok(web::Json(Rates::from(&tenant)))
}

async fn upsert_position_rates(db: &DatabaseConnection, scope: &TenantScope, position: String, rates: Rates) -> PayrollResult<position_rate::Model> {
    let existing = PositionRate::find()
        .filter(position_rate::Column::TenantId.eq(scope.tenant_id))
        .filter(position_rate::Column::Position.eq(&position))
        .one(db).await?;

    let now = Local::now().fixed_offset();

    let model = match existing {
        Some(existing) => PositionRate::update(position_rate::ActiveModel {
            id: Unchanged(existing.id),
            updated_by: Set(Some(scope.actor_id)),
            updated_at: Set(now),
            ot_rate: Set(rates.ot_rate),
            extra_day_rate: Set(rates.extra_day_rate),
            ..Default::default()
        }).exec(db).await?,
        None => PositionRate::insert(position_rate::ActiveModel {
            created_by: Set(Some(scope.actor_id)),
            updated_by: Set(Some(scope.actor_id)),
            created_at: Set(now),
            updated_at: Set(now),
            tenant_id: Set(scope.tenant_id),
            position: Set(position),
            ot_rate: Set(rates.ot_rate),
            extra_day_rate: Set(rates.extra_day_rate),
            ..Default::default()
        }).exec_with_returning(db).await?,
    };

    Ok(model)
}

#[put("/rates/{position}")]
async fn put_position_rates(db: web::Data<DatabaseConnection>, session: Session, path: web::Path<String>, payload: web::Json<Rates>) -> actix_web::Result<impl Responder> {
    session.require("settings.manage")?;
    payload.validate()?;

    let model = upsert_position_rates(&db, &session.scope(), path.into_inner(), payload.into_inner()).await?;

    Ok(web::Json(model))
}

#[put("/targets/{position}")]
async fn put_target_hours(db: web::Data<DatabaseConnection>, session: Session, path: web::Path<String>, payload: web::Json<TargetHours>) -> actix_web::Result<impl Responder> {
    session.require("settings.manage")?;

    if payload.required_hours < 0 {
        return Err(PayrollError::validation("required hours cannot be negative").into());
    }

    let position = path.into_inner();
    let now = Local::now().fixed_offset();

    let existing = PositionTarget::find()
        .filter(position_target::Column::TenantId.eq(session.tenant_id))
        .filter(position_target::Column::Position.eq(&position))
        .one(db.as_ref()).await
        .map_err(PayrollError::from)?;

    let model = match existing {
        Some(existing) => PositionTarget::update(position_target::ActiveModel {
            id: Unchanged(existing.id),
            updated_by: Set(Some(session.user_id)),
            updated_at: Set(now),
            required_hours: Set(payload.required_hours),
            ..Default::default()
        }).exec(db.as_ref()).await,
        None => PositionTarget::insert(position_target::ActiveModel {
            created_by: Set(Some(session.user_id)),
            updated_by: Set(Some(session.user_id)),
            created_at: Set(now),
            updated_at: Set(now),
            tenant_id: Set(session.tenant_id),
            position: Set(position),
            required_hours: Set(payload.required_hours),
            ..Default::default()
        }).exec_with_returning(db.as_ref()).await,
    }.map_err(PayrollError::from)?;

    Ok(web::Json(model))
}

#[get("/rates/{position}")]
async fn get_position_settings(db: web::Data<DatabaseConnection>, session: Session, path: web::Path<String>) -> actix_web::Result<impl Responder> {
    session.require_any(&["settings.view", "settings.manage"])?;

    let position = path.into_inner();
    let scope = session.scope();

    let (defaults, overrides) = sources::rate_config(&db, &scope).await?;
    let required_hours = sources::target_hours(&db, &scope, &position).await?;

    Ok(web::Json(PositionSettings {
        rates: resolve_rates(&position, &overrides, defaults),
        overridden: overrides.iter().any(|o| o.position == position),
        position,
        required_hours,
    }))
}
