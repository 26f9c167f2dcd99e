use actix_web::{get, patch, post, web, HttpResponse, Responder};
use chrono::Local;
use rust_decimal::Decimal;
use sea_orm::{ActiveValue::{Set, Unchanged}, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{auth::Session, entity::{prelude::*, sea_orm_active_enums::StaffStatus, staff}, error::{PayrollError, PayrollResult}, payroll::sources};

pub(super) fn config(cfg: &mut web::ServiceConfig) {
    cfg
        .service(create_staff)
        .service(update_staff)
        .service(list_staff);
}

#[derive(Debug, Serialize, Deserialize)]
struct CreateStaff {
    name: String,
    position: String,
    fixed_salary: Decimal,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct UpdateStaff {
    name: Option<String>,
    position: Option<String>,
    fixed_salary: Option<Decimal>,
    status: Option<StaffStatus>,
}

#[derive(Debug, Deserialize)]
struct StaffQuery {
    status: Option<StaffStatus>,
}

fn validate_fields(name: Option<&str>, position: Option<&str>, fixed_salary: Option<Decimal>) -> PayrollResult<()> {
    if name.is_some_and(|n| n.trim().is_empty()) {
        return Err(PayrollError::validation("name cannot be empty"));
    }

    if position.is_some_and(|p| p.trim().is_empty()) {
        return Err(PayrollError::validation("position cannot be empty"));
    }

    if fixed_salary.is_some_and(|s| s < Decimal::ZERO) {
        return Err(PayrollError::validation("fixed salary cannot be negative"));
    }

    Ok(())
}

#[post("")]
async fn create_staff(db: web::Data<DatabaseConnection>, session: Session, payload: web::Json<CreateStaff>) -> actix_web::Result<impl Responder> {
    session.require("staff.manage")?;

    validate_fields(Some(&payload.name), Some(&payload.position), Some(payload.fixed_salary))?;

    let model = staff::ActiveModel {
        created_by: Set(Some(session.user_id)),
        updated_by: Set(Some(session.user_id)),
        created_at: Set(Local::now().fixed_offset()),
        updated_at: Set(Local::now().fixed_offset()),
        tenant_id: Set(session.tenant_id),
        name: Set(payload.name.trim().to_string()),
        position: Set(payload.position.trim().to_string()),
        fixed_salary: Set(payload.fixed_salary),
        status: Set(StaffStatus::Active),
        ..Default::default()
    };

    let staff = Staff::insert(model)
        .exec_with_returning(db.as_ref()).await
        .map_err(PayrollError::from)?;

    Ok(
        HttpResponse::Created()
            .json(web::Json(staff))
    )
}

/// HR edits; deactivation goes through `status`, staff are never deleted
#[patch("/{staff_id}")]
async fn update_staff(db: web::Data<DatabaseConnection>, session: Session, path: web::Path<Uuid>, payload: web::Json<UpdateStaff>) -> actix_web::Result<impl Responder> {
    session.require("staff.manage")?;

    validate_fields(payload.name.as_deref(), payload.position.as_deref(), payload.fixed_salary)?;

    let staff = sources::staff(&db, &session.scope(), path.into_inner()).await?;
    let payload = payload.into_inner();

    let mut model = staff::ActiveModel {
        id: Unchanged(staff.id),
        updated_by: Set(Some(session.user_id)),
        updated_at: Set(Local::now().fixed_offset()),
        ..Default::default()
    };

    if let Some(name) = payload.name {
        model.name = Set(name.trim().to_string());
    }
    if let Some(position) = payload.position {
        model.position = Set(position.trim().to_string());
    }
    if let Some(fixed_salary) = payload.fixed_salary {
        model.fixed_salary = Set(fixed_salary);
    }
    if let Some(status) = payload.status {
        model.status = Set(status);
    }

    let staff = Staff::update(model)
        .exec(db.as_ref()).await
        .map_err(PayrollError::from)?;

    Ok(web::Json(staff))
}

#[get("")]
async fn list_staff(db: web::Data<DatabaseConnection>, session: Session, query: web::Query<StaffQuery>) -> actix_web::Result<impl Responder> {
    session.require_any(&["staff.view", "staff.manage"])?;

    let mut select = Staff::find()
        .filter(staff::Column::TenantId.eq(session.tenant_id));

    if let Some(status) = query.status {
        select = select.filter(staff::Column::Status.eq(status));
    }

    let staff = select
        .order_by_asc(staff::Column::Name)
        .all(db.as_ref()).await
        .map_err(PayrollError::from)?;

    Ok(web::Json(staff))
}
