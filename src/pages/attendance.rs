use actix_web::{get, post, web, HttpResponse, Responder};
use chrono::Local;
use sea_orm::{prelude::DateTimeWithTimeZone, ActiveValue::{Set, Unchanged}, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::Session,
    entity::{attendance, prelude::*},
    error::PayrollError,
    payroll::{engine::AttendanceSummary, sources, PayPeriod},
    utils,
};

pub(super) fn config(cfg: &mut web::ServiceConfig) {
    cfg
        .service(record_attendance)
        .service(get_attendance_summary);
}

#[derive(Debug, Serialize, Deserialize)]
struct RecordAttendance {
    staff_id: Uuid,
    check_in: DateTimeWithTimeZone,
    check_out: DateTimeWithTimeZone,
}

#[derive(Debug, Serialize, Deserialize)]
struct MonthlyAttendance {
    staff_id: Uuid,
    period: PayPeriod,
    #[serde(flatten)]
    summary: AttendanceSummary,
    regular_hours: rust_decimal::Decimal,
}

/// One row per staff member and day; recording the same day again corrects it
#[post("")]
async fn record_attendance(db: web::Data<DatabaseConnection>, session: Session, payload: web::Json<RecordAttendance>) -> actix_web::Result<impl Responder> {
    session.require("attendance.manage")?;

    let Some((working_minutes, overtime_minutes)) = utils::split_shift(&payload.check_in, &payload.check_out) else {
        return Err(PayrollError::validation("check_out is earlier than check_in").into());
    };

    let staff = sources::staff(&db, &session.scope(), payload.staff_id).await?;
    let work_date = payload.check_in.date_naive();

    let existing = Attendance::find()
        .filter(attendance::Column::TenantId.eq(session.tenant_id))
        .filter(attendance::Column::StaffId.eq(staff.id))
        .filter(attendance::Column::WorkDate.eq(work_date))
        .one(db.as_ref()).await
        .map_err(PayrollError::from)?;

    let now = Local::now().fixed_offset();

    let response = match existing {
        Some(existing) => {
            let model = Attendance::update(attendance::ActiveModel {
                id: Unchanged(existing.id),
                updated_by: Set(Some(session.user_id)),
                updated_at: Set(now),
                check_in: Set(payload.check_in),
                check_out: Set(payload.check_out),
                working_minutes: Set(working_minutes),
                overtime_minutes: Set(overtime_minutes),
                ..Default::default()
            }).exec(db.as_ref()).await.map_err(PayrollError::from)?;

            HttpResponse::Ok().json(web::Json(model))
        },
        None => {
            let model = Attendance::insert(attendance::ActiveModel {
                created_by: Set(Some(session.user_id)),
                updated_by: Set(Some(session.user_id)),
                created_at: Set(now),
                updated_at: Set(now),
                tenant_id: Set(session.tenant_id),
                staff_id: Set(staff.id),
                work_date: Set(work_date),
                check_in: Set(payload.check_in),
                check_out: Set(payload.check_out),
                working_minutes: Set(working_minutes),
                overtime_minutes: Set(overtime_minutes),
                ..Default::default()
            }).exec_with_returning(db.as_ref()).await.map_err(PayrollError::from)?;

            HttpResponse::Created().json(web::Json(model))
        },
    };

    Ok(response)
}

#[get("/{staff_id}/{year}/{month}")]
async fn get_attendance_summary(db: web::Data<DatabaseConnection>, session: Session, path: web::Path<(Uuid, i32, u32)>) -> actix_web::Result<impl Responder> {
    session.require_any(&["attendance.view", "attendance.manage"])?;

    let (staff_id, year, month) = path.into_inner();
    let period = PayPeriod::new(year, month)?;
    let scope = session.scope();

    let staff = sources::staff(&db, &scope, staff_id).await?;
    let summary = sources::attendance_summary(&db, &scope, staff.id, &period).await?;

    Ok(web::Json(MonthlyAttendance {
        staff_id: staff.id,
        period,
        regular_hours: summary.regular_hours(),
        summary,
    }))
}
