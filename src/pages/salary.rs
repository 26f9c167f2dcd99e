use std::str::FromStr;

use actix_web::{dev, get, post, web, FromRequest, HttpRequest, HttpResponse, Responder};
use chrono::Local;
use futures_util::future::LocalBoxFuture;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::Session,
    entity::{prelude::*, salary_record, sea_orm_active_enums::StaffStatus, staff},
    error::{PayrollError, PayrollResult},
    payroll::{engine::{self, AdvanceDeduction, ManualInputs, SalaryBreakdown, StaffContract}, rates::resolve_rates, sources, store, PayPeriod, TenantScope},
};

use extractor::UnpaidSalaryRecord;
use model::*;

mod extractor;
mod model;

pub(super) fn config(cfg: &mut web::ServiceConfig) {
    cfg
        .service(preview_salary)
        .service(process_salary)
        .service(list_salaries)
        .service(get_salary)
        .service(pay_salary);
}

struct Computation {
    staff: staff::Model,
    period: PayPeriod,
    existing: Option<salary_record::Model>,
    breakdown: SalaryBreakdown,
}

/// Fetches every input for one staff member and month, then runs the engine
///
/// Collaborators are queried in order and the first failure aborts the whole computation.
async fn compute(db: &DatabaseConnection, scope: &TenantScope, payload: &ProcessSalary) -> PayrollResult<Computation> {
    let period = PayPeriod::new(payload.year, payload.month)?;

    let staff = sources::staff(db, scope, payload.staff_id).await?;
    if staff.status != StaffStatus::Active {
        return Err(PayrollError::validation("staff member is inactive"));
    }

    let existing = sources::salary_record(db, scope, staff.id, &period).await?;
    if existing.as_ref().is_some_and(|record| record.paid) {
        return Err(PayrollError::TerminalState("salary record is already paid".to_string()));
    }

    let target_hours = sources::target_hours(db, scope, &staff.position).await?;
    engine::require_target_hours(&staff.position, target_hours)?;

    let (defaults, overrides) = sources::rate_config(db, scope).await?;
    let rates = resolve_rates(&staff.position, &overrides, defaults);

    let attendance = sources::attendance_summary(db, scope, staff.id, &period).await?;

    let advance = match AdvanceDeduction::carried(existing.as_ref()) {
        Some(carried) => carried,
        None => AdvanceDeduction::Fresh(sources::approved_advance_total(db, scope, staff.id, &period).await?),
    };

    let breakdown = engine::compute_salary(&StaffContract::from(&staff), target_hours, &attendance, advance, &payload.inputs, &rates)?;

    Ok(Computation { staff, period, existing, breakdown })
}

#[post("/preview")]
async fn preview_salary(db: web::Data<DatabaseConnection>, session: Session, payload: web::Json<ProcessSalary>) -> actix_web::Result<impl Responder> {
    session.require("salary.process")?;

    let Computation { staff, period, existing, breakdown } = compute(&db, &session.scope(), &payload).await?;

    Ok(web::Json(SalaryPreview {
        staff_id: staff.id,
        position: staff.position,
        period,
        recompute: existing.is_some(),
        breakdown,
    }))
}

#[post("/process")]
async fn process_salary(db: web::Data<DatabaseConnection>, session: Session, payload: web::Json<ProcessSalary>) -> actix_web::Result<impl Responder> {
    session.require("salary.process")?;

    let scope = session.scope();
    let Computation { staff, period, existing, breakdown } = compute(&db, &scope, &payload).await?;

    let record = store::upsert_salary_record(&db, &scope, staff.id, &period, &breakdown, existing.as_ref()).await?;

    tracing::info!(
        record_id = %record.id,
        staff_id = %staff.id,
        year = period.year,
        month = period.month,
        net_salary = %record.net_salary,
        recompute = existing.is_some(),
        "salary processed"
    );

    let response = match existing {
        Some(_) => HttpResponse::Ok().json(web::Json(record)),
        None => HttpResponse::Created().json(web::Json(record)),
    };

    Ok(response)
}

#[get("")]
async fn list_salaries(db: web::Data<DatabaseConnection>, session: Session, period: web::Query<PayPeriod>) -> actix_web::Result<impl Responder> {
    session.require("salary.view")?;

    let records = SalaryRecord::find()
        .filter(salary_record::Column::TenantId.eq(session.tenant_id))
        .filter(salary_record::Column::Year.eq(period.year))
        .filter(salary_record::Column::Month.eq(period.month_column()))
        .order_by_asc(salary_record::Column::CreatedAt)
        .all(db.as_ref()).await
        .map_err(PayrollError::from)?;

    let total_net_salary: Decimal = records.iter().map(|r| r.net_salary).sum();
    let total_unpaid: Decimal = records.iter().filter(|r| !r.paid).map(|r| r.net_salary).sum();

    Ok(web::Json(SalaryRecords {
        records,
        total_net_salary,
        total_unpaid,
    }))
}

#[get("/{salary_id}")]
async fn get_salary(session: Session, record: salary_record::Model) -> actix_web::Result<impl Responder> {
    session.require("salary.view")?;

    Ok(web::Json(record))
}

#[post("/{salary_id}/pay")]
async fn pay_salary(db: web::Data<DatabaseConnection>, session: Session, record: UnpaidSalaryRecord, payload: Option<web::Json<PaySalary>>) -> actix_web::Result<impl Responder> {
    session.require("salary.pay")?;

    let paid_on = payload
        .and_then(|p| p.into_inner().paid_on)
        .unwrap_or_else(|| Local::now().date_naive());

    let record = store::pay_salary_record(&db, &session.scope(), record.0, paid_on).await?;

    tracing::info!(record_id = %record.id, staff_id = %record.staff_id, %paid_on, "salary paid");

    Ok(web::Json(record))
}

#[cfg(test)]
pub(super) mod tests {
    use actix_web::{http::{Method, StatusCode}, test, App};
    use chrono::{NaiveDate, TimeZone as _};
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    use crate::{
        auth::{tests::session_with, Authority},
        entity::{advance, attendance, position_rate, position_target, sea_orm_active_enums::AdvanceStatus, tenant},
    };

    use super::*;

    pub(crate) fn salary_record_for(session: &Session, paid: bool) -> salary_record::Model {
        salary_record::Model {
            id: Uuid::new_v4(),
            created_at: Local::now().into(),
            updated_at: Local::now().into(),
            created_by: Some(session.user_id),
            updated_by: Some(session.user_id),
            tenant_id: session.tenant_id,
            staff_id: Uuid::new_v4(),
            year: 2024,
            month: 6,
            fixed_salary: dec!(30000),
            base_salary: dec!(24000),
            regular_hours: dec!(120),
            ot_hours: dec!(10),
            ot_amount: dec!(1000),
            extra_days: 1,
            extra_day_pay: dec!(500),
            addition: dec!(200),
            deduction: dec!(100),
            advance_deducted: dec!(1000),
            total_earnings: dec!(25700),
            total_deductions: dec!(1100),
            net_salary: dec!(24600),
            paid,
            paid_on: paid.then(|| NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()),
        }
    }

    fn staff_for(session: &Session) -> staff::Model {
        staff::Model {
            id: Uuid::new_v4(),
            created_at: Local::now().into(),
            updated_at: Local::now().into(),
            created_by: Some(session.user_id),
            updated_by: Some(session.user_id),
            tenant_id: session.tenant_id,
            name: "Alice".to_string(),
            position: "Stylist".to_string(),
            fixed_salary: dec!(30000),
            status: StaffStatus::Active,
        }
    }

    fn target_for(session: &Session, required_hours: i32) -> position_target::Model {
        position_target::Model {
            id: Uuid::new_v4(),
            created_at: Local::now().into(),
            updated_at: Local::now().into(),
            created_by: None,
            updated_by: None,
            tenant_id: session.tenant_id,
            position: "Stylist".to_string(),
            required_hours,
        }
    }

    fn tenant_for(session: &Session) -> tenant::Model {
        tenant::Model {
            id: session.tenant_id,
            created_at: Local::now().into(),
            updated_at: Local::now().into(),
            name: "Salon".to_string(),
            default_ot_rate: dec!(100),
            default_extra_day_rate: dec!(500),
        }
    }

    fn attendance_for(session: &Session, staff_id: Uuid, day: u32, working_minutes: i32, overtime_minutes: i32) -> attendance::Model {
        attendance::Model {
            id: Uuid::new_v4(),
            created_at: Local::now().into(),
            updated_at: Local::now().into(),
            created_by: None,
            updated_by: None,
            tenant_id: session.tenant_id,
            staff_id,
            work_date: NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
            check_in: Local.with_ymd_and_hms(2024, 6, day, 9, 0, 0).unwrap().fixed_offset(),
            check_out: Local.with_ymd_and_hms(2024, 6, day, 17, 0, 0).unwrap().fixed_offset(),
            working_minutes,
            overtime_minutes,
        }
    }

    fn approved_advance_for(session: &Session, staff_id: Uuid, amount: Decimal) -> advance::Model {
        advance::Model {
            id: Uuid::new_v4(),
            created_at: Local::now().into(),
            updated_at: Local::now().into(),
            created_by: None,
            updated_by: None,
            tenant_id: session.tenant_id,
            staff_id,
            amount,
            status: AdvanceStatus::Approved,
            requested_on: NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
            decided_on: NaiveDate::from_ymd_opt(2024, 6, 11),
        }
    }

    fn payload(staff_id: Uuid) -> ProcessSalary {
        ProcessSalary {
            staff_id,
            year: 2024,
            month: 6,
            inputs: ManualInputs {
                ot_hours: Some(dec!(10)),
                extra_days: 1,
                addition: dec!(200),
                deduction: dec!(100),
            },
        }
    }

    #[actix_web::test]
    async fn test_preview_salary() {
        let secret = b"secret";
        let session = session_with(&["salary.process"]);
        let staff = staff_for(&session);

        let token = Authority::new(secret).issue_for(&session).unwrap();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([ vec![ staff.clone() ] ])
            .append_query_results([ Vec::<salary_record::Model>::new() ])
            .append_query_results([ vec![ target_for(&session, 150) ] ])
            .append_query_results([ vec![ tenant_for(&session) ] ])
            .append_query_results([ Vec::<position_rate::Model>::new() ])
            .append_query_results([
                vec![
                    attendance_for(&session, staff.id, 3, 3900, 300),
                    attendance_for(&session, staff.id, 4, 3900, 300),
                ],
            ])
            .append_query_results([
                vec![
                    approved_advance_for(&session, staff.id, dec!(400)),
                    approved_advance_for(&session, staff.id, dec!(600)),
                ],
            ]);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Authority::new(secret)))
                .app_data(web::Data::new(db.into_connection()))
                .service(preview_salary)
        ).await;

        let req = test::TestRequest::default()
            .uri("/preview")
            .method(Method::POST)
            .insert_header(("Authorization", format!("JWT {token}")))
            .set_json(payload(staff.id))
            .to_request();

        let preview: SalaryPreview = test::call_and_read_body_json(&app, req).await;

        assert!(!preview.recompute);
        assert_eq!(preview.breakdown.hourly_rate, dec!(200));
        assert_eq!(preview.breakdown.regular_hours, dec!(120));
        assert_eq!(preview.breakdown.base_salary, dec!(24000));
        assert_eq!(preview.breakdown.ot_amount, dec!(1000));
        assert_eq!(preview.breakdown.extra_day_pay, dec!(500));
        assert_eq!(preview.breakdown.advance_deducted, dec!(1000));
        assert_eq!(preview.breakdown.total_earnings, dec!(25700));
        assert_eq!(preview.breakdown.total_deductions, dec!(1100));
        assert_eq!(preview.breakdown.net_salary, dec!(24600));
    }

    #[actix_web::test]
    async fn test_process_without_target_hours() {
        let secret = b"secret";
        let session = session_with(&["salary.process"]);
        let staff = staff_for(&session);

        let token = Authority::new(secret).issue_for(&session).unwrap();

        for targets in [vec![], vec![ target_for(&session, 0) ]] {
            let db = MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([ vec![ staff.clone() ] ])
                .append_query_results([ Vec::<salary_record::Model>::new() ])
                .append_query_results([ targets ]);

            let app = test::init_service(
                App::new()
                    .app_data(web::Data::new(Authority::new(secret)))
                    .app_data(web::Data::new(db.into_connection()))
                    .service(process_salary)
            ).await;

            let req = test::TestRequest::default()
                .uri("/process")
                .method(Method::POST)
                .insert_header(("Authorization", format!("JWT {token}")))
                .set_json(payload(staff.id))
                .to_request();

            let response = test::call_service(&app, req).await;
            assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

            let body = test::read_body(response).await;
            assert_eq!(body, "Monthly Target Hours are not set for position: Stylist".as_bytes());
        }
    }

    #[actix_web::test]
    async fn test_recompute_keeps_stored_advance() {
        let secret = b"secret";
        let session = session_with(&["salary.process"]);
        let staff = staff_for(&session);

        let mut existing = salary_record_for(&session, false);
        existing.staff_id = staff.id;

        let token = Authority::new(secret).issue_for(&session).unwrap();

        // No advance query is queued; the update returns the recomputed row
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([ vec![ staff.clone() ] ])
            .append_query_results([ vec![ existing.clone() ] ])
            .append_query_results([ vec![ target_for(&session, 150) ] ])
            .append_query_results([ vec![ tenant_for(&session) ] ])
            .append_query_results([ Vec::<position_rate::Model>::new() ])
            .append_query_results([ vec![ attendance_for(&session, staff.id, 3, 7800, 600) ] ])
            .append_query_results([ vec![ existing.clone() ] ]);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Authority::new(secret)))
                .app_data(web::Data::new(db.into_connection()))
                .service(process_salary)
        ).await;

        let req = test::TestRequest::default()
            .uri("/process")
            .method(Method::POST)
            .insert_header(("Authorization", format!("JWT {token}")))
            .set_json(payload(staff.id))
            .to_request();

        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::OK);

        let record: salary_record::Model = test::read_body_json(response).await;
        assert_eq!(record.advance_deducted, dec!(1000));
    }

    #[actix_web::test]
    async fn test_process_paid_record_refused() {
        let secret = b"secret";
        let session = session_with(&["salary.process"]);
        let staff = staff_for(&session);

        let mut paid = salary_record_for(&session, true);
        paid.staff_id = staff.id;

        let token = Authority::new(secret).issue_for(&session).unwrap();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([ vec![ staff.clone() ] ])
            .append_query_results([ vec![ paid ] ]);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Authority::new(secret)))
                .app_data(web::Data::new(db.into_connection()))
                .service(process_salary)
        ).await;

        let req = test::TestRequest::default()
            .uri("/process")
            .method(Method::POST)
            .insert_header(("Authorization", format!("JWT {token}")))
            .set_json(payload(staff.id))
            .to_request();

        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn test_pay_salary() {
        let secret = b"secret";
        let session = session_with(&["salary.pay"]);
        let unpaid = salary_record_for(&session, false);
        let paid = salary_record_for(&session, true);

        let token = Authority::new(secret).issue_for(&session).unwrap();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                vec![ unpaid.clone() ],
                vec![ paid.clone() ],
            ])
            .append_exec_results([
                MockExecResult { last_insert_id: 0, rows_affected: 1 },
            ]);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Authority::new(secret)))
                .app_data(web::Data::new(db.into_connection()))
                .service(pay_salary)
        ).await;

        let req = test::TestRequest::default()
            .uri(&format!("/{}/pay", unpaid.id))
            .method(Method::POST)
            .insert_header(("Authorization", format!("JWT {token}")))
            .set_json(PaySalary { paid_on: NaiveDate::from_ymd_opt(2024, 7, 5) })
            .to_request();

        let returned: salary_record::Model = test::call_and_read_body_json(&app, req).await;
        assert!(returned.paid);
        assert_eq!(returned.paid_on, NaiveDate::from_ymd_opt(2024, 7, 5));
        assert_eq!(returned.net_salary, unpaid.net_salary);

        let req = test::TestRequest::default()
            .uri(&format!("/{}/pay", paid.id))
            .method(Method::POST)
            .insert_header(("Authorization", format!("JWT {token}")))
            .to_request();

        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn test_pay_requires_permission() {
        let secret = b"secret";
        let session = session_with(&["salary.view"]);
        let unpaid = salary_record_for(&session, false);

        let token = Authority::new(secret).issue_for(&session).unwrap();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([ vec![ unpaid.clone() ] ]);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Authority::new(secret)))
                .app_data(web::Data::new(db.into_connection()))
                .service(pay_salary)
        ).await;

        let req = test::TestRequest::default()
            .uri(&format!("/{}/pay", unpaid.id))
            .method(Method::POST)
            .insert_header(("Authorization", format!("JWT {token}")))
            .to_request();

        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_list_salaries() {
        let secret = b"secret";
        let session = session_with(&["*"]);

        let token = Authority::new(secret).issue_for(&session).unwrap();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                vec![ salary_record_for(&session, true), salary_record_for(&session, false) ],
            ]);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Authority::new(secret)))
                .app_data(web::Data::new(db.into_connection()))
                .service(web::scope("/salary").service(list_salaries))
        ).await;

        let req = test::TestRequest::default()
            .uri("/salary?year=2024&month=6")
            .insert_header(("Authorization", format!("JWT {token}")))
            .to_request();

        let records: SalaryRecords = test::call_and_read_body_json(&app, req).await;
        assert_eq!(records.records.len(), 2);
        assert_eq!(records.total_net_salary, dec!(49200));
        assert_eq!(records.total_unpaid, dec!(24600));
    }
}
