use chrono::{Local, NaiveDate};
use sea_orm::{sea_query::{Expr, OnConflict}, ActiveValue::{Set, Unchanged}, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, SqlErr};
use uuid::Uuid;

use crate::{entity::{prelude::*, salary_record}, error::{PayrollError, PayrollResult}};

use super::{engine::SalaryBreakdown, PayPeriod, TenantScope};

fn breakdown_columns(breakdown: &SalaryBreakdown, scope: &TenantScope) -> PayrollResult<salary_record::ActiveModel> {
    let extra_days = i32::try_from(breakdown.extra_days)
        .map_err(|_| PayrollError::validation("extra days is out of range"))?;

    Ok(salary_record::ActiveModel {
        updated_by: Set(Some(scope.actor_id)),
        updated_at: Set(Local::now().fixed_offset()),
        fixed_salary: Set(breakdown.fixed_salary),
        base_salary: Set(breakdown.base_salary),
        regular_hours: Set(breakdown.regular_hours),
        ot_hours: Set(breakdown.ot_hours),
        ot_amount: Set(breakdown.ot_amount),
        extra_days: Set(extra_days),
        extra_day_pay: Set(breakdown.extra_day_pay),
        addition: Set(breakdown.addition),
        deduction: Set(breakdown.deduction),
        advance_deducted: Set(breakdown.advance_deducted),
        total_earnings: Set(breakdown.total_earnings),
        total_deductions: Set(breakdown.total_deductions),
        net_salary: Set(breakdown.net_salary),
        ..Default::default()
    })
}

/// A second insert for the same (tenant, staff, year, month) lost the race to another operator
///
/// With `ON CONFLICT DO NOTHING` the insert returns no row instead of failing on the unique key.
fn is_duplicate_period(err: &DbErr) -> bool {
    matches!(err, DbErr::RecordNotInserted | DbErr::RecordNotFound(_))
        || matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Writes a breakdown as the salary record of (staff, period)
///
/// Updates `existing` in place when given; a record that got paid in the meantime is left
/// untouched and reported as terminal.
pub async fn upsert_salary_record(
    db: &DatabaseConnection,
    scope: &TenantScope,
    staff_id: Uuid,
    period: &PayPeriod,
    breakdown: &SalaryBreakdown,
    existing: Option<&salary_record::Model>,
) -> PayrollResult<salary_record::Model> {
    match existing {
        Some(record) if record.paid => Err(PayrollError::TerminalState("salary record is already paid".to_string())),
        Some(record) => {
            let model = salary_record::ActiveModel {
                id: Unchanged(record.id),
                ..breakdown_columns(breakdown, scope)?
            };

            SalaryRecord::update(model)
                .filter(salary_record::Column::TenantId.eq(scope.tenant_id))
                .filter(salary_record::Column::Paid.eq(false))
                .exec(db).await
                .map_err(|err| match err {
                    DbErr::RecordNotUpdated => PayrollError::TerminalState("salary record is already paid".to_string()),
                    err => PayrollError::UpstreamFetch(err),
                })
        },
        None => {
            let model = salary_record::ActiveModel {
                created_by: Set(Some(scope.actor_id)),
                created_at: Set(Local::now().fixed_offset()),
                tenant_id: Set(scope.tenant_id),
                staff_id: Set(staff_id),
                year: Set(period.year),
                month: Set(period.month_column()),
                paid: Set(false),
                paid_on: Set(None),
                ..breakdown_columns(breakdown, scope)?
            };

            SalaryRecord::insert(model)
                .on_conflict(OnConflict::columns([
                        salary_record::Column::TenantId,
                        salary_record::Column::StaffId,
                        salary_record::Column::Year,
                        salary_record::Column::Month,
                    ])
                    .do_nothing()
                    .to_owned())
                .exec_with_returning(db).await
                .map_err(|err| match err {
                    err if is_duplicate_period(&err) => PayrollError::TerminalState("salary record for this period was processed concurrently".to_string()),
                    err => PayrollError::UpstreamFetch(err),
                })
        },
    }
}

/// Moves a processed record to paid
pub fn mark_paid(mut record: salary_record::Model, paid_on: NaiveDate) -> PayrollResult<salary_record::Model> {
    if record.paid {
        return Err(PayrollError::TerminalState("salary record is already paid".to_string()));
    }

    record.paid = true;
    record.paid_on = Some(paid_on);

    Ok(record)
}

/// Persists [`mark_paid`]
///
/// The update only matches an unpaid row, so losing a race to another payment comes back as
/// a terminal state instead of paying twice.
pub async fn pay_salary_record(
    db: &DatabaseConnection,
    scope: &TenantScope,
    record: salary_record::Model,
    paid_on: NaiveDate,
) -> PayrollResult<salary_record::Model> {
    let mut record = mark_paid(record, paid_on)?;
    let now = Local::now().fixed_offset();

    let res = SalaryRecord::update_many()
        .col_expr(salary_record::Column::Paid, Expr::value(true))
        .col_expr(salary_record::Column::PaidOn, Expr::value(paid_on))
        .col_expr(salary_record::Column::UpdatedAt, Expr::value(now))
        .col_expr(salary_record::Column::UpdatedBy, Expr::value(scope.actor_id))
        .filter(salary_record::Column::Id.eq(record.id))
        .filter(salary_record::Column::TenantId.eq(scope.tenant_id))
        .filter(salary_record::Column::Paid.eq(false))
        .exec(db).await?;

    if res.rows_affected == 0 {
        return Err(PayrollError::TerminalState("salary record is already paid".to_string()));
    }

    record.updated_at = now;
    record.updated_by = Some(scope.actor_id);

    Ok(record)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    use super::*;

    fn record(paid: bool) -> salary_record::Model {
        salary_record::Model {
            id: Uuid::new_v4(),
            created_at: Local::now().into(),
            updated_at: Local::now().into(),
            created_by: None,
            updated_by: None,
            tenant_id: Uuid::new_v4(),
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
            paid_on: None,
        }
    }

    fn breakdown() -> SalaryBreakdown {
        SalaryBreakdown {
            fixed_salary: dec!(30000),
            target_hours: dec!(150),
            hourly_rate: dec!(200),
            regular_hours: dec!(120),
            base_salary: dec!(24000),
            ot_hours: dec!(10),
            ot_rate: dec!(100),
            ot_amount: dec!(1000),
            extra_days: 1,
            extra_day_rate: dec!(500),
            extra_day_pay: dec!(500),
            addition: dec!(200),
            deduction: dec!(100),
            advance_deducted: dec!(1000),
            total_earnings: dec!(25700),
            total_deductions: dec!(1100),
            net_salary: dec!(24600),
        }
    }

    #[test]
    fn test_mark_paid() {
        let paid_on = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();

        let paid = mark_paid(record(false), paid_on).unwrap();
        assert!(paid.paid);
        assert_eq!(paid.paid_on, Some(paid_on));

        assert!(matches!(mark_paid(paid, paid_on), Err(PayrollError::TerminalState(_))));
    }

    #[actix_web::test]
    async fn test_pay_lost_race() {
        let record = record(false);
        let scope = TenantScope { tenant_id: record.tenant_id, actor_id: Uuid::new_v4() };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([
                MockExecResult { last_insert_id: 0, rows_affected: 0 },
            ])
            .into_connection();

        let err = pay_salary_record(&db, &scope, record, NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()).await.unwrap_err();
        assert!(matches!(err, PayrollError::TerminalState(_)));
    }

    #[actix_web::test]
    async fn test_pay() {
        let record = record(false);
        let scope = TenantScope { tenant_id: record.tenant_id, actor_id: Uuid::new_v4() };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([
                MockExecResult { last_insert_id: 0, rows_affected: 1 },
            ])
            .into_connection();

        let paid = pay_salary_record(&db, &scope, record.clone(), NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()).await.unwrap();
        assert!(paid.paid);
        assert_eq!(paid.id, record.id);
        assert_eq!(paid.net_salary, record.net_salary);
    }

    #[actix_web::test]
    async fn test_upsert_refuses_paid_record() {
        let paid = record(true);
        let scope = TenantScope { tenant_id: paid.tenant_id, actor_id: Uuid::new_v4() };

        // No query results queued: touching the database would fail the test
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let err = upsert_salary_record(&db, &scope, paid.staff_id, &PayPeriod::new(2024, 6).unwrap(), &breakdown(), Some(&paid)).await.unwrap_err();
        assert!(matches!(err, PayrollError::TerminalState(_)));
    }

    #[actix_web::test]
    async fn test_upsert_rejects_unstorable_extra_days() {
        let scope = TenantScope { tenant_id: Uuid::new_v4(), actor_id: Uuid::new_v4() };
        let breakdown = SalaryBreakdown { extra_days: 3_000_000_000, ..breakdown() };

        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let err = upsert_salary_record(&db, &scope, Uuid::new_v4(), &PayPeriod::new(2024, 6).unwrap(), &breakdown, None).await.unwrap_err();
        assert!(matches!(err, PayrollError::Validation(_)));
    }

    #[actix_web::test]
    async fn test_concurrent_insert_is_terminal() {
        let scope = TenantScope { tenant_id: Uuid::new_v4(), actor_id: Uuid::new_v4() };

        // The conflicting insert does nothing, so no row comes back
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([ Vec::<salary_record::Model>::new() ])
            .into_connection();

        let err = upsert_salary_record(&db, &scope, Uuid::new_v4(), &PayPeriod::new(2024, 6).unwrap(), &breakdown(), None).await.unwrap_err();
        assert!(matches!(err, PayrollError::TerminalState(_)));
    }

    #[test]
    fn test_duplicate_period_detection() {
        assert!(is_duplicate_period(&DbErr::RecordNotInserted));
        assert!(!is_duplicate_period(&DbErr::Custom("connection reset".to_string())));
    }

    #[actix_web::test]
    async fn test_upsert_inserts_new_record() {
        let inserted = record(false);
        let scope = TenantScope { tenant_id: inserted.tenant_id, actor_id: Uuid::new_v4() };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([ vec![ inserted.clone() ] ])
            .into_connection();

        let returned = upsert_salary_record(&db, &scope, inserted.staff_id, &PayPeriod::new(2024, 6).unwrap(), &breakdown(), None).await.unwrap();
        assert_eq!(returned, inserted);
        assert_eq!(returned.total_deductions, returned.deduction + returned.advance_deducted);
        assert_ne!(returned.net_salary, Decimal::ZERO);
    }
}
