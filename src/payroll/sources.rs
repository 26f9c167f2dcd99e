//! Read side of payroll: everything the engine consumes, scoped to one tenant
//!
//! Query failures surface as [`PayrollError::UpstreamFetch`]. Nothing here substitutes zero
//! for data it could not load.

use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::{entity::{advance, attendance, incentive, position_rate, position_target, prelude::*, salary_record, sea_orm_active_enums::AdvanceStatus, staff}, error::{PayrollError, PayrollResult}, utils};

use super::{advance::AdvanceLedger, engine::AttendanceSummary, rates::{PositionOverride, Rates}, PayPeriod, TenantScope};

pub async fn staff(db: &DatabaseConnection, scope: &TenantScope, staff_id: Uuid) -> PayrollResult<staff::Model> {
    Staff::find_by_id(staff_id)
        .filter(staff::Column::TenantId.eq(scope.tenant_id))
        .one(db).await?
        .ok_or(PayrollError::NotFound("staff"))
}

pub async fn salary_record(db: &DatabaseConnection, scope: &TenantScope, staff_id: Uuid, period: &PayPeriod) -> PayrollResult<Option<salary_record::Model>> {
    let record = SalaryRecord::find()
        .filter(salary_record::Column::TenantId.eq(scope.tenant_id))
        .filter(salary_record::Column::StaffId.eq(staff_id))
        .filter(salary_record::Column::Year.eq(period.year))
        .filter(salary_record::Column::Month.eq(period.month_column()))
        .one(db).await?;

    Ok(record)
}

/// Configured monthly hours of a position, `None` when the tenant never set one
pub async fn target_hours(db: &DatabaseConnection, scope: &TenantScope, position: &str) -> PayrollResult<Option<i32>> {
    let target = PositionTarget::find()
        .filter(position_target::Column::TenantId.eq(scope.tenant_id))
        .filter(position_target::Column::Position.eq(position))
        .one(db).await?;

    Ok(target.map(|t| t.required_hours))
}

/// Tenant default rates together with every per-position override
pub async fn rate_config(db: &DatabaseConnection, scope: &TenantScope) -> PayrollResult<(Rates, Vec<PositionOverride>)> {
    let tenant = Tenant::find_by_id(scope.tenant_id)
        .one(db).await?
        .ok_or(PayrollError::NotFound("tenant"))?;

    let defaults = Rates::from(&tenant);
    defaults.validate()
        .map_err(|_| PayrollError::MalformedUpstream(format!("negative default rates for tenant {}", tenant.id)))?;

    let overrides = PositionRate::find()
        .filter(position_rate::Column::TenantId.eq(scope.tenant_id))
        .all(db).await?
        .iter()
        .map(PositionOverride::from)
        .collect::<Vec<_>>();

    if let Some(bad) = overrides.iter().find(|o| o.rates.validate().is_err()) {
        return Err(PayrollError::MalformedUpstream(format!("negative rates for position {}", bad.position)));
    }

    Ok((defaults, overrides))
}

/// Sums a month of attendance rows into hours
pub async fn attendance_summary(db: &DatabaseConnection, scope: &TenantScope, staff_id: Uuid, period: &PayPeriod) -> PayrollResult<AttendanceSummary> {
    let rows = Attendance::find()
        .filter(attendance::Column::TenantId.eq(scope.tenant_id))
        .filter(attendance::Column::StaffId.eq(staff_id))
        .filter(attendance::Column::WorkDate.gte(period.start()))
        .filter(attendance::Column::WorkDate.lt(period.end()))
        .all(db).await?;

    let mut working_minutes = 0i64;
    let mut overtime_minutes = 0i64;

    for row in rows {
        if !period.contains(row.work_date) {
            return Err(PayrollError::MalformedUpstream(format!("attendance {} is outside of {}-{}", row.id, period.year, period.month)));
        }

        if row.working_minutes < 0 || row.overtime_minutes < 0 || row.overtime_minutes > row.working_minutes {
            return Err(PayrollError::MalformedUpstream(format!("attendance {} has inconsistent minutes", row.id)));
        }

        working_minutes += i64::from(row.working_minutes);
        overtime_minutes += i64::from(row.overtime_minutes);
    }

    AttendanceSummary::new(utils::minutes_to_hours(working_minutes), utils::minutes_to_hours(overtime_minutes))
}

fn sum_amounts(amounts: impl IntoIterator<Item = (Uuid, Decimal)>, what: &str) -> PayrollResult<Decimal> {
    amounts.into_iter().try_fold(Decimal::ZERO, |total, (id, amount)| {
        if amount < Decimal::ZERO {
            return Err(PayrollError::MalformedUpstream(format!("{what} {id} has a negative amount")));
        }

        Ok(total + amount)
    })
}

/// Approved advances whose approval date falls within `period`
pub async fn approved_advance_total(db: &DatabaseConnection, scope: &TenantScope, staff_id: Uuid, period: &PayPeriod) -> PayrollResult<Decimal> {
    let advances = Advance::find()
        .filter(advance::Column::TenantId.eq(scope.tenant_id))
        .filter(advance::Column::StaffId.eq(staff_id))
        .filter(advance::Column::Status.eq(AdvanceStatus::Approved))
        .filter(advance::Column::DecidedOn.gte(period.start()))
        .filter(advance::Column::DecidedOn.lt(period.end()))
        .all(db).await?;

    sum_amounts(advances.into_iter().map(|a| (a.id, a.amount)), "advance")
}

/// Every incentive and every approved or pending advance of a staff member, undated
pub async fn advance_ledger(db: &DatabaseConnection, scope: &TenantScope, staff_id: Uuid) -> PayrollResult<AdvanceLedger> {
    let incentives = Incentive::find()
        .filter(incentive::Column::TenantId.eq(scope.tenant_id))
        .filter(incentive::Column::StaffId.eq(staff_id))
        .all(db).await?;

    let advances = Advance::find()
        .filter(advance::Column::TenantId.eq(scope.tenant_id))
        .filter(advance::Column::StaffId.eq(staff_id))
        .filter(advance::Column::Status.is_in([AdvanceStatus::Approved, AdvanceStatus::Pending]))
        .all(db).await?;

    let (approved, pending): (Vec<_>, Vec<_>) = advances.into_iter()
        .partition(|a| a.status == AdvanceStatus::Approved);

    Ok(AdvanceLedger {
        earned: sum_amounts(incentives.into_iter().map(|i| (i.id, i.amount)), "incentive")?,
        paid_out: sum_amounts(approved.into_iter().map(|a| (a.id, a.amount)), "advance")?,
        pending: sum_amounts(pending.into_iter().map(|a| (a.id, a.amount)), "advance")?,
    })
}
