use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{consts::{CURRENCY_SCALE, MAX_STORED_AMOUNT}, entity::{salary_record, staff}, error::{PayrollError, PayrollResult}};

use super::rates::Rates;

/// Contract terms payroll needs from a staff record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffContract {
    pub staff_id: Uuid,
    pub position: String,
    pub fixed_salary: Decimal,
}

impl From<&staff::Model> for StaffContract {
    fn from(staff: &staff::Model) -> Self {
        Self {
            staff_id: staff.id,
            position: staff.position.clone(),
            fixed_salary: staff.fixed_salary,
        }
    }
}

/// Hours worked by one staff member in one month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceSummary {
    pub total_working_hours: Decimal,
    /// Part of `total_working_hours`
    pub total_overtime_hours: Decimal,
}

impl AttendanceSummary {
    /// Checked constructor for data coming out of storage
    pub fn new(total_working_hours: Decimal, total_overtime_hours: Decimal) -> PayrollResult<Self> {
        if total_working_hours < Decimal::ZERO || total_overtime_hours < Decimal::ZERO {
            return Err(PayrollError::MalformedUpstream("negative attendance hours".to_string()));
        }

        if total_overtime_hours > total_working_hours {
            return Err(PayrollError::MalformedUpstream(format!(
                "overtime of {total_overtime_hours}h exceeds {total_working_hours}h worked"
            )));
        }

        Ok(Self { total_working_hours, total_overtime_hours })
    }

    pub fn regular_hours(&self) -> Decimal {
        (self.total_working_hours - self.total_overtime_hours).max(Decimal::ZERO)
    }
}

/// Operator supplied adjustments
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManualInputs {
    /// Blank or zero means the attendance overtime is used
    pub ot_hours: Option<Decimal>,
    pub extra_days: u32,
    pub addition: Decimal,
    pub deduction: Decimal,
}

/// Where the advance deduction of a salary record comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceDeduction {
    /// Approved advances for the month, fetched live on first processing
    Fresh(Decimal),
    /// Value already stored on the record being recomputed
    Carried(Decimal),
}

impl AdvanceDeduction {
    /// Stored deduction of a record being recomputed, `None` on first processing
    pub fn carried(existing: Option<&salary_record::Model>) -> Option<Self> {
        existing.map(|record| Self::Carried(record.advance_deducted))
    }

    pub fn amount(&self) -> Decimal {
        match self {
            Self::Fresh(amount) | Self::Carried(amount) => *amount,
        }
    }
}

/// Full salary breakdown, every intermediate value included
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryBreakdown {
    pub fixed_salary: Decimal,
    pub target_hours: Decimal,
    pub hourly_rate: Decimal,
    pub regular_hours: Decimal,
    pub base_salary: Decimal,
    pub ot_hours: Decimal,
    pub ot_rate: Decimal,
    pub ot_amount: Decimal,
    pub extra_days: u32,
    pub extra_day_rate: Decimal,
    pub extra_day_pay: Decimal,
    pub addition: Decimal,
    pub deduction: Decimal,
    pub advance_deducted: Decimal,
    pub total_earnings: Decimal,
    pub total_deductions: Decimal,
    pub net_salary: Decimal,
}

/// Target hours of a position as a usable divisor
///
/// Unset or non-positive targets are a configuration error naming the position.
pub fn require_target_hours(position: &str, target_hours: Option<i32>) -> PayrollResult<Decimal> {
    match target_hours {
        Some(hours) if hours > 0 => Ok(Decimal::from(hours)),
        _ => Err(PayrollError::Configuration { position: position.to_string() }),
    }
}

fn money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(CURRENCY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

fn non_negative(name: &str, value: Decimal) -> PayrollResult<()> {
    if value < Decimal::ZERO {
        return Err(PayrollError::validation(format!("{name} cannot be negative")));
    }

    Ok(())
}

fn out_of_range(name: &str) -> PayrollError {
    PayrollError::validation(format!("{name} is out of range"))
}

/// Rejects values a salary record column cannot hold
fn storable(name: &str, value: Decimal) -> PayrollResult<Decimal> {
    if value.abs() > MAX_STORED_AMOUNT {
        return Err(out_of_range(name));
    }

    Ok(value)
}

fn product(name: &str, lhs: Decimal, rhs: Decimal) -> PayrollResult<Decimal> {
    lhs.checked_mul(rhs)
        .map(money)
        .ok_or_else(|| out_of_range(name))
        .and_then(|value| storable(name, value))
}

fn total(name: &str, parts: &[Decimal]) -> PayrollResult<Decimal> {
    parts.iter()
        .try_fold(Decimal::ZERO, |sum, part| sum.checked_add(*part))
        .ok_or_else(|| out_of_range(name))
        .and_then(|value| storable(name, value))
}

/// Derives the salary of one staff member for one month
///
/// Base pay is pro-rated on regular hours against the position's monthly target, so working
/// less than the target earns proportionally less. Monetary components are rounded to
/// [`CURRENCY_SCALE`] before the totals are formed. Every quantity must fit a salary record
/// column, anything larger is a validation error.
pub fn compute_salary(
    contract: &StaffContract,
    target_hours: Option<i32>,
    attendance: &AttendanceSummary,
    advance: AdvanceDeduction,
    manual: &ManualInputs,
    rates: &Rates,
) -> PayrollResult<SalaryBreakdown> {
    let target_hours = require_target_hours(&contract.position, target_hours)?;

    non_negative("fixed salary", contract.fixed_salary)?;
    non_negative("working hours", attendance.total_working_hours)?;
    non_negative("overtime hours", attendance.total_overtime_hours)?;
    non_negative("advance", advance.amount())?;
    non_negative("addition", manual.addition)?;
    non_negative("deduction", manual.deduction)?;
    non_negative("overtime rate", rates.ot_rate)?;
    non_negative("extra day rate", rates.extra_day_rate)?;
    if let Some(hours) = manual.ot_hours {
        non_negative("overtime hours", hours)?;
    }

    if i32::try_from(manual.extra_days).is_err() {
        return Err(out_of_range("extra days"));
    }

    let regular_hours = storable("regular hours", attendance.regular_hours())?;
    let hourly_rate = contract.fixed_salary / target_hours;
    let base_salary = product("base salary", hourly_rate, regular_hours)?;

    let ot_hours = match manual.ot_hours {
        Some(hours) if !hours.is_zero() => hours,
        _ => attendance.total_overtime_hours,
    };
    let ot_hours = storable("overtime hours", ot_hours)?;
    let ot_amount = product("overtime amount", ot_hours, rates.ot_rate)?;

    let extra_day_pay = product("extra day pay", Decimal::from(manual.extra_days), rates.extra_day_rate)?;

    let addition = storable("addition", money(manual.addition))?;
    let deduction = storable("deduction", money(manual.deduction))?;
    let advance_deducted = storable("advance", money(advance.amount()))?;

    let total_earnings = total("total earnings", &[base_salary, ot_amount, extra_day_pay, addition])?;
    let total_deductions = total("total deductions", &[deduction, advance_deducted])?;

    // Both totals are within the column range, so the difference cannot overflow
    let net_salary = storable("net salary", total_earnings - total_deductions)?;

    Ok(SalaryBreakdown {
        fixed_salary: storable("fixed salary", contract.fixed_salary)?,
        target_hours,
        hourly_rate,
        regular_hours,
        base_salary,
        ot_hours,
        ot_rate: rates.ot_rate,
        ot_amount,
        extra_days: manual.extra_days,
        extra_day_rate: rates.extra_day_rate,
        extra_day_pay,
        addition,
        deduction,
        advance_deducted,
        total_earnings,
        total_deductions,
        net_salary,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Local;
    use rust_decimal_macros::dec;

    use super::*;

    fn contract(fixed_salary: Decimal) -> StaffContract {
        StaffContract {
            staff_id: Uuid::new_v4(),
            position: "Stylist".to_string(),
            fixed_salary,
        }
    }

    fn rates() -> Rates {
        Rates { ot_rate: dec!(100), extra_day_rate: dec!(500) }
    }

    fn assert_additive(b: &SalaryBreakdown) {
        assert_eq!(b.total_earnings, b.base_salary + b.ot_amount + b.extra_day_pay + b.addition);
        assert_eq!(b.total_deductions, b.deduction + b.advance_deducted);
        assert_eq!(b.net_salary, b.total_earnings - b.total_deductions);
    }

    #[test]
    fn test_worked_example() {
        let attendance = AttendanceSummary::new(dec!(130), dec!(10)).unwrap();
        let manual = ManualInputs {
            ot_hours: Some(dec!(10)),
            extra_days: 1,
            addition: dec!(200),
            deduction: dec!(100),
        };

        let b = compute_salary(&contract(dec!(30000)), Some(150), &attendance, AdvanceDeduction::Fresh(dec!(1000)), &manual, &rates()).unwrap();

        assert_eq!(b.hourly_rate, dec!(200));
        assert_eq!(b.regular_hours, dec!(120));
        assert_eq!(b.base_salary, dec!(24000));
        assert_eq!(b.ot_amount, dec!(1000));
        assert_eq!(b.extra_day_pay, dec!(500));
        assert_eq!(b.total_earnings, dec!(25700));
        assert_eq!(b.total_deductions, dec!(1100));
        assert_eq!(b.net_salary, dec!(24600));
        assert_additive(&b);
    }

    #[test]
    fn test_base_salary_is_pro_rated() {
        let attendance = AttendanceSummary::new(dec!(100), dec!(0)).unwrap();

        let b = compute_salary(&contract(dec!(16000)), Some(160), &attendance, AdvanceDeduction::Fresh(Decimal::ZERO), &ManualInputs::default(), &rates()).unwrap();

        assert_eq!(b.base_salary, dec!(10000));
        assert_eq!(b.net_salary, dec!(10000));
    }

    #[test]
    fn test_pro_ration_rounds_to_cents() {
        // 10000 / 3 per hour, for one hour
        let attendance = AttendanceSummary::new(dec!(1), dec!(0)).unwrap();

        let b = compute_salary(&contract(dec!(10000)), Some(3), &attendance, AdvanceDeduction::Fresh(Decimal::ZERO), &ManualInputs::default(), &rates()).unwrap();

        assert_eq!(b.base_salary, dec!(3333.33));
        assert!((b.base_salary - b.hourly_rate * b.regular_hours).abs() < dec!(0.005));
        assert_additive(&b);
    }

    #[test]
    fn test_zero_target_hours_is_configuration_error() {
        let attendance = AttendanceSummary::new(dec!(120), dec!(0)).unwrap();

        for target in [Some(0), None, Some(-5)] {
            let err = compute_salary(&contract(dec!(30000)), target, &attendance, AdvanceDeduction::Fresh(Decimal::ZERO), &ManualInputs::default(), &rates()).unwrap_err();

            match err {
                PayrollError::Configuration { position } => assert_eq!(position, "Stylist"),
                other => panic!("expected configuration error, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_overtime_defaults_to_attendance() {
        let attendance = AttendanceSummary::new(dec!(130), dec!(7.5)).unwrap();

        let blank = compute_salary(&contract(dec!(30000)), Some(150), &attendance, AdvanceDeduction::Fresh(Decimal::ZERO), &ManualInputs::default(), &rates()).unwrap();
        assert_eq!(blank.ot_hours, dec!(7.5));
        assert_eq!(blank.ot_amount, dec!(750));

        let zero = ManualInputs { ot_hours: Some(Decimal::ZERO), ..Default::default() };
        let zeroed = compute_salary(&contract(dec!(30000)), Some(150), &attendance, AdvanceDeduction::Fresh(Decimal::ZERO), &zero, &rates()).unwrap();
        assert_eq!(zeroed.ot_hours, dec!(7.5));

        let manual = ManualInputs { ot_hours: Some(dec!(2)), ..Default::default() };
        let overridden = compute_salary(&contract(dec!(30000)), Some(150), &attendance, AdvanceDeduction::Fresh(Decimal::ZERO), &manual, &rates()).unwrap();
        assert_eq!(overridden.ot_hours, dec!(2));
        assert_eq!(overridden.ot_amount, dec!(200));
    }

    #[test]
    fn test_regular_hours_clamped() {
        let attendance = AttendanceSummary {
            total_working_hours: dec!(5),
            total_overtime_hours: dec!(8),
        };

        let b = compute_salary(&contract(dec!(30000)), Some(150), &attendance, AdvanceDeduction::Fresh(Decimal::ZERO), &ManualInputs::default(), &rates()).unwrap();

        assert_eq!(b.regular_hours, Decimal::ZERO);
        assert_eq!(b.base_salary, Decimal::ZERO);
    }

    #[test]
    fn test_negative_inputs_rejected() {
        let attendance = AttendanceSummary::new(dec!(120), dec!(0)).unwrap();
        let manual = ManualInputs { deduction: dec!(-1), ..Default::default() };

        let err = compute_salary(&contract(dec!(30000)), Some(150), &attendance, AdvanceDeduction::Fresh(Decimal::ZERO), &manual, &rates()).unwrap_err();
        assert!(matches!(err, PayrollError::Validation(_)));

        let err = compute_salary(&contract(dec!(-1)), Some(150), &attendance, AdvanceDeduction::Fresh(Decimal::ZERO), &ManualInputs::default(), &rates()).unwrap_err();
        assert!(matches!(err, PayrollError::Validation(_)));
    }

    #[test]
    fn test_net_salary_may_go_negative() {
        let attendance = AttendanceSummary::new(dec!(10), dec!(0)).unwrap();

        let b = compute_salary(&contract(dec!(15000)), Some(150), &attendance, AdvanceDeduction::Fresh(dec!(5000)), &ManualInputs::default(), &rates()).unwrap();

        assert_eq!(b.net_salary, dec!(-4000));
        assert_additive(&b);
    }

    #[test]
    fn test_oversized_inputs_rejected() {
        let attendance = AttendanceSummary::new(dec!(120), dec!(0)).unwrap();
        let advance = AdvanceDeduction::Fresh(Decimal::ZERO);

        let huge_ot = ManualInputs { ot_hours: Some(Decimal::MAX), ..Default::default() };
        let err = compute_salary(&contract(dec!(30000)), Some(150), &attendance, advance, &huge_ot, &rates()).unwrap_err();
        assert!(matches!(err, PayrollError::Validation(_)));

        let huge_addition = ManualInputs { addition: Decimal::MAX, ..Default::default() };
        let err = compute_salary(&contract(dec!(30000)), Some(150), &attendance, advance, &huge_addition, &rates()).unwrap_err();
        assert!(matches!(err, PayrollError::Validation(_)));

        // Each component fits a column on its own but the sum does not
        let near_limit = ManualInputs { addition: Decimal::from(999_999_999_999_999i64), ..Default::default() };
        let err = compute_salary(&contract(dec!(30000)), Some(150), &attendance, advance, &near_limit, &rates()).unwrap_err();
        assert!(matches!(err, PayrollError::Validation(_)));

        let huge_salary = compute_salary(&contract(Decimal::MAX), Some(1), &attendance, advance, &ManualInputs::default(), &rates()).unwrap_err();
        assert!(matches!(huge_salary, PayrollError::Validation(_)));
    }

    #[test]
    fn test_extra_days_must_fit_a_record() {
        let attendance = AttendanceSummary::new(dec!(120), dec!(0)).unwrap();
        let manual = ManualInputs { extra_days: 3_000_000_000, ..Default::default() };
        let free_days = Rates { ot_rate: dec!(100), extra_day_rate: Decimal::ZERO };

        let err = compute_salary(&contract(dec!(30000)), Some(150), &attendance, AdvanceDeduction::Fresh(Decimal::ZERO), &manual, &free_days).unwrap_err();
        assert!(matches!(err, PayrollError::Validation(_)));
    }

    #[test]
    fn test_attendance_summary_rejects_malformed() {
        assert!(matches!(AttendanceSummary::new(dec!(5), dec!(6)), Err(PayrollError::MalformedUpstream(_))));
        assert!(matches!(AttendanceSummary::new(dec!(-1), dec!(0)), Err(PayrollError::MalformedUpstream(_))));
    }

    #[test]
    fn test_advance_carried_on_recompute() {
        let record = salary_record::Model {
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
            paid: false,
            paid_on: None,
        };

        // A second advance was approved after processing; the live total must not be consulted
        let advance = AdvanceDeduction::carried(Some(&record)).unwrap();
        assert_eq!(advance, AdvanceDeduction::Carried(dec!(1000)));

        let attendance = AttendanceSummary::new(dec!(130), dec!(10)).unwrap();
        let b = compute_salary(&contract(dec!(30000)), Some(150), &attendance, advance, &ManualInputs::default(), &rates()).unwrap();
        assert_eq!(b.advance_deducted, dec!(1000));

        assert_eq!(AdvanceDeduction::carried(None), None);
    }
}
