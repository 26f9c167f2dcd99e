//! Payroll computation and the collaborators feeding it
//!
//! [`engine`] and [`rates`] are pure. [`sources`] and [`store`] are the only places that
//! touch the database, and they validate stored data before it reaches the arithmetic.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::{PayrollError, PayrollResult}, utils};

pub mod advance;
pub mod engine;
pub mod rates;
pub mod sources;
pub mod store;

/// Tenant and acting user, passed explicitly into every collaborator call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantScope {
    pub tenant_id: Uuid,
    pub actor_id: Uuid,
}

/// A calendar month that payroll is computed for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPayPeriod")]
pub struct PayPeriod {
    pub year: i32,
    pub month: u32,
    #[serde(skip_serializing)]
    start: NaiveDate,
    #[serde(skip_serializing)]
    end: NaiveDate,
}

#[derive(Deserialize)]
struct RawPayPeriod {
    year: i32,
    month: u32,
}

impl TryFrom<RawPayPeriod> for PayPeriod {
    type Error = PayrollError;

    fn try_from(raw: RawPayPeriod) -> Result<Self, Self::Error> {
        PayPeriod::new(raw.year, raw.month)
    }
}

impl PayPeriod {
    pub fn new(year: i32, month: u32) -> PayrollResult<Self> {
        let (start, end) = utils::month_range(year, month)
            .ok_or_else(|| PayrollError::validation(format!("invalid pay period {year}-{month}")))?;

        Ok(Self { year, month, start, end })
    }

    /// First day of the month
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// First day of the following month, exclusive
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    /// Month as stored in the `salary_record` table
    pub fn month_column(&self) -> i32 {
        self.month as i32
    }
}
