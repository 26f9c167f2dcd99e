use chrono::NaiveDate;

use super::*;

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct ProcessSalary {
    pub(super) staff_id: Uuid,
    pub(super) year: i32,
    pub(super) month: u32,
    #[serde(default)]
    pub(super) inputs: ManualInputs,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(super) struct PaySalary {
    pub(super) paid_on: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct SalaryPreview {
    pub(super) staff_id: Uuid,
    pub(super) position: String,
    pub(super) period: PayPeriod,
    /// Whether processing would update a record that already exists
    pub(super) recompute: bool,
    pub(super) breakdown: SalaryBreakdown,
}

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct SalaryRecords {
    pub(super) records: Vec<salary_record::Model>,
    pub(super) total_net_salary: Decimal,
    pub(super) total_unpaid: Decimal,
}
