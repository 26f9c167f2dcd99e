use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{entity::{position_rate, tenant}, error::{PayrollError, PayrollResult}};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rates {
    pub ot_rate: Decimal,
    pub extra_day_rate: Decimal,
}

impl Rates {
    pub fn validate(&self) -> PayrollResult<()> {
        if self.ot_rate < Decimal::ZERO || self.extra_day_rate < Decimal::ZERO {
            return Err(PayrollError::validation("rates cannot be negative"));
        }

        Ok(())
    }
}

impl From<&tenant::Model> for Rates {
    fn from(tenant: &tenant::Model) -> Self {
        Self {
            ot_rate: tenant.default_ot_rate,
            extra_day_rate: tenant.default_extra_day_rate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionOverride {
    pub position: String,
    pub rates: Rates,
}

impl From<&position_rate::Model> for PositionOverride {
    fn from(model: &position_rate::Model) -> Self {
        Self {
            position: model.position.clone(),
            rates: Rates {
                ot_rate: model.ot_rate,
                extra_day_rate: model.extra_day_rate,
            },
        }
    }
}

/// Rates for `position`, taken whole from a matching override or else from the tenant defaults
///
/// Position names match exactly, case included.
pub fn resolve_rates(position: &str, overrides: &[PositionOverride], defaults: Rates) -> Rates {
    overrides.iter()
        .find(|o| o.position == position)
        .map(|o| o.rates)
        .unwrap_or(defaults)
}
