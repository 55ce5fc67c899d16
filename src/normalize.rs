//! Schema normalization: raw text rows into typed [`ShiftOffer`] records.
//!
//! `normalize` is total. Each cell is coerced on its own; a cell that cannot
//! be read becomes `None` and the rest of the row is kept.

use crate::types::{RawRow, ShiftOffer};
use crate::util::{
    mul_opt, parse_f64_safe, parse_flag, parse_identifier, parse_timestamp_safe, sub_opt,
};
use tracing::debug;

/// Secondary financial fields, pure functions of pay rate, charge rate and
/// duration.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Financials {
    pub change_of_rate: Option<f64>,
    pub total_pay_rate: Option<f64>,
    pub total_charge_rate: Option<f64>,
    pub total_change_of_rate: Option<f64>,
}

impl Financials {
    pub fn derive(pay_rate: Option<f64>, charge_rate: Option<f64>, duration: Option<f64>) -> Self {
        let total_pay_rate = mul_opt(pay_rate, duration);
        let total_charge_rate = mul_opt(charge_rate, duration);
        Financials {
            change_of_rate: sub_opt(charge_rate, pay_rate),
            total_pay_rate,
            total_charge_rate,
            total_change_of_rate: sub_opt(total_charge_rate, total_pay_rate),
        }
    }
}

impl ShiftOffer {
    /// Recompute the derived fields from the base numeric fields.
    pub fn with_derived_fields(mut self) -> Self {
        let f = Financials::derive(self.pay_rate, self.charge_rate, self.duration);
        self.change_of_rate = f.change_of_rate;
        self.total_pay_rate = f.total_pay_rate;
        self.total_charge_rate = f.total_charge_rate;
        self.total_change_of_rate = f.total_change_of_rate;
        self
    }
}

pub fn normalize(raw: &RawRow) -> ShiftOffer {
    ShiftOffer {
        shift_id: parse_identifier(raw.shift_id.as_deref()),
        worker_id: parse_identifier(raw.worker_id.as_deref()),
        workplace_id: parse_identifier(raw.workplace_id.as_deref()),
        slot: parse_identifier(raw.slot.as_deref()),
        shift_start_at: parse_timestamp_safe(raw.shift_start_at.as_deref()),
        shift_created_at: parse_timestamp_safe(raw.shift_created_at.as_deref()),
        offer_viewed_at: parse_timestamp_safe(raw.offer_viewed_at.as_deref()),
        claimed_at: parse_timestamp_safe(raw.claimed_at.as_deref()),
        canceled_at: parse_timestamp_safe(raw.canceled_at.as_deref()),
        deleted_at: parse_timestamp_safe(raw.deleted_at.as_deref()),
        pay_rate: parse_f64_safe(raw.pay_rate.as_deref()),
        charge_rate: parse_f64_safe(raw.charge_rate.as_deref()),
        duration: parse_f64_safe(raw.duration.as_deref()),
        is_verified: parse_flag(raw.is_verified.as_deref()),
        is_ncns: parse_flag(raw.is_ncns.as_deref()),
        ..ShiftOffer::default()
    }
    .with_derived_fields()
}

/// Normalize a batch, preserving input order one-to-one.
pub fn normalize_all(rows: &[RawRow]) -> Vec<ShiftOffer> {
    let offers: Vec<ShiftOffer> = rows.iter().map(normalize).collect();
    debug!(rows = offers.len(), "normalized shift offers");
    offers
}
