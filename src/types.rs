use crate::fields::{Field, FieldValue, FlagField, MetricField};
use crate::period::{MonthPeriod, Period};
use crate::util::{display_amount, display_opt_amount, display_opt_text};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// One row of the raw extract, every cell kept as text.
///
/// Headers are the fixed upper-case schema names; extra columns are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RawRow {
    #[serde(rename = "SHIFT_ID")]
    pub shift_id: Option<String>,
    #[serde(rename = "WORKER_ID")]
    pub worker_id: Option<String>,
    #[serde(rename = "WORKPLACE_ID")]
    pub workplace_id: Option<String>,
    #[serde(rename = "SLOT")]
    pub slot: Option<String>,
    #[serde(rename = "SHIFT_START_AT")]
    pub shift_start_at: Option<String>,
    #[serde(rename = "SHIFT_CREATED_AT")]
    pub shift_created_at: Option<String>,
    #[serde(rename = "OFFER_VIEWED_AT")]
    pub offer_viewed_at: Option<String>,
    #[serde(rename = "CLAIMED_AT")]
    pub claimed_at: Option<String>,
    #[serde(rename = "CANCELED_AT")]
    pub canceled_at: Option<String>,
    #[serde(rename = "DELETED_AT")]
    pub deleted_at: Option<String>,
    #[serde(rename = "PAY_RATE")]
    pub pay_rate: Option<String>,
    #[serde(rename = "CHARGE_RATE")]
    pub charge_rate: Option<String>,
    #[serde(rename = "DURATION")]
    pub duration: Option<String>,
    #[serde(rename = "IS_VERIFIED")]
    pub is_verified: Option<String>,
    #[serde(rename = "IS_NCNS")]
    pub is_ncns: Option<String>,
}

impl RawRow {
    /// Build a row from `(column, value)` pairs.
    ///
    /// Names may be the raw header (`PAY_RATE`) or the lower-case schema name
    /// (`pay_rate`). Derived columns and unrecognized names are skipped;
    /// derived values are always recomputed.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut row = RawRow::default();
        for (name, value) in pairs {
            match row.slot_mut(name) {
                Some(cell) => *cell = Some(value.to_string()),
                None => tracing::trace!(column = name, "ignoring column outside the raw schema"),
            }
        }
        row
    }

    fn slot_mut(&mut self, name: &str) -> Option<&mut Option<String>> {
        let field = name.parse::<Field>().ok()?;
        Some(match field {
            Field::ShiftId => &mut self.shift_id,
            Field::WorkerId => &mut self.worker_id,
            Field::WorkplaceId => &mut self.workplace_id,
            Field::Slot => &mut self.slot,
            Field::ShiftStartAt => &mut self.shift_start_at,
            Field::ShiftCreatedAt => &mut self.shift_created_at,
            Field::OfferViewedAt => &mut self.offer_viewed_at,
            Field::ClaimedAt => &mut self.claimed_at,
            Field::CanceledAt => &mut self.canceled_at,
            Field::DeletedAt => &mut self.deleted_at,
            Field::PayRate => &mut self.pay_rate,
            Field::ChargeRate => &mut self.charge_rate,
            Field::Duration => &mut self.duration,
            Field::IsVerified => &mut self.is_verified,
            Field::IsNcns => &mut self.is_ncns,
            Field::ChangeOfRate
            | Field::TotalPayRate
            | Field::TotalChargeRate
            | Field::TotalChangeOfRate => return None,
        })
    }
}

impl From<&ShiftOffer> for RawRow {
    /// Render a normalized offer back into raw text cells.
    fn from(offer: &ShiftOffer) -> Self {
        let ts = |t: Option<NaiveDateTime>| t.map(|t| t.format("%Y-%m-%d %H:%M:%S%.f").to_string());
        let num = |n: Option<f64>| n.map(|n| n.to_string());
        RawRow {
            shift_id: offer.shift_id.clone(),
            worker_id: offer.worker_id.clone(),
            workplace_id: offer.workplace_id.clone(),
            slot: offer.slot.clone(),
            shift_start_at: ts(offer.shift_start_at),
            shift_created_at: ts(offer.shift_created_at),
            offer_viewed_at: ts(offer.offer_viewed_at),
            claimed_at: ts(offer.claimed_at),
            canceled_at: ts(offer.canceled_at),
            deleted_at: ts(offer.deleted_at),
            pay_rate: num(offer.pay_rate),
            charge_rate: num(offer.charge_rate),
            duration: num(offer.duration),
            is_verified: Some(offer.is_verified.to_string()),
            is_ncns: Some(offer.is_ncns.to_string()),
        }
    }
}

/// A normalized shift offer. `None` means the cell was missing or unusable.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ShiftOffer {
    pub shift_id: Option<String>,
    pub worker_id: Option<String>,
    pub workplace_id: Option<String>,
    pub slot: Option<String>,
    pub shift_start_at: Option<NaiveDateTime>,
    pub shift_created_at: Option<NaiveDateTime>,
    pub offer_viewed_at: Option<NaiveDateTime>,
    pub claimed_at: Option<NaiveDateTime>,
    pub canceled_at: Option<NaiveDateTime>,
    pub deleted_at: Option<NaiveDateTime>,
    pub pay_rate: Option<f64>,
    pub charge_rate: Option<f64>,
    pub duration: Option<f64>,
    pub is_verified: bool,
    pub is_ncns: bool,
    pub change_of_rate: Option<f64>,
    pub total_pay_rate: Option<f64>,
    pub total_charge_rate: Option<f64>,
    pub total_change_of_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct MetricRankRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "WorkplaceId")]
    #[tabled(rename = "WorkplaceId", display_with = "display_opt_text")]
    pub workplace_id: Option<String>,
    #[serde(rename = "Period")]
    #[tabled(rename = "Period")]
    pub period: Period,
    #[serde(rename = "Bucket")]
    #[tabled(rename = "Bucket")]
    pub bucket: i32,
    #[serde(rename = "Metric")]
    #[tabled(rename = "Metric")]
    pub metric: MetricField,
    #[serde(rename = "Total")]
    #[tabled(rename = "Total", display_with = "display_amount")]
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct ValueCountRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Field")]
    #[tabled(rename = "Field")]
    pub field: Field,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: FieldValue,
    #[serde(rename = "Count")]
    #[tabled(rename = "Count")]
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct EventCountRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "WorkplaceId")]
    #[tabled(rename = "WorkplaceId", display_with = "display_opt_text")]
    pub workplace_id: Option<String>,
    #[serde(rename = "Period")]
    #[tabled(rename = "Period")]
    pub period: Period,
    #[serde(rename = "Bucket")]
    #[tabled(rename = "Bucket")]
    pub bucket: i32,
    #[serde(rename = "Flag")]
    #[tabled(rename = "Flag")]
    pub flag: FlagField,
    #[serde(rename = "Count")]
    #[tabled(rename = "Count")]
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct TimeSeriesRow {
    #[serde(rename = "Month")]
    #[tabled(rename = "Month")]
    pub month: MonthPeriod,
    #[serde(rename = "Metric")]
    #[tabled(rename = "Metric")]
    pub metric: MetricField,
    #[serde(rename = "Total")]
    #[tabled(rename = "Total", display_with = "display_amount")]
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct DailyCountRow {
    #[serde(rename = "Date")]
    #[tabled(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Flag")]
    #[tabled(rename = "Flag")]
    pub flag: FlagField,
    #[serde(rename = "Count")]
    #[tabled(rename = "Count")]
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct FlagCountRow {
    #[serde(rename = "Flag")]
    #[tabled(rename = "Flag")]
    pub flag: FlagField,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: bool,
    #[serde(rename = "Count")]
    #[tabled(rename = "Count")]
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct HistogramBin {
    #[serde(rename = "Metric")]
    #[tabled(rename = "Metric")]
    pub metric: MetricField,
    #[serde(rename = "Lower")]
    #[tabled(rename = "Lower", display_with = "display_amount")]
    pub lower: f64,
    #[serde(rename = "Upper")]
    #[tabled(rename = "Upper", display_with = "display_amount")]
    pub upper: f64,
    #[serde(rename = "Count")]
    #[tabled(rename = "Count")]
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct SlotDistributionRow {
    #[serde(rename = "Slot")]
    #[tabled(rename = "Slot")]
    pub slot: String,
    #[serde(rename = "Metric")]
    #[tabled(rename = "Metric")]
    pub metric: MetricField,
    #[serde(rename = "Count")]
    #[tabled(rename = "Count")]
    pub count: usize,
    #[serde(rename = "Min")]
    #[tabled(rename = "Min", display_with = "display_amount")]
    pub min: f64,
    #[serde(rename = "Q1")]
    #[tabled(rename = "Q1", display_with = "display_amount")]
    pub q1: f64,
    #[serde(rename = "Median")]
    #[tabled(rename = "Median", display_with = "display_amount")]
    pub median: f64,
    #[serde(rename = "Q3")]
    #[tabled(rename = "Q3", display_with = "display_amount")]
    pub q3: f64,
    #[serde(rename = "Max")]
    #[tabled(rename = "Max", display_with = "display_amount")]
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct SummaryStats {
    pub total_offers: usize,
    pub offers_with_start: usize,
    pub distinct_workers: usize,
    pub distinct_workplaces: usize,
    pub viewed_offers: usize,
    pub claimed_offers: usize,
    pub canceled_offers: usize,
    pub deleted_offers: usize,
    pub verified_offers: usize,
    pub ncns_offers: usize,
    #[tabled(display_with = "display_amount")]
    pub total_pay: f64,
    #[tabled(display_with = "display_amount")]
    pub total_charge: f64,
    #[tabled(display_with = "display_amount")]
    pub total_margin: f64,
    #[tabled(display_with = "display_opt_amount")]
    pub avg_pay_rate: Option<f64>,
    #[tabled(display_with = "display_opt_amount")]
    pub avg_charge_rate: Option<f64>,
}
