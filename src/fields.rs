//! Typed catalogue of the shift-offer schema.
//!
//! Callers name fields by string at the configuration boundary only; inside the
//! engine everything is an enum so a typo cannot silently select nothing.

use crate::error::ConfigError;
use crate::types::ShiftOffer;
use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Every column of a normalized shift offer, including derived ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    ShiftId,
    WorkerId,
    WorkplaceId,
    Slot,
    ShiftStartAt,
    ShiftCreatedAt,
    OfferViewedAt,
    ClaimedAt,
    CanceledAt,
    DeletedAt,
    PayRate,
    ChargeRate,
    Duration,
    IsVerified,
    IsNcns,
    ChangeOfRate,
    TotalPayRate,
    TotalChargeRate,
    TotalChangeOfRate,
}

impl Field {
    pub const ALL: [Field; 19] = [
        Field::ShiftId,
        Field::WorkerId,
        Field::WorkplaceId,
        Field::Slot,
        Field::ShiftStartAt,
        Field::ShiftCreatedAt,
        Field::OfferViewedAt,
        Field::ClaimedAt,
        Field::CanceledAt,
        Field::DeletedAt,
        Field::PayRate,
        Field::ChargeRate,
        Field::Duration,
        Field::IsVerified,
        Field::IsNcns,
        Field::ChangeOfRate,
        Field::TotalPayRate,
        Field::TotalChargeRate,
        Field::TotalChangeOfRate,
    ];

    /// Column header as it appears in the raw extract.
    pub fn header(self) -> &'static str {
        match self {
            Field::ShiftId => "SHIFT_ID",
            Field::WorkerId => "WORKER_ID",
            Field::WorkplaceId => "WORKPLACE_ID",
            Field::Slot => "SLOT",
            Field::ShiftStartAt => "SHIFT_START_AT",
            Field::ShiftCreatedAt => "SHIFT_CREATED_AT",
            Field::OfferViewedAt => "OFFER_VIEWED_AT",
            Field::ClaimedAt => "CLAIMED_AT",
            Field::CanceledAt => "CANCELED_AT",
            Field::DeletedAt => "DELETED_AT",
            Field::PayRate => "PAY_RATE",
            Field::ChargeRate => "CHARGE_RATE",
            Field::Duration => "DURATION",
            Field::IsVerified => "IS_VERIFIED",
            Field::IsNcns => "IS_NCNS",
            Field::ChangeOfRate => "CHANGE_OF_RATE",
            Field::TotalPayRate => "TOTAL_PAY_RATE",
            Field::TotalChargeRate => "TOTAL_CHARGE_RATE",
            Field::TotalChangeOfRate => "TOTAL_CHANGE_OF_RATE",
        }
    }

    pub fn as_metric(self) -> Option<MetricField> {
        match self {
            Field::PayRate => Some(MetricField::PayRate),
            Field::ChargeRate => Some(MetricField::ChargeRate),
            Field::Duration => Some(MetricField::Duration),
            Field::ChangeOfRate => Some(MetricField::ChangeOfRate),
            Field::TotalPayRate => Some(MetricField::TotalPayRate),
            Field::TotalChargeRate => Some(MetricField::TotalChargeRate),
            Field::TotalChangeOfRate => Some(MetricField::TotalChangeOfRate),
            _ => None,
        }
    }

    pub fn as_flag(self) -> Option<FlagField> {
        match self {
            Field::IsVerified => Some(FlagField::Verified),
            Field::IsNcns => Some(FlagField::Ncns),
            _ => None,
        }
    }
}

// Both the raw header and its lower-case form resolve; lookups stay case-sensitive.
static FIELD_NAMES: Lazy<HashMap<String, Field>> = Lazy::new(|| {
    let mut names = HashMap::with_capacity(Field::ALL.len() * 2);
    for field in Field::ALL {
        names.insert(field.header().to_string(), field);
        names.insert(field.header().to_ascii_lowercase(), field);
    }
    names
});

impl FromStr for Field {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FIELD_NAMES
            .get(s)
            .copied()
            .ok_or_else(|| ConfigError::UnknownField {
                name: s.to_string(),
            })
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.header())
    }
}

/// The numeric subset of [`Field`]: anything that can be summed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MetricField {
    PayRate,
    ChargeRate,
    Duration,
    ChangeOfRate,
    TotalPayRate,
    #[default]
    TotalChargeRate,
    TotalChangeOfRate,
}

impl MetricField {
    pub fn field(self) -> Field {
        match self {
            MetricField::PayRate => Field::PayRate,
            MetricField::ChargeRate => Field::ChargeRate,
            MetricField::Duration => Field::Duration,
            MetricField::ChangeOfRate => Field::ChangeOfRate,
            MetricField::TotalPayRate => Field::TotalPayRate,
            MetricField::TotalChargeRate => Field::TotalChargeRate,
            MetricField::TotalChangeOfRate => Field::TotalChangeOfRate,
        }
    }
}

impl FromStr for MetricField {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let field: Field = s.parse()?;
        field.as_metric().ok_or_else(|| ConfigError::NotNumeric {
            field: field.header().to_string(),
        })
    }
}

impl fmt::Display for MetricField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field().header())
    }
}

impl Serialize for MetricField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.field().serialize(serializer)
    }
}

/// Boolean event flags carried by an offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagField {
    Verified,
    Ncns,
}

impl FlagField {
    pub fn field(self) -> Field {
        match self {
            FlagField::Verified => Field::IsVerified,
            FlagField::Ncns => Field::IsNcns,
        }
    }
}

impl FromStr for FlagField {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let field: Field = s.parse()?;
        field.as_flag().ok_or_else(|| ConfigError::UnknownFlag {
            name: field.header().to_string(),
        })
    }
}

impl fmt::Display for FlagField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field().header())
    }
}

impl Serialize for FlagField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.field().serialize(serializer)
    }
}

/// A single non-null value read out of a record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Flag(bool),
    Timestamp(NaiveDateTime),
}

impl FieldValue {
    /// Hashable identity used when counting occurrences.
    pub(crate) fn key(&self) -> ValueKey {
        match self {
            FieldValue::Text(s) => ValueKey::Text(s.clone()),
            // -0.0 and 0.0 are the same value for counting purposes.
            FieldValue::Number(n) => ValueKey::Number((n + 0.0).to_bits()),
            FieldValue::Flag(b) => ValueKey::Flag(*b),
            FieldValue::Timestamp(t) => ValueKey::Timestamp(*t),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Number(n) => write!(f, "{n}"),
            FieldValue::Flag(b) => write!(f, "{b}"),
            FieldValue::Timestamp(t) => write!(f, "{}", t.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum ValueKey {
    Text(String),
    Number(u64),
    Flag(bool),
    Timestamp(NaiveDateTime),
}

impl ShiftOffer {
    /// Read any column as a typed value; `None` when the column is null.
    pub fn value(&self, field: Field) -> Option<FieldValue> {
        let text = |s: &Option<String>| s.clone().map(FieldValue::Text);
        let ts = |t: Option<NaiveDateTime>| t.map(FieldValue::Timestamp);
        match field {
            Field::ShiftId => text(&self.shift_id),
            Field::WorkerId => text(&self.worker_id),
            Field::WorkplaceId => text(&self.workplace_id),
            Field::Slot => text(&self.slot),
            Field::ShiftStartAt => ts(self.shift_start_at),
            Field::ShiftCreatedAt => ts(self.shift_created_at),
            Field::OfferViewedAt => ts(self.offer_viewed_at),
            Field::ClaimedAt => ts(self.claimed_at),
            Field::CanceledAt => ts(self.canceled_at),
            Field::DeletedAt => ts(self.deleted_at),
            Field::IsVerified => Some(FieldValue::Flag(self.is_verified)),
            Field::IsNcns => Some(FieldValue::Flag(self.is_ncns)),
            other => other
                .as_metric()
                .and_then(|m| self.metric(m))
                .map(FieldValue::Number),
        }
    }

    pub fn metric(&self, metric: MetricField) -> Option<f64> {
        match metric {
            MetricField::PayRate => self.pay_rate,
            MetricField::ChargeRate => self.charge_rate,
            MetricField::Duration => self.duration,
            MetricField::ChangeOfRate => self.change_of_rate,
            MetricField::TotalPayRate => self.total_pay_rate,
            MetricField::TotalChargeRate => self.total_charge_rate,
            MetricField::TotalChangeOfRate => self.total_change_of_rate,
        }
    }

    pub fn flag(&self, flag: FlagField) -> bool {
        match flag {
            FlagField::Verified => self.is_verified,
            FlagField::Ncns => self.is_ncns,
        }
    }
}
