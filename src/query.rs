//! Aggregation engine over an immutable slice of normalized offers.
//!
//! Every query is a pure function of its input and configuration. Groups are
//! kept in first-encountered order and ranked with a stable sort, so equal
//! totals always come out in the order their groups first appeared.

use crate::error::ConfigError;
use crate::fields::{Field, FieldValue, FlagField, MetricField, ValueKey};
use crate::period::{calendar_date, MonthPeriod, Period};
use crate::types::{
    DailyCountRow, EventCountRow, FlagCountRow, HistogramBin, MetricRankRow, ShiftOffer,
    SlotDistributionRow, SummaryStats, TimeSeriesRow, ValueCountRow,
};
use crate::util::{average, quantile_sorted};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::Hash;
use tracing::debug;

pub const DEFAULT_TOP_N: usize = 10;
pub const DEFAULT_HISTOGRAM_BINS: usize = 20;

/// Per-call settings for the ranking queries.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryConfig {
    pub period: Period,
    pub top_n: usize,
    pub metric: MetricField,
    /// When false, groups are formed by period bucket alone.
    pub group_by_entity: bool,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            period: Period::default(),
            top_n: DEFAULT_TOP_N,
            metric: MetricField::default(),
            group_by_entity: true,
        }
    }
}

impl QueryConfig {
    /// Build a config from raw tokens, failing on the first bad one.
    pub fn parse(
        period: &str,
        top_n: &str,
        metric: &str,
        group_by_entity: bool,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            period: period.parse()?,
            top_n: parse_top_n(top_n)?,
            metric: metric.parse()?,
            group_by_entity,
        })
    }

    #[must_use]
    pub fn with_period(mut self, period: Period) -> Self {
        self.period = period;
        self
    }

    #[must_use]
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    #[must_use]
    pub fn with_metric(mut self, metric: MetricField) -> Self {
        self.metric = metric;
        self
    }

    #[must_use]
    pub fn with_group_by_entity(mut self, enable: bool) -> Self {
        self.group_by_entity = enable;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_top_n(self.top_n)
    }
}

pub fn parse_top_n(s: &str) -> Result<usize, ConfigError> {
    match s.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidTopN {
            value: s.to_string(),
        }),
    }
}

fn validate_top_n(top_n: usize) -> Result<(), ConfigError> {
    if top_n == 0 {
        return Err(ConfigError::InvalidTopN {
            value: top_n.to_string(),
        });
    }
    Ok(())
}

/// Row selection applied before counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OfferFilter {
    #[default]
    All,
    /// The field is non-null.
    HasValue(Field),
    /// The flag is set.
    FlagSet(FlagField),
}

impl OfferFilter {
    /// Offers that were looked at by a worker.
    pub const VIEWED: OfferFilter = OfferFilter::HasValue(Field::OfferViewedAt);

    pub fn matches(&self, offer: &ShiftOffer) -> bool {
        match self {
            OfferFilter::All => true,
            OfferFilter::HasValue(field) => offer.value(*field).is_some(),
            OfferFilter::FlagSet(flag) => offer.flag(*flag),
        }
    }
}

// Insertion-ordered grouping: the index map finds a group, the vector keeps
// the order in which groups were first seen.
struct Grouped<K, A> {
    index: HashMap<K, usize>,
    groups: Vec<(K, A)>,
}

impl<K: Eq + Hash + Clone, A: Default> Grouped<K, A> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            groups: Vec::new(),
        }
    }

    fn entry(&mut self, key: K) -> &mut A {
        let idx = match self.index.get(&key) {
            Some(&idx) => idx,
            None => {
                let idx = self.groups.len();
                self.index.insert(key.clone(), idx);
                self.groups.push((key, A::default()));
                idx
            }
        };
        &mut self.groups[idx].1
    }

    fn into_groups(self) -> Vec<(K, A)> {
        self.groups
    }
}

type EntityKey = (Option<String>, i32);

// Records without a start time, or without a workplace when grouping by
// entity, have no key and are left out.
fn entity_period_key(offer: &ShiftOffer, config: &QueryConfig) -> Option<EntityKey> {
    let bucket = config.period.bucket(offer)?;
    if config.group_by_entity {
        Some((Some(offer.workplace_id.clone()?), bucket))
    } else {
        Some((None, bucket))
    }
}

#[derive(Default)]
struct SumAcc {
    total: f64,
    contributors: usize,
}

impl SumAcc {
    fn add(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.total += v;
            self.contributors += 1;
        }
    }
}

/// Top groups of `(workplace, period bucket)` by the summed metric.
///
/// Groups whose metric is null on every record are dropped rather than
/// reported as zero.
pub fn top_by_metric(
    offers: &[ShiftOffer],
    config: &QueryConfig,
) -> Result<Vec<MetricRankRow>, ConfigError> {
    config.validate()?;
    let mut grouped: Grouped<EntityKey, SumAcc> = Grouped::new();
    for offer in offers {
        if let Some(key) = entity_period_key(offer, config) {
            grouped.entry(key).add(offer.metric(config.metric));
        }
    }
    let mut groups: Vec<(EntityKey, SumAcc)> = grouped
        .into_groups()
        .into_iter()
        .filter(|(_, acc)| acc.contributors > 0)
        .collect();
    groups.sort_by(|a, b| b.1.total.total_cmp(&a.1.total));
    debug!(
        period = %config.period,
        metric = %config.metric,
        groups = groups.len(),
        "ranked metric totals"
    );
    Ok(groups
        .into_iter()
        .take(config.top_n)
        .enumerate()
        .map(|(idx, ((workplace_id, bucket), acc))| MetricRankRow {
            rank: idx + 1,
            workplace_id,
            period: config.period,
            bucket,
            metric: config.metric,
            total: acc.total,
        })
        .collect())
}

/// Most frequent non-null values of `field` among offers passing `filter`.
pub fn top_value_counts(
    offers: &[ShiftOffer],
    filter: OfferFilter,
    field: Field,
    top_n: usize,
) -> Result<Vec<ValueCountRow>, ConfigError> {
    validate_top_n(top_n)?;
    let mut grouped: Grouped<ValueKey, (Option<FieldValue>, usize)> = Grouped::new();
    for offer in offers.iter().filter(|o| filter.matches(o)) {
        if let Some(value) = offer.value(field) {
            let acc = grouped.entry(value.key());
            acc.1 += 1;
            if acc.0.is_none() {
                acc.0 = Some(value);
            }
        }
    }
    let mut counted: Vec<(FieldValue, usize)> = grouped
        .into_groups()
        .into_iter()
        .filter_map(|(_, (value, count))| value.map(|v| (v, count)))
        .collect();
    counted.sort_by(|a, b| b.1.cmp(&a.1));
    debug!(%field, distinct = counted.len(), "counted field values");
    Ok(counted
        .into_iter()
        .take(top_n)
        .enumerate()
        .map(|(idx, (value, count))| ValueCountRow {
            rank: idx + 1,
            field,
            value,
            count,
        })
        .collect())
}

/// Top groups of `(workplace, period bucket)` by number of offers with `flag` set.
pub fn count_events(
    offers: &[ShiftOffer],
    flag: FlagField,
    config: &QueryConfig,
) -> Result<Vec<EventCountRow>, ConfigError> {
    config.validate()?;
    let mut grouped: Grouped<EntityKey, usize> = Grouped::new();
    for offer in offers.iter().filter(|o| o.flag(flag)) {
        if let Some(key) = entity_period_key(offer, config) {
            *grouped.entry(key) += 1;
        }
    }
    let mut groups = grouped.into_groups();
    groups.sort_by(|a, b| b.1.cmp(&a.1));
    debug!(period = %config.period, %flag, groups = groups.len(), "counted flagged events");
    Ok(groups
        .into_iter()
        .take(config.top_n)
        .enumerate()
        .map(|(idx, ((workplace_id, bucket), count))| EventCountRow {
            rank: idx + 1,
            workplace_id,
            period: config.period,
            bucket,
            flag,
            count,
        })
        .collect())
}

/// Metric summed per calendar month across all workplaces, oldest month first.
pub fn time_series_sum(offers: &[ShiftOffer], metric: MetricField) -> Vec<TimeSeriesRow> {
    let mut months: BTreeMap<MonthPeriod, SumAcc> = BTreeMap::new();
    for offer in offers {
        if let Some(month) = MonthPeriod::of(offer) {
            months.entry(month).or_default().add(offer.metric(metric));
        }
    }
    months
        .into_iter()
        .filter(|(_, acc)| acc.contributors > 0)
        .map(|(month, acc)| TimeSeriesRow {
            month,
            metric,
            total: acc.total,
        })
        .collect()
}

/// Offers with `flag` set per calendar date, oldest date first.
pub fn daily_event_trend(offers: &[ShiftOffer], flag: FlagField) -> Vec<DailyCountRow> {
    let mut days = BTreeMap::new();
    for offer in offers.iter().filter(|o| o.flag(flag)) {
        if let Some(date) = calendar_date(offer) {
            *days.entry(date).or_insert(0usize) += 1;
        }
    }
    days.into_iter()
        .map(|(date, count)| DailyCountRow { date, flag, count })
        .collect()
}

/// True/false split of a flag over all offers; both rows are always present.
pub fn flag_distribution(offers: &[ShiftOffer], flag: FlagField) -> Vec<FlagCountRow> {
    let set = offers.iter().filter(|o| o.flag(flag)).count();
    vec![
        FlagCountRow {
            flag,
            value: true,
            count: set,
        },
        FlagCountRow {
            flag,
            value: false,
            count: offers.len() - set,
        },
    ]
}

/// Equal-width histogram of a metric over the filtered offers.
///
/// The last bin is closed on the right. A single distinct value is spread
/// over `[v - 0.5, v + 0.5]`.
pub fn histogram(
    offers: &[ShiftOffer],
    filter: OfferFilter,
    metric: MetricField,
    bins: usize,
) -> Result<Vec<HistogramBin>, ConfigError> {
    if bins == 0 {
        return Err(ConfigError::InvalidBinCount);
    }
    let values: Vec<f64> = offers
        .iter()
        .filter(|o| filter.matches(o))
        .filter_map(|o| o.metric(metric))
        .collect();
    let Some((mut lo, mut hi)) = values.iter().fold(None, |acc: Option<(f64, f64)>, &v| {
        Some(match acc {
            None => (v, v),
            Some((lo, hi)) => (lo.min(v), hi.max(v)),
        })
    }) else {
        return Ok(Vec::new());
    };
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    // Divided before subtracting so a range spanning most of f64 stays finite.
    let width = hi / bins as f64 - lo / bins as f64;
    let mut counts = vec![0usize; bins];
    for v in &values {
        let idx = ((v / width - lo / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    Ok(counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            metric,
            lower: lo + width * i as f64,
            upper: if i + 1 == bins {
                hi
            } else {
                lo + width * (i + 1) as f64
            },
            count,
        })
        .collect())
}

/// Five-number summary of a metric for each slot, slots in first-seen order.
pub fn slot_distribution(offers: &[ShiftOffer], metric: MetricField) -> Vec<SlotDistributionRow> {
    let mut grouped: Grouped<String, Vec<f64>> = Grouped::new();
    for offer in offers {
        if let (Some(slot), Some(v)) = (&offer.slot, offer.metric(metric)) {
            grouped.entry(slot.clone()).push(v);
        }
    }
    grouped
        .into_groups()
        .into_iter()
        .filter_map(|(slot, mut values)| {
            values.sort_by(f64::total_cmp);
            let q = |p: f64| quantile_sorted(&values, p);
            Some(SlotDistributionRow {
                slot,
                metric,
                count: values.len(),
                min: q(0.0)?,
                q1: q(0.25)?,
                median: q(0.5)?,
                q3: q(0.75)?,
                max: q(1.0)?,
            })
        })
        .collect()
}

pub fn summarize(offers: &[ShiftOffer]) -> SummaryStats {
    let count = |pred: fn(&ShiftOffer) -> bool| offers.iter().filter(|o| pred(o)).count();
    let sum = |metric: MetricField| offers.iter().filter_map(|o| o.metric(metric)).sum::<f64>();
    let mean = |metric: MetricField| {
        average(
            &offers
                .iter()
                .filter_map(|o| o.metric(metric))
                .collect::<Vec<_>>(),
        )
    };
    let workers: HashSet<&str> = offers.iter().filter_map(|o| o.worker_id.as_deref()).collect();
    let workplaces: HashSet<&str> = offers
        .iter()
        .filter_map(|o| o.workplace_id.as_deref())
        .collect();
    SummaryStats {
        total_offers: offers.len(),
        offers_with_start: count(|o| o.shift_start_at.is_some()),
        distinct_workers: workers.len(),
        distinct_workplaces: workplaces.len(),
        viewed_offers: count(|o| o.offer_viewed_at.is_some()),
        claimed_offers: count(|o| o.claimed_at.is_some()),
        canceled_offers: count(|o| o.canceled_at.is_some()),
        deleted_offers: count(|o| o.deleted_at.is_some()),
        verified_offers: count(|o| o.is_verified),
        ncns_offers: count(|o| o.is_ncns),
        total_pay: sum(MetricField::TotalPayRate),
        total_charge: sum(MetricField::TotalChargeRate),
        total_margin: sum(MetricField::TotalChangeOfRate),
        avg_pay_rate: mean(MetricField::PayRate),
        avg_charge_rate: mean(MetricField::ChargeRate),
    }
}

/// A single aggregate request, for callers that pick queries at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    TopByMetric(QueryConfig),
    TopValueCounts {
        filter: OfferFilter,
        field: Field,
        top_n: usize,
    },
    CountEvents {
        flag: FlagField,
        config: QueryConfig,
    },
    TimeSeries(MetricField),
}

/// Result of running a [`Query`].
#[derive(Debug, Clone, PartialEq)]
pub enum Table {
    MetricRanks(Vec<MetricRankRow>),
    ValueCounts(Vec<ValueCountRow>),
    EventCounts(Vec<EventCountRow>),
    TimeSeries(Vec<TimeSeriesRow>),
}

impl Table {
    pub fn len(&self) -> usize {
        match self {
            Table::MetricRanks(rows) => rows.len(),
            Table::ValueCounts(rows) => rows.len(),
            Table::EventCounts(rows) => rows.len(),
            Table::TimeSeries(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Query {
    pub fn run(&self, offers: &[ShiftOffer]) -> Result<Table, ConfigError> {
        Ok(match self {
            Query::TopByMetric(config) => Table::MetricRanks(top_by_metric(offers, config)?),
            Query::TopValueCounts {
                filter,
                field,
                top_n,
            } => Table::ValueCounts(top_value_counts(offers, *filter, *field, *top_n)?),
            Query::CountEvents { flag, config } => {
                Table::EventCounts(count_events(offers, *flag, config)?)
            }
            Query::TimeSeries(metric) => Table::TimeSeries(time_series_sum(offers, *metric)),
        })
    }
}
