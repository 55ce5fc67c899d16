use crate::error::{ConfigError, Result};
use crate::fields::{Field, FlagField, MetricField};
use crate::period::Period;
use crate::query::{
    count_events, daily_event_trend, flag_distribution, histogram, slot_distribution, summarize,
    time_series_sum, top_by_metric, top_value_counts, OfferFilter, QueryConfig,
    DEFAULT_HISTOGRAM_BINS,
};
use crate::types::{
    DailyCountRow, EventCountRow, FlagCountRow, HistogramBin, MetricRankRow, ShiftOffer,
    SlotDistributionRow, SummaryStats, TimeSeriesRow, ValueCountRow,
};
use tracing::info;

/// Fields whose most common values are reported for viewed offers.
pub const VIEWED_VALUE_FIELDS: [Field; 3] = [Field::Duration, Field::PayRate, Field::ChargeRate];

/// Ranking tables computed for a single period bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodReports {
    pub period: Period,
    pub top_by_metric: Vec<MetricRankRow>,
    pub verified: Vec<EventCountRow>,
    pub ncns: Vec<EventCountRow>,
}

/// Every table the standard report run produces.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportBundle {
    /// Metric used for the rankings and the monthly trend.
    pub metric: MetricField,
    pub by_period: Vec<PeriodReports>,
    pub viewed_values: Vec<(Field, Vec<ValueCountRow>)>,
    pub monthly_trend: Vec<TimeSeriesRow>,
    pub ncns_trend: Vec<DailyCountRow>,
    pub verified_split: Vec<FlagCountRow>,
    pub ncns_split: Vec<FlagCountRow>,
    pub viewed_pay_histogram: Vec<HistogramBin>,
    pub viewed_charge_histogram: Vec<HistogramBin>,
    pub pay_rate_by_slot: Vec<SlotDistributionRow>,
    pub summary: SummaryStats,
}

impl ReportBundle {
    /// Run the standard report set.
    ///
    /// `config.period` is ignored in favor of `periods`; each listed period
    /// gets its own ranking tables. A bad configuration surfaces as
    /// [`ReportError::Config`](crate::error::ReportError::Config).
    pub fn build(offers: &[ShiftOffer], config: &QueryConfig, periods: &[Period]) -> Result<Self> {
        config.validate()?;
        info!(offers = offers.len(), periods = periods.len(), "building reports");

        let by_period = periods
            .iter()
            .map(|&period| {
                let cfg = config.clone().with_period(period);
                Ok(PeriodReports {
                    period,
                    top_by_metric: top_by_metric(offers, &cfg)?,
                    verified: count_events(offers, FlagField::Verified, &cfg)?,
                    ncns: count_events(offers, FlagField::Ncns, &cfg)?,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let viewed_values = VIEWED_VALUE_FIELDS
            .iter()
            .map(|&field| {
                top_value_counts(offers, OfferFilter::VIEWED, field, config.top_n)
                    .map(|rows| (field, rows))
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let bundle = ReportBundle {
            metric: config.metric,
            by_period,
            viewed_values,
            monthly_trend: time_series_sum(offers, config.metric),
            ncns_trend: daily_event_trend(offers, FlagField::Ncns),
            verified_split: flag_distribution(offers, FlagField::Verified),
            ncns_split: flag_distribution(offers, FlagField::Ncns),
            viewed_pay_histogram: histogram(
                offers,
                OfferFilter::VIEWED,
                MetricField::PayRate,
                DEFAULT_HISTOGRAM_BINS,
            )?,
            viewed_charge_histogram: histogram(
                offers,
                OfferFilter::VIEWED,
                MetricField::ChargeRate,
                DEFAULT_HISTOGRAM_BINS,
            )?,
            pay_rate_by_slot: slot_distribution(offers, MetricField::PayRate),
            summary: summarize(offers),
        };
        info!(
            months = bundle.monthly_trend.len(),
            ncns_days = bundle.ncns_trend.len(),
            "reports ready"
        );
        Ok(bundle)
    }
}
