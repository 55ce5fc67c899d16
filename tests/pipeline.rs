//! End-to-end scenarios over the normalizer and aggregation engine.

use shift_report::{
    normalize, normalize_all, ConfigError, Field, MetricField, OfferFilter, Period, Query,
    QueryConfig, RawRow, ShiftOffer, Table,
};
use shift_report::query::{count_events, time_series_sum, top_by_metric, top_value_counts};
use shift_report::FlagField;

fn w1_rows() -> Vec<RawRow> {
    vec![
        RawRow::from_pairs([
            ("WORKPLACE_ID", "W1"),
            ("PAY_RATE", "10"),
            ("CHARGE_RATE", "15"),
            ("DURATION", "2"),
            ("SHIFT_START_AT", "2024-01-05"),
        ]),
        RawRow::from_pairs([
            ("WORKPLACE_ID", "W1"),
            ("PAY_RATE", "10"),
            ("CHARGE_RATE", "20"),
            ("DURATION", "2"),
            ("SHIFT_START_AT", "2024-01-06"),
        ]),
    ]
}

#[test]
fn weekly_charge_for_one_workplace() {
    let offers = normalize_all(&w1_rows());
    let totals: Vec<_> = offers.iter().map(|o| o.total_charge_rate).collect();
    assert_eq!(totals, vec![Some(30.0), Some(40.0)]);

    let rows = top_by_metric(&offers, &QueryConfig::default()).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].workplace_id.as_deref(), Some("W1"));
    assert_eq!(rows[0].period, Period::Week);
    assert_eq!(rows[0].bucket, 1);
    assert_eq!(rows[0].total, 70.0);
}

#[test]
fn empty_charge_rate_is_null_but_row_survives() {
    let mut rows = w1_rows();
    rows.push(RawRow::from_pairs([
        ("SHIFT_ID", "s-3"),
        ("WORKPLACE_ID", "W1"),
        ("PAY_RATE", "10"),
        ("CHARGE_RATE", ""),
        ("DURATION", "2"),
        ("SHIFT_START_AT", "2024-01-06"),
    ]));
    let offers = normalize_all(&rows);
    let dirty = &offers[2];
    assert_eq!(dirty.charge_rate, None);
    assert_eq!(dirty.change_of_rate, None);
    assert_eq!(dirty.total_charge_rate, None);

    let ranked = top_by_metric(&offers, &QueryConfig::default()).unwrap();
    assert_eq!(ranked[0].total, 70.0);

    // Identifier-only reports still see the row.
    let ids = top_value_counts(&offers, OfferFilter::All, Field::ShiftId, 10).unwrap();
    assert_eq!(ids.len(), 1);
    assert_eq!(ids[0].value.to_string(), "s-3");
    let workplaces = top_value_counts(&offers, OfferFilter::All, Field::WorkplaceId, 10).unwrap();
    assert_eq!(workplaces[0].count, 3);
}

#[test]
fn lower_case_schema_names_map_to_the_same_columns() {
    let raw = RawRow::from_pairs([
        ("workplace_id", "W1"),
        ("pay_rate", "10"),
        ("charge_rate", "15"),
        ("duration", "2"),
        ("shift_start_at", "2024-01-05"),
        ("total_charge_rate", "999"),
    ]);
    assert_eq!(raw.workplace_id.as_deref(), Some("W1"));

    let offer = normalize(&raw);
    assert_eq!(offer.total_charge_rate, Some(30.0));
    assert_eq!(offer.total_change_of_rate, Some(10.0));
    assert_eq!(Period::Week.bucket(&offer), Some(1));
    assert_eq!(offer, normalize(&w1_rows()[0]));
}

#[test]
fn value_count_ties_keep_first_seen_order() {
    let rows: Vec<_> = ["B", "A", "B", "C", "A"]
        .iter()
        .map(|slot| RawRow::from_pairs([("SLOT", *slot)]))
        .collect();
    let offers = normalize_all(&rows);
    let counts = top_value_counts(&offers, OfferFilter::All, Field::Slot, 10).unwrap();
    let got: Vec<_> = counts.iter().map(|r| (r.value.to_string(), r.count)).collect();
    assert_eq!(
        got,
        vec![("B".to_string(), 2), ("A".to_string(), 2), ("C".to_string(), 1)]
    );
    let ranks: Vec<_> = counts.iter().map(|r| r.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3]);
}

#[test]
fn event_count_ties_keep_first_seen_order() {
    let rows: Vec<_> = ["C", "B", "A", "B", "C", "A"]
        .iter()
        .map(|w| {
            RawRow::from_pairs([
                ("WORKPLACE_ID", *w),
                ("SHIFT_START_AT", "2024-04-02"),
                ("IS_NCNS", "1"),
            ])
        })
        .collect();
    let offers = normalize_all(&rows);
    let config = QueryConfig::default().with_period(Period::Month).with_top_n(2);
    let ncns = count_events(&offers, FlagField::Ncns, &config).unwrap();
    let got: Vec<_> = ncns.iter().map(|r| (r.workplace_id.as_deref(), r.count)).collect();
    assert_eq!(got, vec![(Some("C"), 2), (Some("B"), 2)]);
}

#[test]
fn unknown_metric_name_is_reported() {
    let err = QueryConfig::parse("week", "10", "NOT_A_FIELD", true).unwrap_err();
    assert_eq!(
        err,
        ConfigError::UnknownField {
            name: "NOT_A_FIELD".to_string()
        }
    );
    assert!(err.to_string().contains("NOT_A_FIELD"));
}

#[test]
fn empty_input_gives_empty_tables() {
    let config = QueryConfig::default();
    assert!(top_by_metric(&[], &config).unwrap().is_empty());
    assert!(count_events(&[], FlagField::Verified, &config).unwrap().is_empty());
    assert!(top_value_counts(&[], OfferFilter::VIEWED, Field::Duration, 10)
        .unwrap()
        .is_empty());
    assert!(time_series_sum(&[], MetricField::TotalChargeRate).is_empty());
}

#[test]
fn fewer_groups_than_n_are_not_padded() {
    let offers = normalize_all(&w1_rows());
    let config = QueryConfig::default().with_period(Period::Year).with_top_n(50);
    assert_eq!(top_by_metric(&offers, &config).unwrap().len(), 1);
}

#[test]
fn top_n_truncates() {
    let offers: Vec<ShiftOffer> = (0..15)
        .map(|i| {
            let workplace = format!("W{i}");
            let charge = format!("{}", i + 1);
            normalize(&RawRow::from_pairs([
                ("WORKPLACE_ID", workplace.as_str()),
                ("CHARGE_RATE", charge.as_str()),
                ("DURATION", "1"),
                ("SHIFT_START_AT", "2024-05-01"),
            ]))
        })
        .collect();
    let rows = top_by_metric(&offers, &QueryConfig::default()).unwrap();
    assert_eq!(rows.len(), 10);
    assert_eq!(rows[0].workplace_id.as_deref(), Some("W14"));
    assert_eq!(rows[9].workplace_id.as_deref(), Some("W5"));
    let ranks: Vec<usize> = rows.iter().map(|r| r.rank).collect();
    assert_eq!(ranks, (1..=10).collect::<Vec<_>>());
}

#[test]
fn viewed_offer_filter_and_value_counts() {
    let rows = vec![
        RawRow::from_pairs([("DURATION", "8"), ("OFFER_VIEWED_AT", "2024-01-01 09:00:00")]),
        RawRow::from_pairs([("DURATION", "4"), ("OFFER_VIEWED_AT", "2024-01-01 09:05:00")]),
        RawRow::from_pairs([("DURATION", "8"), ("OFFER_VIEWED_AT", "2024-01-02 10:00:00")]),
        RawRow::from_pairs([("DURATION", "4")]),
        RawRow::from_pairs([("DURATION", "4"), ("OFFER_VIEWED_AT", "not a time")]),
    ];
    let offers = normalize_all(&rows);
    let counts = top_value_counts(&offers, OfferFilter::VIEWED, Field::Duration, 10).unwrap();
    assert_eq!(counts.len(), 2);
    assert_eq!((counts[0].value.to_string(), counts[0].count), ("8".to_string(), 2));
    assert_eq!((counts[1].value.to_string(), counts[1].count), ("4".to_string(), 1));
}

#[test]
fn verified_and_ncns_ranking_by_month() {
    fn event(workplace: &str, start: &str, flag: &str, value: &str) -> RawRow {
        RawRow::from_pairs([
            ("WORKPLACE_ID", workplace),
            ("SHIFT_START_AT", start),
            (flag, value),
        ])
    }
    let rows = vec![
        event("A", "2024-02-01", "IS_VERIFIED", "True"),
        event("B", "2024-02-03", "IS_VERIFIED", "True"),
        event("B", "2024-02-09", "IS_VERIFIED", "1"),
        event("B", "2024-02-09", "IS_VERIFIED", "False"),
        event("A", "2024-03-09", "IS_NCNS", "True"),
    ];
    let offers = normalize_all(&rows);
    let config = QueryConfig::default().with_period(Period::Month);

    let verified = count_events(&offers, FlagField::Verified, &config).unwrap();
    let got: Vec<_> = verified
        .iter()
        .map(|r| (r.workplace_id.as_deref(), r.bucket, r.count))
        .collect();
    assert_eq!(got, vec![(Some("B"), 2, 2), (Some("A"), 2, 1)]);

    let ncns = count_events(&offers, FlagField::Ncns, &config).unwrap();
    assert_eq!(ncns.len(), 1);
    assert_eq!(ncns[0].bucket, 3);
}

#[test]
fn query_objects_are_rerunnable() {
    let offers = normalize_all(&w1_rows());
    let query = Query::TopByMetric(QueryConfig::default().with_period(Period::Month));
    let first = query.run(&offers).unwrap();
    let second = query.run(&offers).unwrap();
    assert_eq!(first, second);
    assert!(matches!(first, Table::MetricRanks(ref rows) if rows.len() == 1));

    let bad = Query::CountEvents {
        flag: FlagField::Ncns,
        config: QueryConfig::default().with_top_n(0),
    };
    assert!(matches!(bad.run(&offers), Err(ConfigError::InvalidTopN { .. })));
}
