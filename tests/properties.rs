//! Property checks for normalization and ranking.

use proptest::prelude::*;
use shift_report::query::{count_events, top_by_metric, top_value_counts};
use shift_report::{
    normalize, normalize_all, Field, FlagField, OfferFilter, Period, QueryConfig, RawRow,
};

fn cell() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some(String::new())),
        any::<String>().prop_map(Some),
        (-1.0e6f64..1.0e6).prop_map(|v| Some(v.to_string())),
        (2020i32..2026, 1u32..13, 1u32..29, 0u32..24)
            .prop_map(|(y, m, d, h)| Some(format!("{y:04}-{m:02}-{d:02} {h:02}:15:00"))),
        prop::sample::select(vec!["True", "False", "0", "1", "nan", "yes"])
            .prop_map(|s| Some(s.to_string())),
    ]
}

prop_compose! {
    fn raw_row()(
        ids in prop::collection::vec(cell(), 4),
        times in prop::collection::vec(cell(), 6),
        nums in prop::collection::vec(cell(), 3),
        flags in prop::collection::vec(cell(), 2),
    ) -> RawRow {
        RawRow {
            shift_id: ids[0].clone(),
            worker_id: ids[1].clone(),
            workplace_id: ids[2].clone(),
            slot: ids[3].clone(),
            shift_start_at: times[0].clone(),
            shift_created_at: times[1].clone(),
            offer_viewed_at: times[2].clone(),
            claimed_at: times[3].clone(),
            canceled_at: times[4].clone(),
            deleted_at: times[5].clone(),
            pay_rate: nums[0].clone(),
            charge_rate: nums[1].clone(),
            duration: nums[2].clone(),
            is_verified: flags[0].clone(),
            is_ncns: flags[1].clone(),
        }
    }
}

fn workplace_row() -> impl Strategy<Value = RawRow> {
    (
        prop::sample::select(vec!["W1", "W2", "W3", "W4"]),
        prop::option::of(0u32..100),
        1u32..29,
        1u32..13,
    )
        .prop_map(|(w, charge, day, month)| RawRow {
            workplace_id: Some(w.to_string()),
            is_ncns: Some(if charge.is_some_and(|c| c % 3 == 0) { "1" } else { "0" }.to_string()),
            charge_rate: charge.map(|c| c.to_string()),
            duration: Some("1".to_string()),
            shift_start_at: Some(format!("2024-{month:02}-{day:02}")),
            ..RawRow::default()
        })
}

proptest! {
    #[test]
    fn normalize_never_panics_and_keeps_numbers_finite(raw in raw_row()) {
        let offer = normalize(&raw);
        for v in [offer.pay_rate, offer.charge_rate, offer.duration] {
            prop_assert!(v.map_or(true, f64::is_finite));
        }
    }

    #[test]
    fn margin_identity_holds(raw in raw_row()) {
        let offer = normalize(&raw);
        match (offer.total_charge_rate, offer.total_pay_rate) {
            (Some(charge), Some(pay)) if (charge - pay).is_finite() => {
                prop_assert_eq!(offer.total_change_of_rate, Some(charge - pay));
            }
            _ => prop_assert_eq!(offer.total_change_of_rate, None),
        }
    }

    #[test]
    fn renormalizing_is_idempotent(raw in raw_row()) {
        let once = normalize(&raw);
        let twice = normalize(&RawRow::from(&once));
        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(once.clone().with_derived_fields(), once);
    }

    #[test]
    fn rankings_are_deterministic(
        rows in prop::collection::vec(workplace_row(), 0..60),
        n in 1usize..8,
    ) {
        let offers = normalize_all(&rows);
        for period in Period::ALL {
            let config = QueryConfig::default().with_period(period).with_top_n(n);
            let first = top_by_metric(&offers, &config).unwrap();
            let second = top_by_metric(&offers, &config).unwrap();
            prop_assert!(first.len() <= n);
            prop_assert!(first.windows(2).all(|w| w[0].total >= w[1].total));
            prop_assert_eq!(first, second);

            let first = count_events(&offers, FlagField::Ncns, &config).unwrap();
            let second = count_events(&offers, FlagField::Ncns, &config).unwrap();
            prop_assert!(first.len() <= n);
            prop_assert!(first.windows(2).all(|w| w[0].count >= w[1].count));
            prop_assert_eq!(first, second);
        }

        let first = top_value_counts(&offers, OfferFilter::All, Field::WorkplaceId, n).unwrap();
        let second = top_value_counts(&offers, OfferFilter::All, Field::WorkplaceId, n).unwrap();
        prop_assert!(first.len() <= n);
        prop_assert!(first.windows(2).all(|w| w[0].count >= w[1].count));
        prop_assert_eq!(first, second);
    }
}
