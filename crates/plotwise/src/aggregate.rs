// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

use crate::dataset::{Column, Dataset};
use crate::error::{DataError, DataResult};
use indexmap::IndexMap;
use std::cmp::Ordering;

/// Groups `dataset` on `group_by`, sums `summed` per group and keeps the
/// `top_n` largest sums in descending order.
///
/// Rows with a missing key are dropped; missing or non-numeric values add
/// nothing to their group. Equal sums keep first-appearance order. The
/// result has two columns named after the source columns.
pub fn top_n_sum(
    dataset: &Dataset,
    group_by: &str,
    summed: &str,
    top_n: usize,
) -> DataResult<Dataset> {
    let keys = dataset
        .column(group_by)
        .ok_or_else(|| DataError::ColumnNotFound {
            column: group_by.to_string(),
        })?;
    let values = dataset
        .column(summed)
        .ok_or_else(|| DataError::ColumnNotFound {
            column: summed.to_string(),
        })?;

    let mut totals: IndexMap<String, f64> = IndexMap::new();
    for row in 0..dataset.row_count() {
        let Some(key) = keys.display_at(row) else {
            continue;
        };
        let total = totals.entry(key).or_insert(0.0);
        if let Some(value) = values.number_at(row) {
            *total += value;
        }
    }

    let mut groups: Vec<(String, f64)> = totals.into_iter().collect();
    groups.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    groups.truncate(top_n);

    let (labels, sums): (Vec<_>, Vec<_>) = groups
        .into_iter()
        .map(|(label, sum)| (Some(label), Some(sum)))
        .unzip();
    Dataset::new(vec![
        Column::texts(group_by, labels),
        Column::numbers(summed, sums),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn dataset(pairs: &[(Option<&str>, Option<f64>)]) -> Dataset {
        Dataset::new(vec![
            Column::texts(
                "region",
                pairs.iter().map(|(k, _)| k.map(str::to_string)).collect(),
            ),
            Column::numbers("sales", pairs.iter().map(|(_, v)| *v).collect()),
        ])
        .unwrap()
    }

    #[test]
    fn sums_sorts_and_truncates() {
        let ds = dataset(&[
            (Some("a"), Some(1.0)),
            (Some("b"), Some(5.0)),
            (Some("a"), Some(2.0)),
            (Some("c"), Some(4.0)),
        ]);
        let agg = top_n_sum(&ds, "region", "sales", 2).unwrap();
        assert_eq!(agg.column_names(), vec!["region", "sales"]);
        assert_eq!(
            agg.column("region").unwrap().as_texts().unwrap(),
            &[Some("b".to_string()), Some("c".to_string())]
        );
        assert_eq!(
            agg.column("sales").unwrap().as_numbers().unwrap(),
            &[Some(5.0), Some(4.0)]
        );
    }

    #[test]
    fn missing_keys_dropped_and_missing_values_ignored() {
        let ds = dataset(&[
            (None, Some(100.0)),
            (Some("x"), None),
            (Some("y"), Some(1.0)),
            (Some("x"), Some(f64::NAN)),
        ]);
        let agg = top_n_sum(&ds, "region", "sales", 10).unwrap();
        assert_eq!(agg.row_count(), 2);
        assert_eq!(
            agg.column("region").unwrap().as_texts().unwrap(),
            &[Some("y".to_string()), Some("x".to_string())]
        );
        assert_eq!(
            agg.column("sales").unwrap().as_numbers().unwrap(),
            &[Some(1.0), Some(0.0)]
        );
    }

    #[test]
    fn ties_keep_first_appearance() {
        let ds = dataset(&[
            (Some("late"), Some(3.0)),
            (Some("early"), Some(3.0)),
            (Some("late"), Some(0.0)),
        ]);
        let agg = top_n_sum(&ds, "region", "sales", 10).unwrap();
        assert_eq!(
            agg.column("region").unwrap().as_texts().unwrap(),
            &[Some("late".to_string()), Some("early".to_string())]
        );
    }

    #[test]
    fn unknown_column_is_an_error() {
        let ds = dataset(&[(Some("a"), Some(1.0))]);
        assert!(matches!(
            top_n_sum(&ds, "nope", "sales", 10),
            Err(DataError::ColumnNotFound { .. })
        ));
    }

    proptest! {
        #[test]
        fn output_is_sorted_bounded_and_totals_match(
            pairs in prop::collection::vec((0u8..6, -1000i32..1000), 0..80),
            top_n in 1usize..12,
        ) {
            let keys: Vec<String> = pairs.iter().map(|(k, _)| format!("k{k}")).collect();
            let ds = Dataset::new(vec![
                Column::texts("key", keys.iter().cloned().map(Some).collect()),
                Column::numbers("value", pairs.iter().map(|(_, v)| Some(f64::from(*v))).collect()),
            ]).unwrap();
            let agg = top_n_sum(&ds, "key", "value", top_n).unwrap();

            let mut distinct = keys.clone();
            distinct.sort();
            distinct.dedup();
            prop_assert_eq!(agg.row_count(), distinct.len().min(top_n));

            let sums = agg.column("value").unwrap().as_numbers().unwrap();
            prop_assert!(sums.windows(2).all(|w| w[0] >= w[1]));

            let labels = agg.column("key").unwrap().as_texts().unwrap();
            for (label, sum) in labels.iter().zip(sums) {
                let label = label.as_deref().unwrap();
                let expected: f64 = pairs
                    .iter()
                    .filter(|(k, _)| format!("k{k}") == label)
                    .map(|(_, v)| f64::from(*v))
                    .sum();
                prop_assert_eq!(sum.unwrap(), expected);
            }
        }
    }
}
