use std::collections::BTreeMap;

use serde::Serialize;

use super::model::{CategoryValue, Dimension, NumericColumn, Record};

// ---------------------------------------------------------------------------
// Scalar reductions
// ---------------------------------------------------------------------------

/// Arithmetic mean, `None` for an empty input.
pub fn mean<I: IntoIterator<Item = f64>>(values: I) -> Option<f64> {
    let (sum, n) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Mean of a numeric column over the records where it is non-null.
pub fn column_mean<'a, I>(records: I, column: NumericColumn) -> Option<f64>
where
    I: IntoIterator<Item = &'a Record>,
{
    mean(records.into_iter().filter_map(|r| r.numeric(column)))
}

/// Round to `decimals` places, ties to even.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round_ties_even() / factor
}

/// Linear-interpolation percentile of already sorted values; `p` in [0, 1].
fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let idx = p * (sorted.len() - 1) as f64;
    let lo = idx.floor() as usize;
    let hi = idx.ceil() as usize;
    if lo == hi {
        Some(sorted[lo])
    } else {
        let frac = idx - lo as f64;
        Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
    }
}

// ---------------------------------------------------------------------------
// describe()
// ---------------------------------------------------------------------------

/// Summary statistics of one numeric column. Every statistic except
/// `count` is `None` when it is undefined for the number of values seen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub column: NumericColumn,
    pub count: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation (N - 1 denominator).
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub p25: Option<f64>,
    pub p50: Option<f64>,
    pub p75: Option<f64>,
    pub max: Option<f64>,
}

impl ColumnSummary {
    /// Summarize the given values, which must already exclude nulls.
    pub fn from_values(column: NumericColumn, mut values: Vec<f64>) -> Self {
        values.sort_by(|a, b| a.total_cmp(b));
        let count = values.len();
        let mean = mean(values.iter().copied());
        let std = mean.filter(|_| count > 1).map(|m| {
            let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
            (ss / (count - 1) as f64).sqrt()
        });

        ColumnSummary {
            column,
            count,
            mean,
            std,
            min: values.first().copied(),
            p25: percentile(&values, 0.25),
            p50: percentile(&values, 0.50),
            p75: percentile(&values, 0.75),
            max: values.last().copied(),
        }
    }
}

/// Per-column summary statistics over the non-null values of each column.
pub fn describe<'a, I>(records: I, columns: &[NumericColumn]) -> Vec<ColumnSummary>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut values: Vec<Vec<f64>> = vec![Vec::new(); columns.len()];
    for record in records {
        for (bucket, &column) in values.iter_mut().zip(columns) {
            if let Some(v) = record.numeric(column) {
                bucket.push(v);
            }
        }
    }
    columns
        .iter()
        .zip(values)
        .map(|(&column, vals)| ColumnSummary::from_values(column, vals))
        .collect()
}

/// Summary of one numeric column within one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupDistribution {
    pub key: CategoryValue,
    pub summary: ColumnSummary,
}

/// `describe` of `column` for each value of `dimension`, keys ascending.
/// Records with a null key are left out.
pub fn describe_by<'a, I>(
    records: I,
    dimension: Dimension,
    column: NumericColumn,
) -> Vec<GroupDistribution>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut groups: BTreeMap<CategoryValue, Vec<f64>> = BTreeMap::new();
    for record in records {
        let Some(key) = record.category(dimension) else {
            continue;
        };
        let bucket = groups.entry(key).or_default();
        if let Some(v) = record.numeric(column) {
            bucket.push(v);
        }
    }
    groups
        .into_iter()
        .map(|(key, vals)| GroupDistribution {
            key,
            summary: ColumnSummary::from_values(column, vals),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn priced(price: Option<f64>, mileage: Option<f64>) -> Record {
        Record {
            price,
            mileage,
            ..Record::default()
        }
    }

    #[test]
    fn mean_of_nothing_is_undefined() {
        assert_eq!(mean(std::iter::empty()), None);
        assert_eq!(mean([2.0, 4.0]), Some(3.0));
    }

    #[test]
    fn describe_matches_reference_values() {
        let records: Vec<Record> = [1.0, 2.0, 3.0, 4.0]
            .into_iter()
            .map(|p| priced(Some(p), None))
            .collect();
        let summary = &describe(&records, &[NumericColumn::Price])[0];

        assert_eq!(summary.count, 4);
        assert_eq!(summary.mean, Some(2.5));
        let std = summary.std.unwrap();
        assert!((std - 1.2909944487358056).abs() < 1e-12);
        assert_eq!(summary.min, Some(1.0));
        assert_eq!(summary.p25, Some(1.75));
        assert_eq!(summary.p50, Some(2.5));
        assert_eq!(summary.p75, Some(3.25));
        assert_eq!(summary.max, Some(4.0));
    }

    #[test]
    fn describe_skips_nulls_per_column() {
        let records = vec![
            priced(Some(10.0), None),
            priced(None, Some(5.0)),
            priced(Some(30.0), Some(7.0)),
        ];
        let out = describe(&records, &[NumericColumn::Price, NumericColumn::Mileage]);
        assert_eq!(out[0].count, 2);
        assert_eq!(out[0].mean, Some(20.0));
        assert_eq!(out[1].count, 2);
        assert_eq!(out[1].mean, Some(6.0));
    }

    #[test]
    fn describe_empty_is_all_undefined() {
        let records: Vec<Record> = Vec::new();
        for summary in describe(&records, &NumericColumn::ALL) {
            assert_eq!(summary.count, 0);
            assert_eq!(summary.mean, None);
            assert_eq!(summary.std, None);
            assert_eq!(summary.min, None);
            assert_eq!(summary.p25, None);
            assert_eq!(summary.p50, None);
            assert_eq!(summary.p75, None);
            assert_eq!(summary.max, None);
        }
    }

    #[test]
    fn single_value_has_no_sample_std() {
        let records = vec![priced(Some(42.0), None)];
        let summary = &describe(&records, &[NumericColumn::Price])[0];
        assert_eq!(summary.std, None);
        assert_eq!(summary.p75, Some(42.0));
    }

    #[test]
    fn describe_by_groups_in_key_order_and_drops_null_keys() {
        let mut a = priced(Some(1.0), Some(100.0));
        a.brand = Some("Volvo".into());
        let mut b = priced(Some(2.0), Some(300.0));
        b.brand = Some("Audi".into());
        let mut c = priced(Some(3.0), Some(200.0));
        c.brand = Some("Volvo".into());
        let orphan = priced(Some(4.0), Some(900.0));

        let groups = describe_by(&[a, b, c, orphan], Dimension::Brand, NumericColumn::Mileage);
        let keys: Vec<String> = groups.iter().map(|g| g.key.to_string()).collect();
        assert_eq!(keys, vec!["Audi", "Volvo"]);
        assert_eq!(groups[1].summary.count, 2);
        assert_eq!(groups[1].summary.p50, Some(150.0));
    }

    #[test]
    fn rounding_ties_go_to_even() {
        assert_eq!(round_to(2.25, 1), 2.2);
        assert_eq!(round_to(15000.04, 1), 15000.0);
        assert_eq!(round_to(1.0 / 3.0, 3), 0.333);
    }
}
