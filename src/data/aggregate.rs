use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::Serialize;

use super::model::{CategoryValue, Dimension, NumericColumn, Record};
use super::stats::{column_mean, round_to};
use crate::format;

// ---------------------------------------------------------------------------
// Table layout: grouping column, requested means, row order
// ---------------------------------------------------------------------------

/// A per-group statistic a table can be ordered or searched by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Count,
    Mean(NumericColumn),
}

/// How the rows of an [`AggregateTable`] are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowOrder {
    /// Largest first; undefined values last; ties keep first-seen order.
    Descending(Metric),
    /// By group key, smallest first.
    KeyAscending,
}

/// What to compute for one grouped table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateSpec {
    pub dimension: Dimension,
    /// Columns to average per group. Count is always computed.
    pub means: Vec<NumericColumn>,
    pub order: RowOrder,
}

impl AggregateSpec {
    /// Counts only, keys ascending.
    pub fn new(dimension: Dimension) -> Self {
        AggregateSpec {
            dimension,
            means: Vec::new(),
            order: RowOrder::KeyAscending,
        }
    }

    pub fn with_mean(mut self, column: NumericColumn) -> Self {
        if !self.means.contains(&column) {
            self.means.push(column);
        }
        self
    }

    pub fn ordered_by(mut self, order: RowOrder) -> Self {
        self.order = order;
        self
    }

    /// Count and mean price per group, most expensive group first.
    pub fn price_by(dimension: Dimension) -> Self {
        AggregateSpec::new(dimension)
            .with_mean(NumericColumn::Price)
            .ordered_by(RowOrder::Descending(Metric::Mean(NumericColumn::Price)))
    }

    /// Mean mileage and engine size per group, keys ascending.
    pub fn usage_by(dimension: Dimension) -> Self {
        AggregateSpec::new(dimension)
            .with_mean(NumericColumn::Mileage)
            .with_mean(NumericColumn::EngineSize)
    }

    /// Count and mean price per year as a time series.
    pub fn yearly() -> Self {
        AggregateSpec::new(Dimension::Year).with_mean(NumericColumn::Price)
    }
}

// ---------------------------------------------------------------------------
// AggregateTable
// ---------------------------------------------------------------------------

/// Statistics of one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub key: CategoryValue,
    pub count: usize,
    /// Requested means; `None` when the group has no non-null value.
    pub means: BTreeMap<NumericColumn, Option<f64>>,
}

impl AggregateRow {
    /// Mean of `column`, `None` if undefined or not requested.
    pub fn mean(&self, column: NumericColumn) -> Option<f64> {
        self.means.get(&column).copied().flatten()
    }

    pub fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Count => Some(self.count as f64),
            Metric::Mean(column) => self.mean(column),
        }
    }
}

/// Grouped statistics keyed by one categorical dimension.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateTable {
    pub dimension: Dimension,
    pub rows: Vec<AggregateRow>,
}

impl AggregateTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, key: &CategoryValue) -> Option<&AggregateRow> {
        self.rows.iter().find(|row| &row.key == key)
    }

    /// Sum of group counts.
    pub fn total_count(&self) -> usize {
        self.rows.iter().map(|row| row.count).sum()
    }

    /// Copy with every mean rounded to `decimals` places.
    pub fn rounded(&self, decimals: u32) -> Self {
        let rows = self
            .rows
            .iter()
            .map(|row| AggregateRow {
                key: row.key.clone(),
                count: row.count,
                means: row
                    .means
                    .iter()
                    .map(|(&col, v)| (col, v.map(|v| round_to(v, decimals))))
                    .collect(),
            })
            .collect();
        AggregateTable {
            dimension: self.dimension,
            rows,
        }
    }

    /// First row holding the largest defined value of `metric`.
    pub fn max_by(&self, metric: Metric) -> Option<&AggregateRow> {
        self.first_extreme(metric, Ordering::Greater)
    }

    /// First row holding the smallest defined value of `metric`.
    pub fn min_by(&self, metric: Metric) -> Option<&AggregateRow> {
        self.first_extreme(metric, Ordering::Less)
    }

    fn first_extreme(&self, metric: Metric, wanted: Ordering) -> Option<&AggregateRow> {
        let mut best: Option<(&AggregateRow, f64)> = None;
        for row in &self.rows {
            let Some(value) = row.metric(metric) else {
                continue;
            };
            match best {
                Some((_, current)) if value.total_cmp(&current) != wanted => {}
                _ => best = Some((row, value)),
            }
        }
        best.map(|(row, _)| row)
    }
}

struct GroupAcc {
    key: CategoryValue,
    count: usize,
    sums: Vec<(f64, usize)>,
}

/// Group records by `spec.dimension` and compute the requested statistics.
///
/// Records whose group key is null are left out, so the counts sum to the
/// number of records with a key.
pub fn aggregate<'a, I>(records: I, spec: &AggregateSpec) -> AggregateTable
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut groups: Vec<GroupAcc> = Vec::new();
    let mut index: HashMap<CategoryValue, usize> = HashMap::new();

    for record in records {
        let Some(key) = record.category(spec.dimension) else {
            continue;
        };
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            groups.push(GroupAcc {
                key,
                count: 0,
                sums: vec![(0.0, 0); spec.means.len()],
            });
            groups.len() - 1
        });
        let group = &mut groups[slot];
        group.count += 1;
        for ((sum, n), &column) in group.sums.iter_mut().zip(&spec.means) {
            if let Some(v) = record.numeric(column) {
                *sum += v;
                *n += 1;
            }
        }
    }

    let mut rows: Vec<AggregateRow> = groups
        .into_iter()
        .map(|group| AggregateRow {
            key: group.key,
            count: group.count,
            means: spec
                .means
                .iter()
                .zip(group.sums)
                .map(|(&column, (sum, n))| (column, (n > 0).then(|| sum / n as f64)))
                .collect(),
        })
        .collect();

    match spec.order {
        RowOrder::Descending(metric) => rows.sort_by(|a, b| {
            match (a.metric(metric), b.metric(metric)) {
                (Some(x), Some(y)) => y.total_cmp(&x),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        }),
        RowOrder::KeyAscending => rows.sort_by(|a, b| a.key.cmp(&b.key)),
    }

    AggregateTable {
        dimension: spec.dimension,
        rows,
    }
}

// ---------------------------------------------------------------------------
// Superlatives of the per-year table
// ---------------------------------------------------------------------------

/// Extremes of a year table. Ties resolve to the first row in table order,
/// which for [`AggregateSpec::yearly`] is the earliest year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearHighlights {
    pub highest_average_price: Option<AggregateRow>,
    pub most_listings: Option<AggregateRow>,
    pub lowest_average_price: Option<AggregateRow>,
    pub fewest_listings: Option<AggregateRow>,
}

impl YearHighlights {
    pub fn from_table(table: &AggregateTable) -> Self {
        let price = Metric::Mean(NumericColumn::Price);
        YearHighlights {
            highest_average_price: table.max_by(price).cloned(),
            most_listings: table.max_by(Metric::Count).cloned(),
            lowest_average_price: table.min_by(price).cloned(),
            fewest_listings: table.min_by(Metric::Count).cloned(),
        }
    }
}

// ---------------------------------------------------------------------------
// Headline metrics
// ---------------------------------------------------------------------------

/// Scalar reductions shown above every panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryMetrics {
    pub total_count: usize,
    pub average_price: Option<f64>,
    pub average_mileage: Option<f64>,
    pub average_engine_size: Option<f64>,
}

pub fn summary_metrics<'a, I>(records: I) -> SummaryMetrics
where
    I: IntoIterator<Item = &'a Record>,
    I::IntoIter: Clone,
{
    let records = records.into_iter();
    SummaryMetrics {
        total_count: records.clone().count(),
        average_price: column_mean(records.clone(), NumericColumn::Price),
        average_mileage: column_mean(records.clone(), NumericColumn::Mileage),
        average_engine_size: column_mean(records, NumericColumn::EngineSize),
    }
}

impl fmt::Display for SummaryMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Total Cars: {} | Average Price: {} | Average Mileage: {} miles | Average Engine Size: {}",
            format::count(self.total_count),
            format::price(self.average_price),
            format::number(self.average_mileage, 2),
            format::number(self.average_engine_size, 2),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(brand: Option<&str>, year: i64, price: Option<f64>, mileage: Option<f64>) -> Record {
        Record {
            brand: brand.map(str::to_string),
            year: Some(year),
            price,
            mileage,
            ..Record::default()
        }
    }

    fn year_table(counts: &[(i64, usize, f64)]) -> AggregateTable {
        let records: Vec<Record> = counts
            .iter()
            .flat_map(|&(year, n, price)| {
                (0..n).map(move |_| listing(Some("Any"), year, Some(price), None))
            })
            .collect();
        aggregate(&records, &AggregateSpec::yearly())
    }

    #[test]
    fn mean_price_by_brand_sorted_descending() {
        let records = vec![
            listing(Some("Honda"), 2019, Some(15000.0), None),
            listing(Some("Toyota"), 2020, Some(10000.0), None),
            listing(Some("BMW"), 2020, Some(40000.0), None),
            listing(Some("Toyota"), 2020, Some(30000.0), None),
        ];
        let table = aggregate(&records, &AggregateSpec::price_by(Dimension::Brand));
        let keys: Vec<String> = table.rows.iter().map(|r| r.key.to_string()).collect();
        assert_eq!(keys, vec!["BMW", "Toyota", "Honda"]);
        let toyota = table.get(&CategoryValue::from("Toyota")).unwrap();
        assert_eq!(toyota.count, 2);
        assert_eq!(toyota.mean(NumericColumn::Price), Some(20000.0));
    }

    #[test]
    fn descending_ties_keep_first_seen_order_and_undefined_goes_last() {
        let records = vec![
            listing(Some("Kia"), 2019, None, None),
            listing(Some("Seat"), 2019, Some(5000.0), None),
            listing(Some("Fiat"), 2019, Some(5000.0), None),
            listing(Some("Audi"), 2019, Some(9000.0), None),
        ];
        let table = aggregate(&records, &AggregateSpec::price_by(Dimension::Brand));
        let keys: Vec<String> = table.rows.iter().map(|r| r.key.to_string()).collect();
        assert_eq!(keys, vec!["Audi", "Seat", "Fiat", "Kia"]);
        assert_eq!(table.rows[3].mean(NumericColumn::Price), None);
        assert_eq!(table.rows[3].count, 1);
    }

    #[test]
    fn null_keys_are_excluded_from_counts() {
        let records = vec![
            listing(Some("Kia"), 2019, Some(1.0), None),
            listing(None, 2019, Some(2.0), None),
            listing(Some("Kia"), 2020, Some(3.0), None),
        ];
        let table = aggregate(&records, &AggregateSpec::new(Dimension::Brand));
        assert_eq!(table.len(), 1);
        assert_eq!(table.total_count(), 2);
        assert!(table.rows[0].means.is_empty());
    }

    #[test]
    fn usage_table_is_key_ascending_with_per_column_nulls() {
        let records = vec![
            listing(Some("Volvo"), 2019, Some(1.0), Some(1000.0)),
            listing(Some("Audi"), 2019, Some(1.0), None),
        ];
        let table = aggregate(&records, &AggregateSpec::usage_by(Dimension::Brand));
        assert_eq!(table.rows[0].key, CategoryValue::from("Audi"));
        assert_eq!(table.rows[0].mean(NumericColumn::Mileage), None);
        assert_eq!(table.rows[0].means.get(&NumericColumn::Mileage), Some(&None));
        assert_eq!(table.rows[1].mean(NumericColumn::Mileage), Some(1000.0));
        assert_eq!(table.rows[1].mean(NumericColumn::Price), None);
    }

    #[test]
    fn year_table_is_chronological() {
        let table = year_table(&[(2020, 1, 1.0), (2018, 1, 1.0), (2019, 1, 1.0)]);
        let years: Vec<CategoryValue> = table.rows.iter().map(|r| r.key.clone()).collect();
        assert_eq!(
            years,
            vec![
                CategoryValue::from(2018),
                CategoryValue::from(2019),
                CategoryValue::from(2020)
            ]
        );
    }

    #[test]
    fn superlative_ties_resolve_to_first_row_in_table_order() {
        let table = year_table(&[(2019, 5, 200.0), (2020, 3, 100.0), (2018, 5, 200.0)]);
        let highlights = YearHighlights::from_table(&table);

        assert_eq!(highlights.most_listings.unwrap().key, CategoryValue::from(2018));
        assert_eq!(highlights.fewest_listings.unwrap().key, CategoryValue::from(2020));
        assert_eq!(highlights.highest_average_price.unwrap().key, CategoryValue::from(2018));
        assert_eq!(highlights.lowest_average_price.unwrap().key, CategoryValue::from(2020));
    }

    #[test]
    fn superlatives_skip_undefined_means() {
        let records = vec![
            listing(Some("A"), 2018, None, None),
            listing(Some("A"), 2019, Some(7.0), None),
        ];
        let table = aggregate(&records, &AggregateSpec::yearly());
        let highlights = YearHighlights::from_table(&table);
        assert_eq!(highlights.lowest_average_price.unwrap().key, CategoryValue::from(2019));

        let empty = aggregate(&Vec::<Record>::new(), &AggregateSpec::yearly());
        assert_eq!(YearHighlights::from_table(&empty).most_listings, None);
    }

    #[test]
    fn rounding_can_create_ties() {
        let table = year_table(&[(2018, 1, 100.04), (2019, 1, 100.01)]);
        let price = Metric::Mean(NumericColumn::Price);
        assert_eq!(table.max_by(price).unwrap().key, CategoryValue::from(2018));
        let rounded = table.rounded(1);
        assert_eq!(rounded.rows[1].mean(NumericColumn::Price), Some(100.0));
        assert_eq!(
            rounded.max_by(Metric::Mean(NumericColumn::Price)).unwrap().key,
            CategoryValue::from(2018)
        );
    }

    #[test]
    fn summary_metrics_of_empty_view_are_undefined() {
        let metrics = summary_metrics(&Vec::<Record>::new());
        assert_eq!(metrics.total_count, 0);
        assert_eq!(metrics.average_price, None);
        assert_eq!(metrics.average_mileage, None);
        assert_eq!(metrics.average_engine_size, None);
        assert!(metrics.to_string().contains("Average Price: n/a"));
    }

    #[test]
    fn summary_metrics_display() {
        let records = vec![
            listing(Some("A"), 2018, Some(12000.0), Some(1500.0)),
            listing(Some("A"), 2018, Some(13000.5), Some(2500.0)),
        ];
        let metrics = summary_metrics(&records);
        assert_eq!(
            metrics.to_string(),
            "Total Cars: 2 | Average Price: $12,500.25 | Average Mileage: 2,000.00 miles | Average Engine Size: n/a"
        );
    }
}
