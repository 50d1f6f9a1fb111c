use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CategoryValue – a single cell of a categorical column
// ---------------------------------------------------------------------------

/// The value a record holds in one of the categorical dimensions.
///
/// Text columns (brand, condition, ...) hold `Text`; `year` is an integer
/// category. Nulls are not a variant: a missing cell is `None` at the
/// [`Record`] level.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryValue {
    Integer(i64),
    Text(String),
}

impl fmt::Display for CategoryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryValue::Integer(i) => write!(f, "{i}"),
            CategoryValue::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for CategoryValue {
    fn from(s: &str) -> Self {
        CategoryValue::Text(s.to_string())
    }
}

impl From<i64> for CategoryValue {
    fn from(i: i64) -> Self {
        CategoryValue::Integer(i)
    }
}

// ---------------------------------------------------------------------------
// Column vocabularies
// ---------------------------------------------------------------------------

/// A categorical column a dataset can be filtered or grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Brand,
    Model,
    Year,
    Transmission,
    FuelType,
    Condition,
}

impl Dimension {
    pub const ALL: [Dimension; 6] = [
        Dimension::Brand,
        Dimension::Model,
        Dimension::Year,
        Dimension::Transmission,
        Dimension::FuelType,
        Dimension::Condition,
    ];

    /// Header name in the source file.
    pub fn column_name(self) -> &'static str {
        match self {
            Dimension::Brand => "brand",
            Dimension::Model => "model",
            Dimension::Year => "year",
            Dimension::Transmission => "transmission",
            Dimension::FuelType => "fuel_type",
            Dimension::Condition => "condition",
        }
    }

    /// Whether the column holds free text (everything except `year`).
    pub fn is_text(self) -> bool {
        !matches!(self, Dimension::Year)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// A continuous column that can be averaged or described.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericColumn {
    Price,
    Mileage,
    EngineSize,
}

impl NumericColumn {
    pub const ALL: [NumericColumn; 3] = [
        NumericColumn::Price,
        NumericColumn::Mileage,
        NumericColumn::EngineSize,
    ];

    pub fn column_name(self) -> &'static str {
        match self {
            NumericColumn::Price => "price",
            NumericColumn::Mileage => "mileage",
            NumericColumn::EngineSize => "engine_size",
        }
    }
}

impl fmt::Display for NumericColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

// ---------------------------------------------------------------------------
// Record – one listing
// ---------------------------------------------------------------------------

/// One car listing (one row of the source file).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Record {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<i64>,
    pub price: Option<f64>,
    pub transmission: Option<String>,
    pub mileage: Option<f64>,
    pub fuel_type: Option<String>,
    pub engine_size: Option<f64>,
    pub condition: Option<String>,
}

impl Record {
    /// Value of a categorical column, `None` for a null cell.
    pub fn category(&self, dimension: Dimension) -> Option<CategoryValue> {
        match dimension {
            Dimension::Year => self.year.map(CategoryValue::Integer),
            other => self
                .text(other)
                .map(|s| CategoryValue::Text(s.to_string())),
        }
    }

    /// Borrowed text of a text column; always `None` for `year`.
    pub fn text(&self, dimension: Dimension) -> Option<&str> {
        let field = match dimension {
            Dimension::Brand => &self.brand,
            Dimension::Model => &self.model,
            Dimension::Transmission => &self.transmission,
            Dimension::FuelType => &self.fuel_type,
            Dimension::Condition => &self.condition,
            Dimension::Year => return None,
        };
        field.as_deref()
    }

    pub fn numeric(&self, column: NumericColumn) -> Option<f64> {
        match column {
            NumericColumn::Price => self.price,
            NumericColumn::Mileage => self.mileage,
            NumericColumn::EngineSize => self.engine_size,
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// Observed inclusive price bounds of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

/// Number of distinct values of one text column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoricalSummary {
    pub column: Dimension,
    pub unique_values: usize,
}

/// The full parsed dataset with pre-computed column indices.
///
/// Immutable once built: every query borrows it.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<Record>,
    /// For each categorical column the sorted set of distinct non-null values.
    unique_values: BTreeMap<Dimension, BTreeSet<CategoryValue>>,
    price_range: Option<PriceRange>,
}

impl Dataset {
    /// Build column indices from the loaded records.
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut unique_values: BTreeMap<Dimension, BTreeSet<CategoryValue>> = Dimension::ALL
            .iter()
            .map(|&d| (d, BTreeSet::new()))
            .collect();
        let mut price_range: Option<PriceRange> = None;

        for record in &records {
            for dimension in Dimension::ALL {
                if let Some(value) = record.category(dimension) {
                    unique_values.entry(dimension).or_default().insert(value);
                }
            }
            if let Some(price) = record.price {
                price_range = Some(match price_range {
                    None => PriceRange {
                        min: price,
                        max: price,
                    },
                    Some(r) => PriceRange {
                        min: r.min.min(price),
                        max: r.max.max(price),
                    },
                });
            }
        }

        Dataset {
            records,
            unique_values,
            price_range,
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sorted distinct non-null values of a categorical column.
    pub fn distinct_values(&self, dimension: Dimension) -> &BTreeSet<CategoryValue> {
        &self.unique_values[&dimension]
    }

    /// Observed price bounds, `None` when no record has a price.
    pub fn price_range(&self) -> Option<PriceRange> {
        self.price_range
    }

    /// Distinct-value counts of the text columns, in column order.
    pub fn categorical_summary(&self) -> Vec<CategoricalSummary> {
        Dimension::ALL
            .into_iter()
            .filter(|d| d.is_text())
            .map(|column| CategoricalSummary {
                column,
                unique_values: self.distinct_values(column).len(),
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
