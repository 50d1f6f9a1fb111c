use std::borrow::Borrow;

use serde::{Deserialize, Serialize};

use super::model::{Dataset, Record};

// ---------------------------------------------------------------------------
// Filter predicate: one selection per categorical column plus a price range
// ---------------------------------------------------------------------------

/// Equality-or-"no filter" choice for one categorical column.
///
/// Serialized as an optional value: `null` means no filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "Option<T>",
    into = "Option<T>",
    bound(serialize = "T: Serialize", deserialize = "T: Deserialize<'de>")
)]
pub enum Selection<T: Clone> {
    #[default]
    Any,
    Only(T),
}

impl<T: Clone> Selection<T> {
    pub fn only(value: impl Into<T>) -> Self {
        Selection::Only(value.into())
    }

    /// Whether a record field passes this selection. A null field never
    /// matches an active selection.
    pub fn admits<U>(&self, value: Option<&U>) -> bool
    where
        T: Borrow<U>,
        U: PartialEq + ?Sized,
    {
        match self {
            Selection::Any => true,
            Selection::Only(wanted) => value.is_some_and(|v| wanted.borrow() == v),
        }
    }
}

impl<T: Clone> From<Option<T>> for Selection<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Selection::Any, Selection::Only)
    }
}

impl<T: Clone> From<Selection<T>> for Option<T> {
    fn from(selection: Selection<T>) -> Self {
        match selection {
            Selection::Any => None,
            Selection::Only(v) => Some(v),
        }
    }
}

/// The full set of user constraints, supplied afresh on every interaction.
///
/// The price range is always applied: a record without a price never
/// passes. Inverted or NaN bounds are not rejected; they simply match
/// nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub brand: Selection<String>,
    pub fuel_type: Selection<String>,
    pub transmission: Selection<String>,
    pub condition: Selection<String>,
    pub year: Selection<i64>,
    /// Inclusive lower price bound.
    pub price_min: f64,
    /// Inclusive upper price bound.
    pub price_max: f64,
}

impl FilterCriteria {
    /// Criteria that keep every priced record: no categorical filter and the
    /// price range at the dataset's observed bounds.
    pub fn unfiltered(dataset: &Dataset) -> Self {
        let (price_min, price_max) = dataset
            .price_range()
            .map_or((f64::MIN, f64::MAX), |r| (r.min, r.max));
        FilterCriteria {
            brand: Selection::Any,
            fuel_type: Selection::Any,
            transmission: Selection::Any,
            condition: Selection::Any,
            year: Selection::Any,
            price_min,
            price_max,
        }
    }

    /// `price_min <= price_max` with neither bound NaN.
    pub fn has_valid_price_range(&self) -> bool {
        self.price_min <= self.price_max
    }

    /// Whether a single record satisfies every active predicate.
    pub fn matches(&self, record: &Record) -> bool {
        self.brand.admits(record.brand.as_deref())
            && self.fuel_type.admits(record.fuel_type.as_deref())
            && self.transmission.admits(record.transmission.as_deref())
            && self.condition.admits(record.condition.as_deref())
            && self.year.admits(record.year.as_ref())
            && record
                .price
                .is_some_and(|p| self.price_min <= p && p <= self.price_max)
    }
}

// ---------------------------------------------------------------------------
// FilteredView – the records passing the current criteria
// ---------------------------------------------------------------------------

/// Borrowed, order-preserving subset of a dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredView<'a> {
    records: Vec<&'a Record>,
}

impl<'a> FilteredView<'a> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[&'a Record] {
        &self.records
    }

    pub fn iter(&self) -> std::iter::Copied<std::slice::Iter<'_, &'a Record>> {
        self.records.iter().copied()
    }
}

impl<'a> FromIterator<&'a Record> for FilteredView<'a> {
    fn from_iter<I: IntoIterator<Item = &'a Record>>(iter: I) -> Self {
        FilteredView {
            records: iter.into_iter().collect(),
        }
    }
}

impl<'a, 'v> IntoIterator for &'v FilteredView<'a> {
    type Item = &'a Record;
    type IntoIter = std::iter::Copied<std::slice::Iter<'v, &'a Record>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Return the records that pass all active filters, in input order.
///
/// `records` is usually `&Dataset`, but a `&FilteredView` works too, which
/// makes re-filtering a view a no-op for the same criteria.
pub fn filter<'a, I>(records: I, criteria: &FilterCriteria) -> FilteredView<'a>
where
    I: IntoIterator<Item = &'a Record>,
{
    if !criteria.has_valid_price_range() {
        log::debug!(
            "price range [{}, {}] is empty or undefined; no records match",
            criteria.price_min,
            criteria.price_max
        );
    }
    records
        .into_iter()
        .filter(|record| criteria.matches(record))
        .collect()
}
