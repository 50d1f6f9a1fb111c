use std::collections::BTreeMap;

use serde::Serialize;

use crate::data::aggregate::{
    aggregate, summary_metrics, AggregateSpec, AggregateTable, SummaryMetrics, YearHighlights,
};
use crate::data::filter::{filter, FilterCriteria, FilteredView};
use crate::data::model::{
    CategoricalSummary, CategoryValue, Dataset, Dimension, NumericColumn, PriceRange,
};
use crate::data::stats::{describe, describe_by, ColumnSummary, GroupDistribution};

/// Columns the presentation layer offers a selector for.
pub const FILTER_DIMENSIONS: [Dimension; 5] = [
    Dimension::Brand,
    Dimension::FuelType,
    Dimension::Transmission,
    Dimension::Condition,
    Dimension::Year,
];

// ---------------------------------------------------------------------------
// Panel payloads handed to the presentation layer
// ---------------------------------------------------------------------------

/// What the selection widgets are populated with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOptions {
    /// Sorted distinct values per selector; "no filter" is implicit.
    pub choices: BTreeMap<Dimension, Vec<CategoryValue>>,
    /// Bounds of the price range control.
    pub price_range: Option<PriceRange>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionPanel {
    pub summary: Vec<ColumnSummary>,
    /// Distinct-value counts over the whole dataset, not the filtered view.
    pub categorical: Vec<CategoricalSummary>,
}

/// Brand, condition and fuel-type analysis share one shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryPanel {
    pub price: AggregateTable,
    pub usage: AggregateTable,
    pub mileage_distribution: Vec<GroupDistribution>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearPanel {
    pub table: AggregateTable,
    pub highlights: YearHighlights,
    pub price_distribution: Vec<GroupDistribution>,
}

/// Everything one interaction needs, computed in a single pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub criteria: FilterCriteria,
    pub metrics: SummaryMetrics,
    pub distributions: DistributionPanel,
    pub brand: CategoryPanel,
    pub condition: CategoryPanel,
    pub fuel_type: CategoryPanel,
    pub year: YearPanel,
}

// ---------------------------------------------------------------------------
// Dashboard state
// ---------------------------------------------------------------------------

/// Loaded dataset plus the criteria of the latest interaction.
///
/// Nothing derived is cached: every query filters the dataset afresh.
pub struct DashboardState {
    dataset: Dataset,
    criteria: FilterCriteria,
}

impl DashboardState {
    /// Ingest a newly loaded dataset with filters reset.
    pub fn new(dataset: Dataset) -> Self {
        let criteria = FilterCriteria::unfiltered(&dataset);
        DashboardState { dataset, criteria }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// Replace the criteria wholesale; there are no partial updates.
    pub fn set_criteria(&mut self, criteria: FilterCriteria) {
        if !criteria.has_valid_price_range() {
            log::debug!("criteria with empty price range accepted: {criteria:?}");
        }
        self.criteria = criteria;
    }

    pub fn reset_filters(&mut self) {
        self.criteria = FilterCriteria::unfiltered(&self.dataset);
    }

    pub fn filter_options(&self) -> FilterOptions {
        FilterOptions {
            choices: FILTER_DIMENSIONS
                .into_iter()
                .map(|d| (d, self.dataset.distinct_values(d).iter().cloned().collect()))
                .collect(),
            price_range: self.dataset.price_range(),
        }
    }

    /// Records passing the current criteria.
    pub fn view(&self) -> FilteredView<'_> {
        filter(&self.dataset, &self.criteria)
    }

    /// Recompute every panel for the current criteria.
    pub fn snapshot(&self) -> DashboardSnapshot {
        let view = self.view();
        log::debug!(
            "{} of {} listings pass the current filters",
            view.len(),
            self.dataset.len()
        );

        let year_table = aggregate(&view, &AggregateSpec::yearly()).rounded(1);
        let highlights = YearHighlights::from_table(&year_table);

        DashboardSnapshot {
            criteria: self.criteria.clone(),
            metrics: summary_metrics(&view),
            distributions: DistributionPanel {
                summary: describe(&view, &NumericColumn::ALL),
                categorical: self.dataset.categorical_summary(),
            },
            brand: category_panel(&view, Dimension::Brand, 1),
            condition: category_panel(&view, Dimension::Condition, 3),
            fuel_type: category_panel(&view, Dimension::FuelType, 3),
            year: YearPanel {
                table: year_table,
                highlights,
                price_distribution: describe_by(&view, Dimension::Year, NumericColumn::Price),
            },
        }
    }
}

fn category_panel(view: &FilteredView<'_>, dimension: Dimension, decimals: u32) -> CategoryPanel {
    CategoryPanel {
        price: aggregate(view, &AggregateSpec::price_by(dimension)).rounded(decimals),
        usage: aggregate(view, &AggregateSpec::usage_by(dimension)).rounded(decimals),
        mileage_distribution: describe_by(view, dimension, NumericColumn::Mileage),
    }
}
