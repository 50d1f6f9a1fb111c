/// Data layer: core types, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset (unparsable numbers → null)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Dataset  │  Vec<Record>, distinct values, price bounds
///   └──────────┘
///        │  + FilterCriteria
///        ▼
///   ┌──────────┐
///   │  filter   │  conjunctive predicates → FilteredView (borrowed)
///   └──────────┘
///        │
///        ▼
///   ┌────────────────────┐
///   │ aggregate / stats   │  grouped means, describe(), headline metrics
///   └────────────────────┘
/// ```

pub mod aggregate;
pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
pub mod stats;

pub use aggregate::{
    aggregate, summary_metrics, AggregateRow, AggregateSpec, AggregateTable, Metric, RowOrder,
    SummaryMetrics, YearHighlights,
};
pub use error::LoadError;
pub use filter::{filter, FilterCriteria, FilteredView, Selection};
pub use loader::load_file;
pub use model::{CategoricalSummary, CategoryValue, Dataset, Dimension, NumericColumn, PriceRange, Record};
pub use stats::{describe, describe_by, ColumnSummary, GroupDistribution};
