//! Filter-and-aggregate core of a used-car listings dashboard.
//!
//! A [`data::Dataset`] is loaded once; every user interaction supplies a
//! [`data::FilterCriteria`] and gets back freshly computed views, grouped
//! tables and summary statistics. Rendering is left to the caller.

pub mod data;
pub mod format;
pub mod state;
