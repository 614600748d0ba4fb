//! Descriptive statistics, categorical binning and state-transition analysis.
//!
//! Each step reads the loaded [`Dataset`](crate::reading::Dataset) and
//! produces a serializable result; [`analyzer::analyze`] runs them all.

pub mod aggregate;
pub mod analyzer;
pub mod strength;
pub mod transitions;
pub mod types;
pub mod utility;
