//! Analysis modules.
//!
//! Everything the dashboard displays as a derived figure is computed here.

pub mod aggregator;

pub use aggregator::*;
