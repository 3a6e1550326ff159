//! # Supply
//! Computes a network's total and circulating supply from its genesis allocation and live chain
//! data, then renders it for publishing.

mod aggregator;
mod error;
mod formula;
pub mod publish;
mod snapshot;

pub use aggregator::{Sources, SupplyAggregator, SupplyInputs};
pub use error::SupplyError;
pub use formula::{Formula, FormulaVariant, Sign, SupplyTerm, SupplyTotals};
pub use snapshot::SupplySnapshot;
