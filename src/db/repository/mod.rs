//! Repository layer: table-scoped database operations.
//!
//! One sub-module per table, plus eager hierarchy loading and the
//! integrity checker. All public functions are re-exported here.

mod concept;
mod cycle_drug;
mod cycle_drug_day;
mod cycle_reference;
mod drug_context;
mod hierarchy;
mod integrity;
mod regimen_context;
mod regimen_multiples;
mod regimen_part;
mod regimen_reference;

pub use concept::*;
pub use cycle_drug::*;
pub use cycle_drug_day::*;
pub use cycle_reference::*;
pub use drug_context::*;
pub use hierarchy::*;
pub use integrity::*;
pub use regimen_context::*;
pub use regimen_multiples::*;
pub use regimen_part::*;
pub use regimen_reference::*;
