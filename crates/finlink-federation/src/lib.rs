//! Orders providers, dispatches them, merges comprehensive-coverage
//! payloads, and short-circuits on completeness.

mod dispatch;
mod merge;

pub use dispatch::federate;
pub use merge::{is_complete, merge_finance_data};
