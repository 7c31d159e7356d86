//! Specification documents used by the unit tests.
//!
//! Each constant holds the YAML text of one specification file.

mod batch;
mod edge_cases;
mod strcpy;

pub use batch::BATCH;
pub use edge_cases::{FRAGMENTED_QUERY, MALFORMED, MIXED, MIXED_POSITIVES, SPARSE};
pub use strcpy::{STRCPY, STRCPY_NEGATIVE, STRCPY_POSITIVE};
