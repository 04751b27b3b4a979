//! Dataset Module - Bulk NSL-KDD input
//!
//! Headerless delimited rows, 43 positional fields each. Malformed rows are
//! rejected one by one; they never abort the load.

pub mod record;
pub mod reader;

#[cfg(test)]
mod tests;

pub use record::{RawField, RawRecord, RejectedRecord};
pub use reader::{read_from, read_path, BulkRead};
