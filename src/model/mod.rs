//! Core data types for dependencies and report rows.
//!
//! - [`DependencyRecord`] - A dependency recovered from the manifest
//! - [`DependencyMap`] - Ordered name to version mapping produced by the lockfile parser
//! - [`AnalysisRow`] - One row of the audit report
//! - [`SecurityFlag`] - Advisory status of a dependency
//!
//! # Example
//!
//! ```
//! use lockaudit::{AnalysisRow, DependencyRecord, SecurityFlag};
//!
//! let record = DependencyRecord::new("lodash", "4.17.20");
//! let row = AnalysisRow::new(&record, "4.17.21", SecurityFlag::Yes);
//!
//! assert_eq!(row.current_version, "4.17.20");
//! ```

mod dependency;
mod report;

pub use dependency::*;
pub use report::*;
