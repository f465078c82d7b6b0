//! # fntest
//!
//! A small harness for testing functions of any fixed arity.
//!
//! ## Architecture
//!
//! - `invoke`: positional invocation of tuple argument records, timing and panic capture
//! - `direct`: compares results against caller-supplied expected values
//! - `randomized`: compares results against a reference function on generated arguments
//! - `report`: per-test outcomes, running statistics and serializable summaries
//! - `sink`: verbosity-gated report stream
//! - `format`: label padding, duration units and record stringification
//! - `config`: verbosity and report settings
//!
//! ```
//! use fntest::{DirectTester, Verbosity};
//!
//! fn fun(i: i32, j: i32) -> Vec<i32> {
//!     vec![1, i, j]
//! }
//!
//! let mut tester: DirectTester<Vec<i32>, (i32, i32), _> =
//!     DirectTester::new(fun).with_sink(Vec::new()).verbosity(Verbosity::Silent);
//!
//! assert!(tester.test("Run 1", vec![1, 13, 15], (13, 15)).passed());
//! assert!(!tester.test("Run 2", vec![1, 13, 15], (13, 99)).passed());
//! assert!(!tester.write_series_summary());
//! ```

pub mod config;
pub mod direct;
pub mod format;
pub mod invoke;
pub mod randomized;
pub mod report;
pub mod sink;

// Re-exports for easier access
pub use config::{ReportConfig, Verbosity};
pub use direct::DirectTester;
pub use format::FormatRecord;
pub use invoke::{ArgumentRecord, Invocable, InvocationFailure};
pub use randomized::{ErrorCase, RandomizedSeriesResult, RandomizedTester};
pub use report::{SeriesStatistics, SeriesSummary, TestOutcome, TestStatus};
pub use sink::ReportSink;

/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate errors
#[derive(thiserror::Error, Debug)]
pub enum FnTestError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
