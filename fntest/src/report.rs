//! Series statistics and serializable summaries

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::FnTestError;

/// Status of a single direct test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestStatus {
    /// Result matched the expected value
    Passed,
    /// Result did not match the expected value
    Failed,
    /// The function panicked before producing a result
    Excepted,
}

/// Outcome of one `DirectTester::test` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestOutcome<R> {
    pub status: TestStatus,
    /// Copy of the actual result; `None` when the invocation panicked
    pub result: Option<R>,
    pub duration: Duration,
}

impl<R> TestOutcome<R> {
    pub fn passed(&self) -> bool {
        self.status == TestStatus::Passed
    }

    pub(crate) fn excepted() -> Self {
        Self { status: TestStatus::Excepted, result: None, duration: Duration::ZERO }
    }
}

/// Running statistics of a direct tester, mutated only by `test`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesStatistics<R> {
    pub n_tests: u32,
    pub n_passed: u32,
    /// Whether the last completed test passed (true before any test)
    pub last_passed: bool,
    pub last_duration: Duration,
    pub accumulated_duration: Duration,
    pub last_result: Option<R>,
}

impl<R> Default for SeriesStatistics<R> {
    fn default() -> Self {
        Self {
            n_tests: 0,
            n_passed: 0,
            last_passed: true,
            last_duration: Duration::ZERO,
            accumulated_duration: Duration::ZERO,
            last_result: None,
        }
    }
}

impl<R> SeriesStatistics<R> {
    /// Record a completed comparison
    pub(crate) fn record(&mut self, passed: bool, result: R, duration: Duration) {
        self.n_tests += 1;
        if passed {
            self.n_passed += 1;
        }
        self.last_passed = passed;
        self.last_duration = duration;
        self.accumulated_duration += duration;
        self.last_result = Some(result);
    }

    /// Vacuously true before the first test
    pub fn all_passed(&self) -> bool {
        self.n_passed == self.n_tests
    }
}

/// Type-erased snapshot of a finished series
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub label: String,
    pub n_tests: u32,
    pub n_passed_tests: u32,
    pub accumulated_duration: Duration,
    pub average_duration: Duration,
    pub all_passed: bool,
    pub finished_at: chrono::DateTime<chrono::Utc>,
}

impl SeriesSummary {
    pub fn new(
        label: impl Into<String>,
        n_tests: u32,
        n_passed_tests: u32,
        accumulated_duration: Duration,
        all_passed: bool,
    ) -> Self {
        let average_duration =
            if n_tests > 0 { accumulated_duration / n_tests } else { Duration::ZERO };

        Self {
            label: label.into(),
            n_tests,
            n_passed_tests,
            accumulated_duration,
            average_duration,
            all_passed,
            finished_at: chrono::Utc::now(),
        }
    }

    /// Success rate as percentage
    pub fn success_rate(&self) -> f64 {
        if self.n_tests == 0 {
            100.0
        } else {
            (self.n_passed_tests as f64 / self.n_tests as f64) * 100.0
        }
    }

    /// Export summary as JSON
    pub fn to_json(&self) -> Result<String, FnTestError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for SeriesSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}/{} passed ({:.1}%) in {:.2?}",
            self.label,
            self.n_passed_tests,
            self.n_tests,
            self.success_rate(),
            self.accumulated_duration
        )
    }
}
