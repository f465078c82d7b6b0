//! Test-by-test comparison of a function against expected values

use std::fmt::Debug;
use std::io::{self, Write};
use std::time::Duration;

use crate::config::{ReportConfig, Verbosity};
use crate::format::{millis, padded_label, paint, Tone};
use crate::invoke::{catch_invocation, invoke, ArgumentRecord, BoxedFunction, Invocable};
use crate::report::{SeriesStatistics, SeriesSummary, TestOutcome, TestStatus};
use crate::sink::ReportSink;

/// Default width of a report line
pub const DEFAULT_LINE_LENGTH: usize = 60;

const MISSING_TO_STRING: &str = "<to-string function not specified>";

type Comparator<R> = Box<dyn Fn(&R, &R) -> bool>;
type Stringifier<R> = Box<dyn Fn(&R) -> String>;

/// Invokes a function with given arguments and compares the result to an
/// expected value, measuring invocation time and reporting each test.
///
/// A method on an object is tested by wrapping the call in a closure:
///
/// ```
/// use fntest::DirectTester;
///
/// struct Adder {
///     offset: i32,
/// }
///
/// impl Adder {
///     fn add(&self, i: i32, j: i32) -> i32 {
///         i + j + self.offset
///     }
/// }
///
/// let adder = Adder { offset: 1 };
/// let mut tester: DirectTester<i32, (i32, i32), _> =
///     DirectTester::new(move |i: i32, j: i32| adder.add(i, j)).with_sink(std::io::sink());
///
/// assert!(tester.test("add", 6, (2, 3)).passed());
/// ```
pub struct DirectTester<R, Args, W: Write = io::Stdout> {
    fun: BoxedFunction<Args, R>,
    comp: Comparator<R>,
    to_string: Stringifier<R>,
    sink: ReportSink<W>,
    output_line_length: usize,
    stats: SeriesStatistics<R>,
}

impl<R, Args> DirectTester<R, Args>
where
    R: Clone + 'static,
    Args: 'static,
{
    /// Tester comparing with `==` and printing results with `Debug`.
    /// Failure details are shown (VERBOSE).
    pub fn new<F>(function: F) -> Self
    where
        F: Invocable<Args, R> + 'static,
        R: PartialEq + Debug,
    {
        Self::with_strategies(function, |a: &R, b: &R| a == b, |r: &R| format!("{:?}", r))
    }

    /// Tester with a custom comparator and no to-string function.
    /// Only pass/fail lines are shown (NORMAL).
    pub fn with_comparator<F, C>(function: F, comparator: C) -> Self
    where
        F: Invocable<Args, R> + 'static,
        C: Fn(&R, &R) -> bool + 'static,
    {
        let mut tester =
            Self::with_strategies(function, comparator, |_: &R| MISSING_TO_STRING.to_string());
        tester.sink.set_verbosity(Verbosity::Normal);
        tester
    }

    /// Tester with custom comparator and to-string function (VERBOSE)
    pub fn with_strategies<F, C, S>(function: F, comparator: C, to_string: S) -> Self
    where
        F: Invocable<Args, R> + 'static,
        C: Fn(&R, &R) -> bool + 'static,
        S: Fn(&R) -> String + 'static,
    {
        Self {
            fun: Box::new(function),
            comp: Box::new(comparator),
            to_string: Box::new(to_string),
            sink: ReportSink::new(io::stdout(), Verbosity::Verbose),
            output_line_length: DEFAULT_LINE_LENGTH,
            stats: SeriesStatistics::default(),
        }
    }
}

impl<R, Args: ArgumentRecord, W: Write> DirectTester<R, Args, W> {
    /// Number of arguments the function under test takes
    pub const N_FUNCTION_ARGUMENTS: usize = Args::ARITY;
}

impl<R: Clone, Args, W: Write> DirectTester<R, Args, W> {
    /// Stream the report to `writer` instead
    pub fn with_sink<W2: Write>(self, writer: W2) -> DirectTester<R, Args, W2> {
        DirectTester {
            fun: self.fun,
            comp: self.comp,
            to_string: self.to_string,
            sink: self.sink.with_writer(writer),
            output_line_length: self.output_line_length,
            stats: self.stats,
        }
    }

    pub fn verbosity(mut self, verbosity: Verbosity) -> Self {
        self.sink.set_verbosity(verbosity);
        self
    }

    pub fn output_line_length(mut self, output_line_length: usize) -> Self {
        self.output_line_length = output_line_length;
        self
    }

    /// Apply report settings
    pub fn configure(mut self, config: &ReportConfig) -> Self {
        self.sink.set_verbosity(config.verbosity);
        self.sink.set_color(config.color);
        self.output_line_length = config.line_length_or(self.output_line_length);
        self
    }

    /// Invoke the function with `args` and compare its result to `expected`.
    ///
    /// A panic inside the function or comparator is reported as `EXCEPTION`
    /// and leaves the statistics untouched. Its message goes to the report
    /// sink only, the process panic hook stays quiet for it. The expected
    /// value must have the exact result type, so a value that would need a
    /// lossy conversion is rejected at compile time:
    ///
    /// ```compile_fail
    /// use fntest::DirectTester;
    ///
    /// let mut tester: DirectTester<i32, ()> = DirectTester::new(|| 1);
    /// tester.test("1", 1.2, ());
    /// ```
    ///
    /// ```
    /// use fntest::DirectTester;
    ///
    /// let mut tester: DirectTester<i32, (), _> =
    ///     DirectTester::new(|| 1).with_sink(std::io::sink());
    /// assert!(tester.test("2", 1, ()).passed());
    /// ```
    pub fn test(&mut self, test_name: &str, expected_result: R, args: Args) -> TestOutcome<R> {
        let label = padded_label(&format!("TESTING {}: ", test_name), self.output_line_length);
        self.sink.emit(&format!("{} ", label), Verbosity::Normal);

        log::debug!("Running direct test '{}'", test_name);

        let fun = &self.fun;
        let comp = &self.comp;
        let expected = &expected_result;
        let invocation = catch_invocation(|| {
            let (result, duration) = invoke(fun.as_ref(), args);
            let passed = comp(&result, expected);
            (result, duration, passed)
        });

        let (result, duration, passed) = match invocation {
            Ok(completed) => completed,
            Err(failure) => {
                let color = self.sink.color();
                self.sink.emit(
                    &format!("{}\n{}\n", paint("EXCEPTION", Tone::Error, color), failure),
                    Verbosity::Normal,
                );
                return TestOutcome::excepted();
            }
        };

        self.report_comparison(passed, &result, expected, duration);
        self.stats.record(passed, result.clone(), duration);

        let status = if passed { TestStatus::Passed } else { TestStatus::Failed };
        TestOutcome { status, result: Some(result), duration }
    }

    fn report_comparison(&mut self, passed: bool, result: &R, expected: &R, duration: Duration) {
        let color = self.sink.color();
        let ms = millis(duration);

        if passed {
            self.sink.emit(&format!("{} ({} ms)\n", paint("OK", Tone::Pass, color), ms), Verbosity::Normal);
            return;
        }

        self.sink.emit(&format!("{} ({} ms)\n", paint("FAILED", Tone::Fail, color), ms), Verbosity::Normal);
        if self.sink.enabled(Verbosity::Verbose) {
            let details = format!(
                " RESULT:   {}\n EXPECTED: {}\n.\n",
                (self.to_string)(result),
                (self.to_string)(expected)
            );
            self.sink.emit(&details, Verbosity::Verbose);
        }
    }

    /// Write one line summarizing the series so far.
    /// Returns true if every test passed, or no test ran.
    pub fn write_series_summary(&mut self) -> bool {
        let all_passed = self.is_all_tests_passed();
        let color = self.sink.color();
        let banner = if all_passed {
            paint("+++ TEST SERIES PASSED +++  :)", Tone::Pass, color)
        } else {
            paint("--- SOME TESTS FAILED  ---  :(((", Tone::Fail, color)
        };

        let line = format!(
            "{}       ({}/{})   (accumulated: {} ms)\n\n",
            banner,
            self.n_passed_tests(),
            self.n_tests(),
            millis(self.accumulated_invocation_durations())
        );
        self.sink.emit(&line, Verbosity::Normal);

        all_passed
    }

    /// Serializable snapshot of the series so far
    pub fn summary(&self, label: &str) -> SeriesSummary {
        SeriesSummary::new(
            label,
            self.stats.n_tests,
            self.stats.n_passed,
            self.stats.accumulated_duration,
            self.is_all_tests_passed(),
        )
    }

    pub fn n_tests(&self) -> u32 {
        self.stats.n_tests
    }

    pub fn n_passed_tests(&self) -> u32 {
        self.stats.n_passed
    }

    /// Also true if no test was executed
    pub fn is_last_test_passed(&self) -> bool {
        self.stats.last_passed
    }

    pub fn last_invocation_duration(&self) -> Duration {
        self.stats.last_duration
    }

    /// Copy of the result of the last completed test
    pub fn last_test_result(&self) -> Option<R> {
        self.stats.last_result.clone()
    }

    /// Also true if no test was executed
    pub fn is_all_tests_passed(&self) -> bool {
        self.stats.all_passed()
    }

    pub fn accumulated_invocation_durations(&self) -> Duration {
        self.stats.accumulated_duration
    }

    pub fn statistics(&self) -> &SeriesStatistics<R> {
        &self.stats
    }

    pub fn sink(&self) -> &ReportSink<W> {
        &self.sink
    }

    pub fn into_sink(self) -> ReportSink<W> {
        self.sink
    }
}
