//! Comparison of a function against a reference function on generated arguments
//!
//! Arguments and results may own external resources. The deleters hand them
//! back for release at fixed points of each iteration:
//! - results of a passing iteration go to the result deleter right away
//! - results of a failing iteration stay in its [`ErrorCase`] and belong to
//!   whoever inspects the series result
//! - the argument record of every completed iteration goes to the argument
//!   deleter; a failing iteration keeps its own copy in the error case
//!
//! A panic ends the whole series; the arguments of that iteration are then
//! dropped without passing through the deleter.

use std::fmt::Debug;
use std::io::{self, Write};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{ReportConfig, Verbosity};
use crate::format::{micros, paint, FormatRecord, Tone};
use crate::invoke::{catch_invocation, invoke, ArgumentRecord, BoxedFunction, Invocable};
use crate::report::SeriesSummary;
use crate::sink::ReportSink;

/// Default width of the label plus progress dots
pub const DEFAULT_LINE_LENGTH: usize = 50;

/// Circumstances of a single failing iteration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorCase<R, Args> {
    /// Result of the function under test
    pub erroneous_result: R,
    /// Result of the reference function
    pub reference_result: R,
    /// Arguments both functions were invoked with
    pub args: Args,
}

/// Result of one `RandomizedTester::test` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomizedSeriesResult<R, Args> {
    /// Iterations that ran to completion
    pub n_tests: u32,
    pub n_passed_tests: u32,
    pub average_invocation_duration: Duration,
    /// Time spent in the function under test; reference timings are not counted
    pub accumulated_invocation_durations: Duration,
    pub error_cases: Vec<ErrorCase<R, Args>>,
}

impl<R, Args> Default for RandomizedSeriesResult<R, Args> {
    fn default() -> Self {
        Self {
            n_tests: 0,
            n_passed_tests: 0,
            average_invocation_duration: Duration::ZERO,
            accumulated_invocation_durations: Duration::ZERO,
            error_cases: Vec::new(),
        }
    }
}

impl<R, Args> RandomizedSeriesResult<R, Args> {
    /// Whether every completed iteration passed
    pub fn is_all_tests_passed(&self) -> bool {
        self.n_tests == self.n_passed_tests
    }

    pub fn summary(&self, label: &str) -> SeriesSummary {
        SeriesSummary::new(
            label,
            self.n_tests,
            self.n_passed_tests,
            self.accumulated_invocation_durations,
            self.is_all_tests_passed(),
        )
    }
}

type ArgsCreator<Args> = Box<dyn FnMut(u32) -> Args>;
type Comparator<R> = Box<dyn Fn(&R, &R) -> bool>;
type Stringifier<T> = Box<dyn Fn(&T) -> String>;
type Deleter<T> = Box<dyn FnMut(T)>;

/// Runs a function and a reference function on generated arguments and
/// collects every disagreement.
///
/// ```
/// use fntest::{RandomizedTester, Verbosity};
///
/// fn square(x: i64) -> i64 {
///     x * x
/// }
///
/// let mut next = 0i64;
/// let mut tester = RandomizedTester::new(square, |x: i64| x.pow(2), move |_total| {
///     next += 1;
///     (next,)
/// })
/// .with_sink(std::io::sink())
/// .verbosity(Verbosity::Verbose);
///
/// let result = tester.test("square", 100);
/// assert!(result.is_all_tests_passed());
/// assert_eq!(result.n_tests, 100);
/// ```
pub struct RandomizedTester<R, Args, W: Write = io::Stdout> {
    fun: BoxedFunction<Args, R>,
    reference_fun: BoxedFunction<Args, R>,
    args_creator: ArgsCreator<Args>,
    comp: Comparator<R>,
    args_to_string: Stringifier<Args>,
    result_to_string: Stringifier<R>,
    args_deleter: Deleter<Args>,
    result_deleter: Deleter<R>,
    sink: ReportSink<W>,
    output_line_length: usize,
}

impl<R, Args> RandomizedTester<R, Args>
where
    R: 'static,
    Args: 'static,
{
    /// Tester with caller-provided comparison and rendering strategies.
    ///
    /// Neither the result nor the argument record needs `PartialEq` or
    /// `Debug`. Deleters start as no-ops.
    pub fn with_strategies<F, G, C, Cmp, SA, SR>(
        function: F,
        reference_function: G,
        argument_creator: C,
        comparator: Cmp,
        args_to_string: SA,
        result_to_string: SR,
    ) -> Self
    where
        F: Invocable<Args, R> + 'static,
        G: Invocable<Args, R> + 'static,
        C: FnMut(u32) -> Args + 'static,
        Cmp: Fn(&R, &R) -> bool + 'static,
        SA: Fn(&Args) -> String + 'static,
        SR: Fn(&R) -> String + 'static,
    {
        Self {
            fun: Box::new(function),
            reference_fun: Box::new(reference_function),
            args_creator: Box::new(argument_creator),
            comp: Box::new(comparator),
            args_to_string: Box::new(args_to_string),
            result_to_string: Box::new(result_to_string),
            args_deleter: Box::new(|_: Args| {}),
            result_deleter: Box::new(|_: R| {}),
            sink: ReportSink::new(io::stdout(), Verbosity::Normal),
            output_line_length: DEFAULT_LINE_LENGTH,
        }
    }
}

impl<R, Args> RandomizedTester<R, Args>
where
    R: PartialEq + Debug + 'static,
    Args: FormatRecord + 'static,
{
    /// Tester with default strategies: `==` comparison, `Debug` rendering of
    /// results, tuple rendering of arguments and no-op deleters.
    ///
    /// `argument_creator` receives the total number of iterations of the
    /// series on every call, not the iteration index; a creator that needs to
    /// vary per iteration keeps its own counter or random generator.
    pub fn new<F, G, C>(function: F, reference_function: G, argument_creator: C) -> Self
    where
        F: Invocable<Args, R> + 'static,
        G: Invocable<Args, R> + 'static,
        C: FnMut(u32) -> Args + 'static,
    {
        Self::with_strategies(
            function,
            reference_function,
            argument_creator,
            |a: &R, b: &R| a == b,
            |args: &Args| args.format_record(),
            |r: &R| format!("{:?}", r),
        )
    }
}

impl<R, Args: ArgumentRecord, W: Write> RandomizedTester<R, Args, W> {
    /// Number of arguments the function and reference function take
    pub const N_FUNCTION_ARGUMENTS: usize = Args::ARITY;
}

impl<R, Args: Clone, W: Write> RandomizedTester<R, Args, W> {
    /// Replace the result comparison; it returns true when two results are equal
    pub fn comparator<C>(mut self, comparator: C) -> Self
    where
        C: Fn(&R, &R) -> bool + 'static,
    {
        self.comp = Box::new(comparator);
        self
    }

    pub fn args_to_string<S>(mut self, args_to_string: S) -> Self
    where
        S: Fn(&Args) -> String + 'static,
    {
        self.args_to_string = Box::new(args_to_string);
        self
    }

    pub fn result_to_string<S>(mut self, result_to_string: S) -> Self
    where
        S: Fn(&R) -> String + 'static,
    {
        self.result_to_string = Box::new(result_to_string);
        self
    }

    /// Release argument records of completed iterations
    pub fn args_deleter<D>(mut self, args_deleter: D) -> Self
    where
        D: FnMut(Args) + 'static,
    {
        self.args_deleter = Box::new(args_deleter);
        self
    }

    /// Release both results of passing iterations
    pub fn result_deleter<D>(mut self, result_deleter: D) -> Self
    where
        D: FnMut(R) + 'static,
    {
        self.result_deleter = Box::new(result_deleter);
        self
    }

    /// Stream the report to `writer` instead
    pub fn with_sink<W2: Write>(self, writer: W2) -> RandomizedTester<R, Args, W2> {
        RandomizedTester {
            fun: self.fun,
            reference_fun: self.reference_fun,
            args_creator: self.args_creator,
            comp: self.comp,
            args_to_string: self.args_to_string,
            result_to_string: self.result_to_string,
            args_deleter: self.args_deleter,
            result_deleter: self.result_deleter,
            sink: self.sink.with_writer(writer),
            output_line_length: self.output_line_length,
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

    /// Run `n_tests` iterations, comparing the function under test with the
    /// reference function on freshly created arguments.
    ///
    /// A panic in either function (or in the comparator) is reported together
    /// with the offending arguments and stops the series; iterations completed
    /// before it stay in the returned result. The panic message goes to the
    /// report sink only, the process panic hook stays quiet for it.
    pub fn test(&mut self, test_name: &str, n_tests: u32) -> RandomizedSeriesResult<R, Args> {
        let mut ret = RandomizedSeriesResult::default();

        let label = format!("RandomizedFunctionTest: {}: ", test_name);
        let dots_total = self.output_line_length.saturating_sub(label.chars().count());
        let dots_per_step = if n_tests > 0 { dots_total as f64 / n_tests as f64 } else { 0.0 };
        let mut dots_pending = 0.0f64;

        self.sink.emit(&label, Verbosity::Normal);
        log::debug!("Running randomized test '{}' with {} iterations", test_name, n_tests);

        for _ in 0..n_tests {
            let args = (self.args_creator)(n_tests);

            dots_pending += dots_per_step;
            let dots = dots_pending as usize;
            self.sink.emit(&".".repeat(dots), Verbosity::Normal);
            dots_pending -= dots as f64;

            let fun = &self.fun;
            let reference_fun = &self.reference_fun;
            let comp = &self.comp;
            let invocation = catch_invocation(|| {
                let (reference_result, _) = invoke(reference_fun.as_ref(), args.clone());
                let (result, duration) = invoke(fun.as_ref(), args.clone());
                let passed = comp(&result, &reference_result);
                (result, reference_result, duration, passed)
            });

            let (result, reference_result, duration, passed) = match invocation {
                Ok(completed) => completed,
                Err(failure) => {
                    let color = self.sink.color();
                    let report = format!(
                        "{}\n{}\nArguments: {}\n",
                        paint("EXCEPTION", Tone::Error, color),
                        failure,
                        (self.args_to_string)(&args)
                    );
                    self.sink.emit(&report, Verbosity::Normal);
                    break;
                }
            };

            if passed {
                ret.n_passed_tests += 1;
                (self.result_deleter)(result);
                (self.result_deleter)(reference_result);
            } else {
                ret.error_cases.push(ErrorCase {
                    erroneous_result: result,
                    reference_result,
                    args: args.clone(),
                });
            }

            ret.accumulated_invocation_durations += duration;
            ret.n_tests += 1;
            (self.args_deleter)(args);
        }

        if ret.n_tests > 0 {
            ret.average_invocation_duration = ret.accumulated_invocation_durations / ret.n_tests;
        }

        self.report_series(&ret, n_tests);
        log::info!(
            "Randomized test '{}' finished: {}/{} passed of {} requested",
            test_name,
            ret.n_passed_tests,
            ret.n_tests,
            n_tests
        );

        ret
    }

    fn report_series(&mut self, ret: &RandomizedSeriesResult<R, Args>, n_tests: u32) {
        let color = self.sink.color();
        // an aborted series reads FAILURE even without a mismatch
        let verdict = if n_tests == ret.n_tests && n_tests == ret.n_passed_tests {
            paint("OK", Tone::Pass, color)
        } else {
            paint("FAILURE", Tone::Fail, color)
        };

        let banner = format!(
            " {} ({}/{}) ({} µs avg, {} µs total)\n",
            verdict,
            ret.n_passed_tests,
            ret.n_tests,
            micros(ret.average_invocation_duration),
            micros(ret.accumulated_invocation_durations)
        );
        self.sink.emit(&banner, Verbosity::Normal);

        if !self.sink.enabled(Verbosity::Verbose) {
            return;
        }

        for (i, error_case) in ret.error_cases.iter().enumerate() {
            let block = format!(
                " ERROR CASE {}:\n   wrong result:        {}\n   reference result:    {}\n   args:                {}\n .\n",
                i,
                (self.result_to_string)(&error_case.erroneous_result),
                (self.result_to_string)(&error_case.reference_result),
                (self.args_to_string)(&error_case.args)
            );
            self.sink.emit(&block, Verbosity::Verbose);
        }
    }

    pub fn sink(&self) -> &ReportSink<W> {
        &self.sink
    }

    pub fn into_sink(self) -> ReportSink<W> {
        self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn output<R, Args: Clone>(tester: &RandomizedTester<R, Args, Vec<u8>>) -> String {
        String::from_utf8_lossy(tester.sink().get_ref()).into_owned()
    }

    fn counting_tester(
        offset: i32,
    ) -> (RandomizedTester<i32, (i32, i32), Vec<u8>>, Rc<Cell<u32>>, Rc<Cell<u32>>) {
        let args_deleted = Rc::new(Cell::new(0));
        let results_deleted = Rc::new(Cell::new(0));
        let args_counter = Rc::clone(&args_deleted);
        let results_counter = Rc::clone(&results_deleted);

        let mut seed = 0;
        let tester = RandomizedTester::new(
            move |a: i32, b: i32| a + b + offset,
            |a: i32, b: i32| a + b,
            move |_| {
                seed += 1;
                (seed, seed * 2)
            },
        )
        .args_deleter(move |_| args_counter.set(args_counter.get() + 1))
        .result_deleter(move |_| results_counter.set(results_counter.get() + 1))
        .with_sink(Vec::new());

        (tester, args_deleted, results_deleted)
    }

    #[test]
    fn test_zero_iterations() {
        let (mut tester, args_deleted, results_deleted) = counting_tester(0);
        let result = tester.test("empty", 0);

        assert_eq!(result, RandomizedSeriesResult::default());
        assert!(result.is_all_tests_passed());
        assert_eq!(args_deleted.get(), 0);
        assert_eq!(results_deleted.get(), 0);
        assert!(output(&tester).contains(" OK (0/0) (0 µs avg, 0 µs total)"));
    }

    #[test]
    fn test_agreeing_functions_release_everything() {
        let (mut tester, args_deleted, results_deleted) = counting_tester(0);
        let result = tester.test("agree", 25);

        assert_eq!(result.n_tests, 25);
        assert_eq!(result.n_passed_tests, 25);
        assert!(result.error_cases.is_empty());
        assert_eq!(args_deleted.get(), 25);
        assert_eq!(results_deleted.get(), 50);
        assert!(output(&tester).contains(" OK (25/25)"));
    }

    #[test]
    fn test_disagreeing_functions_keep_results() {
        let (mut tester, args_deleted, results_deleted) = counting_tester(1);
        let result = tester.test("disagree", 10);

        assert_eq!(result.n_tests, 10);
        assert_eq!(result.n_passed_tests, 0);
        assert_eq!(result.error_cases.len(), 10);
        assert_eq!(args_deleted.get(), 10);
        assert_eq!(results_deleted.get(), 0);

        let first = &result.error_cases[0];
        assert_eq!(first.args, (1, 2));
        assert_eq!(first.reference_result, 3);
        assert_eq!(first.erroneous_result, 4);
        assert!(output(&tester).contains(" FAILURE (0/10)"));
    }

    #[test]
    fn test_generator_receives_total_count() {
        let seen = Rc::new(Cell::new(0u32));
        let seen_in_creator = Rc::clone(&seen);
        let mut tester = RandomizedTester::new(
            |x: u32| x,
            |x: u32| x,
            move |total: u32| {
                seen_in_creator.set(total);
                (total,)
            },
        )
        .with_sink(io::sink());

        tester.test("count", 7);
        assert_eq!(seen.get(), 7);
    }

    #[test]
    fn test_panic_stops_the_series() {
        let calls = Rc::new(Cell::new(0u32));
        let calls_in_fun = Rc::clone(&calls);
        let generated = Rc::new(Cell::new(0u32));
        let generated_in_creator = Rc::clone(&generated);
        let args_deleted = Rc::new(Cell::new(0u32));
        let args_counter = Rc::clone(&args_deleted);

        let mut tester = RandomizedTester::new(
            move |x: u32| {
                calls_in_fun.set(calls_in_fun.get() + 1);
                if calls_in_fun.get() == 3 {
                    panic!("third call");
                }
                x
            },
            |x: u32| x,
            move |_| {
                generated_in_creator.set(generated_in_creator.get() + 1);
                (generated_in_creator.get(),)
            },
        )
        .args_deleter(move |_| args_counter.set(args_counter.get() + 1))
        .with_sink(Vec::new());

        let result = tester.test("abort", 10);

        assert_eq!(result.n_tests, 2);
        assert_eq!(result.n_passed_tests, 2);
        assert_eq!(generated.get(), 3);
        assert_eq!(args_deleted.get(), 2);

        let out = output(&tester);
        assert!(out.contains("EXCEPTION\n&str:\nthird call\nArguments: ( 3 )\n"));
        assert!(out.contains(" FAILURE (2/2)"));
    }

    #[test]
    fn test_panic_on_first_iteration() {
        let mut tester =
            RandomizedTester::new(|_: u8| -> u8 { panic!("never") }, |x: u8| x, |_| (1u8,))
                .with_sink(Vec::new());

        let result = tester.test("first", 5);
        assert_eq!(result.n_tests, 0);
        assert_eq!(result.average_invocation_duration, Duration::ZERO);
        assert!(output(&tester).contains(" FAILURE (0/0)"));
    }

    #[test]
    fn test_reference_panic_also_stops_the_series() {
        let mut tester =
            RandomizedTester::new(|x: u8| x, |_: u8| -> u8 { panic!("reference") }, |_| (1u8,))
                .with_sink(Vec::new());

        let result = tester.test("reference", 3);
        assert_eq!(result.n_tests, 0);
        assert!(output(&tester).contains("reference"));
    }

    #[test]
    fn test_progress_dots_fill_the_line() {
        let mut tester = RandomizedTester::new(|x: u8| x, |x: u8| x, |_| (0u8,))
            .output_line_length(40)
            .with_sink(Vec::new());

        tester.test("dots", 7);
        let out = output(&tester);
        let label = "RandomizedFunctionTest: dots: ";
        let first_line = out.lines().next().unwrap();
        assert!(first_line.starts_with(label));
        let dots = first_line[label.len()..].chars().take_while(|c| *c == '.').count();
        assert!((15..=16).contains(&dots), "got {dots} dots");
    }

    #[test]
    fn test_error_cases_printed_when_verbose() {
        let (tester, _, _) = counting_tester(1);
        let mut tester = tester.verbosity(Verbosity::Verbose);
        tester.test("verbose", 2);

        let out = output(&tester);
        assert!(out.contains(" ERROR CASE 0:\n   wrong result:        4\n   reference result:    3\n   args:                ( 1, 2 )\n .\n"));
        assert!(out.contains(" ERROR CASE 1:"));
    }

    #[test]
    fn test_custom_comparator_and_stringifiers() {
        let mut tester = RandomizedTester::new(|x: f64| x * 3.0, |x: f64| x + x + x, |_| (0.1,))
            .comparator(|a: &f64, b: &f64| (a - b).abs() < 1e-9)
            .result_to_string(|r: &f64| format!("{r:.3}"))
            .args_to_string(|args: &(f64,)| format!("x={}", args.0))
            .with_sink(Vec::new());

        assert!(tester.test("float", 4).is_all_tests_passed());
    }

    #[derive(Clone)]
    struct Opaque(i32);

    #[test]
    fn test_strategies_for_types_without_eq_or_debug() {
        let mut next = 0;
        let mut tester = RandomizedTester::with_strategies(
            |x: Opaque| Opaque(x.0 * 2),
            |x: Opaque| Opaque(if x.0 % 2 == 0 { x.0 * 2 } else { x.0 + x.0 + 1 }),
            move |_| {
                next += 1;
                (Opaque(next),)
            },
            |a: &Opaque, b: &Opaque| a.0 == b.0,
            |args: &(Opaque,)| format!("<{}>", args.0 .0),
            |r: &Opaque| format!("#{}", r.0),
        )
        .with_sink(Vec::new())
        .verbosity(Verbosity::Verbose);

        let result = tester.test("opaque", 4);
        assert_eq!(result.n_tests, 4);
        assert_eq!(result.n_passed_tests, 2);
        assert_eq!(result.error_cases.len(), 2);
        assert_eq!(result.error_cases[0].args.0 .0, 1);
        assert_eq!(result.error_cases[0].erroneous_result.0, 2);
        assert_eq!(result.error_cases[0].reference_result.0, 3);
        assert_eq!(result.error_cases[1].args.0 .0, 3);

        let out = output(&tester);
        assert!(out.contains(" FAILURE (2/4)"));
        assert!(out.contains("   wrong result:        #2\n   reference result:    #3\n   args:                <1>\n"));
    }

    #[test]
    fn test_boxed_arguments_survive_in_error_cases() {
        let mut next = 0;
        let mut tester = RandomizedTester::new(
            |v: Box<i32>| Box::new(*v * 2),
            |v: Box<i32>| Box::new(*v * 2 + i32::from(*v > 2)),
            move |_| {
                next += 1;
                (Box::new(next),)
            },
        )
        .args_deleter(drop)
        .result_deleter(drop)
        .with_sink(io::sink());

        let result = tester.test("boxes", 4);
        assert_eq!(result.n_passed_tests, 2);
        assert_eq!(result.error_cases.len(), 2);
        assert_eq!(*result.error_cases[0].args.0, 3);
        assert_eq!(*result.error_cases[0].erroneous_result, 6);
        assert_eq!(*result.error_cases[0].reference_result, 7);
    }

    #[test]
    fn test_silent_verbosity_writes_nothing() {
        let (tester, _, _) = counting_tester(1);
        let mut tester = tester.verbosity(Verbosity::Silent);
        let result = tester.test("silent", 3);
        assert_eq!(result.error_cases.len(), 3);
        assert!(output(&tester).is_empty());
    }

    #[test]
    fn test_summary_of_series() {
        let (mut tester, _, _) = counting_tester(0);
        let summary = tester.test("summary", 4).summary("sums");
        assert_eq!(summary.n_tests, 4);
        assert!(summary.all_passed);
    }

    #[test]
    fn test_arity_constant() {
        assert_eq!(<RandomizedTester<i32, (i32, i32)>>::N_FUNCTION_ARGUMENTS, 2);
    }
}
