//! Demo binary running a direct and a randomized test series

use std::path::PathBuf;
use std::process;

use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use fntest::{DirectTester, FnTestError, RandomizedTester, ReportConfig, SeriesSummary};

/// Command line of the demo runner
#[derive(Debug, Parser)]
#[command(name = "fntest-demo")]
#[command(about = "Runs example function test series", version = fntest::VERSION)]
struct DemoConfig {
    #[command(flatten)]
    report: ReportConfig,

    /// Iterations of the randomized series
    #[arg(short = 'n', long, default_value_t = 1000)]
    iterations: u32,

    /// Seed of the argument generator
    #[arg(long, default_value_t = 0x5eed)]
    seed: u64,

    /// Write the series summaries as JSON to this file
    #[arg(long)]
    summary_json: Option<PathBuf>,
}

fn sorted(mut values: Vec<i32>) -> Vec<i32> {
    values.sort_unstable();
    values
}

fn insertion_sorted(mut values: Vec<i32>) -> Vec<i32> {
    for i in 1..values.len() {
        let mut j = i;
        while j > 0 && values[j - 1] > values[j] {
            values.swap(j - 1, j);
            j -= 1;
        }
    }
    values
}

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 { a } else { gcd(b, a % b) }
}

fn run(config: &DemoConfig) -> Result<bool, FnTestError> {
    config.report.validate()?;

    let mut direct: DirectTester<u64, (u64, u64)> = DirectTester::new(gcd).configure(&config.report);
    direct.test("gcd of coprimes", 1, (35, 64));
    direct.test("gcd of multiples", 12, (36, 48));
    direct.test("gcd with zero", 9, (9, 0));
    let direct_passed = direct.write_series_summary();

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut randomized = RandomizedTester::new(insertion_sorted, sorted, move |_| {
        let len = rng.random_range(0..32);
        ((0..len).map(|_| rng.random_range(-100..100)).collect::<Vec<i32>>(),)
    })
    .configure(&config.report);

    let series = randomized.test("insertion sort", config.iterations);

    let summaries: Vec<SeriesSummary> = vec![
        direct.summary("gcd"),
        series.summary("insertion sort"),
    ];
    for summary in &summaries {
        log::info!("{}", summary);
    }

    if let Some(path) = &config.summary_json {
        let json = serde_json::to_string_pretty(&summaries)?;
        std::fs::write(path, json)?;
    }

    Ok(direct_passed && series.is_all_tests_passed() && series.n_tests == config.iterations)
}

fn main() {
    env_logger::init();

    let config = match DemoConfig::try_parse() {
        Ok(config) => config,
        Err(e) => e.exit(),
    };

    match run(&config) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Demo failed: {}", e);
            process::exit(1);
        }
    }
}
