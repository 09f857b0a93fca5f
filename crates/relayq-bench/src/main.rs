//! # rqbench - benchmark driver for the relayq MPSC back-ends
//!
//! Drives every selected back-end through the same multi-producer,
//! single-consumer workload and reports per-thread timings. The run
//! aborts with a non-zero exit code if any element is lost or consumed
//! more than once.

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod error;
mod harness;
mod report;

use error::{BenchError, BenchResult};
use harness::{RunConfig, MAX_BATCH, WARMUP_ELEMS};
use relayq_core::registry;
use report::Reporter;

/// Multi-producer single-consumer queue benchmark
#[derive(Parser, Debug)]
#[command(
    name = "rqbench",
    version,
    about = "Benchmark the relayq MPSC queue back-ends",
    long_about = "Runs every selected queue back-end through an identical \
                  multi-producer workload with a concurrently draining \
                  consumer, then prints per-thread timings as a table or CSV."
)]
struct BenchCli {
    /// Total number of elements to push through each back-end
    #[arg(short = 'n', long = "elems", default_value_t = 1_000_000)]
    elems: usize,

    /// Number of producer threads
    #[arg(short = 'c', long = "cores", default_value_t = 2)]
    cores: usize,

    /// Producer batch size, capped at 64
    #[arg(short = 'b', long = "batch", default_value_t = MAX_BATCH)]
    batch: usize,

    /// Run only the primary back-end
    #[arg(long)]
    perf: bool,

    /// Include the Treiber-stack back-end
    #[arg(long = "with-treiber-stack")]
    with_treiber_stack: bool,

    /// Machine-readable CSV output
    #[arg(long)]
    csv: bool,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();

    let cli = BenchCli::parse();

    if let Err(err) = run(cli) {
        error!("benchmark failed: {err}");
        std::process::exit(1);
    }
}

fn run(mut cli: BenchCli) -> BenchResult<()> {
    if cli.cores == 0 {
        return Err(BenchError::invalid_args("-c requires at least 1 core"));
    }
    if cli.batch == 0 {
        return Err(BenchError::invalid_args("-b requires a batch size of at least 1"));
    }
    if cli.batch > MAX_BATCH {
        warn!("batch size {} capped at {}", cli.batch, MAX_BATCH);
        cli.batch = MAX_BATCH;
    }

    let cfg = RunConfig {
        n_elems: cli.elems,
        cores: cli.cores,
        batch: cli.batch,
    };

    let backends = registry();
    let arena = harness::elements(cli.elems);

    // Warm up caches and the scheduler on the baseline back-end before
    // anything is measured.
    let warm_cfg = RunConfig {
        n_elems: cli.elems.min(WARMUP_ELEMS),
        ..cfg
    };
    let baseline = backends
        .iter()
        .find(|b| b.desc() == "tailq")
        .ok_or_else(|| anyhow::anyhow!("baseline back-end missing from registry"))?;
    info!("warming up on {}", baseline.desc());
    for _ in 0..3 {
        harness::run_one(baseline.as_ref(), &arena, &warm_cfg)?;
    }

    let selected: Vec<_> = backends
        .iter()
        .filter(|b| match b.desc() {
            "mpsc-queue" => true,
            "tailq" => !cli.perf,
            "treiber-stack" => !cli.perf && cli.with_treiber_stack,
            _ => false,
        })
        .collect();

    let mut reporter = Reporter::new(cli.csv);
    reporter.begin(&cfg)?;

    for backend in selected {
        let result = harness::run_one(backend.as_ref(), &arena, &cfg)?;
        reporter.record(&cfg, &result)?;
    }

    reporter.finish()
}
