//! Result reporting: a human-readable table or CSV rows.

use std::io::{self, Write};

use crate::error::BenchResult;
use crate::harness::{RunConfig, RunResult};

/// Output sink for benchmark results.
pub enum Reporter {
    /// Aligned table on stdout.
    Human,
    /// CSV rows on stdout.
    Csv(csv::Writer<io::Stdout>),
}

impl Reporter {
    /// Build a reporter for the requested format.
    pub fn new(csv: bool) -> Self {
        if csv {
            Reporter::Csv(csv::Writer::from_writer(io::stdout()))
        } else {
            Reporter::Human
        }
    }

    /// Emit the banner and column headers.
    pub fn begin(&mut self, cfg: &RunConfig) -> BenchResult<()> {
        match self {
            Reporter::Human => {
                println!(
                    "Benchmarking n={} on 1 + {} threads.",
                    cfg.n_elems, cfg.cores
                );
                print!("    type\\thread:  Reader ");
                for i in 1..=cfg.cores {
                    print!("   {i:>3} ");
                }
                println!("   Avg");
                Ok(())
            }
            Reporter::Csv(writer) => {
                let mut header = vec![
                    "backend".to_string(),
                    "elems".to_string(),
                    "cores".to_string(),
                    "batch".to_string(),
                    "consumer_ms".to_string(),
                    "producer_avg_ms".to_string(),
                ];
                for i in 0..cfg.cores {
                    header.push(format!("producer_{i}_ms"));
                }
                writer.write_record(&header)?;
                Ok(())
            }
        }
    }

    /// Emit one back-end's timings.
    pub fn record(&mut self, cfg: &RunConfig, result: &RunResult) -> BenchResult<()> {
        match self {
            Reporter::Human => {
                print!("{:>15}:  {:>6}", result.desc, result.consumer_ms);
                for ms in &result.producer_ms {
                    print!(" {ms:>6}");
                }
                println!(" {:>6} ms", result.producer_avg_ms());
                Ok(())
            }
            Reporter::Csv(writer) => {
                let mut row = vec![
                    result.desc.to_string(),
                    cfg.n_elems.to_string(),
                    cfg.cores.to_string(),
                    cfg.batch.to_string(),
                    result.consumer_ms.to_string(),
                    result.producer_avg_ms().to_string(),
                ];
                for ms in &result.producer_ms {
                    row.push(ms.to_string());
                }
                writer.write_record(&row)?;
                Ok(())
            }
        }
    }

    /// Flush pending output.
    pub fn finish(&mut self) -> BenchResult<()> {
        match self {
            Reporter::Human => {
                io::stdout().flush()?;
                Ok(())
            }
            Reporter::Csv(writer) => {
                writer.flush()?;
                Ok(())
            }
        }
    }
}
