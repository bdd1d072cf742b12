//! CLI for trikmeans

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use trikmeans::benchmark::{self, DEFAULT_SEED};
use trikmeans::error::ErrorCode;
use trikmeans::{EngineConfig, KmeansError, TriKMeans};

#[derive(Parser)]
#[command(name = "trikmeans")]
#[command(about = "Triangle-inequality accelerated k-means")]
struct Cli {
    /// JSON engine config (`--iterations` overrides its iteration count)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Worker threads (default: all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Cluster a random problem and print the result
    Run {
        #[arg(short = 'n', long, default_value = "10000")]
        points: usize,
        #[arg(short, long, default_value = "16")]
        dim: usize,
        #[arg(short = 'k', long, default_value = "8")]
        clusters: usize,
        /// Iterations (default: the config file's count, else 1)
        #[arg(short, long)]
        iterations: Option<usize>,
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Compare against the reference Lloyd implementation
    Validate {
        #[arg(short = 'n', long, default_value = "1000")]
        points: usize,
        #[arg(short, long, default_value = "60")]
        dim: usize,
        #[arg(short = 'k', long, default_value = "20")]
        clusters: usize,
        /// Iterations (default: the config file's count, else 1)
        #[arg(short, long)]
        iterations: Option<usize>,
        /// Repetitions of the same problem
        #[arg(short, long, default_value = "1")]
        tests: usize,
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,
        /// Print the timing table
        #[arg(short, long)]
        verbose: bool,
    },
    /// Run the preset validation matrix
    Suite {
        #[arg(short, long)]
        verbose: bool,
    },
}

fn load_config(cli: &Cli) -> Result<EngineConfig, KmeansError> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if cli.threads.is_some() {
        config.num_threads = cli.threads;
    }
    Ok(config)
}

fn execute(cli: Cli) -> Result<ErrorCode, KmeansError> {
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Run { points, dim, clusters, iterations, seed, json } => {
            let problem = benchmark::generate_problem(points, dim, clusters, seed)?;
            let iterations = iterations.unwrap_or(config.iterations);
            // the plain summary only needs sizes, timings and pruning
            let config = EngineConfig {
                iterations,
                ..config.with_diagnostics(json)
            };
            let result = TriKMeans::new(&problem.points, &problem.centroids, config)?.run()?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!(
                    "Clustered {} points (dim={}) into {} clusters in {} iterations ({:.3}ms)",
                    points, dim, clusters, result.iterations, result.elapsed_ms
                );
                for (c, size) in result.cluster_sizes().iter().enumerate() {
                    println!("  cluster {}: {} points", c, size);
                }
                println!("{}", result.prune);
                print!("{}", result.timings);
            }
            Ok(ErrorCode::SUCCESS)
        }

        Commands::Validate { points, dim, clusters, iterations, tests, seed, verbose } => {
            let iterations = iterations.unwrap_or(config.iterations);
            let report =
                benchmark::run_tests(tests, points, dim, clusters, iterations, seed, &config)?;
            if verbose {
                println!("{}", report);
            }
            for error in &report.errors {
                eprintln!("{}", error);
            }
            let status = if report.passed() { "OK" } else { "*** ERROR ***" };
            println!(
                "[TEST]({:3},{:8},{:5},{:5}, {:5})... {}",
                tests, points, dim, clusters, iterations, status
            );
            Ok(if report.passed() {
                ErrorCode::SUCCESS
            } else {
                ErrorCode::VALIDATION_FAILED
            })
        }

        Commands::Suite { verbose } => {
            let failures = benchmark::run_suite(&config, |line, report| {
                println!("{}", line);
                if let (true, Some(report)) = (verbose, report) {
                    println!("{}", report);
                }
            });
            Ok(if failures == 0 {
                ErrorCode::SUCCESS
            } else {
                ErrorCode::VALIDATION_FAILED
            })
        }
    }
}

fn main() -> ExitCode {
    trikmeans::init_logging();
    let cli = Cli::parse();

    let code = match execute(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.code()
        }
    };
    ExitCode::from(code.0 as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iterations_fall_back_to_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, br#"{"iterations": 7}"#).unwrap();
        let path = file.path().to_str().unwrap();

        let cli = Cli::parse_from(["trikmeans", "--config", path, "run"]);
        assert_eq!(load_config(&cli).unwrap().iterations, 7);
        match cli.command {
            Commands::Run { iterations, .. } => assert_eq!(iterations, None),
            _ => panic!("expected run"),
        }

        let cli = Cli::parse_from(["trikmeans", "--config", path, "validate", "-i", "3"]);
        match cli.command {
            Commands::Validate { iterations, .. } => assert_eq!(iterations, Some(3)),
            _ => panic!("expected validate"),
        }
    }
}
