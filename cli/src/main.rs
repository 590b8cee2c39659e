// wrappor — RAPPOR encoding from the command line
//
// `simulate` runs the batch harness over a CSV population; `encode` reports a
// single value; `config` prints the effective encoder parameters.

mod config;
mod simulate;
mod store;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use tracing::info;
use wrappor_core::{bit_string, Encoder, ReportingMode};

use config::EncoderArgs;
use simulate::Simulation;

#[derive(Parser)]
#[command(name = "wrappor")]
#[command(about = "Wrappor — RAPPOR client-side encoder", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a CSV population (client,cohort,value) into bloom/prr/irr bit strings
    Simulate {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// STANDARD or ONE-TIME
        #[arg(short, long, default_value = "STANDARD")]
        mode: ReportingMode,
        /// Keep PRRs in a sled database so they persist across runs
        #[arg(long, value_name = "DIR")]
        cache_dir: Option<PathBuf>,
        #[command(flatten)]
        encoder: EncoderArgs,
    },
    /// Encode one value and print every stage
    Encode {
        value: String,
        #[arg(short, long, default_value = "0")]
        cohort: u32,
        #[arg(short, long)]
        secret: String,
        #[arg(short, long, default_value = "STANDARD")]
        mode: ReportingMode,
        /// Bloom value as a bit string, required for the BASIC modes
        #[arg(long)]
        bloom: Option<String>,
        #[command(flatten)]
        encoder: EncoderArgs,
    },
    /// Print the effective encoder configuration as JSON
    Config {
        #[command(flatten)]
        encoder: EncoderArgs,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            input,
            output,
            mode,
            cache_dir,
            encoder,
        } => cmd_simulate(input, output, mode, cache_dir, encoder),
        Commands::Encode {
            value,
            cohort,
            secret,
            mode,
            bloom,
            encoder,
        } => cmd_encode(value, cohort, secret, mode, bloom, encoder),
        Commands::Config { encoder } => cmd_config(encoder),
    }
}

fn cmd_simulate(
    input: PathBuf,
    output: PathBuf,
    mode: ReportingMode,
    cache_dir: Option<PathBuf>,
    args: EncoderArgs,
) -> Result<()> {
    let config = args.resolve()?;
    let cache_db = match cache_dir {
        Some(dir) => Some(store::open_cache_db(&dir, &config)?),
        None => None,
    };

    let reader = File::open(&input)
        .with_context(|| format!("Failed to open input {}", input.display()))?;
    let writer = File::create(&output)
        .with_context(|| format!("Failed to create output {}", output.display()))?;

    info!(
        "Simulating {} → {} (mode={}, bloom_bits={}, hashes={})",
        input.display(),
        output.display(),
        mode,
        config.bloom_bits,
        config.hashes
    );

    let simulation = Simulation {
        config,
        mode,
        cache_db,
    };
    let processed = simulation.run(BufReader::new(reader), BufWriter::new(writer))?;

    info!("Done: {} records written to {}", processed, output.display());
    Ok(())
}

fn cmd_encode(
    value: String,
    cohort: u32,
    secret: String,
    mode: ReportingMode,
    bloom: Option<String>,
    args: EncoderArgs,
) -> Result<()> {
    let config = args.resolve()?;

    let mut builder = Encoder::builder(config, cohort, secret).mode(mode);
    if let Some(bits) = bloom {
        let fixed = parse_bit_string(&bits)?;
        builder = builder.basic_signaller(move |_: &str| fixed);
    }
    let mut encoder = builder.build().context("Failed to build encoder")?;
    let report = encoder.encode_report(&value);
    let width = config.bloom_bits;

    println!("{}", "Report".bold());
    println!("  Mode:   {}", mode.to_string().bright_cyan());
    println!("  Bloom:  {}", bit_string(report.bloom, width));
    println!("  PRR:    {}", bit_string(report.prr, width).bright_yellow());
    println!("  IRR:    {}", bit_string(report.irr, width).bright_green());

    Ok(())
}

fn cmd_config(args: EncoderArgs) -> Result<()> {
    let config = args.resolve()?;
    println!(
        "{}",
        serde_json::to_string_pretty(&config).context("Failed to serialize config")?
    );
    if let Some(path) = config::default_config_file() {
        println!("{} {}", "Default config file:".dimmed(), path.display());
    }
    Ok(())
}

/// Parse an MSB-first bit string of at most 32 characters
fn parse_bit_string(bits: &str) -> Result<u32> {
    if bits.is_empty() || bits.len() > 32 {
        anyhow::bail!("Bit string must hold 1 to 32 bits, got {}", bits.len());
    }
    u32::from_str_radix(bits, 2).with_context(|| format!("Invalid bit string: {}", bits))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bit_string() {
        assert_eq!(parse_bit_string("0010000001000000").unwrap(), 8256);
        assert_eq!(parse_bit_string("1").unwrap(), 1);
        assert!(parse_bit_string("").is_err());
        assert!(parse_bit_string("102").is_err());
        assert!(parse_bit_string(&"1".repeat(33)).is_err());
    }

    #[test]
    fn test_parse_matches_bit_string() {
        assert_eq!(parse_bit_string(&bit_string(57576, 16)).unwrap(), 57576);
    }

    #[test]
    fn test_cli_parses_simulate() {
        let cli = Cli::try_parse_from([
            "wrappor", "simulate", "-i", "in.csv", "-o", "out.csv", "--mode", "ONE-TIME",
            "--bloom-bits", "32", "-f", "0.25",
        ])
        .unwrap();
        match cli.command {
            Commands::Simulate { mode, encoder, .. } => {
                assert_eq!(mode, ReportingMode::OneTime);
                assert_eq!(encoder.bloom_bits, Some(32));
                assert_eq!(encoder.f_prob, Some(0.25));
            }
            _ => panic!("expected simulate"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_mode() {
        assert!(Cli::try_parse_from([
            "wrappor", "encode", "abc", "--secret", "s", "--mode", "SOMETIMES",
        ])
        .is_err());
    }
}
