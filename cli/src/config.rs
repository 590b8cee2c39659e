// Configuration loading for the wrappor CLI
//
// Encoder parameters resolve in three layers, later wins:
//   1. built-in defaults (EncoderConfig::default)
//   2. JSON config file: --config <path>, else ~/.config/wrappor/config.json
//   3. command-line flags

use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use wrappor_core::EncoderConfig;

/// Encoder parameters accepted by every subcommand
#[derive(Debug, Clone, Default, Args)]
pub struct EncoderArgs {
    /// JSON file with encoder parameters (camelCase field names)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Bloom filter width in bits (1-32)
    #[arg(long)]
    pub bloom_bits: Option<u32>,

    /// Hash positions per value (1-16)
    #[arg(long)]
    pub hashes: Option<u32>,

    /// Number of cohorts in the population
    #[arg(long)]
    pub cohorts: Option<u32>,

    /// IRR probability of reporting 1 for a PRR 0 bit
    #[arg(short = 'p', long = "p-prob")]
    pub p_prob: Option<f64>,

    /// IRR probability of reporting 1 for a PRR 1 bit
    #[arg(short = 'q', long = "q-prob")]
    pub q_prob: Option<f64>,

    /// PRR probability of replacing a bloom bit
    #[arg(short = 'f', long = "f-prob")]
    pub f_prob: Option<f64>,
}

impl EncoderArgs {
    /// Resolve the effective encoder configuration
    pub fn resolve(&self) -> Result<EncoderConfig> {
        let mut config = match &self.config {
            Some(path) => load_file(path)?,
            None => match default_config_file() {
                Some(path) if path.exists() => load_file(&path)?,
                _ => EncoderConfig::default(),
            },
        };

        if let Some(bits) = self.bloom_bits {
            config.bloom_bits = bits;
        }
        if let Some(hashes) = self.hashes {
            config.hashes = hashes;
        }
        if let Some(cohorts) = self.cohorts {
            config.total_cohorts = cohorts;
        }
        if let Some(p) = self.p_prob {
            config.p_prob = p;
        }
        if let Some(q) = self.q_prob {
            config.q_prob = q;
        }
        if let Some(f) = self.f_prob {
            config.f_prob = f;
        }

        config.validate().context("Invalid encoder configuration")?;
        Ok(config)
    }
}

/// ~/.config/wrappor/config.json (platform equivalent elsewhere)
pub fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("wrappor").join("config.json"))
}

pub fn load_file(path: &Path) -> Result<EncoderConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: EncoderConfig = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    Ok(config)
}
