// Batch simulation harness
//
// Reads `client,cohort,value` records and writes `client,cohort,bloom,prr,irr`
// with every mask rendered as a bit string. Each record gets its own
// encoder keyed by the client id, matching how a fleet of real clients
// would report.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io;
use tracing::info;
use wrappor_core::{bit_string, Encoder, EncoderConfig, ReportingMode};

use crate::store::SledPrrCache;

/// Log progress every this many records
const PROGRESS_INTERVAL: usize = 100_000;

#[derive(Debug, Clone, Deserialize)]
pub struct InputRecord {
    pub client: String,
    pub cohort: u32,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputRecord {
    pub client: String,
    pub cohort: u32,
    pub bloom: String,
    pub prr: String,
    pub irr: String,
}

pub struct Simulation {
    pub config: EncoderConfig,
    pub mode: ReportingMode,
    /// Durable PRR store shared by every client, if any
    pub cache_db: Option<sled::Db>,
}

impl Simulation {
    /// Encode a single record. The client id doubles as the PRR secret.
    pub fn encode_record(&self, record: &InputRecord) -> Result<OutputRecord> {
        let mut builder =
            Encoder::builder(self.config, record.cohort, record.client.as_str()).mode(self.mode);
        if let Some(db) = &self.cache_db {
            builder = builder.cache(SledPrrCache::new(db.clone(), &record.client, record.cohort));
        }
        let mut encoder = builder
            .build()
            .with_context(|| format!("Cannot encode for client {}", record.client))?;

        let report = encoder.encode_report(&record.value);
        let width = self.config.bloom_bits;
        Ok(OutputRecord {
            client: record.client.clone(),
            cohort: record.cohort,
            bloom: bit_string(report.bloom, width),
            prr: bit_string(report.prr, width),
            irr: bit_string(report.irr, width),
        })
    }

    /// Stream every record from `input` to `output`; returns the record count.
    pub fn run<R: io::Read, W: io::Write>(&self, input: R, output: W) -> Result<usize> {
        let mut reader = csv::Reader::from_reader(input);
        let mut writer = csv::Writer::from_writer(output);
        let mut processed = 0usize;

        for (line, row) in reader.deserialize::<InputRecord>().enumerate() {
            // header is line 1
            let record =
                row.with_context(|| format!("Malformed input record on line {}", line + 2))?;
            let encoded = self.encode_record(&record)?;
            writer
                .serialize(&encoded)
                .context("Failed to write output record")?;

            processed += 1;
            if processed % PROGRESS_INTERVAL == 0 {
                info!("Total processed: {}", processed);
            }
        }

        writer.flush().context("Failed to flush output")?;
        if let Some(db) = &self.cache_db {
            db.flush().context("Failed to flush PRR cache")?;
        }
        Ok(processed)
    }
}
