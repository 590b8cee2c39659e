//! Encoder — orchestrates Signal → PRR → IRR for one client
//!
//! An encoder is bound to one configuration, cohort, secret and reporting
//! mode for its whole life. The mode is resolved at build time into a
//! `Pipeline` that carries the basic signaller when one is needed, so a
//! BASIC encoder without a bloom source cannot exist.
//!
//! ```text
//! encode(value)
//!   ├─ cache hit  ─────────────────────────┐
//!   └─ cache miss → bloom → PRR → store ───┤
//!                                          ├─ *ONE-TIME → PRR
//!                                          └─ otherwise → IRR(PRR)
//! ```

pub mod config;
pub mod mode;

pub use config::EncoderConfig;
pub use mode::ReportingMode;

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};
use zeroize::Zeroizing;

use crate::cache::{MemoryPrrCache, PrrCache};
use crate::noise::{compute_irr, compute_prr, CsprngNoiseSource, NoiseMaskSource};
use crate::signal::{compute_bloom, BasicSignaller};
use crate::EncoderError;

/// Stages selected for an encoder, with the data each one needs
enum Pipeline {
    Standard,
    OneTime,
    Basic(Box<dyn BasicSignaller>),
    BasicOneTime(Box<dyn BasicSignaller>),
}

impl Pipeline {
    fn mode(&self) -> ReportingMode {
        match self {
            Pipeline::Standard => ReportingMode::Standard,
            Pipeline::OneTime => ReportingMode::OneTime,
            Pipeline::Basic(_) => ReportingMode::Basic,
            Pipeline::BasicOneTime(_) => ReportingMode::BasicOneTime,
        }
    }
}

/// All three stages for one value, as written by simulation harnesses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedReport {
    pub bloom: u32,
    pub prr: u32,
    /// Equal to `prr` in the one-time modes
    pub irr: u32,
}

/// Collects the optional parts of an [`Encoder`] before validation
pub struct EncoderBuilder {
    config: EncoderConfig,
    cohort: u32,
    secret: Zeroizing<String>,
    mode: ReportingMode,
    noise: Option<Box<dyn NoiseMaskSource>>,
    cache: Option<Arc<dyn PrrCache>>,
    signaller: Option<Box<dyn BasicSignaller>>,
}

impl EncoderBuilder {
    pub fn new(config: EncoderConfig, cohort: u32, secret: impl Into<String>) -> Self {
        Self {
            config,
            cohort,
            secret: Zeroizing::new(secret.into()),
            mode: ReportingMode::default(),
            noise: None,
            cache: None,
            signaller: None,
        }
    }

    pub fn mode(mut self, mode: ReportingMode) -> Self {
        self.mode = mode;
        self
    }

    /// Replace the default OS-backed noise source
    pub fn noise_source(mut self, source: impl NoiseMaskSource + 'static) -> Self {
        self.noise = Some(Box::new(source));
        self
    }

    /// Replace the default in-memory cache with one owned by this encoder
    pub fn cache(mut self, cache: impl PrrCache + 'static) -> Self {
        self.cache = Some(Arc::new(cache));
        self
    }

    /// Use a cache that is also held elsewhere.
    ///
    /// Entries are keyed by value alone, so every encoder sharing a cache
    /// must have the same secret, cohort and configuration. Sharing across
    /// clients returns one client's PRR to another.
    pub fn shared_cache(mut self, cache: Arc<dyn PrrCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Bloom source for the BASIC modes
    pub fn basic_signaller(mut self, signaller: impl BasicSignaller + 'static) -> Self {
        self.signaller = Some(Box::new(signaller));
        self
    }

    pub fn build(self) -> Result<Encoder, EncoderError> {
        self.config.validate()?;
        self.config.validate_cohort(self.cohort)?;

        let pipeline = match (self.mode, self.signaller) {
            (ReportingMode::Standard, signaller) => {
                if signaller.is_some() {
                    debug!("Basic signaller ignored in STANDARD mode");
                }
                Pipeline::Standard
            }
            (ReportingMode::OneTime, signaller) => {
                if signaller.is_some() {
                    debug!("Basic signaller ignored in ONE-TIME mode");
                }
                Pipeline::OneTime
            }
            (ReportingMode::Basic, Some(signaller)) => Pipeline::Basic(signaller),
            (ReportingMode::BasicOneTime, Some(signaller)) => Pipeline::BasicOneTime(signaller),
            (mode, None) => {
                return Err(EncoderError::Configuration(format!(
                    "{} mode requires a basic signaller",
                    mode
                )));
            }
        };

        debug!(
            "Encoder ready: mode={} bloom_bits={} hashes={} cohort={}",
            pipeline.mode(),
            self.config.bloom_bits,
            self.config.hashes,
            self.cohort
        );

        Ok(Encoder {
            config: self.config,
            cohort: self.cohort,
            secret: self.secret,
            pipeline,
            noise: self
                .noise
                .unwrap_or_else(|| Box::new(CsprngNoiseSource::new())),
            cache: self
                .cache
                .unwrap_or_else(|| Arc::new(MemoryPrrCache::new())),
        })
    }
}

/// RAPPOR encoder for a single client identity
pub struct Encoder {
    config: EncoderConfig,
    cohort: u32,
    secret: Zeroizing<String>,
    pipeline: Pipeline,
    noise: Box<dyn NoiseMaskSource>,
    cache: Arc<dyn PrrCache>,
}

impl Encoder {
    /// Encoder with the default noise source and a private in-memory cache
    pub fn new(
        config: EncoderConfig,
        cohort: u32,
        secret: impl Into<String>,
        mode: ReportingMode,
    ) -> Result<Self, EncoderError> {
        EncoderBuilder::new(config, cohort, secret).mode(mode).build()
    }

    pub fn builder(config: EncoderConfig, cohort: u32, secret: impl Into<String>) -> EncoderBuilder {
        EncoderBuilder::new(config, cohort, secret)
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    pub fn cohort(&self) -> u32 {
        self.cohort
    }

    pub fn mode(&self) -> ReportingMode {
        self.pipeline.mode()
    }

    /// Produce the report to transmit for `value`: the PRR in one-time
    /// modes, a freshly randomized IRR otherwise.
    pub fn encode(&mut self, value: &str) -> u32 {
        let prr = self.permanent_response(value, None);
        match self.pipeline {
            Pipeline::OneTime | Pipeline::BasicOneTime(_) => prr,
            Pipeline::Standard | Pipeline::Basic(_) => self.instantaneous_response(prr),
        }
    }

    /// Like [`encode`](Self::encode), also returning the bloom value and PRR.
    ///
    /// The bloom value is computed once per call and a cache miss derives
    /// the PRR from that same value; a hit still returns the cached PRR.
    pub fn encode_report(&mut self, value: &str) -> EncodedReport {
        let bloom = self.bloom(value);
        let prr = self.permanent_response(value, Some(bloom));
        let irr = match self.pipeline {
            Pipeline::OneTime | Pipeline::BasicOneTime(_) => prr,
            Pipeline::Standard | Pipeline::Basic(_) => self.instantaneous_response(prr),
        };
        EncodedReport { bloom, prr, irr }
    }

    fn bloom(&self, value: &str) -> u32 {
        match &self.pipeline {
            Pipeline::Standard | Pipeline::OneTime => compute_bloom(
                value,
                self.cohort,
                self.config.hashes,
                self.config.bloom_bits,
            ),
            Pipeline::Basic(signaller) | Pipeline::BasicOneTime(signaller) => {
                signaller.signal(value) & self.config.bloom_mask()
            }
        }
    }

    /// Cached PRR for `value`, derived on a miss from `bloom` if given,
    /// otherwise from a freshly computed bloom value.
    fn permanent_response(&self, value: &str, bloom: Option<u32>) -> u32 {
        let mut derived = false;
        let prr = self.cache.get_or_insert_with(value, &mut || {
            derived = true;
            compute_prr(
                bloom.unwrap_or_else(|| self.bloom(value)),
                self.secret.as_bytes(),
                self.config.f_prob,
                self.config.bloom_bits,
            )
        });

        if derived {
            trace!("PRR cache miss, derived and stored");
        } else {
            trace!("PRR cache hit");
        }
        prr
    }

    fn instantaneous_response(&mut self, prr: u32) -> u32 {
        compute_irr(
            prr,
            self.noise.as_mut(),
            self.config.p_prob,
            self.config.q_prob,
            self.config.bloom_bits,
        )
    }
}

impl fmt::Debug for Encoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Encoder")
            .field("config", &self.config)
            .field("cohort", &self.cohort)
            .field("secret", &"<redacted>")
            .field("mode", &self.mode())
            .finish()
    }
}
