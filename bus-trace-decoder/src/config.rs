//! Analyzer configuration types
//!
//! This module defines the configuration consumed by the analyzer. Discovery
//! of signal lines and report rendering belong to the host application; only
//! the knobs that change matching semantics live here.

use crate::types::{DecoderError, Result, Tick};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Configuration for one read-channel analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Matching algorithm to run
    #[serde(default)]
    pub variant: Variant,

    /// Which attribute sample is in effect at a beat's own tick
    #[serde(default)]
    pub boundary: BoundaryPolicy,

    /// Reset sample value that counts as an assertion
    #[serde(default = "default_reset_active_value")]
    pub reset_active_value: String,

    /// Single-outstanding only: match without consulting reset at all
    #[serde(default)]
    pub ignore_reset: bool,

    /// Optional analysis windows `[start, end]` (empty = whole trace)
    #[serde(default)]
    pub intervals: Vec<[Tick; 2]>,

    /// Response code suffixes counted as success by the statistics
    #[serde(default = "default_ok_responses")]
    pub ok_responses: Vec<String>,

    /// Rolling bandwidth window, in clock cycles
    #[serde(default = "default_window_length")]
    pub window_length: u32,

    /// Report the share of windows with bandwidth above this rate
    #[serde(default = "default_x_rate")]
    pub x_rate: f64,

    /// Report the share of windows with bandwidth below this rate
    #[serde(default = "default_y_rate")]
    pub y_rate: f64,
}

fn default_reset_active_value() -> String {
    "1".to_string()
}

fn default_ok_responses() -> Vec<String> {
    vec!["00".to_string(), "01".to_string()]
}

fn default_window_length() -> u32 {
    10_000
}

fn default_x_rate() -> f64 {
    0.0001
}

fn default_y_rate() -> f64 {
    0.00001
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            variant: Variant::default(),
            boundary: BoundaryPolicy::default(),
            reset_active_value: default_reset_active_value(),
            ignore_reset: false,
            intervals: Vec::new(),
            ok_responses: default_ok_responses(),
            window_length: default_window_length(),
            x_rate: default_x_rate(),
            y_rate: default_y_rate(),
        }
    }
}

/// Matching algorithm
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Identifier-tagged, multiple outstanding transactions, `last` flag
    #[default]
    Tagged,
    /// No identifiers, at most one transaction in flight
    SingleOutstanding,
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Tagged => write!(f, "tagged"),
            Variant::SingleOutstanding => write!(f, "single_outstanding"),
        }
    }
}

impl std::str::FromStr for Variant {
    type Err = DecoderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "tagged" | "full" => Ok(Variant::Tagged),
            "single_outstanding" | "single" | "lite" => Ok(Variant::SingleOutstanding),
            other => Err(DecoderError::InvalidConfig(format!(
                "unknown analyzer variant '{}'",
                other
            ))),
        }
    }
}

/// Comparison used by point-in-time attribute lookups
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// A sample taken at the query tick is visible (`<=`)
    #[default]
    AtOrBefore,
    /// Only samples taken before the query tick are visible (`<`)
    StrictlyBefore,
}

impl BoundaryPolicy {
    /// Whether a sample at `sample_time` is in effect at `query_time`
    pub fn admits(self, sample_time: Tick, query_time: Tick) -> bool {
        match self {
            BoundaryPolicy::AtOrBefore => sample_time <= query_time,
            BoundaryPolicy::StrictlyBefore => sample_time < query_time,
        }
    }
}

impl std::str::FromStr for BoundaryPolicy {
    type Err = DecoderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "at_or_before" | "le" => Ok(BoundaryPolicy::AtOrBefore),
            "strictly_before" | "lt" => Ok(BoundaryPolicy::StrictlyBefore),
            other => Err(DecoderError::InvalidConfig(format!(
                "unknown boundary policy '{}'",
                other
            ))),
        }
    }
}

impl AnalyzerConfig {
    /// Create a new analyzer configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: select the matching variant
    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variant = variant;
        self
    }

    /// Builder method: select the attribute lookup boundary
    pub fn with_boundary(mut self, boundary: BoundaryPolicy) -> Self {
        self.boundary = boundary;
        self
    }

    /// Builder method: set the reset assertion value
    pub fn with_reset_active_value(mut self, value: impl Into<String>) -> Self {
        self.reset_active_value = value.into();
        self
    }

    /// Builder method: ignore reset in the single-outstanding variant
    pub fn with_ignore_reset(mut self, enabled: bool) -> Self {
        self.ignore_reset = enabled;
        self
    }

    /// Builder method: add an analysis window
    pub fn add_interval(mut self, start: Tick, end: Tick) -> Self {
        self.intervals.push([start, end]);
        self
    }

    /// Builder method: replace the success response suffixes
    pub fn with_ok_responses(mut self, responses: Vec<String>) -> Self {
        self.ok_responses = responses;
        self
    }

    /// Builder method: set the rolling bandwidth window (clock cycles)
    pub fn with_window_length(mut self, cycles: u32) -> Self {
        self.window_length = cycles;
        self
    }

    /// Builder method: set the above/below bandwidth thresholds
    pub fn with_rates(mut self, x_rate: f64, y_rate: f64) -> Self {
        self.x_rate = x_rate;
        self.y_rate = y_rate;
        self
    }

    /// Check intervals and the bandwidth window are well formed
    pub fn validate(&self) -> Result<()> {
        if self.window_length == 0 {
            return Err(DecoderError::InvalidConfig(
                "window_length must be at least one clock cycle".to_string(),
            ));
        }
        for &[start, end] in &self.intervals {
            if start > end {
                return Err(DecoderError::InvalidInterval { start, end });
            }
        }
        Ok(())
    }

    /// Analysis windows, defaulting to the whole trace
    pub fn windows(&self, end_of_time: Tick) -> Vec<(Tick, Tick)> {
        if self.intervals.is_empty() {
            vec![(0, end_of_time)]
        } else {
            self.intervals
                .iter()
                .map(|&[start, end]| (start, end.min(end_of_time)))
                .collect()
        }
    }

    /// Whether a response code counts as success
    pub fn is_ok_response(&self, response: &str) -> bool {
        self.ok_responses.iter().any(|ok| response.ends_with(ok.as_str()))
    }
}
