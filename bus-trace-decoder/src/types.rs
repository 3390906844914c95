//! Core types for the bus trace decoder library
//!
//! This module defines the fundamental types the decoder consumes (sampled
//! signal traces) and emits (completed transactions and diagnostics). The
//! decoder is a pure function of its input traces - it keeps no state between
//! analysis runs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete time axis shared by all traces (clock ticks)
pub type Tick = u64;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecoderError>;

/// A single observation of one logical line
///
/// Serialized as a `(tick, value)` pair, which is the shape hosts hand over
/// after parsing a waveform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(Tick, String)", into = "(Tick, String)")]
pub struct TimedSample {
    /// Tick at which the value was sampled
    pub time: Tick,
    /// Opaque symbol (bit string, identifier, response code...)
    pub value: String,
}

impl TimedSample {
    /// Create a new sample
    pub fn new(time: Tick, value: impl Into<String>) -> Self {
        Self {
            time,
            value: value.into(),
        }
    }
}

impl From<(Tick, String)> for TimedSample {
    fn from((time, value): (Tick, String)) -> Self {
        Self { time, value }
    }
}

impl From<TimedSample> for (Tick, String) {
    fn from(sample: TimedSample) -> Self {
        (sample.time, sample.value)
    }
}

/// A strictly time-ordered sequence of samples for one logical line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trace {
    /// Channel name, used in error messages and diagnostics
    channel: String,
    samples: Vec<TimedSample>,
}

impl Trace {
    /// Build a trace, checking that timestamps strictly increase
    pub fn new(channel: impl Into<String>, samples: Vec<TimedSample>) -> Result<Self> {
        let channel = channel.into();
        for (index, pair) in samples.windows(2).enumerate() {
            if pair[1].time <= pair[0].time {
                return Err(DecoderError::UnorderedTrace {
                    channel,
                    index: index + 1,
                    previous: pair[0].time,
                    time: pair[1].time,
                });
            }
        }
        Ok(Self { channel, samples })
    }

    /// Build an event trace from bare timestamps (value is "event occurred")
    pub fn from_times(channel: impl Into<String>, times: &[Tick]) -> Result<Self> {
        let samples = times.iter().map(|&t| TimedSample::new(t, "1")).collect();
        Self::new(channel, samples)
    }

    /// An empty trace for a channel that never changes
    pub fn empty(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            samples: Vec::new(),
        }
    }

    /// Channel name
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// All samples in time order
    pub fn samples(&self) -> &[TimedSample] {
        &self.samples
    }

    /// Timestamps only, for handshake and reset event traces
    pub fn times(&self) -> impl Iterator<Item = Tick> + '_ {
        self.samples.iter().map(|s| s.time)
    }

    /// Tick of the final sample, if any
    pub fn last_time(&self) -> Option<Tick> {
        self.samples.last().map(|s| s.time)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Keep only samples whose tick satisfies `keep`
    pub fn filtered(&self, mut keep: impl FnMut(Tick) -> bool) -> Self {
        Self {
            channel: self.channel.clone(),
            samples: self
                .samples
                .iter()
                .filter(|s| keep(s.time))
                .cloned()
                .collect(),
        }
    }
}

/// Errors that abort an analysis run
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecoderError {
    #[error("No sample of '{attribute}' is in effect at tick {time}")]
    MissingAttribute { attribute: String, time: Tick },

    #[error("Data beat at tick {time} references identifier '{id}' with no open transaction")]
    UnknownIdentifier { id: String, time: Tick },

    #[error("Trace '{channel}' is not time-ordered: sample {index} at tick {time} follows tick {previous}")]
    UnorderedTrace {
        channel: String,
        index: usize,
        previous: Tick,
        time: Tick,
    },

    #[error("Required channel not supplied: {0}")]
    MissingChannel(String),

    #[error("Clock trace has no samples, end of trace is undefined")]
    EmptyClock,

    #[error("Invalid analysis interval [{start}, {end}]")]
    InvalidInterval { start: Tick, end: Tick },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// A transaction that received its completing data beat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedTransaction {
    /// Tick of the address-issue handshake
    pub issue_time: Tick,
    /// Tick of the first data beat
    pub first_data_time: Tick,
    /// Tick of the beat carrying the completion flag
    pub last_data_time: Tick,
    /// Response code sampled at the last beat
    pub response_code: String,
    /// Tick of the following address-issue event, or end of trace
    pub next_issue_time: Tick,
}

/// Record shape expected by hosts: last data time doubles as response time
pub type TransactionRecord = (Tick, Tick, Tick, Tick, String, Tick);

impl CompletedTransaction {
    /// Response is resolved at the last beat
    pub fn response_time(&self) -> Tick {
        self.last_data_time
    }

    /// Gap between this transaction's response and the next issue
    pub fn delay(&self) -> Tick {
        self.next_issue_time.saturating_sub(self.response_time())
    }

    /// Convert into the fixed-arity host record
    pub fn to_record(&self) -> TransactionRecord {
        (
            self.issue_time,
            self.first_data_time,
            self.last_data_time,
            self.response_time(),
            self.response_code.clone(),
            self.next_issue_time,
        )
    }
}

/// Why an opened transaction never completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbandonCause {
    /// A reset asserted at the given tick before the completing beat
    Reset(Tick),
    /// The next address issue arrived first (single-outstanding variant)
    NextIssue(Tick),
    /// The trace ended first
    EndOfTrace,
}

impl fmt::Display for AbandonCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbandonCause::Reset(t) => write!(f, "reset at {}", t),
            AbandonCause::NextIssue(t) => write!(f, "next issue at {}", t),
            AbandonCause::EndOfTrace => write!(f, "end of trace"),
        }
    }
}

/// Soft conditions recorded alongside the result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Diagnostic {
    /// Transaction opened at `issue_time` was abandoned
    UnfinishedTransaction { issue_time: Tick, cause: AbandonCause },
    /// Data beat observed with no transaction it could belong to
    OrphanDataBeat { time: Tick },
}

impl Diagnostic {
    /// Tick the diagnostic refers to
    pub fn time(&self) -> Tick {
        match self {
            Diagnostic::UnfinishedTransaction { issue_time, .. } => *issue_time,
            Diagnostic::OrphanDataBeat { time } => *time,
        }
    }

    pub fn is_unfinished(&self) -> bool {
        matches!(self, Diagnostic::UnfinishedTransaction { .. })
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnfinishedTransaction { issue_time, cause } => {
                write!(f, "unfinished transaction issued at {} ({})", issue_time, cause)
            }
            Diagnostic::OrphanDataBeat { time } => {
                write!(f, "data beat at {} without an open transaction", time)
            }
        }
    }
}

/// Output of one analysis run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Completed transactions in completion order
    pub transactions: Vec<CompletedTransaction>,
    /// Soft diagnostics in the order they were raised
    pub diagnostics: Vec<Diagnostic>,
}

impl AnalysisResult {
    /// Issue times of every abandoned transaction
    pub fn unfinished(&self) -> Vec<Tick> {
        self.diagnostics
            .iter()
            .filter_map(|d| match d {
                Diagnostic::UnfinishedTransaction { issue_time, .. } => Some(*issue_time),
                _ => None,
            })
            .collect()
    }

    /// Ticks of every orphan data beat
    pub fn orphan_beats(&self) -> Vec<Tick> {
        self.diagnostics
            .iter()
            .filter_map(|d| match d {
                Diagnostic::OrphanDataBeat { time } => Some(*time),
                _ => None,
            })
            .collect()
    }

    /// Host records for every completed transaction
    pub fn records(&self) -> Vec<TransactionRecord> {
        self.transactions.iter().map(|t| t.to_record()).collect()
    }

    /// Append another run's output (used for analysis intervals)
    pub fn extend(&mut self, other: AnalysisResult) {
        self.transactions.extend(other.transactions);
        self.diagnostics.extend(other.diagnostics);
    }
}

/// Collects soft diagnostics and logs each one as it is recorded
#[derive(Debug, Default)]
pub(crate) struct DiagnosticCollector {
    entries: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, diagnostic: Diagnostic) {
        log::warn!("{}", diagnostic);
        self.entries.push(diagnostic);
    }

    pub(crate) fn unfinished(&mut self, issue_time: Tick, cause: AbandonCause) {
        self.record(Diagnostic::UnfinishedTransaction { issue_time, cause });
    }

    pub(crate) fn orphan(&mut self, time: Tick) {
        self.record(Diagnostic::OrphanDataBeat { time });
    }

    pub(crate) fn into_inner(self) -> Vec<Diagnostic> {
        self.entries
    }
}
