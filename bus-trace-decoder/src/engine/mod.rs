//! Transaction matching engines
//!
//! Both engines replay a fully captured trace set once, in global timestamp
//! order, and return completed transactions plus soft diagnostics.

pub mod queues;
pub mod single;
pub mod tagged;

pub use queues::{InFlightTransaction, TransactionQueues};
pub use single::SingleOutstandingMatcher;
pub use tagged::TaggedMatcher;

use crate::config::{AnalyzerConfig, Variant};
use crate::trace::TraceSet;
use crate::types::{AnalysisResult, Result, Tick};

/// Run the engine selected by `config.variant`
pub fn run_variant(
    traces: &TraceSet,
    end_of_time: Tick,
    config: &AnalyzerConfig,
) -> Result<AnalysisResult> {
    match config.variant {
        Variant::Tagged => TaggedMatcher::run(traces, end_of_time, config),
        Variant::SingleOutstanding => SingleOutstandingMatcher::run(traces, end_of_time, config),
    }
}
