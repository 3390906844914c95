//! Single-outstanding matching variant
//!
//! For read channels without identifier tagging, where at most one
//! transaction is in flight at a time. Each address issue is paired with the
//! first data beat after it; that beat is both the first and the last beat of
//! the transaction.
//!
//! Two modes:
//! - **Reset-aware** (default): the beat must arrive before the next issue
//!   and strictly before the next reset assertion.
//! - **Reset-free** (`ignore_reset`): the first later beat always matches,
//!   even one that arrives after the next issue. Used when the host has no
//!   reset line to offer.

use crate::config::AnalyzerConfig;
use crate::trace::{AttributeLookup, EventCursor, ResetTracker, TraceSet};
use crate::types::{
    AbandonCause, AnalysisResult, CompletedTransaction, DiagnosticCollector, Result, Tick,
};

/// Matching engine for identifier-less read channels
pub struct SingleOutstandingMatcher;

impl SingleOutstandingMatcher {
    /// Match all transactions in `traces`
    ///
    /// Data beats at or before an issue tick, and beats left over at the end
    /// of the trace, are reported as orphans.
    pub fn run(
        traces: &TraceSet,
        end_of_time: Tick,
        config: &AnalyzerConfig,
    ) -> Result<AnalysisResult> {
        let response = AttributeLookup::new(&traces.response, config.boundary);
        let bounded = !config.ignore_reset;
        let mut reset = if bounded {
            ResetTracker::new(&traces.reset, &config.reset_active_value, end_of_time)
        } else {
            log::debug!("reset ignored, matching first beat after each issue");
            ResetTracker::never(end_of_time)
        };

        let mut address = EventCursor::new(&traces.address);
        let mut data = EventCursor::new(&traces.data);
        let mut diagnostics = DiagnosticCollector::new();
        let mut transactions = Vec::new();

        while let Some(issue_time) = address.advance() {
            reset.advance_to(issue_time);
            while let Some(stale) = data.advance_if(|t| t <= issue_time) {
                diagnostics.orphan(stale);
            }

            let next_issue_time = address.peek_or(end_of_time);
            let candidate = data.peek().filter(|&t| !bounded || t < next_issue_time);
            match candidate {
                Some(read) if reset.is_sentinel() || read < reset.next_reset() => {
                    data.advance();
                    let response_code = response.value_at(read)?.to_string();
                    log::debug!(
                        "completed issue={} read={} resp={}",
                        issue_time,
                        read,
                        response_code
                    );
                    transactions.push(CompletedTransaction {
                        issue_time,
                        first_data_time: read,
                        last_data_time: read,
                        response_code,
                        next_issue_time,
                    });
                }
                Some(_) => {
                    diagnostics.unfinished(issue_time, AbandonCause::Reset(reset.next_reset()));
                }
                None => {
                    let cause = if !reset.is_sentinel() && reset.next_reset() < next_issue_time {
                        AbandonCause::Reset(reset.next_reset())
                    } else if address.peek().is_some() {
                        AbandonCause::NextIssue(next_issue_time)
                    } else {
                        AbandonCause::EndOfTrace
                    };
                    diagnostics.unfinished(issue_time, cause);
                }
            }
        }

        if !data.is_exhausted() {
            log::debug!("{} data beat(s) left after the last issue", data.remaining());
        }
        for leftover in data {
            diagnostics.orphan(leftover);
        }

        Ok(AnalysisResult {
            transactions,
            diagnostics: diagnostics.into_inner(),
        })
    }
}
