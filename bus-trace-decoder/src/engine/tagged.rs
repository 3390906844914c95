//! Identifier-tagged matching engine
//!
//! Reconstructs read transactions when several may be outstanding at once.
//! Address-issue events are consumed in time order; after each one, data
//! beats that arrive before the next issue are matched to the oldest open
//! transaction of the identifier they carry. A beat with the completion flag
//! set closes that transaction.
//!
//! ## Reset handling
//!
//! A data beat past the current reset boundary abandons every in-flight
//! transaction, across all identifiers, and ends the drain for this issue
//! cycle. Transactions still open when a later issue event passes a reset
//! are abandoned the same way.

use crate::config::AnalyzerConfig;
use crate::engine::queues::{InFlightTransaction, TransactionQueues};
use crate::trace::{AttributeLookup, EventCursor, ResetTracker, TraceSet};
use crate::types::{
    AbandonCause, AnalysisResult, CompletedTransaction, DecoderError, DiagnosticCollector,
    Result, Tick,
};

/// Identifier shared by all transactions when the traces carry none
const IMPLICIT_ID: &str = "";

/// Identifier lookups for the two phases, or none for a single implicit id
struct IdLookups<'a> {
    address: AttributeLookup<'a>,
    data: AttributeLookup<'a>,
}

/// Matching engine for identifier-tagged read channels
pub struct TaggedMatcher;

impl TaggedMatcher {
    /// Match all transactions in `traces`
    ///
    /// # Arguments
    /// * `traces` - Traces of one read channel
    /// * `end_of_time` - Sentinel tick for exhausted cursors
    /// * `config` - Boundary policy and reset value
    ///
    /// # Returns
    /// * Completed transactions in completion order plus diagnostics
    /// * `Err` on the first hard error; no partial result is returned
    pub fn run(
        traces: &TraceSet,
        end_of_time: Tick,
        config: &AnalyzerConfig,
    ) -> Result<AnalysisResult> {
        let boundary = config.boundary;
        let last = traces
            .last
            .as_ref()
            .ok_or_else(|| DecoderError::MissingChannel("r.last".to_string()))?;
        let last = AttributeLookup::new(last, boundary);
        let response = AttributeLookup::new(&traces.response, boundary);
        let ids = match (&traces.address_id, &traces.data_id) {
            (Some(address), Some(data)) => Some(IdLookups {
                address: AttributeLookup::new(address, boundary),
                data: AttributeLookup::new(data, boundary),
            }),
            (None, None) => None,
            _ => {
                return Err(DecoderError::InvalidConfig(
                    "identifier traces ar.id and r.id must be supplied together".to_string(),
                ))
            }
        };

        let mut address = EventCursor::new(&traces.address);
        let mut data = EventCursor::new(&traces.data);
        let mut reset = ResetTracker::new(&traces.reset, &config.reset_active_value, end_of_time);
        let mut queues = TransactionQueues::new();
        let mut diagnostics = DiagnosticCollector::new();
        let mut transactions = Vec::new();

        while let Some(issue_time) = address.advance() {
            if let Some(passed) = reset.advance_to(issue_time) {
                for abandoned in queues.clear_all() {
                    diagnostics.unfinished(abandoned.issue_time, AbandonCause::Reset(passed));
                }
            }

            let id = match &ids {
                Some(ids) => ids.address.value_at(issue_time)?,
                None => IMPLICIT_ID,
            };
            let next_issue_time = address.peek_or(end_of_time);
            queues.open(id, InFlightTransaction::new(issue_time, next_issue_time));

            while let Some(beat) = data.peek().filter(|&t| t < next_issue_time) {
                if reset.is_past(beat) {
                    let at = reset.next_reset();
                    for abandoned in queues.clear_all() {
                        diagnostics.unfinished(abandoned.issue_time, AbandonCause::Reset(at));
                    }
                    break;
                }
                data.advance();

                // Everything before this issue was drained in earlier cycles
                // unless a reset cut the drain short.
                if beat < issue_time {
                    diagnostics.orphan(beat);
                    continue;
                }

                let beat_id = match &ids {
                    Some(ids) => ids.data.value_at(beat)?,
                    None => IMPLICIT_ID,
                };
                let head = queues.peek_head(beat_id, beat)?;
                if head.issue_time >= beat {
                    diagnostics.orphan(beat);
                    continue;
                }
                head.observe_beat(beat);

                let response_code = response.value_at(beat)?;
                if last.flag_at(beat)? {
                    let done = queues.complete_head(beat_id, beat)?;
                    let completed = CompletedTransaction {
                        issue_time: done.issue_time,
                        first_data_time: done.first_data_time.unwrap_or(beat),
                        last_data_time: beat,
                        response_code: response_code.to_string(),
                        next_issue_time: done.next_issue_time,
                    };
                    log::debug!(
                        "completed id={} issue={} first={} last={} resp={}",
                        beat_id,
                        completed.issue_time,
                        completed.first_data_time,
                        completed.last_data_time,
                        completed.response_code
                    );
                    transactions.push(completed);
                }
            }
        }

        for abandoned in queues.clear_all() {
            diagnostics.unfinished(abandoned.issue_time, AbandonCause::EndOfTrace);
        }

        Ok(AnalysisResult {
            transactions,
            diagnostics: diagnostics.into_inner(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BoundaryPolicy;
    use crate::types::{Diagnostic, TimedSample, Trace};

    fn attr(channel: &str, samples: &[(Tick, &str)]) -> Trace {
        Trace::new(
            channel,
            samples.iter().map(|&(t, v)| TimedSample::new(t, v)).collect(),
        )
        .unwrap()
    }

    #[allow(clippy::too_many_arguments)]
    fn tagged(
        end: Tick,
        reset: &[(Tick, &str)],
        ar: &[Tick],
        r: &[Tick],
        ar_id: &[(Tick, &str)],
        r_id: &[(Tick, &str)],
        r_last: &[(Tick, &str)],
        resp: &[(Tick, &str)],
    ) -> TraceSet {
        TraceSet::new(
            Trace::from_times("clk", &[0, end]).unwrap(),
            attr("rst", reset),
            Trace::from_times("ar", ar).unwrap(),
            Trace::from_times("r", r).unwrap(),
            attr("r.resp", resp),
        )
        .with_identifiers(attr("ar.id", ar_id), attr("r.id", r_id))
        .with_last(attr("r.last", r_last))
    }

    #[test]
    fn test_multi_beat_burst() {
        let traces = tagged(
            200,
            &[],
            &[10, 100],
            &[15, 20],
            &[(0, "1")],
            &[(0, "1")],
            &[(0, "0"), (20, "1")],
            &[(0, "OK")],
        );
        let result = TaggedMatcher::run(&traces, 200, &AnalyzerConfig::new()).unwrap();
        assert_eq!(result.records(), vec![(10, 15, 20, 20, "OK".to_string(), 100)]);
        // The transaction issued at 100 never sees a beat
        assert_eq!(
            result.diagnostics,
            vec![Diagnostic::UnfinishedTransaction {
                issue_time: 100,
                cause: AbandonCause::EndOfTrace,
            }]
        );
    }

    #[test]
    fn test_fifo_within_identifier() {
        let traces = tagged(
            100,
            &[],
            &[10, 11],
            &[20, 30],
            &[(0, "3")],
            &[(0, "3")],
            &[(0, "1")],
            &[(0, "00")],
        );
        let result = TaggedMatcher::run(&traces, 100, &AnalyzerConfig::new()).unwrap();
        let issues: Vec<Tick> = result.transactions.iter().map(|t| t.issue_time).collect();
        assert_eq!(issues, vec![10, 11]);
        assert_eq!(result.transactions[1].last_data_time, 30);
    }

    #[test]
    fn test_unknown_identifier_is_fatal() {
        let traces = tagged(
            100,
            &[],
            &[10],
            &[20],
            &[(0, "1")],
            &[(0, "9")],
            &[(0, "1")],
            &[(0, "00")],
        );
        let err = TaggedMatcher::run(&traces, 100, &AnalyzerConfig::new()).unwrap_err();
        assert_eq!(
            err,
            DecoderError::UnknownIdentifier {
                id: "9".to_string(),
                time: 20,
            }
        );
    }

    #[test]
    fn test_missing_response_is_fatal() {
        let traces = tagged(
            100,
            &[],
            &[10],
            &[20],
            &[(0, "1")],
            &[(0, "1")],
            &[(0, "1")],
            &[(25, "00")],
        );
        let err = TaggedMatcher::run(&traces, 100, &AnalyzerConfig::new()).unwrap_err();
        assert!(matches!(err, DecoderError::MissingAttribute { time: 20, .. }));
    }

    #[test]
    fn test_boundary_policy_changes_sampled_flag() {
        // last rises exactly on the beat tick
        let traces = tagged(
            100,
            &[],
            &[10],
            &[20],
            &[(0, "1")],
            &[(0, "1")],
            &[(0, "0"), (20, "1")],
            &[(0, "00")],
        );
        let at_or_before = TaggedMatcher::run(&traces, 100, &AnalyzerConfig::new()).unwrap();
        assert_eq!(at_or_before.transactions.len(), 1);

        let strict = AnalyzerConfig::new().with_boundary(BoundaryPolicy::StrictlyBefore);
        let strictly_before = TaggedMatcher::run(&traces, 100, &strict).unwrap();
        assert!(strictly_before.transactions.is_empty());
        assert_eq!(strictly_before.unfinished(), vec![10]);
    }

    #[test]
    fn test_issue_past_reset_abandons_open_work() {
        // id 1 is opened, reset hits, id 1 beat arrives after a new issue
        let traces = tagged(
            100,
            &[(0, "0"), (12, "1"), (13, "0")],
            &[10, 15],
            &[20],
            &[(0, "1"), (15, "2")],
            &[(0, "2")],
            &[(0, "1")],
            &[(0, "00")],
        );
        let result = TaggedMatcher::run(&traces, 100, &AnalyzerConfig::new()).unwrap();
        assert_eq!(result.records(), vec![(15, 20, 20, 20, "00".to_string(), 100)]);
        assert_eq!(
            result.diagnostics,
            vec![Diagnostic::UnfinishedTransaction {
                issue_time: 10,
                cause: AbandonCause::Reset(12),
            }]
        );
    }

    #[test]
    fn test_stale_beats_after_reset_are_orphans() {
        let traces = tagged(
            100,
            &[(0, "0"), (12, "1"), (13, "0")],
            &[10, 30],
            &[20, 25, 35],
            &[(0, "1")],
            &[(0, "1")],
            &[(0, "1")],
            &[(0, "00")],
        );
        let result = TaggedMatcher::run(&traces, 100, &AnalyzerConfig::new()).unwrap();
        assert_eq!(result.records(), vec![(30, 35, 35, 35, "00".to_string(), 100)]);
        assert_eq!(result.unfinished(), vec![10]);
        assert_eq!(result.orphan_beats(), vec![20, 25]);
    }

    #[test]
    fn test_implicit_identifier() {
        let traces = TraceSet::new(
            Trace::from_times("clk", &[0, 100]).unwrap(),
            Trace::empty("rst"),
            Trace::from_times("ar", &[10, 12]).unwrap(),
            Trace::from_times("r", &[14, 16]).unwrap(),
            attr("r.resp", &[(0, "00"), (16, "10")]),
        )
        .with_last(attr("r.last", &[(0, "1")]));
        let result = TaggedMatcher::run(&traces, 100, &AnalyzerConfig::new()).unwrap();
        assert_eq!(
            result.records(),
            vec![
                (10, 14, 14, 14, "00".to_string(), 12),
                (12, 16, 16, 16, "10".to_string(), 100),
            ]
        );
    }

    #[test]
    fn test_half_identifier_pair_rejected() {
        let mut traces = tagged(
            100,
            &[],
            &[10],
            &[20],
            &[(0, "1")],
            &[(0, "1")],
            &[(0, "1")],
            &[(0, "00")],
        );
        traces.data_id = None;
        assert!(matches!(
            TaggedMatcher::run(&traces, 100, &AnalyzerConfig::new()),
            Err(DecoderError::InvalidConfig(_))
        ));
    }
}
