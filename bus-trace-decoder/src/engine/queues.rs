//! Per-identifier in-flight transaction queues
//!
//! Ordering is only guaranteed per identifier: the head of each queue is the
//! oldest unmatched transaction for that identifier. Queues are created on
//! first use and only ever accessed by key.

use crate::types::{DecoderError, Result, Tick};
use std::collections::{HashMap, VecDeque};

/// A transaction waiting for its completing data beat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InFlightTransaction {
    /// Tick of the address-issue handshake
    pub issue_time: Tick,
    /// Following address-issue tick (or end of trace), fixed at creation
    pub next_issue_time: Tick,
    /// Set by the first data beat matched to this transaction
    pub first_data_time: Option<Tick>,
}

impl InFlightTransaction {
    pub fn new(issue_time: Tick, next_issue_time: Tick) -> Self {
        Self {
            issue_time,
            next_issue_time,
            first_data_time: None,
        }
    }

    /// Record a data beat; only the first one sticks
    pub fn observe_beat(&mut self, time: Tick) {
        if self.first_data_time.is_none() {
            self.first_data_time = Some(time);
        }
    }
}

/// Map from identifier to its FIFO of in-flight transactions
#[derive(Debug, Default)]
pub struct TransactionQueues {
    queues: HashMap<String, VecDeque<InFlightTransaction>>,
}

impl TransactionQueues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transaction to the queue for `id`
    pub fn open(&mut self, id: &str, transaction: InFlightTransaction) {
        let issue_time = transaction.issue_time;
        self.queues
            .entry(id.to_string())
            .or_default()
            .push_back(transaction);
        log::debug!(
            "open transaction id={} at {} ({} in flight)",
            id,
            issue_time,
            self.pending(id)
        );
    }

    /// Oldest in-flight transaction for `id`
    ///
    /// # Errors
    /// [`DecoderError::UnknownIdentifier`] when nothing is open for `id`;
    /// `time` is the tick of the beat that asked.
    pub fn peek_head(&mut self, id: &str, time: Tick) -> Result<&mut InFlightTransaction> {
        self.queues
            .get_mut(id)
            .and_then(|queue| queue.front_mut())
            .ok_or_else(|| DecoderError::UnknownIdentifier {
                id: id.to_string(),
                time,
            })
    }

    /// Remove and return the head for `id`
    pub fn complete_head(&mut self, id: &str, time: Tick) -> Result<InFlightTransaction> {
        let queue = self.queues.get_mut(id);
        let head = queue.and_then(|queue| queue.pop_front());
        match head {
            Some(transaction) => {
                if self.queues.get(id).is_some_and(|q| q.is_empty()) {
                    self.queues.remove(id);
                }
                Ok(transaction)
            }
            None => Err(DecoderError::UnknownIdentifier {
                id: id.to_string(),
                time,
            }),
        }
    }

    /// Drain every queue; the result is ordered by issue time
    pub fn clear_all(&mut self) -> Vec<InFlightTransaction> {
        let mut all: Vec<InFlightTransaction> = self
            .queues
            .drain()
            .flat_map(|(_, queue)| queue.into_iter())
            .collect();
        all.sort_by_key(|t| t.issue_time);
        all
    }

    /// Total number of in-flight transactions
    pub fn len(&self) -> usize {
        self.queues.values().map(VecDeque::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of in-flight transactions for one identifier
    pub fn pending(&self, id: &str) -> usize {
        self.queues.get(id).map_or(0, VecDeque::len)
    }
}
