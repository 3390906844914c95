//! Transaction statistics
//!
//! Summaries computed from completed transactions, in clock cycles:
//! latency from command to completion and to first data, delay between a
//! response and the next issue, error rate and averaged bandwidth.
//! Windowed bandwidth slides a window of `window_length` cycles over each
//! analysis interval in half-window steps.

use crate::trace::is_asserted;
use crate::types::{CompletedTransaction, Tick, Trace};
use serde::Serialize;
use std::collections::BTreeMap;

/// Durations of one kind, with a log2 histogram
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationSummary {
    pub name: &'static str,
    /// Duration of each transaction in clock cycles
    pub cycles: Vec<u64>,
    /// Bucket number -> count (0 for 0, `ilog2(v) + 1` otherwise)
    pub buckets: BTreeMap<u32, usize>,
}

impl DurationSummary {
    fn new(name: &'static str, cycles: Vec<u64>) -> Self {
        let mut buckets = BTreeMap::new();
        for &c in &cycles {
            *buckets.entry(bucket_num(c)).or_insert(0) += 1;
        }
        Self {
            name,
            cycles,
            buckets,
        }
    }

    pub fn min(&self) -> Option<u64> {
        self.cycles.iter().copied().min()
    }

    pub fn max(&self) -> Option<u64> {
        self.cycles.iter().copied().max()
    }

    pub fn mean(&self) -> Option<f64> {
        if self.cycles.is_empty() {
            return None;
        }
        Some(self.cycles.iter().sum::<u64>() as f64 / self.cycles.len() as f64)
    }

    /// One-line summary, e.g. `Cmd to completion: 2-10 clock cycles`
    pub fn display(&self) -> String {
        match (self.min(), self.max()) {
            (Some(min), Some(max)) => format!("{}: {}-{} clock cycles", self.name, min, max),
            _ => format!("{}: no data", self.name),
        }
    }
}

/// Histogram bucket of a cycle count
pub fn bucket_num(cycles: u64) -> u32 {
    match cycles {
        0 => 0,
        v => v.ilog2() + 1,
    }
}

/// Bandwidth of one sliding window
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BandwidthWindow {
    /// First tick of the window
    pub start: Tick,
    /// Transactions per cycle, weighted by how much of each transaction
    /// falls inside the window
    pub bandwidth: f64,
}

/// Statistics over one analysis result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionStats {
    pub cmd_to_completion: DurationSummary,
    pub cmd_to_first_data: DurationSummary,
    pub last_data_to_completion: DurationSummary,
    pub transaction_delays: DurationSummary,
    /// Issue ticks of transactions with an error response
    pub errors: Vec<Tick>,
    /// Fraction of transactions with an error response
    pub error_rate: f64,
    /// Completed transactions per clock cycle out of reset
    pub averaged_bandwidth: f64,
    pub bandwidth_windows: Vec<BandwidthWindow>,
    /// Fraction of windows with bandwidth above `x_rate`
    pub bandwidth_above_x_rate: f64,
    /// Fraction of windows with bandwidth below `y_rate`
    pub bandwidth_below_y_rate: f64,
    pub clock_period: Tick,
}

impl TransactionStats {
    /// Compute statistics
    ///
    /// # Arguments
    /// * `transactions` - Completed transactions
    /// * `clock_period` - Ticks per clock cycle (0 is treated as 1)
    /// * `analyzed_time` - Ticks covered by the analysis, excluding time in reset
    /// * `is_ok` - Classifies a response code as success
    pub fn from_transactions(
        transactions: &[CompletedTransaction],
        clock_period: Tick,
        analyzed_time: Tick,
        is_ok: impl Fn(&str) -> bool,
    ) -> Self {
        let clock_period = clock_period.max(1);
        let cycles = |start: Tick, end: Tick| end.saturating_sub(start) / clock_period;

        let errors: Vec<Tick> = transactions
            .iter()
            .filter(|t| !is_ok(&t.response_code))
            .map(|t| t.issue_time)
            .collect();
        let error_rate = if transactions.is_empty() {
            0.0
        } else {
            errors.len() as f64 / transactions.len() as f64
        };
        let analyzed_cycles = analyzed_time / clock_period;
        let averaged_bandwidth = if analyzed_cycles == 0 {
            0.0
        } else {
            transactions.len() as f64 / analyzed_cycles as f64
        };

        Self {
            cmd_to_completion: DurationSummary::new(
                "Cmd to completion",
                transactions
                    .iter()
                    .map(|t| cycles(t.issue_time, t.response_time()))
                    .collect(),
            ),
            cmd_to_first_data: DurationSummary::new(
                "Cmd to first data",
                transactions
                    .iter()
                    .map(|t| cycles(t.issue_time, t.first_data_time))
                    .collect(),
            ),
            last_data_to_completion: DurationSummary::new(
                "Last data to completion",
                transactions
                    .iter()
                    .map(|t| cycles(t.last_data_time, t.response_time()))
                    .collect(),
            ),
            transaction_delays: DurationSummary::new(
                "Transaction delays",
                transactions
                    .iter()
                    .map(|t| cycles(t.response_time(), t.next_issue_time))
                    .collect(),
            ),
            errors,
            error_rate,
            averaged_bandwidth,
            bandwidth_windows: Vec::new(),
            bandwidth_above_x_rate: 0.0,
            bandwidth_below_y_rate: 0.0,
            clock_period,
        }
    }

    /// Add sliding-window bandwidth over `intervals`
    ///
    /// A window of `window_length` cycles starts every half window from the
    /// start of each interval until half a window past its end. A transaction
    /// counts towards a window by the share of its issue-to-response period
    /// that the window covers.
    pub fn with_bandwidth_windows(
        mut self,
        transactions: &[CompletedTransaction],
        intervals: &[(Tick, Tick)],
        window_length: u32,
        x_rate: f64,
        y_rate: f64,
    ) -> Self {
        let window = u64::from(window_length) * self.clock_period;
        let step = (u64::from(window_length / 2) * self.clock_period).max(1);

        let mut windows = Vec::new();
        for &(start, end) in intervals {
            let mut win_start = start;
            while win_start < end + window / 2 {
                let covered: f64 = transactions
                    .iter()
                    .map(|t| coverage(t.issue_time, t.response_time(), win_start, window))
                    .sum();
                windows.push(BandwidthWindow {
                    start: win_start,
                    bandwidth: covered / f64::from(window_length.max(1)),
                });
                win_start += step;
            }
        }

        let share = |count: usize| {
            if windows.is_empty() {
                0.0
            } else {
                count as f64 / windows.len() as f64
            }
        };
        let above = windows.iter().filter(|w| w.bandwidth > x_rate).count();
        let below = windows.iter().filter(|w| w.bandwidth < y_rate).count();
        self.bandwidth_above_x_rate = share(above);
        self.bandwidth_below_y_rate = share(below);
        self.bandwidth_windows = windows;
        self
    }

    /// All duration summaries in report order
    pub fn summaries(&self) -> [&DurationSummary; 4] {
        [
            &self.cmd_to_completion,
            &self.cmd_to_first_data,
            &self.last_data_to_completion,
            &self.transaction_delays,
        ]
    }
}

/// Share of `[start, end]` inside the window starting at `win_start`
fn coverage(start: Tick, end: Tick, win_start: Tick, window: Tick) -> f64 {
    let win_end = win_start + window;
    if start == end {
        if win_start < start && start < win_end {
            1.0
        } else {
            0.0
        }
    } else {
        win_end.min(end).saturating_sub(win_start.max(start)) as f64 / (end - start) as f64
    }
}

/// Clock period from the first two rising samples of a clock trace
///
/// Falls back to 1 tick when the trace is too short to tell.
pub fn clock_period(clock: &Trace) -> Tick {
    let mut rising = clock
        .samples()
        .iter()
        .filter(|s| is_asserted(&s.value))
        .map(|s| s.time);
    match (rising.next(), rising.next()) {
        (Some(first), Some(second)) => second - first,
        _ => 1,
    }
}
