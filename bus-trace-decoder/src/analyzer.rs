//! Main analyzer API
//!
//! The Analyzer is the entry point for reconstructing read transactions from a
//! captured [`TraceSet`]. It validates the configuration, splits the capture
//! into analysis windows and runs the configured matching engine on each.

use crate::config::{AnalyzerConfig, Variant};
use crate::engine::run_variant;
use crate::signals::SignalDeclaration;
use crate::stats::{clock_period, TransactionStats};
use crate::trace::{active_ticks, TraceSet};
use crate::types::{AnalysisResult, Result, Tick};

/// The main analyzer struct - entry point for all analysis operations
#[derive(Debug, Clone)]
pub struct Analyzer {
    config: AnalyzerConfig,
}

impl Analyzer {
    /// Create an analyzer with the given configuration
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Signals the host must extract for the configured variant
    pub fn signal_declarations(&self) -> Vec<SignalDeclaration> {
        self.config.variant.all_declarations()
    }

    /// Reconstruct all transactions in `traces`
    ///
    /// # Arguments
    /// * `traces` - Fully captured traces of one read channel
    ///
    /// # Returns
    /// * `Result<AnalysisResult>` - Completed transactions and soft
    ///   diagnostics, or the first hard error encountered
    ///
    /// # Example
    /// ```no_run
    /// use bus_trace_decoder::{Analyzer, AnalyzerConfig, Trace, TraceSet};
    ///
    /// let traces = TraceSet::new(
    ///     Trace::from_times("clk", &[0, 100]).unwrap(),
    ///     Trace::empty("rst"),
    ///     Trace::from_times("ar", &[10]).unwrap(),
    ///     Trace::from_times("r", &[20]).unwrap(),
    ///     Trace::from_times("r.resp", &[0]).unwrap(),
    /// );
    /// let analyzer = Analyzer::new(AnalyzerConfig::new().with_variant("single".parse().unwrap()));
    /// let result = analyzer.analyze(&traces).unwrap();
    /// for record in result.records() {
    ///     println!("{:?}", record);
    /// }
    /// ```
    pub fn analyze(&self, traces: &TraceSet) -> Result<AnalysisResult> {
        self.config.validate()?;
        let end_of_time = traces.end_of_time()?;
        log::info!(
            "Analyzing {} read channel: {} issues, {} beats, end of trace at {}",
            self.config.variant,
            traces.address.len(),
            traces.data.len(),
            end_of_time
        );

        let mut result = AnalysisResult::default();
        for (start, end) in self.config.windows(end_of_time) {
            if start > end {
                log::warn!("Interval starting at {} lies past the end of trace", start);
                continue;
            }
            log::debug!("Analyzing window [{}, {}]", start, end);
            let window = if self.config.intervals.is_empty() {
                traces.clone()
            } else {
                traces.window(start, end)
            };
            result.extend(run_variant(&window, end, &self.config)?);
        }

        log::info!(
            "Analysis complete: {} transactions, {} unfinished, {} orphan beats",
            result.transactions.len(),
            result.unfinished().len(),
            result.orphan_beats().len()
        );
        Ok(result)
    }

    /// Analyze and summarize in one pass
    ///
    /// Averaged bandwidth is taken over the analyzed time spent out of reset.
    pub fn analyze_with_stats(
        &self,
        traces: &TraceSet,
    ) -> Result<(AnalysisResult, TransactionStats)> {
        let result = self.analyze(traces)?;
        let end_of_time = traces.end_of_time()?;
        let windows: Vec<(Tick, Tick)> = self
            .config
            .windows(end_of_time)
            .into_iter()
            .filter(|(start, end)| start <= end)
            .collect();
        let in_reset = self.time_in_reset(traces, end_of_time);
        log::debug!("{} tick(s) of the analyzed time spent in reset", in_reset);
        let stats = TransactionStats::from_transactions(
            &result.transactions,
            clock_period(&traces.clock),
            self.analyzed_time(end_of_time).saturating_sub(in_reset),
            |resp| self.config.is_ok_response(resp),
        )
        .with_bandwidth_windows(
            &result.transactions,
            &windows,
            self.config.window_length,
            self.config.x_rate,
            self.config.y_rate,
        );
        Ok((result, stats))
    }

    /// Ticks covered by all analysis windows
    pub fn analyzed_time(&self, end_of_time: Tick) -> Tick {
        self.config
            .windows(end_of_time)
            .into_iter()
            .map(|(start, end)| end.saturating_sub(start))
            .sum()
    }

    /// Ticks of the analysis windows during which reset was active
    ///
    /// Always 0 when the reset line is ignored.
    pub fn time_in_reset(&self, traces: &TraceSet, end_of_time: Tick) -> Tick {
        if self.config.ignore_reset {
            return 0;
        }
        self.config
            .windows(end_of_time)
            .into_iter()
            .filter(|(start, end)| start <= end)
            .map(|(start, end)| {
                active_ticks(&traces.reset, &self.config.reset_active_value, start, end)
            })
            .sum()
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(AnalyzerConfig::default())
    }
}

impl From<Variant> for Analyzer {
    fn from(variant: Variant) -> Self {
        Self::new(AnalyzerConfig::new().with_variant(variant))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DecoderError, TimedSample, Trace};

    fn lite(ar: &[Tick], r: &[Tick]) -> TraceSet {
        TraceSet::new(
            Trace::from_times("clk", &[0, 10, 20, 30, 40, 50, 60, 70, 80, 90, 100]).unwrap(),
            Trace::new("rst", vec![TimedSample::new(0, "0")]).unwrap(),
            Trace::from_times("ar", ar).unwrap(),
            Trace::from_times("r", r).unwrap(),
            Trace::new("r.resp", vec![TimedSample::new(0, "00")]).unwrap(),
        )
    }

    #[test]
    fn test_whole_trace() {
        let analyzer = Analyzer::from(Variant::SingleOutstanding);
        let result = analyzer.analyze(&lite(&[10, 50], &[20, 70])).unwrap();
        assert_eq!(
            result.records(),
            vec![
                (10, 20, 20, 20, "00".to_string(), 50),
                (50, 70, 70, 70, "00".to_string(), 100),
            ]
        );
    }

    #[test]
    fn test_intervals_are_analyzed_independently() {
        let config = AnalyzerConfig::new()
            .with_variant(Variant::SingleOutstanding)
            .add_interval(0, 40)
            .add_interval(40, 500);
        let result = Analyzer::new(config).analyze(&lite(&[10, 30, 50], &[20, 45, 70])).unwrap();

        // The beat at 45 falls outside the first window
        assert_eq!(
            result.records(),
            vec![
                (10, 20, 20, 20, "00".to_string(), 30),
                (50, 70, 70, 70, "00".to_string(), 100),
            ]
        );
        assert_eq!(result.unfinished(), vec![30]);
        assert_eq!(result.orphan_beats(), vec![45]);
    }

    #[test]
    fn test_invalid_interval() {
        let config = AnalyzerConfig::new().add_interval(50, 10);
        let err = Analyzer::new(config).analyze(&lite(&[], &[])).unwrap_err();
        assert_eq!(err, DecoderError::InvalidInterval { start: 50, end: 10 });
    }

    #[test]
    fn test_empty_clock() {
        let mut traces = lite(&[], &[]);
        traces.clock = Trace::empty("clk");
        let err = Analyzer::default().analyze(&traces).unwrap_err();
        assert_eq!(err, DecoderError::EmptyClock);
    }

    #[test]
    fn test_analyze_with_stats() {
        let analyzer = Analyzer::from(Variant::SingleOutstanding);
        let (result, stats) = analyzer.analyze_with_stats(&lite(&[10, 50], &[20, 70])).unwrap();
        assert_eq!(result.transactions.len(), 2);
        assert_eq!(stats.clock_period, 10);
        assert_eq!(stats.cmd_to_first_data.cycles, vec![1, 2]);
        assert_eq!(stats.error_rate, 0.0);
        assert_eq!(stats.averaged_bandwidth, 0.2);
        // Default 10000-cycle windows start at 0 and 50000
        assert_eq!(stats.bandwidth_windows.len(), 2);
        assert_eq!(stats.bandwidth_windows[0].bandwidth, 0.0002);
        assert_eq!(stats.bandwidth_above_x_rate, 0.5);
        assert_eq!(stats.bandwidth_below_y_rate, 0.5);
    }

    #[test]
    fn test_bandwidth_excludes_time_in_reset() {
        let mut traces = lite(&[10, 70], &[20, 80]);
        traces.reset = Trace::new(
            "rst",
            vec![
                TimedSample::new(0, "0"),
                TimedSample::new(30, "1"),
                TimedSample::new(50, "0"),
            ],
        )
        .unwrap();
        let analyzer = Analyzer::from(Variant::SingleOutstanding);
        assert_eq!(analyzer.time_in_reset(&traces, 100), 20);

        let (result, stats) = analyzer.analyze_with_stats(&traces).unwrap();
        assert_eq!(result.transactions.len(), 2);
        assert_eq!(stats.averaged_bandwidth, 0.25);

        let ignoring = Analyzer::new(
            AnalyzerConfig::new()
                .with_variant(Variant::SingleOutstanding)
                .with_ignore_reset(true),
        );
        assert_eq!(ignoring.time_in_reset(&traces, 100), 0);
    }

    #[test]
    fn test_configured_bandwidth_windows() {
        let config = AnalyzerConfig::new()
            .with_variant(Variant::SingleOutstanding)
            .with_window_length(4)
            .with_rates(0.05, 0.01);
        let (_, stats) = Analyzer::new(config)
            .analyze_with_stats(&lite(&[10, 50], &[20, 70]))
            .unwrap();
        let starts: Vec<Tick> = stats.bandwidth_windows.iter().map(|w| w.start).collect();
        assert_eq!(starts, vec![0, 20, 40, 60, 80, 100]);
        // (10, 20) lies in the first window only, (50, 70) overlaps the next three
        let bandwidths: Vec<f64> = stats.bandwidth_windows.iter().map(|w| w.bandwidth).collect();
        assert_eq!(bandwidths, vec![0.25, 0.125, 0.25, 0.125, 0.0, 0.0]);
        assert_eq!(stats.bandwidth_above_x_rate, 4.0 / 6.0);
        assert_eq!(stats.bandwidth_below_y_rate, 2.0 / 6.0);
    }
}
