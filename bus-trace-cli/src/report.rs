//! Report generation
//!
//! Renders one bus analysis as a plain-text table or as JSON.

use crate::config::OutputFormat;
use anyhow::Result;
use bus_trace_decoder::{
    AnalysisResult, Diagnostic, TransactionRecord, TransactionStats, Variant,
};
use serde::Serialize;
use std::fmt::Write;
use std::path::{Path, PathBuf};

/// Everything reported for one bus of one trace file
#[derive(Debug, Clone, Serialize)]
pub struct BusReport {
    pub bus: String,
    pub file: PathBuf,
    pub variant: Variant,
    pub generated_at: String,
    /// Completed transactions in host tuple order
    pub records: Vec<TransactionRecord>,
    pub diagnostics: Vec<Diagnostic>,
    pub stats: TransactionStats,
}

impl BusReport {
    pub fn new(
        bus: &str,
        file: &Path,
        variant: Variant,
        result: AnalysisResult,
        stats: TransactionStats,
    ) -> Self {
        Self {
            bus: bus.to_string(),
            file: file.to_path_buf(),
            variant,
            generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            records: result.records(),
            diagnostics: result.diagnostics,
            stats,
        }
    }

    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Txt => Ok(self.render_txt()?),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(self)?),
        }
    }

    /// File name used when reports go to an output directory
    pub fn file_name(&self, format: OutputFormat) -> String {
        let stem = self
            .file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "trace".to_string());
        format!("{}_{}.{}", stem, self.bus, format.extension())
    }

    fn render_txt(&self) -> Result<String, std::fmt::Error> {
        let mut out = String::new();
        self.write_txt(&mut out)?;
        Ok(out)
    }

    fn write_txt(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "═══════════════════════════════════════════════")?;
        writeln!(out, "  Bus {} ({}) - {}", self.bus, self.variant, self.file.display())?;
        writeln!(out, "  Generated {}", self.generated_at)?;
        writeln!(out, "═══════════════════════════════════════════════\n")?;

        writeln!(out, "Transactions: {}", self.records.len())?;
        if !self.records.is_empty() {
            writeln!(
                out,
                "  {:>10} {:>10} {:>10} {:>10} {:>8} {:>10}",
                "issue", "first", "last", "response", "resp", "next"
            )?;
            for (issue, first, last, response, code, next) in &self.records {
                writeln!(
                    out,
                    "  {:>10} {:>10} {:>10} {:>10} {:>8} {:>10}",
                    issue, first, last, response, code, next
                )?;
            }
        }

        let unfinished = self.diagnostics.iter().filter(|d| d.is_unfinished()).count();
        writeln!(
            out,
            "\nDiagnostics: {} ({} unfinished, {} orphan beats)",
            self.diagnostics.len(),
            unfinished,
            self.diagnostics.len() - unfinished
        )?;
        for diagnostic in &self.diagnostics {
            writeln!(out, "  {:>10} ⚠ {}", diagnostic.time(), diagnostic)?;
        }

        writeln!(out, "\nStatistics (clock period {} ticks):", self.stats.clock_period)?;
        for summary in self.stats.summaries() {
            match summary.mean() {
                Some(mean) => writeln!(out, "  {} (mean {:.2})", summary.display(), mean)?,
                None => writeln!(out, "  {}", summary.display())?,
            }
        }
        writeln!(
            out,
            "  Errors: {} ({:.2}%)",
            self.stats.errors.len(),
            self.stats.error_rate * 100.0
        )?;
        writeln!(
            out,
            "  Averaged bandwidth: {:.4} transactions/cycle",
            self.stats.averaged_bandwidth
        )?;
        writeln!(out, "  Bandwidth windows: {}", self.stats.bandwidth_windows.len())?;
        writeln!(
            out,
            "  Bandwidth above x rate: {:.2}%",
            self.stats.bandwidth_above_x_rate * 100.0
        )?;
        writeln!(
            out,
            "  Bandwidth below y rate: {:.2}%",
            self.stats.bandwidth_below_y_rate * 100.0
        )?;
        Ok(())
    }
}
