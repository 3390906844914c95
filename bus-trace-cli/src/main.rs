//! Bus Trace CLI Application
//!
//! This is the command-line interface for the bus trace decoder.
//! It uses the bus-trace-decoder library and adds:
//! - Loading extracted signal traces from JSON trace files
//! - Multi-bus configuration (TOML) with parallel analysis
//! - Report generation (TXT/JSON)

use anyhow::{bail, Context, Result};
use bus_trace_decoder::{Analyzer, BoundaryPolicy, Variant};
use clap::Parser;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

mod config;
mod input;
mod report;

use config::{BusConfig, OutputFormat};
use input::TraceFile;
use report::BusReport;

/// Bus Trace Decoder - Reconstruct read transactions from captured traces
#[derive(Parser, Debug)]
#[command(name = "bus-trace-cli")]
#[command(about = "Reconstruct AXI-style read transactions from signal traces", long_about = None)]
#[command(version)]
struct Args {
    /// Path to a JSON trace file to analyze
    #[arg(short, long, value_name = "FILE")]
    trace: Option<PathBuf>,

    /// Matching variant (tagged, single)
    #[arg(long, default_value = "tagged")]
    variant: Variant,

    /// Attribute boundary policy (at-or-before, strictly-before)
    #[arg(long, default_value = "at-or-before")]
    boundary: BoundaryPolicy,

    /// Channel prefix of the bus inside the trace file
    #[arg(long, value_name = "PREFIX")]
    scope: Option<String>,

    /// Bandwidth window in clock cycles
    #[arg(short, long, value_name = "CYCLES")]
    window: Option<u32>,

    /// Windows with bandwidth above this rate count as busy
    #[arg(long, value_name = "RATE")]
    x_rate: Option<f64>,

    /// Windows with bandwidth below this rate count as idle
    #[arg(long, value_name = "RATE")]
    y_rate: Option<f64>,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Txt)]
    format: OutputFormat,

    /// Output file for the report (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Path to configuration file (buses.toml) for multi-bus analysis
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("Bus Trace CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using decoder library v{}", bus_trace_decoder::VERSION);

    if let Some(trace_path) = &args.trace {
        simple_mode(trace_path, &args)?;
    } else if let Some(config_path) = &args.config {
        config_mode(config_path)?;
    } else {
        // No arguments - show help
        println!("Bus Trace Decoder - No input specified");
        println!("\nQuick Start:");
        println!("  bus-trace-cli --trace run.json");
        println!("  bus-trace-cli --trace run.json --variant single --scope top.csr");
        println!("\nFor multiple buses:");
        println!("  bus-trace-cli --config buses.toml");
        println!("\nUse --help for more options");
    }

    Ok(())
}

/// Simple mode - analyze one bus of one trace file
fn simple_mode(trace_path: &Path, args: &Args) -> Result<()> {
    let mut bus = BusConfig::simple("bus", args.variant, args.boundary);
    bus.scope = args.scope.clone();
    bus.window_length = args.window;
    bus.x_rate = args.x_rate;
    bus.y_rate = args.y_rate;

    let trace_file = TraceFile::load(trace_path)?;
    let report = analyze_bus(trace_path, &trace_file, &bus)?;
    let rendered = report.render(args.format)?;

    match &args.output {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("Failed to write report: {:?}", path))?;
            log::info!("Report written to {:?}", path);
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

/// Config mode - every configured bus of every trace file, in parallel
fn config_mode(config_path: &Path) -> Result<()> {
    log::info!("Loading configuration from: {:?}", config_path);
    let config = config::load_config(config_path)?;
    log::debug!("Configuration loaded: {} bus(es)", config.buses.len());

    let files = config
        .input
        .files
        .iter()
        .map(|path| Ok((path.clone(), TraceFile::load(path)?)))
        .collect::<Result<Vec<_>>>()?;

    let jobs: Vec<(&PathBuf, &TraceFile, &BusConfig)> = files
        .iter()
        .flat_map(|(path, file)| config.buses.iter().map(move |bus| (path, file, bus)))
        .collect();

    let reports: Vec<Result<BusReport>> = jobs
        .par_iter()
        .map(|(path, file, bus)| analyze_bus(path, file, bus))
        .collect();

    if let Some(dir) = &config.output.output_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory: {:?}", dir))?;
    }

    let mut failures = 0;
    for report in reports {
        match report {
            Ok(report) => emit(&report, config.output.format, config.output.output_dir.as_deref())?,
            Err(e) => {
                log::error!("{:#}", e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        bail!("{} of {} analyses failed", failures, jobs.len());
    }
    Ok(())
}

/// Run the analyzer for one bus of one trace file
fn analyze_bus(path: &Path, trace_file: &TraceFile, bus: &BusConfig) -> Result<BusReport> {
    let traces = trace_file.traces_for(bus)?;
    for channel in trace_file.unused_channels(bus) {
        log::warn!(
            "{}: channel '{}' is not used by the {} analyzer",
            bus.name,
            channel,
            bus.variant
        );
    }

    let mut analyzer_config = bus.analyzer_config();
    if !trace_file.has_reset() {
        log::info!("{}: no reset line in {:?}, matching without reset", bus.name, path);
        analyzer_config = analyzer_config.with_ignore_reset(true);
    }

    let analyzer = Analyzer::new(analyzer_config);
    let (result, stats) = analyzer
        .analyze_with_stats(&traces)
        .with_context(|| format!("Analysis of bus '{}' in {:?} failed", bus.name, path))?;
    Ok(BusReport::new(&bus.name, path, bus.variant, result, stats))
}

fn emit(report: &BusReport, format: OutputFormat, output_dir: Option<&Path>) -> Result<()> {
    let rendered = report.render(format)?;
    match output_dir {
        Some(dir) => {
            let path = dir.join(report.file_name(format));
            fs::write(&path, rendered)
                .with_context(|| format!("Failed to write report: {:?}", path))?;
            log::info!("Report written to {:?}", path);
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
