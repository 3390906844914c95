//! Configuration loading and parsing

use anyhow::{bail, Context, Result};
use bus_trace_decoder::{AnalyzerConfig, BoundaryPolicy, Tick, Variant};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from buses.toml)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub input: InputConfig,
    #[serde(rename = "bus")]
    pub buses: Vec<BusConfig>,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InputConfig {
    /// Trace files (JSON), each analyzed for every bus
    pub files: Vec<PathBuf>,
}

/// One read channel to analyze
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BusConfig {
    pub name: String,
    #[serde(default)]
    pub variant: Variant,
    /// Prefix of the bus channels in the trace file, e.g. `top.axi0`
    pub scope: Option<String>,
    #[serde(default)]
    pub intervals: Vec<[Tick; 2]>,
    #[serde(default)]
    pub boundary: BoundaryPolicy,
    pub reset_active_value: Option<String>,
    pub ok_responses: Option<Vec<String>>,
    /// Bandwidth window in clock cycles
    pub window_length: Option<u32>,
    pub x_rate: Option<f64>,
    pub y_rate: Option<f64>,
}

impl BusConfig {
    /// A bus analyzed with defaults (used by the simple mode)
    pub fn simple(name: &str, variant: Variant, boundary: BoundaryPolicy) -> Self {
        Self {
            name: name.to_string(),
            variant,
            scope: None,
            intervals: Vec::new(),
            boundary,
            reset_active_value: None,
            ok_responses: None,
            window_length: None,
            x_rate: None,
            y_rate: None,
        }
    }

    /// Analyzer settings for this bus
    pub fn analyzer_config(&self) -> AnalyzerConfig {
        let mut config = AnalyzerConfig::new()
            .with_variant(self.variant)
            .with_boundary(self.boundary);
        if let Some(value) = &self.reset_active_value {
            config = config.with_reset_active_value(value.clone());
        }
        if let Some(responses) = &self.ok_responses {
            config = config.with_ok_responses(responses.clone());
        }
        if let Some(cycles) = self.window_length {
            config = config.with_window_length(cycles);
        }
        let x_rate = self.x_rate.unwrap_or(config.x_rate);
        let y_rate = self.y_rate.unwrap_or(config.y_rate);
        config = config.with_rates(x_rate, y_rate);
        for &[start, end] in &self.intervals {
            config = config.add_interval(start, end);
        }
        config
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    /// Write one report per bus and file here instead of stdout
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Txt,
    Json,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Txt => "txt",
            OutputFormat::Json => "json",
        }
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate(&config).with_context(|| format!("Invalid config file: {:?}", path))?;
    Ok(config)
}

fn validate(config: &AppConfig) -> Result<()> {
    if config.input.files.is_empty() {
        bail!("[input] lists no trace files");
    }
    if config.buses.is_empty() {
        bail!("no [[bus]] entries");
    }
    let mut names = HashSet::new();
    for bus in &config.buses {
        if !names.insert(bus.name.as_str()) {
            bail!("bus '{}' is declared twice", bus.name);
        }
        bus.analyzer_config()
            .validate()
            .with_context(|| format!("bus '{}'", bus.name))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CONFIG: &str = r#"
        [input]
        files = ["run.json"]

        [[bus]]
        name = "dma_rd"
        scope = "top.dma"
        intervals = [[0, 500], [800, 1200]]

        [[bus]]
        name = "csr_rd"
        variant = "single_outstanding"
        boundary = "strictly_before"
        reset_active_value = "0"
        window_length = 200
        x_rate = 0.01

        [output]
        format = "json"
    "#;

    #[test]
    fn test_config_deserialization() {
        let config: AppConfig = toml::from_str(CONFIG).unwrap();
        assert_eq!(config.input.files.len(), 1);
        assert_eq!(config.buses.len(), 2);
        assert_eq!(config.output.format, OutputFormat::Json);

        let dma = config.buses[0].analyzer_config();
        assert_eq!(dma.variant, Variant::Tagged);
        assert_eq!(dma.intervals, vec![[0, 500], [800, 1200]]);

        let csr = config.buses[1].analyzer_config();
        assert_eq!(csr.variant, Variant::SingleOutstanding);
        assert_eq!(csr.boundary, BoundaryPolicy::StrictlyBefore);
        assert_eq!(csr.reset_active_value, "0");
        assert_eq!(csr.window_length, 200);
        assert_eq!(csr.x_rate, 0.01);
        assert_eq!(csr.y_rate, AnalyzerConfig::default().y_rate);
    }

    #[test]
    fn test_load_config_rejects_empty_window() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "[input]\nfiles = [\"a.json\"]\n[[bus]]\nname = \"x\"\nwindow_length = 0\n"
        )
        .unwrap();
        let err = load_config(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("window_length"));
    }

    #[test]
    fn test_load_config_rejects_duplicate_bus() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "[input]\nfiles = [\"a.json\"]\n[[bus]]\nname = \"x\"\n[[bus]]\nname = \"x\"\n"
        )
        .unwrap();
        let err = load_config(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("declared twice"));
    }

    #[test]
    fn test_load_config_rejects_bad_interval() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "[input]\nfiles = [\"a.json\"]\n[[bus]]\nname = \"x\"\nintervals = [[10, 5]]\n"
        )
        .unwrap();
        assert!(load_config(file.path()).is_err());
    }
}
