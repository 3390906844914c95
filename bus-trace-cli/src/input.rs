//! Trace file loading
//!
//! A trace file is the host side of the signal declaration contract: it holds
//! the already extracted `(tick, value)` samples of every line, keyed by
//! dotted path. Clock and reset sit at the top level and are shared by all
//! buses in the file.

use crate::config::BusConfig;
use bus_trace_decoder::{
    resolve_traces, DecoderError, SignalDeclaration, TimedSample, Trace, TraceSet,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to read trace file {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse trace file {path:?}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("bus '{bus}'")]
    Bus {
        bus: String,
        #[source]
        source: DecoderError,
    },
}

/// Contents of one JSON trace file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TraceFile {
    pub clock: Vec<TimedSample>,
    /// Absent when the capture has no reset line at all
    #[serde(default)]
    pub reset: Option<Vec<TimedSample>>,
    #[serde(default)]
    pub channels: BTreeMap<String, Vec<TimedSample>>,
}

impl TraceFile {
    pub fn load(path: &Path) -> Result<Self, InputError> {
        let content = fs::read_to_string(path).map_err(|source| InputError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: TraceFile = serde_json::from_str(&content).map_err(|source| InputError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!(
            "Loaded {:?}: {} clock samples, {} channels",
            path,
            file.clock.len(),
            file.channels.len()
        );
        Ok(file)
    }

    pub fn has_reset(&self) -> bool {
        self.reset.is_some()
    }

    fn samples_for(
        &self,
        declaration: &SignalDeclaration,
        scope: Option<&str>,
    ) -> Option<&[TimedSample]> {
        match declaration.name().as_str() {
            "clock" => Some(self.clock.as_slice()),
            "reset" => self.reset.as_deref(),
            _ => self
                .channels
                .get(&declaration.qualified(scope))
                .map(|samples| samples.as_slice()),
        }
    }

    /// Traces of one bus, in the grouping its variant declares
    pub fn traces_for(&self, bus: &BusConfig) -> Result<TraceSet, InputError> {
        let scope = bus.scope.as_deref();
        let bus_error = |source: DecoderError| InputError::Bus {
            bus: bus.name.clone(),
            source,
        };

        let mut found = HashMap::new();
        for declaration in bus.variant.all_declarations() {
            if let Some(samples) = self.samples_for(&declaration, scope) {
                let trace = Trace::new(declaration.qualified(scope), samples.to_vec())
                    .map_err(bus_error)?;
                found.insert(declaration.name(), trace);
            }
        }
        resolve_traces(bus.variant, |declaration| found.remove(&declaration.name()))
            .map_err(bus_error)
    }

    /// Channels under the bus scope that no declaration of its variant reads
    pub fn unused_channels(&self, bus: &BusConfig) -> Vec<String> {
        let scope = bus.scope.as_deref();
        let used: Vec<String> = bus
            .variant
            .signal_declarations()
            .iter()
            .map(|d| d.qualified(scope))
            .collect();
        let prefix = scope.map(|s| format!("{}.", s));

        self.channels
            .keys()
            .filter(|name| match &prefix {
                Some(prefix) => name.starts_with(prefix.as_str()),
                None => true,
            })
            .filter(|name| !used.contains(*name))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bus_trace_decoder::{BoundaryPolicy, Variant};
    use std::io::Write;

    const TRACE: &str = r#"{
        "clock": [[0, "1"], [5, "0"], [10, "1"], [15, "0"], [20, "1"]],
        "channels": {
            "top.axi.ar": [[5, "1"]],
            "top.axi.r": [[15, "1"]],
            "top.axi.r.resp": [[0, "00"]],
            "top.axi.r.user": [[0, "0"]],
            "top.other.ar": [[5, "1"]]
        }
    }"#;

    fn bus(variant: Variant) -> BusConfig {
        let mut bus = BusConfig::simple("axi", variant, BoundaryPolicy::AtOrBefore);
        bus.scope = Some("top.axi".to_string());
        bus
    }

    #[test]
    fn test_load_and_resolve() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TRACE.as_bytes()).unwrap();

        let trace_file = TraceFile::load(file.path()).unwrap();
        assert!(!trace_file.has_reset());

        let traces = trace_file.traces_for(&bus(Variant::SingleOutstanding)).unwrap();
        assert_eq!(traces.end_of_time().unwrap(), 20);
        assert_eq!(traces.address.channel(), "top.axi.ar");
        assert!(traces.reset.is_empty());
    }

    #[test]
    fn test_missing_channel() {
        let trace_file: TraceFile = serde_json::from_str(TRACE).unwrap();
        let err = trace_file.traces_for(&bus(Variant::Tagged)).unwrap_err();
        assert!(matches!(
            err,
            InputError::Bus {
                source: DecoderError::MissingChannel(ref name),
                ..
            } if name == "r.last"
        ));
    }

    #[test]
    fn test_unused_channels() {
        let trace_file: TraceFile = serde_json::from_str(TRACE).unwrap();
        assert_eq!(
            trace_file.unused_channels(&bus(Variant::SingleOutstanding)),
            vec!["top.axi.r.user".to_string()]
        );
    }

    #[test]
    fn test_unreadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = TraceFile::load(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, InputError::Read { .. }));
    }
}
