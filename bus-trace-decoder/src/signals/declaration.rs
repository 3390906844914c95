//! Signal declarations
//!
//! The host discovers raw lines from its own configuration; the analyzer only
//! says which logical signals it needs and how each one should be extracted.
//! A declaration pairs a role with a dotted path relative to the bus scope.

use crate::config::Variant;
use crate::trace::TraceSet;
use crate::types::{DecoderError, Result, Trace};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the host turns raw lines into a trace for one declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalRole {
    /// Every value change, as sampled
    PlainSignal,
    /// Only the ticks where the line rises
    RisingEdgeSignal,
    /// Ticks where both `ready` and `valid` are high on a clock edge
    ReadyValidHandshake,
}

impl fmt::Display for SignalRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalRole::PlainSignal => write!(f, "Signal"),
            SignalRole::RisingEdgeSignal => write!(f, "RisingSignal"),
            SignalRole::ReadyValidHandshake => write!(f, "ReadyValid"),
        }
    }
}

/// One `(role, path)` entry of the declaration list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalDeclaration {
    pub role: SignalRole,
    /// Path segments, e.g. `["r", "resp"]`
    pub path: Vec<String>,
    /// Optional declarations may be absent from the capture
    pub required: bool,
}

impl SignalDeclaration {
    fn new(role: SignalRole, path: &[&str]) -> Self {
        Self {
            role,
            path: path.iter().map(|s| s.to_string()).collect(),
            required: true,
        }
    }

    fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Dotted name, e.g. `r.resp`
    pub fn name(&self) -> String {
        self.path.join(".")
    }

    /// Dotted name below a bus scope
    pub fn qualified(&self, scope: Option<&str>) -> String {
        match scope {
            Some(scope) if !scope.is_empty() => format!("{}.{}", scope, self.name()),
            _ => self.name(),
        }
    }
}

impl fmt::Display for SignalDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.role, self.name())
    }
}

/// Clock and reset, needed by every variant
pub fn common_declarations() -> Vec<SignalDeclaration> {
    vec![
        SignalDeclaration::new(SignalRole::PlainSignal, &["clock"]),
        SignalDeclaration::new(SignalRole::RisingEdgeSignal, &["reset"]).optional(),
    ]
}

impl Variant {
    /// Ordered declarations of the channel-specific signals
    pub fn signal_declarations(&self) -> Vec<SignalDeclaration> {
        use SignalRole::*;
        match self {
            Variant::Tagged => vec![
                SignalDeclaration::new(ReadyValidHandshake, &["ar"]),
                SignalDeclaration::new(ReadyValidHandshake, &["r"]),
                SignalDeclaration::new(PlainSignal, &["r", "resp"]),
                SignalDeclaration::new(PlainSignal, &["ar", "id"]).optional(),
                SignalDeclaration::new(PlainSignal, &["r", "id"]).optional(),
                SignalDeclaration::new(PlainSignal, &["r", "last"]),
            ],
            Variant::SingleOutstanding => vec![
                SignalDeclaration::new(ReadyValidHandshake, &["ar"]),
                SignalDeclaration::new(ReadyValidHandshake, &["r"]),
                SignalDeclaration::new(PlainSignal, &["r", "resp"]),
            ],
        }
    }

    /// Common declarations followed by the variant's own
    pub fn all_declarations(&self) -> Vec<SignalDeclaration> {
        let mut all = common_declarations();
        all.extend(self.signal_declarations());
        all
    }
}

/// Build a [`TraceSet`] by asking the host for each declared signal
///
/// `fetch` receives each declaration and returns the extracted trace, or
/// `None` when the capture does not contain it. A missing reset becomes an
/// empty trace; any other missing required signal is an error.
pub fn resolve_traces(
    variant: Variant,
    mut fetch: impl FnMut(&SignalDeclaration) -> Option<Trace>,
) -> Result<TraceSet> {
    let mut clock = None;
    let mut reset = None;
    let mut address = None;
    let mut data = None;
    let mut response = None;
    let mut address_id = None;
    let mut data_id = None;
    let mut last = None;

    for declaration in variant.all_declarations() {
        let name = declaration.name();
        let trace = fetch(&declaration);
        if trace.is_none() && declaration.required {
            return Err(DecoderError::MissingChannel(name));
        }
        let slot = match name.as_str() {
            "clock" => &mut clock,
            "reset" => &mut reset,
            "ar" => &mut address,
            "r" => &mut data,
            "r.resp" => &mut response,
            "ar.id" => &mut address_id,
            "r.id" => &mut data_id,
            "r.last" => &mut last,
            _ => continue,
        };
        *slot = trace;
    }

    let missing = |name: &str| DecoderError::MissingChannel(name.to_string());
    let mut traces = TraceSet::new(
        clock.ok_or_else(|| missing("clock"))?,
        reset.unwrap_or_else(|| Trace::empty("reset")),
        address.ok_or_else(|| missing("ar"))?,
        data.ok_or_else(|| missing("r"))?,
        response.ok_or_else(|| missing("r.resp"))?,
    );
    traces.address_id = address_id;
    traces.data_id = data_id;
    traces.last = last;
    Ok(traces)
}
