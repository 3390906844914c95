//! Point-in-time attribute lookup
//!
//! Attribute traces (identifier, response code, completion flag) carry
//! per-event metadata rather than handshake occurrences. A lookup returns the
//! value of the latest sample in effect at a query tick. The trace is already
//! materialized and time-sorted, so each query is a binary search and queries
//! may arrive in any order.

use crate::config::BoundaryPolicy;
use crate::types::{DecoderError, Result, Tick, Trace};

/// Value-at-time reader over one attribute trace
#[derive(Debug, Clone, Copy)]
pub struct AttributeLookup<'a> {
    trace: &'a Trace,
    boundary: BoundaryPolicy,
}

impl<'a> AttributeLookup<'a> {
    pub fn new(trace: &'a Trace, boundary: BoundaryPolicy) -> Self {
        Self { trace, boundary }
    }

    /// Value of the most recent sample admitted at `time`
    ///
    /// # Errors
    /// [`DecoderError::MissingAttribute`] when no sample qualifies. Every data
    /// beat must have its attributes defined, so there is no default.
    pub fn value_at(&self, time: Tick) -> Result<&'a str> {
        let samples = self.trace.samples();
        let admitted = samples.partition_point(|s| self.boundary.admits(s.time, time));
        match admitted.checked_sub(1) {
            Some(index) => Ok(samples[index].value.as_str()),
            None => Err(DecoderError::MissingAttribute {
                attribute: self.trace.channel().to_string(),
                time,
            }),
        }
    }

    /// Interpret the value at `time` as a single-bit flag
    pub fn flag_at(&self, time: Tick) -> Result<bool> {
        Ok(is_asserted(self.value_at(time)?))
    }
}

/// A bit string counts as asserted when it ends in `1` (`"1"`, `"b1"`, `"0001"`)
pub fn is_asserted(value: &str) -> bool {
    value.trim().ends_with('1')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TimedSample;

    fn ids() -> Trace {
        Trace::new(
            "r.id",
            vec![
                TimedSample::new(0, "0"),
                TimedSample::new(10, "1"),
                TimedSample::new(20, "2"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_at_or_before_sees_sample_at_query_tick() {
        let trace = ids();
        let lookup = AttributeLookup::new(&trace, BoundaryPolicy::AtOrBefore);
        assert_eq!(lookup.value_at(10).unwrap(), "1");
        assert_eq!(lookup.value_at(19).unwrap(), "1");
        assert_eq!(lookup.value_at(20).unwrap(), "2");
        assert_eq!(lookup.value_at(1000).unwrap(), "2");
    }

    #[test]
    fn test_strictly_before_hides_sample_at_query_tick() {
        let trace = ids();
        let lookup = AttributeLookup::new(&trace, BoundaryPolicy::StrictlyBefore);
        assert_eq!(lookup.value_at(10).unwrap(), "0");
        assert_eq!(lookup.value_at(11).unwrap(), "1");
        assert_eq!(lookup.value_at(20).unwrap(), "1");
    }

    #[test]
    fn test_missing_attribute() {
        let trace = Trace::new("r.resp", vec![TimedSample::new(5, "00")]).unwrap();
        let lookup = AttributeLookup::new(&trace, BoundaryPolicy::AtOrBefore);
        assert_eq!(
            lookup.value_at(4),
            Err(DecoderError::MissingAttribute {
                attribute: "r.resp".to_string(),
                time: 4,
            })
        );

        let strict = AttributeLookup::new(&trace, BoundaryPolicy::StrictlyBefore);
        assert!(strict.value_at(5).is_err());
    }

    #[test]
    fn test_flag_at() {
        let trace = Trace::new(
            "r.last",
            vec![TimedSample::new(0, "0"), TimedSample::new(8, "1")],
        )
        .unwrap();
        let lookup = AttributeLookup::new(&trace, BoundaryPolicy::AtOrBefore);
        assert!(!lookup.flag_at(7).unwrap());
        assert!(lookup.flag_at(8).unwrap());
        assert!(is_asserted("b1"));
        assert!(!is_asserted("x"));
    }
}
