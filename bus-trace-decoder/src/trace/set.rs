//! The complete set of traces for one read channel

use crate::types::{DecoderError, Result, Tick, Trace};

/// All traces an analysis reads, keyed by role
#[derive(Debug, Clone)]
pub struct TraceSet {
    /// Only its final tick is used, as the end-of-trace sentinel
    pub clock: Trace,
    /// Reset level changes; assertions are filtered by value
    pub reset: Trace,
    /// Address-issue handshake events
    pub address: Trace,
    /// Data-return handshake events
    pub data: Trace,
    /// Response code per data beat
    pub response: Trace,
    /// Identifier sampled at address issue (tagged variant)
    pub address_id: Option<Trace>,
    /// Identifier sampled at each data beat (tagged variant)
    pub data_id: Option<Trace>,
    /// Completion flag per data beat (tagged variant)
    pub last: Option<Trace>,
}

impl TraceSet {
    /// Traces every variant needs
    pub fn new(clock: Trace, reset: Trace, address: Trace, data: Trace, response: Trace) -> Self {
        Self {
            clock,
            reset,
            address,
            data,
            response,
            address_id: None,
            data_id: None,
            last: None,
        }
    }

    /// Builder method: add the identifier traces of both phases
    pub fn with_identifiers(mut self, address_id: Trace, data_id: Trace) -> Self {
        self.address_id = Some(address_id);
        self.data_id = Some(data_id);
        self
    }

    /// Builder method: add the completion flag trace
    pub fn with_last(mut self, last: Trace) -> Self {
        self.last = Some(last);
        self
    }

    /// Tick of the final clock sample
    pub fn end_of_time(&self) -> Result<Tick> {
        self.clock.last_time().ok_or(DecoderError::EmptyClock)
    }

    /// Restrict event traces to the window `[start, end]`
    ///
    /// Handshake events are kept for `start <= t < end`, reset assertions for
    /// `start <= t <= end`. Attribute traces stay complete so lookups still see
    /// values set before the window opened.
    pub fn window(&self, start: Tick, end: Tick) -> Self {
        Self {
            clock: self.clock.clone(),
            reset: self.reset.filtered(|t| t >= start && t <= end),
            address: self.address.filtered(|t| t >= start && t < end),
            data: self.data.filtered(|t| t >= start && t < end),
            response: self.response.clone(),
            address_id: self.address_id.clone(),
            data_id: self.data_id.clone(),
            last: self.last.clone(),
        }
    }
}
