//! Forward-only cursor over the timestamps of an event trace

use crate::types::{Tick, Trace};

/// Lookahead reader over one ordered event trace
///
/// Peeking never consumes; only [`EventCursor::advance`] moves the cursor.
#[derive(Debug, Clone)]
pub struct EventCursor<'a> {
    trace: &'a Trace,
    position: usize,
}

impl<'a> EventCursor<'a> {
    pub fn new(trace: &'a Trace) -> Self {
        Self { trace, position: 0 }
    }

    /// Timestamp of the next unconsumed event, if any
    pub fn peek(&self) -> Option<Tick> {
        self.trace.samples().get(self.position).map(|s| s.time)
    }

    /// Timestamp of the next unconsumed event, or `default` when exhausted
    pub fn peek_or(&self, default: Tick) -> Tick {
        self.peek().unwrap_or(default)
    }

    /// Consume and return the next timestamp (`None` on exhaustion)
    pub fn advance(&mut self) -> Option<Tick> {
        let time = self.peek()?;
        self.position += 1;
        log::trace!("{}: consumed event at {}", self.trace.channel(), time);
        Some(time)
    }

    /// Consume the next event only if `predicate` holds for its timestamp
    pub fn advance_if(&mut self, predicate: impl FnOnce(Tick) -> bool) -> Option<Tick> {
        match self.peek() {
            Some(time) if predicate(time) => self.advance(),
            _ => None,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.position >= self.trace.len()
    }

    /// Number of events not yet consumed
    pub fn remaining(&self) -> usize {
        self.trace.len().saturating_sub(self.position)
    }
}

impl Iterator for EventCursor<'_> {
    type Item = Tick;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peek_is_idempotent() {
        let trace = Trace::from_times("ar", &[3, 7]).unwrap();
        let cursor = EventCursor::new(&trace);
        assert_eq!(cursor.peek(), Some(3));
        assert_eq!(cursor.peek(), Some(3));
        assert_eq!(cursor.remaining(), 2);
    }

    #[test]
    fn test_advance_until_exhausted() {
        let trace = Trace::from_times("ar", &[3, 7]).unwrap();
        let mut cursor = EventCursor::new(&trace);
        assert_eq!(cursor.advance(), Some(3));
        assert_eq!(cursor.peek_or(99), 7);
        assert_eq!(cursor.advance(), Some(7));
        assert!(cursor.is_exhausted());
        assert_eq!(cursor.advance(), None);
        assert_eq!(cursor.peek_or(99), 99);
    }

    #[test]
    fn test_advance_if() {
        let trace = Trace::from_times("r", &[4, 9]).unwrap();
        let mut cursor = EventCursor::new(&trace);
        assert_eq!(cursor.advance_if(|t| t < 4), None);
        assert_eq!(cursor.advance_if(|t| t < 5), Some(4));
        assert_eq!(cursor.peek(), Some(9));
    }

    #[test]
    fn test_empty_trace() {
        let trace = Trace::empty("r");
        let mut cursor = EventCursor::new(&trace);
        assert!(cursor.is_exhausted());
        assert_eq!(cursor.peek_or(0), 0);
        assert_eq!(cursor.next(), None);
    }
}
