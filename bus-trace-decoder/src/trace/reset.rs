//! Reset boundary tracking

use crate::types::{Tick, Trace};

/// Tracks "the next reset assertion at or after the current tick"
///
/// Reset assertions are the samples of the reset trace whose value equals the
/// active value. Once the assertions run out the boundary sits at the
/// end-of-trace sentinel.
#[derive(Debug, Clone)]
pub struct ResetTracker {
    assertions: Vec<Tick>,
    position: usize,
    sentinel: Tick,
    current: Option<Tick>,
}

impl ResetTracker {
    pub fn new(reset: &Trace, active_value: &str, sentinel: Tick) -> Self {
        let assertions: Vec<Tick> = reset
            .samples()
            .iter()
            .filter(|s| s.value == active_value)
            .map(|s| s.time)
            .collect();
        log::debug!(
            "{}: {} reset assertion(s), sentinel at {}",
            reset.channel(),
            assertions.len(),
            sentinel
        );
        let mut tracker = Self {
            assertions,
            position: 0,
            sentinel,
            current: None,
        };
        tracker.current = tracker.pull();
        tracker
    }

    /// A tracker that never sees a reset
    pub fn never(sentinel: Tick) -> Self {
        Self {
            assertions: Vec::new(),
            position: 0,
            sentinel,
            current: None,
        }
    }

    fn pull(&mut self) -> Option<Tick> {
        let next = self.assertions.get(self.position).copied();
        if next.is_some() {
            self.position += 1;
        }
        next
    }

    /// Move the boundary forward until it is not before `time`
    ///
    /// Returns the latest reset assertion that was passed, if any. Work still
    /// in flight at that point was abandoned by it.
    pub fn advance_to(&mut self, time: Tick) -> Option<Tick> {
        let mut crossed = None;
        while let Some(reset) = self.current {
            if reset >= time {
                break;
            }
            crossed = Some(reset);
            self.current = self.pull();
        }
        crossed
    }

    /// Current boundary (the sentinel once assertions are exhausted)
    pub fn next_reset(&self) -> Tick {
        self.current.unwrap_or(self.sentinel)
    }

    /// Whether the boundary is the end-of-trace sentinel
    pub fn is_sentinel(&self) -> bool {
        self.current.is_none()
    }

    /// Whether an event at `time` lies past the boundary
    pub fn is_past(&self, time: Tick) -> bool {
        time > self.next_reset()
    }
}

/// Ticks within `[start, end]` during which `reset` holds the active value
///
/// A reset still active at the last sample counts until `end`.
pub fn active_ticks(reset: &Trace, active_value: &str, start: Tick, end: Tick) -> Tick {
    let overlap = |from: Tick, to: Tick| to.min(end).saturating_sub(from.max(start));
    let mut total = 0;
    let mut active_since = None;
    for sample in reset.samples() {
        match (active_since, sample.value == active_value) {
            (None, true) => active_since = Some(sample.time),
            (Some(since), false) => {
                total += overlap(since, sample.time);
                active_since = None;
            }
            _ => {}
        }
    }
    if let Some(since) = active_since {
        total += overlap(since, end);
    }
    total
}
