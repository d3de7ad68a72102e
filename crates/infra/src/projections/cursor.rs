//! Per-stream projection cursors.
//!
//! A cursor is the last sequence number a projection applied for one
//! aggregate stream. Redelivered envelopes at or below the cursor are skipped,
//! which makes every projection safe under at-least-once delivery.

use std::collections::HashMap;
use std::sync::RwLock;

use thiserror::Error;

use estate_core::AggregateId;

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("failed to deserialize {aggregate_type} event: {reason}")]
    Deserialize {
        aggregate_type: &'static str,
        reason: String,
    },
    #[error("event does not belong to stream {0}")]
    StreamMismatch(AggregateId),
    #[error("non-monotonic sequence number (last={last}, found={found})")]
    NonMonotonicSequence { last: u64, found: u64 },
}

/// What to do with an incoming envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorCheck {
    Apply,
    /// Already applied.
    Skip,
}

#[derive(Debug, Default)]
pub struct StreamCursors {
    cursors: RwLock<HashMap<AggregateId, u64>>,
}

impl StreamCursors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, aggregate_id: AggregateId) -> u64 {
        match self.cursors.read() {
            Ok(cursors) => cursors.get(&aggregate_id).copied().unwrap_or(0),
            Err(_) => 0,
        }
    }

    /// Decide whether `seq` is new for the stream. A gap after the first
    /// applied event is an error.
    pub fn check(&self, aggregate_id: AggregateId, seq: u64) -> Result<CursorCheck, ProjectionError> {
        let last = self.get(aggregate_id);
        if seq == 0 {
            return Err(ProjectionError::NonMonotonicSequence { last, found: seq });
        }
        if seq <= last {
            return Ok(CursorCheck::Skip);
        }
        if last != 0 && seq != last + 1 {
            return Err(ProjectionError::NonMonotonicSequence { last, found: seq });
        }
        Ok(CursorCheck::Apply)
    }

    pub fn advance(&self, aggregate_id: AggregateId, seq: u64) {
        if let Ok(mut cursors) = self.cursors.write() {
            cursors.insert(aggregate_id, seq);
        }
    }

    pub fn clear(&self) {
        if let Ok(mut cursors) = self.cursors.write() {
            cursors.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replays_are_skipped_and_gaps_rejected() {
        let cursors = StreamCursors::new();
        let id = AggregateId::new();

        assert_eq!(cursors.check(id, 1).unwrap(), CursorCheck::Apply);
        cursors.advance(id, 1);
        assert_eq!(cursors.check(id, 1).unwrap(), CursorCheck::Skip);
        assert_eq!(cursors.check(id, 2).unwrap(), CursorCheck::Apply);
        assert!(matches!(
            cursors.check(id, 4),
            Err(ProjectionError::NonMonotonicSequence { last: 1, found: 4 })
        ));

        cursors.clear();
        assert_eq!(cursors.get(id), 0);
    }
}
