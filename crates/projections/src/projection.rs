//! Projection trait and per-view position tracking.

use async_trait::async_trait;
use event_store::StoredEvent;

use crate::Result;

/// How far into the global event log a view has read.
///
/// Positions are counted in events, starting at zero, and compared
/// against the one-based index the processor assigns while streaming.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectionPosition {
    /// Number of events processed by this view.
    pub events_processed: u64,
}

impl ProjectionPosition {
    /// A position that has seen nothing.
    pub fn zero() -> Self {
        Self {
            events_processed: 0,
        }
    }

    /// The position after one more event.
    pub fn advance(&self) -> Self {
        Self {
            events_processed: self.events_processed + 1,
        }
    }

    /// Whether the event at the given one-based log index has already
    /// been applied to this view.
    pub fn has_seen(&self, event_index: u64) -> bool {
        self.events_processed >= event_index
    }
}

impl std::fmt::Display for ProjectionPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "position({})", self.events_processed)
    }
}

/// A view fed from the event log.
///
/// Both the tracking directory and the dispute queue implement this
/// trait; the processor streams stored events into every registered
/// view and uses the reported position to skip events on catch-up.
#[async_trait]
pub trait Projection: Send + Sync {
    /// Name used in logs and metrics.
    fn name(&self) -> &'static str;

    /// Applies a single stored event to the view.
    async fn handle(&self, event: &StoredEvent) -> Result<()>;

    /// How far this view has read.
    async fn position(&self) -> ProjectionPosition;

    /// Drops the view's state so it can be rebuilt from scratch.
    async fn reset(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_position_has_seen_nothing() {
        let pos = ProjectionPosition::zero();
        assert_eq!(pos.events_processed, 0);
        assert!(!pos.has_seen(1));
    }

    #[test]
    fn advancing_marks_the_index_as_seen() {
        let pos = ProjectionPosition::zero().advance();
        assert!(pos.has_seen(1));
        assert!(!pos.has_seen(2));

        let pos = pos.advance();
        assert_eq!(pos.events_processed, 2);
        assert!(pos.has_seen(2));
    }

    #[test]
    fn position_display() {
        let pos = ProjectionPosition {
            events_processed: 42,
        };
        assert_eq!(pos.to_string(), "position(42)");
    }
}
