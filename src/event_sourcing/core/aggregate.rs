use uuid::Uuid;
use anyhow::Result;
use super::event::EventEnvelope;

// ============================================================================
// Aggregate Root Pattern
// ============================================================================
//
// 1. Commands are validated against current state and turned into events
// 2. Events are facts; applying them is the only way state changes
// 3. The snapshot kept in memory and a replay of the journal must agree
//
// ============================================================================

/// Generic Aggregate trait
///
/// Type Parameters:
/// - `Event`: The domain event type for this aggregate
/// - `Command`: The command type for this aggregate
/// - `Error`: The error type for business rule violations
pub trait Aggregate: Sized + Send + Sync {
    type Event;
    type Command;
    type Error;

    /// Create new aggregate from first event
    fn apply_first_event(event: &Self::Event) -> Result<Self, Self::Error>;

    /// Apply subsequent events to update state
    fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error>;

    /// Handle command and emit events (business logic)
    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error>;

    fn aggregate_id(&self) -> Uuid;

    /// Sequence number of the last applied event
    fn version(&self) -> i64;

    fn set_version(&mut self, version: i64);

    /// Rebuild from journal history
    fn load_from_events(events: Vec<EventEnvelope<Self::Event>>) -> Result<Self>
    where
        Self::Error: std::fmt::Display,
    {
        let mut envelopes = events.into_iter();
        let first = envelopes
            .next()
            .ok_or_else(|| anyhow::anyhow!("No events to load"))?;

        let mut aggregate = Self::apply_first_event(&first.event_data)
            .map_err(|e| anyhow::anyhow!("Failed to apply first event: {}", e))?;
        aggregate.set_version(first.sequence_number);

        for envelope in envelopes {
            aggregate
                .apply_event(&envelope.event_data)
                .map_err(|e| anyhow::anyhow!("Failed to apply event: {}", e))?;
            aggregate.set_version(envelope.sequence_number);
        }

        Ok(aggregate)
    }
}
