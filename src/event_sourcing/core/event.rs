use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

// ============================================================================
// Event Envelope
// ============================================================================
//
// Wraps a domain event with the metadata the journal needs: position in the
// aggregate's stream and the correlation id shared by every event one command
// produced.
//
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct EventEnvelope<E> {
    pub event_id: Uuid,
    pub aggregate_id: Uuid,
    pub sequence_number: i64,
    pub event_type: String,
    pub event_data: E,
    pub correlation_id: Uuid,
    pub recorded_at: DateTime<Utc>,
}

impl<E: DomainEvent> EventEnvelope<E> {
    pub fn new(
        aggregate_id: Uuid,
        sequence_number: i64,
        event_data: E,
        correlation_id: Uuid,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            aggregate_id,
            sequence_number,
            event_type: event_data.event_type().to_string(),
            event_data,
            correlation_id,
            recorded_at: Utc::now(),
        }
    }
}

/// Domain events name themselves so envelopes can be labelled without a
/// per-aggregate lookup table.
pub trait DomainEvent: Serialize + for<'de> Deserialize<'de> + Clone + Send + Sync {
    fn event_type(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
    struct StockCounted {
        units: u32,
    }

    impl DomainEvent for StockCounted {
        fn event_type(&self) -> &'static str { "StockCounted" }
    }

    #[test]
    fn test_event_envelope_creation() {
        let aggregate_id = Uuid::new_v4();
        let correlation_id = Uuid::new_v4();

        let envelope = EventEnvelope::new(aggregate_id, 1, StockCounted { units: 4 }, correlation_id);

        assert_eq!(envelope.aggregate_id, aggregate_id);
        assert_eq!(envelope.sequence_number, 1);
        assert_eq!(envelope.event_type, "StockCounted");
        assert_eq!(envelope.correlation_id, correlation_id);
    }

    #[test]
    fn test_envelope_serialization_keeps_payload() {
        let envelope = EventEnvelope::new(Uuid::new_v4(), 3, StockCounted { units: 9 }, Uuid::new_v4());

        let json = serde_json::to_string(&envelope).unwrap();
        let back: EventEnvelope<StockCounted> = serde_json::from_str(&json).unwrap();

        assert_eq!(back.event_data, StockCounted { units: 9 });
        assert_eq!(back.sequence_number, 3);
    }
}
