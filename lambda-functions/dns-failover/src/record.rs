use crate::event::AlarmState;
use bon::Builder;
use std::fmt;

/// TTL applied to standard records the provider returns without one.
pub const DEFAULT_TTL: i64 = 300;

/// Current shape of a weighted record, as read back from the provider.
///
/// Exactly one of the two shapes is ever submitted: alias fields or
/// value/TTL fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordDescriptor {
    Alias {
        dns_name: String,
        hosted_zone_id: String,
    },
    Standard {
        values: Vec<String>, // order preserved on re-submit
        ttl: i64,
    },
}

impl RecordDescriptor {
    pub fn is_alias(&self) -> bool {
        matches!(self, Self::Alias { .. })
    }
}

/// Identifies one weighted record within a hosted zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordQuery {
    pub name: String,
    pub record_type: String,
    pub identifier: String,
}

impl RecordQuery {
    pub fn new(
        name: impl Into<String>,
        record_type: impl Into<String>,
        identifier: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            record_type: record_type.into(),
            identifier: identifier.into(),
        }
    }
}

impl fmt::Display for RecordQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} (identifier '{}')",
            self.name, self.record_type, self.identifier
        )
    }
}

/// A record to re-submit with a new weight.
#[derive(Builder, Debug, Clone, PartialEq, Eq)]
#[builder(on(String, into))]
pub struct WeightedRecord {
    pub name: String,
    pub record_type: String,
    pub identifier: String,
    pub weight: i64,
    pub descriptor: RecordDescriptor,
}

impl WeightedRecord {
    pub fn from_query(query: &RecordQuery, weight: i64, descriptor: RecordDescriptor) -> Self {
        Self::builder()
            .name(query.name.as_str())
            .record_type(query.record_type.as_str())
            .identifier(query.identifier.as_str())
            .weight(weight)
            .descriptor(descriptor)
            .build()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutingWeights {
    pub primary: i64,   // 0 or 1
    pub secondary: i64, // always the complement of primary
}

impl RoutingWeights {
    /// `None` means the state calls for no change.
    pub fn for_state(state: AlarmState) -> Option<Self> {
        match state {
            AlarmState::Alarm => Some(Self {
                primary: 0,
                secondary: 1,
            }),
            AlarmState::Ok => Some(Self {
                primary: 1,
                secondary: 0,
            }),
            AlarmState::InsufficientData => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alarm_routes_to_secondary() {
        let weights = RoutingWeights::for_state(AlarmState::Alarm).unwrap();
        assert_eq!(weights.primary, 0);
        assert_eq!(weights.secondary, 1);
    }

    #[test]
    fn test_ok_routes_to_primary() {
        let weights = RoutingWeights::for_state(AlarmState::Ok).unwrap();
        assert_eq!(weights.primary, 1);
        assert_eq!(weights.secondary, 0);
    }

    #[test]
    fn test_insufficient_data_has_no_weights() {
        assert_eq!(RoutingWeights::for_state(AlarmState::InsufficientData), None);
    }

    #[test]
    fn test_weighted_record_keeps_query_fields() {
        let query = RecordQuery::new("example.com.", "A", "primary");
        let descriptor = RecordDescriptor::Standard {
            values: vec!["192.0.2.10".to_string(), "192.0.2.11".to_string()],
            ttl: 60,
        };

        let record = WeightedRecord::from_query(&query, 0, descriptor.clone());

        assert_eq!(record.name, "example.com.");
        assert_eq!(record.record_type, "A");
        assert_eq!(record.identifier, "primary");
        assert_eq!(record.weight, 0);
        assert_eq!(record.descriptor, descriptor);
        assert!(!record.descriptor.is_alias());
    }

    #[test]
    fn test_query_display() {
        let query = RecordQuery::new("example.com.", "AAAA", "secondary");
        assert_eq!(
            query.to_string(),
            "example.com. AAAA (identifier 'secondary')"
        );
    }
}
