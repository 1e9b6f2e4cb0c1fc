//! Weighted DNS failover driven by CloudWatch alarm notifications.
//!
//! An SNS-delivered alarm state change flips the weights of a primary and a
//! secondary Route 53 record: `ALARM` sends traffic to the secondary, `OK`
//! sends it back to the primary, `INSUFFICIENT_DATA` leaves both alone.

pub mod config;
pub mod event;
pub mod provider;
pub mod record;
pub mod service;

pub use config::{ConfigError, FailoverConfig};
pub use event::{parse_alarm_state, parse_notification, AlarmNotification, AlarmState, EventError};
pub use provider::{DnsProvider, Route53Provider};
pub use record::{RecordDescriptor, RecordQuery, RoutingWeights, WeightedRecord, DEFAULT_TTL};
pub use service::{FailoverService, Response};
