use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Error, Debug)]
pub enum EventError {
    #[error("Event is not a valid SNS envelope: {0}")]
    MalformedEnvelope(#[source] serde_json::Error),
    #[error("Event missing 'Records' field")]
    MissingRecords,
    #[error("Event 'Records' is empty")]
    EmptyRecords,
    #[error("Record missing 'Sns' field")]
    MissingSns,
    #[error("SNS record missing 'Message' field")]
    MissingMessage,
    #[error("Failed to parse SNS message as JSON: {0}")]
    InvalidMessage(#[source] serde_json::Error),
    #[error("SNS message missing 'NewStateValue' field")]
    MissingState,
    #[error("Unexpected alarm state: {0}")]
    UnknownState(String),
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "PascalCase")]
pub struct SnsEvent {
    pub records: Option<Vec<SnsRecord>>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "PascalCase")]
pub struct SnsRecord {
    pub sns: Option<SnsMessage>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "PascalCase")]
pub struct SnsMessage {
    pub message: Option<String>,
}

/// The CloudWatch alarm document carried in the SNS `Message` string.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "PascalCase")]
pub struct AlarmNotification {
    pub alarm_name: Option<String>,
    pub new_state_value: Option<String>,
    pub new_state_reason: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlarmState {
    Alarm,
    Ok,
    InsufficientData,
}

impl AlarmState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alarm => "ALARM",
            Self::Ok => "OK",
            Self::InsufficientData => "INSUFFICIENT_DATA",
        }
    }
}

impl fmt::Display for AlarmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AlarmState {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ALARM" => Ok(Self::Alarm),
            "OK" => Ok(Self::Ok),
            "INSUFFICIENT_DATA" => Ok(Self::InsufficientData),
            other => Err(EventError::UnknownState(other.to_string())),
        }
    }
}

/// Extracts the alarm document from the first record of an SNS envelope.
pub fn parse_notification(event: &Value) -> Result<AlarmNotification, EventError> {
    let envelope: SnsEvent =
        serde_json::from_value(event.clone()).map_err(EventError::MalformedEnvelope)?;

    let records = envelope.records.ok_or(EventError::MissingRecords)?;
    let record = records.into_iter().next().ok_or(EventError::EmptyRecords)?;
    let sns = record.sns.ok_or(EventError::MissingSns)?;

    let message = sns
        .message
        .filter(|message| !message.is_empty())
        .ok_or(EventError::MissingMessage)?;

    serde_json::from_str(&message).map_err(EventError::InvalidMessage)
}

impl AlarmNotification {
    pub fn state(&self) -> Result<AlarmState, EventError> {
        self.new_state_value
            .as_deref()
            .filter(|state| !state.is_empty())
            .ok_or(EventError::MissingState)?
            .parse()
    }
}

pub fn parse_alarm_state(event: &Value) -> Result<AlarmState, EventError> {
    parse_notification(event)?.state()
}

/// Logs why a notification was rejected. An unknown state is a warning since
/// CloudWatch may grow new states; everything else is a malformed event.
pub fn report_rejection(err: &EventError) {
    match err {
        EventError::UnknownState(_) => warn!("{}", err),
        _ => error!("{}", err),
    }
}
