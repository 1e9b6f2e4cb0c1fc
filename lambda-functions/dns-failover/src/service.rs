use crate::config::{ConfigError, FailoverConfig};
use crate::event::{parse_notification, report_rejection, AlarmState};
use crate::provider::DnsProvider;
use crate::record::{RecordDescriptor, RecordQuery, RoutingWeights, WeightedRecord};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

/// Invocation result: an HTTP-style status plus a JSON-encoded body.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub status_code: u16, // 200, 400 or 500
    pub body: String,     // JSON object with "message" or "error"
}

impl Response {
    fn new(status_code: u16, body: Value) -> Self {
        Self {
            status_code,
            body: body.to_string(),
        }
    }

    pub fn configuration_error(err: &ConfigError) -> Self {
        Self::new(
            500,
            json!({ "error": "Configuration error", "message": err.to_string() }),
        )
    }

    pub fn invalid_event() -> Self {
        Self::new(400, json!({ "error": "Invalid event structure" }))
    }

    pub fn lookup_failed(message: &str) -> Self {
        Self::new(500, json!({ "error": message }))
    }

    pub fn update_failed() -> Self {
        Self::new(500, json!({ "error": "Failed to update DNS weights" }))
    }

    pub fn no_action(state: AlarmState) -> Self {
        Self::new(
            200,
            json!({ "message": format!("No action taken for state: {}", state) }),
        )
    }

    pub fn updated(state: AlarmState) -> Self {
        Self::new(
            200,
            json!({ "message": format!("DNS weights updated successfully for state: {}", state) }),
        )
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}

pub struct FailoverService<P> {
    provider: P,
    config: FailoverConfig,
}

impl<P: DnsProvider> FailoverService<P> {
    pub fn new(provider: P, config: FailoverConfig) -> Self {
        Self { provider, config }
    }

    fn query(&self, identifier: &str) -> RecordQuery {
        RecordQuery::new(
            self.config.record_set_name.as_str(),
            self.config.record_type.as_str(),
            identifier,
        )
    }

    async fn lookup(&self, query: &RecordQuery) -> Option<RecordDescriptor> {
        match self
            .provider
            .find_record(&self.config.hosted_zone_id, query)
            .await
        {
            Ok(Some(descriptor)) => Some(descriptor),
            Ok(None) => {
                error!("Record not found for {}", query);
                None
            }
            Err(e) => {
                error!("Error retrieving record info for {}: {:#}", query, e);
                None
            }
        }
    }

    async fn set_weight(
        &self,
        query: &RecordQuery,
        weight: i64,
        descriptor: RecordDescriptor,
    ) -> bool {
        debug!(
            "Setting {} ({} record) to weight {}",
            query,
            if descriptor.is_alias() { "alias" } else { "standard" },
            weight
        );
        let record = WeightedRecord::from_query(query, weight, descriptor);

        match self
            .provider
            .upsert_record(&self.config.hosted_zone_id, &record)
            .await
        {
            Ok(_) => true,
            Err(e) => {
                error!("Error setting DNS record weight for {}: {:#}", query, e);
                false
            }
        }
    }

    /// Runs one failover toggle for the given SNS notification.
    pub async fn handle_event(&self, event: &Value) -> Response {
        let parsed = parse_notification(event).and_then(|notification| {
            let state = notification.state()?;
            Ok((state, notification))
        });

        let (state, notification) = match parsed {
            Ok(parsed) => parsed,
            Err(e) => {
                report_rejection(&e);
                return Response::invalid_event();
            }
        };

        if let Some(alarm_name) = &notification.alarm_name {
            info!(
                "Alarm {} changed state: {}",
                alarm_name,
                notification.new_state_reason.as_deref().unwrap_or("no reason given")
            );
        }

        info!("Processing alarm state: {}", state);
        self.apply_state(state).await
    }

    pub async fn apply_state(&self, state: AlarmState) -> Response {
        // INSUFFICIENT_DATA leaves routing untouched, no provider calls needed
        let Some(weights) = RoutingWeights::for_state(state) else {
            warn!("Unhandled alarm state: {} - no action taken", state);
            return Response::no_action(state);
        };

        let primary = self.query(&self.config.primary_identifier);
        let secondary = self.query(&self.config.secondary_identifier);

        // Look up both so a failure report can name each missing side
        let primary_record = self.lookup(&primary).await;
        let secondary_record = self.lookup(&secondary).await;

        let (primary_record, secondary_record) = match (primary_record, secondary_record) {
            (Some(p), Some(s)) => (p, s),
            (p, s) => {
                let message = lookup_failure_message(
                    p.is_none().then_some(primary.identifier.as_str()),
                    s.is_none().then_some(secondary.identifier.as_str()),
                );
                error!("{}", message);
                return Response::lookup_failed(&message);
            }
        };

        match state {
            AlarmState::Alarm => info!("ALARM state detected - routing traffic to secondary"),
            _ => info!("{} state detected - routing traffic to primary", state),
        }

        // Primary first; the secondary is left alone if that fails
        let success = self.set_weight(&primary, weights.primary, primary_record).await
            && self
                .set_weight(&secondary, weights.secondary, secondary_record)
                .await;

        if success {
            info!("DNS weights updated successfully");
            Response::updated(state)
        } else {
            error!("Failed to update DNS weights");
            Response::update_failed()
        }
    }
}

/// Names whichever side(s) of the pair could not be resolved.
pub fn lookup_failure_message(primary: Option<&str>, secondary: Option<&str>) -> String {
    let mut failed = Vec::new();

    if let Some(identifier) = primary {
        failed.push(format!("primary identifier '{}'", identifier));
    }
    if let Some(identifier) = secondary {
        failed.push(format!("secondary identifier '{}'", identifier));
    }

    format!(
        "Failed to retrieve record information for {}",
        failed.join(" and ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_serialization() {
        let response = Response::updated(AlarmState::Alarm);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["statusCode"], 200);
        let body: Value = serde_json::from_str(json["body"].as_str().unwrap()).unwrap();
        assert_eq!(
            body["message"],
            "DNS weights updated successfully for state: ALARM"
        );
    }

    #[test]
    fn test_configuration_error_response() {
        let err = ConfigError::MissingVariables(vec!["HOSTED_ZONE_ID".to_string()]);
        let response = Response::configuration_error(&err);

        assert_eq!(response.status_code, 500);
        assert!(!response.is_success());
        assert!(response.body.contains("Configuration error"));
        assert!(response.body.contains("HOSTED_ZONE_ID"));
    }

    #[test]
    fn test_invalid_event_response() {
        let response = Response::invalid_event();
        assert_eq!(response.status_code, 400);
        assert_eq!(response.body, r#"{"error":"Invalid event structure"}"#);
    }

    #[test]
    fn test_lookup_failure_message() {
        assert_eq!(
            lookup_failure_message(Some("primary"), None),
            "Failed to retrieve record information for primary identifier 'primary'"
        );
        assert_eq!(
            lookup_failure_message(None, Some("secondary")),
            "Failed to retrieve record information for secondary identifier 'secondary'"
        );
        assert_eq!(
            lookup_failure_message(Some("primary"), Some("secondary")),
            "Failed to retrieve record information for primary identifier 'primary' and secondary identifier 'secondary'"
        );
    }
}
