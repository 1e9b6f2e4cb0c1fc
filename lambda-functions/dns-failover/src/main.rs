use dns_failover::{ConfigError, FailoverConfig, FailoverService, Response, Route53Provider};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde_json::Value;
use tracing::{error, info, warn};

type Service = Result<FailoverService<Route53Provider>, ConfigError>;

async fn function_handler(
    service: &Service,
    event: LambdaEvent<Value>,
) -> Result<Response, Error> {
    info!("Received event: {}", event.payload);

    match service {
        Ok(service) => {
            let response = service.handle_event(&event.payload).await;
            if !response.is_success() {
                warn!(
                    "Failover finished with status {}: {}",
                    response.status_code, response.body
                );
            }
            Ok(response)
        }
        Err(e) => {
            error!("Configuration error: {}", e);
            Ok(Response::configuration_error(e))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .json()
        .init();

    // Client and settings are shared by every invocation of this environment
    let provider = Route53Provider::new().await;
    let service: Service =
        FailoverConfig::from_env().map(|config| FailoverService::new(provider, config));
    let service = &service;

    run(service_fn(move |event: LambdaEvent<Value>| async move {
        function_handler(service, event).await
    }))
    .await
}
