use std::sync::Arc;

use device_relay_core::clock::SystemClock;
use device_relay_lambda::adapters::reqwest_transport::BlockingHttpTransport;
use device_relay_lambda::config::ReporterConfig;
use device_relay_lambda::handlers::state_reporter::StateReporter;
use device_relay_lambda::logging::init_tracing;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::{json, Value};

/// Event used when the binary runs outside Lambda without an argument.
fn sample_event() -> Value {
    json!({
        "device": "g88_pi",
        "attribute": "led",
        "value": "on"
    })
}

fn running_in_lambda() -> bool {
    std::env::var_os("AWS_LAMBDA_FUNCTION_NAME").is_some()
}

async fn handle_request(
    reporter: &StateReporter,
    event: LambdaEvent<Value>,
) -> Result<Value, Error> {
    let response = tokio::task::block_in_place(|| reporter.handle_event(&event.payload))?;
    Ok(response)
}

fn run_local(reporter: &StateReporter) -> Result<(), Error> {
    let event = match std::env::args().nth(1) {
        Some(raw) => serde_json::from_str(&raw)
            .map_err(|error| Error::from(format!("invalid event argument: {error}")))?,
        None => sample_event(),
    };
    let response = tokio::task::block_in_place(|| reporter.handle_event(&event))?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = ReporterConfig::from_env()?;
    init_tracing(&config.log_level);

    let transport = tokio::task::block_in_place(BlockingHttpTransport::new)?;
    let reporter = StateReporter::new(&config, Arc::new(transport), Arc::new(SystemClock));

    if !running_in_lambda() {
        return run_local(&reporter);
    }

    let reporter = &reporter;
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        handle_request(reporter, event).await
    }))
    .await
}
