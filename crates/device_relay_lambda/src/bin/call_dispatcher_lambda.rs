use std::sync::Arc;

use device_relay_core::clock::SystemClock;
use device_relay_core::cooldown::InMemoryCooldownStore;
use device_relay_lambda::adapters::reqwest_transport::BlockingHttpTransport;
use device_relay_lambda::config::DispatcherConfig;
use device_relay_lambda::handlers::call_dispatcher::CallDispatcher;
use device_relay_lambda::logging::init_tracing;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

fn running_in_lambda() -> bool {
    std::env::var_os("AWS_LAMBDA_FUNCTION_NAME").is_some()
}

async fn handle_request(
    dispatcher: &CallDispatcher,
    event: LambdaEvent<Value>,
) -> Result<String, Error> {
    let response = tokio::task::block_in_place(|| dispatcher.handle_event(&event.payload))?;
    Ok(response)
}

fn run_local(dispatcher: &CallDispatcher) -> Result<(), Error> {
    let raw = std::env::args()
        .nth(1)
        .ok_or_else(|| Error::from("usage: call_dispatcher_lambda '<event json>'"))?;
    let event: Value = serde_json::from_str(&raw)
        .map_err(|error| Error::from(format!("invalid event argument: {error}")))?;
    let response = tokio::task::block_in_place(|| dispatcher.handle_event(&event))?;
    println!("{response}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = DispatcherConfig::from_env()?;
    init_tracing(&config.log_level);

    let transport = tokio::task::block_in_place(BlockingHttpTransport::new)?;
    // Lives as long as the warm container; shared by every invocation it serves.
    let cooldowns = Arc::new(InMemoryCooldownStore::new(config.cooldown_secs));
    let dispatcher = CallDispatcher::new(
        &config,
        Arc::new(transport),
        cooldowns,
        Arc::new(SystemClock),
    );

    if !running_in_lambda() {
        return run_local(&dispatcher);
    }

    let dispatcher = &dispatcher;
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        handle_request(dispatcher, event).await
    }))
    .await
}
