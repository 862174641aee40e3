//! gql-subscriber runner
//!
//! Subscribes to one GraphQL operation taken from the environment and logs
//! every data payload until interrupted.

use gql_subscriber::adapters::WebSocketConnector;
use gql_subscriber::application::SubscriptionClient;
use gql_subscriber::config::{ClientConfig, OperationConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::load()?;
    init_tracing(&config.log_level);
    config.validate()?;

    let operation = OperationConfig::load()?;
    operation.validate()?;
    let variables = operation.variables_json()?;

    let connector = WebSocketConnector::new(config.backoff.clone())?;
    let mut client = SubscriptionClient::new(config, connector)?;

    let id = client.subscribe(operation.query, variables, |payload| {
        tracing::info!(%payload, "Received data");
    });
    tracing::info!(subscription_id = %id, "Subscription registered");

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = client.next_event() => {
                if let Err(e) = result {
                    tracing::warn!("{}", e);
                }
            }
            _ = &mut shutdown => {
                tracing::info!("Interrupted, shutting down");
                break;
            }
        }
    }

    client.unsubscribe(id);
    client.disconnect();
    Ok(())
}

/// `RUST_LOG` wins over the configured level; `LOG_FORMAT=json` switches to
/// JSON lines.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let layer = if json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry().with(filter).with(layer).init();
}
