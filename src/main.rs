use feature_flag_client::{Config, FlagEvaluationClient, HttpEvaluator};
use std::process::ExitCode;
use tracing::{error, info};

const NEW_UI_COMPONENTS: &str = "featureNewUIComponents";

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let evaluator = match HttpEvaluator::new(
        &config.base_url,
        config.sdk_key.clone(),
        config.environment.clone(),
        config.context(),
    ) {
        Ok(evaluator) => evaluator,
        Err(e) => {
            error!("Could not set up the flag evaluator: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let flags = FlagEvaluationClient::new(evaluator, config.client_options());

    match flags.evaluate(NEW_UI_COMPONENTS).await {
        Ok(true) => info!(flag = NEW_UI_COMPONENTS, "Flag is enabled. Showing the new UI components"),
        Ok(false) => info!(flag = NEW_UI_COMPONENTS, "Flag is disabled. Showing the old UI components"),
        Err(e) => {
            error!("Could not evaluate {}: {}", NEW_UI_COMPONENTS, e);
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}

fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
