use std::error::Error;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Load environment variables from .env file when present.
    // A missing file is fine in CI where the variables come from the runner.
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e.into());
        }
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info,mr_decorator=info"))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init()?;

    api::start().await?;

    Ok(())
}
