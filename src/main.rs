mod telemetry;

use anyhow::Context;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from an optional .env file.
    if let Err(err) = dotenvy::dotenv() {
        if !err.not_found() {
            return Err(err).context("failed to read .env");
        }
    }

    telemetry::init();

    api::start().await?;

    Ok(())
}
