use anyhow::Result;
use kinesis_sales_pipeline::{
    config::ServerSettings,
    server,
    telemetry::{LogOutput, set_up_tracing},
};

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine.
    dotenv::dotenv().ok();
    let settings = ServerSettings::from_env()?;
    set_up_tracing(&settings.producer.log_level, LogOutput::Terminal)?;
    server::serve(&settings).await?;
    Ok(())
}
