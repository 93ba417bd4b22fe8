use kinesis_sales_pipeline::{
    config::TransformerSettings,
    telemetry::{LogOutput, set_up_tracing},
    transformer::{FirehoseTransformationEvent, FirehoseTransformationResponse, transform_batch},
};
use lambda_runtime::{Error, LambdaEvent, service_fn};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let settings = TransformerSettings::from_env()?;
    set_up_tracing(&settings.log_level, LogOutput::Lambda)?;

    lambda_runtime::run(service_fn(handle)).await
}

async fn handle(
    event: LambdaEvent<FirehoseTransformationEvent>,
) -> Result<FirehoseTransformationResponse, Error> {
    let (response, _) = transform_batch(&event.payload);
    Ok(response)
}
