use aws_config::{BehaviorVersion, Region};
use kinesis_sales_pipeline::{
    clock::Deadline,
    config::ProducerSettings,
    producer::{EventGenerator, InvocationResponse, Producer},
    sink::KinesisSink,
    telemetry::{LogOutput, set_up_tracing},
};
use lambda_runtime::{Error, LambdaEvent, service_fn};
use std::sync::Arc;
use tracing::{debug, info};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let settings = ProducerSettings::from_env()?;
    set_up_tracing(&settings.log_level, LogOutput::Lambda)?;

    let aws_config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(settings.region.clone()))
        .load()
        .await;
    let sink = Arc::new(KinesisSink::new(aws_sdk_kinesis::Client::new(&aws_config)));
    let producer = Producer::new(sink, &settings);
    info!("Producer ready for stream '{}'", producer.stream_name());

    lambda_runtime::run(service_fn(|event| handle(&producer, event))).await
}

async fn handle(
    producer: &Producer,
    event: LambdaEvent<serde_json::Value>,
) -> Result<InvocationResponse, Error> {
    debug!("Event: {}", event.payload);
    let clock = Deadline::from_epoch_millis(event.context.deadline);
    let mut generator = EventGenerator::from_entropy();
    let summary = producer.run(&mut generator, &clock).await;
    Ok(summary.into_response())
}
