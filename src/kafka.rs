use crate::event_sender::{EventSenderHandle, NotificationSink, NullSink};
use crate::settings::KafkaSettings;
use anyhow::{Context, Result};
use rdkafka::{producer::FutureProducer, ClientConfig};
use std::sync::Arc;
use tracing::info;

pub fn producer(settings: &KafkaSettings) -> Result<FutureProducer> {
    let mut config = ClientConfig::new();
    let config = settings.config(&mut config);
    let producer: FutureProducer = config
        .set("enable.ssl.certificate.verification", "false")
        .create()
        .context("Failed to create kafka producer")?;
    Ok(producer)
}

/// Publish to Kafka when a broker is configured, otherwise discard events.
pub fn notification_sink(settings: Option<&KafkaSettings>) -> Result<Arc<dyn NotificationSink>> {
    match settings {
        Some(settings) => Ok(Arc::new(EventSenderHandle::new(producer(settings)?))),
        None => {
            info!("No Kafka settings, events will not be published");
            Ok(Arc::new(NullSink))
        }
    }
}
