use crate::types::{Position, PriceUpdate, RealizedGains, Transaction};
use rdkafka::producer::{FutureProducer, FutureRecord};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{error, info, trace, warn};

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Event {
    Transaction(Transaction),
    Position(Position),
    RealizedGains(RealizedGains),
    Price(PriceUpdate),
}

impl Event {
    fn topic_and_key(&self) -> (&'static str, String) {
        match self {
            Event::Transaction(transaction) => ("transactions", transaction.key().to_string()),
            Event::Position(position) => ("positions", position.key().to_string()),
            Event::RealizedGains(gains) => ("realized-gains", gains.key().to_string()),
            Event::Price(update) => ("prices", update.symbol.clone()),
        }
    }
}

/// Receiver of committed accounting changes. Implementations must not block the caller.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, event: Event);
}

/// Sink for deployments without a broker.
#[derive(Debug, Default)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn notify(&self, event: Event) {
        trace!(?event, "Discarding event");
    }
}

struct EventSender {
    producer: FutureProducer,
    receiver: mpsc::Receiver<Event>,
}

impl EventSender {
    fn new(producer: FutureProducer, receiver: mpsc::Receiver<Event>) -> Self {
        Self { producer, receiver }
    }

    #[tracing::instrument(skip(self))]
    pub async fn run(&mut self) {
        info!("Starting EventSender");
        while let Some(event) = self.receiver.recv().await {
            trace!(?event, "Sending event");
            let payload = match serde_json::to_string(&event) {
                Ok(payload) => payload,
                Err(e) => {
                    error!("{:?}", e);
                    continue;
                }
            };
            let (topic, key) = event.topic_and_key();
            let record = FutureRecord::to(topic).key(&key).payload(&payload);
            let send = self.producer.send(record, Duration::ZERO).await;
            if let Err((e, m)) = send {
                error!("Error: {:?}\nMessage: {:?}", e, m)
            }
        }
        info!("Ending EventSender");
    }
}

pub struct EventSenderHandle {
    sender: mpsc::Sender<Event>,
}

impl EventSenderHandle {
    pub fn new(producer: FutureProducer) -> Self {
        let (sender, receiver) = mpsc::channel(64);
        let mut actor = EventSender::new(producer, receiver);
        tokio::spawn(async move { actor.run().await });
        Self { sender }
    }
}

impl NotificationSink for EventSenderHandle {
    fn notify(&self, event: Event) {
        match self.sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => warn!(?event, "Event queue full, dropping event"),
            Err(TrySendError::Closed(event)) => error!(?event, "EventSender has stopped, dropping event"),
        }
    }
}
