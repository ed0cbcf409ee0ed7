//! A [Publisher] backed by a Kafka producer.

use crate::config::Config;
use crate::error::PublishError;
use crate::publisher::{Delivered, DeliveryReport, Outstanding, Publisher, FLUSH_TIMED_OUT};
use log::{error, warn};
use rdkafka::config::ClientConfig;
use rdkafka::error::KafkaError;
use rdkafka::message::Message;
use rdkafka::producer::{BaseProducer, BaseRecord, DeliveryResult, Producer, ProducerContext};
use rdkafka::ClientContext;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;
use std::time::Duration;

/// Forwards delivery callbacks to the publisher.
struct DeliveryContext {
    reports: Mutex<Sender<DeliveryReport>>,
}

impl ClientContext for DeliveryContext {
    fn error(&self, error: KafkaError, reason: &str) {
        error!("kafka err: {error}: {reason}");
    }
}

impl ProducerContext for DeliveryContext {
    type DeliveryOpaque = ();

    fn delivery(&self, result: &DeliveryResult<'_>, _: Self::DeliveryOpaque) {
        let report = match result {
            Ok(msg) => DeliveryReport {
                topic: msg.topic().to_string(),
                key: key_of(msg),
                result: Ok(Delivered {
                    partition: msg.partition(),
                    offset: msg.offset(),
                }),
            },
            Err((err, msg)) => DeliveryReport {
                topic: msg.topic().to_string(),
                key: key_of(msg),
                result: Err(err.to_string()),
            },
        };
        let sent = self
            .reports
            .lock()
            .map(|reports| reports.send(report).is_ok())
            .unwrap_or(false);
        if !sent {
            warn!("Dropped a delivery report; the publisher is gone");
        }
    }
}

fn key_of<M: Message>(msg: &M) -> String {
    msg.key()
        .map(|key| String::from_utf8_lossy(key).into_owned())
        .unwrap_or_default()
}

/// Publishes to Kafka.
///
/// Messages are enqueued without blocking; [flush](Publisher::flush) waits
/// up to `flush_timeout` for every acknowledgement. Messages still
/// unacknowledged when it gives up are reported as failed.
pub struct KafkaPublisher {
    producer: BaseProducer<DeliveryContext>,
    reports: Receiver<DeliveryReport>,
    outstanding: Outstanding,
    flush_timeout: Duration,
}

impl KafkaPublisher {
    /// Creates a producer connected to `config.bootstrap_servers`.
    pub fn connect(config: &Config) -> Result<Self, PublishError> {
        let (tx, rx) = mpsc::channel();
        let context = DeliveryContext {
            reports: Mutex::new(tx),
        };
        let producer = ClientConfig::new()
            .set("bootstrap.servers", &config.bootstrap_servers)
            .set(
                "message.timeout.ms",
                config.message_timeout.as_millis().to_string(),
            )
            .create_with_context(context)
            .map_err(|e| PublishError::Connect(e.to_string()))?;
        Ok(Self {
            producer,
            reports: rx,
            outstanding: Outstanding::new(),
            flush_timeout: config.flush_timeout,
        })
    }
}

impl Publisher for KafkaPublisher {
    fn publish(&mut self, topic: &str, key: &str, payload: &[u8]) -> Result<(), PublishError> {
        let record = BaseRecord::to(topic).key(key).payload(payload);
        self.producer
            .send(record)
            .map_err(|(err, _)| PublishError::Rejected {
                topic: topic.to_string(),
                key: key.to_string(),
                reason: err.to_string(),
            })?;
        self.outstanding.track(topic, key);
        self.producer.poll(Duration::ZERO);
        Ok(())
    }

    fn flush(&mut self) -> Result<Vec<DeliveryReport>, PublishError> {
        let flushed = self.producer.flush(self.flush_timeout);
        let mut reports = self.outstanding.settle(self.reports.try_iter());
        if let Err(err) = flushed {
            warn!(
                "Flush gave up on {} message(s): {err}",
                self.outstanding.len()
            );
            reports.extend(self.outstanding.expire(FLUSH_TIMED_OUT));
        }
        Ok(reports)
    }
}
