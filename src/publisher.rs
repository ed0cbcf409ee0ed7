use crate::error::PublishError;
use log::{debug, trace};
use std::collections::{BTreeMap, HashSet};

/// Why a message without a delivery report counts as failed.
pub const FLUSH_TIMED_OUT: &str = "not acknowledged before the flush timeout";

/// A message broker client.
///
/// `publish` only enqueues; the outcome of each message is reported by the
/// next call to `flush`, which blocks until every outstanding message has
/// been acknowledged or has failed.
pub trait Publisher {
    /// Enqueues a message for delivery.
    fn publish(&mut self, topic: &str, key: &str, payload: &[u8]) -> Result<(), PublishError>;

    /// Waits for all outstanding messages and returns their delivery reports.
    fn flush(&mut self) -> Result<Vec<DeliveryReport>, PublishError>;
}

impl<P: Publisher + ?Sized> Publisher for &mut P {
    fn publish(&mut self, topic: &str, key: &str, payload: &[u8]) -> Result<(), PublishError> {
        (**self).publish(topic, key, payload)
    }

    fn flush(&mut self) -> Result<Vec<DeliveryReport>, PublishError> {
        (**self).flush()
    }
}

/// Where a message landed on the broker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Delivered {
    pub partition: i32,
    pub offset: i64,
}

/// The outcome of delivering one message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeliveryReport {
    pub topic: String,
    pub key: String,
    pub result: Result<Delivered, String>,
}

impl DeliveryReport {
    /// Whether the broker acknowledged the message.
    pub fn is_delivered(&self) -> bool {
        self.result.is_ok()
    }
}

/// Messages that were enqueued but have no delivery report yet.
///
/// A flush that times out [expires](Self::expire) whatever is left, so every
/// enqueued message is reported exactly once. Reports that arrive after
/// their message expired are dropped.
#[derive(Default, Debug)]
pub struct Outstanding {
    /// Count of unreported messages per (topic, key).
    awaiting: BTreeMap<(String, String), usize>,
}

impl Outstanding {
    pub fn new() -> Self {
        Default::default()
    }

    /// Records a message that is waiting for its report.
    pub fn track(&mut self, topic: &str, key: &str) {
        *self
            .awaiting
            .entry((topic.to_string(), key.to_string()))
            .or_default() += 1;
    }

    /// The number of messages still waiting.
    pub fn len(&self) -> usize {
        self.awaiting.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.awaiting.is_empty()
    }

    /// Matches reports against waiting messages, keeping those that
    /// settle one.
    pub fn settle<I>(&mut self, reports: I) -> Vec<DeliveryReport>
    where
        I: IntoIterator<Item = DeliveryReport>,
    {
        reports
            .into_iter()
            .filter(|report| {
                let id = (report.topic.clone(), report.key.clone());
                match self.awaiting.get_mut(&id) {
                    Some(count) => {
                        *count -= 1;
                        if *count == 0 {
                            self.awaiting.remove(&id);
                        }
                        true
                    }
                    None => {
                        debug!("late report for {} on {} dropped", report.key, report.topic);
                        false
                    }
                }
            })
            .collect()
    }

    /// Gives up on every waiting message, reporting each one as failed.
    pub fn expire(&mut self, reason: &str) -> Vec<DeliveryReport> {
        let awaiting = std::mem::take(&mut self.awaiting);
        awaiting
            .into_iter()
            .flat_map(|((topic, key), count)| {
                std::iter::repeat(DeliveryReport {
                    topic,
                    key,
                    result: Err(reason.to_string()),
                })
                .take(count)
            })
            .collect()
    }
}

/// A message held by a [MemoryPublisher].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub topic: String,
    pub key: String,
    pub payload: Vec<u8>,
}

/// A publisher that keeps every message in memory.
///
/// Messages to topics marked with [fail_topic](Self::fail_topic) are
/// reported as undelivered on flush. Messages to topics marked with
/// [stall_topic](Self::stall_topic) are never acknowledged, so each flush
/// times out on them. Everything else is acknowledged with increasing
/// offsets on partition 0.
#[derive(Default, Debug)]
pub struct MemoryPublisher {
    /// Every message published, in order.
    messages: Vec<Message>,
    /// Indices into `messages` not yet flushed.
    pending: Vec<usize>,
    outstanding: Outstanding,
    /// Topics whose deliveries fail.
    failing: HashSet<String>,
    /// Topics whose deliveries never complete.
    stalled: HashSet<String>,
    /// The number of flush calls.
    flushes: usize,
}

impl MemoryPublisher {
    /// Creates an empty publisher.
    pub fn new() -> Self {
        Default::default()
    }

    /// Makes every future delivery to `topic` fail.
    pub fn fail_topic(&mut self, topic: &str) {
        self.failing.insert(topic.to_string());
    }

    /// Makes every future delivery to `topic` go unacknowledged.
    pub fn stall_topic(&mut self, topic: &str) {
        self.stalled.insert(topic.to_string());
    }

    /// All messages published so far.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Messages published to the given topic.
    pub fn messages_on<'a>(&'a self, topic: &'a str) -> impl Iterator<Item = &'a Message> {
        self.messages.iter().filter(move |msg| msg.topic == topic)
    }

    /// The number of messages published but not yet flushed.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// The number of times `flush` was called.
    pub fn flushes(&self) -> usize {
        self.flushes
    }
}

impl Publisher for MemoryPublisher {
    fn publish(&mut self, topic: &str, key: &str, payload: &[u8]) -> Result<(), PublishError> {
        trace!("enqueue {key} on {topic} ({} bytes)", payload.len());
        self.outstanding.track(topic, key);
        self.pending.push(self.messages.len());
        self.messages.push(Message {
            topic: topic.to_string(),
            key: key.to_string(),
            payload: payload.to_vec(),
        });
        Ok(())
    }

    fn flush(&mut self) -> Result<Vec<DeliveryReport>, PublishError> {
        self.flushes += 1;
        let acknowledged: Vec<_> = self
            .pending
            .drain(..)
            .filter(|&idx| !self.stalled.contains(&self.messages[idx].topic))
            .map(|idx| {
                let msg = &self.messages[idx];
                let result = if self.failing.contains(&msg.topic) {
                    Err("Broker: topic unavailable".to_string())
                } else {
                    Ok(Delivered {
                        partition: 0,
                        offset: idx as i64,
                    })
                };
                DeliveryReport {
                    topic: msg.topic.clone(),
                    key: msg.key.clone(),
                    result,
                }
            })
            .collect();
        let mut reports = self.outstanding.settle(acknowledged);
        reports.extend(self.outstanding.expire(FLUSH_TIMED_OUT));
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flush_drains_pending() {
        let mut publisher = MemoryPublisher::new();
        publisher.fail_topic("weather_data");
        publisher.publish("gps_data", "a", b"{}").unwrap();
        publisher.publish("weather_data", "b", b"{}").unwrap();
        assert_eq!(publisher.pending(), 2);

        let reports = publisher.flush().unwrap();
        assert_eq!(reports.len(), 2);
        assert!(reports[0].is_delivered());
        assert!(!reports[1].is_delivered());
        assert_eq!(reports[1].key, "b");
        assert_eq!(publisher.pending(), 0);
        assert!(publisher.flush().unwrap().is_empty());
        assert_eq!(publisher.messages().len(), 2);
        assert_eq!(publisher.messages_on("gps_data").count(), 1);
    }

    #[test]
    fn stalled_messages_fail_at_flush() {
        let mut publisher = MemoryPublisher::new();
        publisher.stall_topic("traffic_data");
        publisher.publish("traffic_data", "a", b"{}").unwrap();
        publisher.publish("gps_data", "b", b"{}").unwrap();

        let reports = publisher.flush().unwrap();
        assert_eq!(reports.len(), 2);
        assert!(reports[0].is_delivered());
        assert_eq!(reports[0].key, "b");
        assert_eq!(reports[1].key, "a");
        assert_eq!(reports[1].result, Err(FLUSH_TIMED_OUT.to_string()));
        assert!(publisher.flush().unwrap().is_empty());
    }

    fn report(topic: &str, key: &str) -> DeliveryReport {
        DeliveryReport {
            topic: topic.to_string(),
            key: key.to_string(),
            result: Ok(Delivered {
                partition: 0,
                offset: 0,
            }),
        }
    }

    #[test]
    fn outstanding_reports_each_message_once() {
        let mut outstanding = Outstanding::new();
        outstanding.track("gps_data", "a");
        outstanding.track("gps_data", "a");
        outstanding.track("weather_data", "b");
        assert_eq!(outstanding.len(), 3);

        let late = report("vehicle_data", "z");
        let settled = outstanding.settle(vec![report("gps_data", "a"), late]);
        assert_eq!(settled, vec![report("gps_data", "a")]);
        assert_eq!(outstanding.len(), 2);

        let expired = outstanding.expire("timed out");
        assert_eq!(expired.len(), 2);
        assert!(expired.iter().all(|r| r.result == Err("timed out".to_string())));
        assert_eq!(expired[0].key, "a");
        assert_eq!(expired[1].key, "b");
        assert!(outstanding.is_empty());

        // The broker answers after the flush gave up.
        assert!(outstanding.settle(vec![report("weather_data", "b")]).is_empty());
    }
}
