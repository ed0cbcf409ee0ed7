use crate::config::{Config, Topics};
use crate::error::JourneyError;
use crate::event::{Record, TickEvents};
use crate::geo::GeoPoint;
use crate::movement::MovementModel;
use crate::publisher::Publisher;
use crate::synth::{self, Device};
use chrono::NaiveDateTime;
use log::{debug, info, warn};
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Wall-clock pause between ticks.
const DEFAULT_INTERVAL: Duration = Duration::from_secs(2);

/// The longest a [ThreadPacer] sleeps before rechecking for cancellation.
const PAUSE_SLICE: Duration = Duration::from_millis(100);

/// How a journey ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The vehicle reached its destination.
    Arrived,
    /// The operator asked the journey to stop.
    Cancelled,
    /// The configured number of ticks was published.
    TickLimit,
}

/// Totals for a finished journey.
#[derive(Clone, Debug, PartialEq)]
pub struct JourneySummary {
    pub outcome: Outcome,
    /// The number of fully published ticks.
    pub ticks: u64,
    /// Messages accepted by the publisher.
    pub published: usize,
    /// Messages acknowledged by the broker.
    pub delivered: usize,
    /// Messages rejected or not acknowledged.
    pub failed: usize,
    /// The vehicle's final position.
    pub position: GeoPoint,
    /// The final simulated time.
    pub clock: NaiveDateTime,
}

/// A shared flag used to stop a running journey.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Default::default()
    }

    /// Requests that the journey stop before its next tick.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Waits between ticks.
pub trait Pacer {
    /// Blocks for `interval`, or less if `cancel` is triggered.
    fn pause(&mut self, interval: Duration, cancel: &CancelToken);
}

/// Sleeps the current thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadPacer;

impl Pacer for ThreadPacer {
    fn pause(&mut self, interval: Duration, cancel: &CancelToken) {
        let deadline = Instant::now() + interval;
        while !cancel.is_cancelled() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            std::thread::sleep((deadline - now).min(PAUSE_SLICE));
        }
    }
}

impl<F: FnMut(Duration, &CancelToken)> Pacer for F {
    fn pause(&mut self, interval: Duration, cancel: &CancelToken) {
        self(interval, cancel)
    }
}

/// The attributes of a journey.
#[derive(Clone, Debug)]
pub struct JourneyAttributes {
    /// The simulated vehicle.
    pub device: Device,
    /// Where each stream is published.
    pub topics: Topics,
    /// Wall-clock pause between ticks.
    pub interval: Duration,
    /// Stop after this many published ticks, if set.
    pub max_ticks: Option<u64>,
}

impl Default for JourneyAttributes {
    fn default() -> Self {
        Self {
            device: Default::default(),
            topics: Default::default(),
            interval: DEFAULT_INTERVAL,
            max_ticks: None,
        }
    }
}

impl From<&Config> for JourneyAttributes {
    fn from(config: &Config) -> Self {
        Self {
            device: Device::with_id(config.device_id.clone()),
            topics: config.topics.clone(),
            interval: config.tick_interval,
            max_ticks: config.max_ticks,
        }
    }
}

/// Drives a vehicle along its route, publishing telemetry every tick.
///
/// Each tick moves the vehicle, generates one event per stream, and either
/// stops (the vehicle has arrived) or publishes all five events, flushes
/// the publisher and pauses. Cancellation is observed at the start of each
/// tick and while pausing, so a tick is either published in full or not
/// generated at all.
pub struct Journey<R, P, C = ThreadPacer> {
    /// The vehicle's position and clock.
    model: MovementModel,
    /// The simulated vehicle.
    device: Device,
    /// Where each stream is published.
    topics: Topics,
    /// The broker client.
    publisher: P,
    /// The source of all randomness.
    rng: R,
    /// Waits between ticks.
    pacer: C,
    /// Set to stop the journey.
    cancel: CancelToken,
    /// Wall-clock pause between ticks.
    interval: Duration,
    /// Stop after this many published ticks, if set.
    max_ticks: Option<u64>,
    /// The number of fully published ticks.
    ticks: u64,
    /// Messages accepted by the publisher.
    published: usize,
    /// Messages acknowledged by the broker.
    delivered: usize,
    /// Messages rejected or not acknowledged.
    failed: usize,
}

impl<R: Rng, P: Publisher> Journey<R, P> {
    /// Creates a journey that pauses by sleeping the current thread.
    pub fn new(model: MovementModel, attributes: JourneyAttributes, publisher: P, rng: R) -> Self {
        Self {
            model,
            device: attributes.device,
            topics: attributes.topics,
            publisher,
            rng,
            pacer: ThreadPacer,
            cancel: CancelToken::new(),
            interval: attributes.interval,
            max_ticks: attributes.max_ticks,
            ticks: 0,
            published: 0,
            delivered: 0,
            failed: 0,
        }
    }
}

impl<R: Rng, P: Publisher, C: Pacer> Journey<R, P, C> {
    /// Replaces the pacer.
    pub fn with_pacer<C2: Pacer>(self, pacer: C2) -> Journey<R, P, C2> {
        Journey {
            model: self.model,
            device: self.device,
            topics: self.topics,
            publisher: self.publisher,
            rng: self.rng,
            pacer,
            cancel: self.cancel,
            interval: self.interval,
            max_ticks: self.max_ticks,
            ticks: self.ticks,
            published: self.published,
            delivered: self.delivered,
            failed: self.failed,
        }
    }

    /// Uses an existing cancellation token.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// A handle that stops the journey when cancelled.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Runs ticks until the journey ends, then flushes the publisher.
    ///
    /// Outstanding messages are flushed even if a tick fails.
    pub fn run(&mut self) -> Result<JourneySummary, JourneyError> {
        info!(
            "{} starting journey from {} to {}",
            self.device.device_id,
            self.model.origin(),
            self.model.destination()
        );
        let result = self.drive();
        if let Err(err) = self.collect_reports() {
            warn!("Final flush failed: {err}");
        }
        let outcome = result?;
        let summary = self.summary(outcome);
        info!(
            "Journey ended ({:?}) after {} ticks: {} published, {} delivered, {} failed",
            summary.outcome, summary.ticks, summary.published, summary.delivered, summary.failed
        );
        Ok(summary)
    }

    /// Runs a single tick.
    ///
    /// Returns the outcome if the journey has ended, or `None` if the tick
    /// was published and the journey continues.
    pub fn step(&mut self) -> Result<Option<Outcome>, JourneyError> {
        if self.cancel.is_cancelled() {
            info!("Simulation ended by the user");
            return Ok(Some(Outcome::Cancelled));
        }
        if self.limit_reached() {
            info!("Tick limit of {} reached", self.ticks);
            return Ok(Some(Outcome::TickLimit));
        }

        let events = synth::tick(&mut self.model, &self.device, &mut self.rng);
        if self.model.has_arrived(events.vehicle.location) {
            info!(
                "Vehicle has reached its destination at {}. Simulation ending",
                events.vehicle.location
            );
            return Ok(Some(Outcome::Arrived));
        }

        self.publish(&events)?;
        self.collect_reports()?;
        self.ticks += 1;
        Ok(None)
    }

    /// The number of fully published ticks.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// The vehicle's position and clock.
    pub fn model(&self) -> &MovementModel {
        &self.model
    }

    /// The broker client.
    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    /// Consumes the journey, returning the broker client.
    pub fn into_publisher(self) -> P {
        self.publisher
    }

    /// Repeats [step](Self::step), pausing between ticks.
    fn drive(&mut self) -> Result<Outcome, JourneyError> {
        loop {
            if let Some(outcome) = self.step()? {
                return Ok(outcome);
            }
            if !self.limit_reached() {
                self.pacer.pause(self.interval, &self.cancel);
            }
        }
    }

    fn limit_reached(&self) -> bool {
        self.max_ticks.map_or(false, |max| self.ticks >= max)
    }

    /// Publishes a tick. Every event is encoded before the first is sent.
    fn publish(&mut self, events: &TickEvents) -> Result<(), JourneyError> {
        let records = events.encode()?;
        debug!(
            "tick {}: {} at {}",
            self.ticks + 1,
            events.vehicle.timestamp,
            events.vehicle.location
        );
        for Record {
            stream,
            key,
            payload,
        } in &records
        {
            let topic = self.topics.topic(*stream);
            match self.publisher.publish(topic, key, payload) {
                Ok(()) => self.published += 1,
                Err(err) => {
                    warn!("Message delivery failed: {err}");
                    self.failed += 1;
                }
            }
        }
        Ok(())
    }

    /// Flushes the publisher and tallies its delivery reports.
    fn collect_reports(&mut self) -> Result<(), JourneyError> {
        for report in self.publisher.flush()? {
            match &report.result {
                Ok(delivered) => {
                    self.delivered += 1;
                    debug!(
                        "Message delivered to {} [{}]",
                        report.topic, delivered.partition
                    );
                }
                Err(reason) => {
                    self.failed += 1;
                    warn!(
                        "Message delivery failed for {} on {}: {}",
                        report.key, report.topic, reason
                    );
                }
            }
        }
        Ok(())
    }

    fn summary(&self, outcome: Outcome) -> JourneySummary {
        JourneySummary {
            outcome,
            ticks: self.ticks,
            published: self.published,
            delivered: self.delivered,
            failed: self.failed,
            position: self.model.position(),
            clock: self.model.clock(),
        }
    }
}
