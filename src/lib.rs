//! Synthetic telemetry for a single vehicle driving between two points.
//!
//! A [Journey] advances a [MovementModel] once per tick, derives vehicle, GPS,
//! traffic camera, weather and emergency incident events from the new
//! position and time, and publishes them through a [Publisher] until the
//! vehicle arrives or the journey is cancelled.

pub use config::{Config, Topics};
pub use error::{ConfigError, JourneyError, PublishError};
pub use event::{Record, Snapshot, Stream, TickEvents};
pub use geo::{GeoPoint, GeoVector};
pub use journey::{
    CancelToken, Journey, JourneyAttributes, JourneySummary, Outcome, Pacer, ThreadPacer,
};
#[cfg(feature = "kafka")]
pub use kafka::KafkaPublisher;
pub use movement::{MovementModel, RouteAttributes};
pub use publisher::{
    Delivered, DeliveryReport, MemoryPublisher, Message, Outstanding, Publisher, FLUSH_TIMED_OUT,
};
pub use synth::{Device, VehicleDescriptor};
pub use util::Interval;

mod config;
mod error;
pub mod event;
pub mod geo;
mod journey;
#[cfg(feature = "kafka")]
mod kafka;
mod movement;
mod publisher;
pub mod synth;
mod util;
