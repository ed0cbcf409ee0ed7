//! Runtime configuration, read from environment variables.

use crate::error::ConfigError;
use crate::event::Stream;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_BOOTSTRAP_SERVERS: &str = "localhost:9092";
const DEFAULT_DEVICE_ID: &str = "Vehicle-Kofi-123";
const DEFAULT_TICK_INTERVAL_MS: u64 = 2000;
const DEFAULT_MESSAGE_TIMEOUT_MS: u64 = 5000;
const DEFAULT_FLUSH_TIMEOUT_MS: u64 = 10_000;

/// The topic each stream is published to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Topics {
    pub vehicle: String,
    pub gps: String,
    pub traffic: String,
    pub weather: String,
    pub emergency: String,
}

impl Default for Topics {
    fn default() -> Self {
        Self {
            vehicle: "vehicle_data".to_string(),
            gps: "gps_data".to_string(),
            traffic: "traffic_data".to_string(),
            weather: "weather_data".to_string(),
            emergency: "emergency_data".to_string(),
        }
    }
}

impl Topics {
    /// The topic for the given stream.
    pub fn topic(&self, stream: Stream) -> &str {
        match stream {
            Stream::Vehicle => &self.vehicle,
            Stream::Gps => &self.gps,
            Stream::TrafficCamera => &self.traffic,
            Stream::Weather => &self.weather,
            Stream::Emergency => &self.emergency,
        }
    }
}

/// Process configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Kafka `bootstrap.servers`.
    pub bootstrap_servers: String,
    pub topics: Topics,
    pub device_id: String,
    /// Wall-clock pause between ticks.
    pub tick_interval: Duration,
    /// Stop after this many published ticks, if set.
    pub max_ticks: Option<u64>,
    /// How long the producer retries a message before reporting it failed.
    pub message_timeout: Duration,
    /// How long a flush may wait for outstanding deliveries. Never shorter
    /// than `message_timeout`.
    pub flush_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bootstrap_servers: DEFAULT_BOOTSTRAP_SERVERS.to_string(),
            topics: Default::default(),
            device_id: DEFAULT_DEVICE_ID.to_string(),
            tick_interval: Duration::from_millis(DEFAULT_TICK_INTERVAL_MS),
            max_ticks: None,
            message_timeout: Duration::from_millis(DEFAULT_MESSAGE_TIMEOUT_MS),
            flush_timeout: Duration::from_millis(DEFAULT_FLUSH_TIMEOUT_MS),
        }
    }
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, falling back to defaults
    /// for unset variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let string = |name: &str, default: String| lookup(name).unwrap_or(default);

        let message_timeout = parse(&lookup, "MESSAGE_TIMEOUT_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.message_timeout);
        let flush_timeout = parse(&lookup, "FLUSH_TIMEOUT_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.flush_timeout);
        if flush_timeout < message_timeout {
            return Err(ConfigError {
                name: "FLUSH_TIMEOUT_MS",
                value: flush_timeout.as_millis().to_string(),
                reason: format!(
                    "must be at least MESSAGE_TIMEOUT_MS ({} ms)",
                    message_timeout.as_millis()
                ),
            });
        }

        Ok(Self {
            bootstrap_servers: string("KAFKA_BOOTSTRAP_SERVERS", defaults.bootstrap_servers),
            topics: Topics {
                vehicle: string("VEHICLE_TOPIC", defaults.topics.vehicle),
                gps: string("GPS_TOPIC", defaults.topics.gps),
                traffic: string("TRAFFIC_TOPIC", defaults.topics.traffic),
                weather: string("WEATHER_TOPIC", defaults.topics.weather),
                emergency: string("EMERGENCY_TOPIC", defaults.topics.emergency),
            },
            device_id: string("DEVICE_ID", defaults.device_id),
            tick_interval: parse(&lookup, "TICK_INTERVAL_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.tick_interval),
            max_ticks: parse(&lookup, "MAX_TICKS")?,
            message_timeout,
            flush_timeout,
        })
    }
}

/// Parses an optional variable.
fn parse<T, F>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) => {
            let parsed = value.trim().parse::<T>();
            parsed.map(Some).map_err(|e| ConfigError {
                name,
                reason: e.to_string(),
                value,
            })
        }
    }
}
