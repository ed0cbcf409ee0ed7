//! Telemetry event records and their wire encoding.
//!
//! Every record is a flat JSON object with camelCase field names. Ids are
//! encoded as hyphenated UUID strings, locations as `[latitude, longitude]`
//! pairs and timestamps as ISO-8601 local times.

use crate::error::JourneyError;
use crate::geo::GeoPoint;
use chrono::NaiveDateTime;
use rand::distributions::{Distribution, Standard};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// One of the five telemetry streams.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Stream {
    Vehicle,
    Gps,
    TrafficCamera,
    Weather,
    Emergency,
}

impl Stream {
    /// All streams, in publish order.
    pub const ALL: [Stream; 5] = [
        Stream::Vehicle,
        Stream::Gps,
        Stream::TrafficCamera,
        Stream::Weather,
        Stream::Emergency,
    ];
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stream::Vehicle => "vehicle",
            Stream::Gps => "gps",
            Stream::TrafficCamera => "traffic camera",
            Stream::Weather => "weather",
            Stream::Emergency => "emergency incident",
        })
    }
}

/// The position, speed and make of the simulated vehicle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleEvent {
    pub id: Uuid,
    pub device_id: String,
    pub timestamp: NaiveDateTime,
    pub location: GeoPoint,
    /// Speed in km/h.
    pub speed: f64,
    pub direction: String,
    pub make: String,
    pub model: String,
    pub year: u16,
    pub fuel_type: String,
}

/// A GPS fix reported by the vehicle's tracker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpsEvent {
    pub id: Uuid,
    pub device_id: String,
    pub timestamp: NaiveDateTime,
    pub location: GeoPoint,
    /// Speed in km/h.
    pub speed: f64,
    pub direction: String,
    pub vehicle_type: String,
}

/// A roadside camera sighting of the vehicle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficCameraEvent {
    pub id: Uuid,
    pub device_id: String,
    pub camera_id: String,
    pub timestamp: NaiveDateTime,
    pub location: GeoPoint,
    /// Encoded image payload; a fixed placeholder.
    pub snapshot: String,
}

/// Weather conditions at the vehicle's location.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherEvent {
    pub id: Uuid,
    pub device_id: String,
    pub timestamp: NaiveDateTime,
    pub location: GeoPoint,
    /// Temperature in °C.
    pub temperature: f64,
    pub weather_condition: WeatherCondition,
    /// Precipitation in mm.
    pub precipitation: f64,
    /// Wind speed in km/h.
    pub wind_speed: f64,
    /// Relative humidity in percent.
    pub humidity: u8,
    pub air_quality_index: f64,
}

/// An emergency incident reported near the vehicle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyIncidentEvent {
    pub id: Uuid,
    pub device_id: String,
    pub timestamp: NaiveDateTime,
    pub location: GeoPoint,
    pub incident_id: Uuid,
    #[serde(rename = "type")]
    pub incident_type: IncidentType,
    pub status: IncidentStatus,
    pub description: String,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeatherCondition {
    Sunny,
    Cloudy,
    Rainy,
    Snowy,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncidentType {
    Accident,
    Fire,
    Medical,
    Police,
    None,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncidentStatus {
    Active,
    Resolved,
}

impl Distribution<WeatherCondition> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> WeatherCondition {
        match rng.gen_range(0..4) {
            0 => WeatherCondition::Sunny,
            1 => WeatherCondition::Cloudy,
            2 => WeatherCondition::Rainy,
            _ => WeatherCondition::Snowy,
        }
    }
}

impl Distribution<IncidentType> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> IncidentType {
        match rng.gen_range(0..5) {
            0 => IncidentType::Accident,
            1 => IncidentType::Fire,
            2 => IncidentType::Medical,
            3 => IncidentType::Police,
            _ => IncidentType::None,
        }
    }
}

impl Distribution<IncidentStatus> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> IncidentStatus {
        if rng.gen_bool(0.5) {
            IncidentStatus::Active
        } else {
            IncidentStatus::Resolved
        }
    }
}

/// The device, time and place every event of a tick is derived from.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub device_id: String,
    pub timestamp: NaiveDateTime,
    pub location: GeoPoint,
}

/// The five events generated in a single tick.
#[derive(Clone, Debug, PartialEq)]
pub struct TickEvents {
    pub vehicle: VehicleEvent,
    pub gps: GpsEvent,
    pub traffic_camera: TrafficCameraEvent,
    pub weather: WeatherEvent,
    pub emergency: EmergencyIncidentEvent,
}

/// An encoded event ready to be published.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    pub stream: Stream,
    /// The message key; the event's id.
    pub key: String,
    /// UTF-8 JSON.
    pub payload: Vec<u8>,
}

impl TickEvents {
    /// The snapshot the tick was generated from.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            device_id: self.vehicle.device_id.clone(),
            timestamp: self.vehicle.timestamp,
            location: self.vehicle.location,
        }
    }

    /// The id of the event on the given stream.
    pub fn id(&self, stream: Stream) -> Uuid {
        match stream {
            Stream::Vehicle => self.vehicle.id,
            Stream::Gps => self.gps.id,
            Stream::TrafficCamera => self.traffic_camera.id,
            Stream::Weather => self.weather.id,
            Stream::Emergency => self.emergency.id,
        }
    }

    /// Encodes all five events, in publish order.
    pub fn encode(&self) -> Result<Vec<Record>, JourneyError> {
        Stream::ALL
            .iter()
            .map(|&stream| self.encode_one(stream))
            .collect()
    }

    /// Encodes the event on the given stream.
    pub fn encode_one(&self, stream: Stream) -> Result<Record, JourneyError> {
        let key = self.id(stream).to_string();
        let payload = match stream {
            Stream::Vehicle => serde_json::to_vec(&self.vehicle),
            Stream::Gps => serde_json::to_vec(&self.gps),
            Stream::TrafficCamera => serde_json::to_vec(&self.traffic_camera),
            Stream::Weather => serde_json::to_vec(&self.weather),
            Stream::Emergency => serde_json::to_vec(&self.emergency),
        };
        let payload = payload.map_err(|source| JourneyError::Encode {
            stream,
            key: key.clone(),
            source,
        })?;
        Ok(Record {
            stream,
            key,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::Value;

    fn sample_vehicle() -> VehicleEvent {
        VehicleEvent {
            id: Uuid::from_u128(0x67e5_5044_10b1_426f_9247_bb68_0e5f_e0c8),
            device_id: "Vehicle-Kofi-123".to_string(),
            timestamp: NaiveDate::from_ymd_opt(2024, 3, 1)
                .and_then(|d| d.and_hms_opt(8, 0, 42))
                .unwrap(),
            location: GeoPoint::new(0.3157, 32.5825),
            speed: 23.5,
            direction: "North-East".to_string(),
            make: "Tesla".to_string(),
            model: "S".to_string(),
            year: 2024,
            fuel_type: "Electric".to_string(),
        }
    }

    #[test]
    fn vehicle_wire_format() {
        let value = serde_json::to_value(sample_vehicle()).unwrap();
        assert_eq!(value["id"], "67e55044-10b1-426f-9247-bb680e5fe0c8");
        assert_eq!(value["deviceId"], "Vehicle-Kofi-123");
        assert_eq!(value["timestamp"], "2024-03-01T08:00:42");
        assert_eq!(value["location"], serde_json::json!([0.3157, 32.5825]));
        assert_eq!(value["fuelType"], "Electric");
        assert_eq!(value["year"], 2024);
        assert_eq!(value.as_object().unwrap().len(), 10);
    }

    #[test]
    fn incident_type_uses_reserved_name() {
        let vehicle = sample_vehicle();
        let event = EmergencyIncidentEvent {
            id: Uuid::from_u128(1),
            device_id: vehicle.device_id,
            timestamp: vehicle.timestamp,
            location: vehicle.location,
            incident_id: Uuid::from_u128(2),
            incident_type: IncidentType::None,
            status: IncidentStatus::Resolved,
            description: "Description of the incident".to_string(),
        };
        let value: Value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "None");
        assert_eq!(value["status"], "Resolved");
        assert_eq!(value["incidentId"], "00000000-0000-0000-0000-000000000002");
    }
}
