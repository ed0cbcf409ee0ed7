//! Generators for each telemetry stream.
//!
//! Only [vehicle] touches the [MovementModel]; every other stream is derived
//! from the timestamp and location the vehicle event reports.

use crate::event::{
    EmergencyIncidentEvent, GpsEvent, TickEvents, TrafficCameraEvent, VehicleEvent, WeatherEvent,
};
use crate::geo::GeoPoint;
use crate::movement::MovementModel;
use crate::util::Interval;
use chrono::NaiveDateTime;
use rand::Rng;
use uuid::Uuid;

/// Heading reported by the vehicle and its tracker.
const DIRECTION: &str = "North-East";

/// Vehicle speed in km/h.
const VEHICLE_SPEED: Interval<f64> = Interval::new(10.0, 40.0);

/// Tracker speed in km/h.
const GPS_SPEED: Interval<f64> = Interval::new(0.0, 40.0);

const TEMPERATURE: Interval<f64> = Interval::new(-5.0, 25.0); // °C
const PRECIPITATION: Interval<f64> = Interval::new(0.0, 25.0); // mm
const WIND_SPEED: Interval<f64> = Interval::new(0.0, 100.0); // km/h
const HUMIDITY: Interval<u8> = Interval::new(0, 100); // %
const AIR_QUALITY_INDEX: Interval<f64> = Interval::new(0.0, 500.0);

const SNAPSHOT_PLACEHOLDER: &str = "Base64EncodedString";
const INCIDENT_DESCRIPTION: &str = "Description of the incident";

/// The vehicle type reported by [gps].
pub const DEFAULT_VEHICLE_TYPE: &str = "private";

/// Static description of the simulated vehicle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VehicleDescriptor {
    pub make: String,
    pub model: String,
    pub year: u16,
    pub fuel_type: String,
}

impl Default for VehicleDescriptor {
    fn default() -> Self {
        Self {
            make: "Tesla".to_string(),
            model: "S".to_string(),
            year: 2024,
            fuel_type: "Electric".to_string(),
        }
    }
}

/// The identity of the simulated vehicle and the camera watching it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Device {
    pub device_id: String,
    pub camera_id: String,
    pub vehicle: VehicleDescriptor,
}

impl Default for Device {
    fn default() -> Self {
        Self {
            device_id: "Vehicle-Kofi-123".to_string(),
            camera_id: "Nikon-camera123".to_string(),
            vehicle: Default::default(),
        }
    }
}

impl Device {
    /// A device with the given id and default camera and vehicle.
    pub fn with_id(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            ..Default::default()
        }
    }
}

/// Draws a random (version 4) UUID from `rng`.
pub fn new_id<R: Rng + ?Sized>(rng: &mut R) -> Uuid {
    uuid::Builder::from_random_bytes(rng.gen()).into_uuid()
}

/// Moves the vehicle one step and reports where it is.
///
/// The position is advanced before the clock.
pub fn vehicle<R: Rng + ?Sized>(
    model: &mut MovementModel,
    device: &Device,
    rng: &mut R,
) -> VehicleEvent {
    let location = model.advance_position(rng);
    let timestamp = model.advance_clock(rng);
    VehicleEvent {
        id: new_id(rng),
        device_id: device.device_id.clone(),
        timestamp,
        location,
        speed: VEHICLE_SPEED.sample(rng),
        direction: DIRECTION.to_string(),
        make: device.vehicle.make.clone(),
        model: device.vehicle.model.clone(),
        year: device.vehicle.year,
        fuel_type: device.vehicle.fuel_type.clone(),
    }
}

/// A GPS fix for a private vehicle.
pub fn gps<R: Rng + ?Sized>(
    device_id: &str,
    timestamp: NaiveDateTime,
    location: GeoPoint,
    rng: &mut R,
) -> GpsEvent {
    gps_with_type(device_id, timestamp, location, DEFAULT_VEHICLE_TYPE, rng)
}

/// A GPS fix for the given vehicle type.
pub fn gps_with_type<R: Rng + ?Sized>(
    device_id: &str,
    timestamp: NaiveDateTime,
    location: GeoPoint,
    vehicle_type: &str,
    rng: &mut R,
) -> GpsEvent {
    GpsEvent {
        id: new_id(rng),
        device_id: device_id.to_string(),
        timestamp,
        location,
        speed: GPS_SPEED.sample(rng),
        direction: DIRECTION.to_string(),
        vehicle_type: vehicle_type.to_string(),
    }
}

pub fn traffic_camera<R: Rng + ?Sized>(
    device_id: &str,
    timestamp: NaiveDateTime,
    location: GeoPoint,
    camera_id: &str,
    rng: &mut R,
) -> TrafficCameraEvent {
    TrafficCameraEvent {
        id: new_id(rng),
        device_id: device_id.to_string(),
        camera_id: camera_id.to_string(),
        timestamp,
        location,
        snapshot: SNAPSHOT_PLACEHOLDER.to_string(),
    }
}

pub fn weather<R: Rng + ?Sized>(
    device_id: &str,
    timestamp: NaiveDateTime,
    location: GeoPoint,
    rng: &mut R,
) -> WeatherEvent {
    WeatherEvent {
        id: new_id(rng),
        device_id: device_id.to_string(),
        timestamp,
        location,
        temperature: TEMPERATURE.sample(rng),
        weather_condition: rng.gen(),
        precipitation: PRECIPITATION.sample(rng),
        wind_speed: WIND_SPEED.sample(rng),
        humidity: HUMIDITY.sample(rng),
        air_quality_index: AIR_QUALITY_INDEX.sample(rng),
    }
}

/// An incident report with its own id, distinct from the event id.
pub fn emergency_incident<R: Rng + ?Sized>(
    device_id: &str,
    timestamp: NaiveDateTime,
    location: GeoPoint,
    rng: &mut R,
) -> EmergencyIncidentEvent {
    EmergencyIncidentEvent {
        id: new_id(rng),
        device_id: device_id.to_string(),
        timestamp,
        location,
        incident_id: new_id(rng),
        incident_type: rng.gen(),
        status: rng.gen(),
        description: INCIDENT_DESCRIPTION.to_string(),
    }
}

/// Generates all five events of one tick, advancing the model once.
pub fn tick<R: Rng + ?Sized>(
    model: &mut MovementModel,
    device: &Device,
    rng: &mut R,
) -> TickEvents {
    let vehicle = vehicle(model, device, rng);
    let device_id = &vehicle.device_id;
    let (timestamp, location) = (vehicle.timestamp, vehicle.location);
    let gps = gps(device_id, timestamp, location, rng);
    let traffic_camera = traffic_camera(device_id, timestamp, location, &device.camera_id, rng);
    let weather = weather(device_id, timestamp, location, rng);
    let emergency = emergency_incident(device_id, timestamp, location, rng);
    TickEvents {
        vehicle,
        gps,
        traffic_camera,
        weather,
        emergency,
    }
}
