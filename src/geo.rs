//! Geographic coordinates.

use cgmath::Vector2;
use serde::{Deserialize, Serialize};

/// A displacement in degrees, with `x` along latitude and `y` along longitude.
pub type GeoVector = Vector2<f64>;

/// Central Kampala, the default journey origin.
pub const KAMPALA: GeoPoint = GeoPoint::new(0.3152, 32.5816);

/// Mukono town, the default journey destination.
pub const MUKONO: GeoPoint = GeoPoint::new(0.3689, 32.7135);

/// A point on the globe in decimal degrees.
///
/// Encoded on the wire as the ordered pair `[latitude, longitude]`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Creates a new point.
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// The displacement from `self` to `other`.
    pub fn vector_to(&self, other: GeoPoint) -> GeoVector {
        GeoVector::new(
            other.latitude - self.latitude,
            other.longitude - self.longitude,
        )
    }
}

impl std::ops::Add<GeoVector> for GeoPoint {
    type Output = GeoPoint;

    fn add(self, rhs: GeoVector) -> Self::Output {
        GeoPoint::new(self.latitude + rhs.x, self.longitude + rhs.y)
    }
}

impl std::ops::AddAssign<GeoVector> for GeoPoint {
    fn add_assign(&mut self, rhs: GeoVector) {
        self.latitude += rhs.x;
        self.longitude += rhs.y;
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

impl From<(f64, f64)> for GeoPoint {
    fn from((latitude, longitude): (f64, f64)) -> Self {
        Self::new(latitude, longitude)
    }
}

impl From<GeoPoint> for (f64, f64) {
    fn from(point: GeoPoint) -> Self {
        (point.latitude, point.longitude)
    }
}
