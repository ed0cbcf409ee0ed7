use crate::geo::{GeoPoint, GeoVector, KAMPALA, MUKONO};
use crate::util::Interval;
use chrono::{Duration, NaiveDateTime};
use rand::Rng;

/// The number of steps the route is divided into.
const DEFAULT_STEPS: u32 = 100;

/// The maximum random deviation added to each axis per step, in degrees.
const DEFAULT_JITTER: f64 = 0.0005;

/// The range of simulated time that elapses per step, in s.
const DEFAULT_CLOCK_STEP: Interval<i64> = Interval::new(30, 60);

/// The attributes of a simulated route.
#[derive(Clone, Copy, Debug)]
pub struct RouteAttributes {
    /// Where the vehicle starts.
    pub origin: GeoPoint,
    /// Where the vehicle is heading.
    pub destination: GeoPoint,
    /// The number of equal steps between origin and destination. Zero is
    /// treated as one, covering the whole route in a single step.
    pub steps: u32,
    /// The maximum random deviation added to each axis per step, in degrees.
    pub jitter: f64,
    /// The range of simulated time that elapses per step, in s.
    pub clock_step: Interval<i64>,
}

impl Default for RouteAttributes {
    fn default() -> Self {
        Self {
            origin: KAMPALA,
            destination: MUKONO,
            steps: DEFAULT_STEPS,
            jitter: DEFAULT_JITTER,
            clock_step: DEFAULT_CLOCK_STEP,
        }
    }
}

/// Simulated position and clock of a single vehicle.
///
/// The vehicle moves along a straight line from the origin toward the
/// destination in equal steps, with uniform noise added to every step.
/// Position is never clamped, so the vehicle may overshoot the destination.
#[derive(Clone, Debug)]
pub struct MovementModel {
    /// The route start.
    origin: GeoPoint,
    /// The route end.
    destination: GeoPoint,
    /// The fixed displacement applied on every step.
    step: GeoVector,
    /// The per-axis noise range, in degrees.
    jitter: Interval<f64>,
    /// The range of seconds added to the clock per step.
    clock_step: Interval<i64>,
    /// The current position.
    position: GeoPoint,
    /// The current simulated time.
    clock: NaiveDateTime,
}

impl MovementModel {
    /// Creates a model positioned at the route origin with its clock set to `start`.
    pub fn new(attributes: &RouteAttributes, start: NaiveDateTime) -> Self {
        let steps = f64::from(attributes.steps.max(1));
        Self {
            origin: attributes.origin,
            destination: attributes.destination,
            step: attributes.origin.vector_to(attributes.destination) / steps,
            jitter: Interval::disc(0.0, attributes.jitter.abs()),
            clock_step: attributes.clock_step,
            position: attributes.origin,
            clock: start,
        }
    }

    /// Creates a model whose clock starts at the current local time.
    pub fn starting_now(attributes: &RouteAttributes) -> Self {
        Self::new(attributes, chrono::Local::now().naive_local())
    }

    /// Advances the simulated clock by a random whole number of seconds.
    pub fn advance_clock<R: Rng + ?Sized>(&mut self, rng: &mut R) -> NaiveDateTime {
        let seconds = self.clock_step.sample(rng);
        self.clock += Duration::seconds(seconds);
        self.clock
    }

    /// Moves the vehicle one step toward the destination, plus noise.
    pub fn advance_position<R: Rng + ?Sized>(&mut self, rng: &mut R) -> GeoPoint {
        self.position += self.step;
        let noise = GeoVector::new(self.jitter.sample(rng), self.jitter.sample(rng));
        self.position += noise;
        self.position
    }

    /// Whether a point counts as having reached the destination.
    ///
    /// True once latitude is at or beyond the destination's while longitude
    /// has not passed it.
    pub fn has_arrived(&self, point: GeoPoint) -> bool {
        point.latitude >= self.destination.latitude
            && point.longitude <= self.destination.longitude
    }

    /// The current position.
    pub fn position(&self) -> GeoPoint {
        self.position
    }

    /// The current simulated time.
    pub fn clock(&self) -> NaiveDateTime {
        self.clock
    }

    /// The noiseless displacement applied on every step.
    pub fn step(&self) -> GeoVector {
        self.step
    }

    /// The route start.
    pub fn origin(&self) -> GeoPoint {
        self.origin
    }

    /// The route end.
    pub fn destination(&self) -> GeoPoint {
        self.destination
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use chrono::NaiveDate;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .and_then(|d| d.and_hms_opt(8, 0, 0))
            .unwrap()
    }

    #[test]
    fn noiseless_steps_are_linear() {
        let attributes = RouteAttributes {
            jitter: 0.0,
            ..Default::default()
        };
        let mut model = MovementModel::new(&attributes, start());
        let mut rng = StdRng::seed_from_u64(1);
        for n in 1..=40 {
            let pos = model.advance_position(&mut rng);
            let expected = attributes.origin + model.step() * n as f64;
            assert_approx_eq!(pos.latitude, expected.latitude, 1e-9);
            assert_approx_eq!(pos.longitude, expected.longitude, 1e-9);
        }
    }

    #[test]
    fn noise_is_bounded() {
        let attributes = RouteAttributes::default();
        let mut model = MovementModel::new(&attributes, start());
        let mut rng = StdRng::seed_from_u64(2);
        let mut prev = model.position();
        for _ in 0..200 {
            let pos = model.advance_position(&mut rng);
            let delta = prev.vector_to(pos) - model.step();
            assert!(delta.x.abs() <= attributes.jitter + 1e-12);
            assert!(delta.y.abs() <= attributes.jitter + 1e-12);
            prev = pos;
        }
    }

    #[test]
    fn clock_advances_within_range() {
        let mut model = MovementModel::new(&RouteAttributes::default(), start());
        let mut rng = StdRng::seed_from_u64(3);
        let mut prev = model.clock();
        for _ in 0..500 {
            let next = model.advance_clock(&mut rng);
            let secs = (next - prev).num_seconds();
            assert!((30..=60).contains(&secs), "stepped {secs} s");
            prev = next;
        }
    }

    #[test]
    fn zero_stream_takes_lower_bounds() {
        let mut model = MovementModel::new(&RouteAttributes::default(), start());
        let mut rng = StepRng::new(0, 0);
        let pos = model.advance_position(&mut rng);
        assert_approx_eq!(pos.latitude, 0.3152 + 0.000537 - 0.0005, 1e-12);
        assert_approx_eq!(pos.longitude, 32.5816 + 0.001319 - 0.0005, 1e-12);
        assert_eq!(model.advance_clock(&mut rng), start() + Duration::seconds(30));
    }

    #[test]
    fn zero_steps_cover_the_route_at_once() {
        let attributes = RouteAttributes {
            steps: 0,
            jitter: 0.0,
            ..Default::default()
        };
        let mut model = MovementModel::new(&attributes, start());
        assert_eq!(model.step(), KAMPALA.vector_to(MUKONO));
        let pos = model.advance_position(&mut StdRng::seed_from_u64(4));
        assert_approx_eq!(pos.latitude, MUKONO.latitude, 1e-12);
        assert_approx_eq!(pos.longitude, MUKONO.longitude, 1e-12);
    }

    #[test]
    fn arrival_region() {
        let model = MovementModel::new(&RouteAttributes::default(), start());
        assert!(!model.has_arrived(KAMPALA));
        assert!(model.has_arrived(MUKONO));
        assert!(model.has_arrived(GeoPoint::new(0.37, 32.70)));
        assert!(!model.has_arrived(GeoPoint::new(0.37, 32.72)));
        assert!(!model.has_arrived(GeoPoint::new(0.36, 32.70)));
    }
}
