//! Miscellaneous utility structs and functions.

use std::fmt::Debug;

use rand::distributions::uniform::SampleUniform;
use rand::Rng;

/// A closed interval on the real number line.
#[derive(Copy, Clone, Default, PartialEq, Eq)]
pub struct Interval<T> {
    pub min: T,
    pub max: T,
}

impl<T> Interval<T> {
    /// Creates a new interval.
    pub const fn new(min: T, max: T) -> Self {
        Self { min, max }
    }
}

impl<T: std::cmp::PartialOrd> Interval<T> {
    /// Returns true if this interval contains the value.
    pub fn contains(&self, value: T) -> bool {
        value >= self.min && value <= self.max
    }
}

impl<T: std::ops::Sub<T, Output = T> + Copy> Interval<T> {
    /// Gets the magnitude of the interval.
    pub fn length(&self) -> T {
        self.max - self.min
    }
}

impl<T: SampleUniform + PartialOrd + Copy> Interval<T> {
    /// Draws a uniformly distributed value from the interval, bounds included.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> T {
        rng.gen_range(self.min..=self.max)
    }
}

impl Interval<f64> {
    /// Creates an interval with the given centre and radius.
    pub fn disc(centre: f64, radius: f64) -> Self {
        Self {
            min: centre - radius,
            max: centre + radius,
        }
    }
}

impl<T: Debug> Debug for Interval<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Interval({:?}, {:?})", &self.min, &self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn samples_stay_within_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let range = Interval::new(-5.0, 25.0);
        for _ in 0..1000 {
            assert!(range.contains(range.sample(&mut rng)));
        }
        let seconds = Interval::new(30_i64, 60);
        for _ in 0..1000 {
            assert!(seconds.contains(seconds.sample(&mut rng)));
        }
    }

    #[test]
    fn degenerate_interval() {
        let mut rng = StepRng::new(0, 0);
        let point = Interval::disc(3.0, 0.0);
        assert_eq!(point.length(), 0.0);
        assert_eq!(point.sample(&mut rng), 3.0);
    }

    #[test]
    fn zero_stream_samples_lower_bound() {
        let mut rng = StepRng::new(0, 0);
        assert_eq!(Interval::new(10.0, 40.0).sample(&mut rng), 10.0);
        assert_eq!(Interval::new(30_i64, 60).sample(&mut rng), 30);
    }
}
