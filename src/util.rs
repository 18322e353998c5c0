//! Miscellaneous utility structs and functions.

use std::fmt::Debug;

use cgmath::num_traits::Float;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An interval on the real number line.
#[derive(Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
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

impl<T: Float> Interval<T> {
    /// Clamps a value into the interval.
    pub fn clamp(&self, value: T) -> T {
        value.max(self.min).min(self.max)
    }

    /// Returns the centre/mid-point of the interval.
    pub fn midpoint(&self) -> T {
        T::from(0.5).unwrap() * (self.min + self.max)
    }

    pub fn lerp(&self, t: T) -> T {
        self.min + t * (self.max - self.min)
    }

    /// The inverse of [Interval::lerp].
    /// Returns zero for an empty interval rather than dividing by zero.
    pub fn inv_lerp(&self, value: T) -> T {
        let len = self.max - self.min;
        if len == T::zero() {
            T::zero()
        } else {
            (value - self.min) / len
        }
    }
}

impl<T: Debug> Debug for Interval<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Interval({:?}, {:?})", &self.min, &self.max)
    }
}

#[cfg(test)]
mod test {
    use super::Interval;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn clamp_and_lerp() {
        let range: Interval<f64> = Interval::new(-2.0, 6.0);
        assert_eq!(range.clamp(-10.0), -2.0);
        assert_eq!(range.clamp(10.0), 6.0);
        assert_eq!(range.clamp(1.5), 1.5);
        assert_approx_eq!(range.lerp(0.25), 0.0);
        assert_approx_eq!(range.inv_lerp(0.0), 0.25);
        assert_approx_eq!(range.midpoint(), 2.0);
    }

    #[test]
    fn empty_interval_does_not_divide_by_zero() {
        let range = Interval::new(3.0, 3.0);
        assert_eq!(range.inv_lerp(3.0), 0.0);
        assert_eq!(range.length(), 0.0);
    }
}
