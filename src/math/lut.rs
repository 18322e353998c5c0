use crate::util::Interval;

/// A piecewise linear lookup table.
///
/// The table holds `(x, y)` knots sorted by ascending `x`.
/// Inputs outside the knot range are clamped to the first or last value.
#[derive(Clone, Copy, Debug)]
pub struct PiecewiseLinear<const N: usize> {
    knots: [(f64, f64); N],
}

impl<const N: usize> PiecewiseLinear<N> {
    /// Creates a lookup table from knots sorted by ascending `x`.
    pub const fn new(knots: [(f64, f64); N]) -> Self {
        Self { knots }
    }

    /// Samples the lookup table.
    pub fn sample(&self, x: f64) -> f64 {
        let first = self.knots[0];
        let last = self.knots[N - 1];
        if x <= first.0 {
            return first.1;
        }
        if x >= last.0 {
            return last.1;
        }
        let idx = self.knots.partition_point(|k| k.0 <= x).clamp(1, N - 1);
        let (x0, y0) = self.knots[idx - 1];
        let (x1, y1) = self.knots[idx];
        Interval::new(y0, y1).lerp(Interval::new(x0, x1).inv_lerp(x))
    }
}

#[cfg(test)]
mod test {
    use super::PiecewiseLinear;
    use assert_approx_eq::assert_approx_eq;

    const TABLE: PiecewiseLinear<3> =
        PiecewiseLinear::new([(0.0, 10.0), (1.0, 20.0), (3.0, 0.0)]);

    #[test]
    fn clamps_outside_knots() {
        assert_eq!(TABLE.sample(-5.0), 10.0);
        assert_eq!(TABLE.sample(0.0), 10.0);
        assert_eq!(TABLE.sample(3.0), 0.0);
        assert_eq!(TABLE.sample(42.0), 0.0);
    }

    #[test]
    fn interpolates_between_knots() {
        assert_approx_eq!(TABLE.sample(0.5), 15.0);
        assert_approx_eq!(TABLE.sample(1.0), 20.0);
        assert_approx_eq!(TABLE.sample(2.0), 10.0);
        assert_approx_eq!(TABLE.sample(2.5), 5.0);
    }
}
