//! Time-indexed predictions of a moving obstacle.

use crate::math::{Point3d, Vector3d};
use crate::vehicle::{BALL_RADIUS, GRAVITY};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The default spacing of prediction frames, in s.
pub const DEFAULT_TICK_INTERVAL: f64 = 1.0 / 120.0;

/// The predicted state of the obstacle at one instant.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PredictionFrame {
    /// Absolute game time in s.
    pub time: f64,
    pub position: Point3d,
    pub velocity: Vector3d,
}

/// A finite, time-ordered prediction of a spherical obstacle's trajectory.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BallPrediction {
    frames: Vec<PredictionFrame>,
    tick_interval: f64,
    radius: f64,
}

impl BallPrediction {
    /// A prediction with no frames. Every lookup returns `None`.
    pub fn empty() -> Self {
        Self {
            frames: vec![],
            tick_interval: DEFAULT_TICK_INTERVAL,
            radius: BALL_RADIUS,
        }
    }

    /// Creates a prediction from frames sorted by ascending time.
    pub fn from_frames(frames: Vec<PredictionFrame>, tick_interval: f64) -> Self {
        assert!(
            frames.windows(2).all(|w| w[0].time <= w[1].time),
            "prediction frames must be time-ordered"
        );
        Self {
            frames,
            tick_interval,
            radius: BALL_RADIUS,
        }
    }

    /// Predicts `duration` seconds of straight-line motion from `start_time`.
    ///
    /// # Arguments
    /// * `position` - Where the obstacle is at `start_time`.
    /// * `velocity` - The obstacle's constant velocity.
    /// * `with_gravity` - Whether the obstacle falls, bouncing without loss off the ground.
    pub fn extrapolate_linear(
        position: Point3d,
        velocity: Vector3d,
        start_time: f64,
        duration: f64,
        with_gravity: bool,
    ) -> Self {
        let dt = DEFAULT_TICK_INTERVAL;
        let count = (duration / dt - 1e-9).ceil().max(0.0) as usize + 1;
        let mut frames = Vec::with_capacity(count);
        let (mut pos, mut vel) = (position, velocity);
        for i in 0..count {
            frames.push(PredictionFrame {
                time: start_time + i as f64 * dt,
                position: pos,
                velocity: vel,
            });
            if with_gravity {
                vel += GRAVITY * dt;
            }
            pos += vel * dt;
            if with_gravity && pos.z < BALL_RADIUS {
                pos.z = 2.0 * BALL_RADIUS - pos.z;
                vel.z = vel.z.abs();
            }
        }
        Self::from_frames(frames, dt)
    }

    /// Sets the obstacle's collision radius.
    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    /// The obstacle's collision radius.
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// The nominal spacing of frames, in s.
    pub fn tick_interval(&self) -> f64 {
        self.tick_interval
    }

    pub fn frames(&self) -> &[PredictionFrame] {
        &self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The absolute time of the first frame.
    pub fn start_time(&self) -> Option<f64> {
        self.frames.first().map(|f| f.time)
    }

    /// The time of the last frame, relative to the first.
    pub fn horizon(&self) -> Option<f64> {
        Some(self.frames.last()?.time - self.frames.first()?.time)
    }

    /// The first frame at or after the given absolute time,
    /// or `None` if the time is past the end of the prediction.
    pub fn frame_at_absolute_time(&self, time: f64) -> Option<&PredictionFrame> {
        let idx = self.frames.partition_point(|f| f.time < time);
        self.frames.get(idx)
    }

    /// The first frame at or after `time` seconds after the start of the prediction.
    pub fn frame_at_relative_time(&self, time: f64) -> Option<&PredictionFrame> {
        let start = self.start_time()?;
        if time <= 0.0 {
            return self.frames.first();
        }
        self.frame_at_absolute_time(start + time)
    }
}

impl Default for BallPrediction {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn empty_prediction_has_no_frames() {
        let pred = BallPrediction::empty();
        assert!(pred.frame_at_relative_time(0.0).is_none());
        assert!(pred.frame_at_absolute_time(5.0).is_none());
        assert!(pred.horizon().is_none());
    }

    #[test]
    fn lookup_by_time() {
        let pred = BallPrediction::extrapolate_linear(
            Point3d::new(0.0, 0.0, BALL_RADIUS),
            Vector3d::new(600.0, 0.0, 0.0),
            10.0,
            2.0,
            false,
        );
        assert_approx_eq!(pred.horizon().unwrap(), 2.0, 1e-9);

        let dt = pred.tick_interval();
        let frame = pred.frame_at_relative_time(1.0).unwrap();
        assert!(frame.time >= 11.0 && frame.time < 11.0 + dt + 1e-9);
        assert_approx_eq!(frame.position.x, 600.0 * (frame.time - 10.0), 1e-6);

        let frame = pred.frame_at_absolute_time(10.5).unwrap();
        assert!(frame.time >= 10.5);
        assert_approx_eq!(frame.position.x, 300.0, 600.0 * dt + 1e-6);

        assert!(pred.frame_at_relative_time(2.5).is_none());
        assert_eq!(pred.frame_at_absolute_time(0.0), pred.frames().first());
    }

    #[test]
    fn falling_ball_stays_above_ground() {
        let pred = BallPrediction::extrapolate_linear(
            Point3d::new(0.0, 0.0, 500.0),
            Vector3d::new(0.0, 0.0, 0.0),
            0.0,
            3.0,
            true,
        );
        assert!(pred.frames().iter().all(|f| f.position.z >= BALL_RADIUS - 1e-9));
    }
}
