use nalgebra as na;
use std::fmt;

/// Planar position of the robot or of a waypoint.
///
/// Heading is tracked separately in [`Heading`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    position: na::Point2<f64>,
}

/// Waypoints are plain poses the robot has to reach.
pub type Waypoint = Pose;

impl Pose {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            position: na::Point2::new(x, y),
        }
    }

    pub fn x(&self) -> f64 {
        self.position.x
    }

    pub fn y(&self) -> f64 {
        self.position.y
    }

    /// Angle in degrees from this pose toward `other`, measured from the x axis.
    ///
    /// Coincident poses yield `0.0` because `atan2(0, 0)` is zero.
    pub fn bearing_to(&self, other: &Pose) -> f64 {
        let delta = other.position - self.position;
        delta.y.atan2(delta.x).to_degrees()
    }

    pub fn distance_to(&self, other: &Pose) -> f64 {
        na::distance(&self.position, &other.position)
    }
}

impl From<(f64, f64)> for Pose {
    fn from((x, y): (f64, f64)) -> Self {
        Pose::new(x, y)
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}, {}]", self.position.x, self.position.y)
    }
}

/// Facing direction of the robot in degrees, world frame.
///
/// Decoded values are kept as-is and lie in `(-360, 360)`.
/// Use [`Heading::normalized`] when a canonical range is needed.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Heading(f64);

impl Heading {
    pub fn from_degrees(degrees: f64) -> Self {
        Self(degrees)
    }

    pub fn degrees(&self) -> f64 {
        self.0
    }

    /// Heading wrapped into `[-180, 180)`.
    pub fn normalized(&self) -> Heading {
        Heading(normalize_degrees(self.0))
    }
}

impl fmt::Display for Heading {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:.2}°", self.0)
    }
}

/// Wraps any angle in degrees into `[-180, 180)`.
pub fn normalize_degrees(angle: f64) -> f64 {
    (angle + 180.0).rem_euclid(360.0) - 180.0
}
