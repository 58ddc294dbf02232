pub mod udp_localiser;

use crate::error::{NavigationError, TransportError};
use crate::navigation::{Heading, Pose};
use serde::{Deserialize, Serialize};

/// One position and orientation reading as reported by the robot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalizationSample {
    pub position: Vec<f64>,
    pub orientation: Vec<f64>,
}

pub trait Localiser {
    /// Blocks until the next sample is available.
    fn fetch(&mut self) -> Result<LocalizationSample, TransportError>;
}

/// Which components of the position vector hold the planar coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct AxisMapping {
    pub x: usize,
    pub y: usize,
}

impl AxisMapping {
    /// Position vectors are `[x, vertical, y]`.
    pub const Y_UP: AxisMapping = AxisMapping { x: 0, y: 2 };

    fn required_len(&self) -> usize {
        self.x.max(self.y) + 1
    }
}

impl Default for AxisMapping {
    fn default() -> Self {
        AxisMapping::Y_UP
    }
}

const ORIENTATION_LEN: usize = 4;

#[derive(Debug, Clone, Copy, Default)]
pub struct PoseDecoder {
    axes: AxisMapping,
}

impl PoseDecoder {
    pub fn new(axes: AxisMapping) -> Self {
        Self { axes }
    }

    pub fn decode(&self, sample: &LocalizationSample) -> Result<(Pose, Heading), NavigationError> {
        Ok((self.position(sample)?, heading(sample)?))
    }

    pub fn position(&self, sample: &LocalizationSample) -> Result<Pose, NavigationError> {
        if sample.position.len() < self.axes.required_len() {
            return Err(NavigationError::MalformedSample(format!(
                "position has {} components, expected at least {}",
                sample.position.len(),
                self.axes.required_len()
            )));
        }
        Ok(Pose::new(
            sample.position[self.axes.x],
            sample.position[self.axes.y],
        ))
    }
}

/// Heading in degrees from an orientation `[e0, e1, e2, e3]`.
///
/// Exact only for rotations about the vertical axis. The result is not wrapped.
pub fn heading(sample: &LocalizationSample) -> Result<Heading, NavigationError> {
    let e = &sample.orientation;
    if e.len() < ORIENTATION_LEN {
        return Err(NavigationError::MalformedSample(format!(
            "orientation has {} components, expected at least {}",
            e.len(),
            ORIENTATION_LEN
        )));
    }
    let angle = 2.0 * e[3].atan2(e[0]);
    Ok(Heading::from_degrees(angle * 180.0 / std::f64::consts::PI))
}
