use crate::navigation::{normalize_degrees, Heading, Pose};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriveCommand {
    pub linear_speed: f64,
    pub angular_speed: f64,
}

impl DriveCommand {
    pub fn new(linear_speed: f64, angular_speed: f64) -> DriveCommand {
        DriveCommand {
            linear_speed,
            angular_speed,
        }
    }
}

/// Turns the current state and the next waypoint into a drive command.
pub trait DrivePolicy {
    fn calculate_drive(&self, current: &Pose, heading: Heading, target: &Pose) -> DriveCommand;
}

pub const DEFAULT_LINEAR_SPEED: f64 = 1.0;

/// Commands the absolute bearing to the target as the angular speed.
///
/// The current heading is ignored. How the robot turns depends entirely on
/// how the actuator reads `angular_speed`. Use [`HeadingErrorPolicy`] to steer
/// on the heading error instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BearingFollowPolicy {
    linear_speed: f64,
}

impl BearingFollowPolicy {
    pub fn new(linear_speed: f64) -> Self {
        Self { linear_speed }
    }
}

impl Default for BearingFollowPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_LINEAR_SPEED)
    }
}

impl DrivePolicy for BearingFollowPolicy {
    fn calculate_drive(&self, current: &Pose, _heading: Heading, target: &Pose) -> DriveCommand {
        DriveCommand::new(self.linear_speed, current.bearing_to(target))
    }
}

/// Steers proportionally to the wrapped difference between bearing and heading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadingErrorPolicy {
    linear_speed: f64,
    gain: f64,
    max_angular_speed: f64,
}

impl HeadingErrorPolicy {
    pub fn new(linear_speed: f64, gain: f64, max_angular_speed: f64) -> Self {
        Self {
            linear_speed,
            gain,
            max_angular_speed: max_angular_speed.abs(),
        }
    }
}

impl DrivePolicy for HeadingErrorPolicy {
    fn calculate_drive(&self, current: &Pose, heading: Heading, target: &Pose) -> DriveCommand {
        let error = normalize_degrees(current.bearing_to(target) - heading.degrees());
        let angular_speed =
            (error * self.gain).clamp(-self.max_angular_speed, self.max_angular_speed);
        DriveCommand::new(self.linear_speed, angular_speed)
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PolicyConfig {
    BearingFollow {
        #[serde(default = "default_linear_speed")]
        linear_speed: f64,
    },
    HeadingError {
        #[serde(default = "default_linear_speed")]
        linear_speed: f64,
        gain: f64,
        max_angular_speed: f64,
    },
}

fn default_linear_speed() -> f64 {
    DEFAULT_LINEAR_SPEED
}

impl Default for PolicyConfig {
    fn default() -> Self {
        PolicyConfig::BearingFollow {
            linear_speed: DEFAULT_LINEAR_SPEED,
        }
    }
}

impl PolicyConfig {
    pub fn build(&self) -> Box<dyn DrivePolicy> {
        match *self {
            PolicyConfig::BearingFollow { linear_speed } => {
                Box::new(BearingFollowPolicy::new(linear_speed))
            }
            PolicyConfig::HeadingError {
                linear_speed,
                gain,
                max_angular_speed,
            } => Box::new(HeadingErrorPolicy::new(
                linear_speed,
                gain,
                max_angular_speed,
            )),
        }
    }
}
