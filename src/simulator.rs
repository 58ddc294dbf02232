//! Kinematic stand-in for a differential drive robot.
//!
//! Samples are reported in the same layout a real localiser uses:
//! position `[x, 0, y]` and orientation `[cos(h/2), 0, 0, sin(h/2)]`.
//! `angular_speed` is read as degrees per second and every received command
//! advances the simulation by one time step.

use crate::differential_controller::DriveCommand;
use crate::driver::RobotDriver;
use crate::error::TransportError;
use crate::localisation::{LocalizationSample, Localiser};
use crate::navigation::{normalize_degrees, Heading, Pose};
use std::{cell::RefCell, rc::Rc, time::Duration};
use tracing::*;

#[derive(Debug)]
struct SimState {
    x: f64,
    y: f64,
    heading_degrees: f64,
    time_step: f64,
    commands_received: usize,
}

impl SimState {
    fn step(&mut self, command: &DriveCommand) {
        let heading = self.heading_degrees.to_radians();
        self.x += command.linear_speed * heading.cos() * self.time_step;
        self.y += command.linear_speed * heading.sin() * self.time_step;
        self.heading_degrees =
            normalize_degrees(self.heading_degrees + command.angular_speed * self.time_step);
        self.commands_received += 1;
    }

    fn sample(&self) -> LocalizationSample {
        let half = self.heading_degrees.to_radians() / 2.0;
        LocalizationSample {
            position: vec![self.x, 0.0, self.y],
            orientation: vec![half.cos(), 0.0, 0.0, half.sin()],
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimulatedRobot {
    state: Rc<RefCell<SimState>>,
}

impl SimulatedRobot {
    pub fn new(start: Pose, heading: Heading, time_step: Duration) -> Self {
        info!("Starting simulated robot at {} facing {}", start, heading);
        Self {
            state: Rc::new(RefCell::new(SimState {
                x: start.x(),
                y: start.y(),
                heading_degrees: heading.normalized().degrees(),
                time_step: time_step.as_secs_f64(),
                commands_received: 0,
            })),
        }
    }

    pub fn localiser(&self) -> SimulatedLocaliser {
        SimulatedLocaliser {
            state: Rc::clone(&self.state),
        }
    }

    pub fn driver(&self) -> SimulatedDriver {
        SimulatedDriver {
            state: Rc::clone(&self.state),
        }
    }

    pub fn pose(&self) -> Pose {
        let state = self.state.borrow();
        Pose::new(state.x, state.y)
    }

    pub fn heading(&self) -> Heading {
        Heading::from_degrees(self.state.borrow().heading_degrees)
    }

    pub fn commands_received(&self) -> usize {
        self.state.borrow().commands_received
    }
}

pub struct SimulatedLocaliser {
    state: Rc<RefCell<SimState>>,
}

impl Localiser for SimulatedLocaliser {
    fn fetch(&mut self) -> Result<LocalizationSample, TransportError> {
        Ok(self.state.borrow().sample())
    }
}

pub struct SimulatedDriver {
    state: Rc<RefCell<SimState>>,
}

impl RobotDriver for SimulatedDriver {
    fn send(&mut self, command: &DriveCommand) -> Result<(), TransportError> {
        self.state.borrow_mut().step(command);
        Ok(())
    }
}
