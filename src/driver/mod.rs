pub mod udp_driver;

use crate::differential_controller::DriveCommand;
use crate::error::TransportError;
use crate::localisation::{udp_localiser::UdpLocaliser, Localiser};
use crate::navigation::{Heading, Pose};
use crate::simulator::SimulatedRobot;
use anyhow::Result;
use serde::Deserialize;
use std::{
    net::{SocketAddr, UdpSocket},
    sync::{atomic::AtomicBool, Arc},
    time::Duration,
};
use tracing::*;
use udp_driver::UdpDriver;

pub trait RobotDriver {
    fn send(&mut self, command: &DriveCommand) -> Result<(), TransportError>;
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransportConfig {
    Simulator(SimulatorConfig),
    Udp(UdpConfig),
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct SimulatorConfig {
    #[serde(default = "default_time_step_ms")]
    pub time_step_ms: u64,
    #[serde(default)]
    pub start_x: f64,
    #[serde(default)]
    pub start_y: f64,
    #[serde(default)]
    pub start_heading: f64,
}

fn default_time_step_ms() -> u64 {
    100
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct UdpConfig {
    pub bind_address: SocketAddr,
    pub robot_address: SocketAddr,
    /// How often a blocked fetch wakes up to check for a stop request.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

fn default_read_timeout_ms() -> u64 {
    500
}

/// `running` lets a blocked localization fetch give up once a stop is requested.
pub fn transport_from_config(
    config: &TransportConfig,
    running: Arc<AtomicBool>,
) -> Result<(Box<dyn Localiser>, Box<dyn RobotDriver>)> {
    match config {
        TransportConfig::Simulator(sim) => {
            let robot = SimulatedRobot::new(
                Pose::new(sim.start_x, sim.start_y),
                Heading::from_degrees(sim.start_heading),
                Duration::from_millis(sim.time_step_ms),
            );
            Ok((Box::new(robot.localiser()), Box::new(robot.driver())))
        }
        TransportConfig::Udp(udp) => {
            info!(
                "Listening for localization on {} and driving {}",
                udp.bind_address, udp.robot_address
            );
            let socket = UdpSocket::bind(udp.bind_address)?;
            socket.set_read_timeout(Some(Duration::from_millis(udp.read_timeout_ms)))?;
            let command_socket = socket.try_clone()?;
            Ok((
                Box::new(UdpLocaliser::new(socket).with_stop_signal(running)),
                Box::new(UdpDriver::new(command_socket, udp.robot_address)),
            ))
        }
    }
}
