use super::RobotDriver;
use crate::differential_controller::DriveCommand;
use crate::error::TransportError;
use std::net::{SocketAddr, UdpSocket};

/// Sends each command as a single JSON datagram.
pub struct UdpDriver {
    socket: UdpSocket,
    robot_address: SocketAddr,
}

impl UdpDriver {
    pub fn new(socket: UdpSocket, robot_address: SocketAddr) -> Self {
        Self {
            socket,
            robot_address,
        }
    }
}

impl RobotDriver for UdpDriver {
    fn send(&mut self, command: &DriveCommand) -> Result<(), TransportError> {
        let payload = serde_json::to_vec(command)?;
        let sent = self.socket.send_to(&payload, self.robot_address)?;
        if sent != payload.len() {
            return Err(TransportError::Rejected(format!(
                "sent {} of {} bytes",
                sent,
                payload.len()
            )));
        }
        Ok(())
    }
}
