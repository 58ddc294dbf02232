use super::{LocalizationSample, Localiser};
use crate::error::TransportError;
use std::{
    io::ErrorKind,
    net::UdpSocket,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use tracing::*;

pub struct UdpLocaliser {
    socket: UdpSocket,
    // we should never get messages this big. But since this buffer is simply allocated once
    // it doesn't cost us much to preallocate it
    buf: Vec<u8>,
    running: Option<Arc<AtomicBool>>,
}

impl UdpLocaliser {
    pub fn new(socket: UdpSocket) -> Self {
        Self {
            socket,
            buf: vec![0; 65000],
            running: None,
        }
    }

    /// Keep waiting through read timeouts while `running` is set.
    ///
    /// The socket read timeout becomes the interval at which the flag is polled.
    /// Once the flag is cleared the next timeout is returned to the caller.
    pub fn with_stop_signal(mut self, running: Arc<AtomicBool>) -> Self {
        self.running = Some(running);
        self
    }

    fn keep_waiting(&self) -> bool {
        self.running
            .as_ref()
            .map(|running| running.load(Ordering::Acquire))
            .unwrap_or(false)
    }
}

impl Localiser for UdpLocaliser {
    fn fetch(&mut self) -> Result<LocalizationSample, TransportError> {
        loop {
            let len = match self.socket.recv(&mut self.buf) {
                Ok(len) => len,
                Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    if self.keep_waiting() {
                        trace!("No localization yet, still waiting");
                        continue;
                    }
                    return Err(TransportError::Timeout);
                }
                Err(err) => return Err(err.into()),
            };
            match serde_json::from_slice::<LocalizationSample>(&self.buf[..len]) {
                Ok(sample) => return Ok(sample),
                // a garbled datagram shouldn't end the run, wait for the next one
                Err(err) => warn!("Failed to parse json from localiser: {}", err),
            }
        }
    }
}
