use crate::error::NavigationError;
use crate::navigation::Waypoint;
use std::collections::VecDeque;

/// FIFO of waypoints consumed front to back exactly once.
///
/// A queue can be loaded a single time. Loading it again is rejected and
/// leaves the remaining waypoints untouched.
#[derive(Debug, Default)]
pub struct WaypointQueue {
    waypoints: VecDeque<Waypoint>,
    loaded: bool,
}

impl WaypointQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load<I, P>(&mut self, points: I) -> Result<(), NavigationError>
    where
        I: IntoIterator<Item = P>,
        P: Into<Waypoint>,
    {
        if self.loaded {
            return Err(NavigationError::QueueAlreadyLoaded);
        }
        self.waypoints = points.into_iter().map(Into::into).collect();
        self.loaded = true;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn peek(&self) -> Option<&Waypoint> {
        self.waypoints.front()
    }

    /// Callers are expected to check [`WaypointQueue::is_empty`] first.
    pub fn pop_front(&mut self) -> Result<Waypoint, NavigationError> {
        self.waypoints
            .pop_front()
            .ok_or(NavigationError::EmptyQueue)
    }
}
