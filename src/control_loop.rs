use crate::differential_controller::DrivePolicy;
use crate::driver::RobotDriver;
use crate::error::{NavigationError, TransportError};
use crate::localisation::{Localiser, PoseDecoder};
use crate::navigation::{Heading, Pose};
use crate::waypoint_queue::WaypointQueue;
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};
use tracing::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    PathExhausted,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: usize,
    pub dispatch_failures: usize,
    pub stop_reason: StopReason,
}

/// Everything the loop mutates between ticks.
#[derive(Debug)]
pub struct ControllerState {
    current_pose: Option<Pose>,
    heading: Option<Heading>,
    queue: WaypointQueue,
    ticks: usize,
    dispatch_failures: usize,
}

impl ControllerState {
    pub fn new(queue: WaypointQueue) -> Self {
        Self {
            current_pose: None,
            heading: None,
            queue,
            ticks: 0,
            dispatch_failures: 0,
        }
    }

    /// `None` until the first sample is decoded.
    pub fn current_pose(&self) -> Option<&Pose> {
        self.current_pose.as_ref()
    }

    pub fn heading(&self) -> Option<Heading> {
        self.heading
    }

    pub fn queue(&self) -> &WaypointQueue {
        &self.queue
    }

    pub fn ticks(&self) -> usize {
        self.ticks
    }

    pub fn dispatch_failures(&self) -> usize {
        self.dispatch_failures
    }

    pub fn loop_state(&self) -> LoopState {
        if self.queue.is_empty() {
            LoopState::Done
        } else {
            LoopState::Running
        }
    }
}

pub struct ControlLoop {
    localiser: Box<dyn Localiser>,
    driver: Box<dyn RobotDriver>,
    policy: Box<dyn DrivePolicy>,
    decoder: PoseDecoder,
    state: ControllerState,
    tick_period: Option<Duration>,
    running: Arc<AtomicBool>,
}

impl ControlLoop {
    pub fn new(
        localiser: Box<dyn Localiser>,
        driver: Box<dyn RobotDriver>,
        policy: Box<dyn DrivePolicy>,
        queue: WaypointQueue,
    ) -> Self {
        Self {
            localiser,
            driver,
            policy,
            decoder: PoseDecoder::default(),
            state: ControllerState::new(queue),
            tick_period: None,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn with_decoder(mut self, decoder: PoseDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    /// Sleep for `period` after every tick.
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period = Some(period);
        self
    }

    /// The run stops before the next tick once `running` is cleared.
    pub fn with_stop_signal(mut self, running: Arc<AtomicBool>) -> Self {
        self.running = running;
        self
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    fn stop_requested(&self) -> bool {
        !self.running.load(Ordering::Acquire)
    }

    /// Runs a single iteration and reports the state the loop is left in.
    ///
    /// Does nothing when the queue is already empty. Failing to fetch or decode
    /// localization is an error. Failing to deliver the drive command is only logged.
    pub fn tick(&mut self) -> Result<LoopState, NavigationError> {
        if self.state.queue.is_empty() {
            return Ok(LoopState::Done);
        }

        let sample = self.localiser.fetch().map_err(NavigationError::Fetch)?;
        let (pose, heading) = self.decoder.decode(&sample)?;
        self.state.current_pose = Some(pose);
        self.state.heading = Some(heading);

        let target = self.state.queue.pop_front()?;
        let command = self.policy.calculate_drive(&pose, heading, &target);
        self.state.ticks += 1;

        if let Err(err) = self.driver.send(&command) {
            self.state.dispatch_failures += 1;
            warn!(tick = self.state.ticks, "Moving robot failed: {}", err);
        }

        info!(
            tick = self.state.ticks,
            x = pose.x(),
            y = pose.y(),
            heading = heading.degrees(),
            target_x = target.x(),
            target_y = target.y(),
            distance = pose.distance_to(&target),
            linear_speed = command.linear_speed,
            angular_speed = command.angular_speed,
            "Position {} heading {}",
            pose,
            heading
        );

        Ok(self.state.loop_state())
    }

    pub fn run(&mut self) -> Result<RunSummary, NavigationError> {
        match self.state.queue.peek() {
            Some(first) => info!(
                "Following {} waypoints starting at {}",
                self.state.queue.len(),
                first
            ),
            None => info!("No waypoints to follow"),
        }
        let stop_reason = loop {
            if self.stop_requested() {
                info!("Stop requested");
                break StopReason::Cancelled;
            }
            match self.tick() {
                Ok(LoopState::Done) => break StopReason::PathExhausted,
                Ok(LoopState::Running) => (),
                // a fetch interrupted by a stop request is a cancellation, not a transport failure
                Err(NavigationError::Fetch(TransportError::Timeout)) if self.stop_requested() => {
                    info!("Stop requested while waiting for localization");
                    break StopReason::Cancelled;
                }
                Err(err) => return Err(err),
            }
            if let Some(period) = self.tick_period {
                thread::sleep(period);
            }
        };
        let summary = RunSummary {
            ticks: self.state.ticks,
            dispatch_failures: self.state.dispatch_failures,
            stop_reason,
        };
        info!(
            ticks = summary.ticks,
            dispatch_failures = summary.dispatch_failures,
            "Run finished: {:?}",
            summary.stop_reason
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::differential_controller::{BearingFollowPolicy, DriveCommand, HeadingErrorPolicy};
    use crate::localisation::{udp_localiser::UdpLocaliser, AxisMapping, LocalizationSample};
    use crate::path_loader::load_path_or_empty;
    use crate::simulator::SimulatedRobot;
    use approx::assert_relative_eq;
    use std::{
        cell::RefCell,
        net::UdpSocket,
        rc::Rc,
        time::Instant,
    };

    /// Replays a fixed sample. Fetch number `fail_on` (1 based) errors.
    struct FakeLocaliser {
        sample: LocalizationSample,
        fetches: Rc<RefCell<usize>>,
        fail_on: Option<usize>,
    }

    impl Localiser for FakeLocaliser {
        fn fetch(&mut self) -> Result<LocalizationSample, TransportError> {
            *self.fetches.borrow_mut() += 1;
            if Some(*self.fetches.borrow()) == self.fail_on {
                return Err(TransportError::Disconnected);
            }
            Ok(self.sample.clone())
        }
    }

    /// Records every command. Send number `fail_on` (1 based) errors.
    struct FakeDriver {
        commands: Rc<RefCell<Vec<DriveCommand>>>,
        fail_on: Option<usize>,
    }

    impl RobotDriver for FakeDriver {
        fn send(&mut self, command: &DriveCommand) -> Result<(), TransportError> {
            self.commands.borrow_mut().push(*command);
            if Some(self.commands.borrow().len()) == self.fail_on {
                return Err(TransportError::Rejected("injected".to_owned()));
            }
            Ok(())
        }
    }

    struct Harness {
        control_loop: ControlLoop,
        fetches: Rc<RefCell<usize>>,
        commands: Rc<RefCell<Vec<DriveCommand>>>,
    }

    fn origin_sample() -> LocalizationSample {
        LocalizationSample {
            position: vec![0.0, 0.3, 0.0],
            orientation: vec![1.0, 0.0, 0.0, 0.0],
        }
    }

    fn harness(
        path: &[(f64, f64)],
        sample: LocalizationSample,
        fetch_fail_on: Option<usize>,
        send_fail_on: Option<usize>,
    ) -> Harness {
        let fetches = Rc::new(RefCell::new(0));
        let commands = Rc::new(RefCell::new(vec![]));
        let mut queue = WaypointQueue::new();
        queue.load(path.iter().copied()).unwrap();
        let control_loop = ControlLoop::new(
            Box::new(FakeLocaliser {
                sample,
                fetches: Rc::clone(&fetches),
                fail_on: fetch_fail_on,
            }),
            Box::new(FakeDriver {
                commands: Rc::clone(&commands),
                fail_on: send_fail_on,
            }),
            Box::new(BearingFollowPolicy::default()),
            queue,
        );
        Harness {
            control_loop,
            fetches,
            commands,
        }
    }

    #[test]
    fn one_tick_per_waypoint() {
        let mut h = harness(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)], origin_sample(), None, None);
        let summary = h.control_loop.run().unwrap();

        assert_eq!(summary.ticks, 3);
        assert_eq!(summary.dispatch_failures, 0);
        assert_eq!(summary.stop_reason, StopReason::PathExhausted);
        assert_eq!(*h.fetches.borrow(), 3);
        assert_eq!(h.commands.borrow().len(), 3);
        assert!(h.control_loop.state().queue().is_empty());
    }

    #[test]
    fn commands_follow_bearing_to_each_waypoint() {
        let mut h = harness(&[(0.0, 1.0), (-1.0, 0.0)], origin_sample(), None, None);
        h.control_loop.run().unwrap();

        let commands = h.commands.borrow();
        assert_relative_eq!(commands[0].linear_speed, 1.0);
        assert_relative_eq!(commands[0].angular_speed, 90.0);
        assert_relative_eq!(commands[1].angular_speed, 180.0);
    }

    #[test]
    fn empty_path_runs_zero_ticks() {
        let mut h = harness(&[], origin_sample(), None, None);
        let summary = h.control_loop.run().unwrap();

        assert_eq!(summary.ticks, 0);
        assert_eq!(summary.stop_reason, StopReason::PathExhausted);
        assert_eq!(*h.fetches.borrow(), 0);
        assert!(h.commands.borrow().is_empty());
    }

    #[test]
    fn dispatch_failure_does_not_stop_run() {
        let mut h = harness(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)], origin_sample(), None, Some(2));
        let summary = h.control_loop.run().unwrap();

        assert_eq!(summary.ticks, 3);
        assert_eq!(summary.dispatch_failures, 1);
        assert_eq!(h.commands.borrow().len(), 3);
        assert!(h.control_loop.state().queue().is_empty());
    }

    #[test]
    fn fetch_failure_aborts_run() {
        let mut h = harness(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)], origin_sample(), Some(2), None);
        let result = h.control_loop.run();

        assert!(matches!(
            result,
            Err(NavigationError::Fetch(TransportError::Disconnected))
        ));
        assert_eq!(h.control_loop.state().ticks(), 1);
        assert_eq!(h.control_loop.state().queue().len(), 2);
        assert_eq!(h.commands.borrow().len(), 1);
    }

    #[test]
    fn malformed_sample_aborts_run() {
        let sample = LocalizationSample {
            position: vec![0.0],
            orientation: vec![1.0, 0.0, 0.0, 0.0],
        };
        let mut h = harness(&[(1.0, 1.0)], sample, None, None);
        assert!(matches!(
            h.control_loop.run(),
            Err(NavigationError::MalformedSample(_))
        ));
        assert_eq!(h.control_loop.state().queue().len(), 1);
    }

    #[test]
    fn stop_signal_prevents_ticks() {
        let running = Arc::new(AtomicBool::new(false));
        let h = harness(&[(1.0, 1.0), (2.0, 2.0)], origin_sample(), None, None);
        let mut control_loop = h.control_loop.with_stop_signal(running);
        let summary = control_loop.run().unwrap();

        assert_eq!(summary.ticks, 0);
        assert_eq!(summary.stop_reason, StopReason::Cancelled);
        assert_eq!(control_loop.state().queue().len(), 2);
    }

    #[test]
    fn state_tracks_last_decoded_sample() {
        let sample = LocalizationSample {
            position: vec![3.0, 9.9, -4.0],
            orientation: vec![0.0, 0.0, 0.0, 1.0],
        };
        let mut h = harness(&[(5.0, 5.0), (6.0, 6.0)], sample, None, None);
        assert!(h.control_loop.state().current_pose().is_none());

        let state = h.control_loop.tick().unwrap();
        assert_eq!(state, LoopState::Running);
        assert_eq!(h.control_loop.state().current_pose(), Some(&Pose::new(3.0, -4.0)));
        assert_relative_eq!(h.control_loop.state().heading().unwrap().degrees(), 180.0);

        assert_eq!(h.control_loop.tick().unwrap(), LoopState::Done);
        assert_eq!(h.control_loop.tick().unwrap(), LoopState::Done);
        assert_eq!(h.control_loop.state().ticks(), 2);
    }

    #[test]
    fn configured_axes_are_used_for_decoding() {
        let sample = LocalizationSample {
            position: vec![3.0, 9.9, -4.0],
            orientation: vec![1.0, 0.0, 0.0, 0.0],
        };
        let h = harness(&[(3.0, 10.9)], sample, None, None);
        let mut control_loop = h
            .control_loop
            .with_decoder(PoseDecoder::new(AxisMapping { x: 0, y: 1 }));
        control_loop.run().unwrap();

        assert_eq!(control_loop.state().current_pose(), Some(&Pose::new(3.0, 9.9)));
        assert_relative_eq!(h.commands.borrow()[0].angular_speed, 90.0, epsilon = 1e-9);
    }

    #[test]
    fn simulated_robot_drains_path() {
        let robot = SimulatedRobot::new(
            Pose::new(0.0, 0.0),
            Heading::from_degrees(0.0),
            Duration::from_millis(100),
        );
        let mut queue = WaypointQueue::new();
        queue
            .load([(1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)])
            .unwrap();
        let mut control_loop = ControlLoop::new(
            Box::new(robot.localiser()),
            Box::new(robot.driver()),
            Box::new(HeadingErrorPolicy::new(0.5, 1.0, 90.0)),
            queue,
        );
        let summary = control_loop.run().unwrap();

        assert_eq!(summary.ticks, 4);
        assert_eq!(robot.commands_received(), 4);
        assert!(control_loop.state().queue().is_empty());
    }

    #[test]
    fn empty_path_file_runs_zero_ticks() {
        let file = std::env::temp_dir().join(format!(
            "waypoint_follower_{}_empty_run.json",
            std::process::id()
        ));
        std::fs::write(&file, "[]").unwrap();
        let points = load_path_or_empty(&file);
        std::fs::remove_file(&file).unwrap();

        let mut h = harness(&points, origin_sample(), None, None);
        let summary = h.control_loop.run().unwrap();

        assert_eq!(summary.ticks, 0);
        assert_eq!(summary.stop_reason, StopReason::PathExhausted);
        assert_eq!(*h.fetches.borrow(), 0);
        assert!(h.commands.borrow().is_empty());
    }

    #[test]
    fn stop_request_ends_blocked_fetch() {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        socket
            .set_read_timeout(Some(Duration::from_millis(20)))
            .unwrap();
        let running = Arc::new(AtomicBool::new(true));
        let mut queue = WaypointQueue::new();
        queue.load([(1.0, 1.0), (2.0, 2.0)]).unwrap();
        let commands = Rc::new(RefCell::new(vec![]));
        let mut control_loop = ControlLoop::new(
            Box::new(UdpLocaliser::new(socket).with_stop_signal(running.clone())),
            Box::new(FakeDriver {
                commands: Rc::clone(&commands),
                fail_on: None,
            }),
            Box::new(BearingFollowPolicy::default()),
            queue,
        )
        .with_stop_signal(running.clone());

        let stopper = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(200));
            running.store(false, Ordering::Release);
        });

        let started = Instant::now();
        let summary = control_loop.run().unwrap();
        stopper.join().unwrap();

        assert!(started.elapsed() < Duration::from_secs(3));
        assert_eq!(summary.ticks, 0);
        assert_eq!(summary.stop_reason, StopReason::Cancelled);
        assert!(commands.borrow().is_empty());
        assert_eq!(control_loop.state().queue().len(), 2);
    }

    #[test]
    fn timeout_without_stop_request_is_fatal() {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        socket
            .set_read_timeout(Some(Duration::from_millis(20)))
            .unwrap();
        let mut queue = WaypointQueue::new();
        queue.load([(1.0, 1.0)]).unwrap();
        let mut control_loop = ControlLoop::new(
            Box::new(UdpLocaliser::new(socket)),
            Box::new(FakeDriver {
                commands: Rc::new(RefCell::new(vec![])),
                fail_on: None,
            }),
            Box::new(BearingFollowPolicy::default()),
            queue,
        );

        assert!(matches!(
            control_loop.run(),
            Err(NavigationError::Fetch(TransportError::Timeout))
        ));
    }
}
