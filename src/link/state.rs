use tracing::{debug, trace};

use crate::core::{Mode, Role};
use crate::protocol::Frame;

/// Snapshot of a node's observable state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkStatus {
    /// This node's fixed role
    pub role: Role,
    /// Current operating mode
    pub mode: Mode,
    /// Reference distributed while in power mode
    pub voltage_ref: f32,
    /// Most recent measurement, local or learned from the peer
    pub voltage_meas: f32,
}

/// Role and mode state machine for one node
///
/// All mutation happens on the link task that owns this value; the
/// reception and periodic paths interleave there but never run
/// concurrently (see the `link` module docs). The transition methods are
/// plain functions of state and input, which is what the property tests
/// exercise.
#[derive(Debug)]
pub struct LinkState {
    /// This node's role, immutable after construction
    role: Role,
    /// Current operating mode
    mode: Mode,
    /// Latch set once the idle announcement has gone out
    send_idle: bool,
    /// Reference distributed while in power mode
    voltage_ref: f32,
    /// Most recent measurement, local or learned from the peer
    last_measurement: f32,
    /// The follower's persistent reply image. Only the identity and
    /// measurement fields are rewritten per reply; the reference and
    /// status fields keep whatever was last written, and the master reads
    /// neither of them on follower frames.
    reply_frame: Frame,
}

impl LinkState {
    /// Creates the state machine for `role`, starting in idle
    pub fn new(role: Role, voltage_ref: f32) -> Self {
        LinkState {
            role,
            mode: Mode::Idle,
            send_idle: false,
            voltage_ref,
            last_measurement: 0.0,
            reply_frame: Frame::default(),
        }
    }

    /// This node's fixed role
    pub fn role(&self) -> Role {
        self.role
    }

    /// Current operating mode
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Most recent measurement known to this node
    pub fn last_measurement(&self) -> f32 {
        self.last_measurement
    }

    /// Snapshots the observable state
    pub fn status(&self) -> LinkStatus {
        LinkStatus {
            role: self.role,
            mode: self.mode,
            voltage_ref: self.voltage_ref,
            voltage_meas: self.last_measurement,
        }
    }

    /// Applies an operator mode change
    ///
    /// Entering power re-arms the one-shot idle announcement, so idle is
    /// re-announced once on the next idle entry. Only the master's
    /// operator path drives the protocol; on the follower the next master
    /// frame overrides whatever was set here.
    pub fn set_mode(&mut self, mode: Mode) {
        if mode == Mode::Power {
            self.send_idle = false;
        }
        self.mode = mode;
    }

    /// Folds in the latest sensor reading
    ///
    /// `None` means the source has no new value; the previous measurement
    /// is retained unchanged rather than zeroed or flagged.
    pub fn update_measurement(&mut self, reading: Option<f32>) {
        if let Some(value) = reading {
            self.last_measurement = value;
        }
    }

    /// Handles one completed reception, after decode
    ///
    /// Returns the reply to put on the bus, if this node answers (follower
    /// only). Frames whose identity byte does not name the expected peer
    /// are dropped without any state change; that covers echoes of this
    /// node's own frames as well as foreign identity values.
    pub fn handle_frame(&mut self, frame: &Frame) -> Option<Frame> {
        if frame.sender() != Some(self.role.peer()) {
            trace!(sender = frame.sender_id, "ignoring frame from unexpected sender");
            return None;
        }

        match self.role {
            Role::Master => {
                // Follower feedback: adopt the reported measurement.
                self.last_measurement = frame.voltage_meas;
                None
            }
            Role::Follower => {
                // Mode always reflects the last validated master frame.
                let mode = frame.status();
                if mode != self.mode {
                    debug!(?mode, "mode set by master");
                }
                self.mode = mode;

                // Answer immediately with the local measurement. Every
                // follower transmission is a direct reaction to a master
                // frame, which keeps the half-duplex bus collision-free.
                self.reply_frame.sender_id = self.role.wire();
                self.reply_frame.voltage_meas = self.last_measurement;
                Some(self.reply_frame)
            }
        }
    }

    /// Runs one periodic tick, returning the frame to transmit, if any
    ///
    /// The follower never transmits from here; its only output path is the
    /// synchronous reply in [`handle_frame`](Self::handle_frame). The
    /// master re-announces power every tick so the follower keeps seeing a
    /// fresh reference, but announces idle only once per entry.
    pub fn tick(&mut self) -> Option<Frame> {
        if self.role != Role::Master {
            return None;
        }

        match self.mode {
            Mode::Power => Some(Frame::power_status(self.voltage_ref)),
            Mode::Idle => {
                if self.send_idle {
                    None
                } else {
                    self.send_idle = true;
                    Some(Frame::idle_status(self.voltage_ref))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn follower_with_measurement(value: f32) -> LinkState {
        let mut state = LinkState::new(Role::Follower, 0.0);
        state.update_measurement(Some(value));
        state
    }

    fn master_frame(mode: Mode) -> Frame {
        Frame {
            voltage_ref: 32.0,
            voltage_meas: 0.0,
            sender_id: Role::Master.wire(),
            status_code: mode.wire(),
        }
    }

    #[test]
    fn test_role_isolation() {
        // A node must ignore frames claiming to come from itself.
        let mut master = LinkState::new(Role::Master, 32.0);
        master.update_measurement(Some(5.0));
        let echo = master_frame(Mode::Power);
        assert_eq!(master.handle_frame(&echo), None);
        assert_eq!(master.mode(), Mode::Idle);
        assert_eq!(master.last_measurement(), 5.0);

        let mut follower = follower_with_measurement(5.0);
        let own = Frame {
            sender_id: Role::Follower.wire(),
            ..master_frame(Mode::Power)
        };
        assert_eq!(follower.handle_frame(&own), None);
        assert_eq!(follower.mode(), Mode::Idle);
    }

    #[test]
    fn test_foreign_sender_ignored() {
        let mut follower = follower_with_measurement(5.0);
        let foreign = Frame {
            sender_id: 9,
            ..master_frame(Mode::Power)
        };
        assert_eq!(follower.handle_frame(&foreign), None);
        assert_eq!(follower.mode(), Mode::Idle);
    }

    #[test]
    fn test_follower_responsiveness() {
        let mut follower = follower_with_measurement(31.4);

        let reply = follower.handle_frame(&master_frame(Mode::Power));

        assert_eq!(follower.mode(), Mode::Power);
        let reply = reply.expect("follower must answer a validated master frame");
        assert_eq!(reply.sender(), Some(Role::Follower));
        assert_eq!(reply.voltage_meas, 31.4);
    }

    #[test]
    fn test_follower_returns_to_idle() {
        let mut follower = follower_with_measurement(31.4);
        follower.handle_frame(&master_frame(Mode::Power));
        assert_eq!(follower.mode(), Mode::Power);

        let reply = follower.handle_frame(&master_frame(Mode::Idle));
        assert_eq!(follower.mode(), Mode::Idle);
        // The follower still answers; only its mode changed.
        assert!(reply.is_some());
    }

    #[test]
    fn test_unknown_status_reads_as_idle() {
        let mut follower = follower_with_measurement(31.4);
        follower.handle_frame(&master_frame(Mode::Power));

        let mut frame = master_frame(Mode::Power);
        frame.status_code = 7;
        follower.handle_frame(&frame);
        assert_eq!(follower.mode(), Mode::Idle);
    }

    #[test]
    fn test_reply_preserves_stale_fields() {
        // The reference and status fields of the reply image are not
        // rewritten per reply; the master never reads them.
        let mut follower = follower_with_measurement(31.4);
        let reply = follower
            .handle_frame(&master_frame(Mode::Power))
            .expect("reply");
        assert_eq!(reply.voltage_ref, 0.0);
        assert_eq!(reply.status_code, 0);
    }

    #[test]
    fn test_master_measurement_adoption() {
        let mut master = LinkState::new(Role::Master, 32.0);
        master.update_measurement(Some(1.0));

        let feedback = Frame {
            voltage_ref: 0.0,
            voltage_meas: 31.8,
            sender_id: Role::Follower.wire(),
            status_code: 0,
        };
        assert_eq!(master.handle_frame(&feedback), None);
        assert_eq!(master.last_measurement(), 31.8);
    }

    #[test]
    fn test_power_reannounces_every_tick() {
        let mut master = LinkState::new(Role::Master, 32.0);
        master.set_mode(Mode::Power);

        for _ in 0..5 {
            let frame = master.tick().expect("power mode transmits every tick");
            assert_eq!(frame.sender(), Some(Role::Master));
            assert_eq!(frame.status(), Mode::Power);
            assert_eq!(frame.voltage_ref, 32.0);
            assert_eq!(frame.voltage_meas, 0.0);
        }
    }

    #[test]
    fn test_idle_is_edge_triggered() {
        let mut master = LinkState::new(Role::Master, 32.0);
        master.set_mode(Mode::Power);
        assert!(master.tick().is_some());

        master.set_mode(Mode::Idle);

        let announcement = master.tick().expect("one announcement on idle entry");
        assert_eq!(announcement.status(), Mode::Idle);
        for _ in 0..5 {
            assert_eq!(master.tick(), None);
        }

        // Re-entering power re-arms the edge.
        master.set_mode(Mode::Power);
        assert!(master.tick().is_some());
        master.set_mode(Mode::Idle);
        assert!(master.tick().is_some());
        assert_eq!(master.tick(), None);
    }

    #[test]
    fn test_follower_tick_never_transmits() {
        let mut follower = follower_with_measurement(31.4);
        follower.handle_frame(&master_frame(Mode::Power));

        for _ in 0..5 {
            assert_eq!(follower.tick(), None);
        }
    }

    #[test]
    fn test_stale_measurement_retained() {
        let mut state = LinkState::new(Role::Follower, 0.0);
        state.update_measurement(Some(30.2));
        state.update_measurement(None);
        assert_eq!(state.last_measurement(), 30.2);

        state.update_measurement(Some(30.5));
        assert_eq!(state.last_measurement(), 30.5);
    }
}
