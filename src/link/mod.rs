//! Link node orchestration
//!
//! One task owns the whole node state and interleaves its event sources
//! (the periodic control tick, completed receptions, and operator commands)
//! through a single `select!` loop. Funneling every mutation through that
//! task is the synchronization discipline of this crate: the periodic and
//! reception paths can never race, and the follower's reply goes out
//! strictly after the triggering frame has been decoded and handled.

pub mod state;

pub use self::state::{LinkState, LinkStatus};

use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::core::{Error, LinkConfig, Mode, Result};
use crate::measure::MeasurementSource;
use crate::protocol::Frame;
use crate::transport::BusEndpoint;

/// Operator-facing commands accepted by the link task
#[derive(Debug)]
enum Command {
    SetMode(Mode),
    Status(oneshot::Sender<LinkStatus>),
}

/// Handle for steering a running link
///
/// This is the boundary the console/menu layer talks through; the handle
/// never touches node state directly.
#[derive(Clone)]
pub struct LinkHandle {
    command_tx: mpsc::Sender<Command>,
}

impl LinkHandle {
    /// Switches the operating mode
    ///
    /// On the master this drives the protocol: entering power re-arms the
    /// one-shot idle announcement for the next idle entry.
    pub async fn set_mode(&self, mode: Mode) -> Result<()> {
        self.command_tx
            .send(Command::SetMode(mode))
            .await
            .map_err(|_| Error::transport("link task is gone"))
    }

    /// Snapshots the node's observable state
    pub async fn status(&self) -> Result<LinkStatus> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(Command::Status(reply_tx))
            .await
            .map_err(|_| Error::transport("link task is gone"))?;
        reply_rx
            .await
            .map_err(|_| Error::transport("link task is gone"))
    }
}

/// A protocol node bound to one side of the bus
pub struct Link {
    config: LinkConfig,
    state: LinkState,
    bus: BusEndpoint,
    source: Box<dyn MeasurementSource>,
    command_rx: mpsc::Receiver<Command>,
}

impl Link {
    /// Creates a link node over `bus`, polling `source` once per control
    /// period. Returns the node and the operator handle for it.
    pub fn new(
        config: LinkConfig,
        bus: BusEndpoint,
        source: Box<dyn MeasurementSource>,
    ) -> (Link, LinkHandle) {
        let (command_tx, command_rx) = mpsc::channel(config.channel_capacity);
        let state = LinkState::new(config.role, config.voltage_ref);

        (
            Link {
                config,
                state,
                bus,
                source,
                command_rx,
            },
            LinkHandle { command_tx },
        )
    }

    /// Runs the node until the bus goes away
    pub async fn run(mut self) -> Result<()> {
        let mut ticker = interval(self.config.control_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            role = ?self.config.role,
            period = ?self.config.control_period,
            "link running"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let reading = self.source.latest_value(self.config.sensor_channel);
                    self.state.update_measurement(reading);

                    if let Some(frame) = self.state.tick() {
                        self.transmit(frame).await?;
                    }
                }

                received = self.bus.rx.recv() => {
                    match received {
                        Some(frame) => {
                            if let Some(reply) = self.state.handle_frame(&frame) {
                                self.transmit(reply).await?;
                            }
                        }
                        None => {
                            warn!("bus closed, stopping link");
                            return Ok(());
                        }
                    }
                }

                Some(command) = self.command_rx.recv() => {
                    match command {
                        Command::SetMode(mode) => {
                            debug!(?mode, "operator mode change");
                            self.state.set_mode(mode);
                        }
                        Command::Status(reply) => {
                            let _ = reply.send(self.state.status());
                        }
                    }
                }
            }
        }
    }

    /// Queues `frame` for transmission
    ///
    /// Fire-and-forget: the transport drains the queue in order, one frame
    /// fully on the wire before the next, and completion is not awaited.
    async fn transmit(&self, frame: Frame) -> Result<()> {
        self.bus
            .tx
            .send(frame)
            .await
            .map_err(|_| Error::transport("bus transmit queue closed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Role;
    use crate::measure::HeldValue;
    use crate::transport;
    use std::time::Duration;

    fn test_config(role: Role) -> LinkConfig {
        LinkConfig {
            role,
            control_period: Duration::from_millis(1),
            ..LinkConfig::default()
        }
    }

    #[tokio::test]
    async fn test_master_follower_exchange() {
        let (master_bus, follower_bus) = transport::loopback(32);

        let sensor = HeldValue::new();
        sensor.store(12.5);

        let (master, master_handle) =
            Link::new(test_config(Role::Master), master_bus, Box::new(HeldValue::new()));
        let (follower, follower_handle) =
            Link::new(test_config(Role::Follower), follower_bus, Box::new(sensor.clone()));

        let master_task = tokio::spawn(master.run());
        let follower_task = tokio::spawn(follower.run());

        // Power on: the master starts announcing, the follower adopts the
        // mode and its replies carry the measurement back.
        master_handle.set_mode(Mode::Power).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let follower_status = follower_handle.status().await.unwrap();
        assert_eq!(follower_status.mode, Mode::Power);

        let master_status = master_handle.status().await.unwrap();
        assert_eq!(master_status.voltage_meas, 12.5);

        // Back to idle: the one-shot announcement reaches the follower.
        master_handle.set_mode(Mode::Idle).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let follower_status = follower_handle.status().await.unwrap();
        assert_eq!(follower_status.mode, Mode::Idle);

        master_task.abort();
        follower_task.abort();
    }

    #[tokio::test]
    async fn test_follower_is_silent_without_master() {
        let (mut probe, follower_bus) = transport::loopback(32);

        let (follower, _handle) =
            Link::new(test_config(Role::Follower), follower_bus, Box::new(HeldValue::new()));
        let follower_task = tokio::spawn(follower.run());

        // No master frames on the bus, so no follower transmissions either.
        let received = tokio::time::timeout(Duration::from_millis(50), probe.rx.recv()).await;
        assert!(received.is_err(), "follower transmitted without a master frame");

        follower_task.abort();
    }

    #[tokio::test]
    async fn test_link_stops_when_bus_closes() {
        let (probe, follower_bus) = transport::loopback(32);

        let (follower, _handle) =
            Link::new(test_config(Role::Follower), follower_bus, Box::new(HeldValue::new()));
        let follower_task = tokio::spawn(follower.run());

        drop(probe);
        let result = tokio::time::timeout(Duration::from_millis(100), follower_task)
            .await
            .expect("link should stop once the bus is gone")
            .unwrap();
        assert!(result.is_ok());
    }
}
