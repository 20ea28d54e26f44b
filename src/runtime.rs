use std::time::Duration;

use log::{debug, info, warn};
use tokio::time::{Instant, MissedTickBehavior};

use crate::config::DeviceConfig;
use crate::hardware::firmware::FirmwareUpdater;
use crate::hardware::output::ChannelDriver;
use crate::models::channel::{mix_state, ChannelOutput, Polarity};
use crate::models::light_state::{LightState, LightStateManager};
use crate::mqtt::connection::{ConnectionManager, LinkEvent};
use crate::mqtt::transport::{InboundMessage, Transport};
use crate::protocol::codec::{decode_command, encode_discovery, encode_state};

pub const TICK_PERIOD: Duration = Duration::from_millis(100);

/// The single control loop: owns the light state, the broker session and
/// the outputs.
pub struct Controller<T: Transport, D: ChannelDriver, U: FirmwareUpdater> {
    hostname: String,
    light: LightStateManager,
    connection: ConnectionManager<T>,
    driver: D,
    updater: U,
    polarity: Polarity,
}

impl<T: Transport, D: ChannelDriver, U: FirmwareUpdater> Controller<T, D, U> {
    pub fn new(config: &DeviceConfig, transport: T, driver: D, updater: U) -> Self {
        Self {
            hostname: config.hostname.clone(),
            light: LightStateManager::new(config.temperature),
            connection: ConnectionManager::new(
                transport,
                config.topics(),
                config.reconnect_delay(),
            ),
            driver,
            updater,
            polarity: config.output.polarity,
        }
    }

    pub fn light_state(&self) -> LightState {
        self.light.snapshot()
    }

    pub fn channel_output(&self) -> ChannelOutput {
        mix_state(&self.light.snapshot(), self.light.range())
    }

    pub fn connection(&self) -> &ConnectionManager<T> {
        &self.connection
    }

    pub fn connection_mut(&mut self) -> &mut ConnectionManager<T> {
        &mut self.connection
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Put the outputs in the boot state before any network traffic.
    pub fn boot(&mut self) {
        let state = self.light.snapshot();
        info!(
            "boot: {} on={} brightness={} temperature={}K",
            self.hostname, state.on, state.brightness, state.color_temperature
        );
        self.drive_outputs();
    }

    /// One scheduler pass: update hook, link upkeep, then every queued
    /// command in arrival order.
    pub async fn tick(&mut self, now: Instant) {
        self.updater.poll();

        if self.connection.maintain(now).await == LinkEvent::Established {
            self.announce();
        }

        while let Some(message) = self.connection.next_message().await {
            self.handle_message(&message);
        }
    }

    pub fn handle_message(&mut self, message: &InboundMessage) {
        if message.topic != self.connection.topics().command {
            debug!("ignoring message on {}", message.topic);
            return;
        }

        let update = match decode_command(&message.payload) {
            Ok(update) => update,
            Err(e) => {
                warn!("discarding command: {}", e);
                return;
            }
        };

        if self.light.apply(&update) {
            let state = self.light.snapshot();
            info!(
                "state: on={} brightness={} temperature={}K",
                state.on, state.brightness, state.color_temperature
            );
        }
        self.drive_outputs();
        self.publish_state();
    }

    /// Runs until Ctrl-C.
    pub async fn run(mut self) {
        self.boot();

        let mut interval = tokio::time::interval(TICK_PERIOD);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("shutting down");
                    break;
                }
                _ = interval.tick() => {
                    self.tick(Instant::now()).await;
                }
            }
        }
    }

    fn announce(&mut self) {
        let topics = self.connection.topics().clone();
        let discovery = encode_discovery(&self.hostname, &topics).to_bytes();
        self.connection.publish(&topics.config, discovery, true);
        self.publish_state();
    }

    fn publish_state(&mut self) {
        let payload = encode_state(&self.light.snapshot()).to_bytes();
        let topic = self.connection.topics().state.clone();
        self.connection.publish(&topic, payload, true);
    }

    fn drive_outputs(&mut self) {
        let levels = self.channel_output().drive_levels(self.polarity);
        self.driver.write(levels);
    }
}
