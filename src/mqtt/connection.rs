use std::time::Duration;

use log::{debug, info, warn};
use tokio::time::Instant;

use super::transport::{InboundMessage, Transport};
use crate::protocol::topics::Topics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
    /// Connected with the command topic subscribed.
    SubscriptionActive,
}

impl SessionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, SessionState::Connected | SessionState::SubscriptionActive)
    }
}

/// What `maintain` did this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    /// Nothing changed.
    Idle,
    /// A session was established and the command topic subscribed.
    Established,
    /// An attempt failed; the next one waits for the retry delay.
    AttemptFailed,
    /// An established session dropped.
    Lost,
}

/// Polled broker session with fixed-delay, unbounded reconnect.
pub struct ConnectionManager<T: Transport> {
    transport: T,
    topics: Topics,
    state: SessionState,
    retry_delay: Duration,
    last_attempt: Option<Instant>,
}

impl<T: Transport> ConnectionManager<T> {
    pub fn new(transport: T, topics: Topics, retry_delay: Duration) -> Self {
        Self {
            transport,
            topics,
            state: SessionState::Disconnected,
            retry_delay,
            last_attempt: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn topics(&self) -> &Topics {
        &self.topics
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Check link liveness and, when due, attempt to (re)connect.
    ///
    /// A failed attempt is not retried until `retry_delay` has passed since
    /// it started. A dropped session is retried on the next call.
    pub async fn maintain(&mut self, now: Instant) -> LinkEvent {
        if self.state.is_connected() {
            if self.transport.is_connected() {
                return LinkEvent::Idle;
            }
            warn!("mqtt: connection lost");
            self.state = SessionState::Disconnected;
            self.last_attempt = None;
            return LinkEvent::Lost;
        }

        if let Some(last) = self.last_attempt {
            if now.saturating_duration_since(last) < self.retry_delay {
                return LinkEvent::Idle;
            }
        }

        self.state = SessionState::Connecting;
        self.last_attempt = Some(now);
        info!("mqtt: attempting connection...");

        if let Err(e) = self.transport.connect().await {
            warn!(
                "mqtt: {}, retrying in {}s",
                e,
                self.retry_delay.as_secs_f32()
            );
            self.state = SessionState::Disconnected;
            return LinkEvent::AttemptFailed;
        }
        self.state = SessionState::Connected;
        info!("mqtt: connected");

        match self.transport.subscribe(&self.topics.command) {
            Ok(()) => {
                info!("mqtt: subscribed to {}", self.topics.command);
                self.state = SessionState::SubscriptionActive;
                LinkEvent::Established
            }
            Err(e) => {
                // Subscribing is part of the connect transaction.
                warn!("mqtt: subscribe failed: {}", e);
                self.state = SessionState::Disconnected;
                LinkEvent::AttemptFailed
            }
        }
    }

    /// Fire-and-forget publish; failures are logged and dropped.
    pub fn publish(&mut self, topic: &str, payload: Vec<u8>, retained: bool) -> bool {
        if !self.state.is_connected() {
            debug!("mqtt: not connected, dropping publish to {}", topic);
            return false;
        }
        info!("SEND [{}]: {}", topic, String::from_utf8_lossy(&payload));
        match self.transport.publish(topic, payload, retained) {
            Ok(()) => true,
            Err(e) => {
                warn!("mqtt: publish to {} failed: {}", topic, e);
                false
            }
        }
    }

    /// Next queued inbound message, if any. A transport failure ends the
    /// drain and marks the session down so the next `maintain` reconnects.
    pub async fn next_message(&mut self) -> Option<InboundMessage> {
        if !self.state.is_connected() {
            return None;
        }
        match self.transport.poll_message().await {
            Ok(Some(message)) => {
                info!(
                    "RECV [{}]: {}",
                    message.topic,
                    String::from_utf8_lossy(&message.payload)
                );
                Some(message)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("mqtt: {}", e);
                self.state = SessionState::Disconnected;
                self.last_attempt = None;
                None
            }
        }
    }
}
