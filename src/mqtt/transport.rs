use std::time::Duration;

use rumqttc::{AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Packet, QoS};

use crate::config::BrokerConfig;

/// Request queue depth between the client handle and the event loop.
const REQUEST_CAPACITY: usize = 16;
const MAX_PACKET_SIZE: usize = 4096;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("not connected")]
    NotConnected,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("connection lost: {0}")]
    Link(String),

    #[error("request rejected: {0}")]
    Request(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

/// Publish/subscribe link to a broker.
///
/// Publishing and subscribing only enqueue; `poll_message` is what moves
/// traffic and is where a dropped link is noticed.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Open a fresh session, discarding any previous one.
    async fn connect(&mut self) -> Result<(), TransportError>;

    fn is_connected(&self) -> bool;

    fn subscribe(&mut self, topic: &str) -> Result<(), TransportError>;

    fn publish(
        &mut self,
        topic: &str,
        payload: Vec<u8>,
        retained: bool,
    ) -> Result<(), TransportError>;

    /// Next inbound publish, or `None` once nothing is pending.
    async fn poll_message(&mut self) -> Result<Option<InboundMessage>, TransportError>;
}

struct Session {
    client: AsyncClient,
    eventloop: EventLoop,
}

/// `Transport` over a rumqttc client.
pub struct MqttTransport {
    options: MqttOptions,
    connect_timeout: Duration,
    poll_window: Duration,
    session: Option<Session>,
}

impl MqttTransport {
    pub fn new(client_id: &str, broker: &BrokerConfig) -> Self {
        let mut options = MqttOptions::new(client_id, broker.host.clone(), broker.port);
        options.set_keep_alive(Duration::from_secs(broker.keep_alive_secs.max(5)));
        options.set_clean_session(true);
        options.set_max_packet_size(MAX_PACKET_SIZE, MAX_PACKET_SIZE);
        if let Some(username) = &broker.username {
            options.set_credentials(
                username.clone(),
                broker.password.clone().unwrap_or_default(),
            );
        }

        Self {
            options,
            connect_timeout: Duration::from_secs(10),
            poll_window: Duration::from_millis(50),
            session: None,
        }
    }

    fn drop_session(&mut self) {
        self.session = None;
    }
}

impl Transport for MqttTransport {
    async fn connect(&mut self) -> Result<(), TransportError> {
        self.drop_session();
        let (client, mut eventloop) = AsyncClient::new(self.options.clone(), REQUEST_CAPACITY);

        let handshake = async {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                        return if ack.code == ConnectReturnCode::Success {
                            Ok(())
                        } else {
                            Err(TransportError::Connect(format!("{:?}", ack.code)))
                        };
                    }
                    Ok(_) => continue,
                    Err(e) => return Err(TransportError::Connect(e.to_string())),
                }
            }
        };

        let outcome = tokio::time::timeout(self.connect_timeout, handshake).await;
        match outcome {
            Ok(Ok(())) => {
                self.session = Some(Session { client, eventloop });
                Ok(())
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(TransportError::Connect("handshake timed out".into())),
        }
    }

    fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        let session = self.session.as_ref().ok_or(TransportError::NotConnected)?;
        session
            .client
            .try_subscribe(topic, QoS::AtMostOnce)
            .map_err(|e| TransportError::Request(e.to_string()))
    }

    fn publish(
        &mut self,
        topic: &str,
        payload: Vec<u8>,
        retained: bool,
    ) -> Result<(), TransportError> {
        let session = self.session.as_ref().ok_or(TransportError::NotConnected)?;
        session
            .client
            .try_publish(topic, QoS::AtMostOnce, retained, payload)
            .map_err(|e| TransportError::Request(e.to_string()))
    }

    async fn poll_message(&mut self) -> Result<Option<InboundMessage>, TransportError> {
        let window = self.poll_window;
        let Some(session) = self.session.as_mut() else {
            return Err(TransportError::NotConnected);
        };

        loop {
            let event = tokio::time::timeout(window, session.eventloop.poll()).await;
            match event {
                Err(_) => return Ok(None),
                Ok(Ok(Event::Incoming(Packet::Publish(publish)))) => {
                    return Ok(Some(InboundMessage {
                        topic: publish.topic,
                        payload: publish.payload.to_vec(),
                    }));
                }
                Ok(Ok(Event::Incoming(Packet::Disconnect))) => {
                    self.drop_session();
                    return Err(TransportError::Link("broker sent disconnect".into()));
                }
                Ok(Ok(_)) => continue,
                Ok(Err(e)) => {
                    self.drop_session();
                    return Err(TransportError::Link(e.to_string()));
                }
            }
        }
    }
}
