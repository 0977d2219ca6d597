//! Event output
//!
//! Sinks shared by every target scheduler:
//! - MQTT broker (one topic per stats kind)
//! - Console (JSON lines on stdout)
//!
//! Implementations must tolerate concurrent `publish` calls.

use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, Incoming, MqttOptions, QoS};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncWriteExt, Stdout};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::client::StatsKind;
use crate::config::{ConsoleConf, MqttConf, Output};
use crate::event::PollEvent;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Failed to serialize event: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("MQTT publish failed: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    #[error("MQTT publish timed out after {0:?} (broker unreachable?)")]
    Timeout(Duration),

    #[error("Failed to write event: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait EventSink: Send + Sync {
    async fn publish(&self, event: &PollEvent) -> Result<(), PublishError>;

    /// Flush and release the underlying transport
    async fn close(&self) {}
}

/// Build the sink selected in the config
pub fn connect(output: &Output) -> Arc<dyn EventSink> {
    match output {
        Output::Mqtt(conf) => Arc::new(MqttPublisher::connect(conf)),
        Output::Console(conf) => Arc::new(ConsolePublisher::new(conf)),
    }
}

/// Topic for one stats kind, e.g. `actuatorbeat/metrics@v1`
pub fn topic_for(prefix: &str, kind: StatsKind) -> String {
    format!("{}/{}@v1", prefix.trim_end_matches('/'), kind)
}

pub struct MqttPublisher {
    client: AsyncClient,
    topic_prefix: String,
    publish_timeout: Duration,
}

impl MqttPublisher {
    /// Create the client and drive its event loop in the background
    pub fn connect(conf: &MqttConf) -> Self {
        let mut mqtt_options = MqttOptions::new(&conf.client_id, &conf.host, conf.port);
        mqtt_options.set_keep_alive(Duration::from_secs(conf.keep_alive_secs));
        mqtt_options.set_clean_session(true);

        let (client, mut eventloop) = AsyncClient::new(mqtt_options, 10);

        let broker = format!("{}:{}", conf.host, conf.port);
        tokio::spawn(async move {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                        info!("✅ Connected to MQTT broker {}", broker);
                    }
                    Ok(Event::Incoming(Incoming::Disconnect)) => {
                        info!("MQTT broker closed the session");
                        break;
                    }
                    Ok(_) => {}
                    Err(rumqttc::ConnectionError::RequestsDone) => {
                        debug!("MQTT client dropped, stopping event loop");
                        break;
                    }
                    Err(e) => {
                        error!("❌ MQTT connection error: {}", e);
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                }
            }
        });

        Self {
            client,
            topic_prefix: conf.topic_prefix.clone(),
            publish_timeout: Duration::from_secs(conf.publish_timeout_secs),
        }
    }
}

#[async_trait]
impl EventSink for MqttPublisher {
    async fn publish(&self, event: &PollEvent) -> Result<(), PublishError> {
        let payload = serde_json::to_vec(event)?;
        let topic = topic_for(&self.topic_prefix, event.kind);
        // The request queue stops draining while the broker is down
        let publish = self.client.publish(topic, QoS::AtLeastOnce, false, payload);
        match tokio::time::timeout(self.publish_timeout, publish).await {
            Ok(res) => Ok(res?),
            Err(_) => Err(PublishError::Timeout(self.publish_timeout)),
        }
    }

    async fn close(&self) {
        match tokio::time::timeout(self.publish_timeout, self.client.disconnect()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("Failed to disconnect from MQTT broker: {}", e),
            Err(_) => warn!("⚠️ MQTT disconnect timed out, dropping pending events"),
        }
    }
}

/// Writes one JSON document per event to stdout
pub struct ConsolePublisher {
    pretty: bool,
    stdout: Mutex<Stdout>,
}

impl ConsolePublisher {
    pub fn new(conf: &ConsoleConf) -> Self {
        Self {
            pretty: conf.pretty,
            stdout: Mutex::new(tokio::io::stdout()),
        }
    }

    pub fn encode(&self, event: &PollEvent) -> Result<Vec<u8>, serde_json::Error> {
        let mut line = if self.pretty {
            serde_json::to_vec_pretty(event)?
        } else {
            serde_json::to_vec(event)?
        };
        line.push(b'\n');
        Ok(line)
    }
}

#[async_trait]
impl EventSink for ConsolePublisher {
    async fn publish(&self, event: &PollEvent) -> Result<(), PublishError> {
        let line = self.encode(event)?;
        // stdout is shared by every scheduler; keep records whole
        let mut stdout = self.stdout.lock().await;
        stdout.write_all(&line).await?;
        stdout.flush().await?;
        Ok(())
    }
}
