//! Log Producer Module
//!
//! Emits login events onto the audit-log bus. The downstream consumer
//! ingests the `user_login` topic; this side only produces.

use std::time::Duration;

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use serde::Serialize;
use tracing::{error, instrument};

use crate::config::ProducerSettings;
use crate::shared::error::AppError;

const USER_LOGIN_TOPIC: &str = "user_login";

const PRODUCE_TIMEOUT: Duration = Duration::from_secs(5);

/// One login event on the bus.
#[derive(Debug, Clone, Serialize)]
pub struct LoginLog {
    pub user_id: String,
    pub remote_ip: String,
}

/// Trait for the audit-log producer.
#[async_trait]
pub trait LogProducer: Send + Sync {
    /// Emit a login event. The call blocks until the broker acknowledges
    /// the message or the produce timeout elapses.
    async fn emit_login(&self, login: &LoginLog) -> Result<(), AppError>;
}

/// Kafka implementation of [`LogProducer`].
pub struct KafkaLogProducer {
    producer: FutureProducer,
}

impl KafkaLogProducer {
    pub fn new(settings: &ProducerSettings) -> Result<Self, AppError> {
        let producer = ClientConfig::new()
            .set("bootstrap.servers", &settings.bootstrap_servers)
            .create()
            .map_err(|e| AppError::Internal(format!("failed to create kafka producer: {}", e)))?;

        Ok(Self { producer })
    }
}

#[async_trait]
impl LogProducer for KafkaLogProducer {
    #[instrument(skip(self), fields(user_id = %login.user_id))]
    async fn emit_login(&self, login: &LoginLog) -> Result<(), AppError> {
        let payload = serde_json::to_string(login)
            .map_err(|e| AppError::Internal(format!("failed to serialize login log: {}", e)))?;

        self.producer
            .send(
                FutureRecord::<(), _>::to(USER_LOGIN_TOPIC).payload(&payload),
                Timeout::After(PRODUCE_TIMEOUT),
            )
            .await
            .map_err(|(e, _)| {
                error!(error = %e, "failed to produce login log");
                AppError::Internal(format!("failed to produce login log: {}", e))
            })?;

        Ok(())
    }
}
