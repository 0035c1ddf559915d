use async_trait::async_trait;
use futures_util::stream::BoxStream;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("subscription closed by the broker")]
    Disconnected,
}

/// What a live subscription yields. Messages and connection errors arrive on
/// the same stream, in order.
#[derive(Debug)]
pub enum Delivery {
    Message(Vec<u8>),
    Error(BrokerError),
}

pub type DeliveryStream = BoxStream<'static, Delivery>;

/// Fire-and-forget publish/subscribe transport.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Opens a fresh subscription. A stream that ends is treated as a dropped
    /// connection by the caller.
    async fn subscribe(&self, channel: &str) -> Result<DeliveryStream, BrokerError>;

    async fn publish(&self, channel: &str, payload: String) -> Result<(), BrokerError>;
}
