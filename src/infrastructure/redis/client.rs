use crate::infrastructure::queue::broker::{Broker, BrokerError, Delivery, DeliveryStream};
use crate::infrastructure::redis::pool::RedisPool;
use async_trait::async_trait;
use futures_util::StreamExt;
use redis::{AsyncCommands, Client};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Clone)]
pub struct RedisService {
    pool: Arc<RedisPool>,
}

impl RedisService {
    pub fn new(
        connection_string: &str,
        max_idle: usize,
        idle_timeout: Duration,
    ) -> Result<Self, redis::RedisError> {
        let client = Client::open(connection_string)?;
        Ok(Self {
            pool: Arc::new(RedisPool::new(client, max_idle, idle_timeout)),
        })
    }

    // Test connection
    pub async fn check(&self) -> Result<(), redis::RedisError> {
        let conn = self.pool.get().await?;
        self.pool.put(conn);
        info!("✅ Connected to Redis");
        Ok(())
    }
}

#[async_trait]
impl Broker for RedisService {
    async fn subscribe(&self, channel: &str) -> Result<DeliveryStream, BrokerError> {
        // Pub/sub takes over the whole connection, so it never comes from the pool
        let mut pubsub = self.pool.client().get_async_pubsub().await?;
        pubsub.subscribe(channel).await?;

        let deliveries = pubsub
            .into_on_message()
            .map(|msg| Delivery::Message(msg.get_payload_bytes().to_vec()));
        Ok(deliveries.boxed())
    }

    async fn publish(&self, channel: &str, payload: String) -> Result<(), BrokerError> {
        let mut conn = self.pool.get().await?;
        let _: i64 = conn.publish(channel, payload).await?;
        self.pool.put(conn);
        Ok(())
    }
}
