use super::broker::{Broker, BrokerError, Delivery, DeliveryStream};
use async_trait::async_trait;
use futures_util::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

pub const RECONNECT_INTERVAL: Duration = Duration::from_secs(10);
pub const MAX_DOWNTIME: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Error)]
pub enum SubscriptionError {
    #[error("broker unreachable for {downtime:?} after {attempts} attempts, shutting down")]
    Exhausted { attempts: u32, downtime: Duration },
}

/// Fixed-interval reconnect policy that gives up once a failure streak has
/// lasted `max_downtime`, however many attempts that took.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub interval: Duration,
    pub max_downtime: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            interval: RECONNECT_INTERVAL,
            max_downtime: MAX_DOWNTIME,
        }
    }
}

impl RetryPolicy {
    pub async fn wait(&self, attempts: u32, elapsed: Duration) -> Result<(), SubscriptionError> {
        if elapsed >= self.max_downtime {
            return Err(SubscriptionError::Exhausted {
                attempts,
                downtime: elapsed,
            });
        }

        debug!(
            "Waiting {:?} for the broker (#{}, down for {:?})",
            self.interval, attempts, elapsed
        );
        tokio::time::sleep(self.interval).await;
        Ok(())
    }
}

/// Callbacks driven by [`Subscription::run`].
#[async_trait]
pub trait SubscriptionHandler: Send + Sync {
    /// Errors are logged by the loop and never stop it.
    async fn on_message(&self, payload: &[u8]) -> anyhow::Result<()>;

    /// Called after every broker error. Returning an error ends the loop.
    async fn on_retry(&self, attempts: u32, elapsed: Duration) -> Result<(), SubscriptionError> {
        RetryPolicy::default().wait(attempts, elapsed).await
    }

    /// Called once a subscription succeeds after one or more failures.
    async fn on_established(&self, downtime: Duration) -> Result<(), SubscriptionError> {
        info!("Broker connection established. Downtime: {:?}", downtime);
        Ok(())
    }
}

enum SubscriptionState {
    Subscribing,
    Receiving(DeliveryStream),
}

#[derive(Default)]
struct FailureStreak {
    attempts: u32,
    started: Option<Instant>,
}

impl FailureStreak {
    fn record(&mut self) -> (u32, Duration) {
        let started = *self.started.get_or_insert_with(Instant::now);
        self.attempts += 1;
        (self.attempts, started.elapsed())
    }

    /// Ends the streak, returning how long it lasted if there was one.
    fn reset(&mut self) -> Option<Duration> {
        if self.attempts == 0 {
            return None;
        }
        let downtime = self.started.map(|t| t.elapsed()).unwrap_or_default();
        *self = Self::default();
        Some(downtime)
    }
}

/// Long-lived subscription to one channel. Deliveries are handled one at a
/// time; the next one is not read until the handler returns.
pub struct Subscription<H> {
    broker: Arc<dyn Broker>,
    channel: String,
    handler: Arc<H>,
    shutdown: CancellationToken,
}

impl<H: SubscriptionHandler> Subscription<H> {
    pub fn new(
        broker: Arc<dyn Broker>,
        channel: impl Into<String>,
        handler: Arc<H>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            broker,
            channel: channel.into(),
            handler,
            shutdown,
        }
    }

    /// Runs until the retry policy gives up (`Err`) or shutdown is requested
    /// (`Ok`). Shutdown is only observed between deliveries and during
    /// reconnect waits, never while a message is being handled.
    pub async fn run(&self) -> Result<(), SubscriptionError> {
        let mut streak = FailureStreak::default();
        let mut state = SubscriptionState::Subscribing;

        loop {
            state = match state {
                SubscriptionState::Subscribing => {
                    let subscribed = tokio::select! {
                        biased;
                        _ = self.shutdown.cancelled() => return Ok(()),
                        result = self.broker.subscribe(&self.channel) => result,
                    };

                    match subscribed {
                        Ok(stream) => {
                            if let Some(downtime) = streak.reset() {
                                self.handler.on_established(downtime).await?;
                            }
                            info!("👂 Listening on '{}'", self.channel);
                            SubscriptionState::Receiving(stream)
                        }
                        Err(e) => {
                            if !self.back_off(&mut streak, e).await? {
                                return Ok(());
                            }
                            SubscriptionState::Subscribing
                        }
                    }
                }
                SubscriptionState::Receiving(mut stream) => {
                    let delivery = tokio::select! {
                        biased;
                        _ = self.shutdown.cancelled() => return Ok(()),
                        delivery = stream.next() => delivery,
                    };

                    match delivery {
                        Some(Delivery::Message(payload)) => {
                            if let Err(e) = self.handler.on_message(&payload).await {
                                error!("❌ {:#}", e);
                            }
                            SubscriptionState::Receiving(stream)
                        }
                        Some(Delivery::Error(e)) => {
                            drop(stream);
                            if !self.back_off(&mut streak, e).await? {
                                return Ok(());
                            }
                            SubscriptionState::Subscribing
                        }
                        None => {
                            drop(stream);
                            if !self.back_off(&mut streak, BrokerError::Disconnected).await? {
                                return Ok(());
                            }
                            SubscriptionState::Subscribing
                        }
                    }
                }
            };
        }
    }

    // Returns false when shutdown was requested while waiting.
    async fn back_off(
        &self,
        streak: &mut FailureStreak,
        cause: BrokerError,
    ) -> Result<bool, SubscriptionError> {
        let (attempts, elapsed) = streak.record();
        error!("Broker connection refused: {}", cause);

        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => Ok(false),
            result = self.handler.on_retry(attempts, elapsed) => result.map(|_| true),
        }
    }
}
