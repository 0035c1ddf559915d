use redis::aio::MultiplexedConnection;
use redis::{Client, RedisResult};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

struct IdleConnection {
    conn: MultiplexedConnection,
    since: Instant,
}

/// Small pool of command connections. Idle connections are capped at
/// `max_idle`, dropped after `idle_timeout` and pinged before reuse.
pub struct RedisPool {
    client: Client,
    max_idle: usize,
    idle_timeout: Duration,
    idle: Mutex<VecDeque<IdleConnection>>,
}

impl RedisPool {
    pub fn new(client: Client, max_idle: usize, idle_timeout: Duration) -> Self {
        Self {
            client,
            max_idle,
            idle_timeout,
            idle: Mutex::new(VecDeque::new()),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub async fn get(&self) -> RedisResult<MultiplexedConnection> {
        while let Some(idle) = self.take_idle() {
            if idle.since.elapsed() > self.idle_timeout {
                debug!("Dropping Redis connection idle for {:?}", idle.since.elapsed());
                continue;
            }
            let mut conn = idle.conn;
            if ping(&mut conn).await.is_ok() {
                return Ok(conn);
            }
        }
        self.dial().await
    }

    /// Hands a healthy connection back. Connections past the idle cap are
    /// closed.
    pub fn put(&self, conn: MultiplexedConnection) {
        let Ok(mut idle) = self.idle.lock() else {
            return;
        };
        idle.retain(|c| c.since.elapsed() <= self.idle_timeout);
        if idle.len() < self.max_idle {
            idle.push_back(IdleConnection {
                conn,
                since: Instant::now(),
            });
        }
    }

    async fn dial(&self) -> RedisResult<MultiplexedConnection> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        ping(&mut conn).await?;
        Ok(conn)
    }

    fn take_idle(&self) -> Option<IdleConnection> {
        // Most recently returned first keeps the freshest connections warm
        self.idle.lock().ok()?.pop_back()
    }
}

async fn ping(conn: &mut MultiplexedConnection) -> RedisResult<()> {
    let _: String = redis::cmd("PING").query_async(conn).await?;
    Ok(())
}
