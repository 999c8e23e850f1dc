//! Redis-backed configuration sink.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use url::Url;

use crate::upload::sink::{ConfigSink, SinkError};

/// Connection settings for [`RedisSink`].
#[derive(Debug, Clone)]
pub struct RedisSettings {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
            password: None,
        }
    }
}

impl RedisSettings {
    /// `redis://` URL with the password percent-encoded.
    pub fn url(&self) -> Result<Url, SinkError> {
        let mut url = Url::parse(&format!("redis://{}:{}/", self.host, self.port))
            .map_err(|e| SinkError::Address(format!("{}:{}: {}", self.host, self.port, e)))?;
        if let Some(password) = &self.password {
            url.set_password(Some(password))
                .map_err(|_| SinkError::Address(format!("cannot set password for {}", self.host)))?;
        }
        Ok(url)
    }
}

/// Writes keys with plain `SET` over one multiplexed connection.
#[derive(Clone)]
pub struct RedisSink {
    conn: MultiplexedConnection,
}

impl RedisSink {
    /// Connect and verify the server is reachable.
    pub async fn connect(settings: &RedisSettings) -> Result<Self, SinkError> {
        let client = redis::Client::open(settings.url()?.as_str())?;
        let mut conn = client.get_multiplexed_async_connection().await?;
        redis::cmd("PING").query_async::<_, ()>(&mut conn).await?;

        tracing::info!(host = %settings.host, port = settings.port, "Connected to redis");
        Ok(Self { conn })
    }
}

#[async_trait]
impl ConfigSink for RedisSink {
    async fn put(&self, key: &str, value: &str) -> Result<(), SinkError> {
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(key, value).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
