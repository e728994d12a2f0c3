//! Redis backend implementation.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use redis::{Client, RedisError, aio::ConnectionManager};
use smol_str::SmolStr;
use stowage_backend::{Backend, BackendError, BackendResult, Batch, Command, DeleteStatus};
use tokio::sync::OnceCell;
use tracing::trace;

use crate::error::Error;

/// How the backend reaches the Redis server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Any URL accepted by the `redis` crate.
    Url(String),
    /// TCP connection to `host:port`.
    Tcp { host: String, port: u16 },
    /// Unix domain socket.
    UnixSocket(PathBuf),
}

impl ConnectionMode {
    pub fn url(url: impl Into<String>) -> Self {
        Self::Url(url.into())
    }

    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self::Tcp {
            host: host.into(),
            port,
        }
    }

    pub fn unix_socket(path: impl Into<PathBuf>) -> Self {
        Self::UnixSocket(path.into())
    }

    /// Connection URL for [`Client::open`].
    pub fn to_url(&self) -> String {
        match self {
            ConnectionMode::Url(url) => url.clone(),
            ConnectionMode::Tcp { host, port } => format!("redis://{host}:{port}/"),
            ConnectionMode::UnixSocket(path) => format!("redis+unix://{}", path.display()),
        }
    }
}

impl Default for ConnectionMode {
    fn default() -> Self {
        Self::tcp("127.0.0.1", 6379)
    }
}

/// Redis cache backend based on redis-rs crate.
///
/// Entries are Redis hashes; command batches run as `MULTI`/`EXEC`
/// pipelines. The [`ConnectionManager`] is created on first use; clones
/// share it, including clones taken before that first use.
///
/// [`ConnectionManager`]: redis::aio::ConnectionManager
#[derive(Clone)]
pub struct RedisBackend {
    client: Client,
    connection: Arc<OnceCell<ConnectionManager>>,
    label: SmolStr,
}

impl RedisBackend {
    /// Creates new RedisBackend builder with default settings.
    #[must_use]
    pub fn builder() -> RedisBackendBuilder {
        RedisBackendBuilder::default()
    }

    /// Create lazy connection to redis via [`ConnectionManager`]
    pub async fn connection(&self) -> Result<&ConnectionManager, BackendError> {
        trace!("Get connection manager");
        let manager = self
            .connection
            .get_or_try_init(|| {
                trace!("Initialize new redis connection manager");
                self.client.get_connection_manager()
            })
            .await
            .map_err(Error::from)?;
        Ok(manager)
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// Part of builder pattern implementation for RedisBackend.
#[derive(Default)]
pub struct RedisBackendBuilder {
    connection: Option<ConnectionMode>,
    client: Option<Client>,
    label: Option<SmolStr>,
}

impl RedisBackendBuilder {
    /// Connect with the given mode. A client set with [`client`](Self::client)
    /// takes precedence.
    pub fn connection(mut self, mode: ConnectionMode) -> Self {
        self.connection = Some(mode);
        self
    }

    /// Use a pre-built client.
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Label used in logs and metrics. Defaults to `redis`.
    pub fn label(mut self, label: impl Into<SmolStr>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Create new instance of Redis backend with passed settings.
    ///
    /// No connection is made here.
    pub fn build(self) -> Result<RedisBackend, Error> {
        let client = match (self.client, self.connection) {
            (Some(client), _) => client,
            (None, Some(mode)) => Client::open(mode.to_url())?,
            (None, None) => return Err(Error::MissingConnectionMode),
        };
        Ok(RedisBackend {
            client,
            connection: Arc::new(OnceCell::new()),
            label: self.label.unwrap_or_else(|| SmolStr::new_static("redis")),
        })
    }
}

/// Milliseconds for `PEXPIRE`, rounded up so a sub-millisecond TTL does not
/// expire the key immediately.
fn expire_millis(ttl: Duration) -> u64 {
    let millis = ttl.as_nanos().div_ceil(1_000_000);
    u64::try_from(millis).unwrap_or(u64::MAX)
}

fn command_error(key: &str, error: RedisError) -> BackendError {
    if error.code() == Some("WRONGTYPE") {
        BackendError::WrongType {
            key: key.to_owned(),
        }
    } else {
        Error::from(error).into()
    }
}

#[async_trait]
impl Backend for RedisBackend {
    async fn read(&self, key: &str) -> BackendResult<Option<HashMap<String, Bytes>>> {
        let mut con = self.connection().await?.clone();
        let fields: HashMap<String, Vec<u8>> = redis::cmd("HGETALL")
            .arg(key)
            .query_async(&mut con)
            .await
            .map_err(|error| command_error(key, error))?;

        // HGETALL answers a missing key with an empty hash.
        if fields.is_empty() {
            return Ok(None);
        }
        Ok(Some(
            fields
                .into_iter()
                .map(|(name, value)| (name, Bytes::from(value)))
                .collect(),
        ))
    }

    async fn execute(&self, key: &str, batch: Batch) -> BackendResult<()> {
        let mut pipe = redis::pipe();
        pipe.atomic();
        let mut queued = 0usize;
        for command in batch {
            match command {
                Command::HashSet(fields) => {
                    if fields.is_empty() {
                        continue;
                    }
                    pipe.cmd("HSET").arg(key);
                    for (name, value) in &fields {
                        pipe.arg(name).arg(value.as_ref());
                    }
                }
                Command::Set(value) => {
                    pipe.cmd("SET").arg(key).arg(value.as_ref());
                }
                Command::Append(value) => {
                    pipe.cmd("APPEND").arg(key).arg(value.as_ref());
                }
                Command::IncrBy(delta) => {
                    pipe.cmd("INCRBY").arg(key).arg(delta);
                }
                Command::ExpireAt(at) => {
                    pipe.cmd("PEXPIREAT").arg(key).arg(at.timestamp_millis());
                }
                Command::Expire(ttl) => {
                    pipe.cmd("PEXPIRE").arg(key).arg(expire_millis(ttl));
                }
                Command::Delete => {
                    pipe.cmd("DEL").arg(key);
                }
            }
            pipe.ignore();
            queued += 1;
        }
        if queued == 0 {
            trace!(key, "Empty batch, nothing to execute");
            return Ok(());
        }

        let mut con = self.connection().await?.clone();
        pipe.query_async::<()>(&mut con)
            .await
            .map_err(|error| command_error(key, error))?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> BackendResult<DeleteStatus> {
        let mut con = self.connection().await?.clone();

        let deleted: i64 = redis::cmd("DEL")
            .arg(key)
            .query_async(&mut con)
            .await
            .map_err(Error::from)?;

        if deleted > 0 {
            Ok(DeleteStatus::Deleted(deleted as u32))
        } else {
            Ok(DeleteStatus::Missing)
        }
    }

    fn label(&self) -> &str {
        &self.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_urls() {
        assert_eq!(
            ConnectionMode::tcp("cache.local", 6380).to_url(),
            "redis://cache.local:6380/"
        );
        assert_eq!(
            ConnectionMode::unix_socket("/run/redis.sock").to_url(),
            "redis+unix:///run/redis.sock"
        );
        assert_eq!(
            ConnectionMode::url("redis://:secret@10.0.0.1/2").to_url(),
            "redis://:secret@10.0.0.1/2"
        );
        assert_eq!(ConnectionMode::default().to_url(), "redis://127.0.0.1:6379/");
    }

    #[test]
    fn test_expire_millis_rounds_up() {
        assert_eq!(expire_millis(Duration::ZERO), 0);
        assert_eq!(expire_millis(Duration::from_micros(1)), 1);
        assert_eq!(expire_millis(Duration::from_micros(1500)), 2);
        assert_eq!(expire_millis(Duration::from_secs(60)), 60_000);
        assert_eq!(expire_millis(Duration::MAX), u64::MAX);
    }

    #[test]
    fn test_clones_share_connection_cell() {
        let backend = RedisBackend::builder()
            .connection(ConnectionMode::tcp("127.0.0.1", 1))
            .build()
            .unwrap();
        let clone = backend.clone();

        assert!(Arc::ptr_eq(&backend.connection, &clone.connection));
    }

    #[test]
    fn test_build_requires_connection() {
        assert!(matches!(
            RedisBackend::builder().build(),
            Err(Error::MissingConnectionMode)
        ));
    }

    #[test]
    fn test_build_is_lazy() {
        let backend = RedisBackend::builder()
            .connection(ConnectionMode::tcp("127.0.0.1", 1))
            .label("sessions")
            .build()
            .unwrap();

        assert_eq!(backend.label(), "sessions");
    }

    #[test]
    fn test_prebuilt_client_wins() {
        let client = Client::open("redis://127.0.0.1:6379/").unwrap();
        let backend = RedisBackend::builder()
            .connection(ConnectionMode::url("not a url"))
            .client(client)
            .build();

        assert!(backend.is_ok());
    }

    #[test]
    fn test_invalid_url() {
        let backend = RedisBackend::builder()
            .connection(ConnectionMode::url("not a url"))
            .build();

        assert!(matches!(backend, Err(Error::Redis(_))));
    }
}
