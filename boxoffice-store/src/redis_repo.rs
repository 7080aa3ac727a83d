use async_trait::async_trait;
use boxoffice_core::{LeaseStore, StoreError, StoreResult};
use boxoffice_shared::LeaseKey;
use redis::AsyncCommands;
use tracing::{error, info};

/// Seat hold leases kept in Redis under `hold:{event_id}:{seat_number}`
#[derive(Clone)]
pub struct RedisLeaseStore {
    client: redis::Client,
}

fn lease_error(e: redis::RedisError) -> StoreError {
    error!("Lease store command failed: {}", e);
    StoreError::LeaseStore(e.to_string())
}

impl RedisLeaseStore {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client })
    }

    async fn connection(&self) -> StoreResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(lease_error)
    }
}

#[async_trait]
impl LeaseStore for RedisLeaseStore {
    async fn acquire(&self, key: &LeaseKey, owner: &str, ttl_seconds: u64) -> StoreResult<bool> {
        let mut conn = self.connection().await?;

        // SET NX: Only set if key does not exist
        let result: Option<String> = redis::cmd("SET")
            .arg(key.as_str())
            .arg(owner)
            .arg("NX")
            .arg("EX")
            .arg(ttl_seconds)
            .query_async(&mut conn)
            .await
            .map_err(lease_error)?;

        if result.is_some() {
            info!("Lease acquired: {} -> {}", key, owner);
        }
        Ok(result.is_some())
    }

    async fn read_owner(&self, key: &LeaseKey) -> StoreResult<Option<String>> {
        let mut conn = self.connection().await?;
        let owner: Option<String> = conn.get(key.as_str()).await.map_err(lease_error)?;
        Ok(owner)
    }

    async fn release(&self, key: &LeaseKey) -> StoreResult<bool> {
        let mut conn = self.connection().await?;
        let removed: i64 = conn.del(key.as_str()).await.map_err(lease_error)?;
        Ok(removed == 1)
    }

    async fn ping(&self) -> bool {
        let mut conn = match self.client.get_multiplexed_async_connection().await {
            Ok(conn) => conn,
            Err(e) => {
                error!("Redis connection check failed: {}", e);
                return false;
            }
        };

        match redis::cmd("PING").query_async::<String>(&mut conn).await {
            Ok(_) => true,
            Err(e) => {
                error!("Redis connection check failed: {}", e);
                false
            }
        }
    }
}
