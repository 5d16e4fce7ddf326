//! Redis-backed deny-list of revoked access tokens.

use redis::{AsyncCommands, Client, RedisError, aio::MultiplexedConnection};

const REVOKED_PREFIX: &str = "ivs:revoked:";

#[derive(Clone)]
pub struct TokenCache {
    client: Client,
}

impl TokenCache {
    /// Open a client and make sure the server answers `PING`.
    pub async fn connect(url: &str) -> Result<Self, RedisError> {
        let client = Client::open(url)?;
        let mut con = client.get_multiplexed_async_connection().await?;
        let pong: String = redis::cmd("PING").query_async(&mut con).await?;
        tracing::debug!("Redis answered {pong}");

        Ok(Self { client })
    }

    async fn connection(&self) -> Result<MultiplexedConnection, RedisError> {
        self.client.get_multiplexed_async_connection().await
    }

    /// Mark a token id as revoked for `ttl_secs` (at least one second).
    pub async fn revoke(&self, token_id: &str, ttl_secs: u64) -> Result<(), RedisError> {
        let mut con = self.connection().await?;
        con.set_ex::<_, _, ()>(revoked_key(token_id), 1u8, ttl_secs.max(1))
            .await
    }

    pub async fn is_revoked(&self, token_id: &str) -> Result<bool, RedisError> {
        let mut con = self.connection().await?;
        con.exists(revoked_key(token_id)).await
    }
}

fn revoked_key(token_id: &str) -> String {
    format!("{REVOKED_PREFIX}{token_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revoked_key() {
        assert_eq!(revoked_key("abc"), "ivs:revoked:abc");
    }
}
