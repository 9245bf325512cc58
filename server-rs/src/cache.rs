use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

use crate::error::AppResult;

/// Thin Redis wrapper. Failures on reads and writes degrade to cache misses.
#[derive(Clone)]
pub struct Cache {
    conn: ConnectionManager,
    prefix: String,
}

impl Cache {
    pub async fn connect(url: &str) -> AppResult<Self> {
        let client = Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self {
            conn,
            prefix: "ffarena:".to_string(),
        })
    }

    fn key(&self, k: &str) -> String {
        format!("{}{}", self.prefix, k)
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let mut conn = self.conn.clone();
        redis::cmd("GET")
            .arg(self.key(key))
            .query_async::<_, Option<String>>(&mut conn)
            .await
            .ok()
            .flatten()
    }

    pub async fn get_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get(key)
            .await
            .and_then(|s| serde_json::from_str(&s).ok())
    }

    pub async fn set(&self, key: &str, value: &str, ttl_secs: u64) {
        let mut conn = self.conn.clone();
        let k = self.key(key);
        let res: Result<(), _> = if ttl_secs > 0 {
            conn.set_ex(&k, value, ttl_secs).await
        } else {
            conn.set(&k, value).await
        };
        if let Err(e) = res {
            tracing::warn!("cache write failed for {k}: {e}");
        }
    }

    pub async fn set_json<T: serde::Serialize>(&self, key: &str, value: &T, ttl_secs: u64) {
        if let Ok(json) = serde_json::to_string(value) {
            self.set(key, &json, ttl_secs).await;
        }
    }

    pub async fn del(&self, key: &str) {
        let mut conn = self.conn.clone();
        let k = self.key(key);
        if let Err(e) = conn.del::<_, ()>(&k).await {
            tracing::warn!("cache delete failed for {k}: {e}");
        }
    }

    /// Atomically increments a counter, creating it at zero first.
    pub async fn incr(&self, key: &str) -> Option<i64> {
        let mut conn = self.conn.clone();
        let k = self.key(key);
        match conn.incr::<_, _, i64>(&k, 1).await {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("cache incr failed for {k}: {e}");
                None
            }
        }
    }

    pub async fn health_check(&self) -> bool {
        let mut conn = self.conn.clone();
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .is_ok()
    }
}
