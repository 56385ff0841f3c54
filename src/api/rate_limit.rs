use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use log::debug;

/// Enforces a minimum spacing between calls sharing the same key.
#[derive(Debug, Default)]
pub struct RateLimiter {
    last_calls: Mutex<HashMap<String, Instant>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleeps until a call for `key` is allowed, then records it.
    pub async fn wait_until_ready(&self, key: &str, interval: Duration) {
        loop {
            let wait = {
                let mut last_calls = self.last_calls.lock().await;
                let now = Instant::now();
                match last_calls.get(key) {
                    Some(last_call) if now.duration_since(*last_call) < interval => {
                        interval - now.duration_since(*last_call)
                    }
                    _ => {
                        last_calls.insert(key.to_string(), now);
                        return;
                    }
                }
            };
            debug!("Rate limit wait for {}: {}ms", key, wait.as_millis());
            tokio::time::sleep(wait).await;
        }
    }
}
