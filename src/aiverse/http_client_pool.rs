//! HTTP client pool for maintaining persistent connections per base URL.
//!
//! Tools and model providers are called concurrently by several agents at once, so they share
//! one `reqwest::Client` per base URL instead of building a fresh client per request. This keeps
//! TCP/TLS connections alive between calls and makes the clients safe for concurrent use (a
//! `reqwest::Client` is an `Arc` around its connection pool).

use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

lazy_static! {
    /// Global HTTP client pool, lazily initialized on first access.
    static ref HTTP_CLIENT_POOL: Mutex<HashMap<String, reqwest::Client>> =
        Mutex::new(HashMap::new());
}

/// Get or create the shared HTTP client for the given base URL.
pub fn get_http_client(base_url: &str) -> reqwest::Client {
    let mut pool = match HTTP_CLIENT_POOL.lock() {
        Ok(pool) => pool,
        // A panic while holding the lock cannot leave the map half-written; keep using it.
        Err(poisoned) => poisoned.into_inner(),
    };

    if let Some(client) = pool.get(base_url) {
        return client.clone();
    }

    let client = create_pooled_client();
    pool.insert(base_url.to_string(), client.clone());
    client
}

/// Build a client tuned for keep-alive connections.
///
/// - `pool_idle_timeout(90s)`: idle connections stay open for 90 seconds
/// - `pool_max_idle_per_host(10)`: up to 10 idle connections per host
/// - `tcp_keepalive(60s)`: keepalive probes every 60 seconds
/// - `timeout(300s)`: upper bound for a single request, model calls can be slow
fn create_pooled_client() -> reqwest::Client {
    let builder = reqwest::ClientBuilder::new()
        .pool_idle_timeout(Some(Duration::from_secs(90)))
        .pool_max_idle_per_host(10)
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .timeout(Duration::from_secs(300));

    match builder.build() {
        Ok(client) => client,
        Err(err) => {
            log::error!(
                "aiverse::http_client_pool::create_pooled_client(): falling back to default client: {}",
                err
            );
            reqwest::Client::new()
        }
    }
}
