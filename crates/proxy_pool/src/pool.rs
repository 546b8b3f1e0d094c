use std::collections::HashMap;
use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Username/password pair carried by an authenticated proxy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyAuth {
    /// Proxy username
    pub username: String,
    /// Proxy password
    pub password: String,
}

/// A single parsed proxy credential. Immutable once parsed; equality is by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyCredential {
    /// Proxy scheme, `http` for list-imported entries
    pub protocol: String,
    /// Proxy hostname or IP
    pub host: String,
    /// Proxy port
    pub port: u16,
    /// Optional credentials
    pub auth: Option<ProxyAuth>,
}

/// Custom error type for proxy operations
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// Malformed proxy list entry
    #[error("Malformed proxy entry: {0}")]
    ParseError(String),

    /// No backing list loaded for the requested category
    #[error("No proxy category loaded for '{0}'")]
    CategoryNotFound(String),

    /// The category's backing list is empty
    #[error("Proxy pool for '{0}' has no entries")]
    PoolExhausted(String),

    /// Proxy URL failed validation
    #[error("Invalid proxy URL: {0}")]
    InvalidProxyUrl(String),

    /// Proxy list file could not be read
    #[error("Failed to read proxy list: {0}")]
    Io(#[from] std::io::Error),
}

/// Parse one `host:port` or `host:port:user:pass` proxy list line.
/// Trailing carriage returns on the password are stripped.
pub fn parse_proxy_line(line: &str) -> Result<ProxyCredential, ProxyError> {
    let trimmed = line.trim_end_matches(['\r', '\n']).trim();
    let parts: Vec<&str> = trimmed.split(':').collect();

    let (host, port, auth) = match parts.as_slice() {
        [host, port] => (*host, *port, None),
        [host, port, username, password] => (
            *host,
            *port,
            Some(ProxyAuth {
                username: (*username).to_string(),
                password: password.trim_end_matches('\r').to_string(),
            }),
        ),
        _ => return Err(ProxyError::ParseError(trimmed.to_string())),
    };

    if host.is_empty() {
        return Err(ProxyError::ParseError(trimmed.to_string()));
    }

    let port: u16 = port
        .parse()
        .map_err(|_| ProxyError::ParseError(trimmed.to_string()))?;

    Ok(ProxyCredential {
        protocol: "http".to_string(),
        host: host.to_string(),
        port,
        auth,
    })
}

/// Outcome of loading one category's raw entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    /// Entries parsed into the backing list
    pub loaded: usize,
    /// Malformed entries skipped
    pub skipped: usize,
}

/// One category's lists: the immutable source of truth and the draw pool
struct CategoryPool {
    backing: Vec<ProxyCredential>,
    working: Vec<ProxyCredential>,
}

/// Per-category proxy inventories with random draw-without-replacement.
///
/// Each category keeps an immutable backing list and a mutable working
/// list. Draws remove a uniformly random entry from the working list so
/// the same egress IP is not reused until the whole pool has cycled;
/// an empty working list is refilled in full from the backing list.
pub struct ProxyPool {
    categories: Mutex<HashMap<String, CategoryPool>>,
}

impl ProxyPool {
    /// Create an empty pool with no categories loaded
    pub fn new() -> Self {
        Self {
            categories: Mutex::new(HashMap::new()),
        }
    }

    /// Parse a newline-delimited blob into `category`'s backing list and a
    /// fresh working copy. Malformed lines are skipped and counted, never
    /// fatal. Reloading a category replaces both lists.
    pub async fn load_category(&self, category: &str, raw: &str) -> LoadReport {
        let mut backing = Vec::new();
        let mut skipped = 0;

        for line in raw.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match parse_proxy_line(line) {
                Ok(credential) => backing.push(credential),
                Err(e) => {
                    warn!("Skipping proxy entry for category {}: {}", category, e);
                    skipped += 1;
                }
            }
        }

        let report = LoadReport {
            loaded: backing.len(),
            skipped,
        };

        let working = backing.clone();
        self.categories
            .lock()
            .await
            .insert(category.to_string(), CategoryPool { backing, working });

        info!(
            "{} proxies imported for category: {} ({} skipped)",
            report.loaded, category, report.skipped
        );
        report
    }

    /// Load every `<category>.txt` file under `dir`. A missing directory or
    /// empty file leaves the category empty rather than failing.
    pub async fn import_dir(&self, dir: &Path) -> Result<(), ProxyError> {
        if !dir.is_dir() {
            warn!("Proxy directory not found: {}", dir.display());
            return Ok(());
        }

        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("txt") {
                continue;
            }
            let Some(category) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let raw = std::fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                info!("No proxies found for category: {}", category);
                continue;
            }
            self.load_category(category, &raw).await;
        }

        Ok(())
    }

    /// Remove and return one credential chosen uniformly at random from
    /// `category`'s working list, refilling the working list from the
    /// backing list when it is empty.
    ///
    /// The check-empty, refill, and remove steps run under one lock so
    /// concurrent draws cannot double-refill or pick the same index.
    pub async fn draw(&self, category: &str) -> Result<ProxyCredential, ProxyError> {
        let mut categories = self.categories.lock().await;
        let pool = categories
            .get_mut(category)
            .ok_or_else(|| ProxyError::CategoryNotFound(category.to_string()))?;

        if pool.working.is_empty() {
            if pool.backing.is_empty() {
                return Err(ProxyError::PoolExhausted(category.to_string()));
            }
            pool.working = pool.backing.clone();
        }

        let index = rand::rng().random_range(0..pool.working.len());
        Ok(pool.working.swap_remove(index))
    }

    /// Number of credentials left in `category`'s working list before the
    /// next refill; 0 for unknown categories.
    pub async fn remaining(&self, category: &str) -> usize {
        self.categories
            .lock()
            .await
            .get(category)
            .map_or(0, |pool| pool.working.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const RAW_LIST: &str =
        "10.0.0.1:8080:alice:pw1\n10.0.0.2:8080:bob:pw2\n10.0.0.3:8080:carol:pw3\n";

    #[test]
    fn test_parse_proxy_line_with_auth() {
        let credential = parse_proxy_line("10.0.0.1:8080:alice:secret\r").unwrap();
        assert_eq!(credential.host, "10.0.0.1");
        assert_eq!(credential.port, 8080);
        assert_eq!(credential.protocol, "http");
        let auth = credential.auth.unwrap();
        assert_eq!(auth.username, "alice");
        assert_eq!(auth.password, "secret");
    }

    #[test]
    fn test_parse_proxy_line_without_auth() {
        let credential = parse_proxy_line("proxy.example.com:3128").unwrap();
        assert_eq!(credential.host, "proxy.example.com");
        assert_eq!(credential.port, 3128);
        assert!(credential.auth.is_none());
    }

    #[test]
    fn test_parse_proxy_line_malformed() {
        assert!(parse_proxy_line("").is_err());
        assert!(parse_proxy_line("only-a-host").is_err());
        assert!(parse_proxy_line(":8080:user:pass").is_err());
        assert!(parse_proxy_line("host:not-a-port:user:pass").is_err());
        assert!(parse_proxy_line("a:b:c").is_err());
    }

    #[tokio::test]
    async fn test_load_category_skips_malformed_entries() {
        let pool = ProxyPool::new();
        let report = pool
            .load_category("mixed", "10.0.0.1:8080:u:p\nbroken line\n10.0.0.2:8080:u:p\n")
            .await;
        assert_eq!(report.loaded, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(pool.remaining("mixed").await, 2);
    }

    #[tokio::test]
    async fn test_draw_without_replacement_then_refill() {
        let pool = ProxyPool::new();
        pool.load_category("test", RAW_LIST).await;

        let mut seen = HashSet::new();
        for _ in 0..3 {
            let credential = pool.draw("test").await.unwrap();
            assert!(seen.insert(credential.host.clone()), "duplicate draw");
        }
        assert_eq!(seen.len(), 3);
        assert_eq!(pool.remaining("test").await, 0);

        // Fourth draw refills from the backing list and succeeds.
        let refilled = pool.draw("test").await.unwrap();
        assert!(seen.contains(&refilled.host));
        assert_eq!(pool.remaining("test").await, 2);
    }

    #[tokio::test]
    async fn test_draw_unknown_category() {
        let pool = ProxyPool::new();
        assert!(matches!(
            pool.draw("nope").await,
            Err(ProxyError::CategoryNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_draw_exhausted_backing_list() {
        let pool = ProxyPool::new();
        pool.load_category("empty", "garbage\n").await;
        assert!(matches!(
            pool.draw("empty").await,
            Err(ProxyError::PoolExhausted(_))
        ));
    }

    #[tokio::test]
    async fn test_pools_do_not_share_working_state() {
        let first = ProxyPool::new();
        let second = ProxyPool::new();
        first.load_category("test", RAW_LIST).await;
        second.load_category("test", RAW_LIST).await;

        first.draw("test").await.unwrap();
        first.draw("test").await.unwrap();

        assert_eq!(first.remaining("test").await, 1);
        assert_eq!(second.remaining("test").await, 3);
    }

    #[tokio::test]
    async fn test_concurrent_draws_stay_distinct() {
        use std::sync::Arc;

        let pool = Arc::new(ProxyPool::new());
        pool.load_category("test", RAW_LIST).await;

        let mut handles = Vec::new();
        for _ in 0..3 {
            let pool = pool.clone();
            handles.push(tokio::spawn(async move { pool.draw("test").await }));
        }

        let mut seen = HashSet::new();
        for handle in handles {
            let credential = handle.await.unwrap().unwrap();
            assert!(seen.insert(credential.host));
        }
        assert_eq!(seen.len(), 3);
    }
}
