use crate::core::{KvError, Result};
use crate::transaction::BackoffPolicy;
use serde::{Deserialize, Serialize};

/// Store connection configuration
///
/// # Examples
///
/// ```
/// use txnkv::StoreConfig;
///
/// let config = StoreConfig::new("10.0.0.7:2379").txn_retry(3);
/// assert_eq!(config.store_url(), "tikv://10.0.0.7:2379/pd?cluster=1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Placement driver (cluster) address, `host:port`
    pub pd_addr: String,

    /// Extra attempts a transaction gets after the first one fails
    pub txn_retry: usize,

    /// Backoff base in milliseconds
    pub backoff_base_ms: u64,

    /// Backoff cap in milliseconds
    pub backoff_cap_ms: u64,

    /// Sleep between transaction retries
    pub backoff_on_retry: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            pd_addr: "127.0.0.1:2379".to_string(),
            txn_retry: 10,
            backoff_base_ms: BackoffPolicy::DEFAULT_BASE_MS,
            backoff_cap_ms: BackoffPolicy::DEFAULT_CAP_MS,
            backoff_on_retry: true,
        }
    }
}

impl StoreConfig {
    pub fn new(pd_addr: &str) -> Self {
        Self {
            pd_addr: pd_addr.to_string(),
            ..Self::default()
        }
    }

    /// Set the retry count
    pub fn txn_retry(mut self, retries: usize) -> Self {
        self.txn_retry = retries;
        self
    }

    /// Set backoff base and cap (milliseconds)
    pub fn backoff(mut self, base_ms: u64, cap_ms: u64) -> Self {
        self.backoff_base_ms = base_ms;
        self.backoff_cap_ms = cap_ms;
        self
    }

    /// Enable or disable sleeping between retries
    pub fn backoff_on_retry(mut self, enabled: bool) -> Self {
        self.backoff_on_retry = enabled;
        self
    }

    /// Parse from JSON; missing fields take their defaults
    ///
    /// ```
    /// # use txnkv::StoreConfig;
    /// let config = StoreConfig::from_json(r#"{"pd_addr": "pd:2379", "txn_retry": 2}"#).unwrap();
    /// assert_eq!(config.txn_retry, 2);
    /// assert!(config.backoff_on_retry);
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.pd_addr.trim().is_empty() {
            return Err(KvError::Config("pd_addr must not be empty".to_string()));
        }
        if self.backoff_cap_ms < self.backoff_base_ms {
            return Err(KvError::Config(format!(
                "backoff_cap_ms ({}) is smaller than backoff_base_ms ({})",
                self.backoff_cap_ms, self.backoff_base_ms
            )));
        }
        Ok(())
    }

    /// URL handed to the storage driver
    pub fn store_url(&self) -> String {
        format!("tikv://{}/pd?cluster=1", self.pd_addr)
    }

    pub fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy::new(self.backoff_base_ms, self.backoff_cap_ms)
    }
}
