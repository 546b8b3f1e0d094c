use std::path::{Path, PathBuf};
use std::time::Duration;

use flight_scan::{DateWindow, RouteConfig, ScanError};
use serde::Deserialize;
use validator::Validate;

fn default_cooldown_ms() -> u64 {
    20_000
}

fn default_proxy_category() -> String {
    "packetstream-gb".to_string()
}

fn default_proxy_dir() -> PathBuf {
    PathBuf::from("proxy-files")
}

fn default_check_out_flights() -> bool {
    true
}

fn default_passengers() -> u32 {
    1
}

/// Process-wide configuration. The flat top-level route fields are the
/// legacy single-route surface; `flights` is the multi-route surface and
/// takes precedence whenever it is non-empty.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Milliseconds between poll ticks, measured from batch completion
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_time: u64,

    /// Default notification target when a route has no webhook of its own
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Proxy category used for outbound feed requests
    #[serde(default = "default_proxy_category")]
    pub proxy_category: String,

    /// Directory holding one `<category>.txt` proxy list per category
    #[serde(default = "default_proxy_dir")]
    pub proxy_dir: PathBuf,

    // Legacy flat configuration for backwards compatibility
    /// Whether the legacy route checks its outbound leg
    #[serde(default = "default_check_out_flights")]
    pub check_out_flights: bool,
    /// Whether the legacy route checks its inbound leg
    #[serde(default)]
    pub check_return_flights: bool,
    /// Legacy departure city code
    #[serde(default)]
    pub base_location: String,
    /// Legacy departure airport code
    #[serde(default)]
    pub base_airport: String,
    /// Legacy destination city code
    #[serde(default)]
    pub destination: String,
    /// Legacy destination airport code
    #[serde(default)]
    pub destination_airport: String,
    /// Legacy passenger count
    #[serde(default = "default_passengers")]
    pub passengers: u32,
    /// Legacy outbound travel window
    #[serde(default)]
    pub outbound: DateWindow,
    /// Legacy inbound travel window
    #[serde(default)]
    pub inbound: DateWindow,

    /// Multi-route configuration; preferred over the legacy flat fields
    #[serde(default)]
    pub flights: Vec<RouteConfig>,
}

impl Config {
    /// Load configuration from a JSON file, validating every route
    pub fn load(path: &Path) -> Result<Self, ScanError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ScanError::ConfigError(format!("failed to read {}: {e}", path.display()))
        })?;
        let config: Config = serde_json::from_str(&raw).map_err(|e| {
            ScanError::ConfigError(format!("failed to parse {}: {e}", path.display()))
        })?;

        for route in &config.flights {
            route
                .validate()
                .map_err(|e| ScanError::ConfigError(format!("invalid route '{}': {e}", route.name)))?;
        }

        Ok(config)
    }

    /// Cooldown between poll ticks
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_time)
    }

    /// The route set for one tick: configured routes with `enabled` not
    /// false, or a single synthesized legacy route when none are
    /// configured. Configured-but-all-disabled yields an empty set; the
    /// caller logs and skips the tick.
    pub fn active_routes(&self) -> Vec<RouteConfig> {
        if !self.flights.is_empty() {
            return self
                .flights
                .iter()
                .filter(|route| route.enabled)
                .cloned()
                .collect();
        }
        vec![self.legacy_route()]
    }

    fn legacy_route(&self) -> RouteConfig {
        let mut outbound = self.outbound.clone();
        outbound.enabled = outbound.enabled && self.check_out_flights;
        let mut inbound = self.inbound.clone();
        inbound.enabled = inbound.enabled && self.check_return_flights;

        RouteConfig {
            name: format!("{} to {}", self.base_location, self.destination),
            enabled: true,
            base_location: self.base_location.clone(),
            base_airport: if self.base_airport.is_empty() {
                self.base_location.clone()
            } else {
                self.base_airport.clone()
            },
            destination: self.destination.clone(),
            destination_airport: if self.destination_airport.is_empty() {
                self.destination.clone()
            } else {
                self.destination_airport.clone()
            },
            passengers: self.passengers,
            // Legacy callers never filtered by cabin class.
            cabin_classes: Vec::new(),
            webhook_url: None,
            outbound,
            inbound,
        }
    }
}
