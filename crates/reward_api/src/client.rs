use std::time::Duration;

use flight_scan::{CalendarResponse, RouteConfig, ScanError};
use proxy_pool::{ProxyCredential, to_proxy_url};
use reqwest::Client;
use tracing::{debug, warn};

/// Default base URL for the calendar-availability feed
pub const DEFAULT_BASE_URL: &str =
    "https://lu7oe93qmi.execute-api.eu-west-2.amazonaws.com/production";

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko)";

/// Client for the reward-flight calendar-availability feed
pub struct RewardApiClient {
    base_url: String,
    tier: String,
    timeout: Duration,
}

impl RewardApiClient {
    /// Create a feed client; `base_url` falls back to the production feed
    pub fn new(base_url: Option<String>) -> Self {
        Self {
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            tier: "blue".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Fetch calendar availability for `route`, routed through `proxy`.
    ///
    /// reqwest fixes the proxy at client construction, so each fetch builds
    /// its own client around the drawn credential.
    pub async fn fetch_calendar(
        &self,
        route: &RouteConfig,
        proxy: &ProxyCredential,
    ) -> Result<CalendarResponse, ScanError> {
        debug!(
            "Fetching calendar availability for {} ({} to {})",
            route.name, route.base_location, route.destination
        );

        let proxy_url = to_proxy_url(proxy)?;
        let client = Client::builder()
            .proxy(
                reqwest::Proxy::all(&proxy_url)
                    .map_err(|e| ScanError::ConfigError(format!("Invalid proxy: {e}")))?,
            )
            .timeout(self.timeout)
            .build()
            .map_err(|e| ScanError::ApiError(format!("Failed to create HTTP client: {e}")))?;

        let url = format!("{}/calendar-availability/british-airways", self.base_url);
        let passengers = route.passengers.to_string();
        let params = [
            ("source_code", route.base_location.as_str()),
            ("destination_code", route.destination.as_str()),
            ("tier", self.tier.as_str()),
            ("number_of_passengers", passengers.as_str()),
        ];

        let response = client
            .get(&url)
            .query(&params)
            .header("accept", "*/*")
            .header("accept-language", "en-GB,en-US;q=0.9,en;q=0.8")
            .header("dnt", "1")
            .header("origin", "https://rewardflightfinder.com")
            .header("referer", "https://rewardflightfinder.com/")
            .header("user-agent", USER_AGENT)
            .send()
            .await
            .map_err(|e| ScanError::Network(format!("HTTP request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            match status.as_u16() {
                429 => return Err(ScanError::RateLimited),
                401 | 403 => return Err(ScanError::AuthenticationFailed),
                404 => return Err(ScanError::NotFound),
                _ => {
                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unable to read response body".to_string());
                    warn!("Feed request failed with status {}: {}", status, body);
                    return Err(ScanError::ApiError(format!("HTTP {status} - {body}")));
                }
            }
        }

        response
            .json::<CalendarResponse>()
            .await
            .map_err(|e| ScanError::ApiError(format!("Failed to parse response: {e}")))
    }
}
