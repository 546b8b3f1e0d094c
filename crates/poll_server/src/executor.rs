use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use flight_scan::{
    AvailabilityMap, CalendarResponse, DateAvailability, DateWindow, DebounceKey, Direction,
    NotificationDebouncer, RouteConfig, ScanError, filter_by_cabin_classes, scan_window,
};
use futures_util::future::join_all;
use proxy_pool::{ProxyCredential, ProxyPool};
use reward_api::RewardApiClient;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};
use webhook_notify::{NotifyError, WebhookNotifier};

use crate::config::Config;

/// Fetch collaborator seam for the external availability feed
#[async_trait]
pub trait AvailabilityFetcher: Send + Sync {
    /// Fetch both legs' availability maps for one route
    async fn fetch_calendar(
        &self,
        route: &RouteConfig,
        proxy: &ProxyCredential,
    ) -> Result<CalendarResponse, ScanError>;
}

#[async_trait]
impl AvailabilityFetcher for RewardApiClient {
    async fn fetch_calendar(
        &self,
        route: &RouteConfig,
        proxy: &ProxyCredential,
    ) -> Result<CalendarResponse, ScanError> {
        RewardApiClient::fetch_calendar(self, route, proxy).await
    }
}

/// Notifier collaborator seam for alert delivery
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver an availability alert for one leg of a route
    async fn notify(
        &self,
        dates: &[(NaiveDate, DateAvailability)],
        direction: Direction,
        route: &RouteConfig,
    ) -> Result<(), NotifyError>;
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(
        &self,
        dates: &[(NaiveDate, DateAvailability)],
        direction: Direction,
        route: &RouteConfig,
    ) -> Result<(), NotifyError> {
        self.send_flight_notification(dates, direction, route).await
    }
}

/// Drives the polling loop: one concurrent availability check per active
/// route, rescheduled a fixed cooldown after the whole batch settles.
pub struct PollExecutor {
    config: Config,
    proxy_pool: Arc<ProxyPool>,
    fetcher: Arc<dyn AvailabilityFetcher>,
    notifier: Arc<dyn Notifier>,
    debouncer: Arc<NotificationDebouncer>,
}

impl PollExecutor {
    /// Wire an executor from its collaborators
    pub fn new(
        config: Config,
        proxy_pool: Arc<ProxyPool>,
        fetcher: Arc<dyn AvailabilityFetcher>,
        notifier: Arc<dyn Notifier>,
        debouncer: Arc<NotificationDebouncer>,
    ) -> Self {
        Self {
            config,
            proxy_pool,
            fetcher,
            notifier,
            debouncer,
        }
    }

    /// Run the poll loop forever. The cooldown is measured from tick
    /// completion, not a fixed-rate clock.
    pub async fn start(&self) {
        info!(
            "Starting poll loop, cooldown {}ms, proxy category {}",
            self.config.cooldown_time, self.config.proxy_category
        );

        loop {
            self.run_tick().await;
            sleep(self.config.cooldown()).await;
        }
    }

    /// Run one tick: every active route checked concurrently, failures
    /// reported per route without aborting siblings or the loop.
    pub async fn run_tick(&self) {
        let routes = self.config.active_routes();
        if routes.is_empty() {
            info!("All configured routes are disabled, skipping tick");
            return;
        }

        debug!("Checking {} route(s)", routes.len());
        let checks = routes.iter().map(|route| async move {
            (route.name.clone(), self.check_route(route).await)
        });

        for (name, result) in join_all(checks).await {
            if let Err(e) = result {
                error!("Route check failed for {}: {}", name, e);
            }
        }
    }

    /// Check one route: draw a proxy, fetch the calendar, and process each
    /// enabled leg independently.
    async fn check_route(&self, route: &RouteConfig) -> Result<(), ScanError> {
        let proxy = self.proxy_pool.draw(&self.config.proxy_category).await?;
        debug!(
            "Checking {} via proxy {}:{}",
            route.name, proxy.host, proxy.port
        );

        let calendar = self.fetcher.fetch_calendar(route, &proxy).await?;

        let legs = [
            (
                Direction::Outbound,
                &route.outbound,
                &calendar.outbound_availability,
            ),
            (
                Direction::Inbound,
                &route.inbound,
                &calendar.inbound_availability,
            ),
        ];

        for (direction, window, availability) in legs {
            if let Err(e) = self.check_leg(route, direction, window, availability).await {
                error!("{} leg failed for {}: {}", direction, route.name, e);
            }
        }

        Ok(())
    }

    async fn check_leg(
        &self,
        route: &RouteConfig,
        direction: Direction,
        window: &DateWindow,
        availability: &AvailabilityMap,
    ) -> Result<(), ScanError> {
        if !window.enabled {
            return Ok(());
        }

        let matches: Vec<(NaiveDate, DateAvailability)> =
            filter_by_cabin_classes(scan_window(availability, window)?, &route.cabin_classes)
                .map(|(date, entry)| (date, entry.clone()))
                .collect();

        if matches.is_empty() {
            debug!("No {} availability for {}", direction, route.name);
            return Ok(());
        }

        // Airport codes in the key follow the travel direction of the leg.
        let (origin_airport, destination_airport) = match direction {
            Direction::Outbound => (route.base_airport.clone(), route.destination_airport.clone()),
            Direction::Inbound => (route.destination_airport.clone(), route.base_airport.clone()),
        };
        let key = DebounceKey {
            route: route.name.clone(),
            direction,
            origin_airport,
            destination_airport,
        };

        if !self.debouncer.should_send(&key, &matches).await {
            return Ok(());
        }

        info!(
            "Flight found! {} {} date(s) available for {}",
            matches.len(),
            direction,
            route.name
        );

        // Delivery failure is terminal for this notification only.
        if let Err(e) = self.notifier.notify(&matches, direction, route).await {
            warn!(
                "Notification delivery failed for {} {}: {}",
                route.name, direction, e
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flight_scan::CabinAvailability;
    use std::collections::HashSet;
    use std::time::Duration;
    use tokio::sync::Mutex;
    use tokio::time::Instant;

    struct MockFetcher {
        fail_routes: HashSet<String>,
        calendar: CalendarResponse,
    }

    #[async_trait]
    impl AvailabilityFetcher for MockFetcher {
        async fn fetch_calendar(
            &self,
            route: &RouteConfig,
            _proxy: &ProxyCredential,
        ) -> Result<CalendarResponse, ScanError> {
            if self.fail_routes.contains(&route.name) {
                return Err(ScanError::Network("connection reset".to_string()));
            }
            Ok(self.calendar.clone())
        }
    }

    #[derive(Default)]
    struct MockNotifier {
        sent: Mutex<Vec<(String, Direction, usize)>>,
    }

    #[async_trait]
    impl Notifier for MockNotifier {
        async fn notify(
            &self,
            dates: &[(NaiveDate, DateAvailability)],
            direction: Direction,
            route: &RouteConfig,
        ) -> Result<(), NotifyError> {
            self.sent
                .lock()
                .await
                .push((route.name.clone(), direction, dates.len()));
            Ok(())
        }
    }

    fn test_route(name: &str) -> RouteConfig {
        RouteConfig {
            name: name.to_string(),
            enabled: true,
            base_location: "LON".to_string(),
            base_airport: "LGW".to_string(),
            destination: "OPO".to_string(),
            destination_airport: "OPO".to_string(),
            passengers: 1,
            cabin_classes: vec![],
            webhook_url: None,
            outbound: DateWindow {
                enabled: true,
                start_day: 14,
                start_month: 11,
                start_year: 2025,
                end_day: 14,
                end_month: 11,
                end_year: 2025,
            },
            inbound: DateWindow::default(),
        }
    }

    fn test_calendar() -> CalendarResponse {
        let mut outbound = AvailabilityMap::new();
        outbound.insert(
            "2025-11-14".to_string(),
            DateAvailability {
                economy: Some(CabinAvailability { seats: 2 }),
                ..Default::default()
            },
        );
        CalendarResponse {
            outbound_availability: outbound,
            inbound_availability: AvailabilityMap::new(),
        }
    }

    fn test_config(routes: Vec<RouteConfig>) -> Config {
        let mut config: Config = serde_json::from_str("{}").unwrap();
        config.proxy_category = "test".to_string();
        config.flights = routes;
        config
    }

    async fn executor(
        config: Config,
        fetcher: Arc<dyn AvailabilityFetcher>,
        notifier: Arc<MockNotifier>,
    ) -> PollExecutor {
        let pool = Arc::new(ProxyPool::new());
        pool.load_category("test", "10.0.0.1:8080:user:pass\n").await;
        PollExecutor::new(
            config,
            pool,
            fetcher,
            notifier,
            Arc::new(NotificationDebouncer::new()),
        )
    }

    struct SlowFetcher {
        delay: Duration,
        calls: Mutex<Vec<Instant>>,
        calendar: CalendarResponse,
    }

    #[async_trait]
    impl AvailabilityFetcher for SlowFetcher {
        async fn fetch_calendar(
            &self,
            _route: &RouteConfig,
            _proxy: &ProxyCredential,
        ) -> Result<CalendarResponse, ScanError> {
            self.calls.lock().await.push(Instant::now());
            tokio::time::sleep(self.delay).await;
            Ok(self.calendar.clone())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_is_measured_from_batch_completion() {
        let fetch_delay = Duration::from_secs(5);
        let fetcher = Arc::new(SlowFetcher {
            delay: fetch_delay,
            calls: Mutex::new(Vec::new()),
            calendar: test_calendar(),
        });
        let notifier = Arc::new(MockNotifier::default());
        let config = test_config(vec![test_route("slow")]);
        let cooldown = config.cooldown();
        let executor = Arc::new(executor(config, fetcher.clone(), notifier).await);

        let poll_loop = tokio::spawn({
            let executor = executor.clone();
            async move { executor.start().await }
        });

        while fetcher.calls.lock().await.len() < 2 {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        poll_loop.abort();

        // A fixed-rate schedule would put the second fetch one cooldown after
        // the first started; measuring from completion adds the tick duration.
        let calls = fetcher.calls.lock().await;
        assert_eq!(calls[1] - calls[0], fetch_delay + cooldown);
    }

    #[tokio::test]
    async fn test_one_failing_route_does_not_abort_the_other() {
        let fetcher = Arc::new(MockFetcher {
            fail_routes: HashSet::from(["bad".to_string()]),
            calendar: test_calendar(),
        });
        let notifier = Arc::new(MockNotifier::default());
        let executor = executor(
            test_config(vec![test_route("bad"), test_route("good")]),
            fetcher,
            notifier.clone(),
        )
        .await;

        executor.run_tick().await;

        let sent = notifier.sent.lock().await;
        assert_eq!(
            sent.as_slice(),
            &[("good".to_string(), Direction::Outbound, 1)]
        );
    }

    #[tokio::test]
    async fn test_second_tick_with_unchanged_data_is_suppressed() {
        let fetcher = Arc::new(MockFetcher {
            fail_routes: HashSet::new(),
            calendar: test_calendar(),
        });
        let notifier = Arc::new(MockNotifier::default());
        let executor = executor(
            test_config(vec![test_route("good")]),
            fetcher,
            notifier.clone(),
        )
        .await;

        executor.run_tick().await;
        executor.run_tick().await;

        assert_eq!(notifier.sent.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_cabin_filter_suppresses_non_matching_routes() {
        let mut route = test_route("economy-only");
        route.cabin_classes = vec![flight_scan::CabinClass::Business];

        let fetcher = Arc::new(MockFetcher {
            fail_routes: HashSet::new(),
            calendar: test_calendar(), // only economy seats
        });
        let notifier = Arc::new(MockNotifier::default());
        let executor = executor(test_config(vec![route]), fetcher, notifier.clone()).await;

        executor.run_tick().await;

        assert!(notifier.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_disabled_routes_skip_the_tick() {
        let mut route = test_route("off");
        route.enabled = false;

        let fetcher = Arc::new(MockFetcher {
            fail_routes: HashSet::new(),
            calendar: test_calendar(),
        });
        let notifier = Arc::new(MockNotifier::default());
        let executor = executor(test_config(vec![route]), fetcher, notifier.clone()).await;

        executor.run_tick().await;

        assert!(notifier.sent.lock().await.is_empty());
    }
}
