use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::{CabinClass, DateAvailability, Direction};

/// Identifier scoping one notification-state record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DebounceKey {
    /// Route name
    pub route: String,
    /// Travel direction of the leg
    pub direction: Direction,
    /// Departure airport code for the leg
    pub origin_airport: String,
    /// Arrival airport code for the leg
    pub destination_airport: String,
}

/// Per-key record of the last alert sent
#[derive(Debug, Clone)]
struct NotificationState {
    /// Canonical serialization of the last sent availability, None when it
    /// could not be serialized
    snapshot: Option<String>,
    last_sent: DateTime<Utc>,
}

/// Suppresses duplicate or unchanged alerts within a resend window while
/// always re-alerting on genuine content change.
///
/// State is process-lifetime only: entries are created on first send,
/// overwritten on every later send decision, and never deleted.
pub struct NotificationDebouncer {
    resend_interval: Duration,
    state: Mutex<HashMap<DebounceKey, NotificationState>>,
}

impl NotificationDebouncer {
    /// Debouncer with the standard one-hour resend interval
    pub fn new() -> Self {
        Self::with_resend_interval(Duration::hours(1))
    }

    /// Debouncer with a custom resend interval
    pub fn with_resend_interval(resend_interval: Duration) -> Self {
        Self {
            resend_interval,
            state: Mutex::new(HashMap::new()),
        }
    }

    /// Decide whether to emit a notification for `dates` under `key`.
    ///
    /// Sends on the first alert for a key, whenever the normalized content
    /// differs from the last sent alert, and as a periodic re-affirmation
    /// once the resend interval has elapsed. Anything else is suppressed.
    pub async fn should_send(
        &self,
        key: &DebounceKey,
        dates: &[(NaiveDate, DateAvailability)],
    ) -> bool {
        self.decide(key, dates, Utc::now()).await
    }

    // The read-decide-write sequence for one key runs under a single lock
    // so two concurrent checks cannot both decide "send" for unchanged
    // content.
    async fn decide(
        &self,
        key: &DebounceKey,
        dates: &[(NaiveDate, DateAvailability)],
        now: DateTime<Utc>,
    ) -> bool {
        let snapshot = normalize_snapshot(dates);
        if snapshot.is_none() {
            // Degrade to "treat as changed" rather than losing an alert.
            warn!(
                "Could not serialize availability snapshot for {}/{}, treating as changed",
                key.route, key.direction
            );
        }

        let mut state = self.state.lock().await;
        let send = match state.get(key) {
            None => true,
            Some(previous) => {
                let changed = match (&previous.snapshot, &snapshot) {
                    (Some(last), Some(current)) => last != current,
                    _ => true,
                };
                changed || now - previous.last_sent >= self.resend_interval
            }
        };

        if send {
            state.insert(
                key.clone(),
                NotificationState {
                    snapshot,
                    last_sent: now,
                },
            );
        } else {
            debug!(
                "Suppressing unchanged {} alert for {}",
                key.direction, key.route
            );
        }
        send
    }
}

/// Canonical serialized form of a date list: per-date cabin seat counts,
/// positive seats only, in date order so input ordering cannot affect
/// equality.
fn normalize_snapshot(dates: &[(NaiveDate, DateAvailability)]) -> Option<String> {
    let mut normalized: BTreeMap<String, BTreeMap<&'static str, u32>> = BTreeMap::new();

    for (date, entry) in dates {
        let mut cabins = BTreeMap::new();
        for class in CabinClass::ALL {
            let seats = entry.seats(class);
            if seats > 0 {
                cabins.insert(class.as_str(), seats);
            }
        }
        normalized.insert(date.format("%Y-%m-%d").to_string(), cabins);
    }

    serde_json::to_string(&normalized).ok()
}
