use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Fare tier with an independent reward seat count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CabinClass {
    /// Economy cabin
    Economy,
    /// Premium economy cabin
    Premium,
    /// Business cabin
    Business,
    /// First cabin
    First,
}

impl CabinClass {
    /// Every cabin class, in fare-tier order
    pub const ALL: [CabinClass; 4] = [
        CabinClass::Economy,
        CabinClass::Premium,
        CabinClass::Business,
        CabinClass::First,
    ];

    /// Lowercase label used in feed payloads and booking links
    pub fn as_str(self) -> &'static str {
        match self {
            CabinClass::Economy => "economy",
            CabinClass::Premium => "premium",
            CabinClass::Business => "business",
            CabinClass::First => "first",
        }
    }
}

/// Seat availability for one cabin class on one date
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CabinAvailability {
    /// Number of reward seats; 0 means unavailable
    #[serde(default)]
    pub seats: u32,
}

/// Schedule metadata attached to a date's availability entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightSchedule {
    /// Departure city name
    #[serde(default)]
    pub source: Option<String>,
    /// Departure airport/city code
    #[serde(default)]
    pub source_code: Option<String>,
    /// Arrival city name
    #[serde(default)]
    pub destination: Option<String>,
    /// Arrival airport/city code
    #[serde(default)]
    pub destination_code: Option<String>,
    /// Local departure time
    #[serde(default)]
    pub departure_time: Option<String>,
    /// Local arrival time
    #[serde(default)]
    pub arrival_time: Option<String>,
    /// Flight number
    #[serde(default)]
    pub flight: Option<String>,
}

/// Per-date availability entry from the feed. Absent cabins default to
/// unavailable so malformed payloads degrade instead of failing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateAvailability {
    /// Economy seats, if reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub economy: Option<CabinAvailability>,
    /// Premium seats, if reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub premium: Option<CabinAvailability>,
    /// Business seats, if reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business: Option<CabinAvailability>,
    /// First seats, if reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first: Option<CabinAvailability>,
    /// Peak-date flag, if reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peak: Option<bool>,
    /// Flight schedules for the date
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schedules: Vec<FlightSchedule>,
}

impl DateAvailability {
    /// Seat count for one cabin class; absent entries count as 0
    pub fn seats(&self, class: CabinClass) -> u32 {
        let cabin = match class {
            CabinClass::Economy => &self.economy,
            CabinClass::Premium => &self.premium,
            CabinClass::Business => &self.business,
            CabinClass::First => &self.first,
        };
        cabin.as_ref().map_or(0, |c| c.seats)
    }

    /// True when at least one cabin class has seats
    pub fn has_any_seats(&self) -> bool {
        CabinClass::ALL.iter().any(|class| self.seats(*class) > 0)
    }
}

/// Sparse availability keyed by `YYYY-MM-DD` date string
pub type AvailabilityMap = HashMap<String, DateAvailability>;

/// Feed response: one sparse availability map per travel direction
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CalendarResponse {
    /// Availability for the outbound leg
    #[serde(default)]
    pub outbound_availability: AvailabilityMap,
    /// Availability for the inbound leg
    #[serde(default)]
    pub inbound_availability: AvailabilityMap,
}

/// One direction of a route's travel window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Base to destination
    Outbound,
    /// Destination back to base
    Inbound,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Outbound => write!(f, "Outbound"),
            Direction::Inbound => write!(f, "Inbound"),
        }
    }
}

/// Inclusive calendar window for one leg; may span month and year boundaries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    /// Whether this leg is checked at all
    #[serde(default)]
    pub enabled: bool,
    /// First day of the window
    #[serde(default)]
    pub start_day: u32,
    /// First month of the window
    #[serde(default)]
    pub start_month: u32,
    /// First year of the window
    #[serde(default)]
    pub start_year: i32,
    /// Last day of the window
    #[serde(default)]
    pub end_day: u32,
    /// Last month of the window
    #[serde(default)]
    pub end_month: u32,
    /// Last year of the window
    #[serde(default)]
    pub end_year: i32,
}

impl DateWindow {
    /// The window's first calendar date
    pub fn start_date(&self) -> Result<NaiveDate, ScanError> {
        NaiveDate::from_ymd_opt(self.start_year, self.start_month, self.start_day).ok_or_else(
            || {
                ScanError::InvalidDateRange(format!(
                    "invalid window start {}-{}-{}",
                    self.start_year, self.start_month, self.start_day
                ))
            },
        )
    }

    /// The window's last calendar date
    pub fn end_date(&self) -> Result<NaiveDate, ScanError> {
        NaiveDate::from_ymd_opt(self.end_year, self.end_month, self.end_day).ok_or_else(|| {
            ScanError::InvalidDateRange(format!(
                "invalid window end {}-{}-{}",
                self.end_year, self.end_month, self.end_day
            ))
        })
    }
}

fn default_enabled() -> bool {
    true
}

fn default_passengers() -> u32 {
    1
}

/// One monitored flight route with independent outbound/inbound windows
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RouteConfig {
    /// Display name for the route
    #[validate(length(min = 1, message = "Route name is required"))]
    pub name: String,

    /// Disabled routes are skipped on every tick
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Departure city code, e.g. `LON`
    pub base_location: String,

    /// Departure airport code(s), e.g. `LGW,LHR`
    pub base_airport: String,

    /// Destination city code
    pub destination: String,

    /// Destination airport code
    pub destination_airport: String,

    /// Number of passengers to search for
    #[validate(range(min = 1, message = "At least one passenger is required"))]
    #[serde(default = "default_passengers")]
    pub passengers: u32,

    /// Cabin classes to monitor; empty means all classes
    #[serde(default)]
    pub cabin_classes: Vec<CabinClass>,

    /// Per-route notification target; falls back to the global webhook
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Outbound travel window
    #[serde(default)]
    pub outbound: DateWindow,

    /// Inbound travel window
    #[serde(default)]
    pub inbound: DateWindow,
}

/// Custom error type for scan and poll operations
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Upstream API error
    #[error("API error: {0}")]
    ApiError(String),

    /// Rate limited by external API
    #[error("Rate limited by external API")]
    RateLimited,

    /// Authentication failed with external service
    #[error("Authentication failed with external service")]
    AuthenticationFailed,

    /// Route not found on external service
    #[error("Route not found on external service")]
    NotFound,

    /// Data format error
    #[error("Data format error: {0}")]
    DataFormat(String),

    /// Invalid date range
    #[error("Invalid date range: {0}")]
    InvalidDateRange(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// Proxy pool error
    #[error("Proxy error: {0}")]
    Proxy(#[from] proxy_pool::ProxyError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seats_defaults_to_zero_for_absent_cabins() {
        let entry = DateAvailability {
            economy: Some(CabinAvailability { seats: 2 }),
            ..Default::default()
        };
        assert_eq!(entry.seats(CabinClass::Economy), 2);
        assert_eq!(entry.seats(CabinClass::First), 0);
        assert!(entry.has_any_seats());
        assert!(!DateAvailability::default().has_any_seats());
    }

    #[test]
    fn test_calendar_response_tolerates_sparse_payload() {
        let response: CalendarResponse = serde_json::from_str(
            r#"{
                "outbound_availability": {
                    "2025-11-14": {
                        "economy": { "seats": 2 },
                        "peak": false,
                        "schedules": [{ "source_code": "LGW", "flight": "BA0542" }]
                    }
                }
            }"#,
        )
        .unwrap();

        let entry = &response.outbound_availability["2025-11-14"];
        assert_eq!(entry.seats(CabinClass::Economy), 2);
        assert_eq!(entry.peak, Some(false));
        assert_eq!(entry.schedules[0].flight.as_deref(), Some("BA0542"));
        assert!(response.inbound_availability.is_empty());
    }

    #[test]
    fn test_date_window_validation() {
        let window = DateWindow {
            enabled: true,
            start_day: 26,
            start_month: 12,
            start_year: 2025,
            end_day: 3,
            end_month: 1,
            end_year: 2026,
        };
        assert_eq!(
            window.start_date().unwrap(),
            NaiveDate::from_ymd_opt(2025, 12, 26).unwrap()
        );

        let bad = DateWindow {
            start_day: 31,
            start_month: 2,
            start_year: 2026,
            ..window
        };
        assert!(matches!(
            bad.start_date(),
            Err(ScanError::InvalidDateRange(_))
        ));
    }

    #[test]
    fn test_route_config_validation() {
        let route = RouteConfig {
            name: String::new(),
            enabled: true,
            base_location: "LON".to_string(),
            base_airport: "LGW".to_string(),
            destination: "OPO".to_string(),
            destination_airport: "OPO".to_string(),
            passengers: 1,
            cabin_classes: vec![],
            webhook_url: None,
            outbound: DateWindow::default(),
            inbound: DateWindow::default(),
        };
        assert!(route.validate().is_err());
    }
}
