/// Custom error type for webhook delivery
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// Webhook request failed at the transport level
    #[error("Webhook request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The webhook endpoint rejected the payload
    #[error("Webhook rejected with status {0}")]
    Rejected(reqwest::StatusCode),

    /// No webhook target configured for the route or globally
    #[error("No webhook URL configured")]
    MissingWebhook,
}

/// Route codes, place names, and per-cabin availability flags extracted
/// from availability data for building the booking link
#[derive(Debug, Default, PartialEq, Eq)]
pub struct FlightInfo {
    /// Departure airport/city code
    pub source_code: String,
    /// Arrival airport/city code
    pub destination_code: String,
    /// Departure city name
    pub source_name: String,
    /// Arrival city name
    pub destination_name: String,
    /// Economy seats seen anywhere in the date list
    pub economy: bool,
    /// Premium seats seen anywhere in the date list
    pub premium: bool,
    /// Business seats seen anywhere in the date list
    pub business: bool,
    /// First seats seen anywhere in the date list
    pub first: bool,
}
