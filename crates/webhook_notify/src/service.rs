use chrono::{NaiveDate, Utc};
use flight_scan::{CabinClass, DateAvailability, Direction, RouteConfig};
use log::{error, info};
use serde_json::json;

use crate::types::{FlightInfo, NotifyError};

const EMBED_COLOR: u32 = 3_093_196;
const BACKUP_EMBED_COLOR: u32 = 16_711_680;
const BA_LOGO_URL: &str = "https://cdn.discordapp.com/attachments/1028795460892229722/1028797236483739688/british-airways-eps-vector-logo.png";

/// Discord webhook notifier with a reduced-fidelity backup payload
pub struct WebhookNotifier {
    client: reqwest::Client,
    default_url: Option<String>,
}

impl WebhookNotifier {
    /// Notifier posting to each route's webhook, falling back to `default_url`
    pub fn new(default_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            default_url,
        }
    }

    /// Deliver an availability alert for one leg of `route`.
    ///
    /// Best-effort: on primary delivery failure a simplified backup embed
    /// is posted to the same endpoint, and only the backup's failure is
    /// returned to the caller.
    pub async fn send_flight_notification(
        &self,
        dates: &[(NaiveDate, DateAvailability)],
        direction: Direction,
        route: &RouteConfig,
    ) -> Result<(), NotifyError> {
        let url = route
            .webhook_url
            .clone()
            .or_else(|| self.default_url.clone())
            .ok_or(NotifyError::MissingWebhook)?;

        let info = extract_flight_info(dates, route);
        let link = build_booking_link(&info, route.passengers);

        let payload = json!({
            "embeds": [{
                "color": EMBED_COLOR,
                "author": {
                    "name": "BA Flight Finder",
                    "url": link,
                    "icon_url": BA_LOGO_URL,
                },
                "title": format!("{direction} Reward Flight Found! 🎉"),
                "url": link,
                "thumbnail": { "url": BA_LOGO_URL },
                "description": format_description(dates),
                "footer": {
                    "text": format!("Found {} available date{}", dates.len(), plural(dates.len())),
                },
                "timestamp": Utc::now().to_rfc3339(),
            }]
        });

        match self.post(&url, &payload).await {
            Ok(()) => {
                info!(
                    "Webhook sent successfully for {} {} flights",
                    route.name, direction
                );
                Ok(())
            }
            Err(e) => {
                error!("Failed to send primary webhook for {}: {}", route.name, e);
                self.send_backup(&url, dates.len(), direction, &link).await
            }
        }
    }

    async fn send_backup(
        &self,
        url: &str,
        date_count: usize,
        direction: Direction,
        link: &str,
    ) -> Result<(), NotifyError> {
        let payload = json!({
            "embeds": [{
                "color": BACKUP_EMBED_COLOR,
                "title": format!("⚠️ {direction} Flights Available (Backup Alert)"),
                "description": format!(
                    "**{date_count} date{} with availability found!**\n\n\
                     The main notification failed to format, but seats are available. \
                     Check the link below for details.",
                    plural(date_count)
                ),
                "url": link,
                "footer": { "text": "Backup notification - Primary webhook failed" },
                "timestamp": Utc::now().to_rfc3339(),
            }]
        });

        match self.post(url, &payload).await {
            Ok(()) => {
                info!("Backup webhook sent successfully for {direction} flights");
                Ok(())
            }
            Err(e) => {
                error!("Backup webhook also failed: {e}");
                Err(e)
            }
        }
    }

    async fn post(&self, url: &str, payload: &serde_json::Value) -> Result<(), NotifyError> {
        let response = self.client.post(url).json(payload).send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(NotifyError::Rejected(response.status()))
        }
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "" } else { "s" }
}

/// Pull route codes, place names, and available-cabin flags out of the
/// date list, falling back to the route configuration where the feed gave
/// no schedule data.
pub fn extract_flight_info(
    dates: &[(NaiveDate, DateAvailability)],
    route: &RouteConfig,
) -> FlightInfo {
    let mut info = FlightInfo::default();

    for (_, entry) in dates {
        if let Some(schedule) = entry.schedules.first() {
            if info.source_code.is_empty() {
                info.source_code = schedule.source_code.clone().unwrap_or_default();
            }
            if info.destination_code.is_empty() {
                info.destination_code = schedule.destination_code.clone().unwrap_or_default();
            }
            if info.source_name.is_empty() {
                info.source_name = schedule.source.clone().unwrap_or_default();
            }
            if info.destination_name.is_empty() {
                info.destination_name = schedule.destination.clone().unwrap_or_default();
            }
        }

        info.economy |= entry.seats(CabinClass::Economy) > 0;
        info.premium |= entry.seats(CabinClass::Premium) > 0;
        info.business |= entry.seats(CabinClass::Business) > 0;
        info.first |= entry.seats(CabinClass::First) > 0;

        if !info.source_code.is_empty()
            && !info.destination_code.is_empty()
            && !info.source_name.is_empty()
            && !info.destination_name.is_empty()
        {
            break;
        }
    }

    if info.source_code.is_empty() {
        info.source_code = route.base_location.clone();
    }
    if info.destination_code.is_empty() {
        info.destination_code = route.destination.clone();
    }
    if info.source_name.is_empty() {
        info.source_name = route.base_location.clone();
    }
    if info.destination_name.is_empty() {
        info.destination_name = route.destination.clone();
    }

    info
}

/// Deep link into the reward flight calendar with the cabin-class toggles
/// reflecting what was actually found
pub fn build_booking_link(info: &FlightInfo, passengers: u32) -> String {
    format!(
        "https://rewardflightfinder.com/calendar?numberOfPassengers={}&tclass=Economy&tValue=economy\
         &jType=return&dPlace={}&dId={}&aPlace={}&aId={}&economy={}&premium={}&business={}&first={}",
        passengers,
        urlencoding::encode(&info.source_name),
        info.source_code,
        urlencoding::encode(&info.destination_name),
        info.destination_code,
        info.economy,
        info.premium,
        info.business,
        info.first,
    )
}

/// One embed line per date: seat counts per cabin, peak flag, and the
/// first schedule's route/time/flight details when present. Dates with no
/// positive seat counts are skipped rather than failing the whole message.
pub fn format_description(dates: &[(NaiveDate, DateAvailability)]) -> String {
    let mut lines = Vec::new();

    for (date, entry) in dates {
        let mut cabins = Vec::new();
        for (class, emoji, label) in [
            (CabinClass::Economy, "💺", "Economy"),
            (CabinClass::Premium, "✨", "Premium"),
            (CabinClass::Business, "💼", "Business"),
            (CabinClass::First, "👑", "First"),
        ] {
            let seats = entry.seats(class);
            if seats > 0 {
                cabins.push(format!(
                    "{emoji} **{label}:** {seats} seat{}",
                    plural(seats as usize)
                ));
            }
        }

        if cabins.is_empty() {
            continue;
        }

        let peak = match entry.peak {
            Some(true) => " ⭐ **Peak**",
            Some(false) => " 🟢 **Off-Peak**",
            None => "",
        };

        let mut details = String::new();
        if let Some(schedule) = entry.schedules.first() {
            let mut parts = Vec::new();

            let source = schedule
                .source
                .clone()
                .or_else(|| schedule.source_code.clone())
                .unwrap_or_else(|| "Unknown".to_string());
            let destination = schedule
                .destination
                .clone()
                .or_else(|| schedule.destination_code.clone())
                .unwrap_or_else(|| "Unknown".to_string());
            parts.push(format!(
                "🛫 **{source}** ({}) → **{destination}** ({})",
                schedule.source_code.as_deref().unwrap_or(""),
                schedule.destination_code.as_deref().unwrap_or(""),
            ));

            if let (Some(departure), Some(arrival)) =
                (&schedule.departure_time, &schedule.arrival_time)
            {
                parts.push(format!("🕐 {departure} - {arrival}"));
            }
            if let Some(flight) = &schedule.flight {
                parts.push(format!("✈️ {flight}"));
            }

            details = format!("\n{}", parts.join(" | "));
        }

        let date_formatted = date.format("%a %-d %b %Y");
        lines.push(format!(
            "✈️ **{date_formatted}**{peak}\n{}{details}",
            cabins.join(" | ")
        ));
    }

    if lines.is_empty() {
        "✈️ Flights available - check the link for details".to_string()
    } else {
        lines.join("\n\n")
    }
}
