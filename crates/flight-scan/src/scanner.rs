use chrono::NaiveDate;

use crate::{AvailabilityMap, CabinClass, DateAvailability, DateWindow, ScanError};

/// Walk every calendar date from the window's start to its end inclusive,
/// in ascending order, yielding the dates present in `availability` with
/// seats in at least one cabin class. Month and year boundaries roll over
/// naturally; dates absent from the map are skipped.
///
/// The returned iterator is lazy and restartable: re-running it with the
/// same inputs yields the same results.
pub fn scan_window<'a>(
    availability: &'a AvailabilityMap,
    window: &DateWindow,
) -> Result<impl Iterator<Item = (NaiveDate, &'a DateAvailability)>, ScanError> {
    let start = window.start_date()?;
    let end = window.end_date()?;
    if start > end {
        return Err(ScanError::InvalidDateRange(format!(
            "window start {start} is after end {end}"
        )));
    }

    Ok(start
        .iter_days()
        .take_while(move |date| *date <= end)
        .filter_map(move |date| {
            let key = date.format("%Y-%m-%d").to_string();
            availability
                .get(&key)
                .filter(|entry| entry.has_any_seats())
                .map(|entry| (date, entry))
        }))
}

/// Retain entries with a positive seat count in at least one of the
/// requested cabin classes. An empty class set means no filtering, for
/// backward compatibility with unfiltered legacy routes.
pub fn filter_by_cabin_classes<'a, I>(
    entries: I,
    classes: &'a [CabinClass],
) -> impl Iterator<Item = (NaiveDate, &'a DateAvailability)>
where
    I: Iterator<Item = (NaiveDate, &'a DateAvailability)>,
{
    entries.filter(move |(_, entry)| {
        classes.is_empty() || classes.iter().any(|class| entry.seats(*class) > 0)
    })
}
