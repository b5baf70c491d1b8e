//! Calendar-day projection of item lists.
//!
//! Pure functions: nothing here mutates items or touches storage.
//! Day equality compares year/month/day in the given timezone and ignores
//! the time of day.

use crate::model::item::Item;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};

/// Calendar day that `date` falls on in `tz`.
pub fn day_of<Tz: TimeZone>(date: &DateTime<Utc>, tz: &Tz) -> NaiveDate {
    date.with_timezone(tz).date_naive()
}

/// Items whose associated date falls on `day` in `tz`, in list order.
///
/// Items without an associated date never match.
pub fn on_day<'a, Tz: TimeZone>(items: &'a [Item], day: NaiveDate, tz: &Tz) -> Vec<&'a Item> {
    items
        .iter()
        .filter(|item| {
            item.associated_date
                .as_ref()
                .is_some_and(|date| day_of(date, tz) == day)
        })
        .collect()
}
