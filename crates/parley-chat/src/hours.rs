// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Business hours: whether staff are online right now.

use chrono::{DateTime, Duration, NaiveTime, Timelike, Utc};
use parley_config::model::BusinessHoursConfig;

fn parse_hh_mm(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").ok()
}

/// Inclusive `start..=end` comparison at the configured UTC offset.
///
/// An empty (or unparsable) bound means always online. A window whose end is
/// before its start wraps past midnight.
pub fn is_within_business_hours(hours: &BusinessHoursConfig, now: DateTime<Utc>) -> bool {
    let (Some(start), Some(end)) = (parse_hh_mm(&hours.start), parse_hh_mm(&hours.end)) else {
        return true;
    };

    let local = now + Duration::minutes(i64::from(hours.utc_offset_minutes));
    let Some(current) = NaiveTime::from_hms_opt(local.hour(), local.minute(), 0) else {
        return true;
    };

    if start <= end {
        start <= current && current <= end
    } else {
        current >= start || current <= end
    }
}

/// Midnight of the business's current local day, as a UTC instant.
pub fn local_day_start(hours: &BusinessHoursConfig, now: DateTime<Utc>) -> DateTime<Utc> {
    let offset = Duration::minutes(i64::from(hours.utc_offset_minutes));
    let local = now + offset;
    let midnight = local.date_naive().and_time(NaiveTime::MIN).and_utc();
    midnight - offset
}
