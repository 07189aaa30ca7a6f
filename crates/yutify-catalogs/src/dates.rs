// SPDX-License-Identifier: GPL-3.0-or-later
use chrono::{DateTime, NaiveDate};

/// Normalizes catalog release dates to `YYYY-MM-DD`.
///
/// Full timestamps are reduced to their date, partial dates (`YYYY`, `YYYY-MM`)
/// are kept as-is, and placeholder dates such as `0000-00-00` become `None`.
pub fn normalize_release_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with("0000") {
        return None;
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.date_naive().format("%Y-%m-%d").to_string());
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.format("%Y-%m-%d").to_string());
    }

    Some(raw.to_string())
}
