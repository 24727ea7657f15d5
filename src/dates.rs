use chrono::{NaiveDate, NaiveDateTime};

use crate::config::DateOrder;

const TEXTUAL_FORMATS: &[&str] = &["%d %B %Y", "%B %d, %Y", "%d %b %Y", "%b %d, %Y", "%B %d %Y"];

/// Parses a spreadsheet date cell. Returns `None` for anything that is not a real date.
pub fn parse_date(text: &str, order: DateOrder) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if text.contains('/') {
        parse_slashed(text, order)
    } else if text.contains('-') {
        parse_dashed(text)
    } else {
        TEXTUAL_FORMATS
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
    }
}

fn parse_slashed(text: &str, order: DateOrder) -> Option<NaiveDate> {
    let parts: Vec<&str> = text.split('/').map(str::trim).collect();
    if parts.len() != 3 {
        return None;
    }

    if parts[0].len() <= 2 && parts[1].len() <= 2 {
        let first = parts[0].parse::<u32>().ok()?;
        let second = parts[1].parse::<u32>().ok()?;
        let year = parse_year(parts[2])?;
        let (day_first, month_first) = (
            NaiveDate::from_ymd_opt(year, second, first),
            NaiveDate::from_ymd_opt(year, first, second),
        );
        return match order {
            DateOrder::Dmy => day_first.or(month_first),
            DateOrder::Mdy => month_first.or(day_first),
        };
    }

    NaiveDate::parse_from_str(text, "%Y/%m/%d")
        .or_else(|_| NaiveDate::parse_from_str(text, "%m/%d/%Y"))
        .ok()
}

fn parse_dashed(text: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(stamp) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(stamp.date());
    }
    if let Ok(stamp) = chrono::DateTime::parse_from_rfc3339(text) {
        return Some(stamp.date_naive());
    }
    NaiveDate::parse_from_str(text, "%d-%b-%Y").ok()
}

fn parse_year(token: &str) -> Option<i32> {
    if token.is_empty() || !token.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let year = token.parse::<i32>().ok()?;
    match token.len() {
        1 | 2 => Some(2000 + year),
        4 => Some(year),
        _ => None,
    }
}

/// Dash or slash separated triple of numeric tokens, e.g. `1/2/2024` or `2024-01-02`.
pub fn has_numeric_date_shape(text: &str) -> bool {
    let text = text.trim();
    ['/', '-'].iter().any(|&separator| {
        let parts: Vec<&str> = text.split(separator).collect();
        parts.len() == 3
            && parts
                .iter()
                .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
    })
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return 0;
    };
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next.map(|next| (next - first).num_days() as u32)
        .unwrap_or(31)
}

pub fn month_name(month0: u32) -> &'static str {
    const NAMES: [&str; 12] = [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ];
    NAMES.get(month0 as usize).copied().unwrap_or("")
}
