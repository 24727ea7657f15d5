use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Weekday};

use crate::config::AttendancePolicy;
use crate::dates::{self, parse_date};
use crate::models::{
    AttendanceEntry, AttendanceSummary, DayRecord, DayStatus, MonthBucket, TimeStatus,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

#[derive(Debug, Default)]
struct MonthBuilder {
    recorded: BTreeMap<u32, DayRecord>,
}

pub fn is_present(status: &str, policy: &AttendancePolicy) -> bool {
    let status = status.trim().to_lowercase();
    policy
        .presence_contains
        .iter()
        .any(|token| status.contains(token.as_str()))
        || policy.presence_exact.iter().any(|token| status == *token)
}

pub fn classify_time(time: Option<&str>, present: bool, policy: &AttendancePolicy) -> TimeStatus {
    let late = time
        .map(str::to_lowercase)
        .is_some_and(|time| policy.late_tokens.iter().any(|token| time.contains(token.as_str())));

    if late {
        TimeStatus::Late
    } else if present {
        TimeStatus::OnTime
    } else {
        TimeStatus::Unset
    }
}

pub fn format_percentage(present: u32, total: u32) -> String {
    if total == 0 {
        return "0".to_string();
    }
    // Ties round up, so 6.25 shows as 6.3.
    let tenths = (present as f64 * 1000.0 / total as f64).round();
    format!("{:.1}", tenths / 10.0)
}

fn day_flags(date: NaiveDate, policy: &AttendancePolicy) -> (bool, bool) {
    let weekday = date.weekday();
    (policy.is_weekend(weekday), weekday == Weekday::Sun)
}

/// Folds raw attendance entries into a month-by-month calendar.
///
/// Entries whose date cannot be parsed are skipped. When two entries land on the same
/// calendar day the later one wins. Every month that received at least one entry is
/// padded with `no-school` days so it covers the whole month.
pub fn aggregate<'a, I>(entries: I, policy: &AttendancePolicy) -> AttendanceSummary
where
    I: IntoIterator<Item = AttendanceEntry<'a>>,
{
    let mut months: BTreeMap<MonthKey, MonthBuilder> = BTreeMap::new();
    let mut skipped = 0usize;

    for entry in entries {
        let Some(date) = parse_date(entry.date, policy.date_order) else {
            skipped += 1;
            continue;
        };

        let present = is_present(entry.status, policy);
        let time_status = classify_time(entry.time, present, policy);
        let (is_weekend, is_sunday) = day_flags(date, policy);

        let builder = months.entry(MonthKey::of(date)).or_default();
        builder.recorded.insert(
            date.day(),
            DayRecord {
                day: date.day(),
                date,
                is_school_day: true,
                status: if present {
                    DayStatus::Present
                } else {
                    DayStatus::Absent
                },
                time_status,
                is_weekend,
                is_sunday,
                is_holiday: false,
            },
        );
    }

    if skipped > 0 {
        tracing::debug!(skipped, "skipped attendance entries with unreadable dates");
    }

    let months: Vec<MonthBucket> = months
        .into_iter()
        .map(|(key, builder)| finish_month(key, builder, policy))
        .collect();

    let mut year_to_date = AttendanceSummary::empty().year_to_date;
    for month in &months {
        year_to_date.total_days += month.total_days;
        year_to_date.days_present += month.days_present;
        year_to_date.days_absent += month.days_absent;
        year_to_date.days_late += month.days_late;
    }
    year_to_date.percentage =
        format_percentage(year_to_date.days_present, year_to_date.total_days);

    AttendanceSummary {
        year_to_date,
        months,
    }
}

fn finish_month(key: MonthKey, builder: MonthBuilder, policy: &AttendancePolicy) -> MonthBucket {
    let mut days = builder.recorded;

    let days_present = days
        .values()
        .filter(|day| day.status == DayStatus::Present)
        .count() as u32;
    let days_absent = days
        .values()
        .filter(|day| day.status == DayStatus::Absent)
        .count() as u32;
    let days_late = days
        .values()
        .filter(|day| day.time_status == TimeStatus::Late)
        .count() as u32;
    let total_days = days_present + days_absent;

    for day in 1..=dates::days_in_month(key.year, key.month) {
        if days.contains_key(&day) {
            continue;
        }
        let Some(date) = NaiveDate::from_ymd_opt(key.year, key.month, day) else {
            continue;
        };
        let (is_weekend, is_sunday) = day_flags(date, policy);
        days.insert(
            day,
            DayRecord {
                day,
                date,
                is_school_day: false,
                status: DayStatus::NoSchool,
                time_status: TimeStatus::Unset,
                is_weekend,
                is_sunday,
                is_holiday: is_weekend,
            },
        );
    }

    MonthBucket {
        month: key.month - 1,
        month_name: dates::month_name(key.month - 1).to_string(),
        year: key.year,
        total_days,
        days_present,
        days_absent,
        days_late,
        percentage: format_percentage(days_present, total_days),
        days: days.into_values().collect(),
    }
}
