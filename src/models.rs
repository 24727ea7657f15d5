use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DayStatus {
    Present,
    Absent,
    NoSchool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TimeStatus {
    #[serde(rename = "on-time")]
    OnTime,
    #[serde(rename = "late")]
    Late,
    #[serde(rename = "")]
    Unset,
}

/// One (date, status, time) triple read from the attendance range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttendanceEntry<'a> {
    pub date: &'a str,
    pub status: &'a str,
    pub time: Option<&'a str>,
}

/// Column indices for one calendar date in the wide layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnGroup {
    pub date_col: usize,
    pub status_col: usize,
    pub time_col: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayRecord {
    pub day: u32,
    pub date: NaiveDate,
    pub is_school_day: bool,
    pub status: DayStatus,
    pub time_status: TimeStatus,
    pub is_weekend: bool,
    pub is_sunday: bool,
    pub is_holiday: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthBucket {
    /// Zero-based month, January is 0.
    pub month: u32,
    pub month_name: String,
    pub year: i32,
    pub total_days: u32,
    pub days_present: u32,
    pub days_absent: u32,
    pub days_late: u32,
    pub percentage: String,
    pub days: Vec<DayRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearToDate {
    pub total_days: u32,
    pub days_present: u32,
    pub days_absent: u32,
    pub days_late: u32,
    pub percentage: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummary {
    pub year_to_date: YearToDate,
    pub months: Vec<MonthBucket>,
}

impl AttendanceSummary {
    /// Zeroed shape returned when a student has no usable attendance data.
    pub fn empty() -> Self {
        Self {
            year_to_date: YearToDate {
                total_days: 0,
                days_present: 0,
                days_absent: 0,
                days_late: 0,
                percentage: "0".to_string(),
            },
            months: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProfile {
    pub roll_number: String,
    pub name: String,
    pub class: String,
    pub school: String,
    pub dob: String,
    pub father_name: String,
    pub mother_name: String,
}
