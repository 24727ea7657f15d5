use std::path::PathBuf;

use chrono::Weekday;
use clap::{Args, ValueEnum};

/// Order used when both leading tokens of a slash date are one or two characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DateOrder {
    Dmy,
    Mdy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Layout {
    Auto,
    Tall,
    Wide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    Csv,
    Google,
}

#[derive(Debug, Clone, Args)]
pub struct SourceArgs {
    /// Backend that serves the cell grids
    #[arg(long, env = "GRID_SOURCE", value_enum, default_value_t = SourceKind::Csv)]
    pub source: SourceKind,
    /// Directory holding one `<Sheet>.csv` per range (csv source)
    #[arg(long, env = "DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,
    #[arg(long, env = "GOOGLE_SHEET_ID")]
    pub sheet_id: Option<String>,
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
    #[arg(long, env = "GOOGLE_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,
    #[arg(long, env = "STUDENTS_RANGE", default_value = "Students")]
    pub students_range: String,
    #[arg(long, env = "ATTENDANCE_RANGE", default_value = "Attendance")]
    pub attendance_range: String,
}

#[derive(Debug, Clone, Args)]
pub struct PolicyArgs {
    #[arg(long, env = "DATE_ORDER", value_enum, default_value_t = DateOrder::Dmy)]
    pub date_order: DateOrder,
    /// Weekdays flagged as weekend when filling non-school days
    #[arg(
        long,
        env = "WEEKEND_DAYS",
        value_delimiter = ',',
        default_value = "sun",
        value_parser = parse_weekday
    )]
    pub weekend_days: Vec<Weekday>,
    /// Status text containing any of these marks the student present
    #[arg(long, env = "PRESENCE_CONTAINS", value_delimiter = ',', default_value = "p,present")]
    pub presence_contains: Vec<String>,
    /// Status text equal to any of these marks the student present
    #[arg(long, env = "PRESENCE_EXACT", value_delimiter = ',', default_value = "1")]
    pub presence_exact: Vec<String>,
    #[arg(long, env = "LATE_TOKENS", value_delimiter = ',', default_value = "late,delay")]
    pub late_tokens: Vec<String>,
    #[arg(long, env = "ATTENDANCE_LAYOUT", value_enum, default_value_t = Layout::Auto)]
    pub layout: Layout,
}

fn parse_weekday(value: &str) -> Result<Weekday, String> {
    value
        .trim()
        .parse::<Weekday>()
        .map_err(|_| format!("unknown weekday '{value}'"))
}

/// Heuristics applied while turning raw cells into a calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendancePolicy {
    pub date_order: DateOrder,
    pub weekend_days: Vec<Weekday>,
    pub presence_contains: Vec<String>,
    pub presence_exact: Vec<String>,
    pub late_tokens: Vec<String>,
    pub layout: Layout,
}

impl Default for AttendancePolicy {
    fn default() -> Self {
        Self {
            date_order: DateOrder::Dmy,
            weekend_days: vec![Weekday::Sun],
            presence_contains: vec!["p".to_string(), "present".to_string()],
            presence_exact: vec!["1".to_string()],
            late_tokens: vec!["late".to_string(), "delay".to_string()],
            layout: Layout::Auto,
        }
    }
}

impl AttendancePolicy {
    pub fn is_weekend(&self, weekday: Weekday) -> bool {
        self.weekend_days.contains(&weekday)
    }
}

fn lowered(tokens: Vec<String>) -> Vec<String> {
    tokens
        .into_iter()
        .map(|token| token.trim().to_lowercase())
        .filter(|token| !token.is_empty())
        .collect()
}

impl From<PolicyArgs> for AttendancePolicy {
    fn from(args: PolicyArgs) -> Self {
        Self {
            date_order: args.date_order,
            weekend_days: args.weekend_days,
            presence_contains: lowered(args.presence_contains),
            presence_exact: lowered(args.presence_exact),
            late_tokens: lowered(args.late_tokens),
            layout: args.layout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        policy: PolicyArgs,
    }

    #[test]
    fn defaults_match_policy_default() {
        let harness = Harness::try_parse_from(["test"]).unwrap();
        let policy = AttendancePolicy::from(harness.policy);
        assert_eq!(policy, AttendancePolicy::default());
    }

    #[test]
    fn weekend_days_accept_comma_list() {
        let harness =
            Harness::try_parse_from(["test", "--weekend-days", "sat,Sunday"]).unwrap();
        let policy = AttendancePolicy::from(harness.policy);
        assert!(policy.is_weekend(Weekday::Sat));
        assert!(policy.is_weekend(Weekday::Sun));
        assert!(!policy.is_weekend(Weekday::Mon));
    }

    #[test]
    fn tokens_are_normalised() {
        let harness =
            Harness::try_parse_from(["test", "--presence-contains", " Present ,HERE"]).unwrap();
        let policy = AttendancePolicy::from(harness.policy);
        assert_eq!(policy.presence_contains, vec!["present", "here"]);
    }

    #[test]
    fn rejects_unknown_weekday() {
        assert!(Harness::try_parse_from(["test", "--weekend-days", "funday"]).is_err());
    }
}
