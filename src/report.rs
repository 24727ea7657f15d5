use std::fmt::Write;

use crate::models::{
    AttendanceSummary, DayRecord, DayStatus, MonthBucket, StudentProfile, TimeStatus,
};

fn dates_with<F>(month: &MonthBucket, keep: F) -> Vec<String>
where
    F: Fn(&DayRecord) -> bool,
{
    month
        .days
        .iter()
        .filter(|day| keep(day))
        .map(|day| day.date.format("%d %b").to_string())
        .collect()
}

pub fn build_report(student: &StudentProfile, attendance: &AttendanceSummary) -> String {
    let mut output = String::new();
    let ytd = &attendance.year_to_date;

    let _ = writeln!(output, "# Attendance Report");
    let _ = writeln!(
        output,
        "{} (roll {}, class {})",
        student.name, student.roll_number, student.class
    );
    if !student.school.is_empty() {
        let _ = writeln!(output, "{}", student.school);
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "## Year to Date");
    let _ = writeln!(
        output,
        "- {}% attendance: {} present, {} absent, {} late across {} school days",
        ytd.percentage, ytd.days_present, ytd.days_absent, ytd.days_late, ytd.total_days
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Months");

    if attendance.months.is_empty() {
        let _ = writeln!(output, "No attendance recorded.");
        return output;
    }

    let _ = writeln!(output, "| Month | School days | Present | Absent | Late | % |");
    let _ = writeln!(output, "|---|---|---|---|---|---|");
    for month in &attendance.months {
        let _ = writeln!(
            output,
            "| {} {} | {} | {} | {} | {} | {} |",
            month.month_name,
            month.year,
            month.total_days,
            month.days_present,
            month.days_absent,
            month.days_late,
            month.percentage
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Absences and Late Arrivals");
    let mut any = false;
    for month in &attendance.months {
        let absent = dates_with(month, |day| day.status == DayStatus::Absent);
        let late = dates_with(month, |day| day.time_status == TimeStatus::Late);
        if absent.is_empty() && late.is_empty() {
            continue;
        }
        any = true;
        let _ = writeln!(output, "- {} {}", month.month_name, month.year);
        if !absent.is_empty() {
            let _ = writeln!(output, "  - absent: {}", absent.join(", "));
        }
        if !late.is_empty() {
            let _ = writeln!(output, "  - late: {}", late.join(", "));
        }
    }
    if !any {
        let _ = writeln!(output, "None.");
    }

    output
}
