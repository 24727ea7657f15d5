use crate::attendance;
use crate::columns::detect_column_groups;
use crate::config::{AttendancePolicy, Layout};
use crate::dates::parse_date;
use crate::error::ApiError;
use crate::headers::{find_column, ColumnRole};
use crate::models::{AttendanceEntry, AttendanceSummary, ColumnGroup, StudentProfile};
use crate::source::{cell, CellGrid};

fn matches_roll(value: &str, roll: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && value.eq_ignore_ascii_case(roll.trim())
}

fn role_cell(header: &[String], row: &[String], role: ColumnRole) -> String {
    find_column(header, role)
        .map(|col| cell(row, col).to_string())
        .unwrap_or_default()
}

pub fn find_student(grid: &CellGrid, roll: &str) -> Result<StudentProfile, ApiError> {
    if grid.data_rows().is_empty() {
        return Err(ApiError::not_found("No data found in Students sheet"));
    }

    let header = grid.header();
    let id_col = find_column(header, ColumnRole::Identifier)
        .ok_or_else(|| ApiError::bad_request("Roll number column not found in Students sheet"))?;

    let row = grid
        .data_rows()
        .iter()
        .find(|row| matches_roll(cell(row, id_col), roll))
        .ok_or_else(|| ApiError::not_found("Student not found"))?;

    Ok(StudentProfile {
        roll_number: cell(row, id_col).to_string(),
        name: role_cell(header, row, ColumnRole::Name),
        class: role_cell(header, row, ColumnRole::Class),
        school: role_cell(header, row, ColumnRole::School),
        dob: role_cell(header, row, ColumnRole::DateOfBirth),
        father_name: role_cell(header, row, ColumnRole::FatherName),
        mother_name: role_cell(header, row, ColumnRole::MotherName),
    })
}

enum Resolved {
    Tall,
    Wide(Vec<ColumnGroup>),
}

fn resolve_layout(header: &[String], id_col: usize, policy: &AttendancePolicy) -> Resolved {
    match policy.layout {
        Layout::Tall => Resolved::Tall,
        Layout::Wide => Resolved::Wide(detect_column_groups(header, id_col, policy.date_order)),
        Layout::Auto => {
            let groups = detect_column_groups(header, id_col, policy.date_order);
            if groups.len() <= 1 && find_column(header, ColumnRole::Date).is_some() {
                Resolved::Tall
            } else {
                Resolved::Wide(groups)
            }
        }
    }
}

/// Builds the attendance calendar for one student from a tall or wide range.
pub fn attendance_for(
    grid: &CellGrid,
    roll: &str,
    policy: &AttendancePolicy,
) -> Result<AttendanceSummary, ApiError> {
    if grid.data_rows().is_empty() {
        return Err(ApiError::not_found("No attendance data found"));
    }

    let header = grid.header();
    let id_col = find_column(header, ColumnRole::Identifier).ok_or_else(|| {
        ApiError::bad_request("Roll number column not found in Attendance sheet")
    })?;

    match resolve_layout(header, id_col, policy) {
        Resolved::Tall => tall_attendance(grid, id_col, roll, policy),
        Resolved::Wide(groups) => wide_attendance(grid, id_col, &groups, roll, policy),
    }
}

fn tall_attendance(
    grid: &CellGrid,
    id_col: usize,
    roll: &str,
    policy: &AttendancePolicy,
) -> Result<AttendanceSummary, ApiError> {
    let header = grid.header();
    let date_col = find_column(header, ColumnRole::Date)
        .ok_or_else(|| ApiError::bad_request("No date columns found in Attendance sheet"))?;
    let status_col = find_column(header, ColumnRole::Status)
        .ok_or_else(|| ApiError::bad_request("Status column not found in Attendance sheet"))?;
    let time_col = find_column(header, ColumnRole::Time);

    let rows: Vec<&Vec<String>> = grid
        .data_rows()
        .iter()
        .filter(|row| matches_roll(cell(row, id_col), roll))
        .collect();
    if rows.is_empty() {
        return Err(ApiError::not_found(
            "No attendance records found for this student",
        ));
    }

    tracing::debug!(rows = rows.len(), "reading tall attendance layout");
    let entries = rows.into_iter().map(|row| AttendanceEntry {
        date: cell(row, date_col),
        status: cell(row, status_col),
        time: time_col.map(|col| cell(row, col)),
    });
    Ok(attendance::aggregate(entries, policy))
}

fn wide_attendance(
    grid: &CellGrid,
    id_col: usize,
    groups: &[ColumnGroup],
    roll: &str,
    policy: &AttendancePolicy,
) -> Result<AttendanceSummary, ApiError> {
    if groups.is_empty() {
        return Err(ApiError::bad_request(
            "No date columns found in Attendance sheet",
        ));
    }

    let header = grid.header();
    let row = grid
        .data_rows()
        .iter()
        .find(|row| matches_roll(cell(row, id_col), roll))
        .ok_or_else(|| ApiError::not_found("No attendance records found for this student"))?;

    tracing::debug!(groups = groups.len(), "reading wide attendance layout");
    let entries = groups.iter().map(|group| {
        // The date lives in the row when the header is a plain "Date" label.
        let row_date = cell(row, group.date_col);
        let date = if parse_date(row_date, policy.date_order).is_some() {
            row_date
        } else {
            cell(header, group.date_col)
        };
        AttendanceEntry {
            date,
            status: cell(row, group.status_col),
            time: Some(cell(row, group.time_col)),
        }
    });
    Ok(attendance::aggregate(entries, policy))
}
