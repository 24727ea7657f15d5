use crate::config::DateOrder;
use crate::dates::{has_numeric_date_shape, parse_date};
use crate::headers::ColumnRole;
use crate::models::ColumnGroup;

const STATUS_LOOKAHEAD: usize = 3;
const TIME_LOOKAHEAD: usize = 2;

pub fn is_date_column(label: &str, order: DateOrder) -> bool {
    ColumnRole::Date.matches(label)
        || has_numeric_date_shape(label)
        || parse_date(label, order).is_some()
}

/// Finds the repeating (date, status, time) groups to the right of the identifier column.
///
/// Status and time columns are located by header name within a short lookahead and
/// otherwise default to the next column, even past the end of the header row; cells
/// beyond a row's end read as empty. The scan resumes after each group's time column,
/// so a defaulted time column is never reconsidered as a date.
pub fn detect_column_groups<S: AsRef<str>>(
    header: &[S],
    id_col: usize,
    order: DateOrder,
) -> Vec<ColumnGroup> {
    let width = header.len();
    let label = |index: usize| header.get(index).map(|label| label.as_ref()).unwrap_or("");
    let mut groups = Vec::new();
    let mut index = id_col + 1;

    while index < width {
        if !is_date_column(label(index), order) {
            index += 1;
            continue;
        }

        let status_col = (index + 1..=index + STATUS_LOOKAHEAD)
            .take_while(|&col| col < width)
            .find(|&col| ColumnRole::Status.matches(label(col)))
            .unwrap_or(index + 1);

        let time_col = (status_col + 1..=status_col + TIME_LOOKAHEAD)
            .take_while(|&col| col < width)
            .find(|&col| ColumnRole::Time.matches(label(col)))
            .unwrap_or(status_col + 1);

        groups.push(ColumnGroup {
            date_col: index,
            status_col,
            time_col,
        });
        index = time_col + 1;
    }

    groups
}
