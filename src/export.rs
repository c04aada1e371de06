//! Export/report view: a pure projection of assignments in a date range,
//! materialized as a single-sheet spreadsheet. Recomputed on demand; nothing
//! is cached and nothing is mutated.

use std::path::{Path, PathBuf};

use rust_xlsxwriter::Workbook;

use crate::cache::EntityCache;
use crate::time::{format_ko, parse_date};
use crate::{AppError, AppResult};

pub const SHEET_NAME: &str = "객실배정";
pub const COLUMNS: [&str; 5] = ["날짜", "직원", "객실", "상태", "배정 시간"];
pub const STATUS_DONE: &str = "완료";
pub const STATUS_PENDING: &str = "대기중";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub date: String,
    pub worker: String,
    pub room: String,
    pub status: String,
    pub assigned_at: String,
}

/// Project assignments whose date falls inside `[start, end]` (inclusive)
/// into report rows, in stored order. Both bounds are required user input.
pub fn report_rows(cache: &EntityCache, start: &str, end: &str) -> AppResult<Vec<ReportRow>> {
    if start.trim().is_empty() || end.trim().is_empty() {
        return Err(AppError::new(
            "EXPORT/RANGE_REQUIRED",
            "시작일과 종료일을 모두 선택해주세요",
        ));
    }
    parse_date(start)?;
    parse_date(end)?;

    Ok(cache
        .assignments()
        .into_iter()
        .map(|doc| doc.value)
        .filter(|assignment| assignment.date.as_str() >= start && assignment.date.as_str() <= end)
        .map(|assignment| ReportRow {
            date: assignment.date.clone(),
            worker: cache.worker_name(assignment.worker_id),
            room: cache.room_number(assignment.room_id),
            status: if assignment.completed {
                STATUS_DONE.to_string()
            } else {
                STATUS_PENDING.to_string()
            },
            assigned_at: format_ko(&assignment.assigned_at),
        })
        .collect())
}

/// Workbook file name for a date range, e.g. `객실배정-2024-01-01-2024-01-31.xlsx`.
pub fn workbook_filename(start: &str, end: &str) -> String {
    format!("{SHEET_NAME}-{start}-{end}.xlsx")
}

/// Write the rows as a single-sheet workbook under `out_dir` and return the
/// file path.
pub fn write_workbook(
    rows: &[ReportRow],
    start: &str,
    end: &str,
    out_dir: &Path,
) -> AppResult<PathBuf> {
    let path = out_dir.join(workbook_filename(start, end));
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME).map_err(|err| {
        AppError::new("EXPORT/WRITE", err.to_string()).with_context("stage", "sheet_name")
    })?;

    for (col, header) in COLUMNS.iter().enumerate() {
        worksheet
            .write_string(0, col as u16, *header)
            .map_err(|err| AppError::new("EXPORT/WRITE", err.to_string()))?;
    }
    for (index, row) in rows.iter().enumerate() {
        let excel_row = (index + 1) as u32;
        let cells = [
            row.date.as_str(),
            row.worker.as_str(),
            row.room.as_str(),
            row.status.as_str(),
            row.assigned_at.as_str(),
        ];
        for (col, cell) in cells.iter().enumerate() {
            worksheet
                .write_string(excel_row, col as u16, *cell)
                .map_err(|err| AppError::new("EXPORT/WRITE", err.to_string()))?;
        }
    }

    workbook.save(&path).map_err(|err| {
        AppError::new("EXPORT/WRITE", err.to_string())
            .with_context("path", path.display().to_string())
    })?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_embeds_the_range() {
        assert_eq!(
            workbook_filename("2024-01-01", "2024-01-31"),
            "객실배정-2024-01-01-2024-01-31.xlsx"
        );
    }

    #[test]
    fn missing_bounds_are_rejected_before_computation() {
        let cache = EntityCache::new(true);
        let err = report_rows(&cache, "", "2024-01-02").unwrap_err();
        assert_eq!(err.code(), "EXPORT/RANGE_REQUIRED");
        let err = report_rows(&cache, "2024-01-01", " ").unwrap_err();
        assert_eq!(err.code(), "EXPORT/RANGE_REQUIRED");
    }

    #[test]
    fn malformed_bounds_are_rejected() {
        let cache = EntityCache::new(true);
        let err = report_rows(&cache, "2024-13-01", "2024-01-02").unwrap_err();
        assert_eq!(err.code(), "TIME/INVALID_DATE");
    }
}
