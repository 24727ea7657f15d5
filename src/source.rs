#[cfg(test)]
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::config::{SourceArgs, SourceKind};

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Rows of cell text for one range. Row 0 is the header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellGrid {
    rows: Vec<Vec<String>>,
}

impl CellGrid {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    pub fn header(&self) -> &[String] {
        self.rows.first().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn data_rows(&self) -> &[Vec<String>] {
        self.rows.get(1..).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|row| row.iter().all(|cell| cell.trim().is_empty()))
    }
}

/// Cell text at `col`, empty when the row is shorter than the header.
pub fn cell(row: &[String], col: usize) -> &str {
    row.get(col).map(String::as_str).unwrap_or("")
}

/// Sheet part of an A1 range such as `Students!A:Z`.
pub fn sheet_name(range: &str) -> &str {
    range
        .split_once('!')
        .map_or(range, |(sheet, _)| sheet)
        .trim_matches('\'')
}

/// Backend the handlers read ranges from.
#[derive(Debug, Clone)]
pub enum GridSource {
    CsvDir(CsvDirSource),
    GoogleSheets(GoogleSheetsSource),
    #[cfg(test)]
    InMemory(HashMap<String, CellGrid>),
}

impl GridSource {
    pub fn from_args(args: &SourceArgs) -> anyhow::Result<Self> {
        match args.source {
            SourceKind::Csv => Ok(Self::CsvDir(CsvDirSource::new(&args.data_dir))),
            SourceKind::Google => {
                let sheet_id = args
                    .sheet_id
                    .clone()
                    .context("GOOGLE_SHEET_ID must be set for the google source")?;
                if args.api_key.is_none() && args.access_token.is_none() {
                    anyhow::bail!(
                        "GOOGLE_API_KEY or GOOGLE_ACCESS_TOKEN must be set for the google source"
                    );
                }
                Ok(Self::GoogleSheets(GoogleSheetsSource::new(
                    sheet_id,
                    args.api_key.clone(),
                    args.access_token.clone(),
                )))
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::CsvDir(_) => "csv",
            Self::GoogleSheets(_) => "google",
            #[cfg(test)]
            Self::InMemory(_) => "memory",
        }
    }

    /// Fetches a range. `Ok(None)` means the range exists but holds no cells.
    pub async fn fetch(&self, range: &str) -> anyhow::Result<Option<CellGrid>> {
        let grid = match self {
            Self::CsvDir(source) => source.fetch(range).await?,
            Self::GoogleSheets(source) => source.fetch(range).await?,
            #[cfg(test)]
            Self::InMemory(grids) => grids
                .get(sheet_name(range))
                .cloned()
                .with_context(|| format!("unknown range {range}"))?,
        };
        tracing::debug!(range, rows = grid.rows.len(), source = self.kind(), "fetched range");

        if grid.is_empty() {
            Ok(None)
        } else {
            Ok(Some(grid))
        }
    }
}

/// Serves each range from `<dir>/<sheet>.csv`.
#[derive(Debug, Clone)]
pub struct CsvDirSource {
    dir: PathBuf,
}

impl CsvDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, range: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", sheet_name(range)))
    }

    pub async fn fetch(&self, range: &str) -> anyhow::Result<CellGrid> {
        let path = self.path_for(range);
        tokio::task::spawn_blocking(move || read_csv(&path))
            .await
            .context("csv reader task failed")?
    }
}

fn read_csv(path: &Path) -> anyhow::Result<CellGrid> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("failed to read {}", path.display()))?;
        rows.push(record.iter().map(|cell| cell.trim().to_string()).collect());
    }

    Ok(CellGrid::new(rows))
}

/// Reads ranges through the Sheets v4 `values` endpoint.
#[derive(Debug, Clone)]
pub struct GoogleSheetsSource {
    client: reqwest::Client,
    sheet_id: String,
    api_key: Option<String>,
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

impl GoogleSheetsSource {
    pub fn new(sheet_id: String, api_key: Option<String>, access_token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            sheet_id,
            api_key,
            access_token,
        }
    }

    fn values_url(&self, range: &str) -> anyhow::Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(SHEETS_API).context("invalid Sheets API base url")?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Sheets API url cannot be a base"))?
            .push(&self.sheet_id)
            .push("values")
            .push(range);
        if let Some(key) = &self.api_key {
            url.query_pairs_mut().append_pair("key", key);
        }
        Ok(url)
    }

    pub async fn fetch(&self, range: &str) -> anyhow::Result<CellGrid> {
        let url = self.values_url(range)?;
        let mut request = self.client.get(url);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let body: ValueRange = request
            .send()
            .await
            .with_context(|| format!("failed to request range {range}"))?
            .error_for_status()
            .with_context(|| format!("Sheets API rejected range {range}"))?
            .json()
            .await
            .with_context(|| format!("invalid Sheets API response for {range}"))?;

        Ok(CellGrid::new(
            body.values
                .into_iter()
                .map(|row| row.into_iter().map(cell_text).collect())
                .collect(),
        ))
    }
}

fn cell_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text.trim().to_string(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheet_name_strips_a1_suffix() {
        assert_eq!(sheet_name("Students!A:Z"), "Students");
        assert_eq!(sheet_name("'Attendance 2024'!A1:Z"), "Attendance 2024");
        assert_eq!(sheet_name("Attendance"), "Attendance");
    }

    #[test]
    fn grid_accessors() {
        let grid = CellGrid::new(vec![
            vec!["Roll".to_string(), "Name".to_string()],
            vec!["1".to_string()],
        ]);
        assert_eq!(grid.header().len(), 2);
        assert_eq!(grid.data_rows().len(), 1);
        assert_eq!(cell(&grid.data_rows()[0], 1), "");
        assert!(CellGrid::default().data_rows().is_empty());
        assert!(CellGrid::new(vec![vec![" ".to_string()]]).is_empty());
    }

    #[test]
    fn json_cells_become_text() {
        assert_eq!(cell_text(serde_json::json!(" P ")), "P");
        assert_eq!(cell_text(serde_json::json!(12)), "12");
        assert_eq!(cell_text(serde_json::json!(true)), "true");
        assert_eq!(cell_text(serde_json::Value::Null), "");
    }

    #[test]
    fn values_url_encodes_range() {
        let source = GoogleSheetsSource::new("abc".to_string(), Some("k".to_string()), None);
        let url = source.values_url("Students!A:Z").unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc/values/Students!A:Z?key=k"
        );
    }

    #[tokio::test]
    async fn csv_source_reads_ragged_rows() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("Students.csv"),
            "Roll,Name,Class\n1, Asha ,5\n2,Ravi\n",
        )
        .unwrap();

        let source = GridSource::CsvDir(CsvDirSource::new(dir.path()));
        let grid = source.fetch("Students!A:Z").await.unwrap().unwrap();
        assert_eq!(grid.header(), ["Roll", "Name", "Class"]);
        assert_eq!(grid.data_rows()[0][1], "Asha");
        assert_eq!(grid.data_rows()[1].len(), 2);
    }

    #[tokio::test]
    async fn empty_csv_is_none() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Attendance.csv"), "").unwrap();
        let source = GridSource::CsvDir(CsvDirSource::new(dir.path()));
        assert!(source.fetch("Attendance").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_csv_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = GridSource::CsvDir(CsvDirSource::new(dir.path()));
        let err = source.fetch("Students").await.unwrap_err();
        assert!(err.to_string().contains("Students.csv"));
    }
}
