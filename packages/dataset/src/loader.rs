//! Reads surveillance files into a [`Dataset`].
//!
//! Both CSV and workbook inputs are first flattened into a [`RawTable`]
//! of loosely-typed cells, then validated and converted into
//! [`Observation`]s in one place so that every format reports errors the
//! same way.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use calamine::{Data, Reader, Sheets, open_workbook_auto, open_workbook_auto_from_rs};
use chrono::NaiveDate;
use malaria_forecast_surveillance_models::{
    COUNTY_COLUMN, DATE_COLUMN, Observation, REGION_COLUMN, REQUIRED_COLUMNS,
};

use crate::parsing::{normalize_header, parse_date_str, parse_number_str, spreadsheet_serial_to_date};
use crate::{Dataset, DatasetError};

/// Input file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Comma-separated values.
    Csv,
    /// Any workbook `calamine` can read (`xlsx`, `xlsm`, `xlsb`, `xls`,
    /// `ods`). Only the first worksheet is used.
    Spreadsheet,
}

impl FileFormat {
    /// Resolves a format from a file extension or format name.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::UnsupportedFormat`] for unknown names.
    pub fn from_extension(ext: &str) -> Result<Self, DatasetError> {
        match ext.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(Self::Spreadsheet),
            other => Err(DatasetError::UnsupportedFormat {
                format: other.to_string(),
            }),
        }
    }

    /// Resolves a format from a path's extension.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::UnsupportedFormat`] if the path has no
    /// extension or an unknown one.
    pub fn from_path(path: &Path) -> Result<Self, DatasetError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        Self::from_extension(ext)
    }
}

/// A loosely-typed cell as read from the source file.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    /// No value.
    Empty,
    /// Text (every CSV cell arrives as text).
    Text(String),
    /// A numeric spreadsheet cell.
    Number(f64),
    /// A spreadsheet cell formatted as a date, as a serial number.
    DateSerial(f64),
}

impl RawCell {
    fn describe(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(s) => s.clone(),
            Self::Number(n) | Self::DateSerial(n) => n.to_string(),
        }
    }
}

impl From<&Data> for RawCell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Self::Empty,
            Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => {
                if s.trim().is_empty() {
                    Self::Empty
                } else {
                    Self::Text(s.clone())
                }
            }
            #[allow(clippy::cast_precision_loss)]
            Data::Int(i) => Self::Number(*i as f64),
            Data::Float(f) => Self::Number(*f),
            Data::Bool(b) => Self::Text(b.to_string()),
            Data::DateTime(dt) => Self::DateSerial(dt.as_f64()),
            Data::Error(e) => Self::Text(e.to_string()),
        }
    }
}

/// Header row plus data rows, before validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    /// Header cells, as written in the file.
    pub headers: Vec<String>,
    /// Data rows, in file order.
    pub rows: Vec<Vec<RawCell>>,
}

/// Loads a surveillance file from disk, choosing the reader from the file
/// extension.
///
/// # Errors
///
/// Returns [`DatasetError`] if the file cannot be read, is in an
/// unsupported format, lacks a required column, or contains a cell that
/// cannot be parsed.
pub fn load_path(path: &Path) -> Result<Dataset, DatasetError> {
    let format = FileFormat::from_path(path)?;
    log::info!("Loading {} as {format:?}", path.display());

    let raw = match format {
        FileFormat::Csv => read_csv(File::open(path)?)?,
        FileFormat::Spreadsheet => {
            let mut workbook = open_workbook_auto(path)?;
            read_first_sheet(&mut workbook)?
        }
    };

    build_dataset(raw)
}

/// Loads a surveillance file held in memory (e.g. an upload).
///
/// # Errors
///
/// Returns [`DatasetError`] under the same conditions as [`load_path`].
pub fn load_bytes(bytes: &[u8], format: FileFormat) -> Result<Dataset, DatasetError> {
    log::debug!("Loading {} byte upload as {format:?}", bytes.len());

    let raw = match format {
        FileFormat::Csv => read_csv(bytes)?,
        FileFormat::Spreadsheet => {
            let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
            read_first_sheet(&mut workbook)?
        }
    };

    build_dataset(raw)
}

/// Reads a CSV stream into a [`RawTable`].
///
/// # Errors
///
/// Returns [`DatasetError::Csv`] on malformed input (including rows with a
/// different number of fields than the header).
pub fn read_csv<R: Read>(reader: R) -> Result<RawTable, DatasetError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.iter().map(String::from).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        RawCell::Empty
                    } else {
                        RawCell::Text(field.to_string())
                    }
                })
                .collect(),
        );
    }

    Ok(RawTable { headers, rows })
}

/// Reads the first worksheet of a workbook into a [`RawTable`]. The first
/// row is the header.
///
/// # Errors
///
/// Returns [`DatasetError::EmptyWorkbook`] if there is no worksheet, or
/// [`DatasetError::Spreadsheet`] if the sheet cannot be decoded.
pub fn read_first_sheet<RS: Read + Seek>(workbook: &mut Sheets<RS>) -> Result<RawTable, DatasetError> {
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(DatasetError::EmptyWorkbook)??;

    let mut rows = range.rows();
    let headers = rows
        .next()
        .map(|row| row.iter().map(|cell| RawCell::from(cell).describe()).collect())
        .unwrap_or_default();
    let rows = rows
        .map(|row| row.iter().map(RawCell::from).collect())
        .collect();

    Ok(RawTable { headers, rows })
}

/// Column positions of the required fields within a [`RawTable`].
struct ColumnIndex {
    positions: BTreeMap<&'static str, usize>,
}

impl ColumnIndex {
    fn resolve(headers: &[String]) -> Result<Self, DatasetError> {
        let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();
        let mut positions = BTreeMap::new();
        for column in REQUIRED_COLUMNS {
            let pos = normalized
                .iter()
                .position(|h| h == column)
                .ok_or_else(|| DatasetError::MissingColumn {
                    column: (*column).to_string(),
                })?;
            positions.insert(*column, pos);
        }
        Ok(Self { positions })
    }

    fn cell<'a>(&self, row: &'a [RawCell], column: &str) -> &'a RawCell {
        self.positions
            .get(column)
            .and_then(|&pos| row.get(pos))
            .unwrap_or(&RawCell::Empty)
    }
}

/// Validates a [`RawTable`] and converts it into a sorted [`Dataset`].
///
/// Rows in which every cell is empty are skipped (workbooks often carry
/// trailing blank rows).
///
/// # Errors
///
/// Returns [`DatasetError::MissingColumn`] for the first absent required
/// column, or a row-numbered parse error for the first bad cell.
pub fn build_dataset(raw: RawTable) -> Result<Dataset, DatasetError> {
    let columns = ColumnIndex::resolve(&raw.headers)?;
    let mut observations = Vec::with_capacity(raw.rows.len());

    for (i, row) in raw.rows.iter().enumerate() {
        // Row 1 is the header.
        let row_number = i + 2;

        if row.iter().all(|cell| *cell == RawCell::Empty) {
            continue;
        }

        observations.push(Observation {
            date: date_cell(columns.cell(row, DATE_COLUMN), row_number)?,
            region: text_cell(columns.cell(row, REGION_COLUMN), REGION_COLUMN, row_number)?,
            county: text_cell(columns.cell(row, COUNTY_COLUMN), COUNTY_COLUMN, row_number)?,
            total_cases: number_cell(columns.cell(row, "total_cases"), "total_cases", row_number)?,
            severe_cases: number_cell(
                columns.cell(row, "severe_cases"),
                "severe_cases",
                row_number,
            )?,
            deaths: number_cell(columns.cell(row, "deaths"), "deaths", row_number)?,
            mosquito_density: number_cell(
                columns.cell(row, "mosquito_density"),
                "mosquito_density",
                row_number,
            )?,
        });
    }

    let dataset = Dataset::new(observations);
    log::info!(
        "Loaded {} observations across {} region(s)",
        dataset.len(),
        dataset.regions().len()
    );
    Ok(dataset)
}

fn date_cell(cell: &RawCell, row: usize) -> Result<NaiveDate, DatasetError> {
    let parsed = match cell {
        RawCell::Text(s) => parse_date_str(s),
        RawCell::Number(n) | RawCell::DateSerial(n) => spreadsheet_serial_to_date(*n),
        RawCell::Empty => None,
    };
    parsed.ok_or_else(|| DatasetError::InvalidDate {
        row,
        value: cell.describe(),
    })
}

fn text_cell(cell: &RawCell, column: &str, row: usize) -> Result<String, DatasetError> {
    match cell {
        RawCell::Text(s) => Ok(s.trim().to_string()),
        // Numeric codes used as county identifiers.
        RawCell::Number(n) | RawCell::DateSerial(n) => Ok(n.to_string()),
        RawCell::Empty => Err(DatasetError::InvalidText {
            row,
            column: column.to_string(),
        }),
    }
}

fn number_cell(cell: &RawCell, column: &str, row: usize) -> Result<f64, DatasetError> {
    let parsed = match cell {
        RawCell::Number(n) => n.is_finite().then_some(*n),
        RawCell::Text(s) => parse_number_str(s),
        RawCell::DateSerial(_) | RawCell::Empty => None,
    };
    parsed.ok_or_else(|| DatasetError::InvalidNumber {
        row,
        column: column.to_string(),
        value: cell.describe(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
date,region,county,total_cases,severe_cases,deaths,mosquito_density
2024-01-14,Coast,Kilifi,130,12,1,3.1
2024-01-07,Coast,Kilifi,120,10,2,2.9
2024-01-07,Nyanza,Kisumu,300,40,5,6.2
";

    #[test]
    fn loads_csv_sorted_by_date() {
        let dataset = load_bytes(CSV.as_bytes(), FileFormat::Csv).unwrap();
        assert_eq!(dataset.len(), 3);
        let obs = dataset.observations();
        assert!(obs.windows(2).all(|w| w[0].date <= w[1].date));
        assert_eq!(obs[0].county, "Kilifi");
        assert!((obs[0].total_cases - 120.0).abs() < f64::EPSILON);
        assert_eq!(obs[1].county, "Kisumu");
        assert!((obs[2].mosquito_density - 3.1).abs() < f64::EPSILON);
    }

    #[test]
    fn matches_headers_case_insensitively_in_any_order() {
        let csv = "\
County,Region,Deaths,Date,Mosquito_Density,Severe_Cases,Total_Cases
Kilifi,Coast,1,2024-01-14,3.1,12,130
";
        let dataset = load_bytes(csv.as_bytes(), FileFormat::Csv).unwrap();
        let obs = &dataset.observations()[0];
        assert_eq!(obs.region, "Coast");
        assert_eq!(obs.county, "Kilifi");
        assert!((obs.total_cases - 130.0).abs() < f64::EPSILON);
        assert!((obs.deaths - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn reports_missing_column_by_name() {
        let csv = "date,region,county,total_cases,severe_cases,deaths\n2024-01-07,Coast,Kilifi,1,1,1\n";
        let err = load_bytes(csv.as_bytes(), FileFormat::Csv).unwrap_err();
        match err {
            DatasetError::MissingColumn { column } => assert_eq!(column, "mosquito_density"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn reports_bad_date_with_row_number() {
        let csv = "\
date,region,county,total_cases,severe_cases,deaths,mosquito_density
2024-01-07,Coast,Kilifi,1,1,1,1
someday,Coast,Kilifi,1,1,1,1
";
        let err = load_bytes(csv.as_bytes(), FileFormat::Csv).unwrap_err();
        match err {
            DatasetError::InvalidDate { row, value } => {
                assert_eq!(row, 3);
                assert_eq!(value, "someday");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn reports_bad_number_with_column() {
        let csv = "\
date,region,county,total_cases,severe_cases,deaths,mosquito_density
2024-01-07,Coast,Kilifi,many,1,1,1
";
        let err = load_bytes(csv.as_bytes(), FileFormat::Csv).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::InvalidNumber { row: 2, ref column, .. } if column == "total_cases"
        ));
    }

    #[test]
    fn skips_blank_rows() {
        let raw = RawTable {
            headers: REQUIRED_COLUMNS.iter().map(|c| (*c).to_string()).collect(),
            rows: vec![
                vec![
                    RawCell::DateSerial(45_306.0),
                    RawCell::Text("Coast".to_string()),
                    RawCell::Text("Kilifi".to_string()),
                    RawCell::Number(10.0),
                    RawCell::Number(2.0),
                    RawCell::Number(0.0),
                    RawCell::Number(1.5),
                ],
                vec![RawCell::Empty; REQUIRED_COLUMNS.len()],
            ],
        };
        let dataset = build_dataset(raw).unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.observations()[0].date.to_string(), "2024-01-15");
    }

    #[test]
    fn resolves_formats_from_extensions() {
        assert_eq!(FileFormat::from_extension("CSV").unwrap(), FileFormat::Csv);
        assert_eq!(
            FileFormat::from_extension(".xlsx").unwrap(),
            FileFormat::Spreadsheet
        );
        assert_eq!(
            FileFormat::from_path(Path::new("data/malaria.ods")).unwrap(),
            FileFormat::Spreadsheet
        );
        assert!(FileFormat::from_extension("json").is_err());
        assert!(FileFormat::from_path(Path::new("malaria")).is_err());
    }

    /// First sheet holds four rows out of date order: three date-formatted
    /// serial cells and one text date. A second sheet holds notes.
    const WORKBOOK: &[u8] = include_bytes!("../fixtures/surveillance.xlsx");

    fn workbook_path() -> std::path::PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("fixtures")
            .join("surveillance.xlsx")
    }

    fn rows(dataset: &Dataset) -> Vec<(String, &str, f64)> {
        dataset
            .observations()
            .iter()
            .map(|o| (o.date.to_string(), o.county.as_str(), o.total_cases))
            .collect()
    }

    #[test]
    fn loads_workbook_upload_with_date_cells() {
        let dataset = load_bytes(WORKBOOK, FileFormat::Spreadsheet).unwrap();
        assert_eq!(
            rows(&dataset),
            [
                ("2024-01-08".to_string(), "Mombasa", 90.0),
                ("2024-01-15".to_string(), "Kilifi", 120.0),
                ("2024-01-22".to_string(), "Kilifi", 130.0),
                ("2024-01-29".to_string(), "Kisumu", 210.0),
            ]
        );
        let kilifi = &dataset.observations()[2];
        assert_eq!(kilifi.region, "Coast");
        assert!((kilifi.severe_cases - 12.0).abs() < f64::EPSILON);
        assert!((kilifi.deaths - 1.0).abs() < f64::EPSILON);
        assert!((kilifi.mosquito_density - 3.4).abs() < 1e-12);
        assert_eq!(dataset.regions(), ["Coast", "Lake"]);
    }

    #[test]
    fn loads_workbook_from_path_using_first_sheet() {
        let path = workbook_path();
        assert_eq!(FileFormat::from_path(&path).unwrap(), FileFormat::Spreadsheet);

        let from_disk = load_path(&path).unwrap();
        let from_memory = load_bytes(WORKBOOK, FileFormat::Spreadsheet).unwrap();
        assert_eq!(from_disk.len(), 4);
        assert_eq!(rows(&from_disk), rows(&from_memory));
    }

    #[test]
    fn workbook_date_cells_become_serials() {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(WORKBOOK)).unwrap();
        let raw = read_first_sheet(&mut workbook).unwrap();
        assert_eq!(raw.headers[0], "Date");
        assert_eq!(raw.rows.len(), 4);
        assert!(matches!(raw.rows[0][0], RawCell::DateSerial(v) if (v - 45_313.0).abs() < 1e-9));
        assert!(matches!(raw.rows[3][0], RawCell::Text(ref s) if s == "2024-01-29"));
    }

    #[test]
    fn rejects_garbage_workbook() {
        assert!(load_bytes(b"definitely not a zip", FileFormat::Spreadsheet).is_err());
    }
}
