//! Result-set export to CSV and Excel files.
//!
//! Both writers emit the same fixed 16-column schema, one row per record,
//! into a timestamped file under the configured export directory. The
//! directory is created on demand.

use std::fs;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::Workbook;

use crate::error::{HarvestError, Result};
use crate::types::Business;

/// Export column headers, in row order.
pub const COLUMNS: [&str; 16] = [
    "Id",
    "BusinessName",
    "RealCategory",
    "Category",
    "Address",
    "City",
    "State",
    "PostalCode",
    "Country",
    "Phone",
    "Email",
    "Website",
    "Latitude",
    "Longitude",
    "MapsLink",
    "DetailsLink",
];

/// One record flattened into export cells, in column order.
fn row_cells(record: &Business) -> [String; 16] {
    [
        record.id.clone(),
        record.business_name.clone(),
        record.real_category.clone(),
        record.category.clone(),
        record.address.clone(),
        record.city.clone(),
        record.state.clone(),
        record.postal_code.clone(),
        record.country.clone(),
        record.phone.clone(),
        record.email.clone().unwrap_or_default(),
        record.website.clone().unwrap_or_default(),
        record.latitude.map(|v| v.to_string()).unwrap_or_default(),
        record.longitude.map(|v| v.to_string()).unwrap_or_default(),
        record.maps_link.clone(),
        record.details_link.clone().unwrap_or_default(),
    ]
}

/// Timestamped export file path under `dir`, creating the directory.
fn export_path(dir: &Path, extension: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .map_err(|e| HarvestError::Export(format!("cannot create export directory: {e}")))?;
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    Ok(dir.join(format!("business_export_{timestamp}.{extension}")))
}

/// Write the records to a timestamped CSV file, returning its path.
///
/// # Errors
///
/// Returns [`HarvestError::Export`] on any filesystem or writer failure.
pub fn export_to_csv(records: &[Business], dir: &Path) -> Result<PathBuf> {
    let path = export_path(dir, "csv")?;
    let mut writer = csv::Writer::from_path(&path)
        .map_err(|e| HarvestError::Export(format!("cannot open CSV file: {e}")))?;

    writer
        .write_record(COLUMNS)
        .map_err(|e| HarvestError::Export(format!("CSV header write failed: {e}")))?;
    for record in records {
        writer
            .write_record(row_cells(record))
            .map_err(|e| HarvestError::Export(format!("CSV row write failed: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| HarvestError::Export(format!("CSV flush failed: {e}")))?;

    tracing::info!(count = records.len(), path = %path.display(), "CSV export written");
    Ok(path)
}

/// Write the records to a timestamped Excel workbook, returning its path.
///
/// # Errors
///
/// Returns [`HarvestError::Export`] on any filesystem or writer failure.
pub fn export_to_excel(records: &[Business], dir: &Path) -> Result<PathBuf> {
    let path = export_path(dir, "xlsx")?;
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (col, header) in COLUMNS.iter().enumerate() {
        worksheet
            .write_string(0, col as u16, *header)
            .map_err(|e| HarvestError::Export(format!("Excel header write failed: {e}")))?;
    }
    for (row, record) in records.iter().enumerate() {
        for (col, cell) in row_cells(record).iter().enumerate() {
            worksheet
                .write_string((row + 1) as u32, col as u16, cell)
                .map_err(|e| HarvestError::Export(format!("Excel cell write failed: {e}")))?;
        }
    }

    workbook
        .save(&path)
        .map_err(|e| HarvestError::Export(format!("Excel save failed: {e}")))?;

    tracing::info!(count = records.len(), path = %path.display(), "Excel export written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> Business {
        Business {
            id: "p-1".into(),
            business_name: "Acme, Dental".into(),
            real_category: "dentist".into(),
            category: "dentist".into(),
            address: "Main St 1".into(),
            city: "Berlin".into(),
            state: "Berlin".into(),
            postal_code: "10115".into(),
            country: "Germany".into(),
            phone: "+49 30 123".into(),
            email: Some("frontdesk@acme.io".into()),
            website: Some("https://acme.io".into()),
            latitude: Some(52.5),
            longitude: Some(13.4),
            maps_link: "https://maps.example/p-1".into(),
            details_link: None,
        }
    }

    #[test]
    fn csv_export_writes_header_and_rows() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = export_to_csv(&[sample_record()], dir.path()).expect("export");
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("csv"));

        let content = std::fs::read_to_string(&path).expect("read back");
        let mut lines = content.lines();
        assert_eq!(
            lines.next().expect("header"),
            COLUMNS.join(",")
        );
        let row = lines.next().expect("row");
        // Comma inside a field must be quoted, not split.
        assert!(row.contains("\"Acme, Dental\""));
        assert!(row.contains("frontdesk@acme.io"));
        assert!(row.contains("52.5"));
        assert!(lines.next().is_none());
    }

    #[test]
    fn csv_export_empty_optionals_become_blank_cells() {
        let mut record = sample_record();
        record.email = None;
        record.latitude = None;
        let cells = row_cells(&record);
        assert_eq!(cells[10], "");
        assert_eq!(cells[12], "");
        assert_eq!(cells.len(), COLUMNS.len());
    }

    #[test]
    fn excel_export_creates_workbook_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = export_to_excel(&[sample_record(), sample_record()], dir.path())
            .expect("export");
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("xlsx"));
        let size = std::fs::metadata(&path).expect("metadata").len();
        assert!(size > 0);
    }

    #[test]
    fn export_creates_missing_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("nested").join("exports");
        let path = export_to_csv(&[sample_record()], &nested).expect("export");
        assert!(path.starts_with(&nested));
    }

    #[test]
    fn filename_is_timestamped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = export_path(dir.path(), "csv").expect("path");
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .expect("file name");
        assert!(name.starts_with("business_export_"));
        assert!(name.ends_with(".csv"));
    }
}
