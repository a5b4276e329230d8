use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};
use failure::Error;

/// One row of the review assignment sheet handed to subject-matter experts.
#[derive(Clone, Debug, PartialEq)]
pub struct AssignmentRow {
    pub full_name: String,
    pub web_view_link: String,
    pub folder_id: String,
}

/// Write the assignment sheet: one row per layer folder, no header.
pub fn write_assignment_sheet(path: &Path, rows: &[AssignmentRow]) -> Result<(), Error> {
    let mut writer = WriterBuilder::new().has_headers(false).from_path(path)?;

    for row in rows {
        writer.write_record(&[&row.full_name, &row.web_view_link, &row.folder_id])?;
    }

    writer.flush()?;

    Ok(())
}

/// Read a sign-off sheet and collect the folder ids of rows whose status
/// column contains `done` (case-insensitive). The sheet carries the status
/// in the second column and the folder id in the fourth.
pub fn completed_folder_ids<R: Read>(reader: R) -> Result<Vec<String>, Error> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut folder_ids = Vec::new();

    for record in csv_reader.records() {
        let record = record?;

        let status = record.get(1).unwrap_or("");
        if !status.to_lowercase().contains("done") {
            continue;
        }

        if let Some(folder_id) = record.get(3) {
            folder_ids.push(folder_id.to_string());
        }
    }

    Ok(folder_ids)
}
