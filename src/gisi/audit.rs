use std::fs;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use failure::Error;
use serde::Serialize;

use crate::gisi::synchronizer;

/// Outputs whose named element carries no text at all.
pub fn outputs_with_empty_element(
    xml_paths: &[PathBuf],
    element_name: &str,
) -> Result<Vec<PathBuf>, Error> {
    let mut empties = Vec::new();

    for xml_path in xml_paths {
        let xml_bytes = fs::read(xml_path)?;
        if synchronizer::element_text(&xml_bytes, element_name)?.is_none() {
            empties.push(xml_path.clone());
        }
    }

    Ok(empties)
}

/// Outputs whose distribution section still carries the `empty` placeholder
/// instead of a real network resource.
pub fn outputs_with_placeholder_resources(xml_paths: &[PathBuf]) -> Result<Vec<PathBuf>, Error> {
    let mut placeholders = Vec::new();

    for xml_path in xml_paths {
        let xml_bytes = fs::read(xml_path)?;
        let has_placeholder = synchronizer::element_texts(&xml_bytes, "networkr")?
            .iter()
            .any(|text| text == "empty");

        if has_placeholder {
            placeholders.push(xml_path.clone());
        }
    }

    Ok(placeholders)
}

#[derive(Debug, Serialize)]
pub struct EmptyElementReport {
    pub empties: Vec<String>,
}

impl EmptyElementReport {
    pub fn new(empties: &[PathBuf]) -> Self {
        Self {
            empties: empties
                .iter()
                .map(|path| path.display().to_string())
                .collect(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), Error> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils;

    use super::*;

    #[test]
    fn finds_outputs_with_empty_elements() {
        let empty = test_utils::create_temp_file_with_suffix(
            ".xml",
            "<metadata><abstract/></metadata>",
        );
        let filled = test_utils::create_temp_file_with_suffix(
            ".xml",
            "<metadata><abstract>text</abstract></metadata>",
        );

        let paths = vec![empty.to_path_buf(), filled.to_path_buf()];

        let empties = outputs_with_empty_element(&paths, "abstract").unwrap();

        assert_eq!(empties, vec![empty.to_path_buf()]);
    }

    #[test]
    fn finds_outputs_with_placeholder_resources() {
        let placeholder = test_utils::create_temp_file_with_suffix(
            ".xml",
            "<metadata><networka><networkr>empty</networkr></networka></metadata>",
        );
        let linked = test_utils::create_temp_file_with_suffix(
            ".xml",
            "<metadata><networka><networkr>ftp://example/x.zip</networkr></networka></metadata>",
        );

        let paths = vec![placeholder.to_path_buf(), linked.to_path_buf()];

        let flagged = outputs_with_placeholder_resources(&paths).unwrap();

        assert_eq!(flagged, vec![placeholder.to_path_buf()]);
    }

    #[test]
    fn saves_report() {
        let report_path = test_utils::create_empty_temp_file();

        EmptyElementReport::new(&[PathBuf::from("data/outputs/SGID10.WATER.Lakes.xml")])
            .save(&report_path)
            .expect("Unable to save report.");

        let written = std::fs::read_to_string(&report_path).unwrap();
        assert!(written.contains("SGID10.WATER.Lakes.xml"));
    }
}
