use std::fs;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use chrono::Local;
use failure::Error;
use serde::{Deserialize, Serialize};

/// The list of XML outputs produced by the most recent render pass,
/// consumed by the upload and audit passes.
#[derive(Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct RenderManifest {
    pub output_files: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_time_local: Option<String>,
}

impl RenderManifest {
    pub fn new(output_files: Vec<String>) -> Self {
        Self {
            output_files,
            upload_time_local: None,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        Ok(serde_json::from_reader(reader)?)
    }

    /// Persist the manifest, stamping the local write time.
    pub fn save(&mut self, path: &Path) -> Result<(), Error> {
        self.upload_time_local = Some(Local::now().format("%Y_%m_%d %H:%M:%S").to_string());

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(path)?;
        let writer = BufWriter::new(file);

        serde_json::to_writer_pretty(writer, self)?;

        Ok(())
    }

    pub fn output_paths(&self) -> Vec<PathBuf> {
        self.output_files.iter().map(PathBuf::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils;

    use super::*;

    #[test]
    fn round_trips_and_stamps_the_write_time() {
        let path = test_utils::create_empty_temp_file();

        let mut manifest = RenderManifest::new(vec![
            "data/outputs/SGID10.WATER.Lakes.xml".into(),
            "data/outputs/SGID10.WATER.Streams.xml".into(),
        ]);
        manifest.save(&path).expect("Unable to save manifest.");

        let loaded = RenderManifest::from_path(&path).expect("Unable to load manifest.");

        assert_eq!(loaded.output_files, manifest.output_files);
        assert!(loaded.upload_time_local.is_some());
    }

    #[test]
    fn output_paths_preserve_order() {
        let manifest = RenderManifest::new(vec!["b.xml".into(), "a.xml".into()]);

        let paths = manifest.output_paths();

        assert_eq!(paths, vec![PathBuf::from("b.xml"), PathBuf::from("a.xml")]);
    }
}
