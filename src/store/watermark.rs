use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use chrono::Utc;
use failure::Error;
use failure::Fail;
use serde::{Deserialize, Serialize};

/// The last-synchronized timestamp, read at the start of a sync pass and
/// rewritten at the end. This is the sole durable checkpoint.
#[derive(Debug, Deserialize, PartialEq, Serialize)]
pub struct Watermark {
    pub last_update: String,
}

/// This error occurs when no watermark has been persisted yet.
#[derive(Debug, Fail)]
#[fail(
    display = "No watermark found at `{}`; supply an explicit start timestamp.",
    path
)]
pub struct WatermarkMissing {
    path: String,
}

/// The current UTC time as an ISO-8601 string.
pub fn utc_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

impl Watermark {
    pub fn new(last_update: &str) -> Self {
        Self {
            last_update: last_update.into(),
        }
    }

    pub fn now() -> Self {
        Self::new(&utc_timestamp())
    }

    pub fn from_path(path: &Path) -> Result<Self, Error> {
        if !path.exists() {
            return Err(WatermarkMissing {
                path: path.display().to_string(),
            }
            .into());
        }

        let file = File::open(path)?;
        let reader = BufReader::new(file);

        Ok(serde_json::from_reader(reader)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);

        serde_json::to_writer_pretty(writer, self)?;

        Ok(())
    }
}
