use std::path::Path;

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::File;
use config::FileFormat;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct GeneralSettings {
    pub log_file: String,
    pub debug: bool,
}

/// Institutional contact block written into every output document.
#[derive(Debug, Deserialize)]
pub struct ContactSettings {
    pub organization: String,
    pub person: Option<String>,
    pub address_type: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub voice: String,
}

#[derive(Debug, Deserialize)]
pub struct MetadataSettings {
    pub template_file: String,
    pub output_dir: String,
    pub resources_file: Option<String>,
    pub origin: String,
    pub online_link: String,
    pub disclaimer: String,
    pub place_keywords: Vec<String>,
    pub contact: ContactSettings,
}

#[derive(Debug, Deserialize)]
pub struct StoreSettings {
    pub base_url: String,
    pub categories_folder: String,
    pub all_documents_folder: String,
    pub src_name_property: String,
    pub updated_property: String,
    pub initial_backoff_secs: u64,
    pub backoff_ceiling_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct SyncSettings {
    pub watermark_file: String,
    pub manifest_file: String,
    pub elements: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct DebugSettings {
    pub dataset_start: Option<usize>,
    pub dataset_limit: Option<usize>,
}

/// This struct stores the program settings.
#[derive(Debug, Deserialize)]
pub struct Settings {
    pub general: GeneralSettings,
    pub metadata: MetadataSettings,
    pub store: StoreSettings,
    pub sync: SyncSettings,
    pub debug: DebugSettings,
}

impl Settings {
    pub fn new(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut s = ConfigBuilder::<DefaultState>::default();
        s = s.add_source(File::new("settings-default.toml", FileFormat::Toml));
        s = s.add_source(File::new("settings.toml", FileFormat::Toml).required(false));
        if let Some(path) = path {
            s = s.add_source(File::from(path));
        }

        let config = s.build()?;

        config.try_deserialize()
    }
}
