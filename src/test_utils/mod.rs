mod store;
mod webserver;

use std::io::Write;
use std::path::PathBuf;

use tempfile::TempPath;

use crate::settings::{ContactSettings, MetadataSettings, StoreSettings};

pub use self::store::{MemoryDocument, MemoryStore};
pub use self::webserver::MockWebserver;

pub const TEST_TEMPLATE: &str = include_str!("../../templates/gisi-metadata-empty.xml");

pub fn create_temp_file(content: &str) -> TempPath {
    create_temp_file_with_suffix("", content)
}

pub fn create_temp_file_with_suffix(suffix: &str, content: &str) -> TempPath {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("Unable to create test file.");

    write!(file, "{}", content).expect("Unable to write content to test file.");

    file.into_temp_path()
}

pub fn create_empty_temp_file() -> TempPath {
    tempfile::Builder::new()
        .tempfile()
        .expect("Unable to create test file.")
        .into_temp_path()
}

/// Create a file with a meaningful name inside a fresh temporary directory.
pub fn create_temp_dir_file(file_name: &str, content: &str) -> PathBuf {
    let dir = tempfile::tempdir()
        .expect("Unable to create test directory.")
        .into_path();

    let path = dir.join(file_name);
    std::fs::write(&path, content).expect("Unable to write test file.");

    path
}

pub fn metadata_settings() -> MetadataSettings {
    MetadataSettings {
        template_file: "templates/gisi-metadata-empty.xml".into(),
        output_dir: "data/outputs".into(),
        resources_file: None,
        origin: "Utah Automated Geographic Reference Center (AGRC)".into(),
        online_link: "https://gis.utah.gov/".into(),
        disclaimer: "There are no constraints or warranties with regard to the use of this dataset."
            .into(),
        place_keywords: vec!["Utah".into()],
        contact: ContactSettings {
            organization: "Utah AGRC".into(),
            person: None,
            address_type: "mailing and physical address".into(),
            address: "Utah Automated Geographic Reference 1 State Office Building, Room 5130"
                .into(),
            city: "Salt Lake City".into(),
            state: "UT".into(),
            postal_code: "84114".into(),
            voice: "801-538-3665".into(),
        },
    }
}

pub fn store_settings(base_url: &str) -> StoreSettings {
    StoreSettings {
        base_url: base_url.into(),
        categories_folder: "folder-categories".into(),
        all_documents_folder: "folder-all".into(),
        src_name_property: "metaSrcName".into(),
        updated_property: "metaGisiUpdated".into(),
        initial_backoff_secs: 0,
        backoff_ceiling_secs: 0,
    }
}
