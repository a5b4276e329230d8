use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use failure::Error;
use failure::Fail;
use log::{info, warn};

use crate::gisi;
use crate::settings::StoreSettings;
use crate::store::{DocumentStore, UploadRetriesExhausted};

/// This error occurs when an output file name does not carry the
/// `SOURCE.CATEGORY.Layer` naming convention.
#[derive(Debug, Fail)]
#[fail(display = "File name `{}` does not follow the CATEGORY.Layer convention.", name)]
pub struct MalformedDatasetName {
    name: String,
}

/// One narrative document created in the store.
#[derive(Clone, Debug, PartialEq)]
pub struct UploadedDocument {
    pub document_id: String,
    pub name: String,
    pub source_file_name: String,
}

/// Uploads narrative elements of rendered documents into the store,
/// mirroring the category and layer hierarchy as folders.
pub struct Uploader<'a, S: DocumentStore> {
    store: &'a S,
    settings: &'a StoreSettings,
}

impl<'a, S: DocumentStore> Uploader<'a, S> {
    pub fn new(store: &'a S, settings: &'a StoreSettings) -> Self {
        Self { store, settings }
    }

    /// Upload the given elements of every XML file. A problem with one file
    /// skips that file; an exhausted upload retry budget aborts the run.
    pub fn upload_narratives(
        &self,
        xml_paths: &[PathBuf],
        elements: &[String],
    ) -> Result<Vec<UploadedDocument>, Error> {
        let mut category_folders = HashMap::new();
        let mut uploaded = Vec::new();

        for xml_path in xml_paths {
            match self.upload_file(xml_path, elements, &mut category_folders, &mut uploaded) {
                Ok(()) => (),
                Err(e) => {
                    if e.downcast_ref::<UploadRetriesExhausted>().is_some() {
                        return Err(e);
                    }
                    warn!(
                        "Unable to upload narratives for `{}`: {}",
                        xml_path.display(),
                        e
                    );
                }
            }
        }

        Ok(uploaded)
    }

    fn upload_file(
        &self,
        xml_path: &Path,
        elements: &[String],
        category_folders: &mut HashMap<String, String>,
        uploaded: &mut Vec<UploadedDocument>,
    ) -> Result<(), Error> {
        let file_name = xml_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let segments: Vec<&str> = file_name.split('.').collect();
        if segments.len() < 4 {
            return Err(MalformedDatasetName { name: file_name }.into());
        }

        let category_name = segments[1].to_string();
        let layer_name = segments[segments.len() - 2].to_string();

        let xml_bytes = fs::read(xml_path)?;

        for element in elements {
            let element_text = gisi::element_text(&xml_bytes, element)?;
            let content = match element_text {
                Some(text) if !text.trim().is_empty() => text,
                _ => " ".to_string(),
            };

            let category_folder = match category_folders.get(&category_name) {
                Some(folder_id) => folder_id.clone(),
                None => {
                    let folder_id = self
                        .store
                        .create_folder(&category_name, &[self.settings.categories_folder.clone()])?;
                    category_folders.insert(category_name.clone(), folder_id.clone());
                    folder_id
                }
            };

            let layer_folder = self.store.create_folder(&layer_name, &[category_folder])?;

            let document_name = format!("{}_{}", layer_name, element);
            let document_id =
                self.store
                    .create_text_document(&document_name, &[layer_folder], &content)?;

            self.store
                .add_to_folders(&document_id, &[self.settings.all_documents_folder.clone()])?;
            self.store
                .set_property(&document_id, &self.settings.src_name_property, &file_name)?;

            info!("Uploaded `{}`, id `{}`", document_name, document_id);

            uploaded.push(UploadedDocument {
                document_id,
                name: document_name,
                source_file_name: file_name.clone(),
            });
        }

        Ok(())
    }
}
