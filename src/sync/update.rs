use std::collections::BTreeSet;
use std::path::PathBuf;

use failure::Error;
use failure::Fail;
use log::{info, warn};

use crate::gisi;
use crate::gisi::{CompletionMatcher, UpdateMode};
use crate::settings::{MetadataSettings, StoreSettings};
use crate::store::{utc_timestamp, DocumentStore, StoredDocument};

/// This error occurs when a named category has no folder in the store.
#[derive(Debug, Fail)]
#[fail(display = "Category `{}` does not exist in the store.", name)]
pub struct CategoryNotFound {
    name: String,
}

/// Pulls edited narrative text back down from the store and merges it into
/// the rendered XML documents.
pub struct SyncPass<'a, S: DocumentStore> {
    store: &'a S,
    settings: &'a StoreSettings,
    output_dir: PathBuf,
    disclaimer: String,
    completion: CompletionMatcher,
}

impl<'a, S: DocumentStore> SyncPass<'a, S> {
    pub fn new(
        store: &'a S,
        settings: &'a StoreSettings,
        metadata_settings: &MetadataSettings,
    ) -> Self {
        Self {
            store,
            settings,
            output_dir: PathBuf::from(&metadata_settings.output_dir),
            disclaimer: metadata_settings.disclaimer.clone(),
            completion: CompletionMatcher::new(),
        }
    }

    /// Process every document edited after `since` below `parent_folder`:
    /// rewrite the target element, stamp the updated property, mark
    /// sign-offs, and backfill missing disclaimers over the touched set.
    /// Returns the touched output paths.
    pub fn run(&self, since: &str, parent_folder: &str) -> Result<Vec<PathBuf>, Error> {
        let update_time = utc_timestamp();
        let documents = self.store.documents_modified_after(parent_folder, since)?;

        let mut touched = BTreeSet::new();

        for document in &documents {
            info!("Updating `{}`", document.name);

            if let Some(xml_path) = self.apply_document(document, &update_time)? {
                touched.insert(xml_path);
            }
        }

        for xml_path in &touched {
            gisi::update_element(xml_path, "useconst", &self.disclaimer, UpdateMode::OnlyEmpty)?;
        }

        Ok(touched.into_iter().collect())
    }

    /// Sync every layer subfolder of a named category.
    pub fn run_for_category(&self, since: &str, category_name: &str) -> Result<Vec<PathBuf>, Error> {
        let category_id = self
            .store
            .find_by_name(category_name, &self.settings.categories_folder)?
            .ok_or_else(|| CategoryNotFound {
                name: category_name.into(),
            })?;

        let mut touched = Vec::new();
        for folder_id in self.store.subfolder_ids(&category_id)? {
            touched.extend(self.run(since, &folder_id)?);
        }

        Ok(touched)
    }

    /// Pull one document's text into its output XML. Returns the output path
    /// when the document could be resolved to one.
    fn apply_document(
        &self,
        document: &StoredDocument,
        update_time: &str,
    ) -> Result<Option<PathBuf>, Error> {
        let element_name = gisi::element_name_from_document_name(&document.name);
        let new_text = self.store.export_plain_text(&document.id)?;

        let xml_name = match self
            .store
            .property(&document.id, &self.settings.src_name_property)?
        {
            Some(name) => name,
            None => {
                warn!(
                    "Document `{}` has no `{}` property; skipping.",
                    document.name, self.settings.src_name_property
                );
                return Ok(None);
            }
        };

        let xml_path = self.output_dir.join(&xml_name);

        match gisi::update_element(
            &xml_path,
            element_name,
            &gisi::sanitize_narrative(&new_text),
            UpdateMode::Always,
        ) {
            Ok(changed) => {
                if !changed {
                    warn!(
                        "No `{}` element found in `{}`.",
                        element_name,
                        xml_path.display()
                    );
                }
            }
            Err(e) => {
                warn!("Unable to update `{}`: {}", xml_path.display(), e);
                return Ok(None);
            }
        }

        self.store
            .set_property(&document.id, &self.settings.updated_property, update_time)?;

        if self.mark_completed(&document.id)? {
            info!("Marked `{}` completed.", document.name);
        }

        Ok(Some(xml_path))
    }

    /// Mark a document completed when a sign-off comment is present:
    /// reply `#updated` and set the updated property to `true`.
    pub fn mark_completed(&self, document_id: &str) -> Result<bool, Error> {
        let comments = self.store.comments(document_id)?;

        let comment_id = comments
            .iter()
            .find(|comment| self.completion.is_completed(&comment.content))
            .map(|comment| comment.id.clone());

        match comment_id {
            Some(comment_id) => {
                self.store.post_reply(document_id, &comment_id, "#updated")?;
                self.store
                    .set_property(document_id, &self.settings.updated_property, "true")?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
