use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use failure::Error;

use crate::store::{Comment, DocumentStore, FolderInfo, StoredDocument};

#[derive(Clone, Debug, Default)]
pub struct MemoryDocument {
    pub name: String,
    pub content: String,
    pub parents: Vec<String>,
    pub properties: HashMap<String, String>,
    pub comments: Vec<Comment>,
    pub replies: Vec<(String, String)>,
    pub modified_time: String,
}

#[derive(Clone, Debug, Default)]
struct MemoryFolder {
    name: String,
    parents: Vec<String>,
}

#[derive(Default)]
struct MemoryStoreState {
    next_id: u32,
    documents: BTreeMap<String, MemoryDocument>,
    folders: BTreeMap<String, MemoryFolder>,
}

/// An in-memory `DocumentStore` double for exercising the sync passes.
#[derive(Default)]
pub struct MemoryStore {
    state: RefCell<MemoryStoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_folder(&self, name: &str, parent_id: &str) -> String {
        let mut state = self.state.borrow_mut();
        let folder_id = Self::next_id(&mut state, "folder");
        state.folders.insert(
            folder_id.clone(),
            MemoryFolder {
                name: name.into(),
                parents: vec![parent_id.into()],
            },
        );
        folder_id
    }

    pub fn seed_document(
        &self,
        name: &str,
        parent_id: &str,
        content: &str,
        modified_time: &str,
    ) -> String {
        let mut state = self.state.borrow_mut();
        let document_id = Self::next_id(&mut state, "doc");
        state.documents.insert(
            document_id.clone(),
            MemoryDocument {
                name: name.into(),
                content: content.into(),
                parents: vec![parent_id.into()],
                modified_time: modified_time.into(),
                ..Default::default()
            },
        );
        document_id
    }

    pub fn seed_property(&self, document_id: &str, key: &str, value: &str) {
        let mut state = self.state.borrow_mut();
        state
            .documents
            .get_mut(document_id)
            .expect("Unknown document id.")
            .properties
            .insert(key.into(), value.into());
    }

    pub fn seed_comment(&self, document_id: &str, comment_id: &str, content: &str) {
        let mut state = self.state.borrow_mut();
        state
            .documents
            .get_mut(document_id)
            .expect("Unknown document id.")
            .comments
            .push(Comment {
                id: comment_id.into(),
                content: content.into(),
                replies: Vec::new(),
            });
    }

    pub fn document_by_name(&self, name: &str) -> Option<MemoryDocument> {
        self.state
            .borrow()
            .documents
            .values()
            .find(|document| document.name == name)
            .cloned()
    }

    pub fn document_property(&self, document_id: &str, key: &str) -> Option<String> {
        self.state
            .borrow()
            .documents
            .get(document_id)
            .and_then(|document| document.properties.get(key).cloned())
    }

    pub fn replies(&self, document_id: &str) -> Vec<(String, String)> {
        self.state
            .borrow()
            .documents
            .get(document_id)
            .map(|document| document.replies.clone())
            .unwrap_or_default()
    }

    pub fn folder_by_name(&self, name: &str) -> Option<String> {
        self.state
            .borrow()
            .folders
            .iter()
            .find(|(_, folder)| folder.name == name)
            .map(|(folder_id, _)| folder_id.clone())
    }

    pub fn folder_count_by_name(&self, name: &str) -> usize {
        self.state
            .borrow()
            .folders
            .values()
            .filter(|folder| folder.name == name)
            .count()
    }

    fn next_id(state: &mut MemoryStoreState, prefix: &str) -> String {
        state.next_id += 1;
        format!("{}-{}", prefix, state.next_id)
    }
}

impl DocumentStore for MemoryStore {
    fn create_text_document(
        &self,
        name: &str,
        parent_ids: &[String],
        content: &str,
    ) -> Result<String, Error> {
        let mut state = self.state.borrow_mut();
        let document_id = Self::next_id(&mut state, "doc");
        state.documents.insert(
            document_id.clone(),
            MemoryDocument {
                name: name.into(),
                content: content.into(),
                parents: parent_ids.to_vec(),
                ..Default::default()
            },
        );
        Ok(document_id)
    }

    fn create_folder(&self, name: &str, parent_ids: &[String]) -> Result<String, Error> {
        let mut state = self.state.borrow_mut();

        let existing = state
            .folders
            .iter()
            .find(|(_, folder)| {
                folder.name == name
                    && parent_ids
                        .first()
                        .map(|parent| folder.parents.contains(parent))
                        .unwrap_or(false)
            })
            .map(|(folder_id, _)| folder_id.clone());

        if let Some(folder_id) = existing {
            return Ok(folder_id);
        }

        let folder_id = Self::next_id(&mut state, "folder");
        state.folders.insert(
            folder_id.clone(),
            MemoryFolder {
                name: name.into(),
                parents: parent_ids.to_vec(),
            },
        );
        Ok(folder_id)
    }

    fn add_to_folders(&self, file_id: &str, parent_ids: &[String]) -> Result<(), Error> {
        let mut state = self.state.borrow_mut();
        if let Some(document) = state.documents.get_mut(file_id) {
            document.parents.extend(parent_ids.iter().cloned());
        }
        Ok(())
    }

    fn find_by_name(&self, name: &str, parent_id: &str) -> Result<Option<String>, Error> {
        let state = self.state.borrow();

        let folder = state
            .folders
            .iter()
            .find(|(_, folder)| folder.name == name && folder.parents.iter().any(|parent| parent == parent_id))
            .map(|(folder_id, _)| folder_id.clone());

        if folder.is_some() {
            return Ok(folder);
        }

        Ok(state
            .documents
            .iter()
            .find(|(_, document)| {
                document.name == name && document.parents.iter().any(|parent| parent == parent_id)
            })
            .map(|(document_id, _)| document_id.clone()))
    }

    fn folder_info(&self, folder_id: &str) -> Result<FolderInfo, Error> {
        let state = self.state.borrow();
        let folder = state
            .folders
            .get(folder_id)
            .ok_or_else(|| failure::err_msg(format!("Unknown folder `{}`.", folder_id)))?;

        Ok(FolderInfo {
            name: folder.name.clone(),
            web_view_link: format!("memory://folders/{}", folder_id),
            parents: folder.parents.clone(),
        })
    }

    fn subfolder_ids(&self, parent_id: &str) -> Result<Vec<String>, Error> {
        Ok(self
            .state
            .borrow()
            .folders
            .iter()
            .filter(|(_, folder)| folder.parents.iter().any(|parent| parent == parent_id))
            .map(|(folder_id, _)| folder_id.clone())
            .collect())
    }

    fn documents_modified_after(
        &self,
        parent_id: &str,
        timestamp: &str,
    ) -> Result<Vec<StoredDocument>, Error> {
        Ok(self
            .state
            .borrow()
            .documents
            .iter()
            .filter(|(_, document)| {
                document.parents.iter().any(|parent| parent == parent_id)
                    && document.modified_time.as_str() > timestamp
            })
            .map(|(document_id, document)| StoredDocument {
                id: document_id.clone(),
                name: document.name.clone(),
                modified_time: Some(document.modified_time.clone()),
                parents: document.parents.clone(),
            })
            .collect())
    }

    fn property(&self, file_id: &str, key: &str) -> Result<Option<String>, Error> {
        Ok(self.document_property(file_id, key))
    }

    fn set_property(&self, file_id: &str, key: &str, value: &str) -> Result<(), Error> {
        let mut state = self.state.borrow_mut();
        if let Some(document) = state.documents.get_mut(file_id) {
            document.properties.insert(key.into(), value.into());
        }
        Ok(())
    }

    fn comments(&self, file_id: &str) -> Result<Vec<Comment>, Error> {
        Ok(self
            .state
            .borrow()
            .documents
            .get(file_id)
            .map(|document| document.comments.clone())
            .unwrap_or_default())
    }

    fn post_reply(&self, file_id: &str, comment_id: &str, content: &str) -> Result<String, Error> {
        let mut state = self.state.borrow_mut();
        let reply_id = Self::next_id(&mut state, "reply");
        if let Some(document) = state.documents.get_mut(file_id) {
            document
                .replies
                .push((comment_id.to_string(), content.to_string()));
        }
        Ok(reply_id)
    }

    fn export_plain_text(&self, file_id: &str) -> Result<String, Error> {
        let state = self.state.borrow();
        let document = state
            .documents
            .get(file_id)
            .ok_or_else(|| failure::err_msg(format!("Unknown document `{}`.", file_id)))?;

        Ok(document.content.clone())
    }
}
