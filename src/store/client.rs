use std::thread;
use std::time::Duration;

use failure::Error;
use failure::Fail;
use log::warn;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;

use crate::settings::StoreSettings;

/// One document or folder entry as listed by the store.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoredDocument {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub modified_time: Option<String>,
    #[serde(default)]
    pub parents: Vec<String>,
}

/// Folder metadata used for the review assignment sheet.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FolderInfo {
    pub name: String,
    pub web_view_link: String,
    #[serde(default)]
    pub parents: Vec<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Comment {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub replies: Vec<Reply>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Reply {
    pub content: String,
}

/// The document store operations this program consumes.
pub trait DocumentStore {
    fn create_text_document(
        &self,
        name: &str,
        parent_ids: &[String],
        content: &str,
    ) -> Result<String, Error>;

    fn create_folder(&self, name: &str, parent_ids: &[String]) -> Result<String, Error>;

    fn add_to_folders(&self, file_id: &str, parent_ids: &[String]) -> Result<(), Error>;

    fn find_by_name(&self, name: &str, parent_id: &str) -> Result<Option<String>, Error>;

    fn folder_info(&self, folder_id: &str) -> Result<FolderInfo, Error>;

    fn subfolder_ids(&self, parent_id: &str) -> Result<Vec<String>, Error>;

    fn documents_modified_after(
        &self,
        parent_id: &str,
        timestamp: &str,
    ) -> Result<Vec<StoredDocument>, Error>;

    fn property(&self, file_id: &str, key: &str) -> Result<Option<String>, Error>;

    fn set_property(&self, file_id: &str, key: &str, value: &str) -> Result<(), Error>;

    fn comments(&self, file_id: &str) -> Result<Vec<Comment>, Error>;

    fn post_reply(&self, file_id: &str, comment_id: &str, content: &str) -> Result<String, Error>;

    fn export_plain_text(&self, file_id: &str) -> Result<String, Error>;
}

/// This error occurs when an upload exhausts its retry budget.
#[derive(Debug, Fail)]
#[fail(display = "Upload of `{}` failed after exhausting retries (HTTP {}).", name, status)]
pub struct UploadRetriesExhausted {
    name: String,
    status: u16,
}

/// This error occurs when the store reports that the upload target is gone.
#[derive(Debug, Fail)]
#[fail(display = "Upload of `{}` failed permanently (HTTP 404).", name)]
pub struct UploadSessionGone {
    name: String,
}

/// This error occurs when a store request returns a non-success status.
#[derive(Debug, Fail)]
#[fail(display = "Store request `{}` failed (HTTP {}).", request, status)]
pub struct StoreRequestFailed {
    request: String,
    status: u16,
}

#[derive(Debug, Deserialize)]
struct IdResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct PropertyResponse {
    value: String,
}

/// A JSON-over-HTTP realization of the document store interface.
pub struct HttpDocumentStore<'s> {
    client: Client,
    settings: &'s StoreSettings,
}

impl<'s> HttpDocumentStore<'s> {
    pub fn new(settings: &'s StoreSettings) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.settings.base_url, path)
    }

    fn expect_success(request: &str, response: Response) -> Result<Response, Error> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(StoreRequestFailed {
                request: request.into(),
                status: response.status().as_u16(),
            }
            .into())
        }
    }

    /// Send an upload request, retrying transient server errors with
    /// exponential backoff. The delay starts at the configured value and
    /// triples per attempt; once it reaches the ceiling the upload fails.
    fn send_upload_with_backoff(
        &self,
        name: &str,
        request: RequestBuilder,
    ) -> Result<Response, Error> {
        let mut backoff = self.settings.initial_backoff_secs;

        loop {
            let attempt = request
                .try_clone()
                .ok_or_else(|| failure::err_msg("Upload request cannot be cloned for retry."))?;

            let response = attempt.send()?;
            let status = response.status();

            if status.is_success() {
                return Ok(response);
            }

            match status.as_u16() {
                404 => {
                    return Err(UploadSessionGone { name: name.into() }.into());
                }
                500 | 502 | 503 | 504 => {
                    if backoff >= self.settings.backoff_ceiling_secs {
                        return Err(UploadRetriesExhausted {
                            name: name.into(),
                            status: status.as_u16(),
                        }
                        .into());
                    }

                    warn!(
                        "Transient store error (HTTP {}) uploading `{}`, retrying in {} seconds.",
                        status.as_u16(),
                        name,
                        backoff
                    );
                    thread::sleep(Duration::from_secs(backoff));
                    backoff *= 3;
                }
                _ => {
                    return Err(StoreRequestFailed {
                        request: format!("upload `{}`", name),
                        status: status.as_u16(),
                    }
                    .into());
                }
            }
        }
    }
}

impl<'s> DocumentStore for HttpDocumentStore<'s> {
    fn create_text_document(
        &self,
        name: &str,
        parent_ids: &[String],
        content: &str,
    ) -> Result<String, Error> {
        let request = self.client.post(self.url("/documents")).json(&json!({
            "name": name,
            "parents": parent_ids,
            "content": content,
        }));

        let response = self.send_upload_with_backoff(name, request)?;

        Ok(response.json::<IdResponse>()?.id)
    }

    fn create_folder(&self, name: &str, parent_ids: &[String]) -> Result<String, Error> {
        if let Some(parent_id) = parent_ids.first() {
            if let Some(existing_id) = self.find_by_name(name, parent_id)? {
                return Ok(existing_id);
            }
        }

        let response = self
            .client
            .post(self.url("/folders"))
            .json(&json!({
                "name": name,
                "parents": parent_ids,
            }))
            .send()?;

        let response = Self::expect_success("create folder", response)?;

        Ok(response.json::<IdResponse>()?.id)
    }

    fn add_to_folders(&self, file_id: &str, parent_ids: &[String]) -> Result<(), Error> {
        let response = self
            .client
            .post(self.url(&format!("/documents/{}/parents", file_id)))
            .json(&json!({ "parents": parent_ids }))
            .send()?;

        Self::expect_success("add to folders", response)?;

        Ok(())
    }

    fn find_by_name(&self, name: &str, parent_id: &str) -> Result<Option<String>, Error> {
        let response = self
            .client
            .get(self.url("/search"))
            .query(&[("name", name), ("parent", parent_id)])
            .send()?;

        let response = Self::expect_success("find by name", response)?;
        let mut matches = response.json::<Vec<StoredDocument>>()?;

        if matches.is_empty() {
            Ok(None)
        } else {
            Ok(Some(matches.remove(0).id))
        }
    }

    fn folder_info(&self, folder_id: &str) -> Result<FolderInfo, Error> {
        let response = self
            .client
            .get(self.url(&format!("/folders/{}", folder_id)))
            .send()?;

        let response = Self::expect_success("folder info", response)?;

        Ok(response.json()?)
    }

    fn subfolder_ids(&self, parent_id: &str) -> Result<Vec<String>, Error> {
        let response = self
            .client
            .get(self.url(&format!("/folders/{}/folders", parent_id)))
            .send()?;

        let response = Self::expect_success("subfolders", response)?;
        let folders = response.json::<Vec<StoredDocument>>()?;

        Ok(folders.into_iter().map(|folder| folder.id).collect())
    }

    fn documents_modified_after(
        &self,
        parent_id: &str,
        timestamp: &str,
    ) -> Result<Vec<StoredDocument>, Error> {
        let response = self
            .client
            .get(self.url(&format!("/folders/{}/documents", parent_id)))
            .query(&[("modified_after", timestamp)])
            .send()?;

        let response = Self::expect_success("documents modified after", response)?;

        Ok(response.json()?)
    }

    fn property(&self, file_id: &str, key: &str) -> Result<Option<String>, Error> {
        let response = self
            .client
            .get(self.url(&format!("/documents/{}/properties/{}", file_id, key)))
            .send()?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = Self::expect_success("get property", response)?;

        Ok(Some(response.json::<PropertyResponse>()?.value))
    }

    fn set_property(&self, file_id: &str, key: &str, value: &str) -> Result<(), Error> {
        let response = self
            .client
            .patch(self.url(&format!("/documents/{}/properties", file_id)))
            .json(&json!({ key: value }))
            .send()?;

        Self::expect_success("set property", response)?;

        Ok(())
    }

    fn comments(&self, file_id: &str) -> Result<Vec<Comment>, Error> {
        let response = self
            .client
            .get(self.url(&format!("/documents/{}/comments", file_id)))
            .send()?;

        let response = Self::expect_success("list comments", response)?;

        Ok(response.json()?)
    }

    fn post_reply(&self, file_id: &str, comment_id: &str, content: &str) -> Result<String, Error> {
        let response = self
            .client
            .post(self.url(&format!(
                "/documents/{}/comments/{}/replies",
                file_id, comment_id
            )))
            .json(&json!({ "content": content }))
            .send()?;

        let response = Self::expect_success("post reply", response)?;

        Ok(response.json::<IdResponse>()?.id)
    }

    fn export_plain_text(&self, file_id: &str) -> Result<String, Error> {
        let response = self
            .client
            .get(self.url(&format!("/documents/{}/export", file_id)))
            .send()?;

        let response = Self::expect_success("export plain text", response)?;
        let text = response.text()?;

        // exported documents may carry a UTF-8 byte order mark
        Ok(text.trim_start_matches('\u{feff}').to_string())
    }
}
