mod client;
mod manifest;
mod watermark;

pub use self::client::{
    Comment, DocumentStore, FolderInfo, HttpDocumentStore, Reply, StoreRequestFailed,
    StoredDocument, UploadRetriesExhausted, UploadSessionGone,
};
pub use self::manifest::RenderManifest;
pub use self::watermark::{utc_timestamp, Watermark, WatermarkMissing};
