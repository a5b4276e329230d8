mod review_sheet;
mod update;
mod upload;

pub use self::review_sheet::{completed_folder_ids, write_assignment_sheet, AssignmentRow};
pub use self::update::{CategoryNotFound, SyncPass};
pub use self::upload::{UploadedDocument, Uploader};
