//! Evidence attachments on compliance nodes
//!
//! Each node shows a merged list: the catalog's preloaded (seed) evidence
//! followed by whatever was uploaded during the session. The store keeps the
//! uploaded half; the lifecycle applies add/delete/download rules on top.

pub mod lifecycle;
pub mod store;
pub mod types;

pub use lifecycle::{
    AttachmentLifecycle, DeleteOutcome, DeletePolicy, DeleteRequest, DownloadOutcome,
    PendingDeletion,
};
pub use store::{AttachmentStore, MergedView, Slot};
pub use types::{AttachmentRecord, IncomingFile, Origin, Payload};
