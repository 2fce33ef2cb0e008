//! File store client: listing, transfer and permission types.

mod client;
pub(crate) mod entry;
mod permissions;

pub use client::{DEFAULT_CHUNK_SIZE, FileStore, HttpFileStore};
pub use entry::{FileEntry, UploadFile, url_for};
pub use permissions::{Permission, PermissionSet};
