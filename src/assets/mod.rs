//! Attachment and background media referenced from board exports.
//!
//! [`AssetExtractor`] finds asset URLs in the raw export text and
//! [`AssetDownloader`] saves each one under a directory named after its kind,
//! skipping files that already exist.

mod download;
mod extract;

pub use download::{AssetDownloader, DownloadOutcome, asset_file_name, asset_path};
pub use extract::{AssetExtractor, AssetMatches};
