//! Idempotent asset download to `<kind>/<flattened url path>`.

use crate::error::{Error, Result};
use crate::session::Session;
use crate::types::AssetReference;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use url::Url;

/// Result of handling one asset reference
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// A file already existed at the target path; nothing was fetched
    AlreadyPresent(PathBuf),
    /// The asset was fetched and written
    Downloaded {
        /// Where the asset was written
        path: PathBuf,
        /// Number of bytes written
        bytes: u64,
    },
}

/// Local file name for an asset URL: its decoded path with every `/`
/// replaced by `_`
///
/// # Examples
///
/// ```
/// use board_backup::assets::asset_file_name;
///
/// let name = asset_file_name("https://trello-attachments.s3.amazonaws.com/5f0c/abc/report.pdf").unwrap();
/// assert_eq!(name, "_5f0c_abc_report.pdf");
/// ```
pub fn asset_file_name(url: &str) -> Result<String> {
    let parsed = Url::parse(url)
        .map_err(|e| Error::RemoteFormat(format!("could not parse asset url {url}: {e}")))?;
    let raw_path = parsed.path();
    let path = urlencoding::decode(raw_path)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| raw_path.to_string());
    Ok(path.replace('/', "_"))
}

/// Target path of an asset under `root`
pub fn asset_path(root: &Path, asset: &AssetReference) -> Result<PathBuf> {
    Ok(root
        .join(asset.kind.plural())
        .join(asset_file_name(&asset.url)?))
}

/// Downloads assets into kind directories under a root directory
pub struct AssetDownloader<'a> {
    session: &'a Session,
    root: PathBuf,
}

impl<'a> AssetDownloader<'a> {
    /// Create a downloader writing under `root`
    pub fn new(session: &'a Session, root: impl Into<PathBuf>) -> Self {
        Self {
            session,
            root: root.into(),
        }
    }

    /// Fetch `asset` unless its file already exists
    ///
    /// An existing file is never re-validated. A transfer that fails midway
    /// leaves the partial file in place.
    ///
    /// # Errors
    /// Transport failures, a non-success status, and any directory, file or
    /// write failure.
    pub async fn download(&self, asset: &AssetReference) -> Result<DownloadOutcome> {
        let path = asset_path(&self.root, asset)?;
        if tokio::fs::metadata(&path).await.is_ok() {
            debug!(path = %path.display(), "asset already downloaded");
            return Ok(DownloadOutcome::AlreadyPresent(path));
        }

        let dir = self.root.join(asset.kind.plural());
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| Error::File {
                path: dir.clone(),
                source,
            })?;

        debug!(url = %asset.url, "fetching asset");
        let mut response = self.session.client().get(&asset.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                url: asset.url.clone(),
            });
        }

        let mut file = tokio::fs::File::create(&path)
            .await
            .map_err(|source| Error::File {
                path: path.clone(),
                source,
            })?;

        match Self::copy_body(&mut response, &mut file).await {
            Ok(bytes) => {
                debug!(path = %path.display(), bytes, "asset saved");
                Ok(DownloadOutcome::Downloaded { path, bytes })
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    "asset transfer failed; partial file left on disk"
                );
                Err(match e {
                    Error::Io(source) => Error::File { path, source },
                    other => other,
                })
            }
        }
    }

    async fn copy_body(response: &mut reqwest::Response, file: &mut tokio::fs::File) -> Result<u64> {
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        Ok(written)
    }
}
