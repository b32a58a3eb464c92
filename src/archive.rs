// ABOUTME: Source archive download and extraction.
// ABOUTME: Streams a gzipped tar over HTTP onto disk, preserving modes and tree shape.

use std::fs;
use std::io::{self, Read};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use flate2::read::GzDecoder;
use futures::TryStreamExt;
use reqwest::header;
use tar::EntryType;
use thiserror::Error;
use tokio_util::io::{StreamReader, SyncIoBridge};

use crate::repo::RepoError;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("failed to resolve archive location: {0}")]
    Source(#[from] RepoError),

    #[error("archive download failed: {0}")]
    Download(#[from] reqwest::Error),

    #[error("archive response carries no usable filename")]
    NoFilename,

    #[error("failed to unpack archive: {0}")]
    Unpack(#[from] io::Error),
}

/// Download the archive at `url` and unpack it under `dest`.
///
/// Returns the archive's root directory name, recovered from the response's
/// Content-Disposition filename. The caller owns `dest`; nothing is cleaned
/// up here on failure.
pub async fn fetch_and_unpack(
    http: &reqwest::Client,
    url: &str,
    dest: &Path,
) -> Result<String, ArchiveError> {
    let response = http
        .get(url)
        .header(header::USER_AGENT, "stratus")
        .send()
        .await?
        .error_for_status()?;

    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ArchiveError::NoFilename)?;
    let root_dir = root_dir_from_disposition(disposition).ok_or(ArchiveError::NoFilename)?;

    tracing::debug!(url, root_dir = %root_dir, "unpacking source archive");

    let stream = response.bytes_stream().map_err(io::Error::other);
    let reader = SyncIoBridge::new(StreamReader::new(stream));
    let dest = dest.to_owned();
    tokio::task::spawn_blocking(move || unpack_tar_gz(reader, &dest))
        .await
        .map_err(|e| ArchiveError::Unpack(io::Error::other(e)))??;

    Ok(root_dir)
}

/// Unpack a gzipped tar stream under `dest`, preserving each entry's mode
/// bits. Directories get create_dir_all semantics; regular files truncate
/// any existing content. Entries that are neither are skipped.
pub fn unpack_tar_gz<R: Read>(reader: R, dest: &Path) -> io::Result<()> {
    let mut archive = tar::Archive::new(GzDecoder::new(reader));

    for entry in archive.entries()? {
        let mut entry = entry?;
        let path = dest.join(entry.path()?);
        let mode = entry.header().mode().unwrap_or(0o644);

        match entry.header().entry_type() {
            EntryType::Directory => {
                fs::create_dir_all(&path)?;
                fs::set_permissions(&path, fs::Permissions::from_mode(mode))?;
            }
            EntryType::Regular => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                let mut file = fs::File::create(&path)?;
                io::copy(&mut entry, &mut file)?;
                fs::set_permissions(&path, fs::Permissions::from_mode(mode))?;
            }
            _ => continue,
        }
    }

    Ok(())
}

/// Pull the archive's root directory name out of a Content-Disposition
/// value like `attachment; filename=owner-repo-rev.tar.gz`.
fn root_dir_from_disposition(value: &str) -> Option<String> {
    let filename = value
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))?
        .trim_matches('"');

    let stem = filename
        .strip_suffix(".tar.gz")
        .or_else(|| filename.strip_suffix(".tgz"))?;

    if stem.is_empty() {
        None
    } else {
        Some(stem.to_string())
    }
}
