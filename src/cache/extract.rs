//! Streaming extraction of policy bundles
//!
//! Bundles are gzip-compressed tarballs. Entries are written one at a time
//! as they come off the stream, so memory use is bounded by the copy buffer
//! rather than the size of the bundle.

use crate::error::ExtractError;
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Component, Path, PathBuf};
use tar::Archive;
use tracing::{debug, trace, warn};

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Counters for one extraction pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    /// Regular files written
    pub files: usize,
    /// Directory entries created
    pub directories: usize,
    /// Links and special files that were not written
    pub skipped: usize,
    /// Total payload bytes written
    pub bytes: u64,
}

/// Extract a gzip-compressed tar stream into `destination`
pub fn extract_gzip<R: Read>(
    reader: R,
    destination: &Path,
) -> Result<ExtractSummary, ExtractError> {
    extract(GzDecoder::new(reader), destination)
}

/// Extract an uncompressed tar stream into `destination`
///
/// Entries are processed in stream order. A file that already exists at an
/// entry's path is overwritten, so later passes take precedence over
/// earlier ones. Nothing is rolled back on failure: entries written before
/// the failing one stay on disk.
pub fn extract<R: Read>(reader: R, destination: &Path) -> Result<ExtractSummary, ExtractError> {
    fs::create_dir_all(destination).map_err(|e| ExtractError::write(destination, e))?;

    let mut archive = Archive::new(reader);
    let entries = archive
        .entries()
        .map_err(|e| ExtractError::malformed("reading archive", e))?;

    let mut summary = ExtractSummary::default();
    let mut buffer = vec![0u8; COPY_BUFFER_SIZE];

    for entry in entries {
        let mut entry = entry.map_err(|e| ExtractError::malformed("reading entry header", e))?;
        let name = entry
            .path()
            .map_err(|e| ExtractError::malformed("decoding entry name", e))?
            .into_owned();

        let Some(relative) = sanitize_entry_path(&name)? else {
            trace!("Skipping empty entry name");
            continue;
        };
        let target = destination.join(&relative);
        let entry_type = entry.header().entry_type();

        if entry_type.is_dir() {
            fs::create_dir_all(&target).map_err(|e| ExtractError::write(&target, e))?;
            summary.directories += 1;
            continue;
        }

        if !entry_type.is_file() {
            if !entry_type.is_pax_global_extensions() {
                warn!(
                    "Skipping non-regular archive entry {} ({:?})",
                    name.display(),
                    entry_type
                );
                summary.skipped += 1;
            }
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| ExtractError::write(parent, e))?;
        }

        remove_existing_link(&target)?;

        let expected = entry.size();
        let mut file = File::create(&target).map_err(|e| ExtractError::write(&target, e))?;
        let written = copy_entry(&mut entry, &mut file, &mut buffer, &target, &name)?;
        if written != expected {
            return Err(ExtractError::malformed(
                format!("reading entry {}", name.display()),
                std::io::Error::new(
                    ErrorKind::UnexpectedEof,
                    format!("expected {} bytes, got {}", expected, written),
                ),
            ));
        }

        trace!("Wrote {} ({} bytes)", target.display(), written);
        summary.files += 1;
        summary.bytes += written;
    }

    debug!(
        "Extracted {} files ({} bytes) into {}",
        summary.files,
        summary.bytes,
        destination.display()
    );
    Ok(summary)
}

/// Copy one entry's payload, keeping read and write failures apart
fn copy_entry<R: Read, W: Write>(
    entry: &mut R,
    out: &mut W,
    buffer: &mut [u8],
    target: &Path,
    name: &Path,
) -> Result<u64, ExtractError> {
    let mut written = 0u64;
    loop {
        let n = match entry.read(buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(ExtractError::malformed(
                    format!("reading entry {}", name.display()),
                    e,
                ))
            }
        };
        out.write_all(&buffer[..n])
            .map_err(|e| ExtractError::write(target, e))?;
        written += n as u64;
    }
    out.flush().map_err(|e| ExtractError::write(target, e))?;
    Ok(written)
}

/// Remove a symlink sitting where a file is about to be written
///
/// `File::create` follows links, which would redirect the write outside
/// the destination.
fn remove_existing_link(target: &Path) -> Result<(), ExtractError> {
    match fs::symlink_metadata(target) {
        Ok(meta) if meta.file_type().is_symlink() => {
            debug!("Replacing symlink at {}", target.display());
            fs::remove_file(target).map_err(|e| ExtractError::write(target, e))
        }
        Ok(_) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ExtractError::write(target, e)),
    }
}

/// Turn an entry name into a path relative to the destination
///
/// `.` components are dropped. Absolute names and `..` components are
/// rejected. Returns `None` when nothing is left (e.g. `./`).
fn sanitize_entry_path(name: &Path) -> Result<Option<PathBuf>, ExtractError> {
    let mut relative = PathBuf::new();

    for component in name.components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ExtractError::PathTraversal {
                    entry: name.display().to_string(),
                });
            }
        }
    }

    if relative.as_os_str().is_empty() {
        Ok(None)
    } else {
        Ok(Some(relative))
    }
}
