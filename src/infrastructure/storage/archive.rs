use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("failed to open archive '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to unpack archive: {0}")]
    Read(#[source] io::Error),

    #[error("failed to write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Unpacks every regular file of a tar archive straight into `dest`.
///
/// Directory structure inside the archive is flattened to basenames and
/// non-file entries are skipped. Existing files are overwritten, so running it
/// again over the same destination yields the same result. The first error
/// stops extraction; files written before it are left in place.
pub fn extract(archive_path: &Path, dest: &Path) -> Result<usize, ArchiveError> {
    let file = File::open(archive_path).map_err(|source| ArchiveError::Open {
        path: archive_path.to_path_buf(),
        source,
    })?;
    fs::create_dir_all(dest).map_err(|source| ArchiveError::Write {
        path: dest.to_path_buf(),
        source,
    })?;

    let mut archive = tar::Archive::new(file);
    let mut written = 0;

    for entry in archive.entries().map_err(ArchiveError::Read)? {
        let mut entry = entry.map_err(ArchiveError::Read)?;
        if !entry.header().entry_type().is_file() {
            continue;
        }

        let entry_path = entry.path().map_err(ArchiveError::Read)?.into_owned();
        let Some(name) = entry_path.file_name() else {
            warn!("Skipping entry without a file name: {}", entry_path.display());
            continue;
        };

        let target = dest.join(name);
        let mut out = overwrite(&target).map_err(|source| ArchiveError::Write {
            path: target.clone(),
            source,
        })?;
        let bytes = copy_entry(&mut entry, &mut out, &target)?;
        debug!("Extracted {} ({} bytes)", target.display(), bytes);
        written += 1;
    }

    Ok(written)
}

// Read and write failures are reported separately.
fn copy_entry(entry: &mut impl Read, out: &mut File, target: &Path) -> Result<u64, ArchiveError> {
    let mut buf = [0u8; 64 * 1024];
    let mut total = 0;
    loop {
        let n = match entry.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ArchiveError::Read(e)),
        };
        out.write_all(&buf[..n]).map_err(|source| ArchiveError::Write {
            path: target.to_path_buf(),
            source,
        })?;
        total += n as u64;
    }
    Ok(total)
}

// Truncate in place when the file exists, otherwise create it.
fn overwrite(path: &Path) -> io::Result<File> {
    match OpenOptions::new().write(true).truncate(true).open(path) {
        Ok(file) => Ok(file),
        Err(_) => File::create(path),
    }
}
