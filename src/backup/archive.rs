//! Packs dump files into a gzip compressed tar archive.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use derive_more::{Display, Error};
use flate2::write::GzEncoder;
use flate2::Compression;

#[derive(Debug, Display, Error)]
/// Errors on [archive]-ing files.
pub enum ArchiveError {
    /// A file to archive can't be opened.
    #[display("Opening {} failed: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },
    /// A file can't be read or written into the archive.
    #[display("Adding {} to the archive failed: {source}", path.display())]
    Append { path: PathBuf, source: io::Error },
    /// Finishing the tar or gzip stream failed.
    #[display("Finishing the archive failed: {_0}")]
    Finish(io::Error),
}

/// Writes a `.tar.gz` of `files` to `out` and returns `out` once everything
/// is flushed.
///
/// Entries are added in the given order and named by their path, so
/// extracting the archive reproduces the directory layout. Tar entries have to
/// be relative, leading `/` and `.` components are therefore dropped.
///
/// Any error aborts the whole archive; whatever has been written to `out` up
/// to then is no valid archive.
pub fn archive<W, P>(files: &[P], out: W) -> Result<W, ArchiveError>
where
    W: Write,
    P: AsRef<Path>,
{
    let encoder = GzEncoder::new(out, Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for file in files {
        append(&mut builder, file.as_ref())?;
    }

    // tar trailer first, then the gzip trailer
    let encoder = builder.into_inner().map_err(ArchiveError::Finish)?;
    let mut out = encoder.finish().map_err(ArchiveError::Finish)?;
    out.flush().map_err(ArchiveError::Finish)?;

    Ok(out)
}

fn append<W: Write>(builder: &mut tar::Builder<W>, path: &Path) -> Result<(), ArchiveError> {
    let mut file = File::open(path).map_err(|source| ArchiveError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let name = entry_name(path);
    log::trace!(target: "archive", "Adding {} as {}", path.display(), name.display());

    builder
        .append_file(&name, &mut file)
        .map_err(|source| ArchiveError::Append {
            path: path.to_path_buf(),
            source,
        })
}

/// Name of the archive entry for `path`.
pub fn entry_name(path: &Path) -> PathBuf {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect()
}
