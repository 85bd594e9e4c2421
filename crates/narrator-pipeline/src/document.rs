//! Document intake: extraction seam and writing files into managed directories.

use crate::error::{ExtractionError, PipelineError};
use narrator_types::{unique_file_name, DataLayout, DirectoryRole};
use std::ffi::OsStr;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Turns documents into plain text.
pub trait DocumentExtractor {
    fn extract_text(&self, path: &Path) -> Result<String, ExtractionError>;
}

impl<T: DocumentExtractor + ?Sized> DocumentExtractor for &T {
    fn extract_text(&self, path: &Path) -> Result<String, ExtractionError> {
        (**self).extract_text(path)
    }
}

/// Rejects names that would escape the target directory.
fn validate_file_name(file_name: &str) -> Result<(), PipelineError> {
    let single_component = Path::new(file_name).file_name() == Some(OsStr::new(file_name));
    if file_name.trim().is_empty() || !single_component || file_name.contains(['/', '\\']) {
        return Err(PipelineError::InvalidFileName(file_name.to_string()));
    }
    Ok(())
}

/// Writes `contents` into `dir` under `file_name`, or a numbered variant of it
/// if the name is taken.
///
/// Files are created with `create_new`, so a name claimed by a concurrent
/// writer between the lookup and the open moves on to the next number.
pub(crate) fn store_file(
    dir: &Path,
    file_name: &str,
    contents: &[u8],
) -> Result<PathBuf, PipelineError> {
    validate_file_name(file_name)?;
    loop {
        let path = dir.join(unique_file_name(dir, file_name));
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(PipelineError::io("creating file", &path, e)),
        };
        file.write_all(contents)
            .map_err(|e| PipelineError::io("writing file", &path, e))?;
        return Ok(path);
    }
}

/// Saves an uploaded document into `uploaded/`.
pub fn store_upload(
    layout: &DataLayout,
    file_name: &str,
    contents: &[u8],
) -> Result<PathBuf, PipelineError> {
    let path = store_file(&layout.dir(DirectoryRole::Uploads), file_name, contents)?;
    tracing::info!(path = %path.display(), bytes = contents.len(), "stored upload");
    Ok(path)
}

/// Saves extracted text into `uploaded/`, adding a `.txt` extension if missing.
pub fn store_extracted_text(
    layout: &DataLayout,
    file_name: &str,
    text: &str,
) -> Result<PathBuf, PipelineError> {
    let name = if file_name.ends_with(".txt") {
        file_name.to_string()
    } else {
        format!("{file_name}.txt")
    };
    store_file(&layout.dir(DirectoryRole::Uploads), &name, text.as_bytes())
}

/// Stores an upload and extracts its text in one step.
pub fn ingest_document<E: DocumentExtractor>(
    extractor: &E,
    layout: &DataLayout,
    file_name: &str,
    contents: &[u8],
) -> Result<(PathBuf, String), PipelineError> {
    let path = store_upload(layout, file_name, contents)?;
    let text = extractor.extract_text(&path)?;
    tracing::debug!(path = %path.display(), chars = text.len(), "extracted document text");
    Ok((path, text))
}
