//! Attachment descriptors for generated report files.

use std::path::{Path, PathBuf};

use crate::error::Error;

/// Description label carried by every attachment part.
pub const REPORT_DESCRIPTION: &str = "The generated report";

/// How the receiving client should present a part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Attachment,
    Inline,
}

/// A file to attach. Only the path is recorded here; the file is read when
/// the message is rendered for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub path: PathBuf,
    pub name: String,
    pub description: &'static str,
    pub disposition: Disposition,
}

impl Attachment {
    pub fn from_path(path: &Path) -> Self {
        let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Self {
            path,
            name,
            description: REPORT_DESCRIPTION,
            disposition: Disposition::Attachment,
        }
    }
}

/// Turn report paths into attachments. At least one path is required.
pub fn build<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<Attachment>, Error> {
    if paths.is_empty() {
        return Err(Error::NoAttachments);
    }

    Ok(paths
        .iter()
        .map(|p| Attachment::from_path(p.as_ref()))
        .collect())
}
