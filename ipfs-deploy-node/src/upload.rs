//! Turning a directory tree into the entry list sent to `/api/v0/add`.
//!
//! Entries are produced in sorted order so identical trees always produce an
//! identical request, and therefore the same root identifier.

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use ipfs_deploy_core::error::{DeployError, Result};

/// What a single multipart entry carries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UploadKind {
    /// A directory marker (`application/x-directory`).
    Directory,
    /// A regular file read from the given path.
    File(PathBuf),
}

/// One entry of the add request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadEntry {
    /// Slash-separated path inside the added tree, starting with the root's name
    pub name: String,
    /// Directory marker or file source
    pub kind: UploadKind,
}

impl UploadEntry {
    /// Returns the MIME type Kubo expects for this entry.
    pub fn mime(&self) -> &'static str {
        match self.kind {
            UploadKind::Directory => "application/x-directory",
            UploadKind::File(_) => "application/octet-stream",
        }
    }

    /// Returns the entry name escaped for the multipart `filename` parameter.
    pub fn encoded_name(&self) -> String {
        url::form_urlencoded::byte_serialize(self.name.as_bytes()).collect()
    }
}

/// Lists `root` and everything below it, directories before their children.
///
/// Dotfiles are skipped unless `include_hidden` is set; the root itself is
/// always included. Symlinks are followed.
pub fn collect_entries(root: &Path, include_hidden: bool) -> Result<Vec<UploadEntry>> {
    let metadata = std::fs::metadata(root).map_err(|e| {
        DeployError::InvalidConfiguration(format!(
            "cannot read directory '{}': {}",
            root.display(),
            e
        ))
    })?;
    if !metadata.is_dir() {
        return Err(DeployError::InvalidConfiguration(format!(
            "'{}' is not a directory",
            root.display()
        )));
    }

    let root_name = root_name(root)?;

    let walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| include_hidden || entry.depth() == 0 || !is_hidden(entry));

    let mut entries = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| match e.into_io_error() {
            Some(io) => DeployError::IoError(io),
            None => DeployError::InvalidConfiguration(format!(
                "filesystem loop under '{}'",
                root.display()
            )),
        })?;

        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let mut name = root_name.clone();
        for component in relative.components() {
            name.push('/');
            name.push_str(&component.as_os_str().to_string_lossy());
        }

        let kind = if entry.file_type().is_dir() {
            UploadKind::Directory
        } else {
            UploadKind::File(entry.path().to_path_buf())
        };

        entries.push(UploadEntry { name, kind });
    }

    Ok(entries)
}

fn root_name(root: &Path) -> Result<String> {
    if let Some(name) = root.file_name() {
        return Ok(name.to_string_lossy().into_owned());
    }

    // `.` or `..` have no file name of their own.
    let canonical = root.canonicalize()?;
    Ok(canonical
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "root".to_string()))
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}
