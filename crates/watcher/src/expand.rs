//! Directory expansion for recursive watches
//!
//! The OS watch facility is used non-recursively, so a recursive watch is
//! approximated by registering every path of the tree individually. Expansion
//! runs once, when the watch is created; directories created afterwards are not
//! picked up.

use fswatch_core::error::{Error, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Enumerates the paths to register for a watch
#[derive(Debug, Clone, Default)]
pub struct DirectoryExpander {
    follow_symlinks: bool,
}

impl DirectoryExpander {
    /// Create an expander that does not follow symbolic links
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether symbolic links are followed during the walk
    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Returns `path` itself for a file, or the root plus every nested file and
    /// directory for a directory, parents before children.
    ///
    /// The first entry that cannot be read fails the whole enumeration.
    pub fn enumerate(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let metadata = std::fs::metadata(path).map_err(|e| Error::file_system(path, e))?;

        if !metadata.is_dir() {
            return Ok(vec![path.to_path_buf()]);
        }

        WalkDir::new(path)
            .follow_links(self.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .map(|entry| {
                entry
                    .map(walkdir::DirEntry::into_path)
                    .map_err(|e| walk_error(path, e))
            })
            .collect()
    }
}

fn walk_error(root: &Path, err: walkdir::Error) -> Error {
    let path = err.path().unwrap_or(root).to_path_buf();
    Error::file_system(path, std::io::Error::from(err))
}
