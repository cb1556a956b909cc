// Copyright 2025 TAKKT Industrial & Packaging GmbH
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

//! The external collaborator interfaces the addons parser/merger reads through: listing a
//! directory's entries and reading a file's contents, plus the filesystem-backed implementation
//! the CLI binary actually uses.
//!
//! Keeping these as traits (rather than hard-coding `std::fs`) is what lets composition be tested
//! against an in-memory workspace instead of real directories.

use std::path::{Path, PathBuf};

use crate::error::Error;

/// Lists the file names present in a directory, in some order the caller must treat as
/// authoritative: composition merges fragments in exactly this order, and that order determines
/// both first-wins origin stamping and which file a conflict message calls "first".
pub trait FileLister {
    /// List the entries of `dir` (a path relative to the workspace root). A missing directory is
    /// reported as an error, not an empty list, so callers can distinguish "no addons" from "no
    /// addons directory at all" if they need to.
    fn list(&self, dir: &str) -> Result<Vec<String>, Error>;
}

/// Reads the contents of a single file within the workspace.
pub trait FileReader {
    /// Read `file_name` within `dir` (both relative to the workspace root).
    fn read(&self, dir: &str, file_name: &str) -> Result<Vec<u8>, Error>;
}

/// The combined collaborator a composition call needs: something that can both list and read.
pub trait WorkspaceReader: FileLister + FileReader {}

impl<T: FileLister + FileReader> WorkspaceReader for T {}

/// A [`WorkspaceReader`] rooted at a real directory on disk.
pub struct FilesystemWorkspace {
    root: PathBuf,
}

impl FilesystemWorkspace {
    /// Root the workspace at `root`; every directory and file path handed to [`FileLister::list`]
    /// / [`FileReader::read`] is resolved relative to it.
    pub fn new(root: impl Into<PathBuf>) -> FilesystemWorkspace {
        FilesystemWorkspace { root: root.into() }
    }

    /// The workspace root itself, needed by the asset packager to resolve relative asset paths.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FileLister for FilesystemWorkspace {
    fn list(&self, dir: &str) -> Result<Vec<String>, Error> {
        let path = self.root.join(dir);
        let mut entries: Vec<String> = std::fs::read_dir(&path)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        // `read_dir` makes no ordering guarantee; sort so that merge order (and therefore origin
        // stamping and conflict-message "first file") is stable across platforms and reruns.
        entries.sort();
        Ok(entries)
    }
}

impl FileReader for FilesystemWorkspace {
    fn read(&self, dir: &str, file_name: &str) -> Result<Vec<u8>, Error> {
        let path = self.root.join(dir).join(file_name);
        Ok(std::fs::read(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_files_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("copilot/web/addons")).unwrap();
        std::fs::write(dir.path().join("copilot/web/addons/b.yaml"), "Resources: {}\n").unwrap();
        std::fs::write(dir.path().join("copilot/web/addons/a.yaml"), "Resources: {}\n").unwrap();

        let workspace = FilesystemWorkspace::new(dir.path());
        let entries = workspace.list("copilot/web/addons").unwrap();
        assert_eq!(entries, vec!["a.yaml".to_owned(), "b.yaml".to_owned()]);
    }

    #[test]
    fn reading_a_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = FilesystemWorkspace::new(dir.path());
        assert!(workspace.list("copilot/web/addons").is_err());
    }
}
