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

//! Deterministic zipping of a local asset directory, with a content hash computed in lock-step so
//! the same directory always produces the same archive name.

use std::io::{Cursor, Write};
use std::path::Path;

use sha2::{Digest, Sha256};
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::Error;

/// A zipped directory, along with the hex-encoded SHA-256 that names it.
pub struct ZippedAsset {
    /// The zip archive's bytes.
    pub bytes: Vec<u8>,
    /// Hex-encoded SHA-256 over every file's (relative path, mode, contents), in walk order.
    pub hash_hex: String,
}

/// Zip every file under `root`, recursively, skipping subdirectories themselves but including
/// everything they contain.
///
/// Entries are sorted by their workspace-relative path before zipping or hashing, so two
/// directories with identical contents always produce byte-identical archives regardless of the
/// underlying filesystem's own directory-listing order.
pub fn zip_directory(root: &Path) -> Result<ZippedAsset, Error> {
    let mut paths: Vec<_> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.path().to_path_buf())
        .collect();
    paths.sort();

    let mut buffer = Vec::new();
    let mut hasher = Sha256::new();
    {
        let mut writer = ZipWriter::new(Cursor::new(&mut buffer));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        for path in &paths {
            let relative = path
                .strip_prefix(root)
                .expect("walked entries are always under root")
                .to_string_lossy()
                .replace('\\', "/");
            let contents = std::fs::read(path)?;
            let mode = file_mode(path);

            hasher.update(relative.as_bytes());
            hasher.update(b" ");
            hasher.update(mode.as_bytes());
            hasher.update(&contents);

            writer.start_file(&relative, options)?;
            writer.write_all(&contents)?;
        }
        writer.finish()?;
    }

    Ok(ZippedAsset {
        bytes: buffer,
        hash_hex: format!("{:x}", hasher.finalize()),
    })
}

/// Read a single file's bytes as-is, with a SHA-256 content hash, for rules that don't force
/// directory inputs to be zipped.
pub fn read_file(path: &Path) -> Result<ZippedAsset, Error> {
    let bytes = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(ZippedAsset {
        bytes,
        hash_hex: format!("{:x}", hasher.finalize()),
    })
}

#[cfg(unix)]
fn file_mode(path: &Path) -> String {
    use std::os::unix::fs::PermissionsExt;
    let executable = std::fs::metadata(path).map(|meta| meta.permissions().mode() & 0o111 != 0).unwrap_or(false);
    if executable {
        "100755".to_owned()
    } else {
        "100644".to_owned()
    }
}

#[cfg(not(unix))]
fn file_mode(_path: &Path) -> String {
    "100644".to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zipping_the_same_directory_twice_produces_the_same_hash() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.js"), "exports.handler = () => {};").unwrap();
        std::fs::create_dir(dir.path().join("lib")).unwrap();
        std::fs::write(dir.path().join("lib/helper.js"), "module.exports = {};").unwrap();

        let first = zip_directory(dir.path()).unwrap();
        let second = zip_directory(dir.path()).unwrap();
        assert_eq!(first.hash_hex, second.hash_hex);
        assert_eq!(first.bytes, second.bytes);
    }

    #[test]
    fn differing_contents_produce_a_different_hash() {
        let a = tempfile::tempdir().unwrap();
        std::fs::write(a.path().join("index.js"), "one").unwrap();
        let b = tempfile::tempdir().unwrap();
        std::fs::write(b.path().join("index.js"), "two").unwrap();

        let zipped_a = zip_directory(a.path()).unwrap();
        let zipped_b = zip_directory(b.path()).unwrap();
        assert_ne!(zipped_a.hash_hex, zipped_b.hash_hex);
    }

    #[test]
    fn read_file_returns_the_raw_bytes_unzipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("handler.js");
        std::fs::write(&path, "exports.handler = () => {};").unwrap();

        let read = read_file(&path).unwrap();
        assert_eq!(read.bytes, b"exports.handler = () => {};");
    }
}
