#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

/// Returns the absolute path to a fixture under `tests/data`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// Scratch directory that is removed on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Copies a fixture into the workspace so default outputs land here.
    pub fn copy_fixture(&self, name: &str) -> PathBuf {
        let target = self.temp_dir.path().join(name);
        std::fs::copy(fixture_path(name), &target).expect("copy fixture");
        target
    }
}

/// Reads an output file, asserting and stripping the UTF-8 byte-order mark.
pub fn read_with_bom(path: &Path) -> String {
    let bytes = std::fs::read(path).expect("read output");
    assert!(
        bytes.starts_with(b"\xEF\xBB\xBF"),
        "missing byte-order mark in {path:?}"
    );
    String::from_utf8(bytes[3..].to_vec()).expect("utf-8 output")
}
