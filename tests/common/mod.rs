#![allow(dead_code)]

use std::env;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use log::LevelFilter;
use row_mapper::MemorySheet;
use tempfile::{TempDir, tempdir};

static LOGGER: OnceLock<()> = OnceLock::new();

/// Routes the crate's log output through `env_logger` once per test binary.
pub fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("row_mapper", LevelFilter::Info);
        }
        let _ = builder.is_test(true).try_init();
    });
}

/// Returns the absolute path to a fixture under `tests/data`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// Loads a comma-separated fixture with a header row.
pub fn fixture_sheet(name: &str) -> MemorySheet {
    let file = File::open(fixture_path(name)).expect("open fixture");
    MemorySheet::from_csv_reader(name, file, b',', true).expect("parse fixture")
}

/// Builds a headed in-memory sheet from string cells.
pub fn sheet(name: &str, header: &[&str], rows: &[&[&str]]) -> MemorySheet {
    let mut sheet = MemorySheet::new(name).with_header(header.iter().copied());
    for row in rows {
        sheet.push_row(row.iter().copied());
    }
    sheet
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
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
}
