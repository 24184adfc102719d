//! Common test utilities and helpers.

use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};

/// Get the full path to a sample listing
pub fn sample_file_path<P: AsRef<Path>>(relative_path: P) -> PathBuf {
    Path::new("samples").join(relative_path)
}

/// Sample listings shipped with the repository
pub mod test_data {
    /// IDA-style listing with network, file, registry and service APIs
    pub const SAMPLE_DROPPER: &str = "asm/dropper.asm";

    /// Listing with only `sub_`/`loc_` names
    pub const SAMPLE_STRIPPED: &str = "asm/stripped.asm";

    /// Listing with one malformed line (line 3)
    pub const SAMPLE_MALFORMED: &str = "asm/malformed.asm";
}

/// Creates a temporary `.asm` file with the given content.
pub fn create_temp_asm(content: &str) -> NamedTempFile {
    let mut temp_file = tempfile::Builder::new().suffix(".asm").tempfile().unwrap();
    temp_file.write_all(content.as_bytes()).unwrap();
    temp_file
}

/// Scratch directory plus an output path inside a not-yet-existing subdirectory.
pub fn scratch_output() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("output").join("sample_ir.json");
    (dir, out)
}
