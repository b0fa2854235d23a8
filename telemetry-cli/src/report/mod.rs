//! Report generation
//!
//! Writes CSV tables and interactive HTML chart documents.

pub mod html;
pub mod tables;

use std::path::{Path, PathBuf};

/// File stem of an input path (`data/export.jsonl` → `export`)
pub fn base_filename(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output")
        .to_string()
}

/// `<dir>/<base>_<suffix>`
pub fn output_path(dir: &Path, base: &str, suffix: &str) -> PathBuf {
    dir.join(format!("{}_{}", base, suffix))
}
