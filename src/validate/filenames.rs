use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use walkdir::WalkDir;

static LOWER_ALNUM_UNDERSCORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-z_]+$").expect("static filename regex"));

const SAFELY_DELETABLE_EXTENSIONS: [&str; 3] = ["gpk", "gk", "mrk"];

pub const RESTRICTION_MARKER: &str = "restricted.txt";

fn dot_stripped(filename: &str) -> String {
    filename.replace('.', "")
}

fn extension(filename: &str) -> Option<&str> {
    match filename.rfind('.') {
        Some(0) | None => None,
        Some(index) => Some(&filename[index + 1..]),
    }
}

/// Hidden files, editor sidecars and mezzanine derivatives are exempt from naming rules.
pub fn is_safely_deletable(filename: &str) -> bool {
    filename.starts_with('.')
        || extension(filename).is_some_and(|ext| SAFELY_DELETABLE_EXTENSIONS.contains(&ext))
        || dot_stripped(filename).contains("_mez")
}

pub fn is_restriction_marker(filename: &str) -> bool {
    filename == RESTRICTION_MARKER
}

pub fn is_valid_format(filename: &str) -> bool {
    is_safely_deletable(filename) || LOWER_ALNUM_UNDERSCORE.is_match(&dot_stripped(filename))
}

pub fn begins_with_interview_name(filename: &str, interview: &str) -> bool {
    is_safely_deletable(filename)
        || is_restriction_marker(filename)
        || dot_stripped(filename).starts_with(interview)
}

/// Every regular file below `root`, in file-name order per directory.
pub fn payload_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to walk {}", root.display()))?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}
