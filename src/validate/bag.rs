use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::debug;
use walkdir::WalkDir;

use crate::util::{md5_file, relative_display, sha256_file, sha512_file};

static MANIFEST_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^manifest-(\w+)\.txt$").expect("static manifest regex"));
static TAG_OR_MANIFEST_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(tag)?manifest-\w+\.txt$").expect("static manifest regex"));
static MANIFEST_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\S+)\s+(.+?)\s*$").expect("static manifest line regex"));

const MAX_LISTED_PROBLEMS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutViolation {
    MissingBagitTxt,
    MissingDataDirectory,
    StrayFiles(Vec<String>),
    MissingManifest,
}

impl LayoutViolation {
    pub fn reason(&self) -> String {
        match self {
            Self::MissingBagitTxt => "bagit.txt is missing".to_string(),
            Self::MissingDataDirectory => "data directory is missing".to_string(),
            Self::StrayFiles(files) => format!(
                "bag directory includes files that should be in a data directory: {}",
                files.join(", ")
            ),
            Self::MissingManifest => "no manifest-***.txt file found".to_string(),
        }
    }
}

/// Structure-only bag rule; reports the first violation found.
pub fn check_layout(root: &Path) -> Result<Option<LayoutViolation>> {
    if !root.join("bagit.txt").exists() {
        return Ok(Some(LayoutViolation::MissingBagitTxt));
    }
    if !root.join("data").is_dir() {
        return Ok(Some(LayoutViolation::MissingDataDirectory));
    }

    let names = top_level_names(root)?;

    let stray = names
        .iter()
        .filter(|name| !is_bag_entry(name))
        .cloned()
        .collect::<Vec<String>>();
    if !stray.is_empty() {
        return Ok(Some(LayoutViolation::StrayFiles(stray)));
    }

    if !names.iter().any(|name| MANIFEST_NAME.is_match(name)) {
        return Ok(Some(LayoutViolation::MissingManifest));
    }

    Ok(None)
}

fn is_bag_entry(name: &str) -> bool {
    matches!(name, "bagit.txt" | "bag-info.txt" | "data") || TAG_OR_MANIFEST_NAME.is_match(name)
}

fn top_level_names(root: &Path) -> Result<Vec<String>> {
    let entries =
        fs::read_dir(root).with_context(|| format!("failed to read {}", root.display()))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to read entry in {}", root.display()))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        // hidden entries are not part of the bag listing
        if name.starts_with('.') {
            continue;
        }
        names.push(name);
    }
    names.sort();
    Ok(names)
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum ManifestAlgorithm {
    Md5,
    Sha256,
    Sha512,
}

impl ManifestAlgorithm {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "md5" => Some(Self::Md5),
            "sha256" => Some(Self::Sha256),
            "sha512" => Some(Self::Sha512),
            _ => None,
        }
    }

    fn digest(self, path: &Path) -> Result<String> {
        match self {
            Self::Md5 => md5_file(path),
            Self::Sha256 => sha256_file(path),
            Self::Sha512 => sha512_file(path),
        }
    }
}

/// Verifies payload manifests: listed files exist and match, every payload file is listed.
pub fn verify_manifests(root: &Path) -> Result<Vec<String>> {
    let mut problems = Vec::new();
    let payload = payload_files(root)?;
    let mut verified_any = false;

    for name in top_level_names(root)? {
        let Some(captures) = MANIFEST_NAME.captures(&name) else {
            continue;
        };
        let Some(algorithm) = ManifestAlgorithm::parse(&captures[1]) else {
            debug!(manifest = %name, "skipping manifest with unsupported algorithm");
            continue;
        };
        verified_any = true;

        let manifest_path = root.join(&name);
        let raw = fs::read_to_string(&manifest_path)
            .with_context(|| format!("failed to read {}", manifest_path.display()))?;

        let mut listed = BTreeSet::new();
        for line in raw.lines().filter(|line| !line.trim().is_empty()) {
            let Some(captures) = MANIFEST_LINE.captures(line) else {
                problems.push(format!("{name} has a malformed line: {line}"));
                continue;
            };
            let expected = captures[1].to_ascii_lowercase();
            let relative = captures[2].trim_start_matches("./").to_string();
            let target = root.join(&relative);

            if !target.is_file() {
                problems.push(format!("{name} lists missing file {relative}"));
            } else {
                let actual = algorithm.digest(&target)?;
                if actual != expected {
                    problems.push(format!(
                        "{name} checksum mismatch for {relative}: expected {expected}, got {actual}"
                    ));
                }
            }
            listed.insert(relative);
        }

        for relative in payload.iter().filter(|relative| !listed.contains(*relative)) {
            problems.push(format!("{relative} is not listed in {name}"));
        }
    }

    if !verified_any {
        problems.push("no manifest with a supported algorithm (md5, sha256, sha512)".to_string());
    }

    Ok(problems)
}

pub fn describe_problems(problems: &[String]) -> String {
    let mut listed = problems
        .iter()
        .take(MAX_LISTED_PROBLEMS)
        .cloned()
        .collect::<Vec<String>>()
        .join("; ");
    if problems.len() > MAX_LISTED_PROBLEMS {
        listed.push_str(&format!(
            "; and {} more",
            problems.len() - MAX_LISTED_PROBLEMS
        ));
    }
    listed
}

fn payload_files(root: &Path) -> Result<BTreeSet<String>> {
    let data = root.join("data");
    let mut files = BTreeSet::new();
    if !data.is_dir() {
        return Ok(files);
    }

    for entry in WalkDir::new(&data) {
        let entry = entry.with_context(|| format!("failed to walk {}", data.display()))?;
        if entry.file_type().is_file() {
            files.insert(relative_display(entry.path(), root));
        }
    }
    Ok(files)
}
