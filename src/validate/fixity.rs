use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;

use crate::util::{file_name_string, md5_file};

static CHECKSUM_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([0-9a-f]{32})\s*-\s*(.+?)\s*$").expect("static checksum regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixityOutcome {
    Verified,
    MissingRecord { record: PathBuf },
    MissingEntry { record: PathBuf },
    Mismatch { expected: String, actual: String },
}

/// `<stem>_fix.md5` next to the master file.
pub fn checksum_record_path(file: &Path) -> PathBuf {
    let stem = file
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    file.with_file_name(format!("{stem}_fix.md5"))
}

pub fn is_checksum_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "md5")
}

pub fn find_recorded_checksum(record: &str, filename: &str) -> Option<String> {
    record.lines().find_map(|line| {
        let captures = CHECKSUM_LINE.captures(line)?;
        if &captures[2] == filename {
            Some(captures[1].to_string())
        } else {
            None
        }
    })
}

pub fn verify_file(file: &Path) -> Result<FixityOutcome> {
    let record = checksum_record_path(file);
    if !record.is_file() {
        return Ok(FixityOutcome::MissingRecord { record });
    }

    let raw = fs::read(&record)
        .with_context(|| format!("failed to read checksum file {}", record.display()))?;
    let raw = String::from_utf8_lossy(&raw);
    let Some(expected) = find_recorded_checksum(&raw, &file_name_string(file)) else {
        return Ok(FixityOutcome::MissingEntry { record });
    };

    let actual = md5_file(file)?;
    if actual == expected {
        Ok(FixityOutcome::Verified)
    } else {
        Ok(FixityOutcome::Mismatch { expected, actual })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::fixtures::write_file;

    #[test]
    fn checksum_record_sits_next_to_the_master_file() {
        let record = checksum_record_path(Path::new("/sip/data/master/oh123_a.wav"));
        assert_eq!(record, PathBuf::from("/sip/data/master/oh123_a_fix.md5"));
    }

    #[test]
    fn recorded_checksum_lookup_tolerates_spacing_and_is_case_sensitive() {
        let record = "\
5eb63bbbe01eeed093cb22bb8f5acdc3 - oh123_a.wav
d41d8cd98f00b204e9800998ecf8427e   -   oh123_b.wav
";
        assert_eq!(
            find_recorded_checksum(record, "oh123_a.wav").as_deref(),
            Some("5eb63bbbe01eeed093cb22bb8f5acdc3")
        );
        assert_eq!(
            find_recorded_checksum(record, "oh123_b.wav").as_deref(),
            Some("d41d8cd98f00b204e9800998ecf8427e")
        );
        assert_eq!(find_recorded_checksum(record, "OH123_A.wav"), None);
    }

    #[test]
    fn uppercase_digests_are_not_checksum_lines() {
        let record = "5EB63BBBE01EEED093CB22BB8F5ACDC3 - oh123_a.wav\n";
        assert_eq!(find_recorded_checksum(record, "oh123_a.wav"), None);
    }

    #[test]
    fn verify_file_reports_each_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("oh123_a.wav");
        write_file(&file, b"hello world");

        assert!(matches!(
            verify_file(&file).unwrap(),
            FixityOutcome::MissingRecord { .. }
        ));

        write_file(
            &dir.path().join("oh123_a_fix.md5"),
            b"5eb63bbbe01eeed093cb22bb8f5acdc3 - oh123_other.wav\n",
        );
        assert!(matches!(
            verify_file(&file).unwrap(),
            FixityOutcome::MissingEntry { .. }
        ));

        write_file(
            &dir.path().join("oh123_a_fix.md5"),
            b"5eb63bbbe01eeed093cb22bb8f5acdc3 - oh123_a.wav\n",
        );
        assert_eq!(verify_file(&file).unwrap(), FixityOutcome::Verified);

        write_file(&file, b"hello world!");
        match verify_file(&file).unwrap() {
            FixityOutcome::Mismatch { expected, actual } => {
                assert_eq!(expected, "5eb63bbbe01eeed093cb22bb8f5acdc3");
                assert_ne!(actual, expected);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn non_utf8_bytes_in_the_record_do_not_hide_valid_lines() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("oh123_a.wav");
        write_file(&file, b"hello world");

        write_file(
            &dir.path().join("oh123_a_fix.md5"),
            b"5eb63bbbe01eeed093cb22bb8f5acdc3 - oh123_a.wav\n# caf\xe9\n",
        );
        assert_eq!(verify_file(&file).unwrap(), FixityOutcome::Verified);

        write_file(&dir.path().join("oh123_a_fix.md5"), b"\xff\xfe\xe9\n");
        assert!(matches!(
            verify_file(&file).unwrap(),
            FixityOutcome::MissingEntry { .. }
        ));
    }
}
