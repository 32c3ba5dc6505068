use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationOptions {
    pub packages_dir_override: Option<PathBuf>,
    pub check_fixity: bool,
    pub full_bag_validation: bool,
    pub ignore_filename_errors: bool,
    pub report_passes: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckId {
    BatchExists,
    BatchHasBagitLayout,
    BatchHasSipsDirectory,
    BatchIsAValidBag,
    SipExists,
    SipFilenamesAreAlphanumericPlusUnderscore,
    SipFilenamesBeginWithTheInterviewName,
    SipHasBagitLayout,
    SipHasOhmsMetadataFile,
    SipHasValidOhmsMetadataFile,
    SipCheckFixity,
    SipIsAValidBag,
    OhmsIsValidXml,
    OhmsHasRepository,
    OhmsHasTitle,
    OhmsHasSource,
    OhmsHasCreators,
    OhmsHasSubjects,
    OhmsHasPublisher,
    OhmsHasDate,
    OhmsHasContentType,
    OhmsHasAccessionNumber,
    OhmsHasDescription,
    #[serde(rename = "ohms_date_is_ISO8601_or_American")]
    OhmsDateIsIso8601OrAmerican,
}

impl CheckId {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BatchExists => "batch_exists",
            Self::BatchHasBagitLayout => "batch_has_bagit_layout",
            Self::BatchHasSipsDirectory => "batch_has_sips_directory",
            Self::BatchIsAValidBag => "batch_is_a_valid_bag",
            Self::SipExists => "sip_exists",
            Self::SipFilenamesAreAlphanumericPlusUnderscore => {
                "sip_filenames_are_alphanumeric_plus_underscore"
            }
            Self::SipFilenamesBeginWithTheInterviewName => {
                "sip_filenames_begin_with_the_interview_name"
            }
            Self::SipHasBagitLayout => "sip_has_bagit_layout",
            Self::SipHasOhmsMetadataFile => "sip_has_ohms_metadata_file",
            Self::SipHasValidOhmsMetadataFile => "sip_has_valid_ohms_metadata_file",
            Self::SipCheckFixity => "sip_check_fixity",
            Self::SipIsAValidBag => "sip_is_a_valid_bag",
            Self::OhmsIsValidXml => "ohms_is_valid_xml",
            Self::OhmsHasRepository => "ohms_has_repository",
            Self::OhmsHasTitle => "ohms_has_title",
            Self::OhmsHasSource => "ohms_has_source",
            Self::OhmsHasCreators => "ohms_has_creators",
            Self::OhmsHasSubjects => "ohms_has_subjects",
            Self::OhmsHasPublisher => "ohms_has_publisher",
            Self::OhmsHasDate => "ohms_has_date",
            Self::OhmsHasContentType => "ohms_has_content_type",
            Self::OhmsHasAccessionNumber => "ohms_has_accession_number",
            Self::OhmsHasDescription => "ohms_has_description",
            Self::OhmsDateIsIso8601OrAmerican => "ohms_date_is_ISO8601_or_American",
        }
    }

    /// Log label: the identifier with underscores turned into spaces.
    pub fn label(self) -> String {
        self.as_str().replace('_', " ")
    }

    /// Listing title, with the `sip` and `ohms` words upper-cased.
    pub fn title(self) -> String {
        self.as_str()
            .split('_')
            .map(|word| match word {
                "sip" => "SIP",
                "ohms" => "OHMS",
                other => other,
            })
            .collect::<Vec<&str>>()
            .join(" ")
    }
}

impl fmt::Display for CheckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Ok,
    Warn,
    Fatal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub check: CheckId,
    pub level: Level,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub ok: usize,
    pub warn: usize,
    pub fatal: usize,
}

impl OutcomeCounts {
    pub fn total(&self) -> usize {
        self.ok + self.warn + self.fatal
    }

    pub fn is_valid(&self) -> bool {
        self.ok >= self.total()
    }

    pub fn record(&mut self, level: Level) {
        match level {
            Level::Ok => self.ok += 1,
            Level::Warn => self.warn += 1,
            Level::Fatal => self.fatal += 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub report_version: u32,
    pub generated_at: String,
    pub mode: String,
    pub target: String,
    pub verdict: String,
    pub counts: OutcomeCounts,
    pub per_check: BTreeMap<String, OutcomeCounts>,
    pub findings: Vec<Finding>,
}
