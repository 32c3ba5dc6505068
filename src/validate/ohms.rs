use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use encoding_rs::{Encoding, UTF_8};
use regex::Regex;
use tracing::debug;

use crate::model::CheckId;
use crate::util::file_name_string;
use crate::validate::{Reporter, Validator, ValidatorContext, ValidatorCore};

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").expect("static date regex"));
static AMERICAN_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{2})-(\d{2})-(\d{4})$").expect("static date regex"));
static XML_ENCODING: LazyLock<regex::bytes::Regex> = LazyLock::new(|| {
    regex::bytes::Regex::new(r#"^<\?xml\s[^>]*?encoding\s*=\s*["']([A-Za-z0-9._:-]+)["']"#)
        .expect("static encoding regex")
});

/// Elements read from the metadata document; the first match of each is kept.
const CONSUMED_FIELDS: [&str; 10] = [
    "repository",
    "title",
    "series_name",
    "interviewee",
    "interviewer",
    "subject",
    "date",
    "clip_format",
    "accession",
    "description",
];

const CHECKS: [CheckId; 12] = [
    CheckId::OhmsIsValidXml,
    CheckId::OhmsHasRepository,
    CheckId::OhmsHasTitle,
    CheckId::OhmsHasSource,
    CheckId::OhmsHasCreators,
    CheckId::OhmsHasSubjects,
    CheckId::OhmsHasPublisher,
    CheckId::OhmsHasDate,
    CheckId::OhmsHasContentType,
    CheckId::OhmsHasAccessionNumber,
    CheckId::OhmsHasDescription,
    CheckId::OhmsDateIsIso8601OrAmerican,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateVerdict {
    Iso8601,
    American,
    InvalidIso8601,
    InvalidAmerican,
    Unrecognized,
}

pub fn classify_date(value: &str) -> DateVerdict {
    if let Some(captures) = ISO_DATE.captures(value) {
        if is_calendar_date(&captures[1], &captures[2], &captures[3]) {
            DateVerdict::Iso8601
        } else {
            DateVerdict::InvalidIso8601
        }
    } else if let Some(captures) = AMERICAN_DATE.captures(value) {
        if is_calendar_date(&captures[3], &captures[1], &captures[2]) {
            DateVerdict::American
        } else {
            DateVerdict::InvalidAmerican
        }
    } else {
        DateVerdict::Unrecognized
    }
}

fn is_calendar_date(year: &str, month: &str, day: &str) -> bool {
    match (year.parse::<i32>(), month.parse::<u32>(), day.parse::<u32>()) {
        (Ok(year), Ok(month), Ok(day)) => NaiveDate::from_ymd_opt(year, month, day).is_some(),
        _ => false,
    }
}

/// Text content (all descendant text) of the first element with each consumed name.
pub fn extract_fields(text: &str) -> Result<BTreeMap<&'static str, String>, roxmltree::Error> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };
    let document = roxmltree::Document::parse_with_options(text, options)?;

    let mut fields = BTreeMap::new();
    for node in document.descendants().filter(|node| node.is_element()) {
        let name = node.tag_name().name();
        let Some(field) = CONSUMED_FIELDS.iter().find(|field| **field == name) else {
            continue;
        };
        if fields.contains_key(field) {
            continue;
        }
        let content = node
            .descendants()
            .filter(|child| child.is_text())
            .filter_map(|child| child.text())
            .collect::<String>();
        fields.insert(*field, content);
    }
    Ok(fields)
}

pub struct OhmsValidator {
    core: ValidatorCore,
    base: String,
    fields: BTreeMap<&'static str, String>,
}

impl OhmsValidator {
    pub fn new(context: ValidatorContext) -> Self {
        let base = file_name_string(&context.path);
        Self {
            core: ValidatorCore::new(context, CHECKS.to_vec()),
            base,
            fields: BTreeMap::new(),
        }
    }

    pub fn check_names() -> Vec<CheckId> {
        CHECKS.to_vec()
    }

    fn field(&self, field: &str) -> Option<&str> {
        self.fields
            .get(field)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    fn has_field(&self, reporter: &mut Reporter, check: CheckId, field: &str, label: &str) {
        if self.field(field).is_some() {
            reporter.ok(check, None);
        } else {
            reporter.warn(
                check,
                format!("OHMS: metadata file {} is missing field {label}", self.base),
            );
        }
    }

    fn is_valid_xml(&mut self, reporter: &mut Reporter) -> Result<()> {
        let path = self.core.path().to_path_buf();
        let parsed = read_metadata(&path).and_then(|text| {
            extract_fields(&text).with_context(|| format!("failed to parse {}", path.display()))
        });

        match parsed {
            Ok(fields) => {
                self.fields = fields;
                reporter.ok(CheckId::OhmsIsValidXml, None);
            }
            Err(err) => {
                debug!(
                    path = %path.display(),
                    error = %format!("{err:#}"),
                    "metadata parse failed"
                );
                let message = format!("OHMS: metadata file {} is invalid XML", self.base);
                self.core.fatal(reporter, CheckId::OhmsIsValidXml, message);
            }
        }
        Ok(())
    }

    fn date_is_iso8601_or_american(&self, reporter: &mut Reporter) {
        let check = CheckId::OhmsDateIsIso8601OrAmerican;
        let date = self.field("date").map(str::trim).unwrap_or_default();
        match classify_date(date) {
            DateVerdict::Iso8601 | DateVerdict::American => reporter.ok(check, None),
            DateVerdict::InvalidIso8601 => reporter.warn(
                check,
                format!(
                    "OHMS metadata file {} uses invalid ISO8601 date {date}",
                    self.base
                ),
            ),
            DateVerdict::InvalidAmerican => reporter.warn(
                check,
                format!(
                    "OHMS metadata file {} uses invalid American date {date}",
                    self.base
                ),
            ),
            DateVerdict::Unrecognized => reporter.warn(
                check,
                format!(
                    "OHMS metadata file {} has non-ISO8601, non-American date format",
                    self.base
                ),
            ),
        }
    }
}

fn read_metadata(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    decode_metadata(&bytes).with_context(|| format!("failed to decode {}", path.display()))
}

/// Decodes by byte order mark, then by the declaration's `encoding`, else UTF-8.
fn decode_metadata(bytes: &[u8]) -> Result<String> {
    let encoding = match Encoding::for_bom(bytes) {
        Some((encoding, _)) => encoding,
        None => declared_encoding(bytes)?,
    };
    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        bail!("content is not valid {}", used.name());
    }
    Ok(text.into_owned())
}

fn declared_encoding(bytes: &[u8]) -> Result<&'static Encoding> {
    let Some(captures) = XML_ENCODING.captures(bytes) else {
        return Ok(UTF_8);
    };
    let label = &captures[1];
    // an ASCII-readable declaration cannot be UTF-16
    match Encoding::for_label(label).map(Encoding::output_encoding) {
        Some(encoding) => Ok(encoding),
        None => bail!("unsupported encoding {}", String::from_utf8_lossy(label)),
    }
}

impl Validator for OhmsValidator {
    fn core(&self) -> &ValidatorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ValidatorCore {
        &mut self.core
    }

    fn run_check(&mut self, check: CheckId, reporter: &mut Reporter) -> Result<()> {
        match check {
            CheckId::OhmsIsValidXml => return self.is_valid_xml(reporter),
            CheckId::OhmsHasRepository => {
                self.has_field(reporter, check, "repository", "repository")
            }
            CheckId::OhmsHasTitle => self.has_field(reporter, check, "title", "title"),
            CheckId::OhmsHasSource => self.has_field(reporter, check, "series_name", "source"),
            CheckId::OhmsHasCreators => {
                self.has_field(reporter, check, "interviewee", "creators:interviewee");
                self.has_field(reporter, check, "interviewer", "creators:interviewer");
            }
            CheckId::OhmsHasSubjects => self.has_field(reporter, check, "subject", "subject"),
            CheckId::OhmsHasPublisher => {
                self.has_field(reporter, check, "repository", "publisher:repository")
            }
            CheckId::OhmsHasDate => self.has_field(reporter, check, "date", "date"),
            CheckId::OhmsHasContentType => {
                self.has_field(reporter, check, "clip_format", "content_type:clip_format")
            }
            CheckId::OhmsHasAccessionNumber => {
                self.has_field(reporter, check, "accession", "accession")
            }
            CheckId::OhmsHasDescription => {
                self.has_field(reporter, check, "description", "description")
            }
            CheckId::OhmsDateIsIso8601OrAmerican => self.date_is_iso8601_or_american(reporter),
            other => anyhow::bail!("{other} is not an OHMS metadata check"),
        }
        Ok(())
    }
}
