use std::path::PathBuf;

use anyhow::Result;

use crate::model::{CheckId, ValidationOptions};
use crate::util::{file_name_string, relative_display};
use crate::validate::bag::{check_layout, describe_problems, verify_manifests};
use crate::validate::filenames::{begins_with_interview_name, is_valid_format, payload_files};
use crate::validate::fixity::{FixityOutcome, is_checksum_file, verify_file};
use crate::validate::{OhmsValidator, Reporter, Validator, ValidatorContext, ValidatorCore};

pub struct SipValidator {
    core: ValidatorCore,
    base: String,
}

impl SipValidator {
    pub fn new(context: ValidatorContext) -> Self {
        let base = file_name_string(&context.path);
        let checks = Self::check_names(&context.options);
        Self {
            core: ValidatorCore::new(context, checks),
            base,
        }
    }

    pub fn check_names(options: &ValidationOptions) -> Vec<CheckId> {
        let mut checks = vec![
            CheckId::SipExists,
            CheckId::SipFilenamesAreAlphanumericPlusUnderscore,
            CheckId::SipFilenamesBeginWithTheInterviewName,
            CheckId::SipHasBagitLayout,
            CheckId::SipHasOhmsMetadataFile,
            CheckId::SipHasValidOhmsMetadataFile,
        ];
        if options.check_fixity {
            checks.push(CheckId::SipCheckFixity);
        }
        if options.full_bag_validation {
            checks.push(CheckId::SipIsAValidBag);
        }
        checks
    }

    fn data_dir(&self) -> PathBuf {
        self.core.path().join("data")
    }

    fn ohms_filename(&self) -> PathBuf {
        self.data_dir().join(format!("{}_ohm.xml", self.base))
    }

    fn exists(&mut self, reporter: &mut Reporter) {
        if self.core.path().is_dir() {
            reporter.ok(CheckId::SipExists, Some(String::new()));
        } else {
            let message = format!("No SIP found in {}", self.core.path().display());
            self.core.fatal(reporter, CheckId::SipExists, message);
        }
    }

    /// Payload files that fail `is_valid`, or `None` after reporting a missing data directory.
    fn invalid_payload_files(
        &mut self,
        reporter: &mut Reporter,
        check: CheckId,
        is_valid: impl Fn(&str) -> bool,
    ) -> Result<Option<Vec<PathBuf>>> {
        let data = self.data_dir();
        if !data.is_dir() {
            let message = format!("SIP {} has no data directory", self.base);
            self.core.fatal(reporter, check, message);
            return Ok(None);
        }

        let invalid = payload_files(&data)?
            .into_iter()
            .filter(|path| !is_valid(&file_name_string(path)))
            .collect::<Vec<PathBuf>>();
        Ok(Some(invalid))
    }

    fn filenames_are_alphanumeric(&mut self, reporter: &mut Reporter) -> Result<()> {
        let check = CheckId::SipFilenamesAreAlphanumericPlusUnderscore;
        if self.core.options().ignore_filename_errors {
            reporter.ok(check, None);
            return Ok(());
        }

        let Some(invalid) = self.invalid_payload_files(reporter, check, is_valid_format)? else {
            return Ok(());
        };
        for path in &invalid {
            reporter.warn(
                check,
                format!(
                    "SIP {}: filename {} has invalid characters",
                    self.base,
                    path.display()
                ),
            );
        }

        if invalid.is_empty() {
            reporter.ok(check, None);
        } else {
            reporter.warn(
                check,
                format!("SIP {} includes filenames with invalid characters", self.base),
            );
        }
        Ok(())
    }

    fn filenames_begin_with_interview_name(&mut self, reporter: &mut Reporter) -> Result<()> {
        let check = CheckId::SipFilenamesBeginWithTheInterviewName;
        if self.core.options().ignore_filename_errors {
            reporter.ok(check, None);
            return Ok(());
        }

        let base = self.base.clone();
        let Some(invalid) = self.invalid_payload_files(reporter, check, |filename| {
            begins_with_interview_name(filename, &base)
        })?
        else {
            return Ok(());
        };
        for path in &invalid {
            reporter.warn(
                check,
                format!(
                    "SIP {}: filename {} has incorrect prefix, should be {}",
                    self.base,
                    relative_display(path, self.core.path()),
                    self.base
                ),
            );
        }

        if invalid.is_empty() {
            reporter.ok(check, None);
        } else {
            reporter.warn(
                check,
                format!("SIP {} includes filenames with incorrect prefix", self.base),
            );
        }
        Ok(())
    }

    fn has_bagit_layout(&mut self, reporter: &mut Reporter) -> Result<()> {
        let check = CheckId::SipHasBagitLayout;
        match check_layout(self.core.path())? {
            None => reporter.ok(check, None),
            Some(violation) => {
                let message = format!(
                    "SIP {} is not a valid bag - {}",
                    self.core.path().display(),
                    violation.reason()
                );
                self.core.fatal(reporter, check, message);
            }
        }
        Ok(())
    }

    fn has_ohms_metadata_file(&mut self, reporter: &mut Reporter) {
        let ohms = self.ohms_filename();
        if ohms.is_file() {
            reporter.ok(CheckId::SipHasOhmsMetadataFile, None);
        } else {
            let message = format!(
                "SIP {}: missing OHMS metadata file, expected in {}",
                self.base,
                ohms.display()
            );
            self.core
                .fatal(reporter, CheckId::SipHasOhmsMetadataFile, message);
        }
    }

    fn has_valid_ohms_metadata_file(&mut self, reporter: &mut Reporter) {
        let context = self.core.context().nested(self.ohms_filename());
        let verdict = OhmsValidator::new(context).run(reporter);
        self.core.set_alive(verdict);
    }

    fn check_fixity(&mut self, reporter: &mut Reporter) -> Result<()> {
        let check = CheckId::SipCheckFixity;
        let master = self.data_dir().join("master");
        if !master.is_dir() {
            reporter.ok(check, Some("no master directory".to_string()));
            return Ok(());
        }

        let mut valid = true;
        for file in payload_files(&master)? {
            if is_checksum_file(&file) {
                continue;
            }
            let relative = relative_display(&file, self.core.path());
            match verify_file(&file)? {
                FixityOutcome::Verified => reporter.ok(check, None),
                FixityOutcome::MissingRecord { record } => {
                    valid = false;
                    reporter.warn(
                        check,
                        format!(
                            "SIP {}: master file {relative} is missing a checksum file, \
                             expected {}",
                            self.base,
                            file_name_string(&record)
                        ),
                    );
                }
                FixityOutcome::MissingEntry { record } => {
                    valid = false;
                    reporter.warn(
                        check,
                        format!(
                            "SIP {}: can't find checksum for {relative} in {}",
                            self.base,
                            file_name_string(&record)
                        ),
                    );
                }
                FixityOutcome::Mismatch { expected, actual } => {
                    valid = false;
                    reporter.warn(
                        check,
                        format!(
                            "SIP {}: checksum mismatch for {relative}, \
                             recorded {expected}, computed {actual}",
                            self.base
                        ),
                    );
                }
            }
        }

        if valid {
            reporter.ok(check, None);
        } else {
            reporter.warn(
                check,
                format!("SIP {} includes master files that fail fixity", self.base),
            );
        }
        Ok(())
    }

    fn is_a_valid_bag(&mut self, reporter: &mut Reporter) -> Result<()> {
        let problems = verify_manifests(self.core.path())?;
        if problems.is_empty() {
            reporter.ok(CheckId::SipIsAValidBag, None);
        } else {
            let message = format!(
                "SIP {} is not a valid BagIt bag: {}",
                self.core.path().display(),
                describe_problems(&problems)
            );
            self.core.fatal(reporter, CheckId::SipIsAValidBag, message);
        }
        Ok(())
    }
}

impl Validator for SipValidator {
    fn core(&self) -> &ValidatorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ValidatorCore {
        &mut self.core
    }

    fn run_check(&mut self, check: CheckId, reporter: &mut Reporter) -> Result<()> {
        match check {
            CheckId::SipExists => self.exists(reporter),
            CheckId::SipFilenamesAreAlphanumericPlusUnderscore => {
                self.filenames_are_alphanumeric(reporter)?
            }
            CheckId::SipFilenamesBeginWithTheInterviewName => {
                self.filenames_begin_with_interview_name(reporter)?
            }
            CheckId::SipHasBagitLayout => self.has_bagit_layout(reporter)?,
            CheckId::SipHasOhmsMetadataFile => self.has_ohms_metadata_file(reporter),
            CheckId::SipHasValidOhmsMetadataFile => self.has_valid_ohms_metadata_file(reporter),
            CheckId::SipCheckFixity => self.check_fixity(reporter)?,
            CheckId::SipIsAValidBag => self.is_a_valid_bag(reporter)?,
            other => anyhow::bail!("{other} is not a SIP check"),
        }
        Ok(())
    }
}
