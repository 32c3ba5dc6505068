use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::model::{CheckId, ValidationOptions};
use crate::validate::bag::{check_layout, describe_problems, verify_manifests};
use crate::validate::filenames::RESTRICTION_MARKER;
use crate::validate::{Reporter, SipValidator, Validator, ValidatorContext, ValidatorCore};

pub struct BatchValidator {
    core: ValidatorCore,
    sips_dir: PathBuf,
    alt_sips_dir: Option<PathBuf>,
    resolved_sips_dir: Option<PathBuf>,
}

impl BatchValidator {
    pub fn new(context: ValidatorContext) -> Self {
        let sips_dir = default_sips_dir(&context.path);
        let alt_sips_dir = context
            .options
            .packages_dir_override
            .as_ref()
            .map(|name| context.path.join(name));
        let checks = Self::check_names(&context.options);
        Self {
            core: ValidatorCore::new(context, checks),
            sips_dir,
            alt_sips_dir,
            resolved_sips_dir: None,
        }
    }

    pub fn check_names(options: &ValidationOptions) -> Vec<CheckId> {
        let mut checks = vec![
            CheckId::BatchExists,
            CheckId::BatchHasBagitLayout,
            CheckId::BatchHasSipsDirectory,
        ];
        if options.full_bag_validation {
            checks.push(CheckId::BatchIsAValidBag);
        }
        checks
    }

    /// Packages directory accepted by `batch_has_sips_directory`, once it has run.
    pub fn resolved_sips_dir(&self) -> Option<&Path> {
        self.resolved_sips_dir.as_deref()
    }

    fn exists(&mut self, reporter: &mut Reporter) {
        let path = self.core.path().display().to_string();
        if self.core.path().is_dir() {
            reporter.ok(
                CheckId::BatchExists,
                Some(format!("Found batch directory in {path}")),
            );
        } else {
            self.core
                .fatal(reporter, CheckId::BatchExists, format!("No batch found in {path}"));
        }
    }

    fn has_bagit_layout(&mut self, reporter: &mut Reporter) -> Result<()> {
        let check = CheckId::BatchHasBagitLayout;
        match check_layout(self.core.path())? {
            None => reporter.ok(check, None),
            Some(violation) => {
                let message = format!(
                    "Batch {} is not a valid bag - {}",
                    self.core.path().display(),
                    violation.reason()
                );
                self.core.fatal(reporter, check, message);
            }
        }
        Ok(())
    }

    fn has_sips_directory(&mut self, reporter: &mut Reporter) {
        let check = CheckId::BatchHasSipsDirectory;
        if self.sips_dir.is_dir() {
            self.resolved_sips_dir = Some(self.sips_dir.clone());
            reporter.ok(check, None);
            return;
        }

        match self.alt_sips_dir.clone() {
            Some(alt) if alt.is_dir() => {
                if self.core.options().ignore_filename_errors {
                    reporter.ok(check, None);
                } else {
                    reporter.warn(
                        check,
                        format!("Non-standard SIPs directory found in {}", alt.display()),
                    );
                }
                self.resolved_sips_dir = Some(alt);
            }
            Some(alt) => {
                let message = format!(
                    "Non-standard SIPs directory {} specified, but it does not exist",
                    alt.display()
                );
                self.core.fatal(reporter, check, message);
            }
            None => {
                let message = format!("No SIPs directory found in {}", self.sips_dir.display());
                self.core.fatal(reporter, check, message);
            }
        }
    }

    fn is_a_valid_bag(&mut self, reporter: &mut Reporter) -> Result<()> {
        let problems = verify_manifests(self.core.path())?;
        if problems.is_empty() {
            reporter.ok(CheckId::BatchIsAValidBag, None);
        } else {
            let message = format!(
                "Batch {} is not a valid BagIt bag: {}",
                self.core.path().display(),
                describe_problems(&problems)
            );
            self.core.fatal(reporter, CheckId::BatchIsAValidBag, message);
        }
        Ok(())
    }
}

pub fn default_sips_dir(batch: &Path) -> PathBuf {
    batch.join("data").join("sips")
}

/// Immediate child directories, in filesystem enumeration order.
pub fn package_dirs(sips_dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(sips_dir)
        .with_context(|| format!("failed to read {}", sips_dir.display()))?;

    let mut packages = Vec::new();
    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", sips_dir.display()))?;
        if entry.path().is_dir() {
            packages.push(entry.path());
        }
    }
    Ok(packages)
}

/// Interview names (sorted) whose package carries a restriction marker.
pub fn restricted_interviews(sips_dir: &Path) -> Result<Vec<String>> {
    let mut restricted = package_dirs(sips_dir)?
        .into_iter()
        .filter(|package| package.join(RESTRICTION_MARKER).exists())
        .map(|package| crate::util::file_name_string(&package))
        .collect::<Vec<String>>();
    restricted.sort();
    Ok(restricted)
}

impl Validator for BatchValidator {
    fn core(&self) -> &ValidatorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ValidatorCore {
        &mut self.core
    }

    fn run_check(&mut self, check: CheckId, reporter: &mut Reporter) -> Result<()> {
        match check {
            CheckId::BatchExists => self.exists(reporter),
            CheckId::BatchHasBagitLayout => self.has_bagit_layout(reporter)?,
            CheckId::BatchHasSipsDirectory => self.has_sips_directory(reporter),
            CheckId::BatchIsAValidBag => self.is_a_valid_bag(reporter)?,
            other => anyhow::bail!("{other} is not a batch check"),
        }
        Ok(())
    }

    fn descend(&mut self, reporter: &mut Reporter) {
        if !self.core.is_alive() {
            return;
        }
        let Some(sips_dir) = self.resolved_sips_dir.clone() else {
            return;
        };

        let packages = match package_dirs(&sips_dir) {
            Ok(packages) => packages,
            Err(err) => {
                self.core
                    .fatal(reporter, CheckId::BatchHasSipsDirectory, format!("{err:#}"));
                return;
            }
        };

        for package in packages {
            debug!(package = %package.display(), "validating package");
            let context = self.core.context().nested(package);
            let verdict = SipValidator::new(context).run(reporter);
            self.core.set_alive(verdict);
            if !self.core.is_alive() {
                break;
            }
        }
    }
}
