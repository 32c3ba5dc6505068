use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::model::{CheckId, ValidationOptions};

mod bag;
mod batch;
mod filenames;
#[cfg(test)]
pub(crate) mod fixtures;
mod fixity;
mod ohms;
mod report;
mod sip;

pub use self::batch::{BatchValidator, restricted_interviews};
pub use self::ohms::OhmsValidator;
pub use self::report::Reporter;
pub use self::sip::SipValidator;

#[derive(Debug, Clone)]
pub struct ValidatorContext {
    pub path: PathBuf,
    pub options: ValidationOptions,
    /// Nested run: the parent prints the summary.
    pub partial: bool,
}

impl ValidatorContext {
    pub fn new(path: impl Into<PathBuf>, options: ValidationOptions) -> Self {
        Self {
            path: path.into(),
            options,
            partial: false,
        }
    }

    pub fn nested(&self, path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            options: self.options.clone(),
            partial: true,
        }
    }
}

/// State every concrete validator delegates to.
#[derive(Debug, Clone)]
pub struct ValidatorCore {
    context: ValidatorContext,
    checks: Vec<CheckId>,
    alive: bool,
}

impl ValidatorCore {
    pub fn new(context: ValidatorContext, checks: Vec<CheckId>) -> Self {
        Self {
            context,
            checks,
            alive: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.context.path
    }

    pub fn options(&self) -> &ValidationOptions {
        &self.context.options
    }

    pub fn context(&self) -> &ValidatorContext {
        &self.context
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Adopts a nested validator's verdict.
    pub fn set_alive(&mut self, alive: bool) {
        self.alive = self.alive && alive;
    }

    pub fn fatal(&mut self, reporter: &mut Reporter, check: CheckId, message: impl Into<String>) {
        reporter.fatal(check, message);
        self.alive = false;
    }
}

pub trait Validator {
    fn core(&self) -> &ValidatorCore;

    fn core_mut(&mut self) -> &mut ValidatorCore;

    fn run_check(&mut self, check: CheckId, reporter: &mut Reporter) -> Result<()>;

    fn descend(&mut self, _reporter: &mut Reporter) {}

    fn checks(&self) -> &[CheckId] {
        &self.core().checks
    }

    fn run(&mut self, reporter: &mut Reporter) -> bool {
        let checks = self.core().checks.clone();
        for check in checks {
            if !self.core().is_alive() {
                break;
            }
            if let Err(err) = self.run_check(check, reporter) {
                self.core_mut().fatal(reporter, check, format!("{err:#}"));
            }
        }

        self.descend(reporter);

        if !self.core().context.partial {
            reporter.summarize();
        }

        self.core().is_alive()
    }
}
