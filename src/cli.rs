use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::model::ValidationOptions;

#[derive(Parser, Debug)]
#[command(
    name = "oh-sip",
    version,
    about = "Validate oral history submission packages (SIPs) and batches"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a batch of SIPs.
    Batch(BatchArgs),
    /// Validate a single SIP directory.
    Sip(SipArgs),
    /// List available validation tests without running them.
    ListTests(ListTestsArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Check fixity of master files against their _fix.md5 records.
    #[arg(long, default_value_t = false)]
    pub check_fixity: bool,

    /// Verify bag manifests against payload contents.
    #[arg(long, default_value_t = false)]
    pub validate_bag: bool,

    /// Include passing tests in the log.
    #[arg(long, default_value_t = false)]
    pub report_passes: bool,

    /// Ignore filename errors (development only).
    #[arg(long, default_value_t = false, hide = true)]
    pub ignore_filename_errors: bool,

    /// Write a JSON run report to this path.
    #[arg(long)]
    pub report_path: Option<PathBuf>,
}

impl CheckArgs {
    pub fn options(&self, packages_dir_override: Option<PathBuf>) -> ValidationOptions {
        ValidationOptions {
            packages_dir_override,
            check_fixity: self.check_fixity,
            full_bag_validation: self.validate_bag,
            ignore_filename_errors: self.ignore_filename_errors,
            report_passes: self.report_passes,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct BatchArgs {
    /// Location of the batch directory.
    #[arg(long, default_value = ".")]
    pub path: PathBuf,

    /// SIPs directory, relative to the batch, when it is not data/sips.
    #[arg(long)]
    pub sips_dir: Option<PathBuf>,

    /// List restricted interviews after validating.
    #[arg(long, default_value_t = false)]
    pub list_restricted: bool,

    #[command(flatten)]
    pub checks: CheckArgs,
}

#[derive(Args, Debug, Clone)]
pub struct SipArgs {
    /// Location of the SIP directory.
    #[arg(long)]
    pub path: PathBuf,

    #[command(flatten)]
    pub checks: CheckArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ListTestsArgs {
    #[arg(long, default_value_t = false)]
    pub check_fixity: bool,

    #[arg(long, default_value_t = false)]
    pub validate_bag: bool,
}
