use anyhow::Result;
use tracing::{debug, info};

use crate::cli::SipArgs;
use crate::commands::write_report;
use crate::util::resolve_against_cwd;
use crate::validate::{Reporter, SipValidator, Validator, ValidatorContext};

pub fn run(args: SipArgs) -> Result<bool> {
    let path = resolve_against_cwd(&args.path)?;
    let options = args.checks.options(None);

    info!(path = %path.display(), "validating SIP");

    let mut reporter = Reporter::stdout(options.report_passes);
    let mut validator = SipValidator::new(ValidatorContext::new(&path, options));
    debug!(checks = validator.checks().len(), "running SIP checks");
    validator.run(&mut reporter);

    write_report(&args.checks, &reporter, "sip", &path)?;
    Ok(reporter.is_valid())
}
