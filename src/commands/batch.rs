use std::path::Path;

use anyhow::Result;
use tracing::info;

use crate::cli::BatchArgs;
use crate::commands::write_report;
use crate::util::resolve_against_cwd;
use crate::validate::{BatchValidator, Reporter, Validator, ValidatorContext, restricted_interviews};

pub fn run(args: BatchArgs) -> Result<bool> {
    let path = resolve_against_cwd(&args.path)?;
    let options = args.checks.options(args.sips_dir.clone());

    info!(
        path = %path.display(),
        check_fixity = options.check_fixity,
        validate_bag = options.full_bag_validation,
        "validating batch"
    );

    let mut reporter = Reporter::stdout(options.report_passes);
    let mut validator = BatchValidator::new(ValidatorContext::new(&path, options));
    validator.run(&mut reporter);

    if args.list_restricted {
        print!("{}", render_restricted(validator.resolved_sips_dir())?);
    }

    write_report(&args.checks, &reporter, "batch", &path)?;
    Ok(reporter.is_valid())
}

fn render_restricted(sips_dir: Option<&Path>) -> Result<String> {
    let Some(sips_dir) = sips_dir else {
        return Ok("\nBatch is malformed, so not checking for restricted interviews.\n".to_string());
    };

    let mut out = String::from("\nRestricted interviews:\n");
    let restricted = restricted_interviews(sips_dir)?;
    if restricted.is_empty() {
        out.push_str("  (No restricted interviews found)\n");
    }
    for interview in restricted {
        out.push_str(&format!("* {interview}\n"));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::fixtures::{batch_with, write_file};

    #[test]
    fn restricted_listing_names_marked_packages() {
        let dir = tempfile::tempdir().unwrap();
        let sips = batch_with(dir.path(), &["oh001", "oh002", "oh003"], &[]);
        write_file(&sips.join("oh003/restricted.txt"), b"");
        write_file(&sips.join("oh001/restricted.txt"), b"");

        assert_eq!(
            render_restricted(Some(sips.as_path())).unwrap(),
            "\nRestricted interviews:\n* oh001\n* oh003\n"
        );
    }

    #[test]
    fn restricted_listing_reports_none_found_and_malformed_batch() {
        let dir = tempfile::tempdir().unwrap();
        let sips = batch_with(dir.path(), &["oh001"], &[]);

        assert_eq!(
            render_restricted(Some(sips.as_path())).unwrap(),
            "\nRestricted interviews:\n  (No restricted interviews found)\n"
        );
        assert!(
            render_restricted(None)
                .unwrap()
                .contains("Batch is malformed, so not checking for restricted interviews.")
        );
    }
}
