use anyhow::Result;

use crate::cli::ListTestsArgs;
use crate::model::{CheckId, ValidationOptions};
use crate::validate::{BatchValidator, OhmsValidator, SipValidator};

pub fn run(args: ListTestsArgs) -> Result<bool> {
    let options = ValidationOptions {
        check_fixity: args.check_fixity,
        full_bag_validation: args.validate_bag,
        ..ValidationOptions::default()
    };
    print!("{}", render_listing(&options));
    Ok(true)
}

pub fn render_listing(options: &ValidationOptions) -> String {
    let mut out = String::new();
    push_section(
        &mut out,
        "Batch validation tests:",
        &BatchValidator::check_names(options),
    );
    out.push('\n');
    push_section(
        &mut out,
        "SIP validation tests:",
        &SipValidator::check_names(options),
    );
    out.push('\n');
    push_section(
        &mut out,
        "OHMS metadata validation tests:",
        &OhmsValidator::check_names(),
    );
    out
}

fn push_section(out: &mut String, heading: &str, checks: &[CheckId]) {
    out.push_str(heading);
    out.push('\n');
    for check in checks {
        out.push_str(&format!("* {}\n", check.title()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_titles_checks_and_includes_optional_ones() {
        let options = ValidationOptions {
            check_fixity: true,
            ..ValidationOptions::default()
        };
        let listing = render_listing(&options);
        assert!(listing.starts_with("Batch validation tests:\n* batch exists\n"));
        assert!(listing.contains("* SIP has OHMS metadata file\n"));
        assert!(listing.contains("* SIP check fixity\n"));
        assert!(listing.contains("* OHMS date is ISO8601 or American\n"));
        assert!(!listing.contains("valid bag"));
    }
}
