use std::path::Path;

use anyhow::Result;
use tracing::info;

use crate::cli::CheckArgs;
use crate::util::write_json_pretty;
use crate::validate::Reporter;

pub mod batch;
pub mod list_tests;
pub mod sip;

fn write_report(args: &CheckArgs, reporter: &Reporter, mode: &str, target: &Path) -> Result<()> {
    let Some(report_path) = args.report_path.as_ref() else {
        return Ok(());
    };
    let report = reporter.build_report(mode, &target.display().to_string());
    write_json_pretty(report_path, &report)?;
    info!(path = %report_path.display(), "wrote run report");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CheckId;

    fn check_args(report_path: Option<std::path::PathBuf>) -> CheckArgs {
        CheckArgs {
            check_fixity: false,
            validate_bag: false,
            report_passes: false,
            ignore_filename_errors: false,
            report_path,
        }
    }

    #[test]
    fn write_report_serializes_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let report_path = dir.path().join("reports/run.json");
        let mut reporter = Reporter::silent();
        reporter.ok(CheckId::SipExists, None);
        reporter.warn(CheckId::OhmsHasSubjects, "missing field subject");

        write_report(
            &check_args(Some(report_path.clone())),
            &reporter,
            "sip",
            Path::new("/batch/oh123"),
        )
        .unwrap();

        let raw = std::fs::read_to_string(&report_path).unwrap();
        let report: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(report["report_version"], 1);
        assert_eq!(report["mode"], "sip");
        assert_eq!(report["target"], "/batch/oh123");
        assert_eq!(report["verdict"], "INVALID");
        assert_eq!(report["counts"]["ok"], 1);
        assert_eq!(report["counts"]["warn"], 1);
        assert_eq!(report["per_check"]["ohms_has_subjects"]["warn"], 1);
        assert_eq!(report["findings"][1]["check"], "ohms_has_subjects");
        assert_eq!(report["findings"][1]["level"], "warn");
        assert_eq!(report["findings"][1]["message"], "missing field subject");
        assert!(report["findings"][0]["message"].is_null());
    }

    #[test]
    fn write_report_without_a_path_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let reporter = Reporter::silent();
        write_report(&check_args(None), &reporter, "batch", dir.path()).unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
