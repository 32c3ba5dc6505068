use std::collections::BTreeMap;
use std::io::{self, Write};

use tracing::{error, info, warn};

use crate::model::{CheckId, Finding, Level, OutcomeCounts, RunReport};
use crate::util::now_utc_string;

/// Run-wide result aggregator shared by every validator in the tree.
pub struct Reporter {
    report_passes: bool,
    counts: OutcomeCounts,
    findings: Vec<Finding>,
    summary_out: Box<dyn Write>,
    last_summary: Option<String>,
}

impl Reporter {
    pub fn new(report_passes: bool, summary_out: Box<dyn Write>) -> Self {
        Self {
            report_passes,
            counts: OutcomeCounts::default(),
            findings: Vec::new(),
            summary_out,
            last_summary: None,
        }
    }

    pub fn stdout(report_passes: bool) -> Self {
        Self::new(report_passes, Box::new(io::stdout()))
    }

    #[cfg(test)]
    pub fn silent() -> Self {
        Self::new(false, Box::new(io::sink()))
    }

    pub fn ok(&mut self, check: CheckId, note: Option<String>) {
        if self.report_passes {
            info!(check = check.as_str(), "ok {}", check.label());
        }
        self.record(check, Level::Ok, note);
    }

    pub fn warn(&mut self, check: CheckId, message: impl Into<String>) {
        let message = message.into();
        warn!(check = check.as_str(), "not ok {} ({})", check.label(), message);
        self.record(check, Level::Warn, Some(message));
    }

    pub fn fatal(&mut self, check: CheckId, message: impl Into<String>) {
        let message = message.into();
        error!(check = check.as_str(), "not ok {} ({})", check.label(), message);
        self.record(check, Level::Fatal, Some(message));
    }

    fn record(&mut self, check: CheckId, level: Level, message: Option<String>) {
        self.counts.record(level);
        self.findings.push(Finding {
            check,
            level,
            message,
        });
    }

    #[cfg(test)]
    pub fn counts(&self) -> OutcomeCounts {
        self.counts
    }

    #[cfg(test)]
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn is_valid(&self) -> bool {
        self.counts.is_valid()
    }

    #[cfg(test)]
    pub fn last_summary(&self) -> Option<&str> {
        self.last_summary.as_deref()
    }

    #[cfg(test)]
    pub fn count_for(&self, check: CheckId, level: Level) -> usize {
        self.findings
            .iter()
            .filter(|finding| finding.check == check && finding.level == level)
            .count()
    }

    pub fn render_summary(&self) -> String {
        let total = self.counts.total();
        let mut out = String::from("\n");
        out.push_str(&report_line("Passing tests", self.counts.ok, total));
        out.push_str(&report_line("Warnings", self.counts.warn, total));
        out.push_str(&report_line("Failures", self.counts.fatal, total));
        out.push_str(&report_line("Test count", total, total));
        out.push('\n');
        if self.is_valid() {
            out.push_str("This is VALID.\n");
        } else {
            out.push_str("This is INVALID.\n");
        }
        out
    }

    pub fn summarize(&mut self) {
        let rendered = self.render_summary();
        if let Err(err) = self.summary_out.write_all(rendered.as_bytes()) {
            warn!(error = %err, "failed to write summary");
        }
        if let Err(err) = self.summary_out.flush() {
            warn!(error = %err, "failed to flush summary");
        }
        self.last_summary = Some(rendered);
    }

    pub fn build_report(&self, mode: &str, target: &str) -> RunReport {
        let mut per_check: BTreeMap<String, OutcomeCounts> = BTreeMap::new();
        for finding in &self.findings {
            per_check
                .entry(finding.check.as_str().to_string())
                .or_default()
                .record(finding.level);
        }

        RunReport {
            report_version: 1,
            generated_at: now_utc_string(),
            mode: mode.to_string(),
            target: target.to_string(),
            verdict: if self.is_valid() { "VALID" } else { "INVALID" }.to_string(),
            counts: self.counts,
            per_check,
            findings: self.findings.clone(),
        }
    }
}

fn report_line(label: &str, count: usize, total: usize) -> String {
    let pct = if total == 0 { 0 } else { count * 100 / total };
    format!("{label:<13}: {count:>4} ({pct:>3})%\n")
}
