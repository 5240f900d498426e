mod aggregate;
mod parse;
mod resolve;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::output;

pub use aggregate::{Triage, aggregate};
pub use parse::{parse_document, parse_file};
pub use resolve::{DEFAULT_PATTERN, effective_patterns, resolve_patterns};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestStatus {
    Passed,
    Skipped,
    Failed,
    Error,
}

impl TestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestStatus::Passed => "passed",
            TestStatus::Skipped => "skipped",
            TestStatus::Failed => "failed",
            TestStatus::Error => "error",
        }
    }

    pub fn is_failing(&self) -> bool {
        matches!(self, TestStatus::Failed | TestStatus::Error)
    }
}

impl std::fmt::Display for TestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `<testcase>` as reported. Duplicates across files are kept.
#[derive(Debug, Clone, PartialEq)]
pub struct TestCaseRecord {
    pub classname: String,
    pub name: String,
    pub time: f64,
    pub status: TestStatus,
    pub message: Option<String>,
    pub details: Option<String>,
}

impl TestCaseRecord {
    /// `ClassName#methodName`
    pub fn ident(&self) -> String {
        format!("{}#{}", self.classname, self.name)
    }
}

/// Suite-level counts, trusted as written in the XML.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SuiteTotals {
    pub tests: u64,
    pub failures: u64,
    pub errors: u64,
    pub skipped: u64,
}

impl SuiteTotals {
    pub fn add(&mut self, other: &SuiteTotals) {
        self.tests = self.tests.saturating_add(other.tests);
        self.failures = self.failures.saturating_add(other.failures);
        self.errors = self.errors.saturating_add(other.errors);
        self.skipped = self.skipped.saturating_add(other.skipped);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FileResult {
    Parsed {
        path: PathBuf,
        totals: SuiteTotals,
        cases: Vec<TestCaseRecord>,
    },
    Failed {
        path: PathBuf,
        error: String,
    },
}

pub fn output_dir(root: &Path) -> PathBuf {
    root.join("build").join("reports").join("triage")
}

/// Resolve, parse, aggregate and render. Only a failure to write the
/// reports is returned as an error.
pub async fn triage(root: &Path, patterns: &[String]) -> Result<Triage> {
    let patterns = effective_patterns(patterns);
    let files = {
        let root = root.to_path_buf();
        tokio::task::spawn_blocking(move || resolve_patterns(&root, &patterns))
            .await
            .context("pattern expansion task failed")?
    };
    log::debug!("resolved {} result file(s)", files.len());

    let mut results = Vec::with_capacity(files.len());
    for path in &files {
        results.push(parse_file(path).await);
    }

    let triage = aggregate(results);
    for (path, error) in &triage.errors {
        log::warn!("{}: {}", path.display(), error);
    }

    output::write_reports(&output_dir(root), &triage).await?;

    log::info!(
        "{} case(s), {} failing, {} unreadable file(s)",
        triage.cases.len(),
        triage.failing().count(),
        triage.errors.len()
    );

    Ok(triage)
}
