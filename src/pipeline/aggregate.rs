use std::path::PathBuf;

use super::{FileResult, SuiteTotals, TestCaseRecord};

/// Everything the reports are rendered from.
#[derive(Debug, Default)]
pub struct Triage {
    pub totals: SuiteTotals,
    /// All cases, file by file and suite by suite, in document order.
    pub cases: Vec<TestCaseRecord>,
    /// Files that could not be parsed, with the reason.
    pub errors: Vec<(PathBuf, String)>,
}

impl Triage {
    pub fn failing(&self) -> impl Iterator<Item = &TestCaseRecord> {
        self.cases.iter().filter(|c| c.status.is_failing())
    }
}

pub fn aggregate(results: impl IntoIterator<Item = FileResult>) -> Triage {
    let mut triage = Triage::default();

    for result in results {
        match result {
            FileResult::Parsed { totals, cases, .. } => {
                triage.totals.add(&totals);
                triage.cases.extend(cases);
            }
            FileResult::Failed { path, error } => triage.errors.push((path, error)),
        }
    }

    triage
}
