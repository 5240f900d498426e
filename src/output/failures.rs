use anyhow::Result;
use std::fmt::Write;
use std::path::Path;

use crate::pipeline::Triage;

pub async fn write_failures(out_dir: &Path, triage: &Triage) -> Result<()> {
    let failures = render_failures(triage)?;
    super::write_report(out_dir, super::FAILURES_FILE, failures.as_bytes()).await
}

/// One `ClassName#methodName` per line; empty when nothing failed.
pub fn render_failures(triage: &Triage) -> Result<String> {
    let mut buffer = String::new();

    for case in triage.failing() {
        writeln!(buffer, "{}", case.ident())?;
    }

    Ok(buffer)
}
