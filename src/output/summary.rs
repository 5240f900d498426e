use anyhow::Result;
use std::fmt::Write;
use std::path::Path;

use crate::pipeline::Triage;

pub async fn write_summary(out_dir: &Path, triage: &Triage) -> Result<()> {
    let summary = render_summary(triage)?;
    super::write_report(out_dir, super::SUMMARY_FILE, summary.as_bytes()).await
}

pub fn render_summary(triage: &Triage) -> Result<String> {
    let mut buffer = String::with_capacity(4 * 1024);
    let totals = &triage.totals;

    writeln!(buffer, "# Test Failure Triage Summary")?;
    writeln!(buffer)?;
    writeln!(
        buffer,
        "Total: {} • Failed: {} • Errors: {} • Skipped: {}",
        totals.tests, totals.failures, totals.errors, totals.skipped
    )?;
    writeln!(buffer)?;

    let mut failing = triage.failing().peekable();
    if failing.peek().is_none() {
        writeln!(buffer, "No failing tests detected.")?;
        return Ok(buffer);
    }

    writeln!(buffer, "## Failing tests")?;
    writeln!(buffer)?;

    for case in failing {
        writeln!(buffer, "- {} — {}", case.ident(), case.status)?;
        if let Some(message) = case.message.as_deref().filter(|m| !m.is_empty()) {
            writeln!(buffer, "  - Message: {}", message)?;
        }
    }

    Ok(buffer)
}
