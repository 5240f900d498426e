pub mod failures;
pub mod summary;

use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

use crate::pipeline::Triage;

pub use failures::render_failures;
pub use summary::render_summary;

pub const SUMMARY_FILE: &str = "summary.md";
pub const FAILURES_FILE: &str = "failures.txt";

pub async fn write_reports(out_dir: &Path, triage: &Triage) -> Result<()> {
    summary::write_summary(out_dir, triage).await?;
    failures::write_failures(out_dir, triage).await?;
    Ok(())
}

/// Creates `dir` if needed, then replaces `dir/name` with `contents`.
pub(crate) async fn write_report(dir: &Path, name: &str, contents: &[u8]) -> Result<()> {
    fs::create_dir_all(dir)
        .await
        .with_context(|| format!("failed to create {}", dir.display()))?;

    let path = dir.join(name);
    let mut file = File::create(&path)
        .await
        .with_context(|| format!("failed to create {}", path.display()))?;
    file.write_all(contents)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    file.flush()
        .await
        .with_context(|| format!("failed to flush {}", path.display()))?;

    Ok(())
}
