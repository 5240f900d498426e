use clap::Parser;
use std::ffi::OsString;

#[derive(Parser)]
#[command(
    name = "triage-junit",
    version,
    about = "Summarize JUnit XML results into build/reports/triage/"
)]
pub struct Cli {
    #[arg(
        value_name = "GLOB",
        allow_hyphen_values = true,
        help = "Result file patterns (default: app/build/test-results/testDebugUnitTest/*.xml)"
    )]
    pub globs: Vec<OsString>,
}

impl Cli {
    /// Patterns as UTF-8; undecodable bytes become U+FFFD and simply match nothing.
    pub fn patterns(&self) -> Vec<String> {
        self.globs
            .iter()
            .map(|g| g.to_string_lossy().into_owned())
            .collect()
    }
}
