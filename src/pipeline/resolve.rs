use glob::{MatchOptions, Pattern};
use std::path::{Path, PathBuf};

/// Where Gradle drops unit-test XML for the debug variant.
pub const DEFAULT_PATTERN: &str = "app/build/test-results/testDebugUnitTest/*.xml";

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

pub fn effective_patterns(patterns: &[String]) -> Vec<String> {
    if patterns.is_empty() {
        vec![DEFAULT_PATTERN.to_string()]
    } else {
        patterns.to_vec()
    }
}

/// Expands every pattern in order. Paths matched by several patterns appear
/// once per pattern; a pattern matching nothing contributes nothing.
pub fn resolve_patterns(root: &Path, patterns: &[String]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for pattern in patterns {
        let anchored = anchor(root, pattern);

        let paths = match glob::glob_with(&anchored, MATCH_OPTIONS) {
            Ok(paths) => paths,
            Err(e) => {
                log::warn!("ignoring invalid pattern '{}': {}", pattern, e);
                continue;
            }
        };

        let before = files.len();
        for entry in paths {
            match entry {
                Ok(path) => files.push(path),
                Err(e) => log::debug!("skipping unreadable path: {}", e),
            }
        }
        log::debug!("'{}' matched {} file(s)", pattern, files.len() - before);
    }

    files
}

fn anchor(root: &Path, pattern: &str) -> String {
    if Path::new(pattern).is_absolute() {
        return pattern.to_string();
    }

    let escaped_root = Pattern::escape(&root.to_string_lossy());
    Path::new(&escaped_root)
        .join(pattern)
        .to_string_lossy()
        .into_owned()
}
