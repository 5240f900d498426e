//! Triage JUnit-style XML test results.
//!
//! Result files are located by glob, parsed leniently, and folded into a
//! Markdown summary plus a plain list of failing tests. Triage is
//! informational: unreadable inputs are recorded, never fatal.

pub mod cli;
pub mod output;
pub mod pipeline;
