use quick_xml::Reader;
use quick_xml::escape::{resolve_predefined_entity, unescape_with};
use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesStart, Event};
use std::borrow::Cow;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use super::{FileResult, SuiteTotals, TestCaseRecord, TestStatus};

const TAG_REPORT: &str = "testsuites";
const TAG_TEST_SUITE: &str = "testsuite";
const TAG_TEST_CASE: &str = "testcase";
const TAG_FAILURE: &str = "failure";
const TAG_ERROR: &str = "error";
const TAG_SKIPPED: &str = "skipped";

#[derive(Debug, Error)]
enum XmlError {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("invalid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),
    #[error("{0}")]
    Syntax(#[from] quick_xml::Error),
    #[error("{0}")]
    Attribute(#[from] AttrError),
    #[error("no element found")]
    NoRoot,
    #[error("unclosed element <{0}>")]
    Unclosed(String),
    #[error("junk after document element")]
    TrailingContent,
}

/// Minimal owned view of an XML element: attributes in document order and
/// the character data preceding the first child.
#[derive(Debug, Default)]
struct Element {
    name: String,
    attrs: Vec<(String, String)>,
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }
}

/// Reads and parses one result file. Never fails: unreadable or malformed
/// documents come back as [`FileResult::Failed`].
pub async fn parse_file(path: &Path) -> FileResult {
    match tokio::fs::read(path).await {
        Ok(bytes) => parse_document(path, &bytes),
        Err(e) => failed(path, XmlError::Io(e)),
    }
}

pub fn parse_document(path: &Path, bytes: &[u8]) -> FileResult {
    let root = match build_tree(bytes) {
        Ok(root) => root,
        Err(e) => return failed(path, e),
    };

    let suites: Vec<&Element> = match root.name.as_str() {
        TAG_TEST_SUITE => vec![&root],
        TAG_REPORT => root.children.iter().collect(),
        other => {
            log::debug!("{}: unrecognised root <{}>", path.display(), other);
            Vec::new()
        }
    };

    let mut totals = SuiteTotals::default();
    let mut cases = Vec::new();

    for suite in suites {
        totals.add(&suite_totals(suite));
        cases.extend(
            suite
                .children
                .iter()
                .filter(|c| c.name == TAG_TEST_CASE)
                .map(|c| test_case(path, c)),
        );
    }

    FileResult::Parsed {
        path: path.to_path_buf(),
        totals,
        cases,
    }
}

fn failed(path: &Path, error: XmlError) -> FileResult {
    FileResult::Failed {
        path: path.to_path_buf(),
        error: format!("Failed to parse XML: {error}"),
    }
}

fn suite_totals(suite: &Element) -> SuiteTotals {
    SuiteTotals {
        tests: count_attr(suite, "tests"),
        failures: count_attr(suite, "failures"),
        errors: count_attr(suite, "errors"),
        skipped: count_attr(suite, "skipped"),
    }
}

/// Only plain decimal digits count; anything else is worth zero.
fn count_attr(suite: &Element, key: &str) -> u64 {
    match suite.attr(key) {
        Some(v) if !v.is_empty() && v.bytes().all(|b| b.is_ascii_digit()) => {
            v.parse().unwrap_or(0)
        }
        _ => 0,
    }
}

fn test_case(path: &Path, case: &Element) -> TestCaseRecord {
    let classname = case.attr("classname").unwrap_or_default().to_string();
    let name = case.attr("name").unwrap_or_default().to_string();
    let time = parse_time(path, case.attr("time"), &classname, &name);

    let mut status = TestStatus::Passed;
    let mut message = None;
    let mut details = None;

    if let Some(skipped) = case.child(TAG_SKIPPED) {
        status = TestStatus::Skipped;
        message = skipped.attr("message").map(str::to_string);
    }

    // Checked after skipped and wins over it.
    if let Some(outcome) = case.child(TAG_FAILURE).or_else(|| case.child(TAG_ERROR)) {
        status = if outcome.name == TAG_FAILURE {
            TestStatus::Failed
        } else {
            TestStatus::Error
        };
        message = outcome.attr("message").map(str::to_string);
        details = Some(outcome.text.trim().to_string());
    }

    TestCaseRecord {
        classname,
        name,
        time,
        status,
        message,
        details,
    }
}

fn parse_time(path: &Path, raw: Option<&str>, classname: &str, name: &str) -> f64 {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return 0.0;
    };

    match raw.parse::<f64>() {
        Ok(t) if t.is_finite() && t >= 0.0 => t,
        _ => {
            log::warn!(
                "{}: {}#{} has invalid time '{}', using 0",
                path.display(),
                classname,
                name,
                raw
            );
            0.0
        }
    }
}

fn build_tree(bytes: &[u8]) -> Result<Element, XmlError> {
    let text = std::str::from_utf8(bytes)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut reader = Reader::from_str(text);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    let mut entities = HashMap::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if stack.is_empty() && root.is_some() {
                    return Err(XmlError::TrailingContent);
                }
                stack.push(open_element(&e, &entities)?);
            }
            Event::Empty(e) => {
                let element = open_element(&e, &entities)?;
                close_element(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                if let Some(element) = stack.pop() {
                    close_element(&mut stack, &mut root, element)?;
                }
            }
            Event::Text(e) => {
                let raw = std::str::from_utf8(&e)?;
                let content = unescape_lossy(raw, &entities);
                push_text(&mut stack, root.is_some(), &content)?;
            }
            Event::CData(e) => {
                let content = std::str::from_utf8(&e)?;
                push_text(&mut stack, root.is_some(), content)?;
            }
            Event::DocType(e) => {
                entities = declared_entities(std::str::from_utf8(&e)?);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(XmlError::Unclosed(open.name.clone()));
    }

    root.ok_or(XmlError::NoRoot)
}

fn open_element(
    e: &BytesStart,
    entities: &HashMap<String, String>,
) -> Result<Element, XmlError> {
    let name = std::str::from_utf8(e.name().as_ref())?.to_string();

    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = std::str::from_utf8(attr.key.as_ref())?.to_string();
        let raw = std::str::from_utf8(&attr.value)?;
        let value = unescape_lossy(raw, entities).into_owned();
        attrs.push((key, value));
    }

    Ok(Element {
        name,
        attrs,
        ..Default::default()
    })
}

fn close_element(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(XmlError::TrailingContent),
    }
    Ok(())
}

fn push_text(stack: &mut [Element], has_root: bool, content: &str) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(current) => {
            if current.children.is_empty() {
                current.text.push_str(content);
            }
        }
        None if content.trim().is_empty() => {}
        None if has_root => return Err(XmlError::TrailingContent),
        None => return Err(XmlError::NoRoot),
    }
    Ok(())
}

/// Expands character references, the five predefined entities and any
/// general entity declared in the internal DOCTYPE subset. When something
/// else is referenced the chunk is kept as written.
fn unescape_lossy<'a>(raw: &'a str, entities: &HashMap<String, String>) -> Cow<'a, str> {
    let resolved = unescape_with(raw, |name| {
        resolve_predefined_entity(name).or_else(|| entities.get(name).map(String::as_str))
    });

    match resolved {
        Ok(text) => text,
        Err(e) => {
            log::debug!("keeping entity references unexpanded: {}", e);
            Cow::Borrowed(raw)
        }
    }
}

/// Collects `<!ENTITY name "value">` declarations. Parameter and external
/// entities are skipped.
fn declared_entities(doctype: &str) -> HashMap<String, String> {
    let mut entities = HashMap::new();
    let mut rest = doctype;

    while let Some(start) = rest.find("<!ENTITY") {
        rest = rest[start + "<!ENTITY".len()..].trim_start();
        if rest.starts_with('%') {
            continue;
        }

        let name_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let name = &rest[..name_end];
        rest = rest[name_end..].trim_start();

        let Some(quote) = rest.chars().next().filter(|c| *c == '"' || *c == '\'') else {
            continue;
        };
        let Some(value_end) = rest[1..].find(quote) else {
            break;
        };

        entities.insert(name.to_string(), rest[1..1 + value_end].to_string());
        rest = &rest[1 + value_end + 1..];
    }

    entities
}
