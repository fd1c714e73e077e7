//! JUnit report document
//!
//! Serde types for the Ginkgo flavour of JUnit XML. Attributes use the `@name`
//! field convention of `quick-xml`; element text uses `$text`. Elements not
//! modelled here are skipped when decoding.

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};

pub const STATUS_PASSED: &str = "passed";
pub const STATUS_FAILED: &str = "failed";

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
const ROOT_ELEMENT: &str = "testsuites";

/// Root `<testsuites>` element
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename = "testsuites")]
pub struct TestSuites {
    #[serde(rename = "@tests", default)]
    pub tests: u32,
    #[serde(rename = "@disabled", default)]
    pub disabled: u32,
    #[serde(rename = "@errors", default)]
    pub errors: u32,
    #[serde(rename = "@failures", default)]
    pub failures: u32,
    #[serde(rename = "@time", default)]
    pub time: f64,
    #[serde(rename = "testsuite", default)]
    pub test_suites: Vec<TestSuite>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestSuite {
    #[serde(rename = "@name", default)]
    pub name: String,
    #[serde(rename = "@package", default)]
    pub package: String,
    #[serde(rename = "@tests", default)]
    pub tests: u32,
    #[serde(rename = "@disabled", default)]
    pub disabled: u32,
    #[serde(rename = "@skipped", default)]
    pub skipped: u32,
    #[serde(rename = "@errors", default)]
    pub errors: u32,
    #[serde(rename = "@failures", default)]
    pub failures: u32,
    #[serde(rename = "@time", default)]
    pub time: f64,
    #[serde(rename = "@timestamp", default, skip_serializing_if = "String::is_empty")]
    pub timestamp: String,
    #[serde(default)]
    pub properties: Properties,
    #[serde(rename = "testcase", default)]
    pub test_cases: Vec<TestCase>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Properties {
    #[serde(rename = "property", default)]
    pub properties: Vec<Property>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@value")]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    #[serde(rename = "@name", default)]
    pub name: String,
    #[serde(rename = "@classname", default, skip_serializing_if = "String::is_empty")]
    pub classname: String,
    #[serde(rename = "@status", default)]
    pub status: String,
    #[serde(rename = "@time", default)]
    pub time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skipped: Option<Skipped>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Failure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<Failure>,
    #[serde(rename = "system-out", default, skip_serializing_if = "Option::is_none")]
    pub system_out: Option<String>,
    #[serde(rename = "system-err", default, skip_serializing_if = "Option::is_none")]
    pub system_err: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Skipped {
    #[serde(rename = "@message", default)]
    pub message: String,
}

/// Body of a `<failure>` or `<error>` element
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Failure {
    #[serde(rename = "@message", default)]
    pub message: String,
    #[serde(rename = "@type", default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(rename = "$text", default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl TestSuites {
    /// Decode a `<testsuites>` document
    ///
    /// Any other root element is rejected, including a bare `<testsuite>`.
    pub fn from_xml(bytes: &[u8]) -> Result<Self> {
        let root = root_element(bytes)?;
        if root != ROOT_ELEMENT {
            return Err(ReportError::Malformed(format!(
                "junit report: expected <{}> root, found <{}>",
                ROOT_ELEMENT, root
            )));
        }
        quick_xml::de::from_reader(bytes).map_err(|e| ReportError::malformed("junit report", e))
    }

    /// Encode as an indented document with an XML declaration
    ///
    /// Characters XML 1.0 cannot carry, such as the escape codes of coloured
    /// build logs, are written as U+FFFD.
    pub fn to_xml(&self) -> Result<String> {
        let mut body = String::new();
        let mut serializer = quick_xml::se::Serializer::new(&mut body);
        serializer.indent(' ', 2);
        self.serialize(serializer)
            .map_err(|e| ReportError::malformed("encode junit report", e))?;

        Ok(format!("{}\n{}\n", XML_DECLARATION, sanitize_text(&body)))
    }
}

impl TestSuite {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn add_property(&mut self, name: &str, value: &str) {
        self.properties.properties.push(Property {
            name: name.to_string(),
            value: value.to_string(),
        });
    }
}

impl TestCase {
    pub fn passed(name: &str) -> Self {
        Self {
            name: name.to_string(),
            status: STATUS_PASSED.to_string(),
            ..Default::default()
        }
    }

    pub fn failed(name: &str, message: &str, system_err: &str) -> Self {
        Self {
            name: name.to_string(),
            status: STATUS_FAILED.to_string(),
            failure: Some(Failure {
                message: message.to_string(),
                ..Default::default()
            }),
            system_err: Some(system_err.to_string()),
            ..Default::default()
        }
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }
}

/// Name of the first element in the document
fn root_element(bytes: &[u8]) -> Result<String> {
    let mut reader = Reader::from_reader(bytes);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return Ok(String::from_utf8_lossy(e.name().as_ref()).into_owned());
            }
            Ok(Event::Eof) => {
                return Err(ReportError::Malformed(
                    "junit report: document has no root element".to_string(),
                ));
            }
            Ok(_) => {}
            Err(e) => return Err(ReportError::malformed("junit report", e)),
        }
        buf.clear();
    }
}

/// Replace characters outside the XML 1.0 `Char` production
fn sanitize_text(text: &str) -> String {
    text.chars()
        .map(|c| if is_xml_char(c) { c } else { char::REPLACEMENT_CHARACTER })
        .collect()
}

fn is_xml_char(c: char) -> bool {
    matches!(c,
        '\t' | '\n' | '\r'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}
