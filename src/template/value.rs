use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::fmt::{self, Write as _};

/// A value substituted into a URL pattern.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateValue {
    Text(String),
    Integer(i64),
    Timestamp(NaiveDateTime),
}

impl TemplateValue {
    /// The `!r` conversion: quoted text, plain integers, ISO 8601 timestamps.
    pub(crate) fn repr(&self) -> String {
        match self {
            TemplateValue::Text(text) => format!("{:?}", text),
            TemplateValue::Integer(n) => n.to_string(),
            TemplateValue::Timestamp(ts) => ts.format("%Y-%m-%dT%H:%M:%S").to_string(),
        }
    }

    /// The `!a` conversion: [`repr`](Self::repr) with non-ASCII characters escaped as
    /// `\xhh`, `\uhhhh` or `\Uhhhhhhhh`.
    pub(crate) fn ascii(&self) -> String {
        let mut out = String::new();
        for c in self.repr().chars() {
            let _ = match u32::from(c) {
                0..=0x7f => {
                    out.push(c);
                    Ok(())
                }
                n @ 0x80..=0xff => write!(out, "\\x{:02x}", n),
                n @ 0x100..=0xffff => write!(out, "\\u{:04x}", n),
                n => write!(out, "\\U{:08x}", n),
            };
        }
        out
    }
}

impl fmt::Display for TemplateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateValue::Text(text) => write!(f, "{}", text),
            TemplateValue::Integer(n) => write!(f, "{}", n),
            TemplateValue::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<&str> for TemplateValue {
    fn from(value: &str) -> Self {
        TemplateValue::Text(value.to_string())
    }
}

impl From<String> for TemplateValue {
    fn from(value: String) -> Self {
        TemplateValue::Text(value)
    }
}

impl From<i64> for TemplateValue {
    fn from(value: i64) -> Self {
        TemplateValue::Integer(value)
    }
}

impl From<u32> for TemplateValue {
    fn from(value: u32) -> Self {
        TemplateValue::Integer(i64::from(value))
    }
}

impl From<NaiveDateTime> for TemplateValue {
    fn from(value: NaiveDateTime) -> Self {
        TemplateValue::Timestamp(value)
    }
}

/// Named values available to a pattern.
///
/// # Examples
///
/// ```
/// use opendata_downloader::{render, TemplateValues};
///
/// let values = TemplateValues::new().with("model", "ICON").with("param", "t_2m");
/// assert_eq!(render("{model!L}_{param!U}", &values).unwrap(), "icon_T_2M");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateValues {
    values: HashMap<String, TemplateValue>,
}

impl TemplateValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<TemplateValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<TemplateValue>) {
        self.values.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&TemplateValue> {
        self.values.get(name)
    }
}
