//! A small renderer for the URL patterns found in model definitions.
//!
//! Patterns use `{name}` placeholders with an optional conversion and format spec,
//! `{name!conversion:spec}`:
//!
//! * conversions: `!s` string form, `!r` representation, `!a` ASCII-only representation,
//!   `!U` uppercase, `!L` lowercase
//! * integer specs: `[[fill]align][0][width][d]`, e.g. `03d` or `>02d`
//! * text specs: `[[fill]align][width][s]`
//! * timestamp specs: strftime, e.g. `%Y%m%d`
//!
//! `{{` and `}}` produce literal braces. Anything else is an error; the renderer never
//! passes a value through unconverted.

use crate::template::error::TemplateError;
use crate::template::value::{TemplateValue, TemplateValues};
use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDateTime;
use std::borrow::Cow;
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conversion {
    Str,
    Repr,
    Ascii,
    Upper,
    Lower,
}

impl Conversion {
    fn parse(field: &str, text: &str) -> Result<Self, TemplateError> {
        match text {
            "s" => Ok(Conversion::Str),
            "r" => Ok(Conversion::Repr),
            "a" => Ok(Conversion::Ascii),
            "U" => Ok(Conversion::Upper),
            "L" => Ok(Conversion::Lower),
            _ => Err(TemplateError::UnsupportedConversion {
                field: field.to_string(),
                conversion: text.to_string(),
            }),
        }
    }

    fn apply(self, value: &TemplateValue) -> String {
        match self {
            Conversion::Str => value.to_string(),
            Conversion::Repr => value.repr(),
            Conversion::Ascii => value.ascii(),
            Conversion::Upper => value.to_string().to_uppercase(),
            Conversion::Lower => value.to_string().to_lowercase(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
    Center,
    AfterSign,
}

impl Align {
    fn from_char(c: char) -> Option<Self> {
        match c {
            '<' => Some(Align::Left),
            '>' => Some(Align::Right),
            '^' => Some(Align::Center),
            '=' => Some(Align::AfterSign),
            _ => None,
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct FormatSpec {
    fill: Option<char>,
    align: Option<Align>,
    zero: bool,
    width: usize,
    kind: Option<char>,
}

impl FormatSpec {
    fn parse(spec: &str) -> Option<Self> {
        let chars: Vec<char> = spec.chars().collect();
        let mut parsed = FormatSpec::default();
        let mut i = 0;

        if let Some(align) = chars.get(1).and_then(|&c| Align::from_char(c)) {
            parsed.fill = Some(chars[0]);
            parsed.align = Some(align);
            i = 2;
        } else if let Some(align) = chars.first().and_then(|&c| Align::from_char(c)) {
            parsed.align = Some(align);
            i = 1;
        }

        if chars.get(i) == Some(&'0') {
            parsed.zero = true;
            i += 1;
        }

        let digits_start = i;
        while chars.get(i).is_some_and(char::is_ascii_digit) {
            i += 1;
        }
        if i > digits_start {
            let digits: String = chars[digits_start..i].iter().collect();
            parsed.width = digits.parse().ok()?;
        }

        if let Some(&kind) = chars.get(i) {
            parsed.kind = Some(kind);
            i += 1;
        }

        (i == chars.len()).then_some(parsed)
    }

    fn fill_char(&self) -> char {
        self.fill
            .unwrap_or(if self.zero { '0' } else { ' ' })
    }
}

fn pad(text: &str, width: usize, fill: char, align: Align) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.to_string();
    }
    let padding = width - len;
    let repeat = |n: usize| std::iter::repeat(fill).take(n).collect::<String>();

    match align {
        Align::Left => format!("{}{}", text, repeat(padding)),
        Align::Right => format!("{}{}", repeat(padding), text),
        Align::Center => {
            let left = padding / 2;
            format!("{}{}{}", repeat(left), text, repeat(padding - left))
        }
        Align::AfterSign => match text.strip_prefix('-') {
            Some(digits) => format!("-{}{}", repeat(padding), digits),
            None => format!("{}{}", repeat(padding), text),
        },
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Field {
        name: String,
        conversion: Option<Conversion>,
        spec: String,
    },
}

/// A parsed URL pattern, ready to be rendered any number of times.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use opendata_downloader::{TemplateValues, UrlTemplate};
///
/// let template = UrlTemplate::parse("{model!L}_{timestamp:%Y%m%d}{modelrun:>02d}_{step:>03d}_{param!U}").unwrap();
/// let run = NaiveDate::from_ymd_opt(2020, 6, 26).unwrap().and_hms_opt(9, 0, 0).unwrap();
/// let values = TemplateValues::new()
///     .with("model", "ICON")
///     .with("timestamp", run)
///     .with("modelrun", 9u32)
///     .with("step", 3u32)
///     .with("param", "t_2m");
///
/// assert_eq!(template.render(&values).unwrap(), "icon_2020062609_003_T_2M");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct UrlTemplate {
    segments: Vec<Segment>,
}

impl UrlTemplate {
    /// Parses a pattern, rejecting unbalanced braces and unknown conversions.
    pub fn parse(pattern: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = pattern.char_indices().peekable();

        while let Some((position, c)) = chars.next() {
            match c {
                '{' if chars.peek().map(|&(_, next)| next) == Some('{') => {
                    chars.next();
                    literal.push('{');
                }
                '{' => {
                    let mut body = String::new();
                    let mut closed = false;
                    for (inner_position, inner) in chars.by_ref() {
                        match inner {
                            '}' => {
                                closed = true;
                                break;
                            }
                            '{' => {
                                return Err(TemplateError::MalformedPattern {
                                    position: inner_position,
                                    reason: "nested '{' in field",
                                })
                            }
                            _ => body.push(inner),
                        }
                    }
                    if !closed {
                        return Err(TemplateError::MalformedPattern {
                            position,
                            reason: "unclosed '{'",
                        });
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Self::parse_field(&body, position)?);
                }
                '}' if chars.peek().map(|&(_, next)| next) == Some('}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => {
                    return Err(TemplateError::MalformedPattern {
                        position,
                        reason: "single '}' outside a field",
                    })
                }
                _ => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self { segments })
    }

    fn parse_field(body: &str, position: usize) -> Result<Segment, TemplateError> {
        let name_end = body.find(['!', ':']).unwrap_or(body.len());
        let name = &body[..name_end];
        if name.is_empty() {
            return Err(TemplateError::MalformedPattern {
                position,
                reason: "field without a name",
            });
        }

        let rest = &body[name_end..];
        let (conversion, spec) = match rest.strip_prefix('!') {
            Some(after_bang) => {
                let (conversion, spec) = after_bang.split_once(':').unwrap_or((after_bang, ""));
                (Some(Conversion::parse(name, conversion)?), spec)
            }
            None => (None, rest.strip_prefix(':').unwrap_or("")),
        };

        Ok(Segment::Field {
            name: name.to_string(),
            conversion,
            spec: spec.to_string(),
        })
    }

    /// Names of all fields referenced by the pattern, in order of appearance.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Field { name, .. } => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    pub fn render(&self, values: &TemplateValues) -> Result<String, TemplateError> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field {
                    name,
                    conversion,
                    spec,
                } => {
                    let value = values
                        .get(name)
                        .ok_or_else(|| TemplateError::UnknownField(name.clone()))?;
                    out.push_str(&render_field(name, *conversion, spec, value)?);
                }
            }
        }
        Ok(out)
    }
}

/// Parses and renders `pattern` in one go.
pub fn render(pattern: &str, values: &TemplateValues) -> Result<String, TemplateError> {
    UrlTemplate::parse(pattern)?.render(values)
}

fn render_field(
    name: &str,
    conversion: Option<Conversion>,
    spec: &str,
    value: &TemplateValue,
) -> Result<String, TemplateError> {
    let value = match conversion {
        Some(conversion) => Cow::Owned(TemplateValue::Text(conversion.apply(value))),
        None => Cow::Borrowed(value),
    };
    let unsupported = || TemplateError::UnsupportedFormat {
        field: name.to_string(),
        spec: spec.to_string(),
    };

    match value.as_ref() {
        TemplateValue::Timestamp(ts) => format_timestamp(ts, spec).ok_or_else(unsupported),
        TemplateValue::Text(text) => {
            let parsed = FormatSpec::parse(spec).ok_or_else(unsupported)?;
            if !matches!(parsed.kind, None | Some('s')) || parsed.align == Some(Align::AfterSign) {
                return Err(unsupported());
            }
            let align = parsed.align.unwrap_or(Align::Left);
            Ok(pad(text, parsed.width, parsed.fill_char(), align))
        }
        TemplateValue::Integer(n) => {
            let parsed = FormatSpec::parse(spec).ok_or_else(unsupported)?;
            if !matches!(parsed.kind, None | Some('d')) {
                return Err(unsupported());
            }
            let align = match parsed.align {
                Some(align) => align,
                None if parsed.zero => Align::AfterSign,
                None => Align::Right,
            };
            Ok(pad(&n.to_string(), parsed.width, parsed.fill_char(), align))
        }
    }
}

fn format_timestamp(ts: &NaiveDateTime, spec: &str) -> Option<String> {
    if spec.is_empty() {
        return Some(TemplateValue::Timestamp(*ts).to_string());
    }
    let items: Vec<Item> = StrftimeItems::new(spec).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return None;
    }
    let mut out = String::new();
    write!(out, "{}", ts.format_with_items(items.iter())).ok()?;
    Some(out)
}
