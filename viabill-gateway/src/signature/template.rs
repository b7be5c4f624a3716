//! Signature template parsing.
//!
//! A template is a string of `{name}` placeholders and literal text, usually
//! `#`-separated: `{id}#{apikey}#{secret}`. A placeholder name is any
//! non-empty run of characters other than `{`, `}` and `#`; braces that do
//! not enclose such a name are literal text.

use crate::error::{GatewayError, Result};

/// One piece of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Text copied into the rendered string as is.
    Literal(String),
    /// Name to resolve from call data or the request context.
    Placeholder(String),
}

/// Parsed signature template.
///
/// # Examples
///
/// ```
/// use viabill_gateway::signature::SignatureTemplate;
///
/// let template = SignatureTemplate::parse("{id}#{apikey}#{secret}").unwrap();
/// let names: Vec<_> = template.placeholders().collect();
/// assert_eq!(names, ["id", "apikey", "secret"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureTemplate {
    segments: Vec<Segment>,
}

impl SignatureTemplate {
    /// Parses a template string.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::EmptyFormat`] if the template contains no
    /// placeholder.
    pub fn parse(template: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            literal.push_str(&rest[..open]);
            let after = &rest[open + 1..];

            match after.find(['{', '}', '#']) {
                Some(close) if close > 0 && after[close..].starts_with('}') => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(after[..close].to_owned()));
                    rest = &after[close + 1..];
                }
                _ => {
                    literal.push('{');
                    rest = after;
                }
            }
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        let template = Self { segments };
        if template.placeholders().next().is_none() {
            return Err(GatewayError::EmptyFormat(template_source(template.segments())));
        }
        Ok(template)
    }

    /// Segments in order of appearance.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Placeholder names in order of appearance, repeats included.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Placeholder(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }
}

fn template_source(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|segment| match segment {
            Segment::Literal(text) => text.clone(),
            Segment::Placeholder(name) => format!("{{{name}}}"),
        })
        .collect()
}
