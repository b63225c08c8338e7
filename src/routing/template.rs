//! Route template parsing and path matching.
//!
//! # Responsibilities
//! - Parse template text (`users/{id:int}`) into typed segments
//! - Reject malformed templates with a precise error
//! - Match a request path against a parsed template, extracting route values
//!
//! # Syntax
//! ```text
//! template   = ["/" | "~/"] segment *("/" segment) ["/"]
//! segment    = 1*part
//! part       = literal | "{" ["*" | "**"] name *(":" constraint) ["?"] ["=" default] "}"
//! ```
//! Literal braces are written `{{` and `}}`.
//!
//! # Design Decisions
//! - A segment's precedence attributes come from its first part only
//! - Literal comparison during matching is ASCII case-insensitive
//! - Catch-all parameters are only valid as the last part of the last segment
//! - Optional parameters are only valid in the last segment

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::routing::constraint::InlineConstraint;

/// Values extracted from a request path, keyed by parameter name.
pub type RouteValues = BTreeMap<String, String>;

/// Errors produced while parsing a route template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template '{0}' contains an empty segment")]
    EmptySegment(String),

    #[error("template '{0}' has an unbalanced '{{' or '}}'")]
    UnbalancedBrace(String),

    #[error("parameter in template '{0}' has no name")]
    EmptyParameterName(String),

    #[error("parameter name '{0}' contains a reserved character")]
    InvalidParameterName(String),

    #[error("parameter '{0}' appears more than once")]
    DuplicateParameter(String),

    #[error("segment '{0}' contains two consecutive parameters")]
    ConsecutiveParameters(String),

    #[error("catch-all parameter '{0}' must be the last part of the template")]
    CatchAllNotLast(String),

    #[error("optional parameter '{0}' must be in the last segment")]
    OptionalNotLast(String),

    #[error("parameter '{0}' cannot be both optional and catch-all")]
    OptionalCatchAll(String),

    #[error("optional parameter '{0}' cannot have a default value")]
    OptionalWithDefault(String),

    #[error("unknown inline constraint '{0}'")]
    UnknownConstraint(String),

    #[error("invalid argument in constraint '{0}'")]
    InvalidConstraintArgument(String),

    #[error("invalid regex '{pattern}': {reason}")]
    InvalidRegex { pattern: String, reason: String },
}

/// A route parameter, e.g. `{id:int}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub constraints: Vec<InlineConstraint>,
    pub optional: bool,
    pub catch_all: bool,
    pub default: Option<String>,
}

impl Parameter {
    /// Parse the text between the braces of a parameter.
    fn parse(body: &str) -> Result<Self, TemplateError> {
        let (catch_all, body) = if let Some(rest) = body.strip_prefix("**") {
            (true, rest)
        } else if let Some(rest) = body.strip_prefix('*') {
            (true, rest)
        } else {
            (false, body)
        };

        let mut pieces = split_top_level(body, ':');
        let mut default = None;
        let mut optional = false;

        if let Some(last) = pieces.last_mut() {
            let mut piece = *last;
            if let Some(eq) = find_top_level(piece, '=') {
                default = Some(piece[eq + 1..].to_string());
                piece = &piece[..eq];
            }
            if let Some(stripped) = piece.strip_suffix('?') {
                optional = true;
                piece = stripped;
            }
            *last = piece;
        }

        let name = pieces.first().copied().unwrap_or_default();
        if name.is_empty() {
            return Err(TemplateError::EmptyParameterName(body.to_string()));
        }
        if name.contains(['{', '}', '/', '*', '?', '=', '(', ')']) {
            return Err(TemplateError::InvalidParameterName(name.to_string()));
        }
        if optional && catch_all {
            return Err(TemplateError::OptionalCatchAll(name.to_string()));
        }
        if optional && default.is_some() {
            return Err(TemplateError::OptionalWithDefault(name.to_string()));
        }

        let constraints = pieces[1..]
            .iter()
            .map(|text| InlineConstraint::parse(text))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: name.to_string(),
            constraints,
            optional,
            catch_all,
            default,
        })
    }

    /// Returns true if `value` satisfies every inline constraint.
    pub fn accepts(&self, value: &str) -> bool {
        self.constraints.iter().all(|c| c.accepts(value))
    }
}

/// One piece of a segment: literal text or a parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentPart {
    Literal(String),
    Parameter(Parameter),
}

/// One slash-delimited unit of a route template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    parts: Vec<SegmentPart>,
}

impl Segment {
    pub fn parts(&self) -> &[SegmentPart] {
        &self.parts
    }

    fn head(&self) -> Option<&SegmentPart> {
        self.parts.first()
    }

    pub fn is_parameter(&self) -> bool {
        matches!(self.head(), Some(SegmentPart::Parameter(_)))
    }

    /// Literal text of the first part, or `""` when it is a parameter.
    pub fn literal_text(&self) -> &str {
        match self.head() {
            Some(SegmentPart::Literal(text)) => text,
            _ => "",
        }
    }

    /// Number of inline constraints on the first part, or 0 when it is a literal.
    pub fn constraint_count(&self) -> usize {
        match self.head() {
            Some(SegmentPart::Parameter(p)) => p.constraints.len(),
            _ => 0,
        }
    }

    fn ends_with_catch_all(&self) -> bool {
        matches!(self.parts.last(), Some(SegmentPart::Parameter(p)) if p.catch_all)
    }

    /// The parameter that may stand in for a missing trailing path segment.
    fn omittable(&self) -> Option<&Parameter> {
        match self.parts.as_slice() {
            [SegmentPart::Parameter(p)] if p.optional || p.default.is_some() || p.catch_all => Some(p),
            _ => None,
        }
    }

    fn parse(segment: &str, template: &str) -> Result<Self, TemplateError> {
        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut rest = segment;

        loop {
            let Some(pos) = rest.find(|c: char| c == '{' || c == '}') else {
                literal.push_str(rest);
                break;
            };
            literal.push_str(&rest[..pos]);
            let tail = &rest[pos..];

            if let Some(after) = tail.strip_prefix("{{") {
                literal.push('{');
                rest = after;
                continue;
            }
            if let Some(after) = tail.strip_prefix("}}") {
                literal.push('}');
                rest = after;
                continue;
            }
            if tail.starts_with('}') {
                return Err(TemplateError::UnbalancedBrace(template.to_string()));
            }

            let end = find_top_level(&tail[1..], '}')
                .ok_or_else(|| TemplateError::UnbalancedBrace(template.to_string()))?;
            let parameter = Parameter::parse(&tail[1..1 + end])?;

            if !literal.is_empty() {
                parts.push(SegmentPart::Literal(std::mem::take(&mut literal)));
            } else if matches!(parts.last(), Some(SegmentPart::Parameter(_))) {
                return Err(TemplateError::ConsecutiveParameters(segment.to_string()));
            }
            parts.push(SegmentPart::Parameter(parameter));
            rest = &tail[2 + end..];
        }

        if !literal.is_empty() {
            parts.push(SegmentPart::Literal(literal));
        }

        Ok(Self { parts })
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in &self.parts {
            match part {
                SegmentPart::Literal(text) => {
                    write!(f, "{}", text.replace('{', "{{").replace('}', "}}"))?
                }
                SegmentPart::Parameter(p) => {
                    f.write_str("{")?;
                    if p.catch_all {
                        f.write_str("*")?;
                    }
                    f.write_str(&p.name)?;
                    for c in &p.constraints {
                        write!(f, ":{}", c)?;
                    }
                    if p.optional {
                        f.write_str("?")?;
                    }
                    if let Some(default) = &p.default {
                        write!(f, "={}", default)?;
                    }
                    f.write_str("}")?;
                }
            }
        }
        Ok(())
    }
}

/// The parsed path pattern of a registered route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTemplate {
    text: String,
    segments: Vec<Segment>,
}

impl RouteTemplate {
    /// Parse template text.
    pub fn parse(text: &str) -> Result<Self, TemplateError> {
        let trimmed = text
            .strip_prefix("~/")
            .or_else(|| text.strip_prefix('/'))
            .unwrap_or(text);
        let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);

        let segments = if trimmed.is_empty() {
            Vec::new()
        } else {
            trimmed
                .split('/')
                .map(|segment| {
                    if segment.is_empty() {
                        Err(TemplateError::EmptySegment(text.to_string()))
                    } else {
                        Segment::parse(segment, text)
                    }
                })
                .collect::<Result<Vec<_>, _>>()?
        };

        let template = Self {
            text: trimmed.to_string(),
            segments,
        };
        template.check_parameters()?;
        Ok(template)
    }

    /// Build a template directly from segments.
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        let text = segments
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join("/");
        Self { text, segments }
    }

    fn check_parameters(&self) -> Result<(), TemplateError> {
        let mut seen: Vec<String> = Vec::new();
        let last_segment = self.segments.len().saturating_sub(1);

        for (i, segment) in self.segments.iter().enumerate() {
            let part_count = segment.parts.len();
            for (j, part) in segment.parts.iter().enumerate() {
                let SegmentPart::Parameter(p) = part else { continue };

                let lowered = p.name.to_lowercase();
                if seen.contains(&lowered) {
                    return Err(TemplateError::DuplicateParameter(p.name.clone()));
                }
                seen.push(lowered);

                if p.catch_all && (i != last_segment || j + 1 != part_count) {
                    return Err(TemplateError::CatchAllNotLast(p.name.clone()));
                }
                if p.optional && i != last_segment {
                    return Err(TemplateError::OptionalNotLast(p.name.clone()));
                }
            }
        }
        Ok(())
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The normalized template text (no leading or trailing slash).
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Match a request path against this template.
    ///
    /// Returns the extracted route values on success. Query strings must be
    /// removed by the caller.
    pub fn match_path(&self, path: &str) -> Option<RouteValues> {
        let trimmed = path.strip_prefix('/').unwrap_or(path);
        let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
        let path_segments: Vec<&str> = if trimmed.is_empty() {
            Vec::new()
        } else {
            trimmed.split('/').collect()
        };

        let mut values = RouteValues::new();

        for (i, segment) in self.segments.iter().enumerate() {
            if segment.ends_with_catch_all() {
                let remainder = path_segments.get(i..).map(|s| s.join("/")).unwrap_or_default();
                return match_parts(&segment.parts, &remainder, &mut values).then_some(values);
            }

            match path_segments.get(i) {
                Some(text) => {
                    if !match_parts(&segment.parts, text, &mut values) {
                        return None;
                    }
                }
                None => {
                    let p = segment.omittable()?;
                    if let Some(default) = &p.default {
                        values.insert(p.name.clone(), default.clone());
                    }
                }
            }
        }

        if path_segments.len() > self.segments.len() {
            return None;
        }
        Some(values)
    }
}

impl FromStr for RouteTemplate {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RouteTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.text)
    }
}

/// Match the parts of one segment against a piece of path text.
///
/// A parameter followed by a literal takes the longest prefix that still lets
/// the rest of the segment match.
fn match_parts(parts: &[SegmentPart], text: &str, values: &mut RouteValues) -> bool {
    match parts.split_first() {
        None => text.is_empty(),
        Some((SegmentPart::Literal(literal), rest)) => {
            let len = literal.len();
            if text.len() < len
                || !text.is_char_boundary(len)
                || !text[..len].eq_ignore_ascii_case(literal)
            {
                return false;
            }
            match_parts(rest, &text[len..], values)
        }
        Some((SegmentPart::Parameter(p), rest)) => match rest.first() {
            None => {
                if text.is_empty() {
                    if let Some(default) = &p.default {
                        values.insert(p.name.clone(), default.clone());
                        return true;
                    }
                    return p.optional || p.catch_all;
                }
                if !p.accepts(text) {
                    return false;
                }
                values.insert(p.name.clone(), text.to_string());
                true
            }
            Some(SegmentPart::Literal(literal)) => {
                let haystack = text.to_ascii_lowercase();
                let needle = literal.to_ascii_lowercase();
                for (idx, _) in haystack.rmatch_indices(needle.as_str()) {
                    if idx == 0 {
                        continue;
                    }
                    let value = &text[..idx];
                    if !p.accepts(value) {
                        continue;
                    }
                    let mut attempt = values.clone();
                    attempt.insert(p.name.clone(), value.to_string());
                    if match_parts(rest, &text[idx..], &mut attempt) {
                        *values = attempt;
                        return true;
                    }
                }
                false
            }
            Some(SegmentPart::Parameter(_)) => false,
        },
    }
}

/// Split on `sep` wherever it is not nested inside parentheses.
fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            c if c == sep && depth == 0 => {
                pieces.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    pieces.push(&text[start..]);
    pieces
}

/// Byte index of the first `target` outside parentheses.
fn find_top_level(text: &str, target: char) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            c if c == target && depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}
