//! Inline route constraints.
//!
//! # Responsibilities
//! - Parse constraint text (`int`, `min(1)`, `regex(^\d+$)`) into a checker
//! - Accept or reject a candidate route value
//!
//! # Design Decisions
//! - Regex constraints are compiled once, at template parse time
//! - Regex matching is case-insensitive, like the rest of path matching
//! - Equality is by source text; two `regex(...)` constraints with the same
//!   text are the same constraint

use regex::{Regex, RegexBuilder};
use std::fmt;
use uuid::Uuid;

use crate::routing::template::TemplateError;

/// What a constraint checks.
#[derive(Debug, Clone)]
enum ConstraintKind {
    Int,
    Long,
    Bool,
    Guid,
    Decimal,
    Double,
    Float,
    Alpha,
    Required,
    MinLength(usize),
    MaxLength(usize),
    Length(usize),
    LengthRange(usize, usize),
    Min(i64),
    Max(i64),
    Range(i64, i64),
    Regex(Regex),
}

/// A single inline constraint attached to a route parameter.
#[derive(Debug, Clone)]
pub struct InlineConstraint {
    text: String,
    kind: ConstraintKind,
}

impl InlineConstraint {
    /// Parse constraint text as written after the `:` in a parameter.
    pub fn parse(text: &str) -> Result<Self, TemplateError> {
        let (name, argument) = split_call(text)?;

        let kind = match (name.to_ascii_lowercase().as_str(), argument) {
            ("int", None) => ConstraintKind::Int,
            ("long", None) => ConstraintKind::Long,
            ("bool", None) => ConstraintKind::Bool,
            ("guid", None) => ConstraintKind::Guid,
            ("decimal", None) => ConstraintKind::Decimal,
            ("double", None) => ConstraintKind::Double,
            ("float", None) => ConstraintKind::Float,
            ("alpha", None) => ConstraintKind::Alpha,
            ("required", None) => ConstraintKind::Required,
            ("minlength", Some(arg)) => ConstraintKind::MinLength(parse_arg(text, arg)?),
            ("maxlength", Some(arg)) => ConstraintKind::MaxLength(parse_arg(text, arg)?),
            ("length", Some(arg)) => match arg.split_once(',') {
                Some((lo, hi)) => {
                    ConstraintKind::LengthRange(parse_arg(text, lo)?, parse_arg(text, hi)?)
                }
                None => ConstraintKind::Length(parse_arg(text, arg)?),
            },
            ("min", Some(arg)) => ConstraintKind::Min(parse_arg(text, arg)?),
            ("max", Some(arg)) => ConstraintKind::Max(parse_arg(text, arg)?),
            ("range", Some(arg)) => {
                let (lo, hi) = arg
                    .split_once(',')
                    .ok_or_else(|| TemplateError::InvalidConstraintArgument(text.to_string()))?;
                ConstraintKind::Range(parse_arg(text, lo)?, parse_arg(text, hi)?)
            }
            ("regex", Some(arg)) => {
                let regex = RegexBuilder::new(arg)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| TemplateError::InvalidRegex {
                        pattern: arg.to_string(),
                        reason: e.to_string(),
                    })?;
                ConstraintKind::Regex(regex)
            }
            _ => return Err(TemplateError::UnknownConstraint(text.to_string())),
        };

        Ok(Self {
            text: text.to_string(),
            kind,
        })
    }

    /// The constraint as it was written in the template.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns true if `value` satisfies this constraint.
    pub fn accepts(&self, value: &str) -> bool {
        match &self.kind {
            ConstraintKind::Int => value.parse::<i32>().is_ok(),
            ConstraintKind::Long => value.parse::<i64>().is_ok(),
            ConstraintKind::Bool => value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false"),
            ConstraintKind::Guid => Uuid::parse_str(value).is_ok(),
            ConstraintKind::Decimal | ConstraintKind::Double => value.parse::<f64>().is_ok(),
            ConstraintKind::Float => value.parse::<f32>().is_ok(),
            ConstraintKind::Alpha => !value.is_empty() && value.chars().all(|c| c.is_ascii_alphabetic()),
            ConstraintKind::Required => !value.is_empty(),
            ConstraintKind::MinLength(n) => value.chars().count() >= *n,
            ConstraintKind::MaxLength(n) => value.chars().count() <= *n,
            ConstraintKind::Length(n) => value.chars().count() == *n,
            ConstraintKind::LengthRange(lo, hi) => {
                let len = value.chars().count();
                len >= *lo && len <= *hi
            }
            ConstraintKind::Min(n) => value.parse::<i64>().map(|v| v >= *n).unwrap_or(false),
            ConstraintKind::Max(n) => value.parse::<i64>().map(|v| v <= *n).unwrap_or(false),
            ConstraintKind::Range(lo, hi) => value
                .parse::<i64>()
                .map(|v| v >= *lo && v <= *hi)
                .unwrap_or(false),
            ConstraintKind::Regex(regex) => regex.is_match(value),
        }
    }
}

impl PartialEq for InlineConstraint {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for InlineConstraint {}

impl fmt::Display for InlineConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Split `name(arg)` into its name and argument.
fn split_call(text: &str) -> Result<(&str, Option<&str>), TemplateError> {
    match text.find('(') {
        Some(open) => {
            let inner = text[open + 1..]
                .strip_suffix(')')
                .ok_or_else(|| TemplateError::InvalidConstraintArgument(text.to_string()))?;
            Ok((&text[..open], Some(inner)))
        }
        None => Ok((text, None)),
    }
}

fn parse_arg<N: std::str::FromStr>(text: &str, arg: &str) -> Result<N, TemplateError> {
    arg.trim()
        .parse()
        .map_err(|_| TemplateError::InvalidConstraintArgument(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_constraints() {
        let int = InlineConstraint::parse("int").unwrap();
        assert!(int.accepts("42"));
        assert!(int.accepts("-7"));
        assert!(!int.accepts("abc"));
        assert!(!int.accepts("99999999999"));

        let long = InlineConstraint::parse("long").unwrap();
        assert!(long.accepts("99999999999"));

        let guid = InlineConstraint::parse("guid").unwrap();
        assert!(guid.accepts("67e55044-10b1-426f-9247-bb680e5fe0c8"));
        assert!(!guid.accepts("not-a-guid"));

        let boolean = InlineConstraint::parse("bool").unwrap();
        assert!(boolean.accepts("TRUE"));
        assert!(!boolean.accepts("yes"));
    }

    #[test]
    fn test_argument_constraints() {
        let range = InlineConstraint::parse("range(1,10)").unwrap();
        assert!(range.accepts("1"));
        assert!(range.accepts("10"));
        assert!(!range.accepts("11"));

        let length = InlineConstraint::parse("length(2,3)").unwrap();
        assert!(length.accepts("ab"));
        assert!(!length.accepts("abcd"));

        let min = InlineConstraint::parse("min(5)").unwrap();
        assert!(!min.accepts("4"));
        assert!(min.accepts("5"));
    }

    #[test]
    fn test_regex_constraint() {
        let re = InlineConstraint::parse("regex(^(abc$)").unwrap_err();
        assert!(matches!(re, TemplateError::InvalidRegex { .. }));

        let re = InlineConstraint::parse("regex(^[a-z]+-\\d+$)").unwrap();
        assert!(re.accepts("ab-12"));
        assert!(re.accepts("AB-12"));
        assert!(!re.accepts("ab12"));
        assert_eq!(re.text(), "regex(^[a-z]+-\\d+$)");
    }

    #[test]
    fn test_unknown_and_malformed() {
        assert!(matches!(
            InlineConstraint::parse("datetime"),
            Err(TemplateError::UnknownConstraint(_))
        ));
        assert!(matches!(
            InlineConstraint::parse("min(abc)"),
            Err(TemplateError::InvalidConstraintArgument(_))
        ));
        assert!(matches!(
            InlineConstraint::parse("range(1)"),
            Err(TemplateError::InvalidConstraintArgument(_))
        ));
        // `int` takes no argument
        assert!(InlineConstraint::parse("int(3)").is_err());
    }
}
