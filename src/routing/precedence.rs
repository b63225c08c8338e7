//! Route precedence.
//!
//! Orders route templates so that the more specific of two overlapping
//! routes is tried first by a first-match router.
//!
//! # Rules (segment by segment, left to right)
//! ```text
//! literal                      before  parameter
//! parameter with more constraints  before  parameter with fewer
//! literal "abc"                before  literal "ABD"   (ordinal, case-insensitive)
//! ```
//!
//! # Length
//! - If the right-hand template runs out first, the left-hand one sorts first:
//!   `a/b` sorts before `a`. This is the opposite of the usual
//!   "shorter wins" policy and is kept as-is; see the tests below.
//! - Equal prefixes with a longer right-hand template sort the right-hand one
//!   first. Together, a template always sorts before any of its own prefixes.
//!
//! # Design Decisions
//! - Pure function of the two templates, no allocation
//! - Equal verdicts are left to the caller's stable sort

use std::cmp::Ordering;

use crate::routing::template::{RouteTemplate, Segment};

/// Compare two templates by match precedence.
///
/// `Ordering::Less` means `a` must be tried before `b`.
pub fn compare(a: &RouteTemplate, b: &RouteTemplate) -> Ordering {
    let a_segments = a.segments();
    let b_segments = b.segments();

    for (i, a_segment) in a_segments.iter().enumerate() {
        let Some(b_segment) = b_segments.get(i) else {
            return Ordering::Less;
        };

        match compare_segments(a_segment, b_segment) {
            Ordering::Equal => continue,
            verdict => return verdict,
        }
    }

    if b_segments.len() > a_segments.len() {
        return Ordering::Greater;
    }
    Ordering::Equal
}

fn compare_segments(a: &Segment, b: &Segment) -> Ordering {
    match (a.is_parameter(), b.is_parameter()) {
        (false, true) => Ordering::Less,
        (true, false) => Ordering::Greater,
        // More constraints first.
        (true, true) => b.constraint_count().cmp(&a.constraint_count()),
        (false, false) => compare_ignore_case(a.literal_text(), b.literal_text()),
    }
}

/// Ordinal comparison after upper-casing every character.
fn compare_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars().map(upper).cmp(b.chars().map(upper))
}

/// Simple one-to-one upper-casing. Characters whose upper case expands to
/// several characters (`ß` to `SS`) are kept as they are.
fn upper(c: char) -> char {
    let mut mapped = c.to_uppercase();
    match (mapped.next(), mapped.next()) {
        (Some(u), None) => u,
        _ => c,
    }
}
