//! Page range selection
//!
//! Parses expressions like `"1-3, 5, 8-10"` into the ascending set of 1-based
//! page numbers to split.

use crate::error::SplitError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ops::RangeInclusive;

/// How malformed tokens in a range expression are treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangeMode {
    /// Malformed, reversed and out-of-bounds tokens contribute nothing
    #[default]
    Permissive,
    /// Any token that cannot be honoured exactly is an error
    Strict,
}

/// A single comma-separated token of a range expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RangeToken {
    Single(i64),
    Span { start: i64, end: i64 },
    Malformed,
}

impl RangeToken {
    /// Classify a token. Returns `None` for blank tokens (e.g. a trailing comma).
    fn parse(part: &str) -> Option<Self> {
        let part = part.trim();
        if part.is_empty() {
            return None;
        }

        if part.contains('-') {
            // Only the first two fields are read, so "1-3-5" is the span 1..=3
            let mut fields = part.split('-');
            let start = fields.next().and_then(parse_bound);
            let end = fields.next().and_then(parse_bound);
            return Some(match (start, end) {
                (Some(start), Some(end)) => RangeToken::Span { start, end },
                _ => RangeToken::Malformed,
            });
        }

        Some(match part.parse::<i64>() {
            Ok(page) => RangeToken::Single(page),
            Err(_) => RangeToken::Malformed,
        })
    }
}

/// Parse one side of a span. A blank bound reads as 0, so "-3" covers 1..=3
/// and "3-" covers nothing.
fn parse_bound(field: &str) -> Option<i64> {
    let field = field.trim();
    if field.is_empty() {
        return Some(0);
    }
    field.parse().ok()
}

/// Intersect `[start, end]` with `[1, page_count]`
fn clamp_span(start: i64, end: i64, page_count: u32) -> Option<RangeInclusive<u32>> {
    let lo = start.max(1);
    let hi = end.min(i64::from(page_count));
    if lo > hi {
        return None;
    }
    Some(lo as u32..=hi as u32)
}

fn in_bounds(page: i64, page_count: u32) -> Option<u32> {
    (1..=i64::from(page_count))
        .contains(&page)
        .then_some(page as u32)
}

/// Parse a range expression, silently dropping tokens that select nothing.
///
/// Output is strictly ascending and every element lies in `[1, page_count]`.
pub fn parse_ranges(expression: &str, page_count: u32) -> Vec<u32> {
    let mut pages = BTreeSet::new();

    for part in expression.split(',') {
        match RangeToken::parse(part) {
            Some(RangeToken::Single(page)) => {
                if let Some(page) = in_bounds(page, page_count) {
                    pages.insert(page);
                }
            }
            Some(RangeToken::Span { start, end }) => {
                if let Some(span) = clamp_span(start, end, page_count) {
                    pages.extend(span);
                }
            }
            Some(RangeToken::Malformed) => {
                tracing::warn!("Ignoring malformed page range token {:?}", part.trim());
            }
            None => {}
        }
    }

    pages.into_iter().collect()
}

/// Parse a range expression, rejecting malformed tokens, reversed spans and
/// pages outside `[1, page_count]`.
pub fn parse_ranges_strict(expression: &str, page_count: u32) -> Result<Vec<u32>, SplitError> {
    let mut pages = BTreeSet::new();

    for part in expression.split(',') {
        let token = part.trim();
        match RangeToken::parse(part) {
            Some(RangeToken::Single(page)) => {
                let page = in_bounds(page, page_count).ok_or_else(|| {
                    SplitError::InvalidRangeToken(format!(
                        "Page {} is out of range (1-{})",
                        token, page_count
                    ))
                })?;
                pages.insert(page);
            }
            Some(RangeToken::Span { start, end }) => {
                if token.split('-').count() != 2 {
                    return Err(SplitError::InvalidRangeToken(format!(
                        "Invalid range: {}",
                        token
                    )));
                }
                if start > end {
                    return Err(SplitError::InvalidRangeToken(format!(
                        "Start {} > end {}",
                        start, end
                    )));
                }
                if start < 1 || end > i64::from(page_count) {
                    return Err(SplitError::InvalidRangeToken(format!(
                        "Range {} is out of range (1-{})",
                        token, page_count
                    )));
                }
                pages.extend(start as u32..=end as u32);
            }
            Some(RangeToken::Malformed) => {
                return Err(SplitError::InvalidRangeToken(format!(
                    "Invalid page: {}",
                    token
                )));
            }
            None => {}
        }
    }

    Ok(pages.into_iter().collect())
}

/// Parse with the given mode
pub fn select_pages(
    expression: &str,
    page_count: u32,
    mode: RangeMode,
) -> Result<Vec<u32>, SplitError> {
    match mode {
        RangeMode::Permissive => Ok(parse_ranges(expression, page_count)),
        RangeMode::Strict => parse_ranges_strict(expression, page_count),
    }
}
