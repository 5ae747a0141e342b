//! Path Parser
//!
//! Turns a human-readable path such as `"#2 of Multiple Components > Child Item"`
//! into an ordered list of segments, one per `>`-separated part.
//!
//! # Grammar
//!
//! ```text
//! path     := segment ( ">" segment )*
//! segment  := name                      bare
//!           | "#" digits " of " name     by index (1-based)
//!           | "#" text " in " name       by partial text
//!           | "@" text " in " name       by exact text
//! ```
//!
//! The text value may itself contain the words `in` and `of`, so a modified
//! segment can be split in several places. Every valid split is kept as a
//! candidate, latest keyword first; the resolver picks the first candidate
//! whose name is a registered child of the node it is standing on.

use crate::page_object::{normalize_name, Children};
use crate::result::{PathError, PathResult};
use regex::Regex;
use std::fmt;
use std::num::IntErrorKind;
use std::str::FromStr;
use std::sync::OnceLock;

/// Separator between path segments
pub const TRAVERSAL_MARKER: char = '>';

/// Prefix of a partial-text or index modifier
pub const CONTAINS_PREFIX: char = '#';

/// Prefix of an exact-text modifier
pub const EXACT_PREFIX: char = '@';

fn keyword_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    PATTERN.get_or_init(|| Regex::new(r"\b(?:in|of)\b").expect("keyword pattern is valid"))
}

/// How a text modifier compares element text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchKind {
    /// Case-sensitive substring
    Contains,
    /// Case-sensitive equality
    Exact,
}

impl MatchKind {
    /// Test `text` against the modifier value
    #[must_use]
    pub fn matches(self, text: &str, value: &str) -> bool {
        match self {
            Self::Contains => text.contains(value),
            Self::Exact => text == value,
        }
    }

    const fn prefix(self) -> char {
        match self {
            Self::Contains => CONTAINS_PREFIX,
            Self::Exact => EXACT_PREFIX,
        }
    }
}

/// Selection rule narrowing a collection to one member
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Modifier {
    /// Address the node as-is
    None,
    /// 1-based position in the collection
    Index(usize),
    /// First member whose text matches
    Text {
        /// Comparison
        kind: MatchKind,
        /// Text to look for
        value: String,
    },
}

impl Modifier {
    /// Whether this is [`Modifier::None`]
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// One parsed unit of a path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SelectorStep {
    /// Normalized node name used for lookup
    pub name: String,
    /// Node name as written in the path
    pub label: String,
    /// Optional selection rule
    pub modifier: Modifier,
}

impl SelectorStep {
    /// Step without a modifier
    #[must_use]
    pub fn bare(label: impl Into<String>) -> Self {
        Self::new(label, Modifier::None)
    }

    /// Step with the given modifier
    #[must_use]
    pub fn new(label: impl Into<String>, modifier: Modifier) -> Self {
        let label = label.into();
        Self {
            name: normalize_name(&label),
            label,
            modifier,
        }
    }
}

impl fmt::Display for SelectorStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.modifier {
            Modifier::None => write!(f, "{}", self.label),
            Modifier::Index(n) => write!(f, "{CONTAINS_PREFIX}{n} of {}", self.label),
            Modifier::Text { kind, value } => {
                write!(f, "{}{value} in {}", kind.prefix(), self.label)
            }
        }
    }
}

/// One `>`-separated part of a path with every valid reading of it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    raw: String,
    candidates: Vec<SelectorStep>,
}

impl Segment {
    /// Segment text as written (trimmed)
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// All readings, latest keyword split first; never empty
    #[must_use]
    pub fn candidates(&self) -> &[SelectorStep] {
        &self.candidates
    }

    /// Reading chosen when no registered names are available
    #[must_use]
    pub fn preferred(&self) -> &SelectorStep {
        &self.candidates[0]
    }

    /// First reading whose name is one of `children`
    #[must_use]
    pub fn step_for(&self, children: &Children) -> Option<&SelectorStep> {
        self.candidates
            .iter()
            .find(|step| children.contains(&step.name))
    }

    /// Whether the segment can be read more than one way
    #[must_use]
    pub fn is_ambiguous(&self) -> bool {
        self.candidates.len() > 1
    }
}

/// A fully parsed path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPath {
    source: String,
    segments: Vec<Segment>,
}

impl ParsedPath {
    /// Original path string
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Segments in path order
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Preferred reading of every segment
    #[must_use]
    pub fn steps(&self) -> Vec<SelectorStep> {
        self.segments
            .iter()
            .map(|segment| segment.preferred().clone())
            .collect()
    }

    /// Number of segments
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always false for a successfully parsed path
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl FromStr for ParsedPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

/// Parse a path into segments.
///
/// # Errors
///
/// Returns [`PathError::Parse`] if the path is empty or a segment matches
/// none of the bare, indexed, text or exact-text forms.
pub fn parse(path: &str) -> PathResult<ParsedPath> {
    if path.trim().is_empty() {
        return Err(PathError::parse(path, "path is empty"));
    }

    let segments = path
        .split(TRAVERSAL_MARKER)
        .map(|raw| parse_segment(path, raw.trim()))
        .collect::<PathResult<Vec<_>>>()?;

    Ok(ParsedPath {
        source: path.to_string(),
        segments,
    })
}

/// Parse a path and keep only the preferred reading of each segment.
///
/// # Errors
///
/// Same as [`parse`].
pub fn parse_steps(path: &str) -> PathResult<Vec<SelectorStep>> {
    Ok(parse(path)?.steps())
}

fn parse_segment(path: &str, raw: &str) -> PathResult<Segment> {
    if raw.is_empty() {
        return Err(PathError::parse(path, "empty segment"));
    }

    let mut chars = raw.chars();
    let kind = match chars.next() {
        Some(CONTAINS_PREFIX) => MatchKind::Contains,
        Some(EXACT_PREFIX) => MatchKind::Exact,
        _ => {
            return Ok(Segment {
                raw: raw.to_string(),
                candidates: vec![SelectorStep::bare(raw)],
            })
        }
    };

    let body = chars.as_str();
    let candidates = modified_candidates(kind, body);
    if candidates.is_empty() {
        let expected = match kind {
            MatchKind::Contains => "`#<index> of <Name>` or `#<text> in <Name>`",
            MatchKind::Exact => "`@<text> in <Name>`",
        };
        return Err(PathError::parse(
            path,
            format!("segment {raw:?} does not match {expected}"),
        ));
    }

    Ok(Segment {
        raw: raw.to_string(),
        candidates,
    })
}

fn modified_candidates(kind: MatchKind, body: &str) -> Vec<SelectorStep> {
    let keywords: Vec<_> = keyword_pattern()
        .find_iter(body)
        .filter(|m| surrounded_by_whitespace(body, m.start(), m.end()))
        .collect();

    keywords
        .iter()
        .rev()
        .filter_map(|m| {
            let value = body[..m.start()].trim();
            let label = body[m.end()..].trim();
            if value.is_empty() || label.is_empty() {
                return None;
            }
            let modifier = match (m.as_str(), kind) {
                ("in", _) => Modifier::Text {
                    kind,
                    value: value.to_string(),
                },
                ("of", MatchKind::Contains) => Modifier::Index(parse_index(value)?),
                _ => return None,
            };
            Some(SelectorStep::new(label, modifier))
        })
        .collect()
}

fn surrounded_by_whitespace(body: &str, start: usize, end: usize) -> bool {
    let before = body[..start].chars().next_back();
    let after = body[end..].chars().next();
    matches!((before, after), (Some(b), Some(a)) if b.is_whitespace() && a.is_whitespace())
}

fn parse_index(value: &str) -> Option<usize> {
    if !value.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    match value.parse::<usize>() {
        Ok(n) => (n >= 1).then_some(n),
        // larger than any collection can be; resolves to the not-found sentinel
        Err(err) if *err.kind() == IntErrorKind::PosOverflow => Some(usize::MAX),
        Err(_) => None,
    }
}
