//! Structured verse labels
//!
//! Labels arrive as strings ("5", "3-5", "3_5", "Intro") and are normalized once, at ingestion,
//! into an inclusive `start..=end` span. Verse 0 is the chapter introduction.

use crate::{BibleCoreError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Display text for verse 0
pub const INTRO_LABEL: &str = "Intro";

/// An inclusive span of verses covered by one label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VerseLabel {
    start: u32,
    end: u32,
}

impl VerseLabel {
    /// The introduction segment (verse 0)
    pub const INTRO: VerseLabel = VerseLabel { start: 0, end: 0 };

    /// A single verse
    pub fn single(verse: u32) -> Self {
        Self {
            start: verse,
            end: verse,
        }
    }

    /// A verse range; `None` when `start > end`
    pub fn range(start: u32, end: u32) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// Parse a label, accepting `-` and `_` as range separators
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.eq_ignore_ascii_case(INTRO_LABEL) {
            return Ok(Self::INTRO);
        }

        let invalid = || BibleCoreError::InvalidVerseLabel(input.to_string());

        match trimmed.split_once(['-', '_']) {
            Some((start, end)) => {
                let start = parse_number(start).ok_or_else(invalid)?;
                let end = parse_number(end).ok_or_else(invalid)?;
                Self::range(start, end).ok_or_else(invalid)
            }
            None => parse_number(trimmed).map(Self::single).ok_or_else(invalid),
        }
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn is_intro(&self) -> bool {
        self.end == 0
    }

    pub fn is_range(&self) -> bool {
        self.start != self.end
    }

    /// Inclusive integer containment
    pub fn contains(&self, verse: u32) -> bool {
        verse >= self.start && verse <= self.end
    }

    /// True when the two spans share at least one verse
    pub fn overlaps(&self, other: &VerseLabel) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

fn parse_number(text: &str) -> Option<u32> {
    let text = text.trim();
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

impl fmt::Display for VerseLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_intro() {
            f.write_str(INTRO_LABEL)
        } else if self.is_range() {
            write!(f, "{}-{}", self.start, self.end)
        } else {
            write!(f, "{}", self.start)
        }
    }
}

impl FromStr for VerseLabel {
    type Err = BibleCoreError;

    fn from_str(value: &str) -> Result<Self> {
        Self::parse(value)
    }
}

impl Serialize for VerseLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VerseLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u32),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(VerseLabel::single(n)),
            Raw::Text(text) => VerseLabel::parse(&text).map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_and_intro() {
        assert_eq!(VerseLabel::parse("5").unwrap(), VerseLabel::single(5));
        assert_eq!(VerseLabel::parse(" 12 ").unwrap(), VerseLabel::single(12));
        assert_eq!(VerseLabel::parse("intro").unwrap(), VerseLabel::INTRO);
        assert_eq!(VerseLabel::parse("INTRO").unwrap(), VerseLabel::INTRO);
        assert_eq!(VerseLabel::parse("0").unwrap(), VerseLabel::INTRO);
    }

    #[test]
    fn hyphen_and_underscore_are_interchangeable() {
        let hyphen = VerseLabel::parse("3-5").unwrap();
        let underscore = VerseLabel::parse("3_5").unwrap();
        assert_eq!(hyphen, underscore);
        assert_eq!(hyphen.start(), 3);
        assert_eq!(hyphen.end(), 5);
        assert!(hyphen.is_range());
    }

    #[test]
    fn rejects_garbage() {
        assert!(VerseLabel::parse("").is_err());
        assert!(VerseLabel::parse("abc").is_err());
        assert!(VerseLabel::parse("5-3").is_err());
        assert!(VerseLabel::parse("3-").is_err());
        assert!(VerseLabel::parse("-3").is_err());
        assert!(VerseLabel::parse("3-4-5").is_err());
        assert!(VerseLabel::parse("+4").is_err());
    }

    #[test]
    fn range_containment_is_inclusive() {
        let label = VerseLabel::parse("31-33").unwrap();
        assert!(!label.contains(30));
        assert!(label.contains(31));
        assert!(label.contains(32));
        assert!(label.contains(33));
        assert!(!label.contains(34));
    }

    #[test]
    fn displays_with_hyphen_only() {
        assert_eq!(VerseLabel::parse("3_5").unwrap().to_string(), "3-5");
        assert_eq!(VerseLabel::single(7).to_string(), "7");
        assert_eq!(VerseLabel::INTRO.to_string(), "Intro");
    }

    #[test]
    fn serde_accepts_numbers_and_strings() {
        let labels: Vec<VerseLabel> = serde_json::from_str(r#"[1, "2", "3_4", "Intro"]"#).unwrap();
        assert_eq!(
            labels,
            vec![
                VerseLabel::single(1),
                VerseLabel::single(2),
                VerseLabel::range(3, 4).unwrap(),
                VerseLabel::INTRO
            ]
        );
        assert_eq!(serde_json::to_string(&labels[2]).unwrap(), "\"3-4\"");
    }
}
