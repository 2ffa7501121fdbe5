/// Verse coverage of a marker file against the chapter's verse list
use bible_core::{VerseLabel, VerseMarker};
use std::collections::BTreeSet;

/// Verses a chapter's markers leave out, and verses they name that the chapter does not have
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerseCoverage {
    pub missing: Vec<u32>,
    pub unexpected: Vec<u32>,
}

impl VerseCoverage {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.unexpected.is_empty()
    }

    pub fn problems(&self) -> usize {
        self.missing.len() + self.unexpected.len()
    }
}

/// Compare marker spans with the expected verse labels, ranges expanded and the introduction
/// ignored on both sides
pub fn verse_coverage(expected: &[VerseLabel], markers: &[VerseMarker]) -> VerseCoverage {
    let expected = expand(expected.iter());
    let covered = expand(markers.iter().map(|m| &m.label));

    VerseCoverage {
        missing: expected.difference(&covered).copied().collect(),
        unexpected: covered.difference(&expected).copied().collect(),
    }
}

fn expand<'a>(labels: impl Iterator<Item = &'a VerseLabel>) -> BTreeSet<u32> {
    labels
        .filter(|label| !label.is_intro())
        .flat_map(|label| label.start()..=label.end())
        .collect()
}
