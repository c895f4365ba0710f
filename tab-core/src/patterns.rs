//! Chord pattern catalog.
//!
//! The fixed set of interval patterns the matcher tests detected notes
//! against. Intervals are absolute semitone offsets from the chord root, so
//! the power-fifth and its octave-doubled variant are distinct patterns.

/// One chord quality: a display label and its interval requirement.
#[derive(Debug, PartialEq, Eq)]
pub struct ChordPattern {
    /// Suffix used in cluster headings (e.g. `"Major"`, `"5"`).
    pub label: &'static str,
    /// Required semitone offsets from the root, ascending, starting at 0.
    pub intervals: &'static [i32],
}

/// Every pattern the matcher considers, richest variants last.
pub const CHORD_PATTERNS: &[ChordPattern] = &[
    ChordPattern { label: "Major", intervals: &[0, 4, 7] },
    ChordPattern { label: "Minor", intervals: &[0, 3, 7] },
    ChordPattern { label: "Diminished", intervals: &[0, 3, 6] },
    ChordPattern { label: "Augmented", intervals: &[0, 4, 8] },
    ChordPattern { label: "5", intervals: &[0, 7] },
    ChordPattern { label: "5 (8va)", intervals: &[0, 7, 12] },
];

impl ChordPattern {
    /// Smallest number of notes that can complete this pattern.
    pub fn min_notes(&self) -> usize {
        self.intervals.len()
    }

    /// True while `intervals` could still grow into this pattern.
    pub fn covers(&self, intervals: &[i32]) -> bool {
        intervals.iter().all(|i| self.intervals.contains(i))
    }

    /// True when `intervals` contains every required interval exactly.
    pub fn complete(&self, intervals: &[i32]) -> bool {
        self.covers(intervals) && self.intervals.iter().all(|i| intervals.contains(i))
    }

    /// Heading for a committed cluster, e.g. `"A Major"` or `"E5"`.
    pub fn heading(&self, root: i32) -> String {
        let class = crate::tuning::pitch_class_name(root);
        if self.label.starts_with('5') {
            format!("{}{}", class, self.label)
        } else {
            format!("{} {}", class, self.label)
        }
    }
}
