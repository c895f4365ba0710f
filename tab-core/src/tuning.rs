//! # Tuning & Placement Geometry Module
//!
//! This module provides the static fretboard geometry for tablature placement.
//! It handles note name conversions, string/fret reachability under a tuning,
//! and the cost functions the placement optimizer uses to compare candidate
//! fingerings.
//!
//! ## Features
//! - Standard guitar and bass tunings with capo and fret-limit support
//! - Playability checks: which (string, fret) pairs produce a pitch
//! - Placement enumeration for a detected pitch
//! - Physical distance and chord-span cost functions

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::oracle::{PITCH_RANGE_END, PITCH_RANGE_START};

/// Relative weight of a fret move versus a string move in physical distance.
/// Moving the hand along the neck costs more than crossing strings.
const FRET_WEIGHT: f32 = 1.0;
const STRING_WEIGHT: f32 = 0.5;

/// Names of the twelve pitch classes, C-based to match MIDI numbering.
const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Statically computed names for every pitch in the oracle's closed range.
///
/// Computed once at startup; `pitch_name` and the reverse map below index
/// into this table for display headings and test fixtures.
static NAMES: Lazy<Vec<String>> = Lazy::new(|| {
    (PITCH_RANGE_START..=PITCH_RANGE_END)
        .map(|midi| {
            // MIDI 60 is C4; the octave changes at C.
            let class = midi.rem_euclid(12) as usize;
            let octave = midi / 12 - 1;
            format!("{}{}", NOTE_NAMES[class], octave)
        })
        .collect()
});

/// Static map for quick note name to pitch lookups.
static NAME_MAP: Lazy<BTreeMap<String, i32>> = Lazy::new(|| {
    NAMES
        .iter()
        .enumerate()
        .map(|(i, name)| (name.clone(), PITCH_RANGE_START + i as i32))
        .collect()
});

/// Returns the display name for a MIDI pitch (e.g. `"A2"`, `"C#4"`).
///
/// Pitches outside the oracle range still format correctly; only in-range
/// pitches hit the precomputed table.
pub fn pitch_name(pitch: i32) -> String {
    let idx = pitch - PITCH_RANGE_START;
    if idx >= 0 && (idx as usize) < NAMES.len() {
        NAMES[idx as usize].clone()
    } else {
        let class = pitch.rem_euclid(12) as usize;
        format!("{}{}", NOTE_NAMES[class], pitch / 12 - 1)
    }
}

/// Returns the bare pitch-class name for a MIDI pitch (e.g. `"A"`, `"C#"`).
/// Used for chord headings, which name the root without an octave.
pub fn pitch_class_name(pitch: i32) -> &'static str {
    NOTE_NAMES[pitch.rem_euclid(12) as usize]
}

/// Gets the MIDI pitch for a note name like `"A2"` or `"C#4"`.
///
/// # Returns
/// * `Some(pitch)` for names inside the oracle range, `None` otherwise
pub fn pitch_from_name(name: &str) -> Option<i32> {
    NAME_MAP.get(name).copied()
}

/// A candidate (string, fret) realization of one pitch under a tuning.
///
/// Placements are always derived from a [`Tuning`] plus a pitch; they are
/// never stored independently except inside committed note clusters.
/// String `0` is the lowest-pitched string; fret `0` is the open string
/// (or the capo position when a capo is set).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Placement {
    pub string: u8,
    pub fret: u8,
}

/// An instrument tuning: ordered open-string pitches, a capo offset and a
/// playable fret limit. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tuning {
    /// Open-string MIDI pitches, low to high.
    open_strings: Vec<i32>,
    /// Capo fret; raises every open string by this many semitones.
    capo: u8,
    /// Highest fret counted as playable, measured from the capo.
    max_fret: u8,
}

impl Tuning {
    /// Creates a tuning from open-string pitches (low to high).
    ///
    /// # Panics
    /// * If `open_strings` is empty — a stringless tuning is a programming error.
    pub fn new(open_strings: Vec<i32>, capo: u8, max_fret: u8) -> Self {
        assert!(!open_strings.is_empty(), "tuning needs at least one string");
        Tuning { open_strings, capo, max_fret }
    }

    /// Standard six-string guitar tuning (E2 A2 D3 G3 B3 E4), no capo, 19 frets.
    pub fn standard_guitar() -> Self {
        Tuning::new(vec![40, 45, 50, 55, 59, 64], 0, 19)
    }

    /// Standard four-string bass tuning (E1 A1 D2 G2), no capo, 19 frets.
    pub fn standard_bass() -> Self {
        Tuning::new(vec![28, 33, 38, 43], 0, 19)
    }

    pub fn string_count(&self) -> usize {
        self.open_strings.len()
    }

    pub fn capo(&self) -> u8 {
        self.capo
    }

    pub fn max_fret(&self) -> u8 {
        self.max_fret
    }

    /// The pitch produced by fretting `string` at `fret` (capo included).
    ///
    /// # Panics
    /// * If `string` is out of range for this tuning.
    pub fn sounding_pitch(&self, string: u8, fret: u8) -> i32 {
        self.open_strings[string as usize] + self.capo as i32 + fret as i32
    }

    /// Enumerates every placement that produces `pitch` within the fret limit.
    ///
    /// The list is ordered low string to high string; each string contributes
    /// at most one placement.
    pub fn placements(&self, pitch: i32) -> Vec<Placement> {
        let mut found = Vec::new();
        for (string, &open) in self.open_strings.iter().enumerate() {
            let fret = pitch - open - self.capo as i32;
            if fret >= 0 && fret <= self.max_fret as i32 {
                found.push(Placement { string: string as u8, fret: fret as u8 });
            }
        }
        found
    }

    /// A pitch is playable iff some string+fret combination reaches it.
    pub fn is_playable(&self, pitch: i32) -> bool {
        self.open_strings.iter().any(|&open| {
            let fret = pitch - open - self.capo as i32;
            fret >= 0 && fret <= self.max_fret as i32
        })
    }
}

/// Physical distance between two placements on the fretboard grid.
///
/// Used by the optimizer as the transition cost between the placements of
/// successive chords. Fret movement is weighted heavier than string movement.
pub fn placement_distance(a: Placement, b: Placement) -> f32 {
    let df = (a.fret as f32 - b.fret as f32) * FRET_WEIGHT;
    let ds = (a.string as f32 - b.string as f32) * STRING_WEIGHT;
    (df * df + ds * ds).sqrt()
}

/// Intra-chord cost: penalizes wide string and fret spans within one
/// simultaneous chord. Open strings do not count towards the fret span
/// since they need no finger.
pub fn intra_chord_cost(combo: &[Placement]) -> f32 {
    if combo.len() < 2 {
        return 0.0;
    }
    let fretted: Vec<u8> = combo.iter().map(|p| p.fret).filter(|&f| f > 0).collect();
    let fret_span = match (fretted.iter().min(), fretted.iter().max()) {
        (Some(&lo), Some(&hi)) => (hi - lo) as f32,
        _ => 0.0,
    };
    let strings: Vec<u8> = combo.iter().map(|p| p.string).collect();
    let string_span =
        (*strings.iter().max().unwrap() - *strings.iter().min().unwrap()) as f32;
    fret_span * FRET_WEIGHT + string_span * STRING_WEIGHT
}

/// Distance between the placements of two whole chords: the distance between
/// their fretboard centroids. The same-string/overlap exclusion is applied by
/// the optimizer, which knows the time separation.
pub fn combo_distance(a: &[Placement], b: &[Placement]) -> f32 {
    let centroid = |combo: &[Placement]| -> (f32, f32) {
        let n = combo.len().max(1) as f32;
        let fret = combo.iter().map(|p| p.fret as f32).sum::<f32>() / n;
        let string = combo.iter().map(|p| p.string as f32).sum::<f32>() / n;
        (fret, string)
    };
    let (af, astr) = centroid(a);
    let (bf, bstr) = centroid(b);
    let df = (af - bf) * FRET_WEIGHT;
    let ds = (astr - bstr) * STRING_WEIGHT;
    (df * df + ds * ds).sqrt()
}

/// True when two chord placements claim at least one string in common.
pub fn shares_string(a: &[Placement], b: &[Placement]) -> bool {
    a.iter().any(|pa| b.iter().any(|pb| pa.string == pb.string))
}
