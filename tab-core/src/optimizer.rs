//! # Fretboard Placement Optimizer Module
//!
//! A dynamic program over the placement combinations of committed chords.
//! Each commit appends one column; the cheapest path to the newest column is
//! then back-tracked to pick one combination per chord, and clusters are
//! emitted for chords not yet materialized. The table only ever extends or
//! pops its last column (matcher retraction), never mutates interior
//! columns, so emitted clusters stay stable until retracted.

use log::debug;

use crate::matcher::ChordCommit;
use crate::timeline::NoteCluster;
use crate::tuning::{combo_distance, intra_chord_cost, shares_string, Placement};

/// How many prior chords on the best path contribute to a transition cost.
const LOOK_BACK: usize = 3;

/// Time constant, in steps, of the exponentially decaying look-back weight.
const DECAY_TAU: f32 = 8.0;

/// Chords closer than this many steps count as overlapping in time; a
/// shared string between overlapping chords makes the transition impossible.
const CONFLICT_WINDOW: usize = 2;

#[derive(Debug, Clone)]
struct DpNode {
    cost: f32,
    /// Best predecessor combination in the previous column.
    back: Option<usize>,
}

#[derive(Debug)]
struct DpColumn {
    step: usize,
    combos: Vec<Vec<Placement>>,
    nodes: Vec<DpNode>,
    heading: String,
    bold: bool,
}

/// The per-section optimizer. Columns and emitted clusters form a pair of
/// stacks that grow together and truncate together.
#[derive(Debug, Default)]
pub struct PlacementOptimizer {
    columns: Vec<DpColumn>,
    /// Number of leading columns whose clusters have been emitted.
    emitted: usize,
}

impl PlacementOptimizer {
    pub fn new() -> Self {
        PlacementOptimizer::default()
    }

    pub fn chord_count(&self) -> usize {
        self.columns.len()
    }

    /// Extends the table with a newly committed chord. Only the new column
    /// is computed; earlier columns are never revisited.
    pub fn push_chord(&mut self, commit: &ChordCommit) {
        debug_assert!(
            !commit.combos.is_empty(),
            "matcher committed a chord with no placement combination"
        );
        let combos = commit.combos.clone();
        let t = self.columns.len();
        let mut nodes = Vec::with_capacity(combos.len());
        for p in &combos {
            let node = if t == 0 {
                // The first chord has no transition; only its own span counts.
                DpNode { cost: intra_chord_cost(p), back: None }
            } else {
                let prev = &self.columns[t - 1];
                let mut best = f32::INFINITY;
                let mut back = 0;
                for i in 0..prev.combos.len() {
                    let cost = prev.nodes[i].cost + self.transition_cost(i, p, commit.start_step);
                    if cost < best {
                        best = cost;
                        back = i;
                    }
                }
                DpNode { cost: best, back: Some(back) }
            };
            nodes.push(node);
        }
        self.columns.push(DpColumn {
            step: commit.start_step,
            combos,
            nodes,
            heading: commit.heading(),
            bold: commit.bold,
        });
    }

    /// Sum over the last up-to-`LOOK_BACK` chords on the best path ending at
    /// combination `through` of the previous column: physical distance to
    /// the new combination, weighted by a decay over step separation.
    fn transition_cost(&self, through: usize, p: &[Placement], step: usize) -> f32 {
        let mut total = 0.0;
        let mut col = self.columns.len() - 1;
        let mut node = through;
        for _ in 0..LOOK_BACK {
            let column = &self.columns[col];
            let chord = &column.combos[node];
            let sep = step.saturating_sub(column.step);
            let dist = if sep < CONFLICT_WINDOW && shares_string(chord, p) {
                f32::INFINITY
            } else {
                combo_distance(chord, p)
            };
            total += dist * (-(sep as f32) / DECAY_TAU).exp();
            match (col.checked_sub(1), column.nodes[node].back) {
                (Some(prev_col), Some(prev_node)) => {
                    col = prev_col;
                    node = prev_node;
                }
                _ => break,
            }
        }
        total
    }

    /// Retracts the last chord. Returns `true` when a materialized cluster
    /// must be retracted alongside it.
    pub fn pop_chord(&mut self) -> bool {
        if self.columns.pop().is_none() {
            return false;
        }
        if self.emitted > self.columns.len() {
            self.emitted = self.columns.len();
            debug!("optimizer: retracted emitted chord {}", self.emitted);
            true
        } else {
            false
        }
    }

    /// Back-tracks the globally cheapest path to the last chord and returns
    /// one cluster per chord not yet materialized.
    pub fn emit_new_clusters(&mut self) -> Vec<NoteCluster> {
        let len = self.columns.len();
        if self.emitted == len {
            return Vec::new();
        }
        // Cheapest end node, then one choice per column along its path.
        let last = &self.columns[len - 1];
        let mut node = last
            .nodes
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.cost.total_cmp(&b.1.cost))
            .map(|(i, _)| i)
            .unwrap_or(0);
        let mut choices = vec![0usize; len];
        for col in (0..len).rev() {
            choices[col] = node;
            node = self.columns[col].nodes[node].back.unwrap_or(0);
        }
        let emitted = (self.emitted..len)
            .map(|t| {
                let column = &self.columns[t];
                NoteCluster {
                    step: column.step,
                    placements: column.combos[choices[t]].clone(),
                    heading: column.heading.clone(),
                    bold: column.bold,
                }
            })
            .collect();
        self.emitted = len;
        emitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::{MatchedNote, PatternMatcher};
    use crate::patterns::CHORD_PATTERNS;
    use crate::tuning::Tuning;

    fn commit(step: usize, root: i32, combos: Vec<Vec<Placement>>) -> ChordCommit {
        ChordCommit {
            start_step: step,
            root,
            pattern: &CHORD_PATTERNS[4], // power fifth
            notes: vec![MatchedNote { pitch: root, step }],
            combos,
            bold: true,
        }
    }

    fn p(string: u8, fret: u8) -> Placement {
        Placement { string, fret }
    }

    #[test]
    fn unambiguous_placement_never_changes() {
        // Only one combination per chord: the choice is forced and stable.
        let mut opt = PlacementOptimizer::new();
        let only = vec![vec![p(0, 0), p(1, 2)]];
        for step in [0usize, 10, 20, 30] {
            opt.push_chord(&commit(step, 40, only.clone()));
            let emitted = opt.emit_new_clusters();
            assert_eq!(emitted.len(), 1);
            assert_eq!(emitted[0].placements, only[0]);
        }
    }

    #[test]
    fn nearby_chords_prefer_nearby_placements() {
        let mut opt = PlacementOptimizer::new();
        // First chord fixed near the nut.
        opt.push_chord(&commit(0, 40, vec![vec![p(0, 0), p(1, 2)]]));
        // Second chord reachable near the nut or far up the neck.
        opt.push_chord(&commit(
            10,
            45,
            vec![vec![p(1, 0), p(2, 2)], vec![p(1, 12), p(2, 14)]],
        ));
        let emitted = opt.emit_new_clusters();
        assert_eq!(emitted.len(), 2);
        assert_eq!(emitted[1].placements, vec![p(1, 0), p(2, 2)]);
    }

    #[test]
    fn overlapping_chords_avoid_shared_strings() {
        let mut opt = PlacementOptimizer::new();
        opt.push_chord(&commit(0, 40, vec![vec![p(0, 0), p(1, 2)]]));
        // Same step: sharing string 1 is impossible, so the farther shape
        // on free strings wins despite the distance.
        opt.push_chord(&commit(
            0,
            52,
            vec![vec![p(1, 7), p(2, 9)], vec![p(2, 2), p(3, 4)]],
        ));
        let emitted = opt.emit_new_clusters();
        assert_eq!(emitted[1].placements, vec![p(2, 2), p(3, 4)]);
    }

    #[test]
    fn retraction_pops_the_emitted_cluster() {
        let mut opt = PlacementOptimizer::new();
        opt.push_chord(&commit(0, 40, vec![vec![p(0, 0)]]));
        let first = opt.emit_new_clusters();
        assert_eq!(first.len(), 1);
        // Retract and re-push a revised chord at the same step.
        assert!(opt.pop_chord());
        opt.push_chord(&commit(0, 40, vec![vec![p(0, 0), p(1, 2), p(2, 1)]]));
        let second = opt.emit_new_clusters();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].placements.len(), 3);
        assert_eq!(opt.chord_count(), 1);
    }

    #[test]
    fn pop_without_emission_retracts_no_cluster() {
        let mut opt = PlacementOptimizer::new();
        opt.push_chord(&commit(0, 40, vec![vec![p(0, 0)]]));
        assert!(!opt.pop_chord());
        assert_eq!(opt.chord_count(), 0);
        assert!(opt.emit_new_clusters().is_empty());
    }

    #[test]
    fn matcher_and_optimizer_agree_end_to_end() {
        // Full path: notes in, clusters out, with a mid-stream retraction.
        let tuning = Tuning::standard_guitar();
        let mut matcher = PatternMatcher::new(tuning.clone());
        let mut opt = PlacementOptimizer::new();
        let mut clusters: Vec<NoteCluster> = Vec::new();

        for (pitch, step) in [(45, 0), (52, 1), (49, 2)] {
            for action in matcher.on_note(pitch, step) {
                match action {
                    crate::matcher::MatcherAction::Append(c) => opt.push_chord(&c),
                    crate::matcher::MatcherAction::Replace(c) => {
                        if opt.pop_chord() {
                            clusters.pop();
                        }
                        opt.push_chord(&c);
                    }
                }
                clusters.extend(opt.emit_new_clusters());
            }
        }
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].heading, "A Major");
        assert!(clusters[0].bold);
        assert_eq!(clusters[0].placements.len(), 3);
    }
}
