//! # Chord Pattern Matcher Module
//!
//! An incremental automaton over the note stream of one section. Every
//! incoming note spawns a new matching state (that note as a candidate chord
//! start) and joins every state already live. Each state tracks one
//! hypothesis per catalog pattern plus a no-pattern single-note fallback;
//! the fallback never dies and never commits, which is what guarantees at
//! least one live hypothesis at all times.
//!
//! The matcher must commit chord decisions before all data is seen, so it is
//! allowed to revise its most recent decision: a commit starting at or
//! before the previous one *replaces* it (the caller retracts the emitted
//! cluster and the optimizer's last column), while a strictly later commit
//! appends.

use log::debug;

use crate::patterns::{ChordPattern, CHORD_PATTERNS};
use crate::tuning::{Placement, Tuning};

/// Notes further apart than this many time steps cannot belong to the same
/// chord; a larger gap flushes and resets all pending states.
pub const MAX_NOTE_SEPARATION: usize = 8;

/// A note as the matcher sees it: a pitch at a section-relative step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchedNote {
    pub pitch: i32,
    pub step: usize,
}

/// A resolved chord decision handed to the placement optimizer.
#[derive(Debug, Clone)]
pub struct ChordCommit {
    /// Step of the hypothesis's first note, section-relative.
    pub start_step: usize,
    /// Chosen root pitch.
    pub root: i32,
    /// Matched catalog pattern.
    pub pattern: &'static ChordPattern,
    /// The notes the decision covers, in arrival order.
    pub notes: Vec<MatchedNote>,
    /// Every placement combination (one placement per note, pairwise
    /// distinct strings) still consistent with the pattern.
    pub combos: Vec<Vec<Placement>>,
    /// Exact interval coverage (`true`) versus merely possible (`false`).
    pub bold: bool,
}

impl ChordCommit {
    pub fn heading(&self) -> String {
        self.pattern.heading(self.root)
    }
}

/// What the caller must do with a freshly resolved commit.
#[derive(Debug, Clone)]
pub enum MatcherAction {
    /// A new decision after the previous one: append it.
    Append(ChordCommit),
    /// A revision of the previous decision: retract it, then apply this one.
    Replace(ChordCommit),
}

/// One pattern hypothesis inside a state: the candidate roots that still
/// satisfy the pattern, and whether any of them covers it completely.
#[derive(Debug)]
struct PossibleMatch {
    pattern: &'static ChordPattern,
    roots: Vec<i32>,
    complete_roots: Vec<i32>,
}

/// A matching state spawned for one candidate start note.
#[derive(Debug)]
struct PatternMatchingState {
    start_step: usize,
    notes: Vec<MatchedNote>,
    /// Placement combinations for the full candidate set; shared by every
    /// pattern hypothesis of this state.
    combos: Vec<Vec<Placement>>,
    matches: Vec<PossibleMatch>,
}

impl PatternMatchingState {
    fn new(pitch: i32, step: usize, tuning: &Tuning) -> Self {
        let mut state = PatternMatchingState {
            start_step: step,
            notes: Vec::new(),
            combos: vec![Vec::new()],
            matches: CHORD_PATTERNS
                .iter()
                .map(|pattern| PossibleMatch {
                    pattern,
                    roots: Vec::new(),
                    complete_roots: Vec::new(),
                })
                .collect(),
        };
        state.add_note(pitch, step, tuning);
        state
    }

    /// Appends the note, extends the placement combinations, and re-derives
    /// every hypothesis's surviving candidate roots. Hypotheses with no
    /// surviving root (or no placement combination left) die.
    fn add_note(&mut self, pitch: i32, step: usize, tuning: &Tuning) {
        self.notes.push(MatchedNote { pitch, step });

        // Combination product: each existing combo branches once per free
        // string that can reach the new pitch.
        let placements = tuning.placements(pitch);
        let mut extended = Vec::new();
        for combo in &self.combos {
            for p in &placements {
                if combo.iter().all(|held: &Placement| held.string != p.string) {
                    let mut next = combo.clone();
                    next.push(*p);
                    extended.push(next);
                }
            }
        }
        self.combos = extended;

        let pitches: Vec<i32> = self.notes.iter().map(|n| n.pitch).collect();
        let playable = !self.combos.is_empty();
        for m in &mut self.matches {
            m.roots.clear();
            m.complete_roots.clear();
            if !playable {
                continue;
            }
            for &root in &pitches {
                let intervals: Vec<i32> = pitches.iter().map(|p| p - root).collect();
                if m.pattern.covers(&intervals) {
                    m.roots.push(root);
                    if m.pattern.complete(&intervals) {
                        m.complete_roots.push(root);
                    }
                }
            }
        }
        self.matches.retain(|m| !m.roots.is_empty());
    }

    fn has_complete(&self) -> bool {
        self.matches.iter().any(|m| !m.complete_roots.is_empty())
    }

    fn commit(&self, pattern: &'static ChordPattern, root: i32, bold: bool) -> ChordCommit {
        ChordCommit {
            start_step: self.start_step,
            root,
            pattern,
            notes: self.notes.clone(),
            combos: self.combos.clone(),
            bold,
        }
    }
}

/// The per-section matcher. Notes must arrive in non-decreasing step order,
/// which the analysis pipeline's FIFO guarantees.
#[derive(Debug)]
pub struct PatternMatcher {
    tuning: Tuning,
    states: Vec<PatternMatchingState>,
    last_note_step: Option<usize>,
    last_commit_start: Option<usize>,
}

impl PatternMatcher {
    pub fn new(tuning: Tuning) -> Self {
        PatternMatcher { tuning, states: Vec::new(), last_note_step: None, last_commit_start: None }
    }

    /// Feeds one newly started note. Returns the commit actions the caller
    /// must apply, in order: possibly a flush of the previous run, then the
    /// decision the new note resolved.
    pub fn on_note(&mut self, pitch: i32, step: usize) -> Vec<MatcherAction> {
        let mut actions = Vec::new();

        // 1. A gap beyond the separation window ends the previous run:
        //    flush its best still-open hypothesis and reset.
        if let Some(last) = self.last_note_step {
            if step.saturating_sub(last) > MAX_NOTE_SEPARATION {
                if let Some(commit) = self.flush_candidate() {
                    actions.push(self.decide(commit));
                }
                self.states.clear();
            }
        }
        self.last_note_step = Some(step);

        // 2. The note joins every live state and spawns its own.
        for state in &mut self.states {
            state.add_note(pitch, step, &self.tuning);
        }
        self.states.push(PatternMatchingState::new(pitch, step, &self.tuning));

        // 3. Commit the valid match of the oldest-starting hypothesis.
        if let Some(commit) = self.best_valid() {
            actions.push(self.decide(commit));
        }
        actions
    }

    /// Ends the note stream (section finished): flushes the best still-open
    /// hypothesis and resets the matcher.
    pub fn finish(&mut self) -> Vec<MatcherAction> {
        let mut actions = Vec::new();
        if let Some(commit) = self.flush_candidate() {
            actions.push(self.decide(commit));
        }
        self.states.clear();
        self.last_note_step = None;
        actions
    }

    /// The valid (complete) match of the oldest-starting live state. Ties on
    /// start step break to the lowest candidate root.
    fn best_valid(&self) -> Option<ChordCommit> {
        let mut best: Option<(usize, i32, &'static ChordPattern, &PatternMatchingState)> = None;
        for state in &self.states {
            for m in &state.matches {
                for &root in &m.complete_roots {
                    let candidate = (state.start_step, root, m.pattern, state);
                    let better = match &best {
                        None => true,
                        Some((start, broot, bpattern, _)) => {
                            (candidate.0, candidate.1) < (*start, *broot)
                                || (candidate.0 == *start
                                    && candidate.1 == *broot
                                    && candidate.2.intervals.len() > bpattern.intervals.len())
                        }
                    };
                    if better {
                        best = Some(candidate);
                    }
                }
            }
        }
        best.map(|(_, root, pattern, state)| state.commit(pattern, root, true))
    }

    /// The best merely-possible hypothesis for a flush: the oldest-starting
    /// state that has at least two notes, no complete match (a complete one
    /// was already committed when it completed), and some live pattern.
    /// Catalog order breaks ties between patterns of the same state.
    fn flush_candidate(&self) -> Option<ChordCommit> {
        for state in &self.states {
            if state.notes.len() < 2 || state.has_complete() {
                continue;
            }
            if let Some(m) = state.matches.first() {
                let root = *m.roots.iter().min().expect("live hypothesis has a root");
                debug!(
                    "matcher: flushing possible {} at step {}",
                    m.pattern.label, state.start_step
                );
                return Some(state.commit(m.pattern, root, false));
            }
        }
        None
    }

    /// Append versus replace: a commit starting strictly after the previous
    /// one is a new decision; anything else revises the previous decision.
    fn decide(&mut self, commit: ChordCommit) -> MatcherAction {
        let action = match self.last_commit_start {
            Some(prev) if commit.start_step <= prev => MatcherAction::Replace(commit),
            _ => MatcherAction::Append(commit),
        };
        let commit = match &action {
            MatcherAction::Append(c) | MatcherAction::Replace(c) => c,
        };
        self.last_commit_start = Some(commit.start_step);
        debug!(
            "matcher: committed {} at step {} ({})",
            commit.heading(),
            commit.start_step,
            if matches!(action, MatcherAction::Append(_)) { "append" } else { "replace" },
        );
        action
    }
}
