//! # Segmented Timeline Module
//!
//! The recording data model: ordered, contiguous, non-overlapping sections of
//! raw samples, analyzed time steps and committed note clusters, plus the
//! structural edits (cut, swap, reinsert, delete) the editor performs while
//! analysis may still be running.
//!
//! All mutating operations here require the caller to hold the recording-wide
//! lock; nothing in this module is internally thread-safe. Every mutation
//! bumps the recording's revision counter so cached cursor maps and visible
//! ranges know to recompute.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::tuning::{Placement, Tuning};
use crate::HOP_SIZE;

/// Sections shorter than this many time steps cannot result from a cut;
/// a cut that would produce one is silently rejected.
pub const MIN_SECTION_STEPS: usize = 15;

/// Stable identity of a section, unchanged by reordering. The duty cycles
/// re-find their target section by id under the lock on every pass.
pub type SectionId = u64;

/// A detected pitch with a start step and a duration that grows while the
/// pitch keeps being re-detected in consecutive frames. Steps are relative
/// to the owning section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub pitch: i32,
    pub start_step: usize,
    pub length: usize,
}

impl Note {
    pub fn end_step(&self) -> usize {
        self.start_step + self.length
    }
}

/// One analyzed frame: the pitches the oracle detected, which of them began
/// new notes, and the per-step display columns the renderer consumes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimeStep {
    /// Detected pitches, ascending.
    pub pitches: Vec<i32>,
    /// Subset of `pitches` that started a new note at this step.
    pub started: Vec<i32>,
    /// Per-pitch confidence column (pitch image artifact).
    pub pitch_column: Vec<f32>,
    /// Spectral magnitude column (spectrogram artifact).
    pub spectrum_column: Vec<f32>,
}

/// One committed chord decision: where it starts (section-relative), the
/// chosen fretboard placements, a display heading, and whether the match
/// was exact (`bold`) or merely possible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteCluster {
    pub step: usize,
    pub placements: Vec<Placement>,
    pub heading: String,
    pub bold: bool,
}

/// A block of display columns; adjacent strips of equal width merge so the
/// strip count stays logarithmic in the number of steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayStrip {
    pub columns: usize,
    pub rows: usize,
    /// Column-major sample data, `columns * rows` values.
    pub data: Vec<f32>,
}

/// Appends a one-column strip and folds equal-sized neighbours together,
/// binary-counter style.
fn append_column(strips: &mut Vec<DisplayStrip>, column: &[f32]) {
    strips.push(DisplayStrip { columns: 1, rows: column.len(), data: column.to_vec() });
    while strips.len() >= 2 {
        let n = strips.len();
        if strips[n - 1].columns == strips[n - 2].columns
            && strips[n - 1].rows == strips[n - 2].rows
        {
            let right = strips.pop().unwrap();
            let left = strips.last_mut().unwrap();
            left.data.extend(right.data);
            left.columns += right.columns;
        } else {
            break;
        }
    }
}

/// A contiguous run of the timeline.
///
/// Carries absolute offsets that chain across the section list, its raw
/// samples, analyzed steps, notes and clusters, and the lifecycle flags
/// `gathered -> pre_processed -> processed`, each set exactly once and never
/// reset. Mutable only through its owning [`Recording`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    id: SectionId,
    pub sample_start: usize,
    pub step_start: usize,
    pub cluster_start: usize,
    pub samples: Vec<f32>,
    pub steps: Vec<TimeStep>,
    pub notes: Vec<Note>,
    pub clusters: Vec<NoteCluster>,
    pub pitch_strips: Vec<DisplayStrip>,
    pub spectrum_strips: Vec<DisplayStrip>,
    gathered: bool,
    pre_processed: bool,
    processed: bool,
    /// Uncapped commit pacing requested for this section.
    pub fast: bool,
    /// Total step count, recorded when preprocessing finishes. The commit
    /// cycle compares against it to decide when the section is fully drained.
    pub(crate) expected_steps: Option<usize>,
}

impl Section {
    fn new(id: SectionId) -> Self {
        Section {
            id,
            sample_start: 0,
            step_start: 0,
            cluster_start: 0,
            samples: Vec::new(),
            steps: Vec::new(),
            notes: Vec::new(),
            clusters: Vec::new(),
            pitch_strips: Vec::new(),
            spectrum_strips: Vec::new(),
            gathered: false,
            pre_processed: false,
            processed: false,
            fast: false,
            expected_steps: None,
        }
    }

    pub fn id(&self) -> SectionId {
        self.id
    }

    pub fn sample_end(&self) -> usize {
        self.sample_start + self.samples.len()
    }

    pub fn step_end(&self) -> usize {
        self.step_start + self.steps.len()
    }

    pub fn cluster_end(&self) -> usize {
        self.cluster_start + self.clusters.len()
    }

    pub fn is_gathered(&self) -> bool {
        self.gathered
    }

    pub fn is_pre_processed(&self) -> bool {
        self.pre_processed
    }

    pub fn is_processed(&self) -> bool {
        self.processed
    }

    pub(crate) fn mark_gathered(&mut self) {
        debug_assert!(!self.gathered, "section gathered twice");
        self.gathered = true;
    }

    pub(crate) fn mark_pre_processed(&mut self, expected_steps: usize) {
        debug_assert!(self.gathered, "pre-processed before gathered");
        debug_assert!(!self.pre_processed, "section pre-processed twice");
        self.pre_processed = true;
        self.expected_steps = Some(expected_steps);
    }

    pub(crate) fn mark_processed(&mut self) {
        debug_assert!(self.pre_processed, "processed before pre-processed");
        debug_assert!(!self.processed, "section processed twice");
        self.processed = true;
    }

    /// Appends one committed step: stores the step, extends or starts the
    /// notes its pitches belong to, and folds the display columns into the
    /// strip sets.
    pub(crate) fn append_step(&mut self, step: TimeStep) {
        let index = self.steps.len();
        for &pitch in &step.pitches {
            if step.started.contains(&pitch) {
                self.notes.push(Note { pitch, start_step: index, length: 1 });
            } else {
                // Sustain: extend the note this pitch continued. A sustain
                // without a live note can only come from a preprocessing bug.
                let live = self
                    .notes
                    .iter_mut()
                    .rev()
                    .find(|n| n.pitch == pitch && n.end_step() == index);
                match live {
                    Some(note) => note.length += 1,
                    None => self.notes.push(Note { pitch, start_step: index, length: 1 }),
                }
            }
        }
        append_column(&mut self.pitch_strips, &step.pitch_column);
        append_column(&mut self.spectrum_strips, &step.spectrum_column);
        self.steps.push(step);
    }

    /// Splits this section at a section-relative step, consuming it.
    /// Notes spanning the boundary are truncated on the left and restarted
    /// on the right; clusters strictly past the cut move right.
    fn split_at_step(mut self, local: usize, right_id: SectionId) -> (Section, Section) {
        let mut right = Section::new(right_id);

        let sample_cut = (local * HOP_SIZE).min(self.samples.len());
        right.samples = self.samples.split_off(sample_cut);
        right.steps = self.steps.split_off(local);

        let mut left_notes = Vec::new();
        let mut right_notes = Vec::new();
        for note in self.notes.drain(..) {
            if note.end_step() <= local {
                left_notes.push(note);
            } else if note.start_step >= local {
                right_notes.push(Note {
                    pitch: note.pitch,
                    start_step: note.start_step - local,
                    length: note.length,
                });
            } else {
                left_notes.push(Note {
                    pitch: note.pitch,
                    start_step: note.start_step,
                    length: local - note.start_step,
                });
                right_notes.push(Note {
                    pitch: note.pitch,
                    start_step: 0,
                    length: note.end_step() - local,
                });
            }
        }
        right_notes.sort_by_key(|n| n.start_step);
        self.notes = left_notes;
        right.notes = right_notes;

        let split = self
            .clusters
            .iter()
            .position(|c| c.step > local)
            .unwrap_or(self.clusters.len());
        right.clusters = self.clusters.split_off(split);
        for cluster in &mut right.clusters {
            cluster.step -= local;
        }

        // The strips partition differently on each side; rebuild them from
        // the per-step columns, which every step retains.
        self.pitch_strips.clear();
        self.spectrum_strips.clear();
        for step in &self.steps {
            append_column(&mut self.pitch_strips, &step.pitch_column);
            append_column(&mut self.spectrum_strips, &step.spectrum_column);
        }
        for step in &right.steps {
            append_column(&mut right.pitch_strips, &step.pitch_column);
            append_column(&mut right.spectrum_strips, &step.spectrum_column);
        }

        right.gathered = self.gathered;
        right.pre_processed = self.pre_processed;
        right.processed = self.processed;
        right.fast = self.fast;
        self.expected_steps = Some(self.steps.len());
        right.expected_steps = Some(right.steps.len());

        (self, right)
    }
}

/// The ordered section list and the tuning it is placed against.
///
/// The central invariant: section offsets are contiguous and non-overlapping
/// (`sections[i].step_end() == sections[i + 1].step_start`, likewise for
/// samples and clusters). Every mutating operation re-chains the offsets of
/// all subsequent sections before returning.
#[derive(Debug, Serialize, Deserialize)]
pub struct Recording {
    tuning: Tuning,
    sections: Vec<Section>,
    next_id: SectionId,
    revision: u64,
}

impl Recording {
    pub fn new(tuning: Tuning) -> Self {
        Recording { tuning, sections: Vec::new(), next_id: 0, revision: 0 }
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Monotonic counter bumped by every mutation; cursor maps cache
    /// against it.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Total time-step length, equal to the sum of section lengths.
    pub fn step_len(&self) -> usize {
        self.sections.last().map_or(0, Section::step_end)
    }

    pub fn sample_len(&self) -> usize {
        self.sections.last().map_or(0, Section::sample_end)
    }

    pub fn cluster_len(&self) -> usize {
        self.sections.last().map_or(0, Section::cluster_end)
    }

    /// First section whose step range extends past `step`; `None` when the
    /// step lies beyond the end of the recording. O(sections).
    pub fn section_at(&self, step: usize) -> Option<&Section> {
        self.sections.iter().find(|s| s.step_end() > step)
    }

    fn section_index_at(&self, step: usize) -> Option<usize> {
        self.sections.iter().position(|s| s.step_end() > step)
    }

    pub fn section_by_id(&self, id: SectionId) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub(crate) fn section_by_id_mut(&mut self, id: SectionId) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.id == id)
    }

    /// Appends a new empty section chained to the end of the list and
    /// returns its id. Used when capture begins or resumes.
    pub fn start_section(&mut self) -> SectionId {
        let mut section = Section::new(self.next_id);
        self.next_id += 1;
        if let Some(last) = self.sections.last() {
            section.sample_start = last.sample_end();
            section.step_start = last.step_end();
            section.cluster_start = last.cluster_end();
        }
        let id = section.id;
        self.sections.push(section);
        self.revision += 1;
        debug!("timeline: started section {id}");
        id
    }

    /// Marks the last section `gathered`. Calling this twice for the same
    /// section is a caller error.
    pub fn end_section(&mut self) {
        if let Some(last) = self.sections.last_mut() {
            last.mark_gathered();
            self.revision += 1;
            debug!("timeline: section {} gathered", last.id);
        }
    }

    /// Requests (or cancels) uncapped commit pacing for one section.
    pub fn set_fast(&mut self, id: SectionId, fast: bool) {
        if let Some(section) = self.section_by_id_mut(id) {
            section.fast = fast;
        }
    }

    /// Splits the section containing `step` into two sections at that step.
    ///
    /// The cut is silently rejected — returning `false`, list unchanged —
    /// when either resulting half would be shorter than
    /// [`MIN_SECTION_STEPS`], or when the section has not finished
    /// processing yet. Both rejections are editing policy, not errors.
    pub fn cut(&mut self, step: usize) -> bool {
        let Some(idx) = self.section_index_at(step) else {
            return false;
        };
        let section = &self.sections[idx];
        if !section.processed {
            debug!("timeline: cut rejected, section {} still processing", section.id);
            return false;
        }
        let local = step - section.step_start;
        if local < MIN_SECTION_STEPS
            || section.steps.len().saturating_sub(local) < MIN_SECTION_STEPS
        {
            debug!("timeline: cut at {step} rejected, halves would be undersized");
            return false;
        }
        let right_id = self.next_id;
        self.next_id += 1;
        let section = self.sections.remove(idx);
        let left_id = section.id;
        let (left, right) = section.split_at_step(local, right_id);
        self.sections.insert(idx, right);
        self.sections.insert(idx, left);
        self.rechain();
        self.revision += 1;
        debug!("timeline: cut section {left_id} at {step}, new section {right_id}");
        true
    }

    /// Exchanges two sections by index and re-chains every offset.
    pub fn swap_sections(&mut self, a: usize, b: usize) {
        if a == b || a >= self.sections.len() || b >= self.sections.len() {
            return;
        }
        self.sections.swap(a, b);
        self.rechain();
        self.revision += 1;
    }

    /// Removes a section and reinserts it at a new index. The target index
    /// is interpreted against the original list, so it is corrected by one
    /// when the section moves forward past its own removal point.
    pub fn reinsert_section(&mut self, from: usize, to: usize) {
        if from >= self.sections.len() {
            return;
        }
        let section = self.sections.remove(from);
        let to = if to > from { to - 1 } else { to };
        let to = to.min(self.sections.len());
        self.sections.insert(to, section);
        self.rechain();
        self.revision += 1;
    }

    /// Deletes a section and re-chains the remainder.
    pub fn remove_section(&mut self, index: usize) {
        if index >= self.sections.len() {
            return;
        }
        let removed = self.sections.remove(index);
        self.rechain();
        self.revision += 1;
        debug!("timeline: removed section {}", removed.id);
    }

    /// Appends raw capture samples to a section. Returns `false` when the
    /// section no longer exists. This is how the capture cycle — or any
    /// custom sample source — feeds a gathering section.
    pub fn append_samples(&mut self, id: SectionId, samples: &[f32]) -> bool {
        let Some(idx) = self.sections.iter().position(|s| s.id == id) else {
            return false;
        };
        self.sections[idx].samples.extend_from_slice(samples);
        // Only sections after this one shift; re-chaining from zero keeps
        // the code in one place.
        self.rechain();
        self.revision += 1;
        true
    }

    /// Appends one analyzed step to a section. Returns `false` when the
    /// section no longer exists.
    pub(crate) fn commit_step(&mut self, id: SectionId, step: TimeStep) -> bool {
        let Some(idx) = self.sections.iter().position(|s| s.id == id) else {
            return false;
        };
        self.sections[idx].append_step(step);
        self.rechain();
        self.revision += 1;
        true
    }

    pub(crate) fn push_cluster(&mut self, id: SectionId, cluster: NoteCluster) {
        if let Some(idx) = self.sections.iter().position(|s| s.id == id) {
            self.sections[idx].clusters.push(cluster);
            self.rechain();
            self.revision += 1;
        }
    }

    /// Retracts the most recent cluster of a section (matcher revision).
    pub(crate) fn pop_cluster(&mut self, id: SectionId) -> Option<NoteCluster> {
        let idx = self.sections.iter().position(|s| s.id == id)?;
        let popped = self.sections[idx].clusters.pop();
        if popped.is_some() {
            self.rechain();
            self.revision += 1;
        }
        popped
    }

    pub(crate) fn touch(&mut self) {
        self.revision += 1;
    }

    /// Rewrites every section's offsets left-to-right starting at zero so
    /// the chain stays contiguous.
    fn rechain(&mut self) {
        let mut sample = 0;
        let mut step = 0;
        let mut cluster = 0;
        for section in &mut self.sections {
            section.sample_start = sample;
            section.step_start = step;
            section.cluster_start = cluster;
            sample = section.sample_end();
            step = section.step_end();
            cluster = section.cluster_end();
        }
    }

    /// Debug check for the central invariant: offsets contiguous from zero.
    #[cfg(test)]
    pub(crate) fn assert_chained(&self) {
        let mut sample = 0;
        let mut step = 0;
        let mut cluster = 0;
        for section in &self.sections {
            assert_eq!(section.sample_start, sample, "sample chain broken");
            assert_eq!(section.step_start, step, "step chain broken");
            assert_eq!(section.cluster_start, cluster, "cluster chain broken");
            sample = section.sample_end();
            step = section.step_end();
            cluster = section.cluster_end();
        }
        assert_eq!(self.step_len(), step);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::PITCH_RANGE_LEN;
    use crate::tuning::Tuning;

    fn step_with(pitches: &[i32], started: &[i32]) -> TimeStep {
        TimeStep {
            pitches: pitches.to_vec(),
            started: started.to_vec(),
            pitch_column: vec![0.0; PITCH_RANGE_LEN],
            spectrum_column: vec![0.0; 8],
        }
    }

    /// Builds a fully processed section of `len` steps holding one long note.
    fn processed_section(rec: &mut Recording, len: usize) -> SectionId {
        let id = rec.start_section();
        rec.append_samples(id, &vec![0.0; len * HOP_SIZE]);
        rec.end_section();
        for i in 0..len {
            let started = if i == 0 { vec![45] } else { vec![] };
            rec.commit_step(id, step_with(&[45], &started));
        }
        let section = rec.section_by_id_mut(id).unwrap();
        section.mark_pre_processed(len);
        section.mark_processed();
        id
    }

    #[test]
    fn sections_chain_from_origin() {
        let mut rec = Recording::new(Tuning::standard_guitar());
        processed_section(&mut rec, 40);
        processed_section(&mut rec, 50);
        processed_section(&mut rec, 60);
        rec.assert_chained();
        assert_eq!(rec.step_len(), 150);
        assert_eq!(rec.sections()[1].step_start, 40);
        assert_eq!(rec.sections()[2].step_start, 90);
    }

    #[test]
    fn cut_splits_lengths_exactly() {
        let mut rec = Recording::new(Tuning::standard_guitar());
        processed_section(&mut rec, 100);
        assert!(rec.cut(40));
        rec.assert_chained();
        assert_eq!(rec.sections().len(), 2);
        assert_eq!(rec.sections()[0].steps.len(), 40);
        assert_eq!(rec.sections()[1].steps.len(), 60);
        assert_eq!(rec.step_len(), 100);
        assert_eq!(rec.sample_len(), 100 * HOP_SIZE);
    }

    #[test]
    fn undersized_cut_is_a_silent_no_op() {
        let mut rec = Recording::new(Tuning::standard_guitar());
        processed_section(&mut rec, 100);
        let before = rec.revision();
        assert!(!rec.cut(5));
        assert!(!rec.cut(95));
        assert_eq!(rec.sections().len(), 1);
        assert_eq!(rec.revision(), before);
        rec.assert_chained();
    }

    #[test]
    fn cut_beyond_the_end_is_rejected() {
        let mut rec = Recording::new(Tuning::standard_guitar());
        processed_section(&mut rec, 50);
        assert!(!rec.cut(50));
        assert!(!rec.cut(500));
        assert_eq!(rec.sections().len(), 1);
    }

    #[test]
    fn cut_of_an_unprocessed_section_is_rejected() {
        let mut rec = Recording::new(Tuning::standard_guitar());
        let id = rec.start_section();
        rec.append_samples(id, &vec![0.0; 100 * HOP_SIZE]);
        for i in 0..100 {
            rec.commit_step(id, step_with(&[45], if i == 0 { &[45] } else { &[] }));
        }
        assert!(!rec.cut(50));
        assert_eq!(rec.sections().len(), 1);
    }

    #[test]
    fn cut_splits_a_spanning_note() {
        let mut rec = Recording::new(Tuning::standard_guitar());
        processed_section(&mut rec, 100);
        assert!(rec.cut(40));
        let left = &rec.sections()[0];
        let right = &rec.sections()[1];
        assert_eq!(left.notes, vec![Note { pitch: 45, start_step: 0, length: 40 }]);
        assert_eq!(right.notes, vec![Note { pitch: 45, start_step: 0, length: 60 }]);
    }

    #[test]
    fn cut_divides_clusters_at_the_first_cluster_past_the_cut() {
        let mut rec = Recording::new(Tuning::standard_guitar());
        let id = processed_section(&mut rec, 100);
        for step in [10, 40, 70] {
            rec.push_cluster(
                id,
                NoteCluster { step, placements: vec![], heading: "A5".into(), bold: true },
            );
        }
        assert!(rec.cut(40));
        rec.assert_chained();
        // The cluster exactly at the cut stays with the left half.
        assert_eq!(rec.sections()[0].clusters.len(), 2);
        assert_eq!(rec.sections()[1].clusters.len(), 1);
        assert_eq!(rec.sections()[1].clusters[0].step, 30);
        assert_eq!(rec.cluster_len(), 3);
    }

    #[test]
    fn swap_and_reinsert_keep_the_chain_contiguous() {
        let mut rec = Recording::new(Tuning::standard_guitar());
        let a = processed_section(&mut rec, 30);
        let b = processed_section(&mut rec, 40);
        let c = processed_section(&mut rec, 50);

        rec.swap_sections(0, 2);
        rec.assert_chained();
        assert_eq!(rec.sections()[0].id(), c);
        assert_eq!(rec.sections()[2].id(), a);
        assert_eq!(rec.step_len(), 120);

        // Move the first section forward past the second.
        rec.reinsert_section(0, 2);
        rec.assert_chained();
        assert_eq!(rec.sections()[0].id(), b);
        assert_eq!(rec.sections()[1].id(), c);

        rec.remove_section(1);
        rec.assert_chained();
        assert_eq!(rec.sections().len(), 2);
        assert_eq!(rec.step_len(), 70);
    }

    #[test]
    fn random_edit_sequences_preserve_the_invariant() {
        let mut rec = Recording::new(Tuning::standard_guitar());
        for len in [40, 60, 80, 100] {
            processed_section(&mut rec, len);
        }
        // A fixed pseudo-random walk over the edit operations.
        let mut seed = 0x2545f491u32;
        for _ in 0..200 {
            seed = seed.wrapping_mul(1664525).wrapping_add(1013904223);
            let n = rec.sections().len();
            if n == 0 {
                break;
            }
            match seed % 4 {
                0 => {
                    let _ = rec.cut((seed as usize / 7) % rec.step_len().max(1));
                }
                1 => rec.swap_sections(seed as usize % n, (seed as usize / 5) % n),
                2 => rec.reinsert_section(seed as usize % n, (seed as usize / 3) % (n + 1)),
                _ => {
                    if n > 1 {
                        rec.remove_section(seed as usize % n);
                    }
                }
            }
            rec.assert_chained();
            let total: usize = rec.sections().iter().map(|s| s.steps.len()).sum();
            assert_eq!(rec.step_len(), total);
        }
    }

    #[test]
    fn section_at_finds_by_step_and_tolerates_the_end() {
        let mut rec = Recording::new(Tuning::standard_guitar());
        let a = processed_section(&mut rec, 30);
        let b = processed_section(&mut rec, 40);
        assert_eq!(rec.section_at(0).unwrap().id(), a);
        assert_eq!(rec.section_at(29).unwrap().id(), a);
        assert_eq!(rec.section_at(30).unwrap().id(), b);
        assert!(rec.section_at(70).is_none());
    }

    #[test]
    fn sustained_pitches_extend_one_note() {
        let mut rec = Recording::new(Tuning::standard_guitar());
        let id = rec.start_section();
        rec.commit_step(id, step_with(&[45], &[45]));
        rec.commit_step(id, step_with(&[45], &[]));
        rec.commit_step(id, step_with(&[45, 52], &[52]));
        let section = rec.section_by_id(id).unwrap();
        assert_eq!(
            section.notes,
            vec![
                Note { pitch: 45, start_step: 0, length: 3 },
                Note { pitch: 52, start_step: 2, length: 1 },
            ]
        );
    }

    #[test]
    fn strip_count_stays_logarithmic() {
        let mut strips = Vec::new();
        for _ in 0..1000 {
            append_column(&mut strips, &[0.0; 4]);
        }
        let total: usize = strips.iter().map(|s| s.columns).sum();
        assert_eq!(total, 1000);
        // 1000 = 0b1111101000: one strip per set bit.
        assert_eq!(strips.len(), 1000usize.count_ones() as usize);
    }
}
