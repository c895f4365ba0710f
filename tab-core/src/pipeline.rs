//! # Analysis Pipeline Module
//!
//! The two analysis duty cycles and the FIFO between them.
//!
//! **Preprocessing** slides the analysis window across the oldest unfinished
//! section at a fixed hop, invokes the pitch oracle once per hop (outside
//! the recording lock) and enqueues the resulting steps strictly in temporal
//! order. **Commit** drains the queue one step at a time at the engine frame
//! rate — or unpaced for sections flagged fast — folding each step into its
//! section, feeding newly started notes to the section's pattern matcher and
//! placement optimizer, and appending or retracting note clusters.
//!
//! Both cycles spin (yield) when their upstream has no data. On interrupt
//! the commit cycle drains the queue completely before exiting: no analyzed
//! step is ever dropped.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use log::{debug, warn};
use parking_lot::Mutex;

use crate::matcher::{MatcherAction, PatternMatcher};
use crate::optimizer::PlacementOptimizer;
use crate::oracle::{PitchOracle, WINDOW_SIZE};
use crate::timeline::{Recording, SectionId, TimeStep};
use crate::{EngineEvent, FRAME_RATE, HOP_SIZE};

/// One analyzed step in flight between the duty cycles.
struct QueuedStep {
    section: SectionId,
    step: TimeStep,
}

/// Windowing progress for the section currently being preprocessed.
#[derive(Default)]
struct PreprocessState {
    next_window: usize,
    prev_pitches: Vec<i32>,
    steps_enqueued: usize,
}

/// Matcher and optimizer state for a section being committed.
struct SectionAnalysis {
    matcher: PatternMatcher,
    optimizer: PlacementOptimizer,
}

/// Handle over the two analysis duty-cycle threads.
///
/// Threads run until [`AnalysisPipeline::stop`]; dropping the handle without
/// stopping leaves them running for the life of the process.
pub struct AnalysisPipeline {
    interrupt: Arc<AtomicBool>,
    preprocess: Option<JoinHandle<()>>,
    commit: Option<JoinHandle<()>>,
}

impl AnalysisPipeline {
    /// Spawns the preprocessing and commit cycles over a shared recording.
    pub fn start(
        recording: Arc<Mutex<Recording>>,
        oracle: Arc<dyn PitchOracle>,
        events: Sender<EngineEvent>,
    ) -> Self {
        let interrupt = Arc::new(AtomicBool::new(false));
        let (queue_tx, queue_rx) = crossbeam_channel::unbounded();

        let pre_interrupt = Arc::clone(&interrupt);
        let pre_recording = Arc::clone(&recording);
        let pre_events = events.clone();
        let preprocess = thread::spawn(move || {
            preprocess_loop(pre_recording, oracle, queue_tx, pre_events, pre_interrupt);
        });

        let commit_interrupt = Arc::clone(&interrupt);
        let commit = thread::spawn(move || {
            commit_loop(recording, queue_rx, events, commit_interrupt);
        });

        AnalysisPipeline { interrupt, preprocess: Some(preprocess), commit: Some(commit) }
    }

    /// Interrupts both cycles and waits for them. The preprocessing thread
    /// stops first; dropping its queue sender is what tells the commit
    /// thread the drain is complete.
    pub fn stop(mut self) {
        self.interrupt.store(true, Ordering::Relaxed);
        if let Some(handle) = self.preprocess.take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.commit.take() {
            let _ = handle.join();
        }
    }
}

enum PreprocessJob {
    /// A full window is available: run the oracle on it.
    Analyze { id: SectionId, window: Vec<f32> },
    /// The section is gathered and fully windowed.
    Finish { id: SectionId, steps: usize },
    Idle,
}

fn preprocess_loop(
    recording: Arc<Mutex<Recording>>,
    oracle: Arc<dyn PitchOracle>,
    queue: Sender<QueuedStep>,
    events: Sender<EngineEvent>,
    interrupt: Arc<AtomicBool>,
) {
    let mut states: HashMap<SectionId, PreprocessState> = HashMap::new();
    while !interrupt.load(Ordering::Relaxed) {
        // Decide on work under the lock, but never run the oracle there.
        let job = {
            let rec = recording.lock();
            match rec.sections().iter().find(|s| !s.is_pre_processed()) {
                None => PreprocessJob::Idle,
                Some(section) => {
                    let id = section.id();
                    let state = states.entry(id).or_default();
                    if state.next_window + WINDOW_SIZE <= section.samples.len() {
                        let window = section.samples
                            [state.next_window..state.next_window + WINDOW_SIZE]
                            .to_vec();
                        PreprocessJob::Analyze { id, window }
                    } else if section.is_gathered() {
                        PreprocessJob::Finish { id, steps: state.steps_enqueued }
                    } else {
                        // Still gathering and no full window yet.
                        PreprocessJob::Idle
                    }
                }
            }
        };
        match job {
            PreprocessJob::Analyze { id, window } => {
                let output = oracle.analyze(&window);
                let state = states.get_mut(&id).expect("state for analyzed section");
                let pitches = output.detected_pitches();
                // A pitch starts a new note only if the previous frame did
                // not already hold it.
                let started = pitches
                    .iter()
                    .copied()
                    .filter(|p| !state.prev_pitches.contains(p))
                    .collect();
                let step = TimeStep {
                    started,
                    pitch_column: output.pitch_confidence,
                    spectrum_column: output.spectrum,
                    pitches: pitches.clone(),
                };
                state.prev_pitches = pitches;
                state.next_window += HOP_SIZE;
                state.steps_enqueued += 1;
                if queue.send(QueuedStep { section: id, step }).is_err() {
                    break;
                }
            }
            PreprocessJob::Finish { id, steps } => {
                let mut rec = recording.lock();
                if let Some(section) = rec.section_by_id_mut(id) {
                    section.mark_pre_processed(steps);
                    debug!("pipeline: section {id} pre-processed ({steps} steps)");
                }
                rec.touch();
                drop(rec);
                states.remove(&id);
                events.send(EngineEvent::SectionPreProcessed { section: id }).ok();
            }
            PreprocessJob::Idle => thread::yield_now(),
        }
    }
}

fn commit_loop(
    recording: Arc<Mutex<Recording>>,
    queue: Receiver<QueuedStep>,
    events: Sender<EngineEvent>,
    interrupt: Arc<AtomicBool>,
) {
    let mut analyses: HashMap<SectionId, SectionAnalysis> = HashMap::new();
    let period = Duration::from_secs(1) / FRAME_RATE;
    let mut accumulator = Duration::ZERO;
    let mut last_tick = Instant::now();
    let mut pending: Option<QueuedStep> = None;

    loop {
        let stopping = interrupt.load(Ordering::Relaxed);
        if pending.is_none() {
            pending = match queue.try_recv() {
                Ok(queued) => Some(queued),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => {
                    // Producer gone and queue fully drained: we are done.
                    finalize_ready(&recording, &mut analyses, &events);
                    return;
                }
            };
        }

        // Fixed-timestep pacing: excess time is kept, never discarded, and
        // consumed strictly in whole-period increments.
        let now = Instant::now();
        accumulator += now - last_tick;
        last_tick = now;

        match pending.take() {
            Some(queued) => {
                let fast = recording
                    .lock()
                    .section_by_id(queued.section)
                    .is_none_or(|s| s.fast);
                if fast || stopping {
                    commit_step(&recording, &mut analyses, &events, queued);
                } else if accumulator >= period {
                    accumulator -= period;
                    commit_step(&recording, &mut analyses, &events, queued);
                } else {
                    pending = Some(queued);
                    thread::yield_now();
                }
            }
            None => {
                finalize_ready(&recording, &mut analyses, &events);
                thread::yield_now();
            }
        }
    }
}

/// Applies one drained step: stores it in its section, extends notes, and
/// runs the matcher/optimizer over the notes that just started.
fn commit_step(
    recording: &Arc<Mutex<Recording>>,
    analyses: &mut HashMap<SectionId, SectionAnalysis>,
    events: &Sender<EngineEvent>,
    queued: QueuedStep,
) {
    let id = queued.section;
    let mut rec = recording.lock();
    let Some(section) = rec.section_by_id(id) else {
        // The section was edited away while its steps were in flight.
        warn!("pipeline: dropping step for removed section {id}");
        analyses.remove(&id);
        return;
    };
    let index = section.steps.len();
    let started = queued.step.started.clone();
    let tuning = rec.tuning().clone();
    rec.commit_step(id, queued.step);

    let analysis = analyses.entry(id).or_insert_with(|| SectionAnalysis {
        matcher: PatternMatcher::new(tuning),
        optimizer: PlacementOptimizer::new(),
    });
    let mut clusters_changed = false;
    for pitch in started {
        for action in analysis.matcher.on_note(pitch, index) {
            apply_action(&mut rec, id, analysis, action);
            clusters_changed = true;
        }
    }
    drop(rec);

    events.send(EngineEvent::StepCommitted { section: id }).ok();
    if clusters_changed {
        events.send(EngineEvent::ClustersChanged { section: id }).ok();
    }
}

fn apply_action(
    rec: &mut Recording,
    id: SectionId,
    analysis: &mut SectionAnalysis,
    action: MatcherAction,
) {
    match action {
        MatcherAction::Append(commit) => analysis.optimizer.push_chord(&commit),
        MatcherAction::Replace(commit) => {
            if analysis.optimizer.pop_chord() {
                rec.pop_cluster(id);
            }
            analysis.optimizer.push_chord(&commit);
        }
    }
    for cluster in analysis.optimizer.emit_new_clusters() {
        rec.push_cluster(id, cluster);
    }
}

/// Marks every fully drained, pre-processed section `processed`, flushing
/// its matcher first so trailing possible matches become clusters.
fn finalize_ready(
    recording: &Arc<Mutex<Recording>>,
    analyses: &mut HashMap<SectionId, SectionAnalysis>,
    events: &Sender<EngineEvent>,
) {
    let mut rec = recording.lock();
    let ready: Vec<SectionId> = rec
        .sections()
        .iter()
        .filter(|s| {
            s.is_pre_processed()
                && !s.is_processed()
                && s.expected_steps == Some(s.steps.len())
        })
        .map(|s| s.id())
        .collect();
    for id in ready {
        if let Some(mut analysis) = analyses.remove(&id) {
            for action in analysis.matcher.finish() {
                apply_action(&mut rec, id, &mut analysis, action);
            }
        }
        if let Some(section) = rec.section_by_id_mut(id) {
            section.mark_processed();
        }
        rec.touch();
        debug!("pipeline: section {id} processed");
        events.send(EngineEvent::SectionProcessed { section: id }).ok();
    }
}
