//! # Pitch Oracle Interface
//!
//! The boundary to the external pitch-detection capability. The core never
//! implements pitch detection itself; it hands fixed-size sample windows to
//! an oracle and consumes the per-pitch confidence it returns. Whatever model
//! or DSP sits behind the trait is the oracle's concern.

use serde::{Deserialize, Serialize};

/// Number of samples handed to the oracle per analysis window.
pub const WINDOW_SIZE: usize = 2048;

/// Lowest pitch the oracle reports, as a MIDI note number (E1).
pub const PITCH_RANGE_START: i32 = 28;

/// Highest pitch the oracle reports, as a MIDI note number (E6).
pub const PITCH_RANGE_END: i32 = 88;

/// Length of the per-pitch confidence vector.
pub const PITCH_RANGE_LEN: usize = (PITCH_RANGE_END - PITCH_RANGE_START + 1) as usize;

/// Confidence at or above this value counts as a detected pitch.
pub const CONFIDENCE_THRESHOLD: f32 = 0.5;

/// The oracle's output for one analysis window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepOutput {
    /// Confidence per pitch over `[PITCH_RANGE_START, PITCH_RANGE_END]`,
    /// exactly `PITCH_RANGE_LEN` entries.
    pub pitch_confidence: Vec<f32>,
    /// Spectral magnitude bins for the window.
    pub spectrum: Vec<f32>,
    /// Phase-reconstructed waveform, same length as the input window.
    pub dephased_waveform: Vec<f32>,
}

impl StepOutput {
    /// Pitches whose confidence clears the detection threshold, ascending.
    pub fn detected_pitches(&self) -> Vec<i32> {
        self.pitch_confidence
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c >= CONFIDENCE_THRESHOLD)
            .map(|(i, _)| PITCH_RANGE_START + i as i32)
            .collect()
    }
}

/// External pitch-detection capability, consumed as a black box.
///
/// Stateless from this core's perspective; implementations are invoked from
/// the preprocessing thread and must therefore be `Send + Sync`.
pub trait PitchOracle: Send + Sync {
    /// Analyzes one window of `WINDOW_SIZE` mono samples.
    fn analyze(&self, window: &[f32]) -> StepOutput;
}
