//! # Playback Duty Cycle Module
//!
//! Advances the step cursor at the engine frame rate using the same
//! accumulator-based fixed-timestep loop as the commit cycle: elapsed time
//! is never discarded, only consumed in whole-period increments, so pacing
//! stays exact over long runs. The thread terminates on its interrupt flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::debug;
use parking_lot::Mutex;

use crate::cursor::SessionCursor;
use crate::FRAME_RATE;

/// Handle over the playback thread.
pub struct PlaybackCycle {
    interrupt: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl PlaybackCycle {
    /// Starts advancing the given cursor. The cursor keeps its current
    /// position; place it before starting playback.
    pub fn start(cursor: Arc<Mutex<SessionCursor>>) -> Self {
        let interrupt = Arc::new(AtomicBool::new(false));
        let thread_interrupt = Arc::clone(&interrupt);
        let handle = thread::spawn(move || {
            let period = Duration::from_secs(1) / FRAME_RATE;
            let mut accumulator = Duration::ZERO;
            let mut last_tick = Instant::now();
            while !thread_interrupt.load(Ordering::Relaxed) {
                let now = Instant::now();
                accumulator += now - last_tick;
                last_tick = now;

                let mut steps = 0usize;
                while accumulator >= period {
                    accumulator -= period;
                    steps += 1;
                }
                if steps > 0 {
                    // Reaching the end parks the cursor at the live end;
                    // the thread idles there until interrupted.
                    cursor.lock().advance(steps);
                } else {
                    thread::sleep(period.saturating_sub(accumulator));
                }
            }
            debug!("playback: worker finished");
        });
        PlaybackCycle { interrupt, handle: Some(handle) }
    }

    /// Interrupts the thread and waits for it.
    pub fn stop(mut self) {
        self.interrupt.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::{Recording, TimeStep};
    use crate::tuning::Tuning;

    #[test]
    fn playback_advances_roughly_at_the_frame_rate() {
        let mut rec = Recording::new(Tuning::standard_guitar());
        let id = rec.start_section();
        rec.end_section();
        for _ in 0..300 {
            rec.commit_step(id, TimeStep::default());
        }
        let recording = Arc::new(Mutex::new(rec));
        let mut session = SessionCursor::new(Arc::clone(&recording));
        session.set_step_cursor(Some(0));
        let cursor = Arc::new(Mutex::new(session));

        let playback = PlaybackCycle::start(Arc::clone(&cursor));
        thread::sleep(Duration::from_millis(500));
        playback.stop();

        let advanced = cursor.lock().step_cursor().expect("cursor still in range");
        // Half a second at 30 steps/s, with generous scheduling slack.
        assert!((7..=25).contains(&advanced), "advanced {advanced} steps");
    }

    #[test]
    fn playback_parks_at_the_live_end() {
        let mut rec = Recording::new(Tuning::standard_guitar());
        let id = rec.start_section();
        rec.end_section();
        for _ in 0..3 {
            rec.commit_step(id, TimeStep::default());
        }
        let recording = Arc::new(Mutex::new(rec));
        let mut session = SessionCursor::new(recording);
        session.set_step_cursor(Some(0));
        let cursor = Arc::new(Mutex::new(session));

        let playback = PlaybackCycle::start(Arc::clone(&cursor));
        thread::sleep(Duration::from_millis(400));
        playback.stop();

        assert_eq!(cursor.lock().step_cursor(), None);
    }
}
