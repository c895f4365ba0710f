//! # Capture Duty Cycle Module
//!
//! The worker thread that drains raw device blocks into the gathering
//! section. The cpal stream is not `Send`, so it is built and held on the
//! worker thread itself; startup success or the device error travels back
//! to the caller over a one-shot channel.
//!
//! Pausing marks the gathering section `gathered`; resuming starts a new
//! section. Both happen under the recording lock, in the same critical
//! section as the enabled-flag change, so a block in flight can never land
//! in a section that was already closed out.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{anyhow, Result};
use crossbeam_channel::{RecvTimeoutError, Sender};
use log::{debug, warn};
use parking_lot::Mutex;

use cpal::traits::StreamTrait;

use crate::audio;
use crate::timeline::Recording;
use crate::EngineEvent;

/// Handle over the capture worker and its device stream.
pub struct CaptureCycle {
    recording: Arc<Mutex<Recording>>,
    events: Sender<EngineEvent>,
    enabled: Arc<AtomicBool>,
    interrupt: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    sample_rate: u32,
}

impl CaptureCycle {
    /// Opens the input device and starts capturing into a fresh section.
    ///
    /// # Returns
    /// * `Ok(cycle)` - capture is running
    /// * `Err(e)` - the device could not be opened; nothing was started and
    ///   the recording is unchanged. The caller decides whether to ask again.
    pub fn start(
        recording: Arc<Mutex<Recording>>,
        events: Sender<EngineEvent>,
    ) -> Result<CaptureCycle> {
        let enabled = Arc::new(AtomicBool::new(true));
        let interrupt = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = crossbeam_channel::bounded(1);

        let worker_recording = Arc::clone(&recording);
        let worker_events = events.clone();
        let worker_enabled = Arc::clone(&enabled);
        let worker_interrupt = Arc::clone(&interrupt);
        let handle = thread::spawn(move || {
            let (block_tx, block_rx) = crossbeam_channel::bounded::<Vec<f32>>(64);

            // The stream lives on this thread for its whole life.
            let stream = match audio::start_audio_capture(block_tx) {
                Ok((stream, rate)) => {
                    let _ = ready_tx.send(Ok(rate));
                    stream
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };

            {
                let mut rec = worker_recording.lock();
                let section = rec.start_section();
                drop(rec);
                worker_events.send(EngineEvent::SectionStarted { section }).ok();
            }

            while !worker_interrupt.load(Ordering::Relaxed) {
                match block_rx.recv_timeout(Duration::from_millis(50)) {
                    Ok(block) => {
                        let mut rec = worker_recording.lock();
                        // Checked under the lock: pause() flips the flag and
                        // closes the section inside the same critical section.
                        if !worker_enabled.load(Ordering::Relaxed) {
                            continue;
                        }
                        // Normally the last section is still gathering; if an
                        // edit removed it, open a new one rather than drop audio.
                        let target = match rec.sections().last() {
                            Some(s) if !s.is_gathered() => s.id(),
                            _ => rec.start_section(),
                        };
                        rec.append_samples(target, &block);
                        drop(rec);
                        worker_events
                            .send(EngineEvent::SamplesCaptured { section: target })
                            .ok();
                    }
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => {
                        warn!("capture: device stream went away");
                        break;
                    }
                }
            }

            // Close out the gathering section so preprocessing can finish it.
            {
                let mut rec = worker_recording.lock();
                if rec.sections().last().is_some_and(|s| !s.is_gathered()) {
                    rec.end_section();
                    let section = rec.sections().last().map(|s| s.id());
                    drop(rec);
                    if let Some(section) = section {
                        worker_events
                            .send(EngineEvent::SectionGathered { section })
                            .ok();
                    }
                }
            }
            if let Err(e) = stream.pause() {
                warn!("capture: error pausing stream: {e}");
            }
            drop(stream);
            debug!("capture: worker finished");
        });

        match ready_rx.recv() {
            Ok(Ok(sample_rate)) => Ok(CaptureCycle {
                recording,
                events,
                enabled,
                interrupt,
                handle: Some(handle),
                sample_rate,
            }),
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                let _ = handle.join();
                Err(anyhow!("capture worker exited before reporting readiness"))
            }
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn is_capturing(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Pauses capture and marks the gathering section `gathered`. Incoming
    /// device blocks are discarded while paused.
    pub fn pause(&self) {
        let mut rec = self.recording.lock();
        if !self.enabled.swap(false, Ordering::Relaxed) {
            return;
        }
        if rec.sections().last().is_some_and(|s| !s.is_gathered()) {
            rec.end_section();
            let section = rec.sections().last().map(|s| s.id());
            drop(rec);
            if let Some(section) = section {
                self.events.send(EngineEvent::SectionGathered { section }).ok();
            }
        }
    }

    /// Resumes capture into a brand new section.
    pub fn resume(&self) {
        let mut rec = self.recording.lock();
        if self.enabled.swap(true, Ordering::Relaxed) {
            return;
        }
        let section = rec.start_section();
        drop(rec);
        self.events.send(EngineEvent::SectionStarted { section }).ok();
    }

    /// Interrupts the worker and waits for it. The gathering section is
    /// closed out on the way down.
    pub fn stop(mut self) {
        self.interrupt.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
