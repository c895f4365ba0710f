//! # Audio Capture Module
//!
//! This module handles real-time audio capture using CPAL (Cross-Platform Audio Library).
//! It opens the default input device, selects a mono float configuration at
//! the engine sample rate, and streams fixed-size raw sample blocks to the
//! capture duty cycle over a channel.
//!
//! ## Features
//! - Automatic audio device selection
//! - Fixed-size block framing independent of the device buffer size
//! - Device errors surfaced from the start operation, with no retry

use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SupportedStreamConfigRange;
use crossbeam_channel::Sender;
use log::{info, warn};

use crate::SAMPLE_RATE;

/// Number of samples per raw capture block sent downstream.
///
/// The device delivers whatever buffer size it likes; blocks of this size
/// are re-framed from it so the capture cycle always appends fixed-size
/// chunks to the gathering section.
pub const BLOCK_SIZE: usize = 2048;

/// Starts audio capture from the default input device.
///
/// This function:
/// 1. Selects the default audio input device
/// 2. Configures a mono f32 stream at the engine sample rate
/// 3. Sets up a callback that re-frames device data into fixed-size blocks
///    and streams them to the capture duty cycle
///
/// # Arguments
/// * `sender` - Channel sender for streaming raw sample blocks
///
/// # Returns
/// * `Ok((stream, sample_rate))` - Audio stream handle and actual sample rate
/// * `Err(e)` - Device missing or no usable input configuration; the caller
///   decides what to do, capture is simply not started
pub fn start_audio_capture(sender: Sender<Vec<f32>>) -> Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| anyhow!("No input device available"))?;

    info!("audio: using input device {}", device.name()?);

    let configs = device.supported_input_configs()?.collect::<Vec<_>>();
    let supported_config = find_supported_config(configs, SAMPLE_RATE)
        .ok_or_else(|| anyhow!("No suitable mono f32 input format found"))?;

    let config = supported_config.with_sample_rate(cpal::SampleRate(SAMPLE_RATE));
    let sample_rate = config.sample_rate().0;
    let config: cpal::StreamConfig = config.into();

    info!("audio: capturing at {sample_rate} Hz");

    let err_fn = |err| warn!("audio: stream error: {err}");

    // Accumulates device callbacks until a whole block is available.
    let mut pending = Vec::with_capacity(BLOCK_SIZE * 2);

    let stream = device.build_input_stream(
        &config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            pending.extend_from_slice(data);

            // Forward every complete block; keep the remainder buffered.
            while pending.len() >= BLOCK_SIZE {
                let block = pending[..BLOCK_SIZE].to_vec();

                // A full downstream channel only ever drops the newest
                // block; capture must not stall the device callback.
                let _ = sender.try_send(block);

                pending.drain(..BLOCK_SIZE);
            }
        },
        err_fn,
        None,
    )?;

    stream.play()?;

    Ok((stream, sample_rate))
}

/// Finds the best supported audio configuration for the target sample rate.
///
/// Filters for mono 32-bit float input and picks the configuration whose
/// supported rate range lies closest to the target.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.channels() == 1 && c.sample_format() == cpal::SampleFormat::F32)
        .min_by_key(|c| {
            let min_diff = (c.min_sample_rate().0 as i32 - target_rate as i32).abs();
            let max_diff = (c.max_sample_rate().0 as i32 - target_rate as i32).abs();
            min_diff.min(max_diff)
        })
}
