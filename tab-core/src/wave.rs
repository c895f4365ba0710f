//! # File Sample Source Module
//!
//! Non-live ingestion: reads a 16-bit mono PCM WAV file into a new section.
//! Any other bit depth, channel count or sample encoding is rejected with a
//! distinct error before a single sample is read, so a failed load leaves
//! the recording untouched. Ingested sections are flagged for fast
//! processing: the commit cycle drains them unpaced.

use std::io::Read;
use std::path::Path;

use log::info;

use crate::error::FormatError;
use crate::timeline::{Recording, SectionId};

/// Reads a WAV file, validating the format from the header alone.
///
/// # Returns
/// * `Ok(samples)` - normalized mono samples in `[-1.0, 1.0]`
/// * `Err(FormatError)` - wrong channel count, bit depth or encoding
pub fn read_wav(path: &Path) -> Result<Vec<f32>, FormatError> {
    let reader = hound::WavReader::open(path)?;
    read_samples(reader)
}

/// Same as [`read_wav`] for an already-open byte stream.
pub fn read_wav_from<R: Read>(stream: R) -> Result<Vec<f32>, FormatError> {
    let reader = hound::WavReader::new(stream)?;
    read_samples(reader)
}

fn read_samples<R: Read>(mut reader: hound::WavReader<R>) -> Result<Vec<f32>, FormatError> {
    let spec = reader.spec();
    if spec.channels != 1 {
        return Err(FormatError::UnsupportedChannels(spec.channels));
    }
    if spec.sample_format != hound::SampleFormat::Int {
        return Err(FormatError::UnsupportedSampleFormat);
    }
    if spec.bits_per_sample != 16 {
        return Err(FormatError::UnsupportedBitDepth(spec.bits_per_sample));
    }
    let samples = reader
        .samples::<i16>()
        .map(|s| s.map(|v| v as f32 / i16::MAX as f32))
        .collect::<Result<Vec<f32>, _>>()?;
    Ok(samples)
}

/// Appends the samples of a loaded file as one new, already-gathered section
/// flagged for fast processing, and returns its id.
///
/// The caller holds the recording lock; the analysis pipeline picks the
/// section up on its next pass.
pub fn ingest(recording: &mut Recording, samples: &[f32]) -> SectionId {
    let id = recording.start_section();
    recording.append_samples(id, samples);
    recording.set_fast(id, true);
    recording.end_section();
    info!("wave: ingested {} samples as section {id}", samples.len());
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::Tuning;
    use std::io::Cursor;

    fn wav_bytes(spec: hound::WavSpec, frames: usize) -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut bytes, spec).unwrap();
            for i in 0..frames * spec.channels as usize {
                match spec.sample_format {
                    hound::SampleFormat::Int if spec.bits_per_sample == 16 => {
                        writer.write_sample((i % 100) as i16).unwrap()
                    }
                    hound::SampleFormat::Int => writer.write_sample(i as i32).unwrap(),
                    hound::SampleFormat::Float => writer.write_sample(0.5f32).unwrap(),
                }
            }
            writer.finalize().unwrap();
        }
        bytes.into_inner()
    }

    fn spec(channels: u16, bits: u16, format: hound::SampleFormat) -> hound::WavSpec {
        hound::WavSpec {
            channels,
            sample_rate: crate::SAMPLE_RATE,
            bits_per_sample: bits,
            sample_format: format,
        }
    }

    #[test]
    fn mono_pcm16_loads() {
        let bytes = wav_bytes(spec(1, 16, hound::SampleFormat::Int), 256);
        let samples = read_wav_from(Cursor::new(bytes)).unwrap();
        assert_eq!(samples.len(), 256);
        assert!(samples.iter().all(|s| (-1.0..=1.0).contains(s)));
    }

    #[test]
    fn stereo_is_rejected_before_reading() {
        let bytes = wav_bytes(spec(2, 16, hound::SampleFormat::Int), 16);
        match read_wav_from(Cursor::new(bytes)) {
            Err(FormatError::UnsupportedChannels(2)) => {}
            other => panic!("expected channel rejection, got {other:?}"),
        }
    }

    #[test]
    fn wrong_bit_depth_is_rejected() {
        let bytes = wav_bytes(spec(1, 32, hound::SampleFormat::Int), 16);
        match read_wav_from(Cursor::new(bytes)) {
            Err(FormatError::UnsupportedBitDepth(32)) => {}
            other => panic!("expected bit-depth rejection, got {other:?}"),
        }
    }

    #[test]
    fn float_samples_are_rejected() {
        let bytes = wav_bytes(spec(1, 32, hound::SampleFormat::Float), 16);
        match read_wav_from(Cursor::new(bytes)) {
            Err(FormatError::UnsupportedSampleFormat) => {}
            other => panic!("expected sample-format rejection, got {other:?}"),
        }
    }

    #[test]
    fn rejection_leaves_the_recording_untouched() {
        let mut rec = Recording::new(Tuning::standard_guitar());
        let bytes = wav_bytes(spec(2, 16, hound::SampleFormat::Int), 16);
        let before = rec.revision();
        if read_wav_from(Cursor::new(bytes)).is_err() {
            // Nothing was ingested.
        }
        assert_eq!(rec.sections().len(), 0);
        assert_eq!(rec.revision(), before);
    }

    #[test]
    fn ingest_creates_a_fast_gathered_section() {
        let mut rec = Recording::new(Tuning::standard_guitar());
        let id = ingest(&mut rec, &[0.0; 4096]);
        let section = rec.section_by_id(id).unwrap();
        assert!(section.fast);
        assert!(section.is_gathered());
        assert!(!section.is_pre_processed());
        assert_eq!(section.samples.len(), 4096);
    }
}
