/// Sound engine: procedural 8-bit style cue sounds via rodio.
///
/// Every `Cue` has a short note sequence; all of them are rendered to
/// in-memory WAV buffers at init time. Playback is fire-and-forget
/// (non-blocking) via rodio's Sink, so the session never waits on audio.
///
/// Compile with `--no-default-features` or without the "sound" feature
/// to disable audio entirely (the stub SoundEngine does nothing).

use crate::sim::event::Cue;

#[cfg_attr(not(feature = "sound"), allow(dead_code))]
const SAMPLE_RATE: u32 = 22050;

/// Frequency 0 = noise burst.
#[cfg_attr(not(feature = "sound"), allow(dead_code))]
fn notes(cue: Cue) -> &'static [(f32, f32)] {
    match cue {
        Cue::StarFound      => &[(1047.0, 0.045), (1319.0, 0.045), (1568.0, 0.06)],  // C6 E6 G6
        Cue::Collision      => &[(0.0, 0.08)],
        Cue::FloorSwitch    => &[(392.0, 0.07), (523.0, 0.07), (659.0, 0.09)],
        Cue::LifeGained     => &[(784.0, 0.08), (1047.0, 0.15)],
        Cue::LifeLost       => &[(440.0, 0.1), (311.0, 0.16)],
        Cue::TimeGained     => &[(880.0, 0.05), (1175.0, 0.08)],
        Cue::TimeLost       => &[(587.0, 0.05), (440.0, 0.08)],
        Cue::BoardTransform => &[(330.0, 0.05), (494.0, 0.05), (330.0, 0.05), (494.0, 0.08)],
        Cue::Light          => &[(1568.0, 0.04), (2093.0, 0.1)],
        Cue::TimeOver       => &[(0.0, 0.05), (220.0, 0.3)],
        Cue::LevelWon       => &[(523.0, 0.1), (659.0, 0.1), (784.0, 0.1), (1047.0, 0.3)],  // C5 E5 G5 C6
        Cue::LevelLost      => &[(440.0, 0.12), (370.0, 0.12), (311.0, 0.12), (261.0, 0.3)], // A4 F#4 Eb4 C4
    }
}

/// Render a note sequence to mono samples. Each note fades out linearly;
/// tones carry a little 2nd harmonic for a retro feel.
#[cfg_attr(not(feature = "sound"), allow(dead_code))]
fn synthesize(seq: &[(f32, f32)]) -> Vec<f32> {
    let mut samples = Vec::new();
    let mut rng: u32 = 12345;
    for &(freq, dur) in seq {
        let n = (SAMPLE_RATE as f32 * dur) as usize;
        for i in 0..n {
            let t = i as f32 / SAMPLE_RATE as f32;
            let env = 1.0 - (i as f32 / n as f32);
            let wave = if freq == 0.0 {
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                (rng as f32 / u32::MAX as f32) * 2.0 - 1.0
            } else {
                (t * freq * 2.0 * std::f32::consts::PI).sin() * 0.7
                    + (t * freq * 2.0 * 2.0 * std::f32::consts::PI).sin() * 0.3
            };
            samples.push(wave * env * 0.25);
        }
    }
    samples
}

/// Wrap f32 samples into a 16-bit PCM mono WAV buffer.
#[cfg_attr(not(feature = "sound"), allow(dead_code))]
fn make_wav(samples: &[f32]) -> Vec<u8> {
    let num_channels: u16 = 1;
    let bits_per_sample: u16 = 16;
    let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
    let block_align = num_channels * bits_per_sample / 8;
    let data_size = samples.len() as u32 * 2;
    let file_size = 36 + data_size;

    let mut buf = Vec::with_capacity(44 + data_size as usize);

    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&file_size.to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
    buf.extend_from_slice(&1u16.to_le_bytes());  // PCM
    buf.extend_from_slice(&num_channels.to_le_bytes());
    buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&bits_per_sample.to_le_bytes());

    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());

    for &s in samples {
        let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
        buf.extend_from_slice(&val.to_le_bytes());
    }

    buf
}

#[cfg(feature = "sound")]
mod inner {
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::{make_wav, notes, synthesize};
    use crate::sim::event::Cue;

    /// Pre-generated WAV buffers, one per cue.
    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        buffers: HashMap<Cue, Arc<Vec<u8>>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    log::warn!("no audio output: {e}");
                    return None;
                }
            };
            let buffers = Cue::ALL
                .iter()
                .map(|&cue| (cue, Arc::new(make_wav(&synthesize(notes(cue))))))
                .collect();
            Some(SoundEngine { _stream: stream, handle, buffers })
        }

        pub fn play(&self, cue: Cue) {
            let Some(buf) = self.buffers.get(&cue) else { return };
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play(&self, _cue: Cue) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_cue_renders_audible_samples() {
        for cue in Cue::ALL {
            let samples = synthesize(notes(cue));
            assert!(!samples.is_empty(), "{}", cue.name());
            assert!(samples.iter().all(|s| s.abs() <= 1.0), "{}", cue.name());
        }
    }

    #[test]
    fn wav_header_matches_payload() {
        let samples = synthesize(notes(Cue::Collision));
        let wav = make_wav(&samples);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(wav.len(), 44 + samples.len() * 2);
        let data_size = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]);
        assert_eq!(data_size as usize, samples.len() * 2);
    }
}
