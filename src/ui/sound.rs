/// Sound engine: looping background music plus procedural effects via rodio.
///
/// Effects are generated as in-memory WAV buffers at init time and played
/// fire-and-forget. The music track is decoded from `audio.music_path`.
/// Every audio failure is non-fatal: the caller logs it and carries on.
///
/// Compile without the "sound" feature to disable audio entirely (the stub
/// SoundEngine does nothing).

#[cfg(feature = "sound")]
mod inner {
    use std::fs::File;
    use std::io::{BufReader, Cursor};
    use std::path::PathBuf;
    use std::sync::Arc;

    use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
    use thiserror::Error;
    use tracing::{debug, info};

    use crate::config::AudioConfig;

    pub(super) const SAMPLE_RATE: u32 = 22050;

    #[derive(Debug, Error)]
    pub enum AudioError {
        #[error("no audio output device: {0}")]
        Device(#[from] rodio::StreamError),
        #[error("could not open {path}: {source}")]
        Open {
            path: PathBuf,
            #[source]
            source: std::io::Error,
        },
        #[error("could not decode {path}: {source}")]
        Decode {
            path: PathBuf,
            #[source]
            source: rodio::decoder::DecoderError,
        },
        #[error("could not create audio sink: {0}")]
        Sink(#[from] rodio::PlayError),
    }

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        music: Option<Sink>,
        music_path: PathBuf,
        music_volume: f32,
        sfx_key: Arc<Vec<u8>>,
        sfx_unlock: Arc<Vec<u8>>,
        sfx_spell: Arc<Vec<u8>>,
        sfx_summon: Arc<Vec<u8>>,
        sfx_smash: Arc<Vec<u8>>,
        sfx_vanish: Arc<Vec<u8>>,
        sfx_bump: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new(audio: &AudioConfig) -> Result<Self, AudioError> {
            let (stream, handle) = OutputStream::try_default()?;

            Ok(SoundEngine {
                _stream: stream,
                handle,
                music: None,
                music_path: audio.music_path.clone(),
                music_volume: audio.music_volume,
                sfx_key: Arc::new(make_wav(&gen_key())),
                sfx_unlock: Arc::new(make_wav(&gen_unlock())),
                sfx_spell: Arc::new(make_wav(&gen_spell())),
                sfx_summon: Arc::new(make_wav(&gen_summon())),
                sfx_smash: Arc::new(make_wav(&gen_smash())),
                sfx_vanish: Arc::new(make_wav(&gen_vanish())),
                sfx_bump: Arc::new(make_wav(&gen_bump())),
            })
        }

        /// Start the background track, looping forever. Replaces any track
        /// already playing.
        pub fn start_music(&mut self) -> Result<(), AudioError> {
            let path = self.music_path.clone();
            let file = File::open(&path)
                .map_err(|source| AudioError::Open { path: path.clone(), source })?;
            let source = Decoder::new(BufReader::new(file))
                .map_err(|source| AudioError::Decode { path: path.clone(), source })?;

            let sink = Sink::try_new(&self.handle)?;
            sink.set_volume(self.music_volume);
            sink.append(source.repeat_infinite());
            self.music = Some(sink);
            info!(path = %path.display(), volume = self.music_volume, "background music started");
            Ok(())
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            let sink = match Sink::try_new(&self.handle) {
                Ok(s) => s,
                Err(e) => {
                    debug!(error = %e, "effect dropped");
                    return;
                }
            };
            let cursor = Cursor::new(buf.as_ref().clone());
            if let Ok(src) = Decoder::new(cursor) {
                sink.append(src);
                sink.detach(); // fire-and-forget
            }
        }

        pub fn play_key(&self) { self.play(&self.sfx_key); }
        pub fn play_unlock(&self) { self.play(&self.sfx_unlock); }
        pub fn play_spell(&self) { self.play(&self.sfx_spell); }
        pub fn play_summon(&self) { self.play(&self.sfx_summon); }
        pub fn play_smash(&self) { self.play(&self.sfx_smash); }
        pub fn play_vanish(&self) { self.play(&self.sfx_vanish); }
        pub fn play_bump(&self) { self.play(&self.sfx_bump); }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    fn tone(freq: f32, t: f32) -> f32 {
        (t * freq * 2.0 * std::f32::consts::PI).sin()
    }

    fn samples_for(duration: f32) -> usize {
        (SAMPLE_RATE as f32 * duration) as usize
    }

    /// Notes played back to back, each with its own decay.
    fn arpeggio(notes: &[f32], note_dur: f32, volume: f32) -> Vec<f32> {
        let n = samples_for(note_dur);
        let mut samples = Vec::with_capacity(n * notes.len());
        for &freq in notes {
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).powf(0.5);
                let wave = tone(freq, t) * 0.7 + tone(freq * 3.0, t) * 0.3;
                samples.push(wave * env * volume);
            }
        }
        samples
    }

    /// Key pickup: bright rising C6 → E6 → G6.
    pub(super) fn gen_key() -> Vec<f32> {
        arpeggio(&[1047.0, 1319.0, 1568.0], 0.045, 0.25)
    }

    /// Door unlock: two low clicks then a chime.
    pub(super) fn gen_unlock() -> Vec<f32> {
        let mut samples = arpeggio(&[220.0, 220.0], 0.03, 0.3);
        samples.extend(arpeggio(&[784.0], 0.18, 0.25));
        samples
    }

    /// Spell reveal: slow eerie minor arpeggio with vibrato.
    pub(super) fn gen_spell() -> Vec<f32> {
        let notes = [440.0_f32, 523.0, 622.0, 740.0];
        let n = samples_for(0.11);
        let mut samples = Vec::with_capacity(n * notes.len());
        for &freq in &notes {
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let vib = 1.0 + 0.01 * tone(6.0, t);
                let env = 1.0 - (i as f32 / n as f32) * 0.4;
                samples.push(tone(freq * vib, t) * env * 0.2);
            }
        }
        samples
    }

    /// Summon: low rumble rising in pitch.
    pub(super) fn gen_summon() -> Vec<f32> {
        let n = samples_for(0.4);
        (0..n)
            .map(|i| {
                let p = i as f32 / n as f32;
                let t = i as f32 / SAMPLE_RATE as f32;
                let freq = 60.0 + p * 90.0;
                let env = (p * 4.0).min(1.0) * (1.0 - p).powf(0.3);
                (tone(freq, t) * 0.8 + tone(freq * 2.0, t) * 0.2) * env * 0.35
            })
            .collect()
    }

    /// Smash: loud noise burst over a falling thud.
    pub(super) fn gen_smash() -> Vec<f32> {
        let n = samples_for(0.3);
        let mut rng: u32 = 0x5EED;
        (0..n)
            .map(|i| {
                let p = i as f32 / n as f32;
                let t = i as f32 / SAMPLE_RATE as f32;
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                let thud = tone(120.0 - p * 70.0, t);
                (noise * 0.6 + thud * 0.4) * (1.0 - p).powf(1.5) * 0.4
            })
            .collect()
    }

    /// Golem gone: soft descending whistle.
    pub(super) fn gen_vanish() -> Vec<f32> {
        let n = samples_for(0.25);
        (0..n)
            .map(|i| {
                let p = i as f32 / n as f32;
                let t = i as f32 / SAMPLE_RATE as f32;
                tone(900.0 - p * 600.0, t) * (1.0 - p).powf(0.6) * 0.15
            })
            .collect()
    }

    /// Blocked move: short dull blip.
    pub(super) fn gen_bump() -> Vec<f32> {
        let n = samples_for(0.05);
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                tone(110.0, t) * (1.0 - i as f32 / n as f32) * 0.3
            })
            .collect()
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: wraps f32 samples into a 16-bit PCM buffer
    // ════════════════════════════════════════════════════════════

    pub(super) fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
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
}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::{AudioError, SoundEngine};

#[cfg(not(feature = "sound"))]
pub use stub::{AudioError, SoundEngine};

#[cfg(not(feature = "sound"))]
mod stub {
    use thiserror::Error;

    use crate::config::AudioConfig;

    #[derive(Debug, Error)]
    #[error("audio support not compiled in")]
    pub struct AudioError;

    pub struct SoundEngine;

    impl SoundEngine {
        pub fn new(_audio: &AudioConfig) -> Result<Self, AudioError> { Ok(SoundEngine) }
        pub fn start_music(&mut self) -> Result<(), AudioError> { Ok(()) }
        pub fn play_key(&self) {}
        pub fn play_unlock(&self) {}
        pub fn play_spell(&self) {}
        pub fn play_summon(&self) {}
        pub fn play_smash(&self) {}
        pub fn play_vanish(&self) {}
        pub fn play_bump(&self) {}
    }
}
