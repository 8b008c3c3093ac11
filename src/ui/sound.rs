/// Sound effects: short procedural chiptune sounds via rodio.
///
/// Every effect is synthesized into an in-memory WAV buffer at startup.
/// Playback is fire-and-forget through a detached rodio `Sink`.
///
/// Build without the "sound" feature to drop audio entirely; the stub
/// engine then ignores every call.

use crate::sim::event::GameEvent;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Sfx {
    Coin,
    Hurt,
    Unlock,
    Bump,
    Win,
    Lose,
}

impl Sfx {
    pub const ALL: [Sfx; 6] = [Sfx::Coin, Sfx::Hurt, Sfx::Unlock, Sfx::Bump, Sfx::Win, Sfx::Lose];

    /// Sound cue for a simulation event, if it has one.
    pub fn for_event(event: &GameEvent) -> Option<Sfx> {
        match event {
            GameEvent::CoinCollected { .. } => Some(Sfx::Coin),
            GameEvent::LifeLost { .. } => Some(Sfx::Hurt),
            GameEvent::TriggerFired { .. } => Some(Sfx::Unlock),
            GameEvent::Bumped { .. } => Some(Sfx::Bump),
            GameEvent::Won => Some(Sfx::Win),
            GameEvent::Lost => Some(Sfx::Lose),
            _ => None,
        }
    }
}

#[cfg(feature = "sound")]
mod inner {
    use std::f32::consts::TAU;
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::Sfx;

    const SAMPLE_RATE: u32 = 22050;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        /// Indexed by `Sfx as usize`.
        buffers: Vec<Arc<Vec<u8>>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    tracing::warn!("no audio output, sound disabled: {e}");
                    return None;
                }
            };
            let buffers = Sfx::ALL.iter()
                .map(|&sfx| Arc::new(make_wav(&synth(sfx))))
                .collect();
            Some(SoundEngine { _stream: stream, handle, buffers })
        }

        pub fn play(&self, sfx: Sfx) {
            let Some(buf) = self.buffers.get(sfx as usize) else { return };
            let Ok(sink) = Sink::try_new(&self.handle) else { return };
            match rodio::Decoder::new(Cursor::new(buf.as_ref().clone())) {
                Ok(src) => {
                    sink.append(src);
                    sink.detach();
                }
                Err(e) => tracing::debug!("could not decode {sfx:?}: {e}"),
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Synthesis: every generator returns mono f32 samples
    // ════════════════════════════════════════════════════════════

    fn synth(sfx: Sfx) -> Vec<f32> {
        match sfx {
            // E6 → B6
            Sfx::Coin => notes(&[(1319.0, 0.05), (1976.0, 0.12)], 0.25),
            Sfx::Hurt => sweep(420.0, 90.0, 0.25, 0.5, 0.3),
            Sfx::Unlock => sweep(300.0, 900.0, 0.3, 0.0, 0.2),
            Sfx::Bump => sweep(140.0, 80.0, 0.06, 0.3, 0.2),
            // C5 E5 G5 C6, last note held
            Sfx::Win => notes(&[(523.0, 0.1), (659.0, 0.1), (784.0, 0.1), (1047.0, 0.35)], 0.3),
            Sfx::Lose => notes(&[(392.0, 0.15), (330.0, 0.15), (262.0, 0.4)], 0.3),
        }
    }

    /// A run of tones, each fading out over its own length.
    fn notes(seq: &[(f32, f32)], volume: f32) -> Vec<f32> {
        let mut out = Vec::new();
        for &(freq, dur) in seq {
            let n = (SAMPLE_RATE as f32 * dur) as usize;
            out.extend((0..n).map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - i as f32 / n as f32;
                let wave = (t * freq * TAU).sin() * 0.75 + (t * freq * 2.0 * TAU).sin() * 0.25;
                wave * env * volume
            }));
        }
        out
    }

    /// Linear pitch sweep mixed with `noise` parts of white noise.
    fn sweep(from: f32, to: f32, dur: f32, noise: f32, volume: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * dur) as usize;
        let mut rng: u32 = 0x2545_f491;
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let p = i as f32 / n as f32;
                phase += (from + (to - from) * p) * TAU / SAMPLE_RATE as f32;
                rng ^= rng << 13;
                rng ^= rng >> 17;
                rng ^= rng << 5;
                let white = rng as f32 / u32::MAX as f32 * 2.0 - 1.0;
                let env = (1.0 - p).powf(0.7);
                (phase.sin() * (1.0 - noise) + white * noise) * env * volume
            })
            .collect()
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: 16-bit PCM mono
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        const CHANNELS: u16 = 1;
        const BITS: u16 = 16;
        let block_align = CHANNELS * BITS / 8;
        let byte_rate = SAMPLE_RATE * u32::from(block_align);
        let data_size = samples.len() as u32 * u32::from(block_align);

        let mut buf = Vec::with_capacity(44 + data_size as usize);
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVEfmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes());
        buf.extend_from_slice(&CHANNELS.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&BITS.to_le_bytes());
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            let v = (s.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16;
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf
    }

}

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play(&self, _sfx: Sfx) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::GridPos;

    #[test]
    fn cues_follow_events() {
        let at = GridPos::new(1, 1);
        assert_eq!(Sfx::for_event(&GameEvent::CoinCollected { at, score: 10 }), Some(Sfx::Coin));
        assert_eq!(Sfx::for_event(&GameEvent::LifeLost { at, lives: 2 }), Some(Sfx::Hurt));
        assert_eq!(Sfx::for_event(&GameEvent::Won), Some(Sfx::Win));
        assert_eq!(Sfx::for_event(&GameEvent::Stepped { to: at }), None);
        assert_eq!(Sfx::for_event(&GameEvent::TileSettled { at }), None);
    }

    #[test]
    fn table_order_matches_discriminants() {
        for (i, sfx) in Sfx::ALL.iter().enumerate() {
            assert_eq!(*sfx as usize, i);
        }
    }
}
