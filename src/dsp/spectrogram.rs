use std::f32::consts::PI;

use crate::config::EngineConfig;
use crate::dsp::fft::{fft_in_place, to_complex_buffer};

/// A 2-D log-magnitude grid `S[t][f]`, `t` in `[0, frame_count)`,
/// `f` in `[0, window_size / 2]`. Spec.md §4.1.
pub struct Spectrogram {
    pub frames: Vec<Vec<f32>>,
    pub hop: usize,
}

impl Spectrogram {
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn bin_count(&self) -> usize {
        self.frames.first().map_or(0, |f| f.len())
    }

    pub fn magnitude(&self, t: usize, f: usize) -> f32 {
        self.frames[t][f]
    }
}

fn hann_window(n: usize) -> Vec<f32> {
    if n <= 1 {
        return vec![1.0; n];
    }
    (0..n)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / (n as f32 - 1.0)).cos()))
        .collect()
}

/// Computes the windowed short-time magnitude spectrum of a mono PCM
/// channel, per spec.md §4.1.
///
/// `samples` past `Fs * fingerprint_limit_secs` are dropped first when a
/// limit is configured. Frames past the end of the (possibly truncated)
/// signal are zero-padded; a signal shorter than one window yields a
/// single zero-padded frame.
pub fn compute(samples: &[f32], cfg: &EngineConfig) -> Spectrogram {
    let samples = match cfg.fingerprint_limit_secs {
        Some(limit) => {
            let cap = (cfg.sample_rate as f32 * limit) as usize;
            &samples[..samples.len().min(cap)]
        }
        None => samples,
    };

    let window = cfg.window_size;
    let hop = cfg.hop().max(1);
    let hann = hann_window(window);

    let mut frames = Vec::new();
    let mut position = 0usize;

    loop {
        let mut chunk = vec![0.0f32; window];
        let available = samples.len().saturating_sub(position).min(window);
        if available > 0 {
            chunk[..available].copy_from_slice(&samples[position..position + available]);
        }

        let windowed: Vec<f32> = chunk
            .iter()
            .zip(hann.iter())
            .map(|(&s, &w)| s * w)
            .collect();

        let mut complex = to_complex_buffer(&windowed);
        fft_in_place(&mut complex);

        let half = window / 2 + 1;
        let magnitudes: Vec<f32> = complex[..half]
            .iter()
            .map(|c| {
                let m = c.norm_sqr().sqrt().max(cfg.amplitude_floor);
                m.log10()
            })
            .collect();

        frames.push(magnitudes);

        if position + window >= samples.len() {
            break;
        }
        position += hop;
    }

    if samples.is_empty() {
        // still emit the single zero-padded frame computed above
    }

    Spectrogram { frames, hop }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_short_signals_yield_one_frame() {
        let cfg = EngineConfig {
            window_size: 64,
            ..EngineConfig::default()
        };
        let spec = compute(&[], &cfg);
        assert_eq!(spec.frame_count(), 1);

        let spec = compute(&[0.1; 10], &cfg);
        assert_eq!(spec.frame_count(), 1);
    }

    #[test]
    fn longer_signal_yields_multiple_hopped_frames() {
        let cfg = EngineConfig {
            window_size: 64,
            overlap_ratio: 0.5,
            ..EngineConfig::default()
        };
        let samples = vec![0.0f32; 64 * 10];
        let spec = compute(&samples, &cfg);
        assert!(spec.frame_count() > 1);
        assert_eq!(spec.bin_count(), 33);
    }
}
